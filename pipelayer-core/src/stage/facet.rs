//! `$facet`

use bson::Document;

use crate::{
    context::ResolutionContext,
    error::{AggregationError, AggregationResult},
    pipeline::{Pipeline, PipelineBuilder, aggregation},
    stage::{Stage, stage_document},
};

/// Builder for a `$facet` stage: named sub-pipelines run over the same input documents.
#[derive(Debug, Clone, Default)]
pub struct FacetStage {
    facets: Vec<(String, Pipeline)>,
}

impl FacetStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the sub-pipeline built by `build` under the output field `name`.
    pub fn facet(&mut self, name: impl Into<String>, build: impl FnOnce(&mut PipelineBuilder)) -> &mut Self {
        self.facets.push((name.into(), aggregation(build)));
        self
    }
}

impl Stage for FacetStage {
    fn name(&self) -> &'static str {
        "$facet"
    }

    fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Option<Document>> {
        if self.facets.is_empty() {
            return Err(AggregationError::incomplete_stage("$facet", "at least one facet is required"));
        }

        let mut body = Document::new();
        for (name, pipeline) in &self.facets {
            body.insert(name.as_str(), pipeline.build_with(ctx)?);
        }

        Ok(Some(stage_document(self.name(), body)))
    }
}
