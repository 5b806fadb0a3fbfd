//! `$unionWith`

use bson::Document;
use tracing::trace;

use crate::{
    context::ResolutionContext,
    error::AggregationResult,
    pipeline::{Pipeline, PipelineBuilder, aggregation},
    record::Record,
    stage::{Stage, stage_document},
};

/// Builder for a `$unionWith` stage.
///
/// A union without a collection is omitted from the pipeline.
#[derive(Debug, Clone, Default)]
pub struct UnionWithStage {
    coll: Option<String>,
    pipeline: Option<Pipeline>,
}

impl UnionWithStage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coll(&mut self, collection: impl Into<String>) -> &mut Self {
        self.coll = Some(collection.into());
        self
    }

    /// Unions with the collection of record shape `R`.
    pub fn coll_of<R: Record>(&mut self) -> &mut Self {
        self.coll(R::collection_name())
    }

    /// Runs the pipeline built by `build` on the unioned collection first.
    pub fn pipeline(&mut self, build: impl FnOnce(&mut PipelineBuilder)) -> &mut Self {
        self.pipeline = Some(aggregation(build));
        self
    }
}

impl Stage for UnionWithStage {
    fn name(&self) -> &'static str {
        "$unionWith"
    }

    fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Option<Document>> {
        let Some(coll) = &self.coll else {
            trace!("skipping $unionWith declared without a collection");
            return Ok(None);
        };

        let mut body = Document::new();
        body.insert("coll", coll.as_str());
        if let Some(pipeline) = &self.pipeline {
            body.insert("pipeline", pipeline.build_with(ctx)?);
        }

        Ok(Some(stage_document(self.name(), body)))
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn no_collection_no_stage() {
        let mut stage = UnionWithStage::new();
        stage.pipeline(|p| {
            p.limit(1);
        });

        assert_eq!(stage.resolve(&ResolutionContext::default()).unwrap(), None);
    }

    #[test]
    fn collection_and_pipeline() {
        let mut stage = UnionWithStage::new();
        stage.coll("sales_2020").pipeline(|p| {
            p.set(|s| {
                s.set_value("year", 2020);
            });
        });

        assert_eq!(
            stage.resolve(&ResolutionContext::default()).unwrap(),
            Some(doc! {
                "$unionWith": {
                    "coll": "sales_2020",
                    "pipeline": [{ "$set": { "year": 2020 } }],
                }
            })
        );
    }
}
