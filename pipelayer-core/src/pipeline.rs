//! Pipeline assembly.
//!
//! [`aggregation`] opens a pipeline scope. Each stage method on [`PipelineBuilder`] runs its
//! callback against a fresh stage builder and appends the stage immediately, so stage order is
//! exactly call order. Nothing is resolved until [`Pipeline::build`] walks the stages.
//!
//! ```ignore
//! use pipelayer::prelude::*;
//!
//! let pipeline = aggregation(|p| {
//!     p.project(|p| {
//!         p.include("item");
//!         p.expression("total", |e| e.add(|a| a.of("price").and("fee")));
//!     });
//! });
//!
//! // [{ "$project": { "item": 1, "total": { "$add": ["$price", "$fee"] } } }]
//! let stages = pipeline.build()?;
//! ```

use bson::Document;
use std::sync::Arc;
use tracing::debug;

use crate::{
    context::ResolutionContext,
    criteria::Criteria,
    error::AggregationResult,
    expression::{Expression, Expressions},
    operand::Operand,
    property::FieldPath,
    stage::{
        CountStage, DocumentsStage, FacetStage, FieldAssignmentStage, GroupStage, LimitStage,
        LookupStage, MatchStage, ProjectStage, ReplaceRootStage, SampleStage, SearchStage,
        SkipStage, SortByCountStage, SortStage, Stage, UnionWithStage, UnsetStage, UnwindStage,
    },
};

/// An ordered, append-only sequence of declared stages.
///
/// Pipelines are cheap to clone and can be built any number of times, or nested into
/// `$lookup`, `$unionWith` and `$facet`.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
}

impl Pipeline {
    /// Creates a builder for a new pipeline.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Resolves every stage against a fresh default context.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a stage.
    pub fn build(&self) -> AggregationResult<Vec<Document>> {
        self.build_with(&ResolutionContext::default())
    }

    /// Resolves every stage, in order, against `ctx`. Stages resolving to nothing are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a stage.
    pub fn build_with(&self, ctx: &ResolutionContext) -> AggregationResult<Vec<Document>> {
        let mut documents = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            if let Some(document) = stage.resolve(ctx)? {
                documents.push(document);
            }
        }

        debug!(
            declared = self.stages.len(),
            emitted = documents.len(),
            "resolved aggregation pipeline"
        );

        Ok(documents)
    }

    /// Resolves the pipeline and renders it as JSON, for logging and debugging.
    ///
    /// # Errors
    ///
    /// Returns an error if resolution fails or a value has no JSON form.
    pub fn to_json(&self) -> AggregationResult<serde_json::Value> {
        Ok(serde_json::to_value(self.build()?)?)
    }

    /// Returns the names of the declared stages, in order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Returns the number of declared stages, including ones that may resolve to nothing.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Builds a pipeline from the stages declared by `build`.
pub fn aggregation(build: impl FnOnce(&mut PipelineBuilder)) -> Pipeline {
    let mut builder = PipelineBuilder::new();
    build(&mut builder);
    builder.build()
}

/// The scope a pipeline callback receives.
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    stages: Vec<Arc<dyn Stage>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finishes the pipeline.
    pub fn build(self) -> Pipeline {
        Pipeline { stages: self.stages }
    }

    /// Appends a custom stage.
    pub fn stage(&mut self, stage: impl Stage + 'static) -> &mut Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Appends every stage of `pipeline`.
    pub fn pipeline(&mut self, pipeline: &Pipeline) -> &mut Self {
        self.stages.extend(pipeline.stages.iter().cloned());
        self
    }

    fn configured<S: Stage + 'static>(&mut self, mut stage: S, build: impl FnOnce(&mut S)) -> &mut Self {
        build(&mut stage);
        self.stage(stage)
    }

    /// `$project`
    pub fn project(&mut self, build: impl FnOnce(&mut ProjectStage)) -> &mut Self {
        self.configured(ProjectStage::new(), build)
    }

    /// `$addFields`
    pub fn add_fields(&mut self, build: impl FnOnce(&mut FieldAssignmentStage)) -> &mut Self {
        self.configured(FieldAssignmentStage::add_fields(), build)
    }

    /// `$set`
    pub fn set(&mut self, build: impl FnOnce(&mut FieldAssignmentStage)) -> &mut Self {
        self.configured(FieldAssignmentStage::set_fields(), build)
    }

    /// `$group`
    pub fn group(&mut self, build: impl FnOnce(&mut GroupStage)) -> &mut Self {
        self.configured(GroupStage::new(), build)
    }

    /// `$sort`
    pub fn sort(&mut self, build: impl FnOnce(&mut SortStage)) -> &mut Self {
        self.configured(SortStage::new(), build)
    }

    /// `$lookup`
    pub fn lookup(&mut self, build: impl FnOnce(&mut LookupStage)) -> &mut Self {
        self.configured(LookupStage::new(), build)
    }

    /// `$unwind`
    pub fn unwind(&mut self, build: impl FnOnce(&mut UnwindStage)) -> &mut Self {
        self.configured(UnwindStage::new(), build)
    }

    /// `$unionWith`
    pub fn union_with(&mut self, build: impl FnOnce(&mut UnionWithStage)) -> &mut Self {
        self.configured(UnionWithStage::new(), build)
    }

    /// `$facet`
    pub fn facet(&mut self, build: impl FnOnce(&mut FacetStage)) -> &mut Self {
        self.configured(FacetStage::new(), build)
    }

    /// `$search`
    pub fn search(&mut self, build: impl FnOnce(&mut SearchStage)) -> &mut Self {
        self.configured(SearchStage::search(), build)
    }

    /// `$searchMeta`
    pub fn search_meta(&mut self, build: impl FnOnce(&mut SearchStage)) -> &mut Self {
        self.configured(SearchStage::search_meta(), build)
    }

    /// `$count`
    pub fn count(&mut self, field: impl Into<String>) -> &mut Self {
        self.stage(CountStage::new(field))
    }

    /// `$match` on a filter criteria, in query form.
    pub fn match_(&mut self, criteria: Criteria) -> &mut Self {
        self.stage(MatchStage::Criteria(criteria))
    }

    /// `$match` on the expression built by `build`, through `$expr`.
    pub fn match_expression<R: Into<Expression>>(&mut self, build: impl FnOnce(&Expressions) -> R) -> &mut Self {
        self.stage(MatchStage::Expression(build(&Expressions::new()).into()))
    }

    /// `$limit`
    pub fn limit(&mut self, count: i64) -> &mut Self {
        self.stage(LimitStage(count))
    }

    /// `$skip`
    pub fn skip(&mut self, count: i64) -> &mut Self {
        self.stage(SkipStage(count))
    }

    /// `$sample`
    pub fn sample(&mut self, size: i64) -> &mut Self {
        self.stage(SampleStage(size))
    }

    /// `$unset`
    pub fn unset<F: Into<FieldPath>>(&mut self, fields: impl IntoIterator<Item = F>) -> &mut Self {
        self.stage(UnsetStage::new(fields))
    }

    /// `$replaceRoot`
    pub fn replace_root(&mut self, root: impl Into<Operand>) -> &mut Self {
        self.stage(ReplaceRootStage::replace_root(root))
    }

    /// `$replaceWith`
    pub fn replace_with(&mut self, root: impl Into<Operand>) -> &mut Self {
        self.stage(ReplaceRootStage::replace_with(root))
    }

    /// `$sortByCount`
    pub fn sort_by_count(&mut self, key: impl Into<Operand>) -> &mut Self {
        self.stage(SortByCountStage::new(key))
    }

    /// `$documents`
    pub fn documents(&mut self, documents: impl IntoIterator<Item = Document>) -> &mut Self {
        self.stage(DocumentsStage::new(documents))
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::error::AggregationError;

    #[test]
    fn stages_keep_call_order_and_skip_empty_ones() {
        let pipeline = aggregation(|p| {
            p.limit(10);
            p.unwind(|_| {});
            p.skip(2);
            p.limit(10);
            p.union_with(|_| {});
        });

        assert_eq!(pipeline.len(), 5);
        assert_eq!(
            pipeline.stage_names(),
            vec!["$limit", "$unwind", "$skip", "$limit", "$unionWith"]
        );
        assert_eq!(
            pipeline.build().unwrap(),
            vec![doc! { "$limit": 10_i64 }, doc! { "$skip": 2_i64 }, doc! { "$limit": 10_i64 }]
        );
    }

    #[test]
    fn failing_stage_fails_the_build() {
        let pipeline = aggregation(|p| {
            p.limit(1);
            p.set(|_| {});
        });

        assert!(matches!(
            pipeline.build(),
            Err(AggregationError::IncompleteStage { stage: "$set", .. })
        ));
    }

    #[test]
    fn raw_and_appended_stages() {
        let shared = aggregation(|p| {
            p.count("n");
        });
        let pipeline = aggregation(|p| {
            p.stage(doc! { "$collStats": { "count": {} } });
            p.pipeline(&shared);
        });

        assert_eq!(
            pipeline.build().unwrap(),
            vec![doc! { "$collStats": { "count": {} } }, doc! { "$count": "n" }]
        );
    }

    #[test]
    fn renders_json() {
        let pipeline = aggregation(|p| {
            p.count("total");
        });

        assert_eq!(pipeline.to_json().unwrap(), json!([{ "$count": "total" }]));
    }
}
