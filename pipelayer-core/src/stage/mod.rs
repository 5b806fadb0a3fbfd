//! Pipeline stage builders.
//!
//! Each builder accumulates the declarative state of one stage and resolves it into a single
//! document keyed by the stage's reserved operator name. Stages are usually declared through
//! [`PipelineBuilder`](crate::pipeline::PipelineBuilder), which hands each stage callback a
//! fresh builder and appends it as soon as the callback returns:
//!
//! ```ignore
//! let pipeline = aggregation(|p| {
//!     p.match_(Filter::eq("status", "A"));
//!     p.group(|g| {
//!         g.id("cust_id");
//!         g.accumulate("total", |a| a.sum("amount"));
//!     });
//!     p.sort(|s| {
//!         s.descending("total");
//!     });
//! });
//! ```
//!
//! A stage resolves to `None` when an optional input that the stage cannot do without was never
//! declared (`$unwind` without a path, `$unionWith` without a collection). The assembler skips
//! such stages. A stage whose required input is missing fails with
//! [`AggregationError::IncompleteStage`](crate::error::AggregationError::IncompleteStage).

pub mod count;
pub mod facet;
pub mod fields;
pub mod filter;
pub mod group;
pub mod lookup;
pub mod project;
pub mod reshape;
pub mod search;
pub mod sort;
pub mod union;
pub mod unwind;

use bson::{Bson, Document};
use std::fmt::Debug;

use crate::{context::ResolutionContext, error::AggregationResult};

pub use self::{
    count::{CountStage, SortByCountStage},
    facet::FacetStage,
    fields::FieldAssignmentStage,
    filter::{LimitStage, MatchStage, SampleStage, SkipStage},
    group::GroupStage,
    lookup::LookupStage,
    project::ProjectStage,
    reshape::{DocumentsStage, ReplaceRootStage, UnsetStage},
    search::{CompoundScope, SearchCount, SearchOperator, SearchRange, SearchStage},
    sort::{SortOrder, SortStage},
    union::UnionWithStage,
    unwind::UnwindStage,
};

/// One declared pipeline stage.
pub trait Stage: Debug + Send + Sync {
    /// The reserved stage operator name, e.g. `$project`.
    fn name(&self) -> &'static str;

    /// Resolves this stage into its stage document.
    ///
    /// Returns `Ok(None)` when the stage should be omitted from the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if a required input was never declared, or if a nested expression or
    /// field path fails to resolve.
    fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Option<Document>>;
}

/// A raw stage document, appended as written.
impl Stage for Document {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn resolve(&self, _ctx: &ResolutionContext) -> AggregationResult<Option<Document>> {
        Ok(Some(self.clone()))
    }
}

pub(crate) fn stage_document(name: &str, body: impl Into<Bson>) -> Document {
    let mut stage = Document::new();
    stage.insert(name, body.into());
    stage
}
