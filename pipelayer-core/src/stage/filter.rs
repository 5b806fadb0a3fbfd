//! `$match`, `$limit`, `$skip` and `$sample`.

use bson::{Document, doc};

use crate::{
    context::ResolutionContext,
    criteria::{Criteria, CriteriaVisitor, QueryDocumentTranslator},
    error::AggregationResult,
    expression::Expression,
    stage::{Stage, stage_document},
};

/// Builder for a `$match` stage.
#[derive(Debug, Clone)]
pub enum MatchStage {
    /// A query document translated from criteria.
    Criteria(Criteria),
    /// An aggregation expression evaluated through `$expr`.
    Expression(Expression),
}

impl Stage for MatchStage {
    fn name(&self) -> &'static str {
        "$match"
    }

    fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Option<Document>> {
        let body = match self {
            MatchStage::Criteria(criteria) => QueryDocumentTranslator::new(ctx).visit_criteria(criteria)?,
            MatchStage::Expression(expression) => doc! { "$expr": expression.resolve(ctx)? },
        };

        Ok(Some(stage_document(self.name(), body)))
    }
}

/// `{ $limit: n }`
#[derive(Debug, Clone, Copy)]
pub struct LimitStage(pub i64);

impl Stage for LimitStage {
    fn name(&self) -> &'static str {
        "$limit"
    }

    fn resolve(&self, _ctx: &ResolutionContext) -> AggregationResult<Option<Document>> {
        Ok(Some(stage_document(self.name(), self.0)))
    }
}

/// `{ $skip: n }`
#[derive(Debug, Clone, Copy)]
pub struct SkipStage(pub i64);

impl Stage for SkipStage {
    fn name(&self) -> &'static str {
        "$skip"
    }

    fn resolve(&self, _ctx: &ResolutionContext) -> AggregationResult<Option<Document>> {
        Ok(Some(stage_document(self.name(), self.0)))
    }
}

/// `{ $sample: { size: n } }`
#[derive(Debug, Clone, Copy)]
pub struct SampleStage(pub i64);

impl Stage for SampleStage {
    fn name(&self) -> &'static str {
        "$sample"
    }

    fn resolve(&self, _ctx: &ResolutionContext) -> AggregationResult<Option<Document>> {
        Ok(Some(stage_document(self.name(), doc! { "size": self.0 })))
    }
}
