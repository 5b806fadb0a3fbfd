//! `$count` and `$sortByCount`.

use bson::Document;

use crate::{
    context::ResolutionContext,
    error::AggregationResult,
    operand::Operand,
    stage::{Stage, stage_document},
};

/// `{ $count: field }`
#[derive(Debug, Clone)]
pub struct CountStage(String);

impl CountStage {
    pub fn new(field: impl Into<String>) -> Self {
        CountStage(field.into())
    }
}

impl Stage for CountStage {
    fn name(&self) -> &'static str {
        "$count"
    }

    fn resolve(&self, _ctx: &ResolutionContext) -> AggregationResult<Option<Document>> {
        Ok(Some(stage_document(self.name(), self.0.as_str())))
    }
}

/// `{ $sortByCount: expression }`
#[derive(Debug, Clone)]
pub struct SortByCountStage(Operand);

impl SortByCountStage {
    pub fn new(key: impl Into<Operand>) -> Self {
        SortByCountStage(key.into())
    }
}

impl Stage for SortByCountStage {
    fn name(&self) -> &'static str {
        "$sortByCount"
    }

    fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Option<Document>> {
        Ok(Some(stage_document(self.name(), self.0.resolve(ctx)?)))
    }
}
