//! `$sort`

use bson::{Bson, Document, doc};

use crate::{
    context::ResolutionContext,
    error::{AggregationError, AggregationResult},
    property::FieldPath,
    stage::{Stage, stage_document},
};

/// Sort direction of one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// `1`
    Ascending,
    /// `-1`
    Descending,
    /// `{ $meta: "textScore" }`
    TextScore,
    /// `{ $meta: "searchScore" }`
    SearchScore,
}

impl From<SortOrder> for Bson {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Ascending => Bson::Int32(1),
            SortOrder::Descending => Bson::Int32(-1),
            SortOrder::TextScore => Bson::Document(doc! { "$meta": "textScore" }),
            SortOrder::SearchScore => Bson::Document(doc! { "$meta": "searchScore" }),
        }
    }
}

/// Builder for a `$sort` stage. The first declared key is the primary sort key.
#[derive(Debug, Clone, Default)]
pub struct SortStage {
    keys: Vec<(FieldPath, SortOrder)>,
}

impl SortStage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by(&mut self, field: impl Into<FieldPath>, order: SortOrder) -> &mut Self {
        self.keys.push((field.into(), order));
        self
    }

    pub fn ascending(&mut self, field: impl Into<FieldPath>) -> &mut Self {
        self.by(field, SortOrder::Ascending)
    }

    pub fn descending(&mut self, field: impl Into<FieldPath>) -> &mut Self {
        self.by(field, SortOrder::Descending)
    }

    /// Sorts by `$text` relevance, exposed under `field`.
    pub fn text_score(&mut self, field: impl Into<FieldPath>) -> &mut Self {
        self.by(field, SortOrder::TextScore)
    }

    /// Sorts by `$search` relevance, exposed under `field`.
    pub fn search_score(&mut self, field: impl Into<FieldPath>) -> &mut Self {
        self.by(field, SortOrder::SearchScore)
    }
}

impl Stage for SortStage {
    fn name(&self) -> &'static str {
        "$sort"
    }

    fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Option<Document>> {
        if self.keys.is_empty() {
            return Err(AggregationError::incomplete_stage("$sort", "at least one sort key is required"));
        }

        let mut body = Document::new();
        for (field, order) in &self.keys {
            body.insert(field.resolve(ctx)?, *order);
        }

        Ok(Some(stage_document(self.name(), body)))
    }
}
