//! `$lookup`

use bson::Document;

use crate::{
    context::ResolutionContext,
    error::{AggregationError, AggregationResult},
    expression::{Expression, Expressions},
    operand::Operand,
    pipeline::{Pipeline, PipelineBuilder, aggregation},
    property::FieldPath,
    record::Record,
    stage::{Stage, stage_document},
};

/// Builder for a `$lookup` stage.
///
/// Only the output field is required. A lookup without `from` joins against the documents
/// produced by its own pipeline, typically a leading `$documents` stage.
///
/// ```ignore
/// p.lookup(|l| {
///     l.from("warehouses")
///         .variable("order_item", "item")
///         .variable("order_qty", "ordered")
///         .pipeline(|p| {
///             p.match_expression(|e| e.gte(|c| c.of("instock").greater_than_equal(Operand::variable("order_qty"))));
///         })
///         .as_field("stockdata");
/// });
/// ```
#[derive(Debug, Clone, Default)]
pub struct LookupStage {
    from: Option<String>,
    local_field: Option<FieldPath>,
    foreign_field: Option<FieldPath>,
    variables: Vec<(String, Operand)>,
    pipeline: Option<Pipeline>,
    as_field: Option<FieldPath>,
}

impl LookupStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins against the collection named `collection`.
    pub fn from(&mut self, collection: impl Into<String>) -> &mut Self {
        self.from = Some(collection.into());
        self
    }

    /// Joins against the collection of record shape `R`.
    pub fn from_record<R: Record>(&mut self) -> &mut Self {
        self.from(R::collection_name())
    }

    pub fn local_field(&mut self, field: impl Into<FieldPath>) -> &mut Self {
        self.local_field = Some(field.into());
        self
    }

    pub fn foreign_field(&mut self, field: impl Into<FieldPath>) -> &mut Self {
        self.foreign_field = Some(field.into());
        self
    }

    /// Binds `$$name` for use inside the nested pipeline.
    pub fn variable(&mut self, name: impl Into<String>, value: impl Into<Operand>) -> &mut Self {
        self.variables.push((name.into(), value.into()));
        self
    }

    /// Binds `$$name` to the expression built by `build`.
    pub fn variable_expression<R: Into<Expression>>(
        &mut self,
        name: impl Into<String>,
        build: impl FnOnce(&Expressions) -> R,
    ) -> &mut Self {
        self.variable(name, Operand::expression(build))
    }

    /// Runs the pipeline built by `build` against the joined collection.
    pub fn pipeline(&mut self, build: impl FnOnce(&mut PipelineBuilder)) -> &mut Self {
        self.pipeline = Some(aggregation(build));
        self
    }

    /// Runs an already built pipeline against the joined collection.
    pub fn with_pipeline(&mut self, pipeline: Pipeline) -> &mut Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Names the output array field.
    pub fn as_field(&mut self, field: impl Into<FieldPath>) -> &mut Self {
        self.as_field = Some(field.into());
        self
    }
}

impl Stage for LookupStage {
    fn name(&self) -> &'static str {
        "$lookup"
    }

    fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Option<Document>> {
        let Some(as_field) = &self.as_field else {
            return Err(AggregationError::incomplete_stage("$lookup", "the output field `as` is required"));
        };

        let mut body = Document::new();
        if let Some(from) = &self.from {
            body.insert("from", from.as_str());
        }
        if let Some(local_field) = &self.local_field {
            body.insert("localField", local_field.resolve(ctx)?);
        }
        if let Some(foreign_field) = &self.foreign_field {
            body.insert("foreignField", foreign_field.resolve(ctx)?);
        }
        if !self.variables.is_empty() {
            let mut variables = Document::new();
            for (name, value) in &self.variables {
                variables.insert(name.as_str(), value.resolve(ctx)?);
            }
            body.insert("let", variables);
        }
        if let Some(pipeline) = &self.pipeline {
            body.insert("pipeline", pipeline.build_with(ctx)?);
        }
        body.insert("as", as_field.resolve(ctx)?);

        Ok(Some(stage_document(self.name(), body)))
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::criteria::Filter;

    struct Inventory;

    impl Record for Inventory {
        fn collection_name() -> &'static str {
            "inventory"
        }
    }

    fn resolve(stage: &LookupStage) -> AggregationResult<Option<Document>> {
        stage.resolve(&ResolutionContext::default())
    }

    #[test]
    fn equality_join() {
        let mut stage = LookupStage::new();
        stage
            .from_record::<Inventory>()
            .local_field("item")
            .foreign_field("sku")
            .as_field("inventory_docs");

        assert_eq!(
            resolve(&stage).unwrap().unwrap(),
            doc! {
                "$lookup": {
                    "from": "inventory",
                    "localField": "item",
                    "foreignField": "sku",
                    "as": "inventory_docs",
                }
            }
        );
    }

    #[test]
    fn correlated_pipeline_join() {
        let mut stage = LookupStage::new();
        stage
            .from("warehouses")
            .variable("order_item", "item")
            .variable("order_qty", "ordered")
            .pipeline(|p| {
                p.match_expression(|e| {
                    e.and(|a| {
                        a.of(Operand::expression(|e| {
                            e.eq(|c| c.of("stock_item").equal(Operand::variable("order_item")))
                        }))
                        .and(Operand::expression(|e| {
                            e.gte(|c| c.of("instock").greater_than_equal(Operand::variable("order_qty")))
                        }))
                    })
                });
                p.project(|p| {
                    p.exclude("stock_item").exclude_id();
                });
            })
            .as_field("stockdata");

        assert_eq!(
            resolve(&stage).unwrap().unwrap(),
            doc! {
                "$lookup": {
                    "from": "warehouses",
                    "let": { "order_item": "$item", "order_qty": "$ordered" },
                    "pipeline": [
                        {
                            "$match": {
                                "$expr": {
                                    "$and": [
                                        { "$eq": ["$stock_item", "$$order_item"] },
                                        { "$gte": ["$instock", "$$order_qty"] },
                                    ]
                                }
                            }
                        },
                        { "$project": { "stock_item": 0, "_id": 0 } },
                    ],
                    "as": "stockdata",
                }
            }
        );
    }

    #[test]
    fn documents_source_without_from() {
        let mut stage = LookupStage::new();
        stage
            .pipeline(|p| {
                p.documents([doc! { "x": 1 }, doc! { "x": 2 }]);
                p.match_(Filter::gt("x", 1));
            })
            .as_field("extra");

        assert_eq!(
            resolve(&stage).unwrap().unwrap(),
            doc! {
                "$lookup": {
                    "pipeline": [
                        { "$documents": [{ "x": 1 }, { "x": 2 }] },
                        { "$match": { "x": { "$gt": 1 } } },
                    ],
                    "as": "extra",
                }
            }
        );
    }

    #[test]
    fn missing_output_field_fails() {
        let mut stage = LookupStage::new();
        stage.from("inventory").local_field("item").foreign_field("sku");

        assert!(matches!(
            resolve(&stage),
            Err(AggregationError::IncompleteStage { stage: "$lookup", .. })
        ));
    }
}
