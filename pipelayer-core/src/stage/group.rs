//! `$group`

use bson::{Bson, Document};

use crate::{
    context::ResolutionContext,
    error::{AggregationError, AggregationResult},
    expression::{Expression, Expressions, accumulator::AccumulatorScope},
    operand::Operand,
    property::IDENTITY_FIELD,
    stage::{Stage, stage_document},
};

/// Builder for a `$group` stage.
///
/// The grouping key defaults to `null`, which groups every input document together.
#[derive(Debug, Clone, Default)]
pub struct GroupStage {
    id: Option<Operand>,
    accumulators: Vec<(String, Expression)>,
}

impl GroupStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups every input document together (`_id: null`).
    pub fn id_null(&mut self) -> &mut Self {
        self.id = None;
        self
    }

    /// Groups by a field, property or sub-expression.
    pub fn id(&mut self, key: impl Into<Operand>) -> &mut Self {
        self.id = Some(key.into());
        self
    }

    /// Groups by the expression built by `build`.
    pub fn id_expression<R: Into<Expression>>(&mut self, build: impl FnOnce(&Expressions) -> R) -> &mut Self {
        self.id(Operand::expression(build))
    }

    /// Declares the accumulator built by `build` under the output field `name`.
    ///
    /// `name` must not be `_id`.
    pub fn accumulate<R: Into<Expression>>(
        &mut self,
        name: impl Into<String>,
        build: impl FnOnce(&AccumulatorScope) -> R,
    ) -> &mut Self {
        self.accumulators.push((name.into(), build(&AccumulatorScope::new()).into()));
        self
    }
}

impl Stage for GroupStage {
    fn name(&self) -> &'static str {
        "$group"
    }

    fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Option<Document>> {
        let mut body = Document::new();
        body.insert(
            IDENTITY_FIELD,
            match &self.id {
                Some(key) => key.resolve(ctx)?,
                None => Bson::Null,
            },
        );
        for (name, accumulator) in &self.accumulators {
            if name == IDENTITY_FIELD {
                return Err(AggregationError::incomplete_stage(
                    "$group",
                    "an accumulator cannot be named `_id`, which holds the grouping key",
                ));
            }
            body.insert(name.as_str(), accumulator.resolve(ctx)?);
        }

        Ok(Some(stage_document(self.name(), body)))
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::property::Property;

    fn resolve(stage: &GroupStage) -> Document {
        stage.resolve(&ResolutionContext::default()).unwrap().unwrap()
    }

    #[test]
    fn null_key_by_default() {
        let mut stage = GroupStage::new();
        stage.accumulate("count", |a| a.count());

        assert_eq!(resolve(&stage), doc! { "$group": { "_id": null, "count": { "$count": {} } } });
    }

    #[test]
    fn keys_of_every_kind() {
        let mut stage = GroupStage::new();
        stage.id("cust_id").accumulate("total", |a| a.sum("amount"));
        assert_eq!(
            resolve(&stage),
            doc! { "$group": { "_id": "$cust_id", "total": { "$sum": "$amount" } } }
        );

        let mut stage = GroupStage::new();
        stage.id(Property::new("customer").nested(Property::identity("id")));
        assert_eq!(resolve(&stage), doc! { "$group": { "_id": "$customer._id" } });

        let mut stage = GroupStage::new();
        stage
            .id_expression(|e| e.field("day"))
            .accumulate("avgQty", |a| a.avg("qty"))
            .accumulate("items", |a| a.push("item"))
            .id_null();
        assert_eq!(
            resolve(&stage),
            doc! {
                "$group": {
                    "_id": null,
                    "avgQty": { "$avg": "$qty" },
                    "items": { "$push": "$item" },
                }
            }
        );
    }

    #[test]
    fn accumulators_cannot_replace_the_grouping_key() {
        let mut stage = GroupStage::new();
        stage.id("cust").accumulate("_id", |a| a.sum(1));

        assert!(matches!(
            stage.resolve(&ResolutionContext::default()),
            Err(AggregationError::IncompleteStage { stage: "$group", .. })
        ));
    }
}
