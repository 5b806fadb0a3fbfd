//! `$group` accumulators.

use bson::{Bson, Document};

use crate::{
    context::ResolutionContext,
    error::AggregationResult,
    expression::{Expression, Resolve, UnaryExpression},
    operand::Operand,
};

/// The scope a `$group` accumulator callback receives.
#[derive(Debug, Default, Clone, Copy)]
pub struct AccumulatorScope {
    _private: (),
}

macro_rules! accumulators {
    ($($(#[$meta:meta])* $method:ident => $name:literal),* $(,)?) => {
        $(
            $(#[$meta])*
            pub fn $method(&self, operand: impl Into<Operand>) -> Expression {
                Expression::new(UnaryExpression::new($name, operand.into()))
            }
        )*
    };
}

impl AccumulatorScope {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }

    accumulators! {
        /// `$sum`
        sum => "$sum",
        /// `$avg`
        avg => "$avg",
        /// `$min`
        min => "$min",
        /// `$max`
        max => "$max",
        /// `$first`
        first => "$first",
        /// `$last`
        last => "$last",
        /// `$push`
        push => "$push",
        /// `$addToSet`
        add_to_set => "$addToSet",
        /// `$stdDevPop`
        std_dev_pop => "$stdDevPop",
        /// `$stdDevSamp`
        std_dev_samp => "$stdDevSamp",
    }

    /// `$count`, the number of documents in the group.
    pub fn count(&self) -> Expression {
        Expression::new(CountAccumulator)
    }
}

#[derive(Debug)]
struct CountAccumulator;

impl Resolve for CountAccumulator {
    fn resolve(&self, _ctx: &ResolutionContext) -> AggregationResult<Bson> {
        let mut node = Document::new();
        node.insert("$count", Document::new());
        Ok(Bson::Document(node))
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn accumulators_wrap_a_single_operand() {
        let a = AccumulatorScope::new();

        assert_eq!(a.sum(1).to_bson().unwrap(), Bson::Document(doc! { "$sum": 1 }));
        assert_eq!(a.avg("qty").to_bson().unwrap(), Bson::Document(doc! { "$avg": "$qty" }));
        assert_eq!(
            a.add_to_set("tags").to_bson().unwrap(),
            Bson::Document(doc! { "$addToSet": "$tags" })
        );
        assert_eq!(
            a.sum(Operand::expression(|e| e.multiply(|m| m.of("price").times("qty"))))
                .to_bson()
                .unwrap(),
            Bson::Document(doc! { "$sum": { "$multiply": ["$price", "$qty"] } })
        );
    }

    #[test]
    fn count_takes_no_operand() {
        assert_eq!(
            AccumulatorScope::new().count().to_bson().unwrap(),
            Bson::Document(doc! { "$count": {} })
        );
    }
}
