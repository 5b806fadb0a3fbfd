//! Arithmetic operators: `$add`, `$multiply`, `$subtract`, `$divide` and `$mod`.
//!
//! ```ignore
//! e.add(|a| a.of("price").and("fee").and(2));
//! e.subtract(|s| s.of("total").by("discount"));
//! e.divide(|d| d.of(Operand::expression(|e| e.multiply(|m| m.of("qty").times("price")))).by(100));
//! ```

use crate::{
    expression::operator::{
        Add, BinaryExpression, Divide, FirstArgument, Modulo, Multiply, Subtract, VariadicExpression,
    },
    operand::Operand,
};

impl VariadicExpression<Add> {
    /// Appends another summand.
    pub fn and(self, operand: impl Into<Operand>) -> Self {
        self.push(operand)
    }
}

impl VariadicExpression<Multiply> {
    /// Appends another factor.
    pub fn times(self, operand: impl Into<Operand>) -> Self {
        self.push(operand)
    }
}

impl FirstArgument<Subtract> {
    /// Supplies the subtrahend.
    pub fn by(self, operand: impl Into<Operand>) -> BinaryExpression<Subtract> {
        self.with(operand)
    }
}

impl FirstArgument<Divide> {
    /// Supplies the divisor.
    pub fn by(self, operand: impl Into<Operand>) -> BinaryExpression<Divide> {
        self.with(operand)
    }
}

impl FirstArgument<Modulo> {
    /// Supplies the divisor.
    pub fn by(self, operand: impl Into<Operand>) -> BinaryExpression<Modulo> {
        self.with(operand)
    }
}

#[cfg(test)]
mod tests {
    use bson::{Bson, doc};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use crate::{
        expression::{Expression, Expressions},
        operand::Operand,
        property::Property,
    };

    fn resolve(expression: Expression) -> Bson {
        expression.to_bson().unwrap()
    }

    #[test]
    fn add_keeps_operands_in_append_order() {
        let e = Expressions::default();
        let expression = e.add(|a| a.of("price").and(Property::new("fee")).and(2).and(0.5));

        assert_eq!(
            resolve(expression),
            Bson::Document(doc! { "$add": ["$price", "$fee", 2, 0.5] })
        );
    }

    #[test]
    fn add_with_k_operands_has_k_entries() {
        let e = Expressions::default();
        for k in 1..6 {
            let resolved = resolve(e.add(|a| (1..k).fold(a.of(0), |acc, i| acc.and(i))));
            let operands = resolved.as_document().unwrap().get_array("$add").unwrap();
            assert_eq!(operands.len(), k as usize);
        }
    }

    #[test]
    fn add_encodes_dates() {
        let e = Expressions::default();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        assert_eq!(
            resolve(e.add(|a| a.of(start).and(86_400_000i64))),
            Bson::Document(doc! {
                "$add": [bson::DateTime::from_millis(1_704_067_200_000), 86_400_000i64]
            })
        );
    }

    #[test]
    fn binary_operators_have_two_operands() {
        let e = Expressions::default();

        assert_eq!(
            resolve(e.subtract(|s| s.of("total").by("discount"))),
            Bson::Document(doc! { "$subtract": ["$total", "$discount"] })
        );
        assert_eq!(
            resolve(e.divide(|d| d.of("total").by(100))),
            Bson::Document(doc! { "$divide": ["$total", 100] })
        );
        assert_eq!(
            resolve(e.modulo(|m| m.of("qty").by(2))),
            Bson::Document(doc! { "$mod": ["$qty", 2] })
        );
    }

    #[test]
    fn multiply_accepts_sub_expressions() {
        let e = Expressions::default();
        let expression = e.multiply(|m| {
            m.of("qty")
                .times(Operand::expression(|e| e.subtract(|s| s.of("price").by("discount"))))
        });

        assert_eq!(
            resolve(expression),
            Bson::Document(doc! {
                "$multiply": ["$qty", { "$subtract": ["$price", "$discount"] }]
            })
        );
    }
}
