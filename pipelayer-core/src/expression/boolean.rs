//! Boolean operators: `$and` and `$or`. `$not` is a plain method of
//! [`Expressions`](crate::expression::Expressions).

use crate::{
    expression::operator::{And, Or, VariadicExpression},
    operand::Operand,
};

impl VariadicExpression<And> {
    /// Appends another conjunct.
    pub fn and(self, operand: impl Into<Operand>) -> Self {
        self.push(operand)
    }
}

impl VariadicExpression<Or> {
    /// Appends another disjunct.
    pub fn or(self, operand: impl Into<Operand>) -> Self {
        self.push(operand)
    }
}
