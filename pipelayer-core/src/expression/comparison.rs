//! Comparison operators: `$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte` and `$cmp`.
//!
//! ```ignore
//! e.gt(|c| c.of("qty").greater_than(250));
//! e.cmp(|c| c.of("qty").compare_to(250));
//! ```

use crate::{
    expression::operator::{
        BinaryExpression, Compare, Equal, FirstArgument, GreaterThan, GreaterThanEqual, LessThan,
        LessThanEqual, NotEqual, VariadicExpression,
    },
    operand::Operand,
};

impl VariadicExpression<Equal> {
    /// Appends the operand to compare against.
    pub fn equal(self, operand: impl Into<Operand>) -> Self {
        self.push(operand)
    }
}

impl VariadicExpression<NotEqual> {
    /// Appends the operand to compare against.
    pub fn not_equal(self, operand: impl Into<Operand>) -> Self {
        self.push(operand)
    }
}

impl VariadicExpression<GreaterThan> {
    /// Appends the operand to compare against.
    pub fn greater_than(self, operand: impl Into<Operand>) -> Self {
        self.push(operand)
    }
}

impl VariadicExpression<GreaterThanEqual> {
    /// Appends the operand to compare against.
    pub fn greater_than_equal(self, operand: impl Into<Operand>) -> Self {
        self.push(operand)
    }
}

impl VariadicExpression<LessThan> {
    /// Appends the operand to compare against.
    pub fn less_than(self, operand: impl Into<Operand>) -> Self {
        self.push(operand)
    }
}

impl VariadicExpression<LessThanEqual> {
    /// Appends the operand to compare against.
    pub fn less_than_equal(self, operand: impl Into<Operand>) -> Self {
        self.push(operand)
    }
}

impl FirstArgument<Compare> {
    /// Supplies the operand to compare against.
    pub fn compare_to(self, operand: impl Into<Operand>) -> BinaryExpression<Compare> {
        self.with(operand)
    }
}
