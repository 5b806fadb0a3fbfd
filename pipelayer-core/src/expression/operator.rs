//! Operand accumulators shared by the fixed-arity and variadic operator families.
//!
//! Variadic operators (`$add`, `$eq`, `$and`, ...) open a [`VariadicScope`] whose `of` returns a
//! growable [`VariadicExpression`]. Fixed-arity operators (`$subtract`, `$divide`, `$mod`,
//! `$cmp`) open a [`BinaryScope`] whose `of` returns a [`FirstArgument`]; only supplying the
//! second operand yields a [`BinaryExpression`], so a half-built binary operator can never be
//! used as an expression.
//!
//! The combinator names (`and`, `by`, `greater_than`, ...) are defined per operator in the
//! family modules.

use bson::Bson;
use std::{fmt::Debug, marker::PhantomData};

use crate::{
    context::ResolutionContext,
    error::AggregationResult,
    expression::{Resolve, operator_node, resolve_all},
    operand::Operand,
};

/// An aggregation operator identified by its reserved name.
pub trait Operator: Debug + Send + Sync + 'static {
    /// The reserved operator name, including the `$` prefix.
    const NAME: &'static str;
}

macro_rules! operators {
    ($($(#[$meta:meta])* $ident:ident => $name:literal),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy)]
            pub struct $ident;

            impl Operator for $ident {
                const NAME: &'static str = $name;
            }
        )*
    };
}

operators! {
    /// `$add`
    Add => "$add",
    /// `$multiply`
    Multiply => "$multiply",
    /// `$subtract`
    Subtract => "$subtract",
    /// `$divide`
    Divide => "$divide",
    /// `$mod`
    Modulo => "$mod",
    /// `$eq`
    Equal => "$eq",
    /// `$ne`
    NotEqual => "$ne",
    /// `$gt`
    GreaterThan => "$gt",
    /// `$gte`
    GreaterThanEqual => "$gte",
    /// `$lt`
    LessThan => "$lt",
    /// `$lte`
    LessThanEqual => "$lte",
    /// `$cmp`
    Compare => "$cmp",
    /// `$and`
    And => "$and",
    /// `$or`
    Or => "$or",
}

/// Entry point of a variadic operator.
#[derive(Debug)]
pub struct VariadicScope<O: Operator> {
    _operator: PhantomData<O>,
}

impl<O: Operator> VariadicScope<O> {
    pub(crate) fn new() -> Self {
        Self { _operator: PhantomData }
    }

    /// Starts the operand list with `operand`.
    pub fn of(&self, operand: impl Into<Operand>) -> VariadicExpression<O> {
        VariadicExpression {
            operands: vec![operand.into()],
            _operator: PhantomData,
        }
    }
}

/// A variadic operator and its operands, in the order they were appended.
#[derive(Debug, Clone)]
pub struct VariadicExpression<O: Operator> {
    operands: Vec<Operand>,
    _operator: PhantomData<O>,
}

impl<O: Operator> VariadicExpression<O> {
    pub(crate) fn push(mut self, operand: impl Into<Operand>) -> Self {
        self.operands.push(operand.into());
        self
    }

    /// Returns the number of operands declared so far.
    pub fn len(&self) -> usize {
        self.operands.len()
    }

    /// Returns `true` if no operands were declared. Never the case for a built expression.
    pub fn is_empty(&self) -> bool {
        self.operands.is_empty()
    }
}

impl<O: Operator> Resolve for VariadicExpression<O> {
    fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Bson> {
        Ok(operator_node(O::NAME, resolve_all(&self.operands, ctx)?))
    }
}

/// Entry point of a fixed-arity operator.
#[derive(Debug)]
pub struct BinaryScope<O: Operator> {
    _operator: PhantomData<O>,
}

impl<O: Operator> BinaryScope<O> {
    pub(crate) fn new() -> Self {
        Self { _operator: PhantomData }
    }

    /// Supplies the first operand.
    pub fn of(&self, operand: impl Into<Operand>) -> FirstArgument<O> {
        FirstArgument {
            first: operand.into(),
            _operator: PhantomData,
        }
    }
}

/// A fixed-arity operator waiting for its second operand.
#[derive(Debug, Clone)]
pub struct FirstArgument<O: Operator> {
    first: Operand,
    _operator: PhantomData<O>,
}

impl<O: Operator> FirstArgument<O> {
    pub(crate) fn with(self, second: impl Into<Operand>) -> BinaryExpression<O> {
        BinaryExpression {
            first: self.first,
            second: second.into(),
            _operator: PhantomData,
        }
    }
}

/// A fixed-arity operator with both operands.
#[derive(Debug, Clone)]
pub struct BinaryExpression<O: Operator> {
    first: Operand,
    second: Operand,
    _operator: PhantomData<O>,
}

impl<O: Operator> Resolve for BinaryExpression<O> {
    fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Bson> {
        Ok(operator_node(
            O::NAME,
            vec![self.first.resolve(ctx)?, self.second.resolve(ctx)?],
        ))
    }
}
