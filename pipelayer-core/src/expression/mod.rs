//! Aggregation expression builders.
//!
//! Every operator family has a small builder exposing only the vocabulary that makes sense for
//! it. Builders are entered through an [`Expressions`] scope, which is what every
//! sub-expression callback receives:
//!
//! ```ignore
//! use pipelayer::operand::Operand;
//!
//! let total = Operand::expression(|e| e.add(|a| a.of("price").and("fee")));
//! let label = Operand::expression(|e| {
//!     e.cond(|c| c.case(Operand::expression(|e| e.gte(|g| g.of("qty").greater_than_equal(250))))
//!         .then_value("bulk")
//!         .otherwise_value("retail"))
//! });
//! ```
//!
//! Builders only record what the caller declared. Field references, property chains and
//! nested expressions are resolved when [`Expression::resolve`] is called, which normally
//! happens once per pipeline build.
//!
//! # Families
//!
//! - [`arithmetic`] - `$add`, `$multiply`, `$subtract`, `$divide`, `$mod`
//! - [`comparison`] - `$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`, `$cmp`
//! - [`boolean`] - `$and`, `$or`, `$not`
//! - [`conditional`] - `$cond`, `$ifNull`, `$switch`
//! - [`variable`] - `$let`, `$literal`
//! - [`accumulator`] - `$group` accumulators

pub mod accumulator;
pub mod arithmetic;
pub mod boolean;
pub mod comparison;
pub mod conditional;
pub mod operator;
pub mod variable;

use bson::{Bson, Document};
use std::{fmt::Debug, sync::Arc};

use crate::{
    context::ResolutionContext,
    criteria::{Criteria, CriteriaVisitor, ExpressionTranslator},
    error::AggregationResult,
    operand::Operand,
};

use self::{
    conditional::{CondScope, IfNullScope, SwitchScope},
    operator::{
        Add, And, BinaryScope, Compare, Divide, Equal, GreaterThan, GreaterThanEqual, LessThan,
        LessThanEqual, Modulo, Multiply, NotEqual, Or, Subtract, VariadicScope,
    },
    variable::{LetScope, LiteralExpression},
};

/// A declarative node that resolves into its wire form against a [`ResolutionContext`].
pub trait Resolve: Debug + Send + Sync {
    /// Resolves this node, recursively resolving everything nested in it.
    ///
    /// # Errors
    ///
    /// Returns an error if a required part of the node was never declared, or if a nested
    /// operand fails to resolve.
    fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Bson>;
}

/// A built, not yet resolved, aggregation expression.
///
/// Expressions are cheap to clone and can be reused as operands of other expressions any
/// number of times.
#[derive(Debug, Clone)]
pub struct Expression(Arc<dyn Resolve>);

impl Expression {
    /// Wraps a declarative node.
    pub fn new(node: impl Resolve + 'static) -> Self {
        Expression(Arc::new(node))
    }

    /// Resolves this expression against `ctx`.
    pub fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Bson> {
        self.0.resolve(ctx)
    }

    /// Resolves this expression against a fresh default context.
    pub fn to_bson(&self) -> AggregationResult<Bson> {
        self.resolve(&ResolutionContext::default())
    }
}

impl<T: Resolve + 'static> From<T> for Expression {
    fn from(value: T) -> Self {
        Expression::new(value)
    }
}

impl From<Operand> for Expression {
    fn from(value: Operand) -> Self {
        match value {
            Operand::Expression(expression) => expression,
            operand => Expression::new(OperandNode(operand)),
        }
    }
}

impl From<Criteria> for Expression {
    fn from(value: Criteria) -> Self {
        Expression::new(CriteriaExpression(value))
    }
}

/// A bare operand used where an expression is expected.
#[derive(Debug)]
struct OperandNode(Operand);

impl Resolve for OperandNode {
    fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Bson> {
        self.0.resolve(ctx)
    }
}

/// A filter criteria used as an aggregation expression.
#[derive(Debug)]
pub(crate) struct CriteriaExpression(pub(crate) Criteria);

impl Resolve for CriteriaExpression {
    fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Bson> {
        Ok(Bson::Document(ExpressionTranslator::new(ctx).visit_criteria(&self.0)?))
    }
}

/// `{ operator: [operands...] }`
#[derive(Debug, Clone)]
pub(crate) struct ListExpression {
    operator: &'static str,
    operands: Vec<Operand>,
}

impl ListExpression {
    pub(crate) fn new(operator: &'static str, operands: Vec<Operand>) -> Self {
        Self { operator, operands }
    }
}

impl Resolve for ListExpression {
    fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Bson> {
        Ok(operator_node(self.operator, resolve_all(&self.operands, ctx)?))
    }
}

/// `{ operator: operand }`
#[derive(Debug, Clone)]
pub(crate) struct UnaryExpression {
    operator: &'static str,
    operand: Operand,
}

impl UnaryExpression {
    pub(crate) fn new(operator: &'static str, operand: Operand) -> Self {
        Self { operator, operand }
    }
}

impl Resolve for UnaryExpression {
    fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Bson> {
        Ok(operator_node(self.operator, self.operand.resolve(ctx)?))
    }
}

pub(crate) fn resolve_all(operands: &[Operand], ctx: &ResolutionContext) -> AggregationResult<Vec<Bson>> {
    operands
        .iter()
        .map(|operand| operand.resolve(ctx))
        .collect()
}

pub(crate) fn operator_node(operator: &str, argument: impl Into<Bson>) -> Bson {
    let mut node = Document::new();
    node.insert(operator, argument.into());
    Bson::Document(node)
}

/// The scope every expression callback receives.
///
/// Each method opens the builder of one operator family and returns the finished
/// [`Expression`]. The scope itself holds no state, so nested callbacks never see anything
/// declared by an enclosing scope.
#[derive(Debug, Default, Clone, Copy)]
pub struct Expressions {
    _private: (),
}

impl Expressions {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }

    /// `$add`: sums numbers, or adds milliseconds to a date.
    pub fn add<R: Into<Expression>>(&self, build: impl FnOnce(&VariadicScope<Add>) -> R) -> Expression {
        build(&VariadicScope::new()).into()
    }

    /// `$multiply`
    pub fn multiply<R: Into<Expression>>(
        &self,
        build: impl FnOnce(&VariadicScope<Multiply>) -> R,
    ) -> Expression {
        build(&VariadicScope::new()).into()
    }

    /// `$subtract`
    pub fn subtract<R: Into<Expression>>(
        &self,
        build: impl FnOnce(&BinaryScope<Subtract>) -> R,
    ) -> Expression {
        build(&BinaryScope::new()).into()
    }

    /// `$divide`
    pub fn divide<R: Into<Expression>>(&self, build: impl FnOnce(&BinaryScope<Divide>) -> R) -> Expression {
        build(&BinaryScope::new()).into()
    }

    /// `$mod`
    pub fn modulo<R: Into<Expression>>(&self, build: impl FnOnce(&BinaryScope<Modulo>) -> R) -> Expression {
        build(&BinaryScope::new()).into()
    }

    /// `$eq`
    pub fn eq<R: Into<Expression>>(&self, build: impl FnOnce(&VariadicScope<Equal>) -> R) -> Expression {
        build(&VariadicScope::new()).into()
    }

    /// `$ne`
    pub fn ne<R: Into<Expression>>(&self, build: impl FnOnce(&VariadicScope<NotEqual>) -> R) -> Expression {
        build(&VariadicScope::new()).into()
    }

    /// `$gt`
    pub fn gt<R: Into<Expression>>(
        &self,
        build: impl FnOnce(&VariadicScope<GreaterThan>) -> R,
    ) -> Expression {
        build(&VariadicScope::new()).into()
    }

    /// `$gte`
    pub fn gte<R: Into<Expression>>(
        &self,
        build: impl FnOnce(&VariadicScope<GreaterThanEqual>) -> R,
    ) -> Expression {
        build(&VariadicScope::new()).into()
    }

    /// `$lt`
    pub fn lt<R: Into<Expression>>(&self, build: impl FnOnce(&VariadicScope<LessThan>) -> R) -> Expression {
        build(&VariadicScope::new()).into()
    }

    /// `$lte`
    pub fn lte<R: Into<Expression>>(
        &self,
        build: impl FnOnce(&VariadicScope<LessThanEqual>) -> R,
    ) -> Expression {
        build(&VariadicScope::new()).into()
    }

    /// `$cmp`
    pub fn cmp<R: Into<Expression>>(&self, build: impl FnOnce(&BinaryScope<Compare>) -> R) -> Expression {
        build(&BinaryScope::new()).into()
    }

    /// `$and`
    pub fn and<R: Into<Expression>>(&self, build: impl FnOnce(&VariadicScope<And>) -> R) -> Expression {
        build(&VariadicScope::new()).into()
    }

    /// `$or`
    pub fn or<R: Into<Expression>>(&self, build: impl FnOnce(&VariadicScope<Or>) -> R) -> Expression {
        build(&VariadicScope::new()).into()
    }

    /// `$not`
    pub fn not(&self, operand: impl Into<Operand>) -> Expression {
        Expression::new(ListExpression::new("$not", vec![operand.into()]))
    }

    /// `$cond`: a three phase `case`, `then`, `otherwise` builder.
    pub fn cond<R: Into<Expression>>(&self, build: impl FnOnce(&CondScope) -> R) -> Expression {
        build(&CondScope::new()).into()
    }

    /// `$ifNull`: null-check candidates followed by a replacement.
    pub fn if_null<R: Into<Expression>>(&self, build: impl FnOnce(&IfNullScope) -> R) -> Expression {
        build(&IfNullScope::new()).into()
    }

    /// `$switch`: ordered branches and an optional default.
    pub fn switch(&self, build: impl FnOnce(&mut SwitchScope)) -> Expression {
        let mut scope = SwitchScope::new();
        build(&mut scope);
        Expression::new(scope)
    }

    /// `$let`: named variables and the expression they are bound in.
    pub fn let_(&self, build: impl FnOnce(&mut LetScope)) -> Expression {
        let mut scope = LetScope::new();
        build(&mut scope);
        Expression::new(scope)
    }

    /// `$literal`: a value the engine must not interpret.
    pub fn literal(&self, value: impl Into<Bson>) -> Expression {
        Expression::new(LiteralExpression::new(value.into()))
    }

    /// `$meta`: per-document metadata such as `"searchScore"` or `"textScore"`.
    pub fn meta(&self, keyword: impl Into<String>) -> Expression {
        Expression::new(UnaryExpression::new("$meta", Operand::literal(keyword.into())))
    }

    /// A field reference used as a whole expression.
    pub fn field(&self, path: impl Into<Operand>) -> Expression {
        let operand: Operand = path.into();
        operand.into()
    }

    /// A `$$variable` reference used as a whole expression.
    pub fn variable(&self, name: impl Into<String>) -> Expression {
        Operand::variable(name).into()
    }

    /// A filter criteria translated into expression form.
    pub fn criteria(&self, criteria: Criteria) -> Expression {
        criteria.into()
    }
}
