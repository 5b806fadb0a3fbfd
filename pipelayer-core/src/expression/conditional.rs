//! Conditional operators: `$cond`, `$ifNull` and `$switch`.
//!
//! `$cond` is a typestate builder: only a builder that went through `case`, `then` and
//! `otherwise` converts into an [`Expression`](crate::expression::Expression), so a missing
//! phase is rejected by the compiler.
//!
//! ```ignore
//! e.cond(|c| c.case(Filter::gte("qty", 250)).then_value(30).otherwise_value(20));
//! e.if_null(|n| n.case("description").or("summary").then_value("Unspecified"));
//! e.switch(|s| {
//!     s.branch(|e| e.criteria(Filter::eq("grade", "A")), Operand::literal("good"));
//!     s.default_value("unknown");
//! });
//! ```

use bson::{Bson, Document};

use crate::{
    context::ResolutionContext,
    error::{AggregationError, AggregationResult},
    expression::{Expression, Expressions, Resolve, operator_node, resolve_all},
    operand::Operand,
};

/// Entry point of `$cond`.
#[derive(Debug)]
pub struct CondScope {
    _private: (),
}

impl CondScope {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }

    /// Declares the condition.
    ///
    /// Accepts a boolean literal, a raw expression document, a field or property reference, a
    /// filter [`Criteria`](crate::criteria::Criteria), or a sub-expression.
    pub fn case(&self, condition: impl Into<Operand>) -> CondCase {
        CondCase { condition: condition.into() }
    }
}

/// `$cond` with its condition declared.
#[derive(Debug, Clone)]
pub struct CondCase {
    condition: Operand,
}

impl CondCase {
    /// Declares the result when the condition holds.
    pub fn then(self, operand: impl Into<Operand>) -> CondThen {
        CondThen { condition: self.condition, then: operand.into() }
    }

    /// Declares a literal result when the condition holds.
    pub fn then_value(self, value: impl Into<Bson>) -> CondThen {
        self.then(Operand::literal(value))
    }
}

/// `$cond` with its condition and positive branch declared.
#[derive(Debug, Clone)]
pub struct CondThen {
    condition: Operand,
    then: Operand,
}

impl CondThen {
    /// Declares the result when the condition does not hold.
    pub fn otherwise(self, operand: impl Into<Operand>) -> CondExpression {
        CondExpression {
            condition: self.condition,
            then: self.then,
            otherwise: operand.into(),
        }
    }

    /// Declares a literal result when the condition does not hold.
    pub fn otherwise_value(self, value: impl Into<Bson>) -> CondExpression {
        self.otherwise(Operand::literal(value))
    }
}

/// A complete `$cond`.
#[derive(Debug, Clone)]
pub struct CondExpression {
    condition: Operand,
    then: Operand,
    otherwise: Operand,
}

impl Resolve for CondExpression {
    fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Bson> {
        let mut arguments = Document::new();
        arguments.insert("if", self.condition.resolve(ctx)?);
        arguments.insert("then", self.then.resolve(ctx)?);
        arguments.insert("else", self.otherwise.resolve(ctx)?);

        Ok(operator_node("$cond", arguments))
    }
}

/// Entry point of `$ifNull`.
#[derive(Debug)]
pub struct IfNullScope {
    _private: (),
}

impl IfNullScope {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }

    /// Declares the first candidate checked for null.
    pub fn case(&self, candidate: impl Into<Operand>) -> IfNullCase {
        IfNullCase { candidates: vec![candidate.into()] }
    }
}

/// `$ifNull` with at least one candidate declared.
#[derive(Debug, Clone)]
pub struct IfNullCase {
    candidates: Vec<Operand>,
}

impl IfNullCase {
    /// Declares another candidate, checked after the previous ones.
    pub fn or(mut self, candidate: impl Into<Operand>) -> Self {
        self.candidates.push(candidate.into());
        self
    }

    /// Declares the replacement used when every candidate is null.
    pub fn then(self, replacement: impl Into<Operand>) -> IfNullExpression {
        IfNullExpression {
            candidates: self.candidates,
            replacement: replacement.into(),
        }
    }

    /// Declares a literal replacement used when every candidate is null.
    pub fn then_value(self, replacement: impl Into<Bson>) -> IfNullExpression {
        self.then(Operand::literal(replacement))
    }
}

/// A complete `$ifNull`. The replacement resolves as the last element of the operand list.
#[derive(Debug, Clone)]
pub struct IfNullExpression {
    candidates: Vec<Operand>,
    replacement: Operand,
}

impl Resolve for IfNullExpression {
    fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Bson> {
        let mut operands = resolve_all(&self.candidates, ctx)?;
        operands.push(self.replacement.resolve(ctx)?);

        Ok(operator_node("$ifNull", operands))
    }
}

/// Accumulates the branches of a `$switch`.
#[derive(Debug, Clone)]
pub struct SwitchScope {
    branches: Vec<(Expression, Operand)>,
    default: Option<Operand>,
}

impl SwitchScope {
    pub(crate) fn new() -> Self {
        Self { branches: Vec::new(), default: None }
    }

    /// Appends a branch taken when the expression built by `case` is true.
    pub fn branch<R: Into<Expression>>(
        &mut self,
        case: impl FnOnce(&Expressions) -> R,
        then: impl Into<Operand>,
    ) -> &mut Self {
        self.branches.push((case(&Expressions::new()).into(), then.into()));
        self
    }

    /// Appends a branch with a literal result.
    pub fn branch_value<R: Into<Expression>>(
        &mut self,
        case: impl FnOnce(&Expressions) -> R,
        then: impl Into<Bson>,
    ) -> &mut Self {
        self.branch(case, Operand::literal(then))
    }

    /// Sets the result used when no branch matches.
    pub fn default(&mut self, operand: impl Into<Operand>) -> &mut Self {
        self.default = Some(operand.into());
        self
    }

    /// Sets a literal result used when no branch matches.
    pub fn default_value(&mut self, value: impl Into<Bson>) -> &mut Self {
        self.default(Operand::literal(value))
    }
}

impl Resolve for SwitchScope {
    fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Bson> {
        if self.branches.is_empty() {
            return Err(AggregationError::incomplete_expression(
                "$switch",
                "at least one branch is required",
            ));
        }

        let branches = self
            .branches
            .iter()
            .map(|(case, then)| -> AggregationResult<Bson> {
                let mut branch = Document::new();
                branch.insert("case", case.resolve(ctx)?);
                branch.insert("then", then.resolve(ctx)?);
                Ok(Bson::Document(branch))
            })
            .collect::<AggregationResult<Vec<_>>>()?;

        let mut arguments = Document::new();
        arguments.insert("branches", branches);
        if let Some(default) = &self.default {
            arguments.insert("default", default.resolve(ctx)?);
        }

        Ok(operator_node("$switch", arguments))
    }
}
