//! Variable binding (`$let`) and `$literal`.
//!
//! ```ignore
//! e.let_(|l| {
//!     l.variable("total", Operand::expression(|e| e.add(|a| a.of("price").and("tax"))));
//!     l.variable("discounted", Operand::expression(|e| e.cond(|c| c.case("applyDiscount").then_value(0.9).otherwise_value(1))));
//!     l.in_expression(|e| e.multiply(|m| m.of(Operand::variable("total")).times(Operand::variable("discounted"))));
//! });
//! ```

use bson::{Bson, Document};
use tracing::warn;

use crate::{
    context::ResolutionContext,
    error::AggregationResult,
    expression::{Expression, Expressions, Resolve, operator_node},
    operand::Operand,
};

/// Accumulates the variables and body of a `$let`.
#[derive(Debug, Clone)]
pub struct LetScope {
    variables: Vec<(String, Operand)>,
    body: Option<Expression>,
}

impl LetScope {
    pub(crate) fn new() -> Self {
        Self { variables: Vec::new(), body: None }
    }

    /// Binds `name` to `value`, a raw document, literal, reference or sub-expression.
    pub fn variable(&mut self, name: impl Into<String>, value: impl Into<Operand>) -> &mut Self {
        self.variables.push((name.into(), value.into()));
        self
    }

    /// Binds `name` to the expression built by `build`.
    pub fn variable_expression<R: Into<Expression>>(
        &mut self,
        name: impl Into<String>,
        build: impl FnOnce(&Expressions) -> R,
    ) -> &mut Self {
        self.variable(name, Operand::Expression(build(&Expressions::new()).into()))
    }

    /// Sets the expression the variables are bound in.
    pub fn in_expression<R: Into<Expression>>(&mut self, build: impl FnOnce(&Expressions) -> R) -> &mut Self {
        self.body = Some(build(&Expressions::new()).into());
        self
    }
}

impl Resolve for LetScope {
    fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Bson> {
        let mut variables = Document::new();
        for (name, value) in &self.variables {
            variables.insert(name.as_str(), value.resolve(ctx)?);
        }

        let body = match &self.body {
            Some(body) => body.resolve(ctx)?,
            None => {
                warn!(variables = self.variables.len(), "$let resolved without an `in` expression");
                Bson::Document(Document::new())
            }
        };

        let mut arguments = Document::new();
        arguments.insert("vars", variables);
        arguments.insert("in", body);

        Ok(operator_node("$let", arguments))
    }
}

/// `{ $literal: value }`
#[derive(Debug, Clone)]
pub struct LiteralExpression {
    value: Bson,
}

impl LiteralExpression {
    pub(crate) fn new(value: Bson) -> Self {
        Self { value }
    }
}

impl Resolve for LiteralExpression {
    fn resolve(&self, _ctx: &ResolutionContext) -> AggregationResult<Bson> {
        Ok(operator_node("$literal", self.value.clone()))
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn let_binds_variables_in_order() {
        let e = Expressions::new();
        let expression = e.let_(|l| {
            l.variable_expression("total", |e| e.add(|a| a.of("price").and("tax")))
                .variable("discounted", doc! { "$cond": { "if": "$applyDiscount", "then": 0.9, "else": 1 } })
                .in_expression(|e| {
                    e.multiply(|m| m.of(Operand::variable("total")).times(Operand::variable("discounted")))
                });
        });

        assert_eq!(
            expression.to_bson().unwrap(),
            Bson::Document(doc! {
                "$let": {
                    "vars": {
                        "total": { "$add": ["$price", "$tax"] },
                        "discounted": { "$cond": { "if": "$applyDiscount", "then": 0.9, "else": 1 } },
                    },
                    "in": { "$multiply": ["$$total", "$$discounted"] },
                }
            })
        );
    }

    #[test]
    fn let_without_body_resolves_to_an_empty_document() {
        let e = Expressions::new();
        let expression = e.let_(|l| {
            l.variable("x", 1);
        });

        assert_eq!(
            expression.to_bson().unwrap(),
            Bson::Document(doc! { "$let": { "vars": { "x": 1 }, "in": {} } })
        );
    }

    #[test]
    fn literal_is_not_interpreted() {
        let e = Expressions::new();

        assert_eq!(
            e.literal("$price").to_bson().unwrap(),
            Bson::Document(doc! { "$literal": "$price" })
        );
    }
}
