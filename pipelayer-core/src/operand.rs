//! Operands: the inputs of every expression operator.
//!
//! An [`Operand`] is one of a literal, a field reference, a property reference or a
//! sub-expression, plus the variable and temporal forms the wire format needs. Every builder
//! entry point accepts `impl Into<Operand>`:
//!
//! | Rust value                               | operand                     | resolves to            |
//! |------------------------------------------|-----------------------------|------------------------|
//! | `&str`, `String`                         | [`Operand::Field`]          | `"$path"`              |
//! | [`Property`]                             | [`Operand::Property`]       | `"$dotted.path"`       |
//! | numbers, `bool`, [`Bson`], [`Document`]  | [`Operand::Literal`]        | the value itself       |
//! | `chrono::DateTime<Utc>`, `NaiveDate`     | [`Operand::Temporal`]       | a BSON date            |
//! | [`Expression`], builder outputs          | [`Operand::Expression`]     | the resolved node      |
//!
//! String literals must be passed explicitly through [`Operand::literal`], since a bare string
//! names a field.

use bson::{Bson, Decimal128, Document};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::{
    context::ResolutionContext,
    criteria::Criteria,
    error::AggregationResult,
    expression::{Expression, Expressions, Resolve},
    property::{FieldPath, Property},
};

/// One input of an expression operator.
#[derive(Debug, Clone)]
pub enum Operand {
    /// A literal value, passed through unchanged.
    Literal(Bson),
    /// A dotted field path, resolved with a single `$` sigil.
    Field(String),
    /// A property reference, resolved through the context with a single `$` sigil.
    Property(Property),
    /// A nested expression, resolved recursively.
    Expression(Expression),
    /// A variable bound by `$let` or a `$lookup` `let`, resolved with a `$$` sigil.
    Variable(String),
    /// A temporal literal, encoded through the context codec.
    Temporal(DateTime<Utc>),
}

impl Operand {
    /// Creates a literal operand. Use this for string literals.
    pub fn literal(value: impl Into<Bson>) -> Self {
        Operand::Literal(value.into())
    }

    /// Creates a field reference operand.
    pub fn field(path: impl Into<String>) -> Self {
        Operand::Field(path.into())
    }

    /// Creates a property reference operand.
    pub fn property(property: Property) -> Self {
        Operand::Property(property)
    }

    /// Creates a sub-expression operand by running `build` against a fresh expression scope.
    pub fn expression<R: Into<Expression>>(build: impl FnOnce(&Expressions) -> R) -> Self {
        Operand::Expression(build(&Expressions::new()).into())
    }

    /// Creates a variable reference operand.
    pub fn variable(name: impl Into<String>) -> Self {
        Operand::Variable(name.into())
    }

    /// Creates a temporal literal operand.
    pub fn temporal(value: DateTime<Utc>) -> Self {
        Operand::Temporal(value)
    }

    /// Resolves this operand into its wire form.
    ///
    /// # Errors
    ///
    /// Propagates failures from property resolution and nested expressions.
    pub fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Bson> {
        match self {
            Operand::Literal(value) => Ok(value.clone()),
            Operand::Field(path) => Ok(Bson::String(
                FieldPath::Name(path.clone()).resolve_reference(ctx)?,
            )),
            Operand::Property(property) => Ok(Bson::String(format!(
                "${}",
                ctx.resolve_property(property)?
            ))),
            Operand::Expression(expression) => expression.resolve(ctx),
            Operand::Variable(name) => Ok(Bson::String(format!(
                "$${}",
                name.trim_start_matches('$')
            ))),
            Operand::Temporal(value) => Ok(ctx.encode_datetime(value)),
        }
    }
}

impl From<&str> for Operand {
    fn from(value: &str) -> Self {
        Operand::Field(value.to_string())
    }
}

impl From<String> for Operand {
    fn from(value: String) -> Self {
        Operand::Field(value)
    }
}

impl From<Property> for Operand {
    fn from(value: Property) -> Self {
        Operand::Property(value)
    }
}

impl From<&Property> for Operand {
    fn from(value: &Property) -> Self {
        Operand::Property(value.clone())
    }
}

impl From<FieldPath> for Operand {
    fn from(value: FieldPath) -> Self {
        match value {
            FieldPath::Name(name) => Operand::Field(name),
            FieldPath::Property(property) => Operand::Property(property),
        }
    }
}

impl From<Expression> for Operand {
    fn from(value: Expression) -> Self {
        Operand::Expression(value)
    }
}

impl<T: Resolve + 'static> From<T> for Operand {
    fn from(value: T) -> Self {
        Operand::Expression(Expression::new(value))
    }
}

impl From<Criteria> for Operand {
    fn from(value: Criteria) -> Self {
        Operand::Expression(value.into())
    }
}

impl From<Bson> for Operand {
    fn from(value: Bson) -> Self {
        Operand::Literal(value)
    }
}

impl From<Document> for Operand {
    fn from(value: Document) -> Self {
        Operand::Literal(Bson::Document(value))
    }
}

impl From<bool> for Operand {
    fn from(value: bool) -> Self {
        Operand::Literal(Bson::Boolean(value))
    }
}

impl From<i32> for Operand {
    fn from(value: i32) -> Self {
        Operand::Literal(Bson::Int32(value))
    }
}

impl From<i64> for Operand {
    fn from(value: i64) -> Self {
        Operand::Literal(Bson::Int64(value))
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Operand::Literal(Bson::Double(value))
    }
}

impl From<Decimal128> for Operand {
    fn from(value: Decimal128) -> Self {
        Operand::Literal(Bson::Decimal128(value))
    }
}

impl From<bson::DateTime> for Operand {
    fn from(value: bson::DateTime) -> Self {
        Operand::Literal(Bson::DateTime(value))
    }
}

impl From<DateTime<Utc>> for Operand {
    fn from(value: DateTime<Utc>) -> Self {
        Operand::Temporal(value)
    }
}

impl From<NaiveDate> for Operand {
    fn from(value: NaiveDate) -> Self {
        Operand::Temporal(value.and_time(NaiveTime::MIN).and_utc())
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn resolve(operand: impl Into<Operand>) -> Bson {
        let operand: Operand = operand.into();
        operand.resolve(&ResolutionContext::default()).unwrap()
    }

    #[test]
    fn strings_are_field_references() {
        assert_eq!(resolve("price"), Bson::String("$price".into()));
        assert_eq!(resolve("$price"), Bson::String("$price".into()));
        assert_eq!(resolve(Operand::literal("price")), Bson::String("price".into()));
    }

    #[test]
    fn properties_are_resolved_through_the_context() {
        let property = Property::new("item").nested(Property::new("price").with_value("cost"));
        assert_eq!(resolve(property), Bson::String("$item.cost".into()));
    }

    #[test]
    fn variables_carry_a_double_sigil() {
        assert_eq!(resolve(Operand::variable("qty")), Bson::String("$$qty".into()));
        assert_eq!(resolve(Operand::variable("$$qty")), Bson::String("$$qty".into()));
    }

    #[test]
    fn temporal_literals_are_bson_dates() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let datetime = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let expected = Bson::DateTime(bson::DateTime::from_millis(1_704_067_200_000));

        assert_eq!(resolve(date), expected);
        assert_eq!(resolve(datetime), expected);
    }

    #[test]
    fn literals_pass_through() {
        assert_eq!(resolve(5), Bson::Int32(5));
        assert_eq!(resolve(2.5), Bson::Double(2.5));
        assert_eq!(resolve(true), Bson::Boolean(true));
        assert_eq!(resolve(doc! { "a": 1 }), Bson::Document(doc! { "a": 1 }));
    }

    #[test]
    fn sub_expressions_are_resolved_recursively() {
        let operand = Operand::expression(|e| e.add(|a| a.of("price").and(1)));
        assert_eq!(resolve(operand), Bson::Document(doc! { "$add": ["$price", 1] }));
    }
}
