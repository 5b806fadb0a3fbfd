//! Filter criteria and their two wire forms.
//!
//! A [`Criteria`] is a small backend-neutral predicate AST. It is used in two places:
//!
//! - as the body of a `$match` stage, translated by [`QueryDocumentTranslator`] into query
//!   syntax (`{ qty: { $gte: 250 } }`);
//! - as a condition inside an aggregation expression (a `$cond` case, a `$switch` branch, a
//!   `$match` `$expr`), translated by [`ExpressionTranslator`] into expression syntax
//!   (`{ $gte: ["$qty", 250] }`).
//!
//! # Filter API
//!
//! The [`Filter`] struct provides static constructors:
//!
//! - Comparison: `eq`, `ne`, `gt`, `gte`, `lt`, `lte`
//! - String: `starts_with`, `ends_with`, `contains`, `not_contains`
//! - Existence: `exists`, `not_exists`
//! - Array: `any_of`, `none_of`
//! - Logical: `and`, `or`
//!
//! ```ignore
//! use pipelayer::criteria::Filter;
//!
//! let criteria = Filter::eq("status", "active")
//!     .and(Filter::gt("age", 18))
//!     .and(Filter::not_exists("deletedAt"));
//! ```

use bson::{Bson, Document, doc};
use regex::escape;

use crate::{
    context::ResolutionContext,
    error::AggregationError,
    property::FieldPath,
};

/// Field comparison operators for filter criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    /// Equal to.
    Eq,
    /// Not equal to.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Lte,
    /// String contains a substring (case-insensitive), or array contains all values.
    Contains,
    /// Negation of [`FieldOp::Contains`].
    NotContains,
    /// String starts with value (case-insensitive).
    StartsWith,
    /// String ends with value (case-insensitive).
    EndsWith,
    /// Field matches any of the values.
    AnyOf,
    /// Field matches none of the values.
    NoneOf,
}

/// A filter predicate over document fields.
///
/// Criteria can be combined with [`Criteria::and`], [`Criteria::or`] and [`Criteria::not`].
#[derive(Debug, Clone, PartialEq)]
pub enum Criteria {
    /// All nested criteria must match.
    And(Vec<Criteria>),
    /// Any nested criteria must match.
    Or(Vec<Criteria>),
    /// The nested criteria must not match.
    Not(Box<Criteria>),
    /// The field must exist, or must be missing.
    Exists(FieldPath, bool),
    /// Field comparison.
    Field {
        /// The field to compare.
        field: FieldPath,
        /// The comparison operator.
        op: FieldOp,
        /// The value to compare against.
        value: Bson,
    },
}

impl Criteria {
    /// Creates a field comparison.
    pub fn field(field: impl Into<FieldPath>, op: FieldOp, value: impl Into<Bson>) -> Self {
        Criteria::Field {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Combines this criteria with another using logical AND.
    ///
    /// If this criteria is already an AND, the other one is appended to its list.
    pub fn and(self, other: Criteria) -> Self {
        match self {
            Criteria::And(mut list) => {
                list.push(other);
                Criteria::And(list)
            }
            _ => Criteria::And(vec![self, other]),
        }
    }

    /// Combines this criteria with another using logical OR.
    ///
    /// If this criteria is already an OR, the other one is appended to its list.
    pub fn or(self, other: Criteria) -> Self {
        match self {
            Criteria::Or(mut list) => {
                list.push(other);
                Criteria::Or(list)
            }
            _ => Criteria::Or(vec![self, other]),
        }
    }

    /// Negates this criteria.
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Criteria::Not(Box::new(self))
    }
}

/// Static constructors for [`Criteria`].
///
/// Fields accept anything convertible into a [`FieldPath`], so both dotted strings and
/// generated properties work.
pub struct Filter;

impl Filter {
    /// Matches documents where the field equals `value`.
    pub fn eq(field: impl Into<FieldPath>, value: impl Into<Bson>) -> Criteria {
        Criteria::field(field, FieldOp::Eq, value)
    }

    /// Matches documents where the field does not equal `value`.
    pub fn ne(field: impl Into<FieldPath>, value: impl Into<Bson>) -> Criteria {
        Criteria::field(field, FieldOp::Ne, value)
    }

    /// Matches documents where the field is greater than `value`.
    pub fn gt(field: impl Into<FieldPath>, value: impl Into<Bson>) -> Criteria {
        Criteria::field(field, FieldOp::Gt, value)
    }

    /// Matches documents where the field is greater than or equal to `value`.
    pub fn gte(field: impl Into<FieldPath>, value: impl Into<Bson>) -> Criteria {
        Criteria::field(field, FieldOp::Gte, value)
    }

    /// Matches documents where the field is less than `value`.
    pub fn lt(field: impl Into<FieldPath>, value: impl Into<Bson>) -> Criteria {
        Criteria::field(field, FieldOp::Lt, value)
    }

    /// Matches documents where the field is less than or equal to `value`.
    pub fn lte(field: impl Into<FieldPath>, value: impl Into<Bson>) -> Criteria {
        Criteria::field(field, FieldOp::Lte, value)
    }

    /// Matches documents where the string field starts with `value`.
    pub fn starts_with(field: impl Into<FieldPath>, value: impl Into<Bson>) -> Criteria {
        Criteria::field(field, FieldOp::StartsWith, value)
    }

    /// Matches documents where the string field ends with `value`.
    pub fn ends_with(field: impl Into<FieldPath>, value: impl Into<Bson>) -> Criteria {
        Criteria::field(field, FieldOp::EndsWith, value)
    }

    /// Matches documents where the field contains `value`.
    ///
    /// A string value is a case-insensitive substring match; an array value requires every
    /// element to be present in the array field.
    pub fn contains(field: impl Into<FieldPath>, value: impl Into<Bson>) -> Criteria {
        Criteria::field(field, FieldOp::Contains, value)
    }

    /// Matches documents where the field does not contain `value`.
    pub fn not_contains(field: impl Into<FieldPath>, value: impl Into<Bson>) -> Criteria {
        Criteria::field(field, FieldOp::NotContains, value)
    }

    /// Matches documents where the field exists.
    pub fn exists(field: impl Into<FieldPath>) -> Criteria {
        Criteria::Exists(field.into(), true)
    }

    /// Matches documents where the field is missing.
    pub fn not_exists(field: impl Into<FieldPath>) -> Criteria {
        Criteria::Exists(field.into(), false)
    }

    /// Matches documents matching every criteria.
    pub fn and(criteria: impl IntoIterator<Item = Criteria>) -> Criteria {
        Criteria::And(criteria.into_iter().collect())
    }

    /// Matches documents matching any criteria.
    pub fn or(criteria: impl IntoIterator<Item = Criteria>) -> Criteria {
        Criteria::Or(criteria.into_iter().collect())
    }

    /// Matches documents where the field equals any of the values.
    pub fn any_of(field: impl Into<FieldPath>, values: impl Into<Bson>) -> Criteria {
        Criteria::field(field, FieldOp::AnyOf, values)
    }

    /// Matches documents where the field equals none of the values.
    pub fn none_of(field: impl Into<FieldPath>, values: impl Into<Bson>) -> Criteria {
        Criteria::field(field, FieldOp::NoneOf, values)
    }
}

/// Walks a [`Criteria`] tree, one callback per node kind.
pub trait CriteriaVisitor {
    type Output;
    type Error: Into<AggregationError>;

    fn visit_and(&mut self, criteria: &[Criteria]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, criteria: &[Criteria]) -> Result<Self::Output, Self::Error>;
    fn visit_not(&mut self, criteria: &Criteria) -> Result<Self::Output, Self::Error>;
    fn visit_exists(&mut self, field: &FieldPath, should_exist: bool) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &FieldPath,
        op: FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_criteria(&mut self, criteria: &Criteria) -> Result<Self::Output, Self::Error> {
        match criteria {
            Criteria::And(criteria) => self.visit_and(criteria),
            Criteria::Or(criteria) => self.visit_or(criteria),
            Criteria::Not(criteria) => self.visit_not(criteria),
            Criteria::Exists(field, should_exist) => self.visit_exists(field, *should_exist),
            Criteria::Field { field, op, value } => self.visit_field(field, *op, value),
        }
    }
}

fn invalid(op: FieldOp, expected: &str) -> AggregationError {
    AggregationError::InvalidCriteria(format!("{op:?} requires {expected} value"))
}

fn non_empty<'c>(combinator: &str, criteria: &'c [Criteria]) -> Result<&'c [Criteria], AggregationError> {
    if criteria.is_empty() {
        return Err(AggregationError::InvalidCriteria(format!(
            "`{combinator}` requires at least one nested criteria"
        )));
    }
    Ok(criteria)
}

fn as_array(value: &Bson) -> Bson {
    match value {
        Bson::Array(_) => value.clone(),
        other => Bson::Array(vec![other.clone()]),
    }
}

/// Translates criteria into `$match` query syntax.
pub struct QueryDocumentTranslator<'a> {
    ctx: &'a ResolutionContext,
}

impl<'a> QueryDocumentTranslator<'a> {
    pub fn new(ctx: &'a ResolutionContext) -> Self {
        Self { ctx }
    }

    fn visit_list(&mut self, criteria: &[Criteria]) -> Result<Vec<Document>, AggregationError> {
        criteria
            .iter()
            .map(|criteria| self.visit_criteria(criteria))
            .collect()
    }
}

impl CriteriaVisitor for QueryDocumentTranslator<'_> {
    type Output = Document;
    type Error = AggregationError;

    fn visit_and(&mut self, criteria: &[Criteria]) -> Result<Self::Output, Self::Error> {
        Ok(doc! { "$and": self.visit_list(non_empty("and", criteria)?)? })
    }

    fn visit_or(&mut self, criteria: &[Criteria]) -> Result<Self::Output, Self::Error> {
        Ok(doc! { "$or": self.visit_list(non_empty("or", criteria)?)? })
    }

    // Top-level `$not` is not valid query syntax.
    fn visit_not(&mut self, criteria: &Criteria) -> Result<Self::Output, Self::Error> {
        Ok(doc! { "$nor": [self.visit_criteria(criteria)?] })
    }

    fn visit_exists(&mut self, field: &FieldPath, should_exist: bool) -> Result<Self::Output, Self::Error> {
        let field = field.resolve(self.ctx)?;
        Ok(doc! { field: { "$exists": should_exist } })
    }

    fn visit_field(&mut self, field: &FieldPath, op: FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let field = field.resolve(self.ctx)?;

        Ok(doc! {
            field: match op {
                FieldOp::Eq => doc! { "$eq": value },
                FieldOp::Ne => doc! { "$ne": value },
                FieldOp::Gt => doc! { "$gt": value },
                FieldOp::Gte => doc! { "$gte": value },
                FieldOp::Lt => doc! { "$lt": value },
                FieldOp::Lte => doc! { "$lte": value },
                FieldOp::Contains => match value {
                    Bson::String(s) => doc! { "$regex": format!(".*{}.*", escape(s)), "$options": "i" },
                    Bson::Array(arr) => doc! { "$all": arr },
                    _ => return Err(invalid(op, "a string or array")),
                },
                FieldOp::NotContains => match value {
                    Bson::String(s) => doc! { "$not": { "$regex": format!(".*{}.*", escape(s)), "$options": "i" } },
                    Bson::Array(arr) => doc! { "$nin": arr },
                    _ => return Err(invalid(op, "a string or array")),
                },
                FieldOp::StartsWith => match value {
                    Bson::String(s) => doc! { "$regex": format!("^{}", escape(s)), "$options": "i" },
                    _ => return Err(invalid(op, "a string")),
                },
                FieldOp::EndsWith => match value {
                    Bson::String(s) => doc! { "$regex": format!("{}$", escape(s)), "$options": "i" },
                    _ => return Err(invalid(op, "a string")),
                },
                FieldOp::AnyOf => doc! { "$in": as_array(value) },
                FieldOp::NoneOf => doc! { "$nin": as_array(value) },
            }
        })
    }
}

/// Translates criteria into aggregation expression syntax, for use inside `$expr`, `$cond`
/// and `$switch`.
pub struct ExpressionTranslator<'a> {
    ctx: &'a ResolutionContext,
}

impl<'a> ExpressionTranslator<'a> {
    pub fn new(ctx: &'a ResolutionContext) -> Self {
        Self { ctx }
    }

    fn visit_list(&mut self, criteria: &[Criteria]) -> Result<Vec<Document>, AggregationError> {
        criteria
            .iter()
            .map(|criteria| self.visit_criteria(criteria))
            .collect()
    }
}

/// Wraps the parts of `value` that expression syntax would otherwise interpret: strings
/// starting with `$` and embedded documents.
fn expression_literal(value: &Bson) -> Bson {
    match value {
        Bson::String(s) if s.starts_with('$') => Bson::Document(doc! { "$literal": s }),
        Bson::Document(_) => Bson::Document(doc! { "$literal": value.clone() }),
        Bson::Array(items) => Bson::Array(items.iter().map(expression_literal).collect()),
        other => other.clone(),
    }
}

fn regex_match(input: &str, regex: String) -> Document {
    doc! { "$regexMatch": { "input": input, "regex": regex, "options": "i" } }
}

impl CriteriaVisitor for ExpressionTranslator<'_> {
    type Output = Document;
    type Error = AggregationError;

    fn visit_and(&mut self, criteria: &[Criteria]) -> Result<Self::Output, Self::Error> {
        Ok(doc! { "$and": self.visit_list(non_empty("and", criteria)?)? })
    }

    fn visit_or(&mut self, criteria: &[Criteria]) -> Result<Self::Output, Self::Error> {
        Ok(doc! { "$or": self.visit_list(non_empty("or", criteria)?)? })
    }

    fn visit_not(&mut self, criteria: &Criteria) -> Result<Self::Output, Self::Error> {
        Ok(doc! { "$not": [self.visit_criteria(criteria)?] })
    }

    fn visit_exists(&mut self, field: &FieldPath, should_exist: bool) -> Result<Self::Output, Self::Error> {
        let field = field.resolve_reference(self.ctx)?;
        let operator = if should_exist { "$ne" } else { "$eq" };

        Ok(doc! { operator: [{ "$type": field }, "missing"] })
    }

    fn visit_field(&mut self, field: &FieldPath, op: FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let field = field.resolve_reference(self.ctx)?;
        let operand = expression_literal(value);

        Ok(match op {
            FieldOp::Eq => doc! { "$eq": [field, operand] },
            FieldOp::Ne => doc! { "$ne": [field, operand] },
            FieldOp::Gt => doc! { "$gt": [field, operand] },
            FieldOp::Gte => doc! { "$gte": [field, operand] },
            FieldOp::Lt => doc! { "$lt": [field, operand] },
            FieldOp::Lte => doc! { "$lte": [field, operand] },
            FieldOp::Contains => match value {
                Bson::String(s) => regex_match(&field, format!(".*{}.*", escape(s))),
                Bson::Array(_) => doc! { "$setIsSubset": [operand, field] },
                _ => return Err(invalid(op, "a string or array")),
            },
            FieldOp::NotContains => {
                let contains = self.visit_field(&FieldPath::Name(field), FieldOp::Contains, value)?;
                doc! { "$not": [contains] }
            }
            FieldOp::StartsWith => match value {
                Bson::String(s) => regex_match(&field, format!("^{}", escape(s))),
                _ => return Err(invalid(op, "a string")),
            },
            FieldOp::EndsWith => match value {
                Bson::String(s) => regex_match(&field, format!("{}$", escape(s))),
                _ => return Err(invalid(op, "a string")),
            },
            FieldOp::AnyOf => doc! { "$in": [field, expression_literal(&as_array(value))] },
            FieldOp::NoneOf => doc! { "$not": [{ "$in": [field, expression_literal(&as_array(value))] }] },
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::property::Property;

    fn query(criteria: &Criteria) -> Document {
        QueryDocumentTranslator::new(&ResolutionContext::default())
            .visit_criteria(criteria)
            .unwrap()
    }

    fn expression(criteria: &Criteria) -> Document {
        ExpressionTranslator::new(&ResolutionContext::default())
            .visit_criteria(criteria)
            .unwrap()
    }

    #[test]
    fn combinators_flatten_same_kind() {
        let criteria = Filter::eq("a", 1).and(Filter::eq("b", 2)).and(Filter::eq("c", 3));
        assert!(matches!(&criteria, Criteria::And(list) if list.len() == 3));

        let criteria = Filter::eq("a", 1).or(Filter::eq("b", 2)).and(Filter::eq("c", 3));
        assert!(matches!(&criteria, Criteria::And(list) if list.len() == 2));
    }

    #[test]
    fn query_syntax() {
        let criteria = Filter::eq("status", "active")
            .and(Filter::gte("qty", 250))
            .and(Filter::not_exists("deletedAt"));

        assert_eq!(
            query(&criteria),
            doc! {
                "$and": [
                    { "status": { "$eq": "active" } },
                    { "qty": { "$gte": 250 } },
                    { "deletedAt": { "$exists": false } },
                ]
            }
        );
    }

    #[test]
    fn query_syntax_for_strings_and_sets() {
        assert_eq!(
            query(&Filter::starts_with("name", "Al")),
            doc! { "name": { "$regex": "^Al", "$options": "i" } }
        );
        assert_eq!(
            query(&Filter::any_of("tag", vec!["a", "b"])),
            doc! { "tag": { "$in": ["a", "b"] } }
        );
        assert_eq!(
            query(&Filter::eq("a", 1).not()),
            doc! { "$nor": [{ "a": { "$eq": 1 } }] }
        );
    }

    #[test]
    fn expression_syntax() {
        let criteria = Filter::gte("qty", 250).or(Filter::exists("bonus"));

        assert_eq!(
            expression(&criteria),
            doc! {
                "$or": [
                    { "$gte": ["$qty", 250] },
                    { "$ne": [{ "$type": "$bonus" }, "missing"] },
                ]
            }
        );
    }

    #[test]
    fn expression_syntax_for_strings_and_sets() {
        assert_eq!(
            expression(&Filter::not_contains("name", "bob")),
            doc! {
                "$not": [{ "$regexMatch": { "input": "$name", "regex": ".*bob.*", "options": "i" } }]
            }
        );
        assert_eq!(
            expression(&Filter::none_of("tag", "x")),
            doc! { "$not": [{ "$in": ["$tag", ["x"]] }] }
        );
    }

    #[test]
    fn properties_resolve_through_the_context() {
        let field = Property::new("address").nested(Property::new("city"));

        assert_eq!(query(&Filter::eq(field.clone(), "Oslo")), doc! { "address.city": { "$eq": "Oslo" } });
        assert_eq!(expression(&Filter::eq(field, "Oslo")), doc! { "$eq": ["$address.city", "Oslo"] });
    }

    #[test]
    fn dollar_strings_stay_literal_in_both_forms() {
        let criteria = Filter::eq("status", "$draft");

        assert_eq!(query(&criteria), doc! { "status": { "$eq": "$draft" } });
        assert_eq!(
            expression(&criteria),
            doc! { "$eq": ["$status", { "$literal": "$draft" }] }
        );
        assert_eq!(
            expression(&Filter::any_of("tag", vec!["a", "$b"])),
            doc! { "$in": ["$tag", ["a", { "$literal": "$b" }]] }
        );
        assert_eq!(
            expression(&Filter::eq("dims", doc! { "w": 1 })),
            doc! { "$eq": ["$dims", { "$literal": { "w": 1 } }] }
        );
    }

    #[test]
    fn string_operators_match_text_not_patterns() {
        assert_eq!(
            query(&Filter::starts_with("sku", "A.B")),
            doc! { "sku": { "$regex": "^A\\.B", "$options": "i" } }
        );
        assert_eq!(
            query(&Filter::contains("lang", "c++")),
            doc! { "lang": { "$regex": ".*c\\+\\+.*", "$options": "i" } }
        );
        assert_eq!(
            query(&Filter::not_contains("note", "(x)")),
            doc! { "note": { "$not": { "$regex": ".*\\(x\\).*", "$options": "i" } } }
        );
        assert_eq!(
            expression(&Filter::ends_with("file", ".rs")),
            doc! { "$regexMatch": { "input": "$file", "regex": "\\.rs$", "options": "i" } }
        );
    }

    #[test]
    fn empty_combinators_are_rejected() {
        let ctx = ResolutionContext::default();

        for criteria in [Filter::and(Vec::new()), Filter::or(Vec::new())] {
            assert!(matches!(
                QueryDocumentTranslator::new(&ctx).visit_criteria(&criteria),
                Err(AggregationError::InvalidCriteria(_))
            ));
            assert!(matches!(
                ExpressionTranslator::new(&ctx).visit_criteria(&criteria),
                Err(AggregationError::InvalidCriteria(_))
            ));
        }
    }

    #[test]
    fn mismatched_values_are_rejected() {
        let result = QueryDocumentTranslator::new(&ResolutionContext::default())
            .visit_criteria(&Filter::starts_with("name", 5));

        assert!(matches!(result, Err(AggregationError::InvalidCriteria(_))));
    }
}
