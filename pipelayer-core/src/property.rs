//! Property references and their resolution into dotted field paths.
//!
//! A [`Property`] is an opaque handle to a named field of a record shape. Properties are
//! usually generated by `#[derive(Record)]`, but can be built by hand as well:
//!
//! ```ignore
//! use pipelayer::property::Property;
//!
//! let city = Property::new("address").nested(Property::new("city").with_name("town"));
//! ```
//!
//! Resolution is performed by a [`FieldNameResolver`], which the
//! [`ResolutionContext`](crate::context::ResolutionContext) carries. The
//! [`DefaultFieldNameResolver`] joins chains with `.` and applies rename overrides, except for
//! identity properties which always resolve to [`IDENTITY_FIELD`].

use std::{borrow::Cow, fmt::Debug, sync::Arc};

use crate::{
    context::ResolutionContext,
    error::{AggregationError, AggregationResult},
};

/// The reserved field name every identity property resolves to.
pub const IDENTITY_FIELD: &str = "_id";

/// The interface a field name resolver needs from a property reference.
pub trait PropertyReference: Debug + Send + Sync {
    /// The name the property was declared with in its record shape.
    fn declared_name(&self) -> &str;

    /// The explicit wire name of this property, if it was renamed.
    fn rename_override(&self) -> Option<&str>;

    /// Whether this property is the identity (primary key) of its record shape.
    fn is_identity(&self) -> bool;

    /// The property this one is nested in, if any.
    fn parent_reference(&self) -> Option<&dyn PropertyReference>;
}

/// A reference to a field of a record shape, possibly nested in a parent property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    name: Cow<'static, str>,
    value: Option<Cow<'static, str>>,
    rename: Option<Cow<'static, str>>,
    identity: bool,
    parent: Option<Arc<Property>>,
}

impl Property {
    /// Creates a reference to a property declared as `name`.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Property {
            name: name.into(),
            value: None,
            rename: None,
            identity: false,
            parent: None,
        }
    }

    /// Creates a reference to the identity property declared as `name`.
    pub fn identity(name: impl Into<Cow<'static, str>>) -> Self {
        Property { identity: true, ..Property::new(name) }
    }

    /// Sets the `value` rename override. It takes precedence over [`Property::with_name`].
    pub fn with_value(mut self, value: impl Into<Cow<'static, str>>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Sets the `name` rename override.
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.rename = Some(name.into());
        self
    }

    /// Nests `child` inside this property, returning the child.
    ///
    /// If `child` is itself a chain, this property becomes the parent of the chain's root, so
    /// `a.nested(b.nested(c))` and `a.nested(b).nested(c)` denote the same path.
    pub fn nested(self, mut child: Property) -> Property {
        let parent = match child.parent.take() {
            Some(existing) => self.nested(Arc::unwrap_or_clone(existing)),
            None => self,
        };
        child.parent = Some(Arc::new(parent));
        child
    }

    /// Returns the number of links in this chain.
    pub fn depth(&self) -> usize {
        1 + self.parent.as_ref().map_or(0, |parent| parent.depth())
    }
}

impl PropertyReference for Property {
    fn declared_name(&self) -> &str {
        &self.name
    }

    fn rename_override(&self) -> Option<&str> {
        self.value.as_deref().or(self.rename.as_deref())
    }

    fn is_identity(&self) -> bool {
        self.identity
    }

    fn parent_reference(&self) -> Option<&dyn PropertyReference> {
        self.parent.as_deref().map(|parent| parent as &dyn PropertyReference)
    }
}

/// Maps a property reference to the dotted field name used on the wire.
pub trait FieldNameResolver: Debug + Send + Sync {
    /// Resolves `property` into a dotted field path.
    ///
    /// # Errors
    ///
    /// Returns [`AggregationError::InvalidFieldPath`] if the reference cannot name a field.
    fn resolve(&self, property: &dyn PropertyReference) -> AggregationResult<String>;
}

/// Resolves chains by joining each link's wire name with `.`.
///
/// A link's wire name is [`IDENTITY_FIELD`] for identity properties, otherwise its rename
/// override, otherwise its declared name.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFieldNameResolver;

impl DefaultFieldNameResolver {
    fn segment<'a>(&self, property: &'a dyn PropertyReference) -> AggregationResult<&'a str> {
        let segment = if property.is_identity() {
            IDENTITY_FIELD
        } else {
            property
                .rename_override()
                .unwrap_or_else(|| property.declared_name())
        };

        if segment.is_empty() {
            return Err(AggregationError::InvalidFieldPath(format!(
                "property {:?} resolves to an empty segment",
                property.declared_name()
            )));
        }

        Ok(segment)
    }
}

impl FieldNameResolver for DefaultFieldNameResolver {
    fn resolve(&self, property: &dyn PropertyReference) -> AggregationResult<String> {
        let segment = self.segment(property)?;

        match property.parent_reference() {
            Some(parent) => Ok(format!("{}.{}", self.resolve(parent)?, segment)),
            None => Ok(segment.to_string()),
        }
    }
}

/// A field named either by a dotted path string or by a property reference.
///
/// Stage builders accept `impl Into<FieldPath>` wherever a field name is expected, so both
/// `"address.city"` and a generated property can be passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPath {
    /// A dotted path written by the caller.
    Name(String),
    /// A property reference resolved through the context.
    Property(Property),
}

impl FieldPath {
    /// Resolves this path into a dotted field name.
    ///
    /// # Errors
    ///
    /// Returns [`AggregationError::InvalidFieldPath`] for an empty path.
    pub fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<String> {
        match self {
            FieldPath::Name(name) if name.is_empty() => {
                Err(AggregationError::InvalidFieldPath("empty field path".to_string()))
            }
            FieldPath::Name(name) => Ok(name.clone()),
            FieldPath::Property(property) => ctx.resolve_property(property),
        }
    }

    /// Resolves this path into a field reference carrying the `$` sigil.
    ///
    /// Names that already start with `$` are passed through unchanged.
    pub fn resolve_reference(&self, ctx: &ResolutionContext) -> AggregationResult<String> {
        let path = self.resolve(ctx)?;

        if path.starts_with('$') {
            Ok(path)
        } else {
            Ok(format!("${path}"))
        }
    }
}

impl From<&str> for FieldPath {
    fn from(value: &str) -> Self {
        FieldPath::Name(value.to_string())
    }
}

impl From<String> for FieldPath {
    fn from(value: String) -> Self {
        FieldPath::Name(value)
    }
}

impl From<&String> for FieldPath {
    fn from(value: &String) -> Self {
        FieldPath::Name(value.clone())
    }
}

impl From<Property> for FieldPath {
    fn from(value: Property) -> Self {
        FieldPath::Property(value)
    }
}

impl From<&Property> for FieldPath {
    fn from(value: &Property) -> Self {
        FieldPath::Property(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn resolve(property: &Property) -> String {
        DefaultFieldNameResolver.resolve(property).unwrap()
    }

    #[test]
    fn resolves_declared_name() {
        assert_eq!(resolve(&Property::new("price")), "price");
    }

    #[test]
    fn value_override_wins_over_name_override() {
        let property = Property::new("price").with_name("cost").with_value("amount");
        assert_eq!(resolve(&property), "amount");

        let property = Property::new("price").with_name("cost");
        assert_eq!(resolve(&property), "cost");
    }

    #[test]
    fn identity_resolves_to_reserved_name() {
        let property = Property::identity("id").with_value("ignored");
        assert_eq!(resolve(&property), "_id");
    }

    #[test]
    fn chains_are_dot_joined() {
        let property = Property::new("order")
            .nested(Property::new("customer").with_name("buyer"))
            .nested(Property::new("name"));

        assert_eq!(property.depth(), 3);
        assert_eq!(resolve(&property), "order.buyer.name");
    }

    #[test]
    fn nesting_a_chain_grafts_onto_its_root() {
        let left = Property::new("a").nested(Property::new("b").nested(Property::new("c")));
        let right = Property::new("a").nested(Property::new("b")).nested(Property::new("c"));

        assert_eq!(resolve(&left), "a.b.c");
        assert_eq!(left, right);
    }

    #[test]
    fn identity_is_reserved_at_any_depth() {
        let property = Property::new("customer").nested(Property::identity("id"));
        assert_eq!(resolve(&property), "customer._id");

        let property = Property::identity("id").nested(Property::new("part"));
        assert_eq!(resolve(&property), "_id.part");
    }

    #[test]
    fn empty_segments_are_rejected() {
        let result = DefaultFieldNameResolver.resolve(&Property::new("a").nested(Property::new("")));
        assert!(matches!(result, Err(AggregationError::InvalidFieldPath(_))));
    }

    #[test]
    fn field_references_carry_a_single_sigil() {
        let ctx = ResolutionContext::default();

        assert_eq!(FieldPath::from("price").resolve_reference(&ctx).unwrap(), "$price");
        assert_eq!(FieldPath::from("$price").resolve_reference(&ctx).unwrap(), "$price");
        assert_eq!(
            FieldPath::from(Property::identity("id")).resolve_reference(&ctx).unwrap(),
            "$_id"
        );
    }
}
