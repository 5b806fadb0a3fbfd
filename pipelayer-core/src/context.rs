//! The resolution context threaded through every `resolve` call.
//!
//! A context is created fresh for each top-level build and handed down, unchanged, to every
//! nested stage and expression. It is the single seam for engine-specific encoding: the
//! [`FieldNameResolver`] that turns property references into dotted paths and the
//! [`ValueCodec`] that encodes temporal literals.
//!
//! ```ignore
//! use pipelayer::context::{ResolutionContext, BsonValueCodec};
//! use pipelayer::property::DefaultFieldNameResolver;
//!
//! let ctx = ResolutionContext::builder()
//!     .with_resolver(DefaultFieldNameResolver)
//!     .with_codec(BsonValueCodec)
//!     .build();
//! let stages = pipeline.build_with(&ctx)?;
//! ```

use bson::Bson;
use chrono::{DateTime, Utc};
use std::{fmt::Debug, sync::Arc};

use crate::{
    error::AggregationResult,
    property::{DefaultFieldNameResolver, FieldNameResolver, PropertyReference},
};

/// Encodes literal values that have no single obvious BSON representation.
pub trait ValueCodec: Debug + Send + Sync {
    /// Encodes a temporal literal.
    fn encode_datetime(&self, value: &DateTime<Utc>) -> Bson;
}

/// Encodes temporal literals as BSON dates with millisecond precision.
#[derive(Debug, Default, Clone, Copy)]
pub struct BsonValueCodec;

impl ValueCodec for BsonValueCodec {
    fn encode_datetime(&self, value: &DateTime<Utc>) -> Bson {
        Bson::DateTime(bson::DateTime::from_millis(value.timestamp_millis()))
    }
}

/// Per-build state shared by every nested resolve call.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    resolver: Arc<dyn FieldNameResolver>,
    codec: Arc<dyn ValueCodec>,
}

impl ResolutionContext {
    /// Creates a builder for a context with custom collaborators.
    pub fn builder() -> ResolutionContextBuilder {
        ResolutionContextBuilder::new()
    }

    /// Resolves a property reference into a dotted field path.
    pub fn resolve_property(&self, property: &dyn PropertyReference) -> AggregationResult<String> {
        self.resolver.resolve(property)
    }

    /// Encodes a temporal literal.
    pub fn encode_datetime(&self, value: &DateTime<Utc>) -> Bson {
        self.codec.encode_datetime(value)
    }
}

impl Default for ResolutionContext {
    fn default() -> Self {
        ResolutionContextBuilder::new().build()
    }
}

/// Builder for constructing a [`ResolutionContext`].
#[derive(Debug, Default)]
pub struct ResolutionContextBuilder {
    resolver: Option<Arc<dyn FieldNameResolver>>,
    codec: Option<Arc<dyn ValueCodec>>,
}

impl ResolutionContextBuilder {
    /// Creates a builder with no collaborators set.
    pub fn new() -> Self {
        Self { resolver: None, codec: None }
    }

    /// Sets the resolver used for property references.
    pub fn with_resolver(mut self, resolver: impl FieldNameResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Sets the codec used for temporal literals.
    pub fn with_codec(mut self, codec: impl ValueCodec + 'static) -> Self {
        self.codec = Some(Arc::new(codec));
        self
    }

    /// Builds the context.
    ///
    /// Uses [`DefaultFieldNameResolver`] and [`BsonValueCodec`] for anything left unset.
    pub fn build(self) -> ResolutionContext {
        ResolutionContext {
            resolver: self.resolver.unwrap_or_else(|| Arc::new(DefaultFieldNameResolver)),
            codec: self.codec.unwrap_or_else(|| Arc::new(BsonValueCodec)),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::property::Property;

    #[derive(Debug)]
    struct UpperCaseResolver;

    impl FieldNameResolver for UpperCaseResolver {
        fn resolve(&self, property: &dyn PropertyReference) -> AggregationResult<String> {
            Ok(property.declared_name().to_uppercase())
        }
    }

    #[test]
    fn default_context_encodes_dates() {
        let ctx = ResolutionContext::default();
        let value = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        assert_eq!(
            ctx.encode_datetime(&value),
            Bson::DateTime(bson::DateTime::from_millis(1_704_164_645_000))
        );
    }

    #[test]
    fn custom_resolver_is_used() {
        let ctx = ResolutionContext::builder()
            .with_resolver(UpperCaseResolver)
            .build();

        assert_eq!(ctx.resolve_property(&Property::new("price")).unwrap(), "PRICE");
    }
}
