//! Convenient re-exports of commonly used types from pipelayer.
//!
//! ```ignore
//! use pipelayer::prelude::*;
//! ```
//!
//! This provides access to:
//! - The pipeline entry point and builder
//! - Operands, expressions and filter criteria
//! - Property references and the `Record` derive
//! - The executor seam and error types

pub use pipelayer_core::{
    aggregation,
    context::{BsonValueCodec, ResolutionContext, ValueCodec},
    criteria::{Criteria, CriteriaVisitor, FieldOp, Filter},
    error::{AggregationError, AggregationResult},
    executor::{AggregateOptions, AggregationExecutor, Aggregator, ExecutorBuilder},
    expression::{Expression, Expressions, Resolve},
    operand::Operand,
    pipeline::{Pipeline, PipelineBuilder},
    property::{DefaultFieldNameResolver, FieldNameResolver, FieldPath, Property, PropertyReference},
    record::Record,
    stage::{SearchCount, SearchOperator, SearchRange, SortOrder, Stage},
};
pub use pipelayer_macros::Record;
