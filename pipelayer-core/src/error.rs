//! Error types and result types for pipeline construction and execution.
//!
//! Builders never fail while a pipeline is being declared. Every failure surfaces when the
//! declaration is resolved into documents, or when the execution collaborator runs it.
//! Use [`AggregationResult<T>`] as the return type for fallible operations.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors raised while resolving or running an aggregation pipeline.
#[derive(Error, Debug)]
pub enum AggregationError {
    /// A stage was resolved without one of its required inputs.
    #[error("Incomplete stage {stage}: {reason}")]
    IncompleteStage {
        /// The reserved stage operator name, e.g. `$lookup`.
        stage: &'static str,
        /// What the caller forgot to declare.
        reason: String,
    },
    /// An expression was resolved without one of its required inputs.
    #[error("Incomplete expression {operator}: {reason}")]
    IncompleteExpression {
        /// The reserved expression operator name, e.g. `$switch`.
        operator: &'static str,
        /// What the caller forgot to declare.
        reason: String,
    },
    /// A field path or property chain that cannot name a document field.
    #[error("Invalid field path: {0}")]
    InvalidFieldPath(String),
    /// A filter criteria whose value cannot be used with its operator.
    #[error("Invalid criteria: {0}")]
    InvalidCriteria(String),
    /// Serialization/deserialization error when converting between BSON, JSON and typed results.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during executor initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// An error reported by the execution collaborator.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl AggregationError {
    pub(crate) fn incomplete_stage(stage: &'static str, reason: impl Into<String>) -> Self {
        AggregationError::IncompleteStage { stage, reason: reason.into() }
    }

    pub(crate) fn incomplete_expression(operator: &'static str, reason: impl Into<String>) -> Self {
        AggregationError::IncompleteExpression { operator, reason: reason.into() }
    }
}

/// A specialized `Result` type for pipeline resolution and execution.
pub type AggregationResult<T> = Result<T, AggregationError>;

impl From<BsonError> for AggregationError {
    fn from(err: BsonError) -> Self {
        AggregationError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for AggregationError {
    fn from(err: SerdeJsonError) -> Self {
        AggregationError::Serialization(err.to_string())
    }
}
