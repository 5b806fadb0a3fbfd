//! The execution seam: running a finished pipeline and decoding typed results.
//!
//! This module does not talk to a database. It defines the [`AggregationExecutor`] trait that
//! a driver adapter implements, and the [`Aggregator`] convenience surface that wires
//! "build a pipeline with the DSL" together with "run it and decode the results".
//!
//! # Example
//!
//! ```ignore
//! use pipelayer::{prelude::*, mongodb::MongoDbExecutor};
//!
//! let executor = MongoDbExecutor::builder("mongodb://localhost:27017", "shop")
//!     .build()
//!     .await?;
//! let aggregator = Aggregator::new(executor);
//!
//! let totals: Vec<CustomerTotal> = aggregator
//!     .aggregate::<Order, _>(|p| {
//!         p.group(|g| {
//!             g.id(OrderFields::customer());
//!             g.accumulate("total", |a| a.sum(OrderFields::amount()));
//!         });
//!     })
//!     .await?;
//! ```

use async_trait::async_trait;
use bson::{Bson, Document, de::deserialize_from_bson};
use serde::de::DeserializeOwned;
use std::{fmt::Debug, sync::Arc};
use tracing::debug;

use crate::{
    context::ResolutionContext,
    error::{AggregationError, AggregationResult},
    pipeline::{Pipeline, PipelineBuilder, aggregation},
    record::Record,
};

/// Per-call options handed to the executor along with the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Lets stages spill to temporary files on disk.
    pub allow_disk_use: Option<bool>,
    /// Number of documents per result batch.
    pub batch_size: Option<u32>,
    /// Comment attached to the command, visible in profiler output and logs.
    pub comment: Option<String>,
}

impl AggregateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allow_disk_use(mut self, allow_disk_use: bool) -> Self {
        self.allow_disk_use = Some(allow_disk_use);
        self
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Runs resolved pipelines against a collection.
///
/// Implementations must be thread-safe. Retries, timeouts and connection management belong to
/// the implementation; the DSL never retries.
#[async_trait]
pub trait AggregationExecutor: Send + Sync + Debug {
    /// Runs `pipeline` against `collection` and returns the raw result documents.
    ///
    /// # Arguments
    ///
    /// * `pipeline` - The resolved stage documents, in order
    /// * `collection` - The collection the pipeline runs against
    /// * `options` - Per-call options
    ///
    /// # Errors
    ///
    /// Returns [`AggregationError::Backend`](crate::error::AggregationError::Backend) when the
    /// underlying driver fails.
    async fn run_aggregation(
        &self,
        pipeline: Vec<Document>,
        collection: &str,
        options: AggregateOptions,
    ) -> AggregationResult<Vec<Document>>;

    /// Releases the resources held by the executor. The default implementation is a no-op.
    async fn shutdown(self) -> AggregationResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<E> AggregationExecutor for &E
where
    E: AggregationExecutor,
{
    async fn run_aggregation(
        &self,
        pipeline: Vec<Document>,
        collection: &str,
        options: AggregateOptions,
    ) -> AggregationResult<Vec<Document>> {
        (*self).run_aggregation(pipeline, collection, options).await
    }
}

#[async_trait]
impl<E> AggregationExecutor for Arc<E>
where
    E: AggregationExecutor,
{
    async fn run_aggregation(
        &self,
        pipeline: Vec<Document>,
        collection: &str,
        options: AggregateOptions,
    ) -> AggregationResult<Vec<Document>> {
        self.as_ref().run_aggregation(pipeline, collection, options).await
    }
}

/// Factory for executors that need asynchronous setup, such as opening a connection.
#[async_trait]
pub trait ExecutorBuilder {
    type Executor: AggregationExecutor;

    async fn build(self) -> AggregationResult<Self::Executor>;
}

/// Builds pipelines with the DSL and runs them through an [`AggregationExecutor`].
#[derive(Debug)]
pub struct Aggregator<E: AggregationExecutor> {
    executor: E,
    context: ResolutionContext,
    options: AggregateOptions,
}

impl<E: AggregationExecutor> Aggregator<E> {
    /// Creates an aggregator with the default resolution context and no options.
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            context: ResolutionContext::default(),
            options: AggregateOptions::default(),
        }
    }

    /// Resolves every pipeline against `context` instead of the default one.
    pub fn with_context(mut self, context: ResolutionContext) -> Self {
        self.context = context;
        self
    }

    /// Attaches `options` to every call.
    pub fn with_options(mut self, options: AggregateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Runs the pipeline built by `build` against the collection of record shape `I`, decoding
    /// each result document into `O`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline fails to resolve, the executor fails, or a result
    /// document does not decode into `O`.
    pub async fn aggregate<I: Record, O: DeserializeOwned>(
        &self,
        build: impl FnOnce(&mut PipelineBuilder),
    ) -> AggregationResult<Vec<O>> {
        self.aggregate_in(I::collection_name(), build).await
    }

    /// Runs the pipeline built by `build` against `collection`.
    ///
    /// # Errors
    ///
    /// See [`aggregate`](Self::aggregate).
    pub async fn aggregate_in<O: DeserializeOwned>(
        &self,
        collection: &str,
        build: impl FnOnce(&mut PipelineBuilder),
    ) -> AggregationResult<Vec<O>> {
        let pipeline = aggregation(build);
        self.aggregate_pipeline(&pipeline, collection).await
    }

    /// Runs an already built pipeline against `collection`.
    ///
    /// # Errors
    ///
    /// See [`aggregate`](Self::aggregate).
    pub async fn aggregate_pipeline<O: DeserializeOwned>(
        &self,
        pipeline: &Pipeline,
        collection: &str,
    ) -> AggregationResult<Vec<O>> {
        let stages = pipeline.build_with(&self.context)?;
        debug!(collection, stages = stages.len(), "running aggregation");

        self.executor
            .run_aggregation(stages, collection, self.options.clone())
            .await?
            .into_iter()
            .map(|document| deserialize_from_bson(Bson::Document(document)).map_err(AggregationError::from))
            .collect()
    }

    /// Shuts the underlying executor down.
    pub async fn shutdown(self) -> AggregationResult<()> {
        self.executor.shutdown().await
    }
}
