use async_trait::async_trait;
use bson::{Bson, Document};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection as MongoCollection,
    options::{AggregateOptions as MongoAggregateOptions, ClientOptions},
};
use pipelayer_core::{
    error::{AggregationError, AggregationResult},
    executor::{AggregateOptions, AggregationExecutor, ExecutorBuilder},
};
use tracing::{debug, error};

/// Runs aggregation pipelines through the MongoDB driver.
#[derive(Debug, Clone)]
pub struct MongoDbExecutor {
    client: Client,
    database: String,
}

impl MongoDbExecutor {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbExecutorBuilder {
        MongoDbExecutorBuilder::new(dsn, database)
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }
}

pub(crate) fn driver_options(options: AggregateOptions) -> MongoAggregateOptions {
    let mut driver_options = MongoAggregateOptions::default();
    driver_options.allow_disk_use = options.allow_disk_use;
    driver_options.batch_size = options.batch_size;
    driver_options.comment = options.comment.map(Bson::String);
    driver_options
}

#[async_trait]
impl AggregationExecutor for MongoDbExecutor {
    async fn run_aggregation(
        &self,
        pipeline: Vec<Document>,
        collection: &str,
        options: AggregateOptions,
    ) -> AggregationResult<Vec<Document>> {
        debug!(
            database = %self.database,
            collection,
            stages = pipeline.len(),
            "running aggregation on mongodb"
        );

        self.get_collection(collection)
            .aggregate(pipeline)
            .with_options(driver_options(options))
            .await
            .map_err(|e| {
                error!(collection, error = %e, "aggregation failed");
                AggregationError::Backend(e.to_string())
            })?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(|e| {
                error!(collection, error = %e, "reading aggregation results failed");
                AggregationError::Backend(e.to_string())
            })
    }

    async fn shutdown(self) -> AggregationResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

/// Builder for a [`MongoDbExecutor`] connecting from a connection string.
#[derive(Debug, Clone)]
pub struct MongoDbExecutorBuilder {
    dsn: String,
    database: String,
}

impl MongoDbExecutorBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl ExecutorBuilder for MongoDbExecutorBuilder {
    type Executor = MongoDbExecutor;

    async fn build(self) -> AggregationResult<Self::Executor> {
        Ok(MongoDbExecutor::new(
            Client::with_options(
                ClientOptions::parse(&self.dsn)
                    .await
                    .map_err(|e| AggregationError::Initialization(e.to_string()))?,
            )
            .map_err(|e| AggregationError::Initialization(e.to_string()))?,
            self.database,
        ))
    }
}
