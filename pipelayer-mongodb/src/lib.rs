//! MongoDB execution backend for pipelayer.
//!
//! This crate provides a MongoDB-based implementation of the `AggregationExecutor` trait,
//! running resolved pipelines through `Collection::aggregate` of the official async driver.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! pipelayer = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use pipelayer::{prelude::*, mongodb::MongoDbExecutor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let aggregator = Aggregator::new(
//!         MongoDbExecutor::builder("mongodb://localhost:27017", "shop")
//!             .build()
//!             .await?,
//!     )
//!     .with_options(AggregateOptions::new().with_allow_disk_use(true));
//!
//!     let rows: Vec<bson::Document> = aggregator
//!         .aggregate_in("orders", |p| {
//!             p.sort_by_count("status");
//!         })
//!         .await?;
//!
//!     aggregator.shutdown().await?;
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as pipelayer_mongodb;

pub mod executor;

pub use executor::{MongoDbExecutor, MongoDbExecutorBuilder};
