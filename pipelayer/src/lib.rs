//! Main pipelayer crate: a typed DSL for building MongoDB aggregation pipelines.
//!
//! This crate is the primary entry point for users of the pipelayer framework. It re-exports
//! the builders from `pipelayer-core`, the `Record` derive macro, and, behind the `mongodb`
//! feature, the driver-backed executor.
//!
//! # Features
//!
//! - **Composable builders** - One small builder per stage and per operator family
//! - **Typed field references** - `#[derive(Record)]` generates property handles that resolve to wire names
//! - **Deferred resolution** - Nothing is serialized until the pipeline is built
//! - **Typed results** - Run pipelines through an executor and decode results with serde
//!
//! # Quick Start
//!
//! ```ignore
//! use pipelayer::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Record)]
//! #[record(collection = "orders")]
//! pub struct Order {
//!     #[record(id)]
//!     pub id: String,
//!     pub item: String,
//!     pub price: f64,
//!     pub fee: f64,
//!     pub qty: i32,
//! }
//!
//! let pipeline = aggregation(|p| {
//!     p.match_(Filter::gte(OrderFields::qty(), 10));
//!     p.project(|p| {
//!         p.include(OrderFields::item());
//!         p.expression("total", |e| {
//!             e.add(|a| a.of(OrderFields::price()).and(OrderFields::fee()))
//!         });
//!     });
//!     p.sort(|s| {
//!         s.descending("total");
//!     });
//! });
//!
//! // [
//! //   { "$match": { "qty": { "$gte": 10 } } },
//! //   { "$project": { "item": 1, "total": { "$add": ["$price", "$fee"] } } },
//! //   { "$sort": { "total": -1 } },
//! // ]
//! let stages = pipeline.build()?;
//! ```
//!
//! # Running pipelines
//!
//! ```ignore
//! use pipelayer::{prelude::*, mongodb::MongoDbExecutor};
//!
//! let aggregator = Aggregator::new(
//!     MongoDbExecutor::builder("mongodb://localhost:27017", "shop").build().await?,
//! );
//!
//! let totals: Vec<Total> = aggregator
//!     .aggregate::<Order, _>(|p| {
//!         p.group(|g| {
//!             g.id(OrderFields::item());
//!             g.accumulate("total", |a| a.sum(OrderFields::qty()));
//!         });
//!     })
//!     .await?;
//! ```
//!
//! # Backends
//!
//! - [`mongodb`] - MongoDB executor (requires `mongodb` feature)

#[allow(unused_extern_crates)]
extern crate self as pipelayer;

pub mod prelude;

pub use pipelayer_core::{
    aggregation, context, criteria, error, executor, expression, operand, pipeline, property,
    record, stage,
};
pub use pipelayer_macros::Record;

// Re-export BSON types for convenience
pub use bson;

/// MongoDB execution backend.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use pipelayer_mongodb::{MongoDbExecutor, MongoDbExecutorBuilder};
}
