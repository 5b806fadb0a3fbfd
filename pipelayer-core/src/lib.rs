//! A typed DSL for building MongoDB aggregation pipelines.
//!
//! This crate is the core of the pipelayer project and provides:
//!
//! - **Property references** ([`property`]) - Typed field handles and the field-path resolver
//! - **Operands** ([`operand`]) - The literal, field, property and sub-expression inputs of every operator
//! - **Expression builders** ([`expression`]) - Arithmetic, comparison, boolean, conditional and variable operators
//! - **Filter criteria** ([`criteria`]) - A predicate AST usable in `$match` and inside expressions
//! - **Stage builders** ([`stage`]) - One builder per pipeline stage
//! - **Pipeline assembly** ([`pipeline`]) - Ordered stage accumulation and final resolution
//! - **Resolution context** ([`context`]) - The per-build seam for field naming and value encoding
//! - **Execution seam** ([`executor`]) - Running finished pipelines and decoding typed results
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use pipelayer_core::{aggregation, criteria::Filter};
//!
//! let pipeline = aggregation(|p| {
//!     p.match_(Filter::eq("status", "A"));
//!     p.project(|p| {
//!         p.include("item");
//!         p.expression("total", |e| e.add(|a| a.of("price").and("fee")));
//!     });
//! });
//!
//! let stages: Vec<bson::Document> = pipeline.build()?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as pipelayer_core;

pub mod context;
pub mod criteria;
pub mod error;
pub mod executor;
pub mod expression;
pub mod operand;
pub mod pipeline;
pub mod property;
pub mod record;
pub mod stage;

pub use pipeline::aggregation;
