//! Typed record shapes.
//!
//! A [`Record`] names the collection its documents live in. It is normally derived:
//!
//! ```ignore
//! use pipelayer::Record;
//!
//! #[derive(Record, Serialize, Deserialize)]
//! #[record(collection = "orders")]
//! struct Order {
//!     #[record(id)]
//!     id: String,
//!     #[record(value = "cust_id")]
//!     customer: String,
//!     amount: f64,
//! }
//!
//! // OrderFields::customer() resolves to "cust_id", OrderFields::id() to "_id".
//! let pipeline = aggregation(|p| {
//!     p.group(|g| {
//!         g.id(OrderFields::customer());
//!         g.accumulate("total", |a| a.sum(OrderFields::amount()));
//!     });
//! });
//! ```

/// A typed record shape stored in a named collection.
pub trait Record {
    /// The collection documents of this shape are stored in.
    fn collection_name() -> &'static str;
}
