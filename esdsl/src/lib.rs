//! Typed Query DSL for Elasticsearch
//!
//! This crate turns nested, closure-based calls into the JSON request bodies
//! Elasticsearch understands. Every builder follows the same rule: a clause
//! whose required inputs are missing or blank is silently left out of the
//! enclosing request instead of producing an invalid body.
//!
//! ```
//! use esdsl::query::{bool_query, Query};
//!
//! let query = bool_query(|b| {
//!     b.must(|c| {
//!         c.term("status", "active");
//!         c.term("owner", ""); // blank, dropped
//!     });
//!     b.filter(|c| {
//!         c.range("age", |r| {
//!             r.gte(18).lt(65);
//!         });
//!     });
//! });
//! assert!(matches!(query, Some(Query::Bool(_))));
//! ```
//!
//! # Modules
//!
//! - [`query`] - leaf, compound, span and function-score queries
//! - [`aggregation`] - bucket and metric aggregations
//! - [`search`] - search and count request bodies
//! - [`document`] / [`bulk`] - single-document requests and NDJSON bulk bodies
//! - [`indices`] - index creation, mappings and name validation
//! - [`cluster`] - cluster health request
//! - [`response`] - typed response bodies

#[macro_use]
mod macros;

pub mod aggregation;
pub mod bulk;
pub mod cluster;
pub mod document;
pub mod endpoint;
pub mod error;
pub mod field_value;
pub mod indices;
pub mod one_field_map;
pub mod query;
pub mod response;
pub mod search;
pub mod util;

pub use aggregation::{Aggregation, AggregationKind, Aggregations};
pub use bulk::{BulkOperation, BulkRequest};
pub use error::DslError;
pub use field_value::{FieldValue, IntoFieldValue};
pub use query::{Clause, Query, QueryClauses};
pub use search::SearchRequest;

/// Result type for DSL operations
pub type Result<T> = std::result::Result<T, DslError>;
