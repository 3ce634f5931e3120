//! Elasticsearch client for the esdsl Query DSL
//!
//! [`ElasticsearchClient`] sends the request types of [`esdsl`] over HTTP
//! and decodes the typed responses. [`BlockingClient`] offers the same
//! operations synchronously.

pub mod blocking;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod transport;

pub use blocking::BlockingClient;
pub use client::ElasticsearchClient;
pub use config::{ClientConfig, Config, LoggingConfig};
pub use error::{ClientError, Result};
pub use logging::init_logging;
pub use transport::Transport;
