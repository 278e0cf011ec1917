//! Storefront bulk export
//!
//! Streams storefront entities (products, categories, manufacturers,
//! customers, orders, newsletter subscriptions) out of a paged source into
//! XML, XLSX or CSV files.
//!
//! # Modules
//!
//! - `record`: record access and entity kinds
//! - `segment`: paged record sources
//! - `context`: per-run state, abort signal and counters
//! - `writer`: serializer registry and XML rendering
//! - `provider`: export providers and their registry
//! - `services`: localization, store mapping and catalog lookups
//! - `host`: runs providers and reports summaries
//! - `config`: configuration management
//! - `cli`: command-line interface
//! - `error`: error types
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use shop_export::{ExportRunner, PropertyBag, RecordRef, VecSegmenter, default_registry};
//!
//! #[tokio::main]
//! async fn main() -> shop_export::Result<()> {
//!     let records: Vec<RecordRef> = vec![Arc::new(
//!         PropertyBag::new(1).with("Email", "a@example.com").with("Active", true),
//!     )];
//!     let runner = ExportRunner::new(default_registry()?);
//!
//!     let summary = runner
//!         .run(
//!             "Exports.SubscriberCsv",
//!             Box::new(VecSegmenter::new(records, 100)?),
//!             Path::new("subscribers.csv"),
//!             serde_json::Value::Null,
//!         )
//!         .await?;
//!     println!("{} records written", summary.records_succeeded);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod host;
pub mod provider;
pub mod record;
pub mod segment;
pub mod services;
pub mod writer;

// Re-export commonly used types
pub use config::Config;
pub use context::{Abort, AbortHandle, ExecutionContext};
pub use error::{ExportError, RecordError, Result};
pub use host::{ExportRunner, ExportSummary};
pub use provider::{ExportProvider, ProviderDescriptor, ProviderRegistry, default_registry};
pub use record::{EntityKind, ExportEntityType, PropertyBag, Record, RecordRef, Value};
pub use segment::{JsonLinesSegmenter, Segmenter, VecSegmenter};
pub use writer::SerializerRegistry;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}
