//! Error handling for export runs.
//!
//! Errors are split by how far they reach:
//! - [`RecordError`]: one record could not be serialized; counted and logged,
//!   the run continues
//! - everything else wrapped by [`ExportError`]: the run stops and the error
//!   surfaces to the host
//!
//! # Example
//!
//! ```rust
//! use shop_export::error::{ExportError, RecordError, Result};
//!
//! fn read_price() -> Result<()> {
//!     Err(RecordError::field_access("Price", "not loaded").into())
//! }
//!
//! assert!(matches!(read_price(), Err(ExportError::Record(_))));
//! ```

pub mod kinds;

// Re-export commonly used types
pub use kinds::{
    ConfigError, ExportError, FormatError, ProviderError, RecordError, Result, SegmentError,
};
