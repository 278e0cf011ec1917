use std::{fmt, io};

/// Crate-wide `Result` type using [`ExportError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Top-level error type for export runs.
///
/// Only [`ExportError::Record`] is recoverable inside a run; every other
/// variant reaching the host means the run was aborted before completion.
#[derive(Debug)]
pub enum ExportError {
    /// Serialization of a single record failed.
    Record(RecordError),

    /// The segmenter could not produce the next batch.
    Segment(SegmentError),

    /// Provider lookup, registration or configuration errors.
    Provider(ProviderError),

    /// Host configuration errors.
    Config(ConfigError),

    /// Output format writer errors (spreadsheet, CSV).
    Format(FormatError),

    /// I/O errors on the destination file.
    Io(io::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Errors raised while reading or serializing one record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordError {
    /// Reading a field from the record failed.
    FieldAccess { field: String, message: String },

    /// A field held a value of a different shape than the layout expects.
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// No serialization strategy is registered for the entity kind.
    UnknownEntityKind(String),

    /// The record could not be encoded into the target format.
    Serialization(String),
}

/// Errors raised by segmenters.
#[derive(Debug)]
pub enum SegmentError {
    /// The underlying data source failed.
    FetchFailed(String),

    /// A source line could not be turned into a record.
    InvalidRecord { line: u64, message: String },

    /// Invalid segmenter parameters.
    InvalidPageSize(usize),
}

/// Provider registry and provider configuration errors.
#[derive(Debug)]
pub enum ProviderError {
    /// No provider registered under the system name.
    NotFound(String),

    /// A provider with the same system name is already registered.
    AlreadyRegistered(String),

    /// Provider settings could not be read.
    InvalidConfiguration { provider: String, message: String },
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },
}

/// Output format writer errors.
#[derive(Debug)]
pub enum FormatError {
    /// Spreadsheet writer failure.
    Xlsx(String),

    /// Delimited text writer failure.
    Csv(String),
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Record(e) => write!(f, "Record error: {e}"),
            ExportError::Segment(e) => write!(f, "Segment error: {e}"),
            ExportError::Provider(e) => write!(f, "Provider error: {e}"),
            ExportError::Config(e) => write!(f, "Configuration error: {e}"),
            ExportError::Format(e) => write!(f, "Format error: {e}"),
            ExportError::Io(e) => write!(f, "I/O error: {e}"),
            ExportError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::FieldAccess { field, message } => {
                write!(f, "Failed to read field '{field}': {message}")
            }
            RecordError::TypeMismatch {
                field,
                expected,
                found,
            } => write!(f, "Field '{field}' expected {expected}, found {found}"),
            RecordError::UnknownEntityKind(kind) => {
                write!(f, "No serializer registered for entity kind '{kind}'")
            }
            RecordError::Serialization(msg) => write!(f, "Serialization failed: {msg}"),
        }
    }
}

impl fmt::Display for SegmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentError::FetchFailed(msg) => write!(f, "Failed to fetch segment: {msg}"),
            SegmentError::InvalidRecord { line, message } => {
                write!(f, "Invalid record on line {line}: {message}")
            }
            SegmentError::InvalidPageSize(size) => write!(f, "Invalid page size: {size}"),
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::NotFound(name) => write!(f, "Export provider not found: {name}"),
            ProviderError::AlreadyRegistered(name) => {
                write!(f, "Export provider '{name}' already registered")
            }
            ProviderError::InvalidConfiguration { provider, message } => {
                write!(f, "Invalid configuration for '{provider}': {message}")
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Xlsx(msg) => write!(f, "Spreadsheet writer failed: {msg}"),
            FormatError::Csv(msg) => write!(f, "CSV writer failed: {msg}"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Io(e) => Some(e),
            _ => None,
        }
    }
}
impl std::error::Error for RecordError {}
impl std::error::Error for SegmentError {}
impl std::error::Error for ProviderError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for FormatError {}

/* ========================= Conversions to ExportError ========================= */

impl From<io::Error> for ExportError {
    fn from(err: io::Error) -> Self {
        ExportError::Io(err)
    }
}

impl From<RecordError> for ExportError {
    fn from(err: RecordError) -> Self {
        ExportError::Record(err)
    }
}

impl From<SegmentError> for ExportError {
    fn from(err: SegmentError) -> Self {
        ExportError::Segment(err)
    }
}

impl From<ProviderError> for ExportError {
    fn from(err: ProviderError) -> Self {
        ExportError::Provider(err)
    }
}

impl From<ConfigError> for ExportError {
    fn from(err: ConfigError) -> Self {
        ExportError::Config(err)
    }
}

impl From<FormatError> for ExportError {
    fn from(err: FormatError) -> Self {
        ExportError::Format(err)
    }
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ExportError::Format(FormatError::Xlsx(err.to_string()))
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Format(FormatError::Csv(err.to_string()))
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Config(ConfigError::InvalidFormat(err.to_string()))
    }
}

impl From<toml::de::Error> for ExportError {
    fn from(err: toml::de::Error) -> Self {
        ExportError::Config(ConfigError::InvalidFormat(err.to_string()))
    }
}

impl From<toml::ser::Error> for ExportError {
    fn from(err: toml::ser::Error) -> Self {
        ExportError::Config(ConfigError::InvalidFormat(err.to_string()))
    }
}

impl From<String> for ExportError {
    fn from(msg: String) -> Self {
        ExportError::Generic(msg)
    }
}

impl From<&str> for ExportError {
    fn from(msg: &str) -> Self {
        ExportError::Generic(msg.to_owned())
    }
}

/* ========================= Helpers ========================= */

impl RecordError {
    /// Build a field access error from any displayable cause.
    pub fn field_access(field: &str, cause: impl fmt::Display) -> Self {
        RecordError::FieldAccess {
            field: field.to_string(),
            message: cause.to_string(),
        }
    }
}

impl ExportError {
    /// Whether this error only concerns a single record.
    pub fn is_record_error(&self) -> bool {
        matches!(self, ExportError::Record(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_error_display() {
        let err = RecordError::field_access("Price", "lazy load failed");
        assert_eq!(
            err.to_string(),
            "Failed to read field 'Price': lazy load failed"
        );

        let err = RecordError::TypeMismatch {
            field: "Customer".to_string(),
            expected: "record",
            found: "text",
        };
        assert_eq!(err.to_string(), "Field 'Customer' expected record, found text");
    }

    #[test]
    fn test_conversions() {
        let err: ExportError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, ExportError::Io(_)));
        assert!(err.to_string().starts_with("I/O error"));

        let err: ExportError = RecordError::Serialization("bad".into()).into();
        assert!(err.is_record_error());

        let err: ExportError = "plain".into();
        assert_eq!(err.to_string(), "plain");
    }

    #[test]
    fn test_segment_error_display() {
        let err = SegmentError::InvalidRecord {
            line: 7,
            message: "expected object".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid record on line 7: expected object");
    }
}
