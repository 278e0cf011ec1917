//! Export providers
//!
//! A provider turns the records of one entity type into one output file. The
//! host discovers providers through their [`ProviderDescriptor`], calls
//! [`ExportProvider::execute`] once per run and, when that succeeded,
//! [`ExportProvider::execute_ended`].
//!
//! Providers share the segment loop in [`pipeline`] and differ only in the
//! [`RecordSink`] that serializes records to their format.

use async_trait::async_trait;
use serde::Serialize;

use crate::context::ExecutionContext;
use crate::error::Result;
use crate::record::ExportEntityType;

pub mod pipeline;
mod product_xlsx;
mod registry;
mod subscriber_csv;
mod xml;

#[cfg(test)]
mod tests;

pub use pipeline::{RecordSink, write_segments};
pub use product_xlsx::{ProductXlsxExportProvider, ProductXlsxSettings};
pub use registry::{ProviderRegistry, default_registry};
pub use subscriber_csv::SubscriberCsvExportProvider;
pub use xml::{XmlExportProvider, XmlExportSettings};

/// Description of a provider's settings
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationInfo {
    /// Short explanation shown to the operator
    pub description: String,
    /// Settings applied when none are configured
    pub defaults: serde_json::Value,
}

impl ConfigurationInfo {
    /// Describe a settings type by its default value
    pub fn for_settings<T: Serialize + Default>(description: &str) -> Self {
        Self {
            description: description.to_string(),
            defaults: serde_json::to_value(T::default()).unwrap_or(serde_json::Value::Null),
        }
    }
}

/// Static metadata of a provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderDescriptor {
    /// Unique identifier, e.g. `Exports.ProductXml`
    pub system_name: String,
    pub friendly_name: String,
    pub entity_type: ExportEntityType,
    /// Upper-case extension without dot, e.g. `XML`
    pub file_extension: String,
    pub configuration: Option<ConfigurationInfo>,
}

impl ProviderDescriptor {
    pub fn new(
        system_name: &str,
        friendly_name: &str,
        entity_type: ExportEntityType,
        file_extension: &str,
    ) -> Self {
        Self {
            system_name: system_name.to_string(),
            friendly_name: friendly_name.to_string(),
            entity_type,
            file_extension: file_extension.to_string(),
            configuration: None,
        }
    }

    pub fn with_configuration(mut self, configuration: ConfigurationInfo) -> Self {
        self.configuration = Some(configuration);
        self
    }

    /// Lower-case extension for file names
    pub fn extension(&self) -> String {
        self.file_extension.to_ascii_lowercase()
    }
}

/// Trait implemented by every export format
#[async_trait]
pub trait ExportProvider: Send + Sync {
    /// Metadata used for discovery
    fn descriptor(&self) -> &ProviderDescriptor;

    /// Write all records offered by the context's segmenter to its file
    ///
    /// Per-record failures are counted on the context and do not fail the
    /// call. Segmenter and I/O failures are returned after the partial output
    /// has been released.
    ///
    /// # Arguments
    /// * `ctx` - Execution context of the run
    ///
    /// # Returns
    /// * `Result<()>` - Success or a run-fatal error
    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<()>;

    /// Hook called by the host after a successful `execute`
    async fn execute_ended(&self, _ctx: &mut ExecutionContext) -> Result<()> {
        Ok(())
    }
}
