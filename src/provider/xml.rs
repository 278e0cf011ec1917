//! XML export provider
//!
//! One generic provider serves every entity type. The document is
//!
//! ```text
//! <?xml version="1.0" encoding="utf-8"?>
//! <Products Version="5.0.0">
//! 	<Product>
//! 		<Id>1</Id>
//! 		...
//! 	</Product>
//! </Products>
//! ```
//!
//! Localizable entities get a trailing `<Localized>` group and store-mappable
//! entities a trailing `<StoreIds>` group.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use crate::context::ExecutionContext;
use crate::error::{RecordError, Result};
use crate::record::{ExportEntityType, Record, Scalar};
use crate::services::ExportServices;
use crate::writer::{Node, SerializerRegistry, xml};

use super::pipeline::{RecordSink, create_output, write_segments};
use super::{ConfigurationInfo, ExportProvider, ProviderDescriptor};

/// Settings of the XML providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XmlExportSettings {
    /// Append translated values in a `<Localized>` group
    #[serde(default = "default_true")]
    pub include_localized: bool,

    /// Append store limitations in a `<StoreIds>` group
    #[serde(default = "default_true")]
    pub include_store_mappings: bool,
}

fn default_true() -> bool {
    true
}

impl Default for XmlExportSettings {
    fn default() -> Self {
        Self {
            include_localized: true,
            include_store_mappings: true,
        }
    }
}

/// XML export of one entity type
pub struct XmlExportProvider {
    descriptor: ProviderDescriptor,
    entity_type: ExportEntityType,
    registry: Arc<SerializerRegistry>,
}

impl XmlExportProvider {
    /// Create the XML provider of an entity type with the built-in layouts
    pub fn new(entity_type: ExportEntityType) -> Self {
        let (system_name, friendly_name) = match entity_type {
            ExportEntityType::Product => ("Exports.ProductXml", "Product XML export"),
            ExportEntityType::Category => ("Exports.CategoryXml", "Category XML export"),
            ExportEntityType::Manufacturer => ("Exports.ManufacturerXml", "Manufacturer XML export"),
            ExportEntityType::Customer => ("Exports.CustomerXml", "Customer XML export"),
            ExportEntityType::Order => ("Exports.OrderXml", "Order XML export"),
            ExportEntityType::NewsletterSubscription => {
                ("Exports.SubscriberXml", "Newsletter subscriber XML export")
            }
        };

        let mut descriptor = ProviderDescriptor::new(system_name, friendly_name, entity_type, "XML");
        if has_extras(entity_type) {
            let info = ConfigurationInfo::for_settings::<XmlExportSettings>(
                "Include localized values and store mappings",
            );
            descriptor = descriptor.with_configuration(info);
        }

        Self {
            descriptor,
            entity_type,
            registry: Arc::new(SerializerRegistry::default()),
        }
    }

    /// Use a custom serializer registry
    pub fn with_registry(mut self, registry: SerializerRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }
}

fn has_extras(entity_type: ExportEntityType) -> bool {
    !entity_type.localized_keys().is_empty() || entity_type.is_store_mappable()
}

#[async_trait]
impl ExportProvider for XmlExportProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let settings: XmlExportSettings = ctx.settings(&self.descriptor.system_name)?;
        debug!("{} settings: {:?}", self.descriptor.system_name, settings);

        let mut sink = XmlSink {
            path: ctx.file_path().to_path_buf(),
            root: self.entity_type.kind().plural_name(),
            version: ctx.app_version().to_string(),
            writer: None,
            written: 0,
            renderer: XmlRenderer {
                registry: Arc::clone(&self.registry),
                entity_type: self.entity_type,
                services: ctx.services().clone(),
                settings,
            },
        };

        write_segments(&mut sink, ctx).await
    }

    async fn execute_ended(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let size = tokio::fs::metadata(ctx.file_path()).await?.len();
        let message = format!("Wrote {} bytes to {}", size, ctx.file_path().display());
        ctx.log_mut().info(message);
        Ok(())
    }
}

/// Record to markup conversion, free of I/O
struct XmlRenderer {
    registry: Arc<SerializerRegistry>,
    entity_type: ExportEntityType,
    services: ExportServices,
    settings: XmlExportSettings,
}

impl XmlRenderer {
    fn render(&self, record: &dyn Record) -> std::result::Result<String, RecordError> {
        let mut node = self.registry.serialize(self.entity_type.kind(), record)?;

        let keys = self.entity_type.localized_keys();
        if self.settings.include_localized && !keys.is_empty() {
            node.push(self.localized(record.id(), keys));
        }
        if self.settings.include_store_mappings && self.entity_type.is_store_mappable() {
            node.push(self.store_ids(record.id()));
        }

        Ok(xml::render_node(&node, 1))
    }

    fn localized(&self, id: i64, keys: &[&str]) -> Node {
        let localization = &self.services.localization;
        let key_group = self.entity_type.entity_name();
        let mut children = Vec::new();

        for language in localization.languages() {
            for key in keys {
                let value = localization
                    .localized_value(key_group, id, key, language.id)
                    .filter(|v| !v.is_empty());
                if let Some(value) = value {
                    children.push(
                        Node::scalar(*key, Scalar::Text(value))
                            .with_attribute("Culture", language.culture.as_str()),
                    );
                }
            }
        }

        Node::group("Localized", children)
    }

    fn store_ids(&self, id: i64) -> Node {
        let ids = self
            .services
            .store_mappings
            .store_ids(self.entity_type.entity_name(), id);

        Node::group(
            "StoreIds",
            ids.into_iter()
                .map(|store_id| Node::scalar("StoreId", Scalar::Int(store_id)))
                .collect(),
        )
    }
}

struct XmlSink {
    path: PathBuf,
    root: &'static str,
    version: String,
    writer: Option<BufWriter<File>>,
    written: u64,
    renderer: XmlRenderer,
}

impl XmlSink {
    async fn write(&mut self, text: &str) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.write_all(text.as_bytes()).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl RecordSink for XmlSink {
    type Item = String;

    async fn open(&mut self) -> Result<()> {
        self.writer = Some(create_output(&self.path).await?);
        let header = format!("{}\n{}", xml::DECLARATION, xml::root_start(self.root, &self.version));
        self.write(&header).await
    }

    fn render(&self, record: &dyn Record) -> std::result::Result<String, RecordError> {
        self.renderer.render(record)
    }

    async fn emit(&mut self, item: String) -> Result<()> {
        self.write("\n").await?;
        self.write(&item).await?;
        self.written += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let footer = if self.written > 0 {
            format!("\n{}", xml::root_end(self.root))
        } else {
            xml::root_end(self.root)
        };
        self.write(&footer).await?;
        self.release().await
    }

    async fn release(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().await?;
            writer.shutdown().await?;
        }
        Ok(())
    }
}
