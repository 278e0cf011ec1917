//! Newsletter subscriber CSV export
//!
//! One line per subscription, `Email,Active,StoreId`, CRLF terminated and
//! without a header row, the shape mailing tools import directly.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use csv::{Terminator, WriterBuilder};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::context::ExecutionContext;
use crate::error::{RecordError, Result};
use crate::record::{EntityKind, ExportEntityType, Record};
use crate::writer::invariant::format_scalar;
use crate::writer::{Node, SerializerRegistry};

use super::pipeline::{RecordSink, create_output, write_segments};
use super::{ExportProvider, ProviderDescriptor};

/// Fields written per line, in order
const COLUMNS: [&str; 3] = ["Email", "Active", "StoreId"];

/// CSV export of newsletter subscriptions
pub struct SubscriberCsvExportProvider {
    descriptor: ProviderDescriptor,
    registry: Arc<SerializerRegistry>,
}

impl SubscriberCsvExportProvider {
    pub fn new() -> Self {
        Self {
            descriptor: ProviderDescriptor::new(
                "Exports.SubscriberCsv",
                "Newsletter subscriber CSV export",
                ExportEntityType::NewsletterSubscription,
                "CSV",
            ),
            registry: Arc::new(SerializerRegistry::default()),
        }
    }
}

impl Default for SubscriberCsvExportProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExportProvider for SubscriberCsvExportProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let mut sink = CsvSink {
            path: ctx.file_path().to_path_buf(),
            writer: None,
            registry: Arc::clone(&self.registry),
        };
        write_segments(&mut sink, ctx).await
    }
}

struct CsvSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    registry: Arc<SerializerRegistry>,
}

impl CsvSink {
    fn fields(node: &Node) -> Vec<String> {
        COLUMNS
            .iter()
            .map(|name| {
                node.child(name)
                    .and_then(Node::value)
                    .map(format_scalar)
                    .unwrap_or_default()
            })
            .collect()
    }
}

#[async_trait]
impl RecordSink for CsvSink {
    type Item = Vec<u8>;

    async fn open(&mut self) -> Result<()> {
        self.writer = Some(create_output(&self.path).await?);
        Ok(())
    }

    fn render(&self, record: &dyn Record) -> std::result::Result<Vec<u8>, RecordError> {
        let node = self
            .registry
            .serialize(EntityKind::NewsletterSubscription, record)?;

        let mut line = WriterBuilder::new()
            .has_headers(false)
            .terminator(Terminator::CRLF)
            .from_writer(Vec::new());
        line.write_record(Self::fields(&node))
            .map_err(|e| RecordError::Serialization(e.to_string()))?;
        line.into_inner()
            .map_err(|e| RecordError::Serialization(e.to_string()))
    }

    async fn emit(&mut self, item: Vec<u8>) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.write_all(&item).await?;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
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
