//! Export host
//!
//! The runner builds the execution context of a run, calls the provider's
//! `execute` and then `execute_ended`, and reports what happened. It owns the
//! abort handle, so a caller (e.g. a Ctrl+C listener) can cancel the run from
//! another task.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Local};
use tracing::info;

use crate::context::{Abort, AbortHandle, ExecutionContext, LogEntry, ProgressTracker};
use crate::error::Result;
use crate::provider::{ProviderDescriptor, ProviderRegistry};
use crate::segment::Segmenter;
use crate::services::ExportServices;

/// Outcome of one export run
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub system_name: String,
    pub file_path: PathBuf,
    pub records_succeeded: u64,
    pub records_failed: u64,
    /// Abort state at the end of the run
    pub abort: Abort,
    pub file_size_bytes: u64,
    pub elapsed_ms: u64,
    /// Operator log of the run
    pub log: Vec<LogEntry>,
}

impl ExportSummary {
    /// Check if the run wrote every offered record
    pub fn is_complete(&self) -> bool {
        self.records_failed == 0 && self.abort.is_none()
    }
}

/// Runs providers from a registry
pub struct ExportRunner {
    registry: ProviderRegistry,
    services: ExportServices,
    abort: AbortHandle,
    app_version: String,
    show_progress: bool,
}

impl ExportRunner {
    /// Create a runner over a provider registry
    pub fn new(registry: ProviderRegistry) -> Self {
        Self {
            registry,
            services: ExportServices::default(),
            abort: AbortHandle::new(),
            app_version: crate::VERSION.to_string(),
            show_progress: false,
        }
    }

    pub fn with_services(mut self, services: ExportServices) -> Self {
        self.services = services;
        self
    }

    pub fn with_app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = version.into();
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Abort handle shared with every run of this runner
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Run one export
    ///
    /// # Arguments
    /// * `system_name` - Provider to run
    /// * `segmenter` - Record source
    /// * `file_path` - Destination file
    /// * `configuration` - Provider settings, `Null` for defaults
    ///
    /// # Returns
    /// * `Result<ExportSummary>` - Run summary or a run-fatal error
    pub async fn run(
        &self,
        system_name: &str,
        segmenter: Box<dyn Segmenter>,
        file_path: &Path,
        configuration: serde_json::Value,
    ) -> Result<ExportSummary> {
        let provider = self.registry.get(system_name)?;
        let start_time = Instant::now();

        let progress = ProgressTracker::new(segmenter.total_records(), self.show_progress);
        let mut ctx = ExecutionContext::new(file_path, segmenter)
            .with_abort_handle(self.abort.clone())
            .with_services(self.services.clone())
            .with_configuration(configuration)
            .with_app_version(self.app_version.as_str())
            .with_progress(progress);

        info!("Running {} into {}", system_name, file_path.display());
        provider.execute(&mut ctx).await?;
        provider.execute_ended(&mut ctx).await?;

        let file_size_bytes = tokio::fs::metadata(file_path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(ExportSummary {
            system_name: system_name.to_string(),
            file_path: file_path.to_path_buf(),
            records_succeeded: ctx.records_succeeded(),
            records_failed: ctx.records_failed(),
            abort: ctx.abort(),
            file_size_bytes,
            elapsed_ms: start_time.elapsed().as_millis() as u64,
            log: ctx.log().entries().to_vec(),
        })
    }
}

/// Default output file name, e.g. `Exports.ProductXml-2024-05-17_09-45-12.xml`
pub fn default_file_name(descriptor: &ProviderDescriptor, now: DateTime<Local>) -> String {
    format!(
        "{}-{}.{}",
        descriptor.system_name,
        now.format("%Y-%m-%d_%H-%M-%S"),
        descriptor.extension()
    )
}
