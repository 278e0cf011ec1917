//! Execution context for a single export run
//!
//! The context carries everything a provider needs while writing one file:
//! the segmenter, the destination path, the abort signal, the run log, the
//! success/failure counters and the collaborator services. It is created
//! once per run by the host and passed by reference to every provider call.
//!
//! Invariant: `records_succeeded + records_failed` never exceeds the number
//! of records the segmenter offered.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::error::{ProviderError, RecordError, Result};
use crate::segment::Segmenter;
use crate::services::ExportServices;

mod abort;
mod log;
mod progress;

pub use abort::{Abort, AbortHandle};
pub use log::{ExportLog, LogEntry};
pub use progress::ProgressTracker;

/// Provider lifecycle within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderState {
    /// Destination not opened yet
    #[default]
    Idle,
    /// Destination open, records being written
    Writing,
    /// Destination finalized and released
    Ended,
}

/// Mutable state of one export run
pub struct ExecutionContext {
    file_path: PathBuf,
    segmenter: Box<dyn Segmenter>,
    abort: AbortHandle,
    records_succeeded: u64,
    records_failed: u64,
    log: ExportLog,
    services: ExportServices,
    /// Provider settings, `Null` when the provider has none
    configuration: serde_json::Value,
    app_version: String,
    state: ProviderState,
    progress: ProgressTracker,
}

impl ExecutionContext {
    /// Create a new execution context
    ///
    /// # Arguments
    /// * `file_path` - Destination file of the run
    /// * `segmenter` - Record source
    pub fn new(file_path: impl Into<PathBuf>, segmenter: Box<dyn Segmenter>) -> Self {
        Self {
            file_path: file_path.into(),
            segmenter,
            abort: AbortHandle::new(),
            records_succeeded: 0,
            records_failed: 0,
            log: ExportLog::new(),
            services: ExportServices::default(),
            configuration: serde_json::Value::Null,
            app_version: crate::VERSION.to_string(),
            state: ProviderState::Idle,
            progress: ProgressTracker::hidden(),
        }
    }

    /// Share an abort signal with the host
    pub fn with_abort_handle(mut self, abort: AbortHandle) -> Self {
        self.abort = abort;
        self
    }

    /// Set collaborator services
    pub fn with_services(mut self, services: ExportServices) -> Self {
        self.services = services;
        self
    }

    /// Set provider settings
    pub fn with_configuration(mut self, configuration: serde_json::Value) -> Self {
        self.configuration = configuration;
        self
    }

    /// Set the application version written into envelopes
    pub fn with_app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = version.into();
        self
    }

    /// Attach a progress display
    pub fn with_progress(mut self, progress: ProgressTracker) -> Self {
        self.progress = progress;
        self
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Current abort state
    pub fn abort(&self) -> Abort {
        self.abort.state()
    }

    pub fn abort_handle(&self) -> &AbortHandle {
        &self.abort
    }

    /// Stop the run because of a condition no further record can recover from
    ///
    /// The current output is still finalized.
    pub fn abort_with_error(&mut self, reason: &str) {
        if self.abort.abort_error() {
            self.log.error(format!("Export aborted: {}", reason));
        }
    }

    pub fn records_succeeded(&self) -> u64 {
        self.records_succeeded
    }

    pub fn records_failed(&self) -> u64 {
        self.records_failed
    }

    /// Count one successfully written record
    pub fn record_succeeded(&mut self) {
        self.records_succeeded += 1;
        self.progress
            .update(self.records_succeeded, self.records_failed);
    }

    /// Count one failed record and log the failure against its id
    ///
    /// # Arguments
    /// * `error` - Failure raised while serializing the record
    /// * `record_id` - Identifier of the record
    pub fn record_exception(&mut self, error: &RecordError, record_id: i64) {
        self.records_failed += 1;
        self.log.record_error(record_id, error.to_string());
        self.progress
            .update(self.records_succeeded, self.records_failed);
    }

    pub fn log(&self) -> &ExportLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut ExportLog {
        &mut self.log
    }

    pub fn segmenter_mut(&mut self) -> &mut dyn Segmenter {
        self.segmenter.as_mut()
    }

    pub fn services(&self) -> &ExportServices {
        &self.services
    }

    pub fn configuration(&self) -> &serde_json::Value {
        &self.configuration
    }

    /// Decode the provider settings, falling back to defaults when unset
    ///
    /// # Arguments
    /// * `provider` - System name of the provider, used in error messages
    ///
    /// # Returns
    /// * `Result<T>` - Typed settings or a configuration error
    pub fn settings<T>(&self, provider: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        if self.configuration.is_null() {
            return Ok(T::default());
        }

        serde_json::from_value(self.configuration.clone()).map_err(|e| {
            ProviderError::InvalidConfiguration {
                provider: provider.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    pub fn app_version(&self) -> &str {
        &self.app_version
    }

    pub fn state(&self) -> ProviderState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: ProviderState) {
        self.state = state;
    }

    /// Clear the progress display
    pub fn finish_progress(&self) {
        self.progress.finish();
    }
}
