//! Shared segment loop of all providers
//!
//! The loop owns the provider state machine (`Idle → Writing → Ended`), the
//! abort checks and the per-record fault isolation. Formats plug in through
//! [`RecordSink`]:
//!
//! - `render` is pure and may fail per record; a failure is counted on the
//!   context and leaves a gap in the output, never a half-written record
//! - `emit` does the I/O for a rendered record; a failure ends the run
//! - `close` writes the closing envelope and releases the destination
//! - `release` flushes what was written, without the closing envelope, when
//!   the run ends with an error
//! - `is_full` lets a bounded destination stop the run with `Abort::Error`
//!   instead of failing on the next write

use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::BufWriter;
use tracing::{debug, info, warn};

use crate::context::{ExecutionContext, ProviderState};
use crate::error::{ExportError, RecordError, Result};
use crate::record::Record;

/// Output buffer size for file sinks
const WRITE_BUFFER_SIZE: usize = 1024 * 1024;

/// Format-specific half of a provider
#[async_trait]
pub trait RecordSink: Send {
    /// Serialized form of one record
    type Item: Send;

    /// Open the destination and write the envelope or header
    async fn open(&mut self) -> Result<()>;

    /// Serialize one record without touching the destination
    fn render(&self, record: &dyn Record) -> std::result::Result<Self::Item, RecordError>;

    /// Write one rendered record
    async fn emit(&mut self, item: Self::Item) -> Result<()>;

    /// Write the closing envelope, flush and release the destination
    async fn close(&mut self) -> Result<()>;

    /// Flush and release the destination after a fatal error
    async fn release(&mut self) -> Result<()>;

    /// Check if the destination cannot take another record
    fn is_full(&self) -> bool {
        false
    }
}

/// Run the segment loop of one export
///
/// # Arguments
/// * `sink` - Format sink, not yet opened
/// * `ctx` - Execution context of the run
///
/// # Returns
/// * `Result<()>` - Success, also after abort or record failures
pub async fn write_segments<S: RecordSink>(sink: &mut S, ctx: &mut ExecutionContext) -> Result<()> {
    let start_time = Instant::now();

    sink.open().await?;
    ctx.set_state(ProviderState::Writing);
    debug!("Opened {}", ctx.file_path().display());

    if let Err(e) = drain(sink, ctx).await {
        if let Err(release_err) = sink.release().await {
            warn!("Failed to release output after error: {}", release_err);
        }
        if let Err(close_err) = ctx.segmenter_mut().close().await {
            warn!("Failed to close segmenter: {}", close_err);
        }
        ctx.set_state(ProviderState::Ended);
        ctx.finish_progress();
        ctx.log_mut().error(format!("Export failed: {}", e));
        return Err(e);
    }

    let closed = sink.close().await;
    ctx.set_state(ProviderState::Ended);
    ctx.finish_progress();
    closed?;
    ctx.segmenter_mut().close().await?;

    let abort = ctx.abort();
    if !abort.is_none() {
        ctx.log_mut().warn(format!("Export stopped early ({:?})", abort));
    }

    info!(
        "Export completed: {} succeeded, {} failed, {} ms",
        ctx.records_succeeded(),
        ctx.records_failed(),
        start_time.elapsed().as_millis()
    );
    Ok(())
}

async fn drain<S: RecordSink>(sink: &mut S, ctx: &mut ExecutionContext) -> Result<()> {
    let mut segment_count = 0u32;

    while ctx.abort().is_none() {
        debug!("Fetching segment #{}", segment_count + 1);
        if !ctx.segmenter_mut().read_next_segment().await? {
            debug!("No more records available");
            break;
        }
        segment_count += 1;

        let segment = ctx.segmenter_mut().current_segment().to_vec();
        debug!("Received segment of {} records", segment.len());

        for record in &segment {
            if !ctx.abort().is_none() {
                info!("Export aborted ({:?}), finalizing output", ctx.abort());
                break;
            }
            if sink.is_full() {
                ctx.abort_with_error("Output is full, remaining records were not exported");
                break;
            }

            match sink.render(record.as_ref()) {
                Ok(item) => {
                    sink.emit(item).await?;
                    ctx.record_succeeded();
                }
                Err(e) => ctx.record_exception(&e, record.id()),
            }
        }

        if segment_count % 10 == 0 {
            info!(
                "Progress: {} records written ({} segments)",
                ctx.records_succeeded(),
                segment_count
            );
        }
    }

    Ok(())
}

/// Create or truncate an output file behind a write buffer
///
/// # Arguments
/// * `path` - File path to create
///
/// # Returns
/// * `Result<BufWriter<File>>` - Buffered writer or error
pub(crate) async fn create_output(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(ExportError::Generic(format!(
                "Directory does not exist: {}",
                parent.display()
            )));
        }
    }

    let file = File::create(path).await?;
    Ok(BufWriter::with_capacity(WRITE_BUFFER_SIZE, file))
}
