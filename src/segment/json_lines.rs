//! JSON Lines segmenter
//!
//! Reads one JSON object per line from a file and pages the decoded records.
//! Lines are read lazily: only the current segment is held in memory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tracing::{debug, info};

use super::Segmenter;
use crate::error::{ExportError, Result, SegmentError};
use crate::record::{PropertyBag, RecordRef};

/// Segmenter over a JSON Lines file
pub struct JsonLinesSegmenter {
    lines: Option<Lines<BufReader<File>>>,
    path: PathBuf,
    page_size: usize,
    line_number: u64,
    total_fetched: u64,
    current: Vec<RecordRef>,
}

impl JsonLinesSegmenter {
    /// Open a JSON Lines file
    ///
    /// # Arguments
    /// * `path` - Input file path
    /// * `page_size` - Maximum records per segment, must be positive
    ///
    /// # Returns
    /// * `Result<Self>` - New segmenter or error
    pub async fn open(path: impl AsRef<Path>, page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(SegmentError::InvalidPageSize(page_size).into());
        }

        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).await.map_err(|e| {
            ExportError::Segment(SegmentError::FetchFailed(format!(
                "Failed to open {}: {}",
                path.display(),
                e
            )))
        })?;

        debug!("Opened JSON Lines source: {}", path.display());

        Ok(Self {
            lines: Some(BufReader::new(file).lines()),
            path,
            page_size,
            line_number: 0,
            total_fetched: 0,
            current: Vec::new(),
        })
    }
}

#[async_trait]
impl Segmenter for JsonLinesSegmenter {
    async fn read_next_segment(&mut self) -> Result<bool> {
        self.current.clear();

        let lines = match self.lines.as_mut() {
            Some(lines) => lines,
            None => return Ok(false),
        };

        while self.current.len() < self.page_size {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    // On error, drop the reader to release the file
                    self.lines = None;
                    return Err(SegmentError::FetchFailed(e.to_string()).into());
                }
            };
            self.line_number += 1;

            if line.trim().is_empty() {
                continue;
            }

            let record = serde_json::from_str::<serde_json::Value>(&line)
                .map_err(|e| e.to_string())
                .and_then(|json| PropertyBag::from_json(&json))
                .map_err(|message| SegmentError::InvalidRecord {
                    line: self.line_number,
                    message,
                })?;
            self.current.push(Arc::new(record));
        }

        if self.current.is_empty() {
            debug!(
                "JSON Lines source {} exhausted after {} records",
                self.path.display(),
                self.total_fetched
            );
            self.lines = None;
            return Ok(false);
        }

        self.total_fetched += self.current.len() as u64;
        debug!(
            "Read segment of {} records (total: {})",
            self.current.len(),
            self.total_fetched
        );
        Ok(true)
    }

    fn current_segment(&self) -> &[RecordRef] {
        &self.current
    }

    async fn close(&mut self) -> Result<()> {
        if self.lines.take().is_some() {
            info!(
                "Closed JSON Lines source {} after {} records",
                self.path.display(),
                self.total_fetched
            );
        }
        Ok(())
    }
}
