//! Segmented record sources for export runs
//!
//! A [`Segmenter`] hands out bounded batches of records so an export never
//! holds the full result set in memory. Each call to
//! [`Segmenter::read_next_segment`] replaces the current batch; the previous
//! batch is dropped.
//!
//! Segmenters are single-pass and forward-only. Fetch failures surface as
//! errors from `read_next_segment` and end the run.

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Result, SegmentError};
use crate::record::RecordRef;

mod json_lines;

pub use json_lines::JsonLinesSegmenter;

/// Trait for reading records in batches
#[async_trait]
pub trait Segmenter: Send {
    /// Advance to the next segment
    ///
    /// # Returns
    /// * `Result<bool>` - `false` once the source is exhausted
    async fn read_next_segment(&mut self) -> Result<bool>;

    /// Records of the segment read last
    ///
    /// Empty before the first successful advance and after exhaustion.
    fn current_segment(&self) -> &[RecordRef];

    /// Total number of records, if the source knows it up front
    fn total_records(&self) -> Option<u64> {
        None
    }

    /// Release the underlying source
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Segmenter paging over records already held in memory
pub struct VecSegmenter {
    /// Remaining records, consumed front to back
    pending: std::vec::IntoIter<RecordRef>,
    page_size: usize,
    total: u64,
    current: Vec<RecordRef>,
    segments_read: u32,
}

impl VecSegmenter {
    /// Create a new in-memory segmenter
    ///
    /// # Arguments
    /// * `records` - Records in export order
    /// * `page_size` - Maximum records per segment, must be positive
    ///
    /// # Returns
    /// * `Result<Self>` - New segmenter or error for a zero page size
    pub fn new(records: Vec<RecordRef>, page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(SegmentError::InvalidPageSize(page_size).into());
        }

        Ok(Self {
            total: records.len() as u64,
            pending: records.into_iter(),
            page_size,
            current: Vec::new(),
            segments_read: 0,
        })
    }

    /// Number of segments handed out so far
    pub fn segments_read(&self) -> u32 {
        self.segments_read
    }
}

#[async_trait]
impl Segmenter for VecSegmenter {
    async fn read_next_segment(&mut self) -> Result<bool> {
        self.current = self.pending.by_ref().take(self.page_size).collect();

        if self.current.is_empty() {
            debug!(
                "In-memory segmenter exhausted after {} segments",
                self.segments_read
            );
            return Ok(false);
        }

        self.segments_read += 1;
        Ok(true)
    }

    fn current_segment(&self) -> &[RecordRef] {
        &self.current
    }

    fn total_records(&self) -> Option<u64> {
        Some(self.total)
    }
}
