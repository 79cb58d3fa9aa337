//! Tabular output sinks.
//!
//! - [`columnar`] — Parquet table, one row per event, list-valued attribute columns.
//! - [`delimited`] — CSV with a fixed number of object slots per line.
//!
//! A sink is opened by its constructor (schema or header written there), fed
//! one [`EventRow`] per event in event order, and finalized by
//! [`TabularSink::close`]. Any sink error is fatal to the run.

pub mod columnar;
pub mod delimited;

pub use columnar::{
    ColumnarOptions, ColumnarSink, ObjectTable, read_object_table, read_object_table_bytes,
};
pub use delimited::{DelimitedSink, MAX_SLOTS_LIMIT, TEXT_FIELDS, check_max_slots, text_header};

use pox_core::Result;

use crate::accumulator::{EventRow, FillPolicy};

/// What a sink did with one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The row was written in full.
    Written,
    /// The row was intentionally not written (no objects, text output).
    Skipped,
    /// The row was written, but `omitted` objects did not fit.
    Truncated {
        /// Objects beyond the last slot.
        omitted: usize,
    },
}

/// Destination for per-event rows.
pub trait TabularSink {
    /// How the driver should record non-qualifying candidates for this sink.
    fn fill_policy(&self) -> FillPolicy;

    /// Append one event row.
    fn write_row(&mut self, row: &EventRow) -> Result<WriteOutcome>;

    /// Flush everything to stable storage and release the output handle.
    ///
    /// Calling `close` again is a no-op.
    fn close(&mut self) -> Result<()>;
}

impl<T: TabularSink + ?Sized> TabularSink for Box<T> {
    fn fill_policy(&self) -> FillPolicy {
        (**self).fill_policy()
    }

    fn write_row(&mut self, row: &EventRow) -> Result<WriteOutcome> {
        (**self).write_row(row)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}
