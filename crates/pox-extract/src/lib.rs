//! # pox-extract
//!
//! Extract physics-object attributes from event records into tabular output.
//!
//! ```text
//! EventRecord ──▶ ObjectSelector ──▶ EventAccumulator ──▶ TabularSink
//!  (per event)     (per candidate)     (one EventRow)      (Parquet | CSV)
//! ```
//!
//! - [`selector`] — qualification predicate and attribute extraction.
//! - [`accumulator`] — aligned per-event column buffers ([`EventRow`]).
//! - [`sink`] — columnar (Parquet) and delimited-text (CSV) outputs.
//! - [`pipeline`] — the per-event driver.
//! - [`source`], [`config`], [`job`] — JSON-lines input, job config, job runner.
//!
//! ## Example
//!
//! ```no_run
//! use pox_core::{Event, ObjectKind};
//! use pox_extract::{ColumnarOptions, ColumnarSink, Extractor, selector_for};
//!
//! let sink = ColumnarSink::create(
//!     "MuonObjectInfo.parquet".as_ref(),
//!     ObjectKind::Muon,
//!     &ColumnarOptions::new("muons"),
//! )
//! .unwrap();
//! let mut ex = Extractor::new("muons", selector_for(ObjectKind::Muon), sink);
//! ex.process(&Event::new(1, 1).with_collection("muons", vec![])).unwrap();
//! let summary = ex.finish().unwrap();
//! assert_eq!(summary.rows_written, 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod accumulator;
pub mod config;
pub mod job;
pub mod pipeline;
pub mod selector;
pub mod sink;
pub mod source;


pub use accumulator::{EventAccumulator, EventRow, FillPolicy};
pub use config::{ExtractorConfig, OutputConfig, OutputFormat, read_config};
pub use job::{JobReport, run_job};
pub use pipeline::{Extractor, RunSummary};
pub use selector::{
    Attribute, ElectronSelector, MuonSelector, ObjectSelector, ObjectTuple, SENTINEL, Selection,
    TrackTuple, selector_for,
};
pub use sink::{
    ColumnarOptions, ColumnarSink, DelimitedSink, ObjectTable, TabularSink, WriteOutcome,
    read_object_table, read_object_table_bytes,
};
pub use source::JsonLinesSource;
