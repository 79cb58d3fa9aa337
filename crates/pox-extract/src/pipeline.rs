//! Per-event driver: fetch → select → emit → reset.

use serde::Serialize;

use pox_core::{EventRecord, Result};

use crate::accumulator::{EventAccumulator, FillPolicy};
use crate::selector::{Attribute, ObjectSelector, Selection};
use crate::sink::{TabularSink, WriteOutcome};

/// Counters collected over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Events handed to [`Extractor::process`].
    pub events: u64,
    /// Rows the sink wrote.
    pub rows_written: u64,
    /// Rows the sink skipped (no objects, text output).
    pub rows_skipped: u64,
    /// Rows written with objects dropped past the last slot.
    pub rows_truncated: u64,
    /// Events whose input collection handle was invalid.
    pub invalid_collections: u64,
    /// Candidates seen across all events.
    pub candidates: u64,
    /// Candidates passing the qualification predicate.
    pub qualified: u64,
    /// Qualified candidates without an associated combined track.
    pub missing_tracks: u64,
}

/// Drives one selector and one sink over a sequence of event records.
///
/// The sink is opened by the caller; [`Extractor::finish`] closes it and must
/// be called even when no event was processed.
pub struct Extractor<K: TabularSink> {
    collection: String,
    selector: Box<dyn ObjectSelector>,
    sink: K,
    policy: FillPolicy,
    tracks_expected: bool,
    accumulator: EventAccumulator,
    summary: RunSummary,
}

impl<K: TabularSink> Extractor<K> {
    /// Extractor reading `collection` from every record.
    pub fn new(collection: impl Into<String>, selector: Box<dyn ObjectSelector>, sink: K) -> Self {
        let kind = selector.kind();
        let policy = sink.fill_policy();
        Self {
            collection: collection.into(),
            selector,
            sink,
            policy,
            tracks_expected: kind.has_track_columns(),
            accumulator: EventAccumulator::new(Attribute::columnar_layout(kind)),
            summary: RunSummary::default(),
        }
    }

    /// Counters so far.
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Process one event and hand its row to the sink.
    ///
    /// An invalid collection handle yields an empty row; sink errors are returned.
    pub fn process<R: EventRecord + ?Sized>(&mut self, record: &R) -> Result<()> {
        let id = record.id();
        self.accumulator.reset(id);
        self.summary.events += 1;

        match record.collection(&self.collection) {
            Some(candidates) => {
                tracing::trace!(event = %id, candidates = candidates.len(), "select");
                for candidate in candidates {
                    self.summary.candidates += 1;
                    match self.selector.select(candidate) {
                        Selection::Qualified(tuple) => {
                            self.summary.qualified += 1;
                            if self.tracks_expected && tuple.track.is_none() {
                                self.summary.missing_tracks += 1;
                                tracing::debug!(event = %id, "no combined track");
                            }
                            self.accumulator.append(&tuple);
                        }
                        Selection::Rejected => {
                            if self.policy == FillPolicy::Sentinel {
                                self.accumulator.append(&self.selector.sentinel());
                            }
                        }
                    }
                }
            }
            None => {
                self.summary.invalid_collections += 1;
                tracing::debug!(
                    event = %id,
                    collection = %self.collection,
                    "invalid collection handle"
                );
            }
        }

        let row = self.accumulator.take();
        tracing::trace!(event = %id, objects = row.count(), "emit");
        match self.sink.write_row(&row)? {
            WriteOutcome::Written => self.summary.rows_written += 1,
            WriteOutcome::Skipped => self.summary.rows_skipped += 1,
            WriteOutcome::Truncated { .. } => {
                self.summary.rows_written += 1;
                self.summary.rows_truncated += 1;
            }
        }
        Ok(())
    }

    /// Process every record of `events`, stopping at the first error.
    pub fn process_all<I, R>(&mut self, events: I) -> Result<()>
    where
        I: IntoIterator<Item = Result<R>>,
        R: EventRecord,
    {
        for event in events {
            self.process(&event?)?;
        }
        Ok(())
    }

    /// Close the sink and return the run counters.
    pub fn finish(mut self) -> Result<RunSummary> {
        self.sink.close()?;
        let s = &self.summary;
        tracing::info!(
            events = s.events,
            rows_written = s.rows_written,
            rows_skipped = s.rows_skipped,
            candidates = s.candidates,
            qualified = s.qualified,
            "extraction finished"
        );
        Ok(self.summary)
    }
}
