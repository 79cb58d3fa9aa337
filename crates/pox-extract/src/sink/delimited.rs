//! Fixed-width CSV output: one line per event, `max_slots` object groups per line.
//!
//! ```text
//! Run,Event,type1,E1,px1,py1,pz1,pt1,eta1,phi1,Q1,type2,E2,...
//! 5,100,G,52.5,30,-26.8,33.1,40.25,0.75,-0.73,-1,G,0.0,0.0,...
//! ```
//!
//! Events without objects produce no line. Slots past the last object hold
//! `0.0` in every numeric field and repeat the last object's type label.
//! Objects past the last slot are dropped.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use pox_core::{Error, Result};

use super::{TabularSink, WriteOutcome};
use crate::accumulator::{EventRow, FillPolicy};
use crate::selector::Attribute;

/// Default number of object slots per line.
pub const DEFAULT_MAX_SLOTS: usize = 5;

/// Largest accepted number of object slots per line.
pub const MAX_SLOTS_LIMIT: usize = 1024;

/// Literal written to every numeric field of an unused slot.
pub const PAD_VALUE: &str = "0.0";

/// Numeric fields of one slot group, in output order, with their header names.
pub const TEXT_FIELDS: [(&str, Attribute); 8] = [
    ("E", Attribute::Energy),
    ("px", Attribute::Px),
    ("py", Attribute::Py),
    ("pz", Attribute::Pz),
    ("pt", Attribute::Pt),
    ("eta", Attribute::Eta),
    ("phi", Attribute::Phi),
    ("Q", Attribute::Charge),
];

/// Header fields for `max_slots` groups.
pub fn text_header(max_slots: usize) -> Vec<String> {
    let mut header = Vec::new();
    header.push("Run".to_string());
    header.push("Event".to_string());
    for slot in 1..=max_slots {
        header.push(format!("type{slot}"));
        header.extend(TEXT_FIELDS.iter().map(|(name, _)| format!("{name}{slot}")));
    }
    header
}

/// Reject slot counts outside `1..=MAX_SLOTS_LIMIT`.
pub fn check_max_slots(max_slots: usize) -> Result<()> {
    if !(1..=MAX_SLOTS_LIMIT).contains(&max_slots) {
        return Err(Error::Validation(format!(
            "max_slots must be in 1..={MAX_SLOTS_LIMIT}, got {max_slots}"
        )));
    }
    Ok(())
}

/// Delimited-text sink.
pub struct DelimitedSink<W: Write> {
    target: String,
    writer: Option<csv::Writer<W>>,
    max_slots: usize,
    rows_written: u64,
}

impl DelimitedSink<File> {
    /// Create (or truncate) `path` and write the header line.
    pub fn create(path: &Path, max_slots: usize) -> Result<Self> {
        let file = File::create(path).map_err(|e| {
            Error::Output(format!("failed to create {}: {e}", path.display()))
        })?;
        Self::with_target(file, path.display().to_string(), max_slots)
    }
}

impl<W: Write> DelimitedSink<W> {
    /// Open over an arbitrary writer and write the header line.
    pub fn new(writer: W, max_slots: usize) -> Result<Self> {
        Self::with_target(writer, "<memory>".to_string(), max_slots)
    }

    fn with_target(writer: W, target: String, max_slots: usize) -> Result<Self> {
        check_max_slots(max_slots)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(writer);
        writer
            .write_record(text_header(max_slots))
            .map_err(|e| Error::Output(format!("failed to write header to {target}: {e}")))?;

        tracing::info!(target_file = %target, max_slots, "opened delimited object file");
        Ok(Self { target, writer: Some(writer), max_slots, rows_written: 0 })
    }

    /// Data lines written so far (header excluded).
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    fn render(&self, row: &EventRow) -> Result<Vec<String>> {
        let id = row.id();
        let pad_label = row.last_label().unwrap_or_default();
        let mut record = Vec::with_capacity(2 + self.max_slots * (TEXT_FIELDS.len() + 1));
        record.push(id.run.to_string());
        record.push(id.event.to_string());

        for slot in 0..self.max_slots {
            if slot < row.count() {
                record.push(row.label(slot).unwrap_or(pad_label).to_string());
                for (name, attr) in TEXT_FIELDS {
                    let v = row.value(attr, slot).ok_or_else(|| {
                        Error::Validation(format!("event {id}: row has no '{name}' column"))
                    })?;
                    record.push(v.to_string());
                }
            } else {
                record.push(pad_label.to_string());
                record.extend(TEXT_FIELDS.iter().map(|_| PAD_VALUE.to_string()));
            }
        }
        Ok(record)
    }
}

impl<W: Write> TabularSink for DelimitedSink<W> {
    fn fill_policy(&self) -> FillPolicy {
        FillPolicy::QualifiedOnly
    }

    fn write_row(&mut self, row: &EventRow) -> Result<WriteOutcome> {
        if self.writer.is_none() {
            return Err(Error::Output(format!("{}: write after close", self.target)));
        }
        if row.is_empty() {
            return Ok(WriteOutcome::Skipped);
        }

        let record = self.render(row)?;
        if let Some(writer) = self.writer.as_mut() {
            writer.write_record(&record).map_err(|e| {
                Error::Output(format!("failed to write event {} to {}: {e}", row.id(), self.target))
            })?;
        }
        self.rows_written += 1;

        let omitted = row.count().saturating_sub(self.max_slots);
        if omitted > 0 {
            tracing::trace!(event = %row.id(), omitted, "truncated objects beyond last slot");
            Ok(WriteOutcome::Truncated { omitted })
        } else {
            Ok(WriteOutcome::Written)
        }
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer
                .flush()
                .map_err(|e| Error::Output(format!("failed to flush {}: {e}", self.target)))?;
            tracing::info!(
                target_file = %self.target,
                rows = self.rows_written,
                "closed delimited object file"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::EventAccumulator;
    use crate::selector::{ObjectTuple, TRACK_ATTRIBUTES};
    use pox_core::EventId;

    fn tuple(label: &'static str, e: f32) -> ObjectTuple {
        ObjectTuple {
            label,
            energy: e,
            pt: 2.5,
            px: 1.5,
            py: -2.0,
            pz: 0.25,
            eta: 0.1,
            phi: 3.0,
            charge: 1.0,
            track: None,
        }
    }

    fn row(id: EventId, tuples: &[ObjectTuple]) -> EventRow {
        let mut acc = EventAccumulator::new(&TRACK_ATTRIBUTES);
        acc.reset(id);
        for t in tuples {
            acc.append(t);
        }
        acc.take()
    }

    fn render_lines(max_slots: usize, rows: &[EventRow]) -> Vec<String> {
        let mut buf = Vec::new();
        {
            let mut sink = DelimitedSink::new(&mut buf, max_slots).unwrap();
            for r in rows {
                sink.write_row(r).unwrap();
            }
            sink.close().unwrap();
        }
        String::from_utf8(buf).unwrap().lines().map(str::to_string).collect()
    }

    #[test]
    fn test_header_has_nine_columns_per_slot() {
        let h = text_header(2).join(",");
        assert_eq!(
            h,
            "Run,Event,type1,E1,px1,py1,pz1,pt1,eta1,phi1,Q1,type2,E2,px2,py2,pz2,pt2,eta2,phi2,Q2"
        );
    }

    #[test]
    fn test_empty_row_is_skipped() {
        let lines = render_lines(3, &[row(EventId::new(1, 1), &[])]);
        assert_eq!(lines.len(), 1, "header only");
    }

    #[test]
    fn test_padding_repeats_last_label() {
        let r = row(EventId::new(5, 100), &[tuple("G", 10.0), tuple("T", 20.0)]);
        let lines = render_lines(3, &[r]);
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "5,100,G,10,1.5,-2,0.25,2.5,0.1,3,1,T,20,1.5,-2,0.25,2.5,0.1,3,1,\
             T,0.0,0.0,0.0,0.0,0.0,0.0,0.0,0.0"
        );
    }

    #[test]
    fn test_objects_beyond_last_slot_are_dropped() {
        let tuples: Vec<ObjectTuple> = (1..=4).map(|i| tuple("G", i as f32)).collect();
        let r = row(EventId::new(2, 3), &tuples);

        let mut buf = Vec::new();
        let outcome = {
            let mut sink = DelimitedSink::new(&mut buf, 2).unwrap();
            let o = sink.write_row(&r).unwrap();
            sink.close().unwrap();
            assert_eq!(sink.rows_written(), 1);
            o
        };
        assert_eq!(outcome, WriteOutcome::Truncated { omitted: 2 });

        let text = String::from_utf8(buf).unwrap();
        let line = text.lines().nth(1).unwrap();
        assert_eq!(line.split(',').count(), 2 + 2 * 9);
        assert!(line.starts_with("2,3,G,1,"));
        assert!(line.contains(",G,2,"));
        assert!(!line.contains(",G,3,"));
    }

    #[test]
    fn test_out_of_range_slots_are_rejected() {
        assert!(DelimitedSink::new(Vec::new(), 0).is_err());
        assert!(DelimitedSink::new(Vec::new(), MAX_SLOTS_LIMIT + 1).is_err());
        assert!(matches!(
            DelimitedSink::new(Vec::new(), usize::MAX / 4),
            Err(Error::Validation(_))
        ));
        assert!(matches!(DelimitedSink::new(Vec::new(), usize::MAX), Err(Error::Validation(_))));

        let mut buf = Vec::new();
        {
            let mut sink = DelimitedSink::new(&mut buf, MAX_SLOTS_LIMIT).unwrap();
            sink.close().unwrap();
        }
        let header = String::from_utf8(buf).unwrap();
        assert_eq!(header.trim_end().split(',').count(), 2 + MAX_SLOTS_LIMIT * 9);
    }
}
