//! Per-event column buffers.

use pox_core::{Error, EventId, Result};

use crate::selector::{Attribute, ObjectTuple};

/// What the driver records for a candidate that fails the predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillPolicy {
    /// Record a sentinel tuple, so the row holds one entry per candidate.
    Sentinel,
    /// Record nothing; the row holds qualifying candidates only.
    QualifiedOnly,
}

/// Aligned attribute sequences of one event (Structure-of-Arrays).
///
/// Every column has exactly [`EventRow::count`] entries.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    id: EventId,
    attributes: &'static [Attribute],
    columns: Vec<Vec<f32>>,
    labels: Vec<&'static str>,
}

impl EventRow {
    /// An empty row for `id` with the given column layout.
    pub fn empty(id: EventId, attributes: &'static [Attribute]) -> Self {
        Self { id, attributes, columns: vec![Vec::new(); attributes.len()], labels: Vec::new() }
    }

    /// Build a row from decoded columns (no type labels).
    pub fn from_columns(
        id: EventId,
        attributes: &'static [Attribute],
        columns: Vec<Vec<f32>>,
    ) -> Result<Self> {
        if columns.len() != attributes.len() {
            return Err(Error::Validation(format!(
                "event {id}: expected {} columns, got {}",
                attributes.len(),
                columns.len()
            )));
        }
        let n = columns.first().map_or(0, Vec::len);
        if let Some((attr, col)) = attributes.iter().zip(&columns).find(|(_, c)| c.len() != n) {
            return Err(Error::Validation(format!(
                "event {id}: column {attr:?} has {} entries, expected {n}",
                col.len()
            )));
        }
        Ok(Self { id, attributes, columns, labels: Vec::new() })
    }

    /// Event identity.
    pub fn id(&self) -> EventId {
        self.id
    }

    /// Number of recorded objects.
    pub fn count(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// `true` when no object was recorded.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Column layout.
    pub fn attributes(&self) -> &'static [Attribute] {
        self.attributes
    }

    /// Sequence for one attribute, if part of the layout.
    pub fn column(&self, attr: Attribute) -> Option<&[f32]> {
        let idx = self.attributes.iter().position(|a| *a == attr)?;
        Some(&self.columns[idx])
    }

    /// Iterate `(attribute, sequence)` pairs in layout order.
    pub fn columns(&self) -> impl Iterator<Item = (Attribute, &[f32])> + '_ {
        self.attributes.iter().copied().zip(self.columns.iter().map(Vec::as_slice))
    }

    /// Value of `attr` for object `index`.
    pub fn value(&self, attr: Attribute, index: usize) -> Option<f32> {
        self.column(attr).and_then(|c| c.get(index).copied())
    }

    /// Type label of object `index` (rows decoded from a table carry none).
    pub fn label(&self, index: usize) -> Option<&'static str> {
        self.labels.get(index).copied()
    }

    /// Type label of the last recorded object.
    pub fn last_label(&self) -> Option<&'static str> {
        self.labels.last().copied()
    }
}

/// Builds one [`EventRow`] per event.
///
/// [`EventAccumulator::take`] moves the finished row out and leaves a fresh
/// one behind, so a row handed to a sink never shares storage with the next
/// event's buffers.
#[derive(Debug)]
pub struct EventAccumulator {
    attributes: &'static [Attribute],
    row: EventRow,
}

impl EventAccumulator {
    /// Accumulator for the given column layout.
    pub fn new(attributes: &'static [Attribute]) -> Self {
        Self { attributes, row: EventRow::empty(EventId::default(), attributes) }
    }

    /// Clear all sequences and start a new event.
    pub fn reset(&mut self, id: EventId) {
        self.row = EventRow::empty(id, self.attributes);
    }

    /// Push one tuple onto every aligned sequence.
    pub fn append(&mut self, tuple: &ObjectTuple) {
        for (attr, col) in self.attributes.iter().zip(self.row.columns.iter_mut()) {
            col.push(tuple.value(*attr));
        }
        self.row.labels.push(tuple.label);
    }

    /// Objects recorded so far in the current event.
    pub fn count(&self) -> usize {
        self.row.count()
    }

    /// The row being built.
    pub fn row(&self) -> &EventRow {
        &self.row
    }

    /// Finish the current event: return its row and reset to an empty one.
    pub fn take(&mut self) -> EventRow {
        let id = self.row.id;
        std::mem::replace(&mut self.row, EventRow::empty(id, self.attributes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::{KINEMATIC_ATTRIBUTES, SENTINEL, TRACK_ATTRIBUTES};

    fn tuple(e: f32) -> ObjectTuple {
        ObjectTuple {
            label: "G",
            energy: e,
            pt: 1.0,
            px: 2.0,
            py: 3.0,
            pz: 4.0,
            eta: 0.5,
            phi: 0.25,
            charge: 1.0,
            track: None,
        }
    }

    #[test]
    fn test_append_keeps_columns_aligned() {
        let mut acc = EventAccumulator::new(&TRACK_ATTRIBUTES);
        acc.reset(EventId::new(5, 100));
        acc.append(&tuple(10.0));
        acc.append(&ObjectTuple::sentinel("G"));
        acc.append(&tuple(30.0));

        let row = acc.row();
        assert_eq!(row.count(), 3);
        for (_, col) in row.columns() {
            assert_eq!(col.len(), 3);
        }
        assert_eq!(row.column(Attribute::Energy).unwrap(), &[10.0, SENTINEL, 30.0]);
        assert_eq!(row.column(Attribute::TrackPt).unwrap(), &[SENTINEL; 3]);
    }

    #[test]
    fn test_take_resets_and_does_not_alias() {
        let mut acc = EventAccumulator::new(&KINEMATIC_ATTRIBUTES);
        acc.reset(EventId::new(1, 1));
        acc.append(&tuple(7.0));
        let first = acc.take();
        assert_eq!(acc.count(), 0);

        acc.reset(EventId::new(1, 2));
        acc.append(&tuple(8.0));
        acc.append(&tuple(9.0));

        assert_eq!(first.id(), EventId::new(1, 1));
        assert_eq!(first.column(Attribute::Energy).unwrap(), &[7.0]);
        assert_eq!(acc.row().column(Attribute::Energy).unwrap(), &[8.0, 9.0]);
        assert_eq!(acc.row().last_label(), Some("G"));
    }

    #[test]
    fn test_reset_clears_previous_event() {
        let mut acc = EventAccumulator::new(&KINEMATIC_ATTRIBUTES);
        acc.reset(EventId::new(1, 1));
        acc.append(&tuple(7.0));
        acc.reset(EventId::new(1, 2));
        assert!(acc.row().is_empty());
        assert_eq!(acc.row().id(), EventId::new(1, 2));
        assert_eq!(acc.row().last_label(), None);
    }

    #[test]
    fn test_from_columns_rejects_ragged_input() {
        let mut cols = vec![vec![1.0f32, 2.0]; 8];
        cols[3].pop();
        let err = EventRow::from_columns(EventId::new(1, 1), &KINEMATIC_ATTRIBUTES, cols);
        assert!(err.is_err());

        let empty = vec![Vec::new(); KINEMATIC_ATTRIBUTES.len()];
        let ok = EventRow::from_columns(EventId::new(1, 1), &KINEMATIC_ATTRIBUTES, empty).unwrap();
        assert!(ok.is_empty());
    }
}
