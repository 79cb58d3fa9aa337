//! The event-record seam between the hosting framework and the extractor.

use crate::types::{Candidate, EventId};

/// One event as delivered by the upstream event source.
///
/// Candidates are borrowed for the duration of a single event and are never
/// retained by the extractor.
pub trait EventRecord {
    /// Run and event number of this record.
    fn id(&self) -> EventId;

    /// Look up a candidate collection by name.
    ///
    /// `None` means the handle is invalid (collection absent from the record),
    /// which is distinct from a valid but empty collection.
    fn collection(&self, name: &str) -> Option<&[Candidate]>;
}

impl<T: EventRecord + ?Sized> EventRecord for &T {
    fn id(&self) -> EventId {
        (**self).id()
    }

    fn collection(&self, name: &str) -> Option<&[Candidate]> {
        (**self).collection(name)
    }
}
