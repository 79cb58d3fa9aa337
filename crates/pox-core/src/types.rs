//! Core data types: event identity, candidate objects and object kinds.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::traits::EventRecord;

/// Run and event number of one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct EventId {
    /// Run number.
    pub run: i64,
    /// Event number within the run.
    pub event: i64,
}

impl EventId {
    /// Construct an identity from run and event numbers.
    pub fn new(run: i64, event: i64) -> Self {
        Self { run, event }
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.run, self.event)
    }
}

/// Kinematics of the combined (tracker + spectrometer) track associated with a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Transverse momentum.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuthal angle.
    pub phi: f64,
}

/// One reconstructed physics object from an input collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Energy.
    pub energy: f64,
    /// Transverse momentum.
    pub pt: f64,
    /// Momentum x component.
    pub px: f64,
    /// Momentum y component.
    pub py: f64,
    /// Momentum z component.
    pub pz: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuthal angle.
    pub phi: f64,
    /// Electric charge in units of e.
    pub charge: i32,
    /// Whether the object was fully (globally) reconstructed.
    #[serde(default)]
    pub is_global: bool,
    /// Associated combined track. `None` models an absent or dangling reference.
    #[serde(default)]
    pub combined_track: Option<Track>,
}

/// A self-contained event record, as read from JSON-lines input.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Event {
    /// Run number.
    pub run: i64,
    /// Event number.
    pub event: i64,
    /// Candidate collections keyed by label (e.g. `"muons"`).
    #[serde(default)]
    pub collections: BTreeMap<String, Vec<Candidate>>,
}

impl Event {
    /// Empty event with the given identity.
    pub fn new(run: i64, event: i64) -> Self {
        Self { run, event, collections: BTreeMap::new() }
    }

    /// Builder-style helper to attach a collection.
    pub fn with_collection(mut self, name: impl Into<String>, items: Vec<Candidate>) -> Self {
        self.collections.insert(name.into(), items);
        self
    }
}

impl EventRecord for Event {
    fn id(&self) -> EventId {
        EventId::new(self.run, self.event)
    }

    fn collection(&self, name: &str) -> Option<&[Candidate]> {
        self.collections.get(name).map(Vec::as_slice)
    }
}

/// Which kind of physics object a job extracts.
///
/// The kind fixes the selector, the column names of the columnar table and the
/// type label used by the delimited-text output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Reconstructed muons (with combined-track columns).
    Muon,
    /// Reconstructed electrons.
    Electron,
}

impl ObjectKind {
    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Muon => "muon",
            ObjectKind::Electron => "electron",
        }
    }

    /// Prefix of per-attribute column names (`mu_pt`, `electron_pt`, ...).
    pub fn column_prefix(self) -> &'static str {
        match self {
            ObjectKind::Muon => "mu",
            ObjectKind::Electron => "electron",
        }
    }

    /// Name of the per-event object count column.
    pub fn count_column(self) -> &'static str {
        match self {
            ObjectKind::Muon => "nmu",
            ObjectKind::Electron => "nelectron",
        }
    }

    /// Whether the columnar table carries combined-track columns.
    pub fn has_track_columns(self) -> bool {
        matches!(self, ObjectKind::Muon)
    }

    /// Label written in the `type<j>` field of the delimited-text output.
    pub fn type_label(self) -> &'static str {
        match self {
            ObjectKind::Muon => "G",
            ObjectKind::Electron => "E",
        }
    }

    /// Stem of the default output file name.
    pub fn default_file_stem(self) -> &'static str {
        match self {
            ObjectKind::Muon => "MuonObjectInfo",
            ObjectKind::Electron => "ElectronObjectInfo",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "muon" | "muons" | "mu" => Ok(ObjectKind::Muon),
            "electron" | "electrons" | "ele" => Ok(ObjectKind::Electron),
            other => Err(Error::Validation(format!(
                "unknown object kind '{other}': expected 'muon' or 'electron'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_track_defaults_to_missing() {
        let json = r#"{"energy":10.0,"pt":5.0,"px":3.0,"py":4.0,"pz":8.66,
                       "eta":1.2,"phi":0.9,"charge":-1}"#;
        let c: Candidate = serde_json::from_str(json).unwrap();
        assert!(!c.is_global);
        assert!(c.combined_track.is_none());
        assert_eq!(c.charge, -1);
    }

    #[test]
    fn test_event_collection_lookup_distinguishes_missing_from_empty() {
        let ev = Event::new(1, 2).with_collection("muons", Vec::new());
        assert_eq!(ev.id(), EventId::new(1, 2));
        assert_eq!(ev.collection("muons").map(<[Candidate]>::len), Some(0));
        assert!(ev.collection("electrons").is_none());
    }

    #[test]
    fn test_object_kind_parse() {
        assert_eq!("Muon".parse::<ObjectKind>().unwrap(), ObjectKind::Muon);
        assert_eq!("electrons".parse::<ObjectKind>().unwrap(), ObjectKind::Electron);
        assert!("tau".parse::<ObjectKind>().is_err());
    }

    #[test]
    fn test_object_kind_serde_is_lowercase() {
        let s = serde_json::to_string(&ObjectKind::Electron).unwrap();
        assert_eq!(s, "\"electron\"");
    }
}
