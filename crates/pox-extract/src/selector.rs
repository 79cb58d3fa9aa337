//! Per-candidate qualification and attribute extraction.
//!
//! A selector applies the single boolean qualification predicate of its object
//! kind and, for qualifying candidates, extracts an [`ObjectTuple`]. There are
//! no kinematic cuts: the predicate is the only content-based filter.

use pox_core::{Candidate, ObjectKind, Track};

/// Fill value for every field of a non-qualifying candidate, and for the
/// track-derived fields of a candidate whose combined track is missing.
pub const SENTINEL: f32 = -999.0;

/// One extracted attribute of a physics object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Energy.
    Energy,
    /// Transverse momentum.
    Pt,
    /// Momentum x component.
    Px,
    /// Momentum y component.
    Py,
    /// Momentum z component.
    Pz,
    /// Pseudorapidity.
    Eta,
    /// Azimuthal angle.
    Phi,
    /// Electric charge.
    Charge,
    /// Combined-track transverse momentum.
    TrackPt,
    /// Combined-track pseudorapidity.
    TrackEta,
    /// Combined-track azimuthal angle.
    TrackPhi,
}

/// The eight kinematic attributes, in columnar order.
pub const KINEMATIC_ATTRIBUTES: [Attribute; 8] = [
    Attribute::Energy,
    Attribute::Pt,
    Attribute::Px,
    Attribute::Py,
    Attribute::Pz,
    Attribute::Eta,
    Attribute::Phi,
    Attribute::Charge,
];

/// Kinematic attributes followed by the combined-track attributes.
pub const TRACK_ATTRIBUTES: [Attribute; 11] = [
    Attribute::Energy,
    Attribute::Pt,
    Attribute::Px,
    Attribute::Py,
    Attribute::Pz,
    Attribute::Eta,
    Attribute::Phi,
    Attribute::Charge,
    Attribute::TrackPt,
    Attribute::TrackEta,
    Attribute::TrackPhi,
];

impl Attribute {
    /// Column layout of the columnar table for `kind`.
    pub fn columnar_layout(kind: ObjectKind) -> &'static [Attribute] {
        if kind.has_track_columns() { &TRACK_ATTRIBUTES } else { &KINEMATIC_ATTRIBUTES }
    }

    /// Suffix appended to the kind's column prefix (`mu_` + `glbtrk_pt`).
    pub fn column_suffix(self) -> &'static str {
        match self {
            Attribute::Energy => "e",
            Attribute::Pt => "pt",
            Attribute::Px => "px",
            Attribute::Py => "py",
            Attribute::Pz => "pz",
            Attribute::Eta => "eta",
            Attribute::Phi => "phi",
            Attribute::Charge => "ch",
            Attribute::TrackPt => "glbtrk_pt",
            Attribute::TrackEta => "glbtrk_eta",
            Attribute::TrackPhi => "glbtrk_phi",
        }
    }

    /// Full column name for `kind`, e.g. `mu_glbtrk_eta`.
    pub fn column_name(self, kind: ObjectKind) -> String {
        format!("{}_{}", kind.column_prefix(), self.column_suffix())
    }

    /// Whether the value comes from the associated combined track.
    pub fn is_track_derived(self) -> bool {
        matches!(self, Attribute::TrackPt | Attribute::TrackEta | Attribute::TrackPhi)
    }
}

/// Kinematic values of one candidate (or the sentinel fill).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectTuple {
    /// Type label used by the delimited-text output.
    pub label: &'static str,
    /// Energy.
    pub energy: f32,
    /// Transverse momentum.
    pub pt: f32,
    /// Momentum x component.
    pub px: f32,
    /// Momentum y component.
    pub py: f32,
    /// Momentum z component.
    pub pz: f32,
    /// Pseudorapidity.
    pub eta: f32,
    /// Azimuthal angle.
    pub phi: f32,
    /// Charge.
    pub charge: f32,
    /// Combined-track values; `None` reads back as [`SENTINEL`].
    pub track: Option<TrackTuple>,
}

/// Combined-track values of one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackTuple {
    /// Transverse momentum.
    pub pt: f32,
    /// Pseudorapidity.
    pub eta: f32,
    /// Azimuthal angle.
    pub phi: f32,
}

impl From<&Track> for TrackTuple {
    fn from(t: &Track) -> Self {
        Self { pt: t.pt as f32, eta: t.eta as f32, phi: t.phi as f32 }
    }
}

impl ObjectTuple {
    /// The default-fill tuple: every field is [`SENTINEL`].
    pub fn sentinel(label: &'static str) -> Self {
        Self {
            label,
            energy: SENTINEL,
            pt: SENTINEL,
            px: SENTINEL,
            py: SENTINEL,
            pz: SENTINEL,
            eta: SENTINEL,
            phi: SENTINEL,
            charge: SENTINEL,
            track: None,
        }
    }

    /// Kinematic fields of `c`, without the combined track.
    pub fn kinematics(label: &'static str, c: &Candidate) -> Self {
        Self {
            label,
            energy: c.energy as f32,
            pt: c.pt as f32,
            px: c.px as f32,
            py: c.py as f32,
            pz: c.pz as f32,
            eta: c.eta as f32,
            phi: c.phi as f32,
            charge: c.charge as f32,
            track: None,
        }
    }

    /// Value of one attribute.
    pub fn value(&self, attr: Attribute) -> f32 {
        match attr {
            Attribute::Energy => self.energy,
            Attribute::Pt => self.pt,
            Attribute::Px => self.px,
            Attribute::Py => self.py,
            Attribute::Pz => self.pz,
            Attribute::Eta => self.eta,
            Attribute::Phi => self.phi,
            Attribute::Charge => self.charge,
            Attribute::TrackPt => self.track.map_or(SENTINEL, |t| t.pt),
            Attribute::TrackEta => self.track.map_or(SENTINEL, |t| t.eta),
            Attribute::TrackPhi => self.track.map_or(SENTINEL, |t| t.phi),
        }
    }
}

/// Outcome of running a selector over one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection {
    /// The candidate passed the predicate; its extracted values.
    Qualified(ObjectTuple),
    /// The candidate failed the predicate.
    Rejected,
}

/// Qualification predicate plus attribute extraction for one object kind.
pub trait ObjectSelector {
    /// The object kind this selector handles.
    fn kind(&self) -> ObjectKind;

    /// The boolean qualification check.
    fn qualifies(&self, candidate: &Candidate) -> bool;

    /// Extract the attribute tuple of a candidate. Does not consult [`Self::qualifies`].
    fn extract(&self, candidate: &Candidate) -> ObjectTuple;

    /// Tuple recorded in place of a non-qualifying candidate.
    fn sentinel(&self) -> ObjectTuple {
        ObjectTuple::sentinel(self.kind().type_label())
    }

    /// Qualify and extract.
    fn select(&self, candidate: &Candidate) -> Selection {
        if self.qualifies(candidate) {
            Selection::Qualified(self.extract(candidate))
        } else {
            Selection::Rejected
        }
    }
}

/// Global muons qualify; the combined track supplies the `glbtrk_*` fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct MuonSelector;

impl ObjectSelector for MuonSelector {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Muon
    }

    fn qualifies(&self, candidate: &Candidate) -> bool {
        candidate.is_global
    }

    fn extract(&self, candidate: &Candidate) -> ObjectTuple {
        let mut tuple = ObjectTuple::kinematics(ObjectKind::Muon.type_label(), candidate);
        tuple.track = candidate.combined_track.as_ref().map(TrackTuple::from);
        tuple
    }
}

/// Electron identification is not implemented: no electron qualifies, so every
/// electron is recorded as a sentinel tuple.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElectronSelector;

impl ObjectSelector for ElectronSelector {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Electron
    }

    fn qualifies(&self, _candidate: &Candidate) -> bool {
        false
    }

    fn extract(&self, candidate: &Candidate) -> ObjectTuple {
        ObjectTuple::kinematics(ObjectKind::Electron.type_label(), candidate)
    }
}

/// Selector for a configured object kind.
pub fn selector_for(kind: ObjectKind) -> Box<dyn ObjectSelector> {
    match kind {
        ObjectKind::Muon => Box::new(MuonSelector),
        ObjectKind::Electron => Box::new(ElectronSelector),
    }
}
