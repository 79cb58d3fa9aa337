//! # pox-core
//!
//! Event model and error types shared by the physics-object extractor crates.
//!
//! The hosting framework is modelled by the [`EventRecord`] trait: one record per
//! event, exposing its [`EventId`] and named collections of [`Candidate`] objects.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::EventRecord;
pub use types::{Candidate, Event, EventId, ObjectKind, Track};
