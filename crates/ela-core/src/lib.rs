#![deny(missing_docs)]
#![doc = "Core types for the ELA feature engine: errors, bounds, objectives, samples and deterministic RNG handles."]

pub mod bounds;
pub mod errors;
pub mod objective;
pub mod provenance;
pub mod rng;
pub mod sample;

pub use bounds::{Bounds, ScalarOrVec};
pub use errors::{ElaError, ErrorInfo};
pub use objective::{CountingObjective, Objective, Problem};
pub use provenance::{RunProvenance, SchemaVersion};
pub use rng::{derive_substream_seed, repetition_seed, RngHandle};
pub use sample::Sample;
