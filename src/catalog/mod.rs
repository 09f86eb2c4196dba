//! Capability spec types and the name-keyed index built from them.
//!
//! `model` holds the three record kinds, `identity` the kind tag they share,
//! and `index` the `CapabilityIndex` that enforces one name space across all
//! of them.

pub mod identity;
pub mod index;
pub mod model;

pub use identity::SpecKind;
pub use index::{CapabilityIndex, CapabilitySnapshot, IndexState, LoadReport};
pub use model::{CapabilitySpec, Interface, Provider, SemanticInterface};
