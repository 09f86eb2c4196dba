//! Error taxonomy shared by the index, the service layer, and bootstrap.

use crate::catalog::SpecKind;
use thiserror::Error;

/// Raised before any index exists when no package root can be resolved.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No package paths specified, set {env} or pass them as an argument")]
    NoPackagePaths { env: &'static str },
}

/// Failures surfaced by `CapabilityIndex` operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Permanent: the operation exists as an extension point only.
    #[error("{operation} is not implemented")]
    NotImplemented { operation: &'static str },
}

/// A discovered record whose name was already taken during the same load.
///
/// Non-fatal: the record is dropped and the load continues.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{}", collision_message(.kind, .name, .existing))]
pub struct NameCollision {
    pub name: String,
    /// Kind of the rejected record.
    pub kind: SpecKind,
    /// Kind of the record that already owns the name.
    pub existing: SpecKind,
}

fn collision_message(kind: &SpecKind, name: &str, existing: &SpecKind) -> String {
    match existing {
        SpecKind::Interface => format!("{kind} {name} already declared"),
        other => format!("{kind} {name} collides with a {other} name"),
    }
}
