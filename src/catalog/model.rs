//! Deserializable representation of capability spec files.
//!
//! Each spec kind gets its own struct so the index can keep providers and
//! semantic interfaces apart while still sharing one name space. Cross
//! references (`implements`, `redefines`) are stored as plain interface names.

use crate::catalog::identity::SpecKind;
use serde::{Deserialize, Serialize};

/// Shared surface of the three spec kinds.
pub trait CapabilitySpec {
    const KIND: SpecKind;

    fn name(&self) -> &str;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// Named capability contract.
pub struct Interface {
    pub name: String,
    #[serde(default = "default_spec_version")]
    pub spec_version: u32,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// Something that claims to implement an interface.
pub struct Provider {
    pub name: String,
    pub implements: String,
    #[serde(default = "default_spec_version")]
    pub spec_version: u32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub launch_file: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// Re-specification of an existing interface.
pub struct SemanticInterface {
    pub name: String,
    pub redefines: String,
    #[serde(default = "default_spec_version")]
    pub spec_version: u32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub global_namespace: Option<String>,
}

fn default_spec_version() -> u32 {
    1
}

impl Interface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spec_version: default_spec_version(),
            description: None,
        }
    }
}

impl Provider {
    pub fn new(name: impl Into<String>, implements: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            implements: implements.into(),
            spec_version: default_spec_version(),
            description: None,
            launch_file: None,
            depends_on: Vec::new(),
        }
    }
}

impl SemanticInterface {
    pub fn new(name: impl Into<String>, redefines: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            redefines: redefines.into(),
            spec_version: default_spec_version(),
            description: None,
            global_namespace: None,
        }
    }
}

impl CapabilitySpec for Interface {
    const KIND: SpecKind = SpecKind::Interface;

    fn name(&self) -> &str {
        &self.name
    }
}

impl CapabilitySpec for Provider {
    const KIND: SpecKind = SpecKind::Provider;

    fn name(&self) -> &str {
        &self.name
    }
}

impl CapabilitySpec for SemanticInterface {
    const KIND: SpecKind = SpecKind::SemanticInterface;

    fn name(&self) -> &str {
        &self.name
    }
}
