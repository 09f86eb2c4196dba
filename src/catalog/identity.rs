use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Which of the three spec kinds a record belongs to.
///
/// All kinds share one name space; the kind is what diagnostics report when a
/// name is claimed twice.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum SpecKind {
    Interface,
    Provider,
    SemanticInterface,
}

impl SpecKind {
    /// Processing order during a load; earlier kinds win name collisions.
    pub const LOAD_ORDER: [SpecKind; 3] = [
        SpecKind::Interface,
        SpecKind::Provider,
        SpecKind::SemanticInterface,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpecKind::Interface => "interface",
            SpecKind::Provider => "provider",
            SpecKind::SemanticInterface => "semantic_interface",
        }
    }

    /// Export key used in package manifests for files of this kind.
    pub fn export_key(&self) -> &'static str {
        match self {
            SpecKind::Interface => "capability_interface",
            SpecKind::Provider => "capability_provider",
            SpecKind::SemanticInterface => "semantic_capability_interface",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "interface" => Some(SpecKind::Interface),
            "provider" => Some(SpecKind::Provider),
            "semantic_interface" => Some(SpecKind::SemanticInterface),
            _ => None,
        }
    }
}

impl fmt::Display for SpecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SpecKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SpecKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        SpecKind::parse(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown spec_type '{value}'")))
    }
}
