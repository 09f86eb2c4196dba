//! JSON Schema validators for spec files and package manifests.
//!
//! The schemas ship with the crate under `schema/` and are embedded at build
//! time, so discovery never depends on the working directory.

use crate::catalog::SpecKind;
use anyhow::{Context, Result, anyhow};
use jsonschema::JSONSchema;
use serde_json::Value;

const INTERFACE_SCHEMA: &str = include_str!("../schema/interface.schema.json");
const PROVIDER_SCHEMA: &str = include_str!("../schema/provider.schema.json");
const SEMANTIC_INTERFACE_SCHEMA: &str = include_str!("../schema/semantic_interface.schema.json");
const PACKAGE_SCHEMA: &str = include_str!("../schema/package.schema.json");

/// Compiled validators, one per spec kind plus the package manifest.
pub struct SpecSchemas {
    interface: JSONSchema,
    provider: JSONSchema,
    semantic_interface: JSONSchema,
    package: JSONSchema,
}

impl SpecSchemas {
    pub fn embedded() -> Result<Self> {
        Ok(Self {
            interface: compile("interface", INTERFACE_SCHEMA)?,
            provider: compile("provider", PROVIDER_SCHEMA)?,
            semantic_interface: compile("semantic_interface", SEMANTIC_INTERFACE_SCHEMA)?,
            package: compile("package", PACKAGE_SCHEMA)?,
        })
    }

    /// Validate a spec document; `Err` carries every violation, one per line.
    pub fn validate_spec(&self, kind: SpecKind, value: &Value) -> Result<(), String> {
        let schema = match kind {
            SpecKind::Interface => &self.interface,
            SpecKind::Provider => &self.provider,
            SpecKind::SemanticInterface => &self.semantic_interface,
        };
        validate(schema, value)
    }

    pub fn validate_manifest(&self, value: &Value) -> Result<(), String> {
        validate(&self.package, value)
    }
}

fn compile(label: &str, raw: &str) -> Result<JSONSchema> {
    let schema: Value =
        serde_json::from_str(raw).with_context(|| format!("parsing {label} schema"))?;
    JSONSchema::compile(&schema).map_err(|err| anyhow!("compiling {label} schema: {err}"))
}

fn validate(schema: &JSONSchema, value: &Value) -> Result<(), String> {
    if let Err(errors) = schema.validate(value) {
        let details = errors
            .map(|err| err.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        return Err(details);
    }
    Ok(())
}
