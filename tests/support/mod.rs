use anyhow::{Context, Result};
use capabilities::SpecKind;
use serde_json::{Map, Value, json};
use std::fs;
use std::path::{Path, PathBuf};

pub fn server_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_capability-server"))
}

/// Writes a package directory with a manifest and JSON spec files.
pub struct PackageFixture {
    dir: PathBuf,
    name: String,
    exports: Vec<(SpecKind, String)>,
}

impl PackageFixture {
    pub fn new(root: &Path, name: &str) -> Self {
        Self {
            dir: root.join(name),
            name: name.to_string(),
            exports: Vec::new(),
        }
    }

    pub fn interface(self, name: &str) -> Result<Self> {
        self.spec(
            SpecKind::Interface,
            name,
            json!({"spec_type": "interface", "spec_version": 1, "name": name}),
        )
    }

    pub fn provider(self, name: &str, implements: &str) -> Result<Self> {
        self.spec(
            SpecKind::Provider,
            name,
            json!({
                "spec_type": "provider",
                "spec_version": 1,
                "name": name,
                "implements": implements
            }),
        )
    }

    pub fn semantic_interface(self, name: &str, redefines: &str) -> Result<Self> {
        self.spec(
            SpecKind::SemanticInterface,
            name,
            json!({
                "spec_type": "semantic_interface",
                "spec_version": 1,
                "name": name,
                "redefines": redefines
            }),
        )
    }

    fn spec(mut self, kind: SpecKind, name: &str, value: Value) -> Result<Self> {
        // Files are keyed by position so two specs may share a name.
        let relative = format!("{}/{:02}_{name}.json", kind.as_str(), self.exports.len());
        let path = self.dir.join(&relative);
        fs::create_dir_all(path.parent().context("spec path has parent")?)?;
        fs::write(&path, serde_json::to_string_pretty(&value)?)
            .with_context(|| format!("writing {}", path.display()))?;
        self.exports.push((kind, relative));
        self.write_manifest()?;
        Ok(self)
    }

    pub fn write_manifest(&self) -> Result<()> {
        let mut exports = Map::new();
        for kind in SpecKind::LOAD_ORDER {
            let files: Vec<&str> = self
                .exports
                .iter()
                .filter(|(k, _)| *k == kind)
                .map(|(_, path)| path.as_str())
                .collect();
            exports.insert(kind.export_key().to_string(), json!(files));
        }
        let manifest = json!({"name": self.name, "exports": exports});
        fs::create_dir_all(&self.dir)?;
        fs::write(
            self.dir.join("package.json"),
            serde_json::to_string_pretty(&manifest)?,
        )?;
        Ok(())
    }
}

pub fn parse_response_lines(stdout: &[u8]) -> Result<Vec<Value>> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).with_context(|| format!("parsing {line}")))
        .collect()
}
