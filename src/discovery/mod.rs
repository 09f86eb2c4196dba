//! Discovery of capability specs under a set of package roots.
//!
//! The index only depends on the `Discovery` trait; `PackageDiscovery` is the
//! filesystem implementation. Problems are collected per file and never abort
//! a scan, so the index always receives whatever valid records exist.

pub mod package;
pub mod spec_file;

pub use package::{Package, PackageExports, PackageManifest, PACKAGE_MANIFEST, find_packages};
pub use spec_file::load_spec;

use crate::catalog::{Interface, Provider, SemanticInterface, SpecKind};
use crate::schema_loader::SpecSchemas;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Parsed records produced by one discovery pass, in discovery order.
#[derive(Debug, Default)]
pub struct DiscoveredSpecs {
    pub interfaces: Vec<Interface>,
    pub providers: Vec<Provider>,
    pub semantic_interfaces: Vec<SemanticInterface>,
    pub errors: Vec<DiscoveryError>,
}

/// Source of spec records for a list of roots.
pub trait Discovery: Send + Sync {
    fn discover(&self, roots: &[PathBuf]) -> DiscoveredSpecs;
}

impl<F> Discovery for F
where
    F: Fn(&[PathBuf]) -> DiscoveredSpecs + Send + Sync,
{
    fn discover(&self, roots: &[PathBuf]) -> DiscoveredSpecs {
        self(roots)
    }
}

/// Per-file or per-root problem found during discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("package path {} does not exist or is not a directory", .path.display())]
    MissingRoot { path: PathBuf },
    #[error("reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parsing {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{} failed schema validation: {details}", .path.display())]
    Schema { path: PathBuf, details: String },
    #[error("{} declares spec_type '{found}' but is exported as {expected}", .path.display())]
    SpecType {
        path: PathBuf,
        expected: SpecKind,
        found: String,
    },
    #[error("package {name} at {} is shadowed by {}", .path.display(), .kept.display())]
    DuplicatePackage {
        name: String,
        path: PathBuf,
        kept: PathBuf,
    },
    #[error("spec schemas unavailable: {details}")]
    SchemasUnavailable { details: String },
}

impl DiscoveryError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        DiscoveryError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Filesystem discovery: package manifests exporting JSON spec files.
pub struct PackageDiscovery {
    schemas: Result<SpecSchemas, String>,
}

impl PackageDiscovery {
    pub fn new() -> Self {
        Self {
            schemas: SpecSchemas::embedded().map_err(|err| format!("{err:#}")),
        }
    }
}

impl Default for PackageDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

impl Discovery for PackageDiscovery {
    fn discover(&self, roots: &[PathBuf]) -> DiscoveredSpecs {
        let mut found = DiscoveredSpecs::default();
        match &self.schemas {
            Ok(schemas) => collect_specs(roots, schemas, &mut found),
            Err(details) => found.errors.push(DiscoveryError::SchemasUnavailable {
                details: details.clone(),
            }),
        }
        for err in &found.errors {
            warn!("{err}");
        }
        found
    }
}

fn collect_specs(roots: &[PathBuf], schemas: &SpecSchemas, found: &mut DiscoveredSpecs) {
    let packages = find_packages(roots, schemas, &mut found.errors);
    for package in &packages {
        debug!(package = %package.manifest.name, path = %package.path.display(), "found package");
        for kind in SpecKind::LOAD_ORDER {
            for file in package.spec_files(kind) {
                let loaded = match kind {
                    SpecKind::Interface => {
                        load_spec(&file, schemas).map(|spec| found.interfaces.push(spec))
                    }
                    SpecKind::Provider => {
                        load_spec(&file, schemas).map(|spec| found.providers.push(spec))
                    }
                    SpecKind::SemanticInterface => {
                        load_spec(&file, schemas).map(|spec| found.semantic_interfaces.push(spec))
                    }
                };
                if let Err(err) = loaded {
                    found.errors.push(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write_json(path: &Path, value: serde_json::Value) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
    }

    #[test]
    fn discovers_specs_across_packages() {
        let temp = TempDir::new().expect("temp dir");
        let pkg = temp.path().join("src/minimal_pkg");
        write_json(
            &pkg.join(PACKAGE_MANIFEST),
            json!({
                "name": "minimal_pkg",
                "exports": {
                    "capability_interface": ["interfaces/Minimal.json"],
                    "capability_provider": ["providers/minimal.json"],
                    "semantic_capability_interface": ["interfaces/Specific.json"]
                }
            }),
        );
        write_json(
            &pkg.join("interfaces/Minimal.json"),
            json!({"spec_type": "interface", "spec_version": 1, "name": "Minimal"}),
        );
        write_json(
            &pkg.join("providers/minimal.json"),
            json!({
                "spec_type": "provider",
                "spec_version": 1,
                "name": "minimal_provider",
                "implements": "Minimal"
            }),
        );
        write_json(
            &pkg.join("interfaces/Specific.json"),
            json!({
                "spec_type": "semantic_interface",
                "spec_version": 1,
                "name": "SpecificMinimal",
                "redefines": "Minimal"
            }),
        );

        let found = PackageDiscovery::new().discover(&[temp.path().to_path_buf()]);
        assert!(found.errors.is_empty(), "{:?}", found.errors);
        assert_eq!(found.interfaces, vec![Interface::new("Minimal")]);
        assert_eq!(found.providers[0].implements, "Minimal");
        assert_eq!(found.semantic_interfaces[0].name, "SpecificMinimal");
    }

    #[test]
    fn bad_files_are_reported_without_dropping_good_ones() {
        let temp = TempDir::new().expect("temp dir");
        let pkg = temp.path().join("pkg");
        write_json(
            &pkg.join(PACKAGE_MANIFEST),
            json!({
                "name": "pkg",
                "exports": {
                    "capability_interface": ["good.json", "broken.json", "missing.json"],
                    "capability_provider": ["not_a_provider.json"]
                }
            }),
        );
        write_json(
            &pkg.join("good.json"),
            json!({"spec_type": "interface", "spec_version": 1, "name": "Good"}),
        );
        fs::write(pkg.join("broken.json"), "{ not json").unwrap();
        write_json(
            &pkg.join("not_a_provider.json"),
            json!({"spec_type": "interface", "spec_version": 1, "name": "Other"}),
        );

        let missing_root = temp.path().join("nope");
        let found = PackageDiscovery::new().discover(&[temp.path().to_path_buf(), missing_root]);

        assert_eq!(found.interfaces, vec![Interface::new("Good")]);
        assert!(found.providers.is_empty());
        assert_eq!(found.errors.len(), 4, "{:?}", found.errors);
        assert!(
            found
                .errors
                .iter()
                .any(|err| matches!(err, DiscoveryError::Parse { .. }))
        );
        assert!(
            found
                .errors
                .iter()
                .any(|err| matches!(err, DiscoveryError::Io { .. }))
        );
        assert!(found.errors.iter().any(|err| matches!(
            err,
            DiscoveryError::SpecType {
                expected: SpecKind::Provider,
                ..
            }
        )));
        assert!(
            found
                .errors
                .iter()
                .any(|err| matches!(err, DiscoveryError::MissingRoot { .. }))
        );
    }

    #[test]
    fn closures_act_as_discovery() {
        let discovery = |roots: &[PathBuf]| DiscoveredSpecs {
            interfaces: roots
                .iter()
                .map(|root| Interface::new(root.display().to_string()))
                .collect(),
            ..DiscoveredSpecs::default()
        };
        let found = discovery.discover(&[PathBuf::from("x")]);
        assert_eq!(found.interfaces, vec![Interface::new("x")]);
    }
}
