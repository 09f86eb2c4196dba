//! Package crawl and manifest parsing.
//!
//! A package is any directory holding a `package.json` manifest. The crawl
//! walks each root in order, does not descend below a package, and keeps the
//! first package of a given name so earlier roots shadow later ones.
//! Symlinked directories are followed, each real directory at most once.

use crate::catalog::SpecKind;
use crate::discovery::DiscoveryError;
use crate::schema_loader::SpecSchemas;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

pub const PACKAGE_MANIFEST: &str = "package.json";

#[derive(Clone, Debug, Deserialize)]
/// Contents of `package.json`.
pub struct PackageManifest {
    pub name: String,
    #[serde(default)]
    pub exports: PackageExports,
}

#[derive(Clone, Debug, Default, Deserialize)]
/// Spec files exported by a package, relative to the package directory.
pub struct PackageExports {
    #[serde(default)]
    pub capability_interface: Vec<PathBuf>,
    #[serde(default)]
    pub capability_provider: Vec<PathBuf>,
    #[serde(default)]
    pub semantic_capability_interface: Vec<PathBuf>,
}

impl PackageExports {
    pub fn files(&self, kind: SpecKind) -> &[PathBuf] {
        match kind {
            SpecKind::Interface => &self.capability_interface,
            SpecKind::Provider => &self.capability_provider,
            SpecKind::SemanticInterface => &self.semantic_capability_interface,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Package {
    pub path: PathBuf,
    pub manifest: PackageManifest,
}

impl Package {
    /// Absolute paths of the spec files this package exports for `kind`.
    pub fn spec_files(&self, kind: SpecKind) -> Vec<PathBuf> {
        self.manifest
            .exports
            .files(kind)
            .iter()
            .map(|relative| self.path.join(relative))
            .collect()
    }
}

/// Find every package under `roots`, in root order.
pub fn find_packages(
    roots: &[PathBuf],
    schemas: &SpecSchemas,
    errors: &mut Vec<DiscoveryError>,
) -> Vec<Package> {
    let mut packages: Vec<Package> = Vec::new();
    let mut by_name: BTreeMap<String, PathBuf> = BTreeMap::new();

    for root in roots {
        if !root.is_dir() {
            errors.push(DiscoveryError::MissingRoot { path: root.clone() });
            continue;
        }
        let mut found = Vec::new();
        let mut visited = BTreeSet::new();
        crawl(root, schemas, &mut visited, &mut found, errors);
        for package in found {
            if let Some(kept) = by_name.get(&package.manifest.name) {
                errors.push(DiscoveryError::DuplicatePackage {
                    name: package.manifest.name.clone(),
                    path: package.path.clone(),
                    kept: kept.clone(),
                });
                continue;
            }
            by_name.insert(package.manifest.name.clone(), package.path.clone());
            packages.push(package);
        }
    }
    packages
}

fn crawl(
    dir: &Path,
    schemas: &SpecSchemas,
    visited: &mut BTreeSet<PathBuf>,
    acc: &mut Vec<Package>,
    errors: &mut Vec<DiscoveryError>,
) {
    // Symlinked directories are followed; the canonical path keeps the walk acyclic.
    match fs::canonicalize(dir) {
        Ok(canonical) => {
            if !visited.insert(canonical) {
                return;
            }
        }
        Err(err) => {
            errors.push(DiscoveryError::io(dir, err));
            return;
        }
    }

    let manifest_path = dir.join(PACKAGE_MANIFEST);
    if manifest_path.is_file() {
        match load_manifest(&manifest_path, schemas) {
            Ok(manifest) => acc.push(Package {
                path: dir.to_path_buf(),
                manifest,
            }),
            Err(err) => errors.push(err),
        }
        return;
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            errors.push(DiscoveryError::io(dir, err));
            return;
        }
    };
    let mut subdirs = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                errors.push(DiscoveryError::io(dir, err));
                continue;
            }
        };
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if path.is_dir() && !hidden {
            subdirs.push(path);
        }
    }
    subdirs.sort();
    for subdir in subdirs {
        crawl(&subdir, schemas, visited, acc, errors);
    }
}

fn load_manifest(path: &Path, schemas: &SpecSchemas) -> Result<PackageManifest, DiscoveryError> {
    let data = fs::read_to_string(path).map_err(|err| DiscoveryError::io(path, err))?;
    let value: Value = serde_json::from_str(&data).map_err(|source| DiscoveryError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    schemas
        .validate_manifest(&value)
        .map_err(|details| DiscoveryError::Schema {
            path: path.to_path_buf(),
            details,
        })?;
    serde_json::from_value(value).map_err(|source| DiscoveryError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manifest(dir: &Path, name: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(
            dir.join(PACKAGE_MANIFEST),
            format!("{{\"name\": \"{name}\"}}"),
        )
        .unwrap();
    }

    #[test]
    fn crawl_stops_at_package_boundary_and_skips_hidden_dirs() {
        let temp = TempDir::new().expect("temp dir");
        let root = temp.path();
        manifest(&root.join("a/outer"), "outer");
        manifest(&root.join("a/outer/inner"), "inner");
        manifest(&root.join("b/deep/nested"), "nested");
        manifest(&root.join(".cache/hidden"), "hidden");

        let schemas = SpecSchemas::embedded().unwrap();
        let mut errors = Vec::new();
        let packages = find_packages(&[root.to_path_buf()], &schemas, &mut errors);
        let names: Vec<_> = packages.iter().map(|p| p.manifest.name.as_str()).collect();

        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(names, vec!["outer", "nested"]);
    }

    #[test]
    fn earlier_root_shadows_duplicate_package_names() {
        let first = TempDir::new().expect("temp dir");
        let second = TempDir::new().expect("temp dir");
        manifest(&first.path().join("pkg"), "shared");
        manifest(&second.path().join("pkg"), "shared");

        let schemas = SpecSchemas::embedded().unwrap();
        let mut errors = Vec::new();
        let packages = find_packages(
            &[first.path().to_path_buf(), second.path().to_path_buf()],
            &schemas,
            &mut errors,
        );

        assert_eq!(packages.len(), 1);
        assert!(packages[0].path.starts_with(first.path()));
        assert!(matches!(
            errors.as_slice(),
            [DiscoveryError::DuplicatePackage { name, .. }] if name == "shared"
        ));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_packages_are_followed_without_looping() {
        use std::os::unix::fs::symlink;

        let temp = TempDir::new().expect("temp dir");
        let workspace = temp.path().join("ws");
        let real = temp.path().join("real");
        manifest(&real.join("pkg"), "linked");
        fs::create_dir_all(&workspace).unwrap();
        symlink(real.join("pkg"), workspace.join("pkg")).unwrap();
        // A link back to the workspace would recurse forever without cycle detection.
        symlink(&workspace, workspace.join("loop")).unwrap();

        let schemas = SpecSchemas::embedded().unwrap();
        let mut errors = Vec::new();
        let packages = find_packages(&[workspace.clone()], &schemas, &mut errors);

        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].manifest.name, "linked");
        assert_eq!(packages[0].path, workspace.join("pkg"));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlinks_are_ignored() {
        use std::os::unix::fs::symlink;

        let temp = TempDir::new().expect("temp dir");
        manifest(&temp.path().join("pkg"), "present");
        symlink(temp.path().join("gone"), temp.path().join("broken")).unwrap();

        let schemas = SpecSchemas::embedded().unwrap();
        let mut errors = Vec::new();
        let packages = find_packages(&[temp.path().to_path_buf()], &schemas, &mut errors);

        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(packages.len(), 1);
    }

    #[test]
    fn invalid_manifest_is_reported() {
        let temp = TempDir::new().expect("temp dir");
        let pkg = temp.path().join("pkg");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join(PACKAGE_MANIFEST), "{\"exports\": {}}").unwrap();

        let schemas = SpecSchemas::embedded().unwrap();
        let mut errors = Vec::new();
        let packages = find_packages(&[temp.path().to_path_buf()], &schemas, &mut errors);

        assert!(packages.is_empty());
        assert!(matches!(
            errors.as_slice(),
            [DiscoveryError::Schema { .. }]
        ));
    }

    #[test]
    fn export_keys_match_manifest_fields() {
        let mut exports = serde_json::Map::new();
        for kind in SpecKind::LOAD_ORDER {
            exports.insert(
                kind.export_key().to_string(),
                serde_json::json!([format!("{}.json", kind.as_str())]),
            );
        }
        let manifest: PackageManifest =
            serde_json::from_value(serde_json::json!({"name": "keys", "exports": exports}))
                .unwrap();

        for kind in SpecKind::LOAD_ORDER {
            assert_eq!(
                manifest.exports.files(kind),
                [PathBuf::from(format!("{}.json", kind.as_str()))],
                "{kind}"
            );
        }
    }

    #[test]
    fn spec_files_resolve_relative_to_package() {
        let package = Package {
            path: PathBuf::from("/pkgs/demo"),
            manifest: serde_json::from_str(
                r#"{"name": "demo", "exports": {"capability_provider": ["providers/p.json"]}}"#,
            )
            .unwrap(),
        };
        assert_eq!(
            package.spec_files(SpecKind::Provider),
            vec![PathBuf::from("/pkgs/demo/providers/p.json")]
        );
        assert!(package.spec_files(SpecKind::Interface).is_empty());
    }
}
