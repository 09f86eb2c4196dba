//! Name-keyed index of discovered capability specs.
//!
//! The index owns three maps (interfaces, providers, semantic interfaces) that
//! share one name space. Every load builds a fresh `CapabilitySnapshot` off to
//! the side and publishes it with a single `Arc` swap, so readers see either
//! the previous generation or the new one, never a mix.

use crate::catalog::identity::SpecKind;
use crate::catalog::model::{CapabilitySpec, Interface, Provider, SemanticInterface};
use crate::discovery::{DiscoveredSpecs, Discovery, PackageDiscovery};
use crate::error::{NameCollision, RegistryError};
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{info, warn};

/// Observable lifecycle of an index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexState {
    Empty,
    Loaded,
}

/// One immutable generation of the three maps.
#[derive(Debug, Default)]
pub struct CapabilitySnapshot {
    generation: u64,
    interfaces: BTreeMap<String, Interface>,
    providers: BTreeMap<String, Provider>,
    semantic_interfaces: BTreeMap<String, SemanticInterface>,
}

/// Summary of a single load.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub generation: u64,
    pub interfaces: usize,
    pub providers: usize,
    pub semantic_interfaces: usize,
    pub collisions: Vec<NameCollision>,
    pub discovery_errors: usize,
}

/// Capability index backed by a pluggable discovery step.
pub struct CapabilityIndex {
    discovery: Box<dyn Discovery>,
    // Held for the whole reload, so it also serializes concurrent reloads.
    roots: Mutex<Vec<PathBuf>>,
    current: RwLock<Arc<CapabilitySnapshot>>,
}

impl CapabilityIndex {
    /// Build an index over `roots` using filesystem package discovery.
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self::with_discovery(roots, PackageDiscovery::new())
    }

    /// Build an index with a custom discovery collaborator and run the
    /// initial load.
    ///
    /// Load problems are logged rather than returned; the index is always
    /// usable afterwards, possibly empty.
    pub fn with_discovery(roots: Vec<PathBuf>, discovery: impl Discovery + 'static) -> Self {
        let index = Self {
            discovery: Box::new(discovery),
            roots: Mutex::new(roots),
            current: RwLock::new(Arc::new(CapabilitySnapshot::default())),
        };
        index.reload(None);
        index
    }

    /// Re-run discovery and atomically replace the index contents.
    ///
    /// `Some(roots)` replaces the stored roots (an empty list included);
    /// `None` reuses whatever was stored last.
    pub fn reload(&self, roots_override: Option<Vec<PathBuf>>) -> LoadReport {
        let mut roots = self.roots.lock().unwrap_or_else(|err| err.into_inner());
        if let Some(new_roots) = roots_override {
            *roots = new_roots;
        }

        let discovered = self.discovery.discover(&roots);
        let generation = self.snapshot().generation + 1;
        let (snapshot, report) = CapabilitySnapshot::build(generation, discovered);

        *self.current.write().unwrap_or_else(|err| err.into_inner()) = Arc::new(snapshot);
        drop(roots);

        info!(
            generation = report.generation,
            interfaces = report.interfaces,
            providers = report.providers,
            semantic_interfaces = report.semantic_interfaces,
            collisions = report.collisions.len(),
            discovery_errors = report.discovery_errors,
            "capabilities loaded"
        );
        report
    }

    /// The currently published snapshot.
    ///
    /// Hold on to the returned `Arc` to run several queries against one
    /// consistent generation.
    pub fn snapshot(&self) -> Arc<CapabilitySnapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(|err| err.into_inner()))
    }

    /// Roots the next argument-less reload will use.
    pub fn roots(&self) -> Vec<PathBuf> {
        self.roots
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .clone()
    }

    pub fn state(&self) -> IndexState {
        self.snapshot().state()
    }

    pub fn interfaces(&self) -> Vec<Interface> {
        self.snapshot().interfaces().cloned().collect()
    }

    /// Providers whose `implements` matches `interface` exactly.
    pub fn providers(&self, interface: &str) -> Vec<Provider> {
        self.snapshot().providers_of(interface).cloned().collect()
    }

    /// Semantic interfaces whose `redefines` matches `interface` exactly.
    pub fn semantic_interfaces(&self, interface: &str) -> Vec<SemanticInterface> {
        self.snapshot()
            .semantic_interfaces_of(interface)
            .cloned()
            .collect()
    }

    /// Human-readable dump of every map; not a stable format.
    pub fn describe_all(&self) -> String {
        self.snapshot().to_string()
    }

    /// Cross-reference checks (dangling `implements`, typos) over the tree.
    pub fn verify_tree(&self) -> Result<(), RegistryError> {
        Err(RegistryError::NotImplemented {
            operation: "verify_tree",
        })
    }

    /// Render the capability graph, optionally annotated with errors.
    pub fn view_as_graph(&self, _with_errors: bool) -> Result<String, RegistryError> {
        Err(RegistryError::NotImplemented {
            operation: "view_as_graph",
        })
    }

    /// Advertise the query API to an external service registry.
    pub fn advertise_queries(&self) -> Result<(), RegistryError> {
        Err(RegistryError::NotImplemented {
            operation: "advertise_queries",
        })
    }
}

impl fmt::Debug for CapabilityIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityIndex")
            .field("roots", &self.roots())
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl CapabilitySnapshot {
    /// Assemble a snapshot from discovery output.
    ///
    /// Kinds are processed interfaces first, then providers, then semantic
    /// interfaces; a name already present in any map is rejected, so the
    /// earliest record of a name wins.
    pub fn build(generation: u64, discovered: DiscoveredSpecs) -> (Self, LoadReport) {
        let DiscoveredSpecs {
            interfaces,
            providers,
            semantic_interfaces,
            errors,
        } = discovered;

        let mut snapshot = Self {
            generation,
            ..Self::default()
        };
        let mut collisions = Vec::new();

        for interface in interfaces {
            if let Err(collision) = snapshot.check_name(interface.name(), Interface::KIND) {
                collisions.push(collision);
                continue;
            }
            snapshot.interfaces.insert(interface.name.clone(), interface);
        }
        for provider in providers {
            if let Err(collision) = snapshot.check_name(provider.name(), Provider::KIND) {
                collisions.push(collision);
                continue;
            }
            snapshot.providers.insert(provider.name.clone(), provider);
        }
        for semantic in semantic_interfaces {
            if let Err(collision) = snapshot.check_name(semantic.name(), SemanticInterface::KIND) {
                collisions.push(collision);
                continue;
            }
            snapshot
                .semantic_interfaces
                .insert(semantic.name.clone(), semantic);
        }

        let report = LoadReport {
            generation,
            interfaces: snapshot.interfaces.len(),
            providers: snapshot.providers.len(),
            semantic_interfaces: snapshot.semantic_interfaces.len(),
            collisions,
            discovery_errors: errors.len(),
        };
        (snapshot, report)
    }

    /// Accept `name` for a record of `kind` unless any map already holds it.
    pub fn check_name(&self, name: &str, kind: SpecKind) -> Result<(), NameCollision> {
        let existing = if self.interfaces.contains_key(name) {
            SpecKind::Interface
        } else if self.providers.contains_key(name) {
            SpecKind::Provider
        } else if self.semantic_interfaces.contains_key(name) {
            SpecKind::SemanticInterface
        } else {
            return Ok(());
        };

        let collision = NameCollision {
            name: name.to_string(),
            kind,
            existing,
        };
        warn!("{collision}");
        Err(collision)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> IndexState {
        if self.generation == 0 {
            IndexState::Empty
        } else {
            IndexState::Loaded
        }
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.values()
    }

    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.get(name)
    }

    pub fn provider(&self, name: &str) -> Option<&Provider> {
        self.providers.get(name)
    }

    pub fn semantic_interface(&self, name: &str) -> Option<&SemanticInterface> {
        self.semantic_interfaces.get(name)
    }

    pub fn providers_of<'a>(&'a self, interface: &'a str) -> impl Iterator<Item = &'a Provider> {
        self.providers
            .values()
            .filter(move |provider| provider.implements == interface)
    }

    pub fn semantic_interfaces_of<'a>(
        &'a self,
        interface: &'a str,
    ) -> impl Iterator<Item = &'a SemanticInterface> {
        self.semantic_interfaces
            .values()
            .filter(move |semantic| semantic.redefines == interface)
    }

    /// Which map, if any, holds `name`.
    pub fn kind_of(&self, name: &str) -> Option<SpecKind> {
        if self.interfaces.contains_key(name) {
            Some(SpecKind::Interface)
        } else if self.providers.contains_key(name) {
            Some(SpecKind::Provider)
        } else if self.semantic_interfaces.contains_key(name) {
            Some(SpecKind::SemanticInterface)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.interfaces.len() + self.providers.len() + self.semantic_interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for CapabilitySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "capability index (generation {})", self.generation)?;
        writeln!(f, "interfaces: {}", join_names(self.interfaces.keys()))?;

        let mut providers = String::new();
        for provider in self.providers.values() {
            if !providers.is_empty() {
                providers.push_str(", ");
            }
            let _ = write!(providers, "{} -> {}", provider.name, provider.implements);
        }
        writeln!(f, "providers: {}", or_none(&providers))?;

        let mut semantic = String::new();
        for entry in self.semantic_interfaces.values() {
            if !semantic.is_empty() {
                semantic.push_str(", ");
            }
            let _ = write!(semantic, "{} redefines {}", entry.name, entry.redefines);
        }
        write!(f, "semantic_interfaces: {}", or_none(&semantic))
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a String>) -> String {
    let joined = names.map(String::as_str).collect::<Vec<_>>().join(", ");
    or_none(&joined).to_string()
}

fn or_none(value: &str) -> &str {
    if value.is_empty() { "none" } else { value }
}
