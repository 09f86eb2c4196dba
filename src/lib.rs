//! Shared library for the capability server.
//!
//! The crate discovers capability specs (interfaces, providers, semantic
//! interfaces) exported by packages under a set of roots, indexes them under
//! one name space, and answers relationship queries. `CapabilityIndex` is the
//! core; `CapabilityServer` exposes it over a line-delimited JSON protocol and
//! the `capability-server` binary wires the two together.

pub mod catalog;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod schema_loader;
pub mod server;

pub use catalog::{
    CapabilityIndex, CapabilitySnapshot, CapabilitySpec, IndexState, Interface, LoadReport,
    Provider, SemanticInterface, SpecKind,
};
pub use config::{PACKAGE_PATH_ENV, ServerConfig, Transport, resolve_package_roots};
pub use discovery::{DiscoveredSpecs, Discovery, DiscoveryError, PackageDiscovery};
pub use error::{ConfigError, NameCollision, RegistryError};
pub use server::{CapabilityServer, Request, Response, ResponseBody};
