//! Bootstrap configuration: package roots and transport selection.
//!
//! Roots come from the positional argument when it is non-empty, otherwise
//! from `CAPABILITY_PACKAGE_PATH`. Both are colon-separated lists; empty
//! segments are dropped. Resolution is kept free of process state so it can
//! be tested without touching the environment.

use crate::error::ConfigError;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const PACKAGE_PATH_ENV: &str = "CAPABILITY_PACKAGE_PATH";
pub const DEFAULT_CHECK_INTERFACE: &str = "Minimal";

/// Where the service layer reads requests from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    Tcp(SocketAddr),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub roots: Vec<PathBuf>,
    pub transport: Transport,
    /// Interface whose relationships are logged after the initial load.
    pub check_interface: String,
}

impl ServerConfig {
    /// Resolve configuration against the live environment.
    pub fn from_args(
        package_path: Option<&str>,
        listen: Option<SocketAddr>,
        check_interface: Option<String>,
    ) -> Result<Self, ConfigError> {
        let env_value = env::var(PACKAGE_PATH_ENV).ok();
        Ok(Self {
            roots: resolve_package_roots(package_path, env_value.as_deref())?,
            transport: listen.map(Transport::Tcp).unwrap_or(Transport::Stdio),
            check_interface: check_interface
                .unwrap_or_else(|| DEFAULT_CHECK_INTERFACE.to_string()),
        })
    }
}

/// Pick the argument if it is non-empty, else the environment value.
pub fn resolve_package_roots(
    argument: Option<&str>,
    env_value: Option<&str>,
) -> Result<Vec<PathBuf>, ConfigError> {
    let raw = argument
        .filter(|value| !value.is_empty())
        .or(env_value)
        .unwrap_or_default();
    let roots = split_package_path(raw);
    if roots.is_empty() {
        return Err(ConfigError::NoPackagePaths {
            env: PACKAGE_PATH_ENV,
        });
    }
    Ok(roots)
}

/// Split a colon-separated path list, dropping empty segments.
pub fn split_package_path(value: &str) -> Vec<PathBuf> {
    value
        .split(':')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(PathBuf::from)
        .collect()
}
