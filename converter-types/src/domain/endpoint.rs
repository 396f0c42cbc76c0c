//! IPC endpoint addresses.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::DomainError;

/// Where the service listens when no endpoint is configured.
pub const DEFAULT_ENDPOINT: &str = "ipc:///tmp/currency_converter";

/// Local socket address written as `ipc://<path>` (a bare path is accepted too).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpcEndpoint(PathBuf);

impl IpcEndpoint {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Default for IpcEndpoint {
    fn default() -> Self {
        Self(PathBuf::from("/tmp/currency_converter"))
    }
}

impl FromStr for IpcEndpoint {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let path = match s.split_once("://") {
            Some(("ipc", path)) => path,
            Some(_) => return Err(DomainError::InvalidEndpoint(s.to_string())),
            None => s,
        };
        if path.is_empty() {
            return Err(DomainError::InvalidEndpoint(s.to_string()));
        }
        Ok(Self(PathBuf::from(path)))
    }
}

impl fmt::Display for IpcEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ipc://{}", self.0.display())
    }
}
