//! Endpoint discovery: one endpoint address per socket file in a directory.
//!
//! The scan is non-recursive and keeps filesystem iteration order. Sockets
//! are not regular files, so every non-directory entry counts.

use std::fmt;
use std::path::Path;

use crate::error::{DispatchError, DispatchResult};
use crate::log_debug;

/// Transport prefix used when no other is configured.
pub const DEFAULT_TRANSPORT_PREFIX: &str = "unix:";

/// Address of one local RPC endpoint (`unix:/path/to/socket`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointAddress(String);

impl EndpointAddress {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// List `dir` and wrap each entry path in `transport_prefix`.
pub fn discover(dir: &Path, transport_prefix: &str) -> DispatchResult<Vec<EndpointAddress>> {
    let io_err = |io| DispatchError::Discovery {
        path: dir.to_path_buf(),
        io,
    };

    let mut addresses = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        // Follows symlinks; a dangling link is still offered as an endpoint.
        if path.is_dir() {
            log_debug!("skipping directory {}", path.display());
            continue;
        }
        log_debug!("loading {}", path.display());
        addresses.push(EndpointAddress::new(format!(
            "{transport_prefix}{}",
            path.display()
        )));
    }
    Ok(addresses)
}
