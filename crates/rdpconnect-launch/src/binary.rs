// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Location of the FreeRDP client executable.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Environment variable naming the client executable.
pub const CLIENT_ENV: &str = "RDPCONNECT_CLIENT";

/// Client looked up on `PATH` when nothing else applies.
pub const DEFAULT_CLIENT: &str = "xfreerdp";

/// Bundled client locations relative to the install root, in lookup order.
const BUNDLED_CANDIDATES: [&str; 2] = [
    "Resources/freerdp/macos/xfreerdp",
    "src/freerdp/macos/xfreerdp",
];

/// The client executable the launcher will run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientBinary {
    path: PathBuf,
}

impl ClientBinary {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Pick the client: an explicit path wins, then `RDPCONNECT_CLIENT`, then
    /// (macOS only) the copy bundled under `root`, then `xfreerdp` on `PATH`.
    pub fn resolve(explicit: Option<PathBuf>, root: &Path) -> Self {
        Self::choose(explicit, std::env::var_os(CLIENT_ENV), root)
    }

    fn choose(explicit: Option<PathBuf>, env: Option<OsString>, root: &Path) -> Self {
        let chosen = explicit
            .or_else(|| env.filter(|v| !v.is_empty()).map(PathBuf::from))
            .or_else(|| {
                if cfg!(target_os = "macos") {
                    Self::bundled(root)
                } else {
                    None
                }
            })
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CLIENT));
        debug!(client = %chosen.display(), "client binary resolved");
        Self::new(chosen)
    }

    /// The client shipped inside the application bundle, if present.
    pub fn bundled(root: &Path) -> Option<PathBuf> {
        BUNDLED_CANDIDATES
            .iter()
            .map(|rel| root.join(rel))
            .find(|p| p.is_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for ClientBinary {
    fn default() -> Self {
        Self::new(DEFAULT_CLIENT)
    }
}
