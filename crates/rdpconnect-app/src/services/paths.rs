// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Install-relative directory resolution.

use std::path::{Path, PathBuf};

/// Where the launcher is installed and where it keeps its settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherPaths {
    /// Parent of the directory holding the executable.
    pub root: PathBuf,
    pub config_dir: PathBuf,
}

impl LauncherPaths {
    /// Resolve from the running executable.  `config_dir` (the
    /// `--config-dir` flag or `RDPCONNECT_CONFIG_DIR`) wins over the
    /// install-relative `<root>/config`.
    pub fn resolve(config_dir: Option<PathBuf>) -> std::io::Result<Self> {
        let exe = std::env::current_exe()?;
        Ok(Self::from_exe(&exe, config_dir))
    }

    fn from_exe(exe: &Path, config_dir: Option<PathBuf>) -> Self {
        let root = exe
            .parent()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let config_dir = config_dir.unwrap_or_else(|| root.join("config"));
        Self { root, config_dir }
    }
}
