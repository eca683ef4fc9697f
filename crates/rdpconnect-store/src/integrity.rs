// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Read-back verification for assets materialised from a settings bundle.

use std::path::Path;

use rdpconnect_core::error::{LauncherError, Result};
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `data`.
pub fn fingerprint(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Re-read `path` and check it holds exactly `expected`.
pub fn verify_written(path: &Path, expected: &[u8]) -> Result<()> {
    let written = std::fs::read(path)?;
    let expected = fingerprint(expected);
    let actual = fingerprint(&written);
    if actual == expected {
        Ok(())
    } else {
        Err(LauncherError::IntegrityMismatch { expected, actual })
    }
}
