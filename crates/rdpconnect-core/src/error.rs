// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for rdpconnect.

use thiserror::Error;

/// Top-level error type for all launcher operations.
#[derive(Debug, Error)]
pub enum LauncherError {
    // -- Settings model --
    #[error("unknown settings category: {0}")]
    UnknownCategory(String),

    #[error("unknown option {option:?} in category {category}")]
    UnknownOption { category: String, option: String },

    #[error("invalid value for {category}.{option}: {reason}")]
    InvalidValue {
        category: String,
        option: String,
        reason: String,
    },

    // -- Settings bundles --
    #[error("invalid settings document: {0}")]
    InvalidDocument(String),

    #[error("embedded asset could not be decoded: {0}")]
    AssetDecode(String),

    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    #[error("administration password required")]
    AdminLocked,

    // -- Connection lifecycle --
    #[error("a connection attempt is already in progress")]
    Busy,

    #[error("no async runtime available: {0}")]
    NoRuntime(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LauncherError>;
