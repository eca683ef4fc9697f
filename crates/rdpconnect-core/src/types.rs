// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the rdpconnect launcher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One cell of the 3x3 placement grid used by the login screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    CenterCenter,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Position {
    pub const ALL: [Position; 9] = [
        Self::TopLeft,
        Self::TopCenter,
        Self::TopRight,
        Self::CenterLeft,
        Self::CenterCenter,
        Self::CenterRight,
        Self::BottomLeft,
        Self::BottomCenter,
        Self::BottomRight,
    ];

    /// `(row, column)` of this position in the 3x3 grid.
    pub fn grid_cell(&self) -> (u8, u8) {
        match self {
            Self::TopLeft => (0, 0),
            Self::TopCenter => (0, 1),
            Self::TopRight => (0, 2),
            Self::CenterLeft => (1, 0),
            Self::CenterCenter => (1, 1),
            Self::CenterRight => (1, 2),
            Self::BottomLeft => (2, 0),
            Self::BottomCenter => (2, 1),
            Self::BottomRight => (2, 2),
        }
    }
}

/// Where remote audio is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaySound {
    #[default]
    #[serde(rename = "Never")]
    Never,
    #[serde(rename = "On this computer")]
    OnThisComputer,
    #[serde(rename = "On the remote computer")]
    OnRemoteComputer,
}

/// A local folder offered for redirection into the remote session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderEntry {
    pub path: String,
    pub enabled: bool,
}

impl FolderEntry {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            enabled: true,
        }
    }
}

/// A printer installed on this machine that could be redirected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalPrinter {
    /// Queue name as reported by the print spooler.
    pub name: String,
    /// Human-readable driver name from the printer description file, if any.
    pub driver: Option<String>,
}

/// Version of the external RDP client, as reported by its version flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClientVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ClientVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a dotted version token such as `3.2.0` or `3.0.0-beta4`.
    ///
    /// The major component must be a plain integer; minor and patch fall back
    /// to zero when missing or not numeric.
    pub fn parse(token: &str) -> Option<Self> {
        let mut parts = token.trim().split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next().map(leading_number).unwrap_or(0);
        let patch = parts.next().map(leading_number).unwrap_or(0);
        Some(Self::new(major, minor, patch))
    }
}

fn leading_number(part: &str) -> u32 {
    let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

impl std::fmt::Display for ClientVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Lifecycle states of the connection orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No connection attempt outstanding.
    Idle,
    /// Probing the client and assembling the argument vector.
    Building,
    /// The client process has been spawned and has not exited yet.
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

/// The single outcome of a connection attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalEvent {
    /// The client exited with status 0.
    Succeeded,
    /// The client exited non-zero (stderr text) or could not be spawned.
    Failed(String),
    /// Cancellation was requested before the client exited.
    Cancelled,
}

impl TerminalEvent {
    pub fn state(&self) -> ConnectionState {
        match self {
            Self::Succeeded => ConnectionState::Succeeded,
            Self::Failed(_) => ConnectionState::Failed,
            Self::Cancelled => ConnectionState::Cancelled,
        }
    }
}

/// Terminal event plus bookkeeping, delivered once per connection attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionReport {
    pub id: ConnectionId,
    pub event: TerminalEvent,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Login fields that can be left blank in the settings and asked for at
/// connect time instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoginField {
    ServerAddress,
    Port,
    Username,
    Password,
    Domain,
}

/// Values typed into the login prompt for fields the settings leave blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginPrompt {
    pub server_address: Option<String>,
    pub port: Option<u32>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub domain: Option<String>,
}
