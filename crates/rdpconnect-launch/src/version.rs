// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Client version probe (`xfreerdp +version`).

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use rdpconnect_core::types::ClientVersion;
use tokio::process::Command;
use tracing::{debug, warn};

/// Upper bound on how long the version probe may run.
pub const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Run `<binary> +version` and parse the reported version.
///
/// Any failure (spawn error, timeout, unexpected output) yields `None`.
pub async fn probe_version(binary: &Path) -> Option<ClientVersion> {
    probe_version_within(binary, VERSION_PROBE_TIMEOUT).await
}

async fn probe_version_within(binary: &Path, limit: Duration) -> Option<ClientVersion> {
    let output = Command::new(binary)
        .arg("+version")
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();

    match tokio::time::timeout(limit, output).await {
        Err(_) => {
            warn!(binary = %binary.display(), ?limit, "version probe timed out");
            None
        }
        Ok(Err(e)) => {
            debug!(binary = %binary.display(), error = %e, "version probe failed");
            None
        }
        Ok(Ok(output)) => {
            let version = parse_version_output(&String::from_utf8_lossy(&output.stdout));
            debug!(binary = %binary.display(), ?version, "client version probed");
            version
        }
    }
}

/// Extract the version from the first line of `+version` output.
///
/// FreeRDP prints e.g. `This is FreeRDP version 3.5.1 (n/a)`; the version is
/// the fifth word, or the fourth when the line is one word shorter.
pub fn parse_version_output(stdout: &str) -> Option<ClientVersion> {
    let line = stdout.lines().next()?;
    let words: Vec<&str> = line.split_whitespace().collect();
    let token = match words.len() {
        n if n > 4 => words[4],
        4 => words[3],
        _ => return None,
    };
    ClientVersion::parse(token)
}
