// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// CUPS printer enumeration.
//
// Printer names come from `lpstat -p`, one `printer <name> ...` line per
// queue.  The driver is read from the queue's PPD file in `/etc/cups/ppd`:
// `*NickName:` is preferred, `*DriverName:` is the fallback.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use rdpconnect_core::types::LocalPrinter;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::DeviceProber;

/// Default CUPS PPD directory.
pub const DEFAULT_PPD_DIR: &str = "/etc/cups/ppd";

#[derive(Debug, Error)]
enum ProbeError {
    #[error("could not run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Lists CUPS queues and their PPD driver names.
#[derive(Debug, Clone)]
pub struct CupsProber {
    program: PathBuf,
    args: Vec<String>,
    ppd_dir: PathBuf,
}

impl Default for CupsProber {
    fn default() -> Self {
        Self {
            program: PathBuf::from("lpstat"),
            args: vec!["-p".into()],
            ppd_dir: PathBuf::from(DEFAULT_PPD_DIR),
        }
    }
}

impl CupsProber {
    /// Replace the `lpstat -p` invocation.
    pub fn with_lpstat_command(
        mut self,
        program: impl Into<PathBuf>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.program = program.into();
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_ppd_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.ppd_dir = dir.into();
        self
    }

    fn try_list(&self) -> Result<Vec<LocalPrinter>, ProbeError> {
        let program = self.program.display().to_string();
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|source| ProbeError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ProbeError::Exit {
                program,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_lpstat(&stdout)
            .into_iter()
            .map(|name| {
                let driver = self.driver_for(&name);
                LocalPrinter { name, driver }
            })
            .collect())
    }

    fn driver_for(&self, printer: &str) -> Option<String> {
        let ppd = self.ppd_dir.join(format!("{printer}.ppd"));
        read_ppd_driver(&ppd)
    }
}

impl DeviceProber for CupsProber {
    fn name(&self) -> &str {
        "cups"
    }

    fn list_printers(&self) -> Vec<LocalPrinter> {
        match self.try_list() {
            Ok(printers) => {
                info!(count = printers.len(), "local printers enumerated");
                printers
            }
            Err(e) => {
                warn!(error = %e, "printer enumeration failed");
                Vec::new()
            }
        }
    }
}

/// Queue names from `lpstat -p` output.
pub fn parse_lpstat(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            let rest = line.strip_prefix("printer")?;
            if !rest.starts_with(char::is_whitespace) {
                return None;
            }
            rest.split_whitespace().next().map(str::to_owned)
        })
        .collect()
}

/// Driver name from PPD text: `*NickName:` if present, else `*DriverName:`.
pub fn parse_ppd_driver(ppd: &str) -> Option<String> {
    let value = |key: &str| {
        ppd.lines()
            .find_map(|line| line.strip_prefix(key))
            .map(|v| v.trim().trim_matches('"').to_owned())
    };
    value("*NickName:").or_else(|| value("*DriverName:"))
}

fn read_ppd_driver(path: &Path) -> Option<String> {
    match fs::read(path) {
        Ok(bytes) => parse_ppd_driver(&String::from_utf8_lossy(&bytes)),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no readable PPD");
            None
        }
    }
}
