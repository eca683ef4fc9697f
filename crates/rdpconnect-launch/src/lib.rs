// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// rdpconnect launch: turns a settings tree into an `xfreerdp` invocation and
// runs it: client binary resolution, version probing, argument building and
// the connection lifecycle with cooperative cancellation.

pub mod binary;
pub mod command;
pub mod orchestrator;
pub mod version;

pub use binary::ClientBinary;
pub use command::{CertificatePolicy, CommandLine, build, withheld_arguments};
pub use orchestrator::{Canceller, ConnectionHandle, Orchestrator};
pub use version::probe_version;
