// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// rdpconnect devices: enumeration of local printers that could be offered to
// a remote session.  Only macOS enumerates (through CUPS); every other
// platform gets the empty stub.

pub mod cups;
pub mod stub;

use rdpconnect_core::types::LocalPrinter;

/// Enumerates redirectable local devices.
///
/// Probing never fails: anything that goes wrong degrades to an empty list
/// and is logged.  Implementations may block on a child process, so async
/// callers should run them on a blocking thread.
pub trait DeviceProber: Send + Sync {
    /// Short name for logs, e.g. `"cups"`.
    fn name(&self) -> &str;

    /// Installed printers with their driver names, in spooler order.
    fn list_printers(&self) -> Vec<LocalPrinter>;
}

/// The prober for the operating system this binary was built for.
pub fn platform_prober() -> Box<dyn DeviceProber> {
    #[cfg(target_os = "macos")]
    {
        Box::new(cups::CupsProber::default())
    }
    #[cfg(not(target_os = "macos"))]
    {
        Box::new(stub::StubProber)
    }
}
