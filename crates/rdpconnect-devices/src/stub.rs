// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Prober for platforms without device enumeration.

use rdpconnect_core::types::LocalPrinter;

use crate::DeviceProber;

/// Always reports no devices.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubProber;

impl DeviceProber for StubProber {
    fn name(&self) -> &str {
        "stub"
    }

    fn list_printers(&self) -> Vec<LocalPrinter> {
        Vec::new()
    }
}
