// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// rdpconnect store: the settings tree on disk, one file per category, plus the
// portable bundle format used to move settings (logo included) between
// machines.

pub mod atomic;
pub mod bundle;
pub mod integrity;
pub mod merge;
pub mod store;

pub use bundle::{Document, EmbeddedAsset, LogoField};
pub use merge::merge;
pub use store::ConfigStore;
