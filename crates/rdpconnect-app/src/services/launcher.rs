// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Launcher services: the settings store, device prober and client binary
// behind one object, with the administration gate applied to every edit.
//
// Edits are persisted one category at a time right after they succeed, the
// way the settings dialog saves a tab.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rdpconnect_core::config::{Category, Configuration};
use rdpconnect_core::error::{LauncherError, Result};
use rdpconnect_core::types::{LocalPrinter, LoginPrompt};
use rdpconnect_devices::{DeviceProber, platform_prober};
use rdpconnect_launch::{ClientBinary, CommandLine, Orchestrator, probe_version};
use rdpconnect_store::ConfigStore;
use serde_json::Value;
use tracing::{info, warn};

use super::paths::LauncherPaths;

/// Placeholder printed instead of stored passwords.
const MASK: &str = "********";

/// Folder list edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderAction {
    Add,
    Remove,
    Enable,
    Disable,
}

pub struct Launcher {
    store: ConfigStore,
    binary: ClientBinary,
    prober: Arc<dyn DeviceProber>,
    admin_password: Option<String>,
}

impl Launcher {
    /// Load the settings and resolve the client.  Call once at startup.
    pub fn open(paths: &LauncherPaths, client: Option<PathBuf>) -> Result<Self> {
        let store = ConfigStore::open(&paths.config_dir)?;
        let binary = ClientBinary::resolve(client, &paths.root);
        info!(
            config_dir = %paths.config_dir.display(),
            client = %binary.path().display(),
            "launcher services initialised"
        );
        Ok(Self::with_parts(store, binary, Arc::from(platform_prober())))
    }

    pub fn with_parts(
        store: ConfigStore,
        binary: ClientBinary,
        prober: Arc<dyn DeviceProber>,
    ) -> Self {
        Self {
            store,
            binary,
            prober,
            admin_password: None,
        }
    }

    /// Password offered for the administration gate.
    pub fn with_admin_password(mut self, password: Option<String>) -> Self {
        self.admin_password = password;
        self
    }

    pub fn config(&self) -> &Configuration {
        self.store.config()
    }

    fn require_admin(&self) -> Result<()> {
        if self
            .config()
            .administration
            .unlocks(self.admin_password.as_deref())
        {
            Ok(())
        } else {
            warn!("administration password missing or wrong");
            Err(LauncherError::AdminLocked)
        }
    }

    // -- Settings ------------------------------------------------------------

    /// The settings tree as pretty JSON with passwords masked.
    pub fn show(&self) -> Result<String> {
        let mut doc = serde_json::Map::new();
        for category in Category::ALL {
            let mut value = self.config().category_value(category)?;
            if let Some(Value::String(password)) = value.get_mut("Password") {
                if !password.is_empty() {
                    *password = MASK.into();
                }
            }
            doc.insert(category.name().to_owned(), value);
        }
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    pub fn set(&mut self, category: Category, option: &str, value: &Value) -> Result<()> {
        self.require_admin()?;
        self.store.set_option(category, option, value)?;
        self.store.persist(category)?;
        info!(%category, option, "setting changed");
        Ok(())
    }

    /// Returns whether an entry with `path` was found (always true for add).
    pub fn folders(&mut self, action: FolderAction, path: &str) -> Result<bool> {
        self.require_admin()?;
        let folders = &mut self.store.config_mut().folders;
        let found = match action {
            FolderAction::Add => {
                folders.add(path);
                true
            }
            FolderAction::Remove => folders.remove(path),
            FolderAction::Enable => folders.set_enabled(path, true),
            FolderAction::Disable => folders.set_enabled(path, false),
        };
        if found {
            self.store.persist(Category::Folders)?;
        }
        Ok(found)
    }

    pub fn adopt_logo(&mut self, source: &Path) -> Result<PathBuf> {
        self.require_admin()?;
        let adopted = self.store.adopt_logo(source)?;
        self.store.persist(Category::Appearance)?;
        Ok(adopted)
    }

    /// Bundles carry plaintext passwords, so exporting is gated too.
    pub fn export_to(&self, path: &Path) -> Result<()> {
        self.require_admin()?;
        self.store.export_to(path)
    }

    pub fn import_from(&mut self, path: &Path) -> Result<()> {
        self.require_admin()?;
        self.store.import_from(path)
    }

    // -- Devices -------------------------------------------------------------

    pub fn printers(&self) -> Vec<LocalPrinter> {
        self.prober.list_printers()
    }

    // -- Connection ----------------------------------------------------------

    /// Settings with blank login fields filled from `prompt`.
    pub fn effective_config(&self, prompt: &LoginPrompt) -> Configuration {
        let mut config = self.config().clone();
        config.general.fill_from(prompt);
        let missing = config.general.missing_fields();
        if !missing.is_empty() {
            warn!(?missing, "login fields left blank");
        }
        config
    }

    /// The client invocation `connect` would run.
    pub async fn command_line(&self, prompt: &LoginPrompt) -> CommandLine {
        let version = probe_version(self.binary.path()).await;
        CommandLine::for_client(&self.binary, &self.effective_config(prompt), version)
    }

    pub fn orchestrator(&self) -> Result<Orchestrator> {
        Orchestrator::new(self.binary.clone(), Arc::clone(&self.prober))
    }
}
