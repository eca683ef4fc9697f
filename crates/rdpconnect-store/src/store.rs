// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// On-disk configuration store.
//
// Layout of the config directory:
//
//   general.cfg, display.cfg, ...   one flat JSON object per category
//   logo.png                        adopted or imported logo (optional)
//
// Loading starts from the built-in defaults and overlays each category file
// key by key.  A missing or unreadable file leaves that category at its
// defaults; a file that is present but not a JSON object fails the load.
// Every write is staged in a temp file and renamed into place.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rdpconnect_core::config::{Category, Configuration};
use rdpconnect_core::error::{LauncherError, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info, instrument, warn};

use crate::atomic::{StagedFile, write_atomic};
use crate::bundle::{self, Document, LOGO_OPTION, LogoField};
use crate::integrity::verify_written;
use crate::merge::merge;

/// Logo file name inside the config directory.
pub const LOGO_FILE_NAME: &str = "logo.png";

/// The settings tree together with the directory it is persisted in.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
    config: Configuration,
}

impl ConfigStore {
    /// Load the store from `dir`.  The directory does not need to exist.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let config = load(&dir)?;
        info!(dir = %dir.display(), "configuration loaded");
        Ok(Self { dir, config })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// In-memory edits; nothing reaches disk until [`persist`](Self::persist).
    pub fn config_mut(&mut self) -> &mut Configuration {
        &mut self.config
    }

    /// Discard in-memory edits and read the directory again.
    pub fn reload(&mut self) -> Result<()> {
        self.config = load(&self.dir)?;
        Ok(())
    }

    pub fn set_option(&mut self, category: Category, option: &str, value: &Value) -> Result<()> {
        self.config.set(category, option, value)
    }

    pub fn persist(&self, category: Category) -> Result<()> {
        persist(&self.dir, &self.config, category)
    }

    /// Persist every category.  All files are staged before any is renamed.
    pub fn persist_all(&self) -> Result<()> {
        commit_all(&self.dir, &self.config)
    }

    pub fn export(&self) -> Result<Document> {
        bundle::export(&self.config)
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn export_to(&self, path: &Path) -> Result<()> {
        let text = self.export()?.to_json_pretty()?;
        write_atomic(path, text.as_bytes())?;
        info!("settings exported");
        Ok(())
    }

    /// Replace the categories present in `doc`, persist the whole tree and
    /// reload it from disk.
    ///
    /// Each imported category replaces the current one outright; keys it does
    /// not name take their defaults.  An embedded logo is written into the
    /// config directory and the logo option pointed at it.
    ///
    /// Every file is written and the logo verified before the first rename,
    /// so a decode, validation or write error leaves memory and disk as they
    /// were.  A rename failing midway is not rolled back; the store reloads
    /// whatever was committed and returns the error.
    #[instrument(skip_all, fields(dir = %self.dir.display()))]
    pub fn import(&mut self, doc: &Document) -> Result<()> {
        let mut candidate = self.config.clone();
        let mut logo: Option<(PathBuf, Vec<u8>)> = None;

        for (category, mut object) in doc.categories()? {
            if category == Category::Appearance {
                if let Some(LogoField::Embedded(asset)) = object
                    .get(LOGO_OPTION)
                    .and_then(|v| LogoField::deserialize(v).ok())
                {
                    let bytes = asset.decode()?;
                    let target = self.dir.join(asset.safe_file_name()?);
                    object.insert(
                        LOGO_OPTION.to_owned(),
                        Value::String(target.to_string_lossy().into_owned()),
                    );
                    logo = Some((target, bytes));
                }
            }

            candidate
                .replace_category(category, Value::Object(object))
                .map_err(|e| LauncherError::InvalidDocument(format!("category {category}: {e}")))?;
            debug!(%category, "category replaced");
        }

        let staged = stage_all(&self.dir, &candidate)?;
        let staged_logo = match &logo {
            Some((target, bytes)) => {
                let file = StagedFile::write(target, bytes)?;
                verify_written(file.temp(), bytes)?;
                Some(file)
            }
            None => None,
        };

        // Everything is on disk; only renames remain.  The logo goes last so
        // an earlier failure leaves any previous logo in place.
        if let Err(e) = commit_staged(staged, staged_logo) {
            warn!(error = %e, "import interrupted while committing, reloading what landed");
            let _ = self.reload();
            return Err(e);
        }

        if let Some((target, bytes)) = &logo {
            debug!(path = %target.display(), bytes = bytes.len(), "logo materialised");
        }
        self.reload()?;
        info!("settings imported");
        Ok(())
    }

    pub fn import_from(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path)?;
        let doc = Document::from_json(&text)?;
        self.import(&doc)
    }

    /// Copy `source` into the config directory as the logo and point the
    /// logo option at the copy.  The Appearance category is not persisted.
    #[instrument(skip(self), fields(source = %source.display()))]
    pub fn adopt_logo(&mut self, source: &Path) -> Result<PathBuf> {
        let bytes = fs::read(source)?;
        let target = self.dir.join(LOGO_FILE_NAME);
        write_atomic(&target, &bytes)?;
        verify_written(&target, &bytes)?;
        self.config.appearance.logo_file = target.to_string_lossy().into_owned();
        Ok(target)
    }
}

/// Defaults overlaid with every category file found in `dir`.
#[instrument(fields(dir = %dir.display()))]
pub fn load(dir: &Path) -> Result<Configuration> {
    let mut config = Configuration::defaults();
    for category in Category::ALL {
        if let Some(contents) = read_category(dir, category)? {
            config = merge(&config, category, &contents);
        }
    }

    if config.appearance.logo_file.is_empty() {
        let fallback = dir.join(LOGO_FILE_NAME);
        if fallback.is_file() {
            debug!(path = %fallback.display(), "using logo found in config dir");
            config.appearance.logo_file = fallback.to_string_lossy().into_owned();
        }
    }

    Ok(config)
}

/// Write one category file, replacing the previous one.
pub fn persist(dir: &Path, config: &Configuration, category: Category) -> Result<()> {
    let target = dir.join(category.file_name());
    write_atomic(&target, &category_bytes(config, category)?)?;
    debug!(%category, path = %target.display(), "category persisted");
    Ok(())
}

fn read_category(dir: &Path, category: Category) -> Result<Option<Map<String, Value>>> {
    let path = dir.join(category.file_name());
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(%category, "no settings file, using defaults");
            return Ok(None);
        }
        Err(e) => {
            warn!(
                %category,
                path = %path.display(),
                error = %e,
                "unreadable settings file, using defaults"
            );
            return Ok(None);
        }
    };

    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        Ok(_) => {
            error!(path = %path.display(), "settings file is not a JSON object");
            Err(LauncherError::InvalidDocument(format!(
                "{} does not hold a JSON object",
                path.display()
            )))
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "malformed settings file");
            Err(e.into())
        }
    }
}

fn category_bytes(config: &Configuration, category: Category) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(&config.category_value(category)?)?)
}

fn stage_all(dir: &Path, config: &Configuration) -> Result<Vec<StagedFile>> {
    let mut staged = Vec::with_capacity(Category::ALL.len());
    for category in Category::ALL {
        staged.push(StagedFile::write(
            &dir.join(category.file_name()),
            &category_bytes(config, category)?,
        )?);
    }
    Ok(staged)
}

fn commit_staged(categories: Vec<StagedFile>, logo: Option<StagedFile>) -> Result<()> {
    for file in categories {
        file.commit()?;
    }
    if let Some(file) = logo {
        file.commit()?;
    }
    Ok(())
}

fn commit_all(dir: &Path, config: &Configuration) -> Result<()> {
    for file in stage_all(dir, config)? {
        file.commit()?;
    }
    Ok(())
}
