// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Launcher settings tree.
//
// The tree is a fixed set of categories, each persisted on its own as a flat
// JSON object (`general.cfg`, `display.cfg`, ...).  JSON keys are the
// human-readable option names so that files stay hand-editable and compatible
// with settings written by earlier launcher releases.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{LauncherError, Result};
use crate::types::{FolderEntry, LoginField, LoginPrompt, PlaySound, Position};

/// File extension used for persisted category files.
pub const SETTINGS_FILE_EXTENSION: &str = "cfg";

/// Default RDP port.
pub const DEFAULT_RDP_PORT: u32 = 3389;

/// Top-level settings categories.  Never renamed, never extended at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    General,
    Display,
    Devices,
    Redirect,
    Folders,
    Administration,
    Appearance,
}

impl Category {
    /// Every category, in persisted/exported order.
    pub const ALL: [Category; 7] = [
        Self::General,
        Self::Display,
        Self::Devices,
        Self::Redirect,
        Self::Folders,
        Self::Administration,
        Self::Appearance,
    ];

    /// Name used as the document key, e.g. `"General"`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Display => "Display",
            Self::Devices => "Devices",
            Self::Redirect => "Redirect",
            Self::Folders => "Folders",
            Self::Administration => "Administration",
            Self::Appearance => "Appearance",
        }
    }

    /// Persisted file name, e.g. `"general.cfg"`.
    pub fn file_name(&self) -> String {
        format!(
            "{}.{SETTINGS_FILE_EXTENSION}",
            self.name().to_ascii_lowercase()
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = LauncherError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LauncherError::UnknownCategory(s.to_owned()))
    }
}

/// Connection target and credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    #[serde(rename = "Server Address")]
    pub server_address: String,
    /// `None` when the port field is blank.  The 1-65535 range is enforced by
    /// the editing front end, not here.
    #[serde(rename = "Port", deserialize_with = "deserialize_port")]
    pub port: Option<u32>,
    #[serde(rename = "Username")]
    pub username: String,
    /// Stored in plaintext.
    #[serde(rename = "Password")]
    pub password: String,
    #[serde(rename = "Domain")]
    pub domain: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            server_address: String::new(),
            port: Some(DEFAULT_RDP_PORT),
            username: String::new(),
            password: String::new(),
            domain: String::new(),
        }
    }
}

impl GeneralSettings {
    /// Login fields left blank in the settings, in prompt order.
    pub fn missing_fields(&self) -> Vec<LoginField> {
        let mut missing = Vec::new();
        if self.server_address.is_empty() {
            missing.push(LoginField::ServerAddress);
        }
        if self.port.is_none() {
            missing.push(LoginField::Port);
        }
        if self.username.is_empty() {
            missing.push(LoginField::Username);
        }
        if self.password.is_empty() {
            missing.push(LoginField::Password);
        }
        if self.domain.is_empty() {
            missing.push(LoginField::Domain);
        }
        missing
    }

    /// Fill blank fields from prompt input.  Configured values always win.
    pub fn fill_from(&mut self, prompt: &LoginPrompt) {
        fill_blank(&mut self.server_address, prompt.server_address.as_deref());
        fill_blank(&mut self.username, prompt.username.as_deref());
        fill_blank(&mut self.password, prompt.password.as_deref());
        fill_blank(&mut self.domain, prompt.domain.as_deref());
        if self.port.is_none() {
            self.port = prompt.port;
        }
    }
}

fn fill_blank(target: &mut String, input: Option<&str>) {
    if target.is_empty() {
        if let Some(value) = input {
            target.push_str(value);
        }
    }
}

/// Remote display geometry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// `"WxH"`, or empty to let the client decide.
    #[serde(rename = "Resolution")]
    pub resolution: String,
    #[serde(rename = "Use all monitors")]
    pub use_all_monitors: bool,
    #[serde(rename = "Start session in fullscreen")]
    pub start_fullscreen: bool,
    #[serde(rename = "Fit session to window")]
    pub fit_to_window: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevicesSettings {
    #[serde(rename = "Play sound")]
    pub play_sound: PlaySound,
}

/// Local resources offered to the remote session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedirectSettings {
    #[serde(rename = "Printers")]
    pub printers: bool,
    #[serde(rename = "Clipboard")]
    pub clipboard: bool,
    #[serde(rename = "Smart Cards")]
    pub smart_cards: bool,
    #[serde(rename = "Ports")]
    pub ports: bool,
    #[serde(rename = "Drives")]
    pub drives: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoldersSettings {
    #[serde(rename = "Redirect")]
    pub redirect: bool,
    #[serde(rename = "Folders", deserialize_with = "deserialize_null_as_empty")]
    pub folders: Vec<FolderEntry>,
}

impl FoldersSettings {
    /// Append an enabled folder.  Duplicate paths are accepted.
    pub fn add(&mut self, path: impl Into<String>) {
        self.folders.push(FolderEntry::new(path));
    }

    /// Remove the first entry with `path`.  Returns whether one was removed.
    pub fn remove(&mut self, path: &str) -> bool {
        match self.folders.iter().position(|f| f.path == path) {
            Some(index) => {
                self.folders.remove(index);
                true
            }
            None => false,
        }
    }

    /// Toggle the first entry with `path`.  Returns whether one was found.
    pub fn set_enabled(&mut self, path: &str, enabled: bool) -> bool {
        match self.folders.iter_mut().find(|f| f.path == path) {
            Some(entry) => {
                entry.enabled = enabled;
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdministrationSettings {
    /// Gates the settings editor.  Stored in plaintext.
    #[serde(rename = "Password")]
    pub password: String,
}

impl AdministrationSettings {
    /// Whether `candidate` opens the settings editor.  An empty administration
    /// password leaves the editor unlocked.
    pub fn unlocks(&self, candidate: Option<&str>) -> bool {
        self.password.is_empty() || candidate == Some(self.password.as_str())
    }
}

/// Login screen layout and the buttons it offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceSettings {
    #[serde(rename = "Login Position")]
    pub login_position: Position,
    #[serde(rename = "Logo Position")]
    pub logo_position: Position,
    /// Path to the logo image; empty when no logo is configured.
    #[serde(rename = "Logo File")]
    pub logo_file: String,
    #[serde(rename = "Hide Exit")]
    pub hide_exit: bool,
    #[serde(rename = "Hide Restart")]
    pub hide_restart: bool,
    #[serde(rename = "Hide Shutdown")]
    pub hide_shutdown: bool,
    #[serde(rename = "Fullscreen")]
    pub fullscreen: bool,
}

impl Default for AppearanceSettings {
    fn default() -> Self {
        Self {
            login_position: Position::CenterCenter,
            logo_position: Position::TopCenter,
            logo_file: String::new(),
            hide_exit: false,
            hide_restart: false,
            hide_shutdown: false,
            fullscreen: false,
        }
    }
}

impl AppearanceSettings {
    pub fn logo_path(&self) -> Option<&Path> {
        if self.logo_file.is_empty() {
            None
        } else {
            Some(Path::new(&self.logo_file))
        }
    }
}

/// The complete settings tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    #[serde(rename = "General")]
    pub general: GeneralSettings,
    #[serde(rename = "Display")]
    pub display: DisplaySettings,
    #[serde(rename = "Devices")]
    pub devices: DevicesSettings,
    #[serde(rename = "Redirect")]
    pub redirect: RedirectSettings,
    #[serde(rename = "Folders")]
    pub folders: FoldersSettings,
    #[serde(rename = "Administration")]
    pub administration: AdministrationSettings,
    #[serde(rename = "Appearance")]
    pub appearance: AppearanceSettings,
}

impl Configuration {
    /// The built-in default tree.
    pub fn defaults() -> Self {
        Self::default()
    }

    /// One category as a flat JSON object.
    pub fn category_value(&self, category: Category) -> Result<Value> {
        let value = match category {
            Category::General => serde_json::to_value(&self.general)?,
            Category::Display => serde_json::to_value(&self.display)?,
            Category::Devices => serde_json::to_value(&self.devices)?,
            Category::Redirect => serde_json::to_value(&self.redirect)?,
            Category::Folders => serde_json::to_value(&self.folders)?,
            Category::Administration => serde_json::to_value(&self.administration)?,
            Category::Appearance => serde_json::to_value(&self.appearance)?,
        };
        Ok(value)
    }

    /// Replace a whole category from a JSON object.  Keys missing from
    /// `value` take their built-in defaults; unknown keys are ignored.
    ///
    /// On error the configuration is left untouched.
    pub fn replace_category(&mut self, category: Category, value: Value) -> Result<()> {
        match category {
            Category::General => self.general = serde_json::from_value(value)?,
            Category::Display => self.display = serde_json::from_value(value)?,
            Category::Devices => self.devices = serde_json::from_value(value)?,
            Category::Redirect => self.redirect = serde_json::from_value(value)?,
            Category::Folders => self.folders = serde_json::from_value(value)?,
            Category::Administration => self.administration = serde_json::from_value(value)?,
            Category::Appearance => self.appearance = serde_json::from_value(value)?,
        }
        Ok(())
    }

    /// Current value of a single option.
    pub fn get(&self, category: Category, option: &str) -> Result<Value> {
        match self.category_value(category)? {
            Value::Object(mut object) => object
                .remove(option)
                .ok_or_else(|| unknown_option(category, option)),
            _ => Err(unknown_option(category, option)),
        }
    }

    /// Set a single option from its JSON value.
    ///
    /// `null` for a list option becomes an empty list.  Fails with
    /// `UnknownOption` for names outside the category and with `InvalidValue`
    /// when the value does not fit the option's type; the configuration is
    /// unchanged in both cases.
    pub fn set(&mut self, category: Category, option: &str, value: &Value) -> Result<()> {
        let Value::Object(mut object) = self.category_value(category)? else {
            return Err(unknown_option(category, option));
        };
        let existing = object
            .get(option)
            .ok_or_else(|| unknown_option(category, option))?;

        let value = if value.is_null() && existing.is_array() {
            Value::Array(Vec::new())
        } else {
            value.clone()
        };
        object.insert(option.to_owned(), value);

        self.replace_category(category, Value::Object(object))
            .map_err(|e| LauncherError::InvalidValue {
                category: category.name().to_owned(),
                option: option.to_owned(),
                reason: e.to_string(),
            })
    }
}

fn unknown_option(category: Category, option: &str) -> LauncherError {
    LauncherError::UnknownOption {
        category: category.name().to_owned(),
        option: option.to_owned(),
    }
}

/// Accepts a number, `null`, an empty string or a numeric string.
fn deserialize_port<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortRepr {
        Number(u32),
        Text(String),
        Blank(()),
    }

    match PortRepr::deserialize(deserializer)? {
        PortRepr::Number(port) => Ok(Some(port)),
        PortRepr::Blank(()) => Ok(None),
        PortRepr::Text(text) if text.trim().is_empty() => Ok(None),
        PortRepr::Text(text) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid port {text:?}"))),
    }
}

/// List options must never be null; `null` reads as an empty list.
fn deserialize_null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
