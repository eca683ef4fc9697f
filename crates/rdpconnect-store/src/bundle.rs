// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Portable settings bundle.
//
// A bundle is one JSON object keyed by category name whose values are the
// full category objects.  The `Appearance."Logo File"` field is either a
// plain path or an embedded asset record `{filename, content}` with the
// image bytes in standard base64, so a bundle can carry the logo to another
// machine.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rdpconnect_core::config::{Category, Configuration};
use rdpconnect_core::error::{LauncherError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

/// Document key of the logo option inside the `Appearance` category.
pub const LOGO_OPTION: &str = "Logo File";

/// A settings bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(pub Map<String, Value>);

/// A binary file carried inline in a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedAsset {
    /// Base name of the original file.
    pub filename: String,
    /// Standard base64 of the file bytes.
    pub content: String,
}

impl EmbeddedAsset {
    pub fn from_bytes(filename: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            filename: filename.into(),
            content: STANDARD.encode(bytes),
        }
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.content.trim())
            .map_err(|e| LauncherError::AssetDecode(format!("{}: {e}", self.filename)))
    }

    /// The recorded file name with any directory components removed.
    ///
    /// Hidden names and names ending in `.cfg` or `.tmp` are rejected: they
    /// would collide with category files or the temp files they are staged
    /// through.
    pub fn safe_file_name(&self) -> Result<String> {
        let name = Path::new(&self.filename)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| self.unusable_name("has no usable file name"))?;

        let lower = name.to_ascii_lowercase();
        if name.starts_with('.') || lower.ends_with(".cfg") || lower.ends_with(".tmp") {
            return Err(self.unusable_name("uses a reserved file name"));
        }
        Ok(name)
    }

    fn unusable_name(&self, reason: &str) -> LauncherError {
        LauncherError::InvalidDocument(format!(
            "embedded asset {reason}: {:?}",
            self.filename
        ))
    }
}

/// The two shapes the logo option takes inside a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogoField {
    Path(String),
    Embedded(EmbeddedAsset),
}

impl Document {
    /// Parse a bundle; the top level must be a JSON object.
    pub fn from_json(text: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => Ok(Self(map)),
            other => Err(LauncherError::InvalidDocument(format!(
                "expected an object of categories, found {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.0)?)
    }

    pub fn category(&self, category: Category) -> Option<&Value> {
        self.0.get(category.name())
    }

    /// The logo option, if the bundle carries an `Appearance` category with
    /// a path or an embedded asset in it.
    pub fn logo(&self) -> Option<LogoField> {
        self.category(Category::Appearance)?
            .get(LOGO_OPTION)
            .and_then(|v| LogoField::deserialize(v).ok())
    }

    /// Categories present in the bundle, each checked to be a JSON object.
    /// Keys that are not category names are ignored.
    pub fn categories(&self) -> Result<Vec<(Category, Map<String, Value>)>> {
        let mut found = Vec::new();
        for category in Category::ALL {
            match self.0.get(category.name()) {
                None => {}
                Some(Value::Object(object)) => found.push((category, object.clone())),
                Some(other) => {
                    return Err(LauncherError::InvalidDocument(format!(
                        "category {category} must be an object, found {}",
                        json_kind(other)
                    )));
                }
            }
        }
        Ok(found)
    }
}

/// Serialize the whole tree as a bundle.
///
/// When the logo option names an existing file, the file is embedded.
#[instrument(skip_all)]
pub fn export(config: &Configuration) -> Result<Document> {
    let mut doc = Map::new();
    for category in Category::ALL {
        doc.insert(category.name().to_owned(), config.category_value(category)?);
    }

    if let Some(logo) = config.appearance.logo_path().filter(|p| p.is_file()) {
        let bytes = std::fs::read(logo)?;
        let filename = logo
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let asset = EmbeddedAsset::from_bytes(filename, &bytes);
        debug!(file = %asset.filename, bytes = bytes.len(), "embedding logo");

        if let Some(Value::Object(appearance)) = doc.get_mut(Category::Appearance.name()) {
            appearance.insert(LOGO_OPTION.to_owned(), serde_json::to_value(asset)?);
        }
    }

    Ok(Document(doc))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
