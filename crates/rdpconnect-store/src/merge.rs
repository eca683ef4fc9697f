// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Key-by-key overlay of a partial category file onto a settings tree.

use rdpconnect_core::config::{Category, Configuration};
use rdpconnect_core::error::LauncherError;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Overlay `contents` onto `base[category]`, one option at a time.
///
/// Known options overwrite the base value, `null` for a list option becomes
/// an empty list, unknown options are dropped.  An option whose value has the
/// wrong type is skipped and the base value kept, so merging never fails.
pub fn merge(
    base: &Configuration,
    category: Category,
    contents: &Map<String, Value>,
) -> Configuration {
    let mut merged = base.clone();
    for (option, value) in contents {
        match merged.set(category, option, value) {
            Ok(()) => {}
            Err(LauncherError::UnknownOption { .. }) => {
                debug!(%category, option = %option, "dropping unknown option");
            }
            Err(e) => {
                warn!(%category, option = %option, error = %e, "keeping previous value");
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdpconnect_core::types::FolderEntry;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn known_keys_overwrite_and_missing_keys_keep_defaults() {
        let base = Configuration::defaults();
        let file = object(json!({"Server Address": "10.0.0.5", "Username": "bob"}));

        let merged = merge(&base, Category::General, &file);

        assert_eq!(merged.general.server_address, "10.0.0.5");
        assert_eq!(merged.general.username, "bob");
        assert_eq!(merged.general.port, base.general.port);
        assert_eq!(merged.general.domain, base.general.domain);
        assert_eq!(merged.display, base.display);
    }

    #[test]
    fn merge_keeps_values_not_named_in_file() {
        let mut base = Configuration::defaults();
        base.general.username = "alice".into();
        let merged = merge(
            &base,
            Category::General,
            &object(json!({"Domain": "CORP"})),
        );
        assert_eq!(merged.general.username, "alice");
        assert_eq!(merged.general.domain, "CORP");
    }

    #[test]
    fn merge_is_idempotent() {
        let base = Configuration::defaults();
        let file = object(json!({
            "Redirect": true,
            "Folders": [{"path": "/home/kiosk", "enabled": false}],
            "Bogus": 1
        }));

        let once = merge(&base, Category::Folders, &file);
        let twice = merge(&once, Category::Folders, &file);
        assert_eq!(once, twice);
    }

    #[test]
    fn null_list_becomes_empty() {
        let mut base = Configuration::defaults();
        base.folders.folders.push(FolderEntry::new("/tmp"));

        let merged = merge(&base, Category::Folders, &object(json!({"Folders": null})));
        assert!(merged.folders.folders.is_empty());
    }

    #[test]
    fn unknown_and_mistyped_keys_are_skipped() {
        let base = Configuration::defaults();
        let merged = merge(
            &base,
            Category::Redirect,
            &object(json!({"Clipboard": true, "Printers": "yes", "Scanners": true})),
        );
        assert!(merged.redirect.clipboard);
        assert!(!merged.redirect.printers);
    }
}
