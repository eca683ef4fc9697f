// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-language messages for kiosk users.
//
// Launcher errors and the stderr text of a failed client run are mapped to a
// short message with a suggestion.  Front ends decide how to present them.

use crate::error::LauncherError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip or busy server; trying again may work.
    Transient,
    /// The user must change something (credentials, address, settings).
    ActionRequired,
    /// Needs an administrator; retrying will not help.
    Permanent,
}

/// A human-readable error with a plain-language message and a suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether pressing Connect again is worthwhile.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `LauncherError` into a `HumanError`.
pub fn humanize_error(err: &LauncherError) -> HumanError {
    match err {
        LauncherError::UnknownCategory(_)
        | LauncherError::UnknownOption { .. }
        | LauncherError::InvalidValue { .. } => HumanError {
            message: "That setting doesn't exist or has the wrong value.".into(),
            suggestion: format!("Check the setting name and value. ({err})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        LauncherError::InvalidDocument(_) | LauncherError::AssetDecode(_) => HumanError {
            message: "The settings file couldn't be imported.".into(),
            suggestion: "The file may be damaged or was not exported by this launcher. Export the settings again and retry.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        LauncherError::IntegrityMismatch { .. } => HumanError {
            message: "The logo couldn't be saved correctly.".into(),
            suggestion: "The copy on disk doesn't match the imported one. Check free disk space and import again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        LauncherError::AdminLocked => HumanError {
            message: "Settings are locked.".into(),
            suggestion: "Enter the administration password to change settings.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        LauncherError::Busy => HumanError {
            message: "A connection is already being made.".into(),
            suggestion: "Wait for it to finish or cancel it first.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        LauncherError::NoRuntime(_) => HumanError {
            message: "The launcher couldn't start its background worker.".into(),
            suggestion: "Restart the launcher. If this keeps happening, please report it.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        LauncherError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "A file couldn't be found.".into(),
                suggestion: "It may have been moved or deleted. Choose the file again.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "The launcher isn't allowed to write its settings.".into(),
                suggestion: "Ask an administrator to check the permissions of the config directory.".into(),
                retriable: false,
                severity: Severity::Permanent,
            },
            _ => HumanError {
                message: "There was a problem reading or writing a file.".into(),
                suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
                retriable: true,
                severity: Severity::Transient,
            },
        },

        LauncherError::Serialization(_) => HumanError {
            message: "A settings file is damaged.".into(),
            suggestion: "Fix or delete the damaged file in the config directory, then start the launcher again.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

/// Map the message of a `Failed` connection to a human-readable error.
///
/// `detail` is either the client's stderr text or a spawn error message.
pub fn humanize_failure(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("logon_failure") || lower.contains("logon failure") {
        HumanError {
            message: "The username or password is wrong.".into(),
            suggestion: "Check your username, password and domain, then connect again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("password_expired") || lower.contains("password_must_change") {
        HumanError {
            message: "Your password has expired.".into(),
            suggestion: "Change your password on another computer, then connect again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("dns_name_not_found") || lower.contains("getaddrinfo") {
        HumanError {
            message: "The server name couldn't be found.".into(),
            suggestion: "Check the server address for typos.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("connect_failed")
        || lower.contains("transport_failed")
        || lower.contains("connection refused")
        || lower.contains("timed out")
    {
        HumanError {
            message: "The server didn't answer.".into(),
            suggestion: "The server may be down or unreachable from this network. Try again in a minute.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    } else if lower.contains("no such file") || lower.contains("not found") {
        HumanError {
            message: "The remote desktop client isn't installed.".into(),
            suggestion: "Ask an administrator to install FreeRDP (xfreerdp).".into(),
            retriable: false,
            severity: Severity::Permanent,
        }
    } else if lower.contains("security_nego") || lower.contains("tls") {
        HumanError {
            message: "The secure connection couldn't be set up.".into(),
            suggestion: "The server's security settings may not match. Ask an administrator.".into(),
            retriable: false,
            severity: Severity::Permanent,
        }
    } else {
        HumanError {
            message: "The connection to the server failed.".into(),
            suggestion: format!("Try again. If this keeps happening, ask an administrator. (Detail: {detail})"),
            retriable: true,
            severity: Severity::Transient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logon_failure_needs_action() {
        let human = humanize_failure(
            "[ERROR][com.freerdp.core] - transport_connect: ERRCONNECT_LOGON_FAILURE [0x00020014]",
        );
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.retriable);
    }

    #[test]
    fn unreachable_server_is_transient() {
        let human = humanize_failure("ERRCONNECT_CONNECT_TRANSPORT_FAILED");
        assert_eq!(human.severity, Severity::Transient);
        assert!(human.retriable);
    }

    #[test]
    fn missing_binary_is_permanent() {
        let human = humanize_failure("No such file or directory (os error 2)");
        assert_eq!(human.severity, Severity::Permanent);
    }

    #[test]
    fn unknown_failure_keeps_detail() {
        let human = humanize_failure("something odd");
        assert!(human.suggestion.contains("something odd"));
    }

    #[test]
    fn admin_lock_is_action_required() {
        let human = humanize_error(&LauncherError::AdminLocked);
        assert_eq!(human.severity, Severity::ActionRequired);
    }

    #[test]
    fn permission_denied_is_permanent() {
        let err = LauncherError::Io(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert_eq!(humanize_error(&err).severity, Severity::Permanent);
    }
}
