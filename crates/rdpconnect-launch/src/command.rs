// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Settings tree to `xfreerdp` argument vector.
//
// Argument order is fixed: address, credentials, display, clipboard, then the
// certificate flag.  Sound, printer, smart-card, serial-port, drive and folder
// redirection are never passed to the client; `withheld_arguments` reports
// what they would have been so the launcher can log them.

use std::fmt;
use std::path::PathBuf;

use rdpconnect_core::config::Configuration;
use rdpconnect_core::types::{ClientVersion, LocalPrinter, PlaySound};

use crate::binary::ClientBinary;

/// Certificate-trust flag spelling, which changed in FreeRDP 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificatePolicy {
    /// `/cert-ignore`, FreeRDP 2 and earlier.
    Legacy,
    /// `/cert:ignore`, FreeRDP 3 and later.
    Modern,
}

impl CertificatePolicy {
    /// An unknown version is assumed to be current.
    pub fn for_version(version: Option<ClientVersion>) -> Self {
        match version {
            Some(v) if v.major < 3 => Self::Legacy,
            _ => Self::Modern,
        }
    }

    pub fn argument(&self) -> &'static str {
        match self {
            Self::Legacy => "/cert-ignore",
            Self::Modern => "/cert:ignore",
        }
    }
}

/// Client arguments for `config`.  Pure and deterministic.
pub fn build(config: &Configuration, version: Option<ClientVersion>) -> Vec<String> {
    let general = &config.general;
    let display = &config.display;
    let mut args = Vec::new();

    match general.port.filter(|p| *p != 0) {
        Some(port) => args.push(format!("/v:{}:{port}", general.server_address)),
        None => args.push(format!("/v:{}", general.server_address)),
    }

    if !general.username.is_empty() {
        args.push(format!("/u:{}", general.username));
    }
    if !general.domain.is_empty() {
        args.push(format!("/d:{}", general.domain));
    }
    if !general.password.is_empty() {
        args.push(format!("/p:{}", general.password));
    }

    if !display.resolution.is_empty() {
        args.push(format!("/size:{}", display.resolution));
    }
    if display.use_all_monitors {
        args.push("/multimon".into());
    }
    if display.start_fullscreen {
        args.push("/f".into());
    }
    if display.fit_to_window {
        args.push("/smart-sizing".into());
    }

    if config.redirect.clipboard {
        args.push("+clipboard".into());
    }

    args.push(CertificatePolicy::for_version(version).argument().into());
    args
}

/// Arguments the sound and device redirection settings map to for this
/// client version.  These are not part of [`build`]'s output.
pub fn withheld_arguments(
    config: &Configuration,
    version: Option<ClientVersion>,
    printers: &[LocalPrinter],
) -> Vec<String> {
    let legacy = CertificatePolicy::for_version(version) == CertificatePolicy::Legacy;
    let redirect = &config.redirect;
    let mut args = Vec::new();

    args.push(
        match (legacy, config.devices.play_sound) {
            (true, PlaySound::Never) => "/sound:off",
            (true, PlaySound::OnThisComputer) => "/sound:sys:alsa",
            (true, PlaySound::OnRemoteComputer) => "/sound:sys:rdpsnd",
            (false, PlaySound::Never) => "/audio-mode:2",
            (false, PlaySound::OnThisComputer) => "/audio-mode:0",
            (false, PlaySound::OnRemoteComputer) => "/audio-mode:1",
        }
        .into(),
    );

    if redirect.printers {
        if legacy {
            args.push("/printer".into());
        } else {
            for printer in printers {
                args.push(match &printer.driver {
                    Some(driver) => format!("/printer:{},{driver}", printer.name),
                    None => format!("/printer:{}", printer.name),
                });
            }
        }
    }
    if redirect.smart_cards {
        args.push(if legacy { "/smartcard" } else { "/smartcard:off" }.into());
    }
    if redirect.ports {
        args.push(if legacy { "/serial" } else { "/serial:off" }.into());
    }
    if redirect.drives {
        args.push(if legacy { "/drive:shared" } else { "/drive:off" }.into());
    }

    if config.folders.redirect {
        for folder in config.folders.folders.iter().filter(|f| f.enabled) {
            let name = std::path::Path::new(&folder.path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| folder.path.clone());
            args.push(format!("/drive:{name},{}", folder.path));
        }
    }

    args
}

/// A program and its arguments, ready to spawn.
///
/// `Display` masks the password argument, so a `CommandLine` can be logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(
        program: impl Into<PathBuf>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// The full client invocation for `config`.
    pub fn for_client(
        binary: &ClientBinary,
        config: &Configuration,
        version: Option<ClientVersion>,
    ) -> Self {
        Self {
            program: binary.path().to_path_buf(),
            args: build(config, version),
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.starts_with("/p:") {
                f.write_str(" /p:********")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdpconnect_core::types::FolderEntry;

    fn scenario() -> Configuration {
        let mut config = Configuration::defaults();
        config.general.server_address = "10.0.0.5".into();
        config.general.port = Some(3389);
        config.general.username = "bob".into();
        config.redirect.clipboard = true;
        config
    }

    #[test]
    fn freerdp3_scenario() {
        assert_eq!(
            build(&scenario(), Some(ClientVersion::new(3, 2, 0))),
            vec!["/v:10.0.0.5:3389", "/u:bob", "+clipboard", "/cert:ignore"]
        );
    }

    #[test]
    fn freerdp2_scenario() {
        assert_eq!(
            build(&scenario(), Some(ClientVersion::new(2, 9, 0))),
            vec!["/v:10.0.0.5:3389", "/u:bob", "+clipboard", "/cert-ignore"]
        );
    }

    #[test]
    fn address_without_port() {
        let mut config = scenario();
        config.general.port = None;
        assert_eq!(build(&config, None)[0], "/v:10.0.0.5");
        config.general.port = Some(0);
        assert_eq!(build(&config, None)[0], "/v:10.0.0.5");
    }

    #[test]
    fn full_argument_order() {
        let mut config = scenario();
        config.general.domain = "CORP".into();
        config.general.password = "hunter2".into();
        config.display.resolution = "1920x1080".into();
        config.display.use_all_monitors = true;
        config.display.start_fullscreen = true;
        config.display.fit_to_window = true;

        assert_eq!(
            build(&config, None),
            vec![
                "/v:10.0.0.5:3389",
                "/u:bob",
                "/d:CORP",
                "/p:hunter2",
                "/size:1920x1080",
                "/multimon",
                "/f",
                "/smart-sizing",
                "+clipboard",
                "/cert:ignore",
            ]
        );
    }

    #[test]
    fn certificate_flag_exactly_once() {
        for version in [
            None,
            Some(ClientVersion::new(0, 9, 0)),
            Some(ClientVersion::new(2, 11, 2)),
            Some(ClientVersion::new(3, 0, 0)),
            Some(ClientVersion::new(4, 1, 0)),
        ] {
            let args = build(&scenario(), version);
            let certs = args.iter().filter(|a| a.starts_with("/cert")).count();
            assert_eq!(certs, 1, "version {version:?}");
            assert_eq!(
                args.last().map(String::as_str),
                Some(CertificatePolicy::for_version(version).argument())
            );
        }
    }

    #[test]
    fn build_is_deterministic() {
        let config = scenario();
        let version = Some(ClientVersion::new(3, 5, 1));
        assert_eq!(build(&config, version), build(&config, version));
    }

    #[test]
    fn redirection_is_never_emitted() {
        let mut config = scenario();
        config.devices.play_sound = PlaySound::OnRemoteComputer;
        config.redirect.printers = true;
        config.redirect.smart_cards = true;
        config.redirect.ports = true;
        config.redirect.drives = true;
        config.folders.redirect = true;
        config.folders.folders.push(FolderEntry::new("/home/kiosk/Documents"));

        let args = build(&config, Some(ClientVersion::new(3, 2, 0)));
        assert_eq!(args, build(&scenario(), Some(ClientVersion::new(3, 2, 0))));
    }

    #[test]
    fn withheld_arguments_follow_client_generation() {
        let mut config = scenario();
        config.devices.play_sound = PlaySound::OnThisComputer;
        config.redirect.printers = true;
        config.redirect.drives = true;
        config.folders.redirect = true;
        config.folders.folders.push(FolderEntry::new("/srv/share"));
        config.folders.folders.push(FolderEntry {
            path: "/srv/private".into(),
            enabled: false,
        });
        let printers = [
            LocalPrinter {
                name: "Office".into(),
                driver: Some("HP LaserJet 400".into()),
            },
            LocalPrinter {
                name: "Label".into(),
                driver: None,
            },
        ];

        assert_eq!(
            withheld_arguments(&config, Some(ClientVersion::new(3, 2, 0)), &printers),
            vec![
                "/audio-mode:0",
                "/printer:Office,HP LaserJet 400",
                "/printer:Label",
                "/drive:off",
                "/drive:share,/srv/share",
            ]
        );
        assert_eq!(
            withheld_arguments(&config, Some(ClientVersion::new(2, 9, 0)), &printers),
            vec![
                "/sound:sys:alsa",
                "/printer",
                "/drive:shared",
                "/drive:share,/srv/share",
            ]
        );
    }

    #[test]
    fn display_masks_password() {
        let line = CommandLine::new(
            "xfreerdp",
            ["/v:host", "/u:bob", "/p:hunter2", "/cert:ignore"],
        );
        let shown = line.to_string();
        assert_eq!(shown, "xfreerdp /v:host /u:bob /p:******** /cert:ignore");
        assert!(!shown.contains("hunter2"));
    }

    #[test]
    fn command_line_for_client() {
        let line = CommandLine::for_client(
            &ClientBinary::new("/opt/freerdp/xfreerdp"),
            &scenario(),
            None,
        );
        assert_eq!(line.program, PathBuf::from("/opt/freerdp/xfreerdp"));
        assert_eq!(line.args.last().map(String::as_str), Some("/cert:ignore"));
    }
}
