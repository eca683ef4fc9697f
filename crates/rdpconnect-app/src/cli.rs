// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rdpconnect_core::config::Category;
use rdpconnect_core::types::LoginPrompt;
use serde_json::Value;

#[derive(Debug, Parser)]
#[command(name = "rdpconnect", version)]
#[command(about = "Kiosk-style launcher for the FreeRDP remote desktop client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings directory (default: <install root>/config)
    #[arg(long, global = true, env = "RDPCONNECT_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// FreeRDP client executable (default: RDPCONNECT_CLIENT, then xfreerdp)
    #[arg(long, global = true)]
    pub client: Option<PathBuf>,

    /// Administration password, required for edits when one is configured
    #[arg(long, global = true, env = "RDPCONNECT_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the settings (passwords masked)
    Show,
    /// Change one setting and save its category
    Set {
        /// Category name, e.g. General
        #[arg(value_parser = parse_category)]
        category: Category,
        /// Option name, e.g. "Server Address"
        option: String,
        /// JSON value; anything that is not valid JSON is taken as a string
        #[arg(value_parser = parse_value)]
        value: Value,
    },
    /// Edit the redirected folder list
    Folders {
        #[command(subcommand)]
        action: FolderCommand,
    },
    /// Copy an image into the settings directory and use it as the logo
    Logo { file: PathBuf },
    /// Write all settings, with the logo embedded, to one file
    Export { file: PathBuf },
    /// Replace settings from an exported file
    Import { file: PathBuf },
    /// List local printers that could be redirected
    Printers,
    /// Print the client command line (password masked)
    Command(LoginArgs),
    /// Start the client and wait for it; Ctrl-C cancels
    Connect(LoginArgs),
}

#[derive(Debug, Subcommand)]
pub enum FolderCommand {
    Add { path: String },
    Remove { path: String },
    Enable { path: String },
    Disable { path: String },
}

/// Values for login fields the settings leave blank.
#[derive(Debug, Clone, Default, Args)]
pub struct LoginArgs {
    #[arg(long)]
    pub server: Option<String>,
    #[arg(long)]
    pub port: Option<u32>,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long, env = "RDPCONNECT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    #[arg(long)]
    pub domain: Option<String>,
}

impl From<LoginArgs> for LoginPrompt {
    fn from(args: LoginArgs) -> Self {
        Self {
            server_address: args.server,
            port: args.port,
            username: args.username,
            password: args.password,
            domain: args.domain,
        }
    }
}

fn parse_category(s: &str) -> Result<Category, String> {
    s.parse().map_err(|e: rdpconnect_core::LauncherError| e.to_string())
}

fn parse_value(s: &str) -> Result<Value, String> {
    Ok(serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_owned())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn set_parses_json_or_falls_back_to_string() {
        let cli = Cli::try_parse_from(["rdpconnect", "set", "general", "Port", "3390"]).unwrap();
        match cli.command {
            Commands::Set {
                category,
                option,
                value,
            } => {
                assert_eq!(category, Category::General);
                assert_eq!(option, "Port");
                assert_eq!(value, json!(3390));
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli =
            Cli::try_parse_from(["rdpconnect", "set", "General", "Server Address", "10.0.0.5"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Set { value: Value::String(ref s), .. } if s == "10.0.0.5"
        ));
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert!(Cli::try_parse_from(["rdpconnect", "set", "Network", "Proxy", "x"]).is_err());
    }

    #[test]
    fn login_overrides_map_to_prompt() {
        let cli = Cli::try_parse_from([
            "rdpconnect",
            "connect",
            "--server",
            "rds.example",
            "--port",
            "3390",
            "--username",
            "bob",
        ])
        .unwrap();
        let Commands::Connect(args) = cli.command else {
            panic!("expected connect");
        };
        let prompt = LoginPrompt::from(args);
        assert_eq!(prompt.server_address.as_deref(), Some("rds.example"));
        assert_eq!(prompt.port, Some(3390));
        assert_eq!(prompt.username.as_deref(), Some("bob"));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "rdpconnect",
            "folders",
            "add",
            "/srv/share",
            "--config-dir",
            "/etc/rdpconnect",
        ])
        .unwrap();
        assert_eq!(cli.config_dir, Some(PathBuf::from("/etc/rdpconnect")));
        assert!(matches!(
            cli.command,
            Commands::Folders {
                action: FolderCommand::Add { ref path }
            } if path == "/srv/share"
        ));
    }
}
