//! CLI command definitions.

use clap::{Args, Parser, Subcommand};
use siteledger_core::{AccessPoint, StoreBackend};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "siteledger")]
#[command(about = "Manage sites and their access points", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Default)]
pub struct GlobalOptions {
    /// TOML config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding site records (overrides config and environment)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Storage backend (file, sqlite)
    #[arg(long, global = true, value_parser = parse_backend)]
    pub backend: Option<StoreBackend>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off without one
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Site operations
    #[command(subcommand)]
    Site(SiteCommand),

    /// Access point operations
    #[command(subcommand)]
    Ap(AccessPointCommand),

    /// Run one JSON-encoded request (`-` reads it from stdin)
    Exec {
        #[arg(value_name = "REQUEST_JSON")]
        request: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum SiteCommand {
    /// List all sites
    List,

    /// Show one site
    Get { name: String },

    /// Create a site
    Create {
        name: String,

        #[arg(long, default_value = "")]
        role: String,

        #[arg(long, default_value = "")]
        uri: String,

        /// Initial access point as LABEL=URL (repeatable)
        #[arg(long = "access-point", value_name = "LABEL=URL", value_parser = parse_access_point)]
        access_points: Vec<AccessPoint>,
    },

    /// Change role and/or uri; access points are never touched
    Edit {
        name: String,

        #[arg(long)]
        role: Option<String>,

        #[arg(long)]
        uri: Option<String>,
    },

    /// Delete a site
    Delete { name: String },

    /// Move a site to a new name
    Rename { name: String, new_name: String },
}

#[derive(Subcommand, Debug)]
pub enum AccessPointCommand {
    /// List a site's access points
    List { site: String },

    /// Show one access point
    Get { site: String, label: String },

    /// Create or replace an access point
    Upsert {
        site: String,
        label: String,
        url: String,
    },

    /// Create an access point; fails if the label exists
    Create {
        site: String,
        label: String,
        url: String,
    },

    /// Replace an access point url; fails if the label is missing
    Update {
        site: String,
        label: String,
        url: String,
    },

    /// Delete an access point
    Delete { site: String, label: String },
}

fn parse_backend(value: &str) -> Result<StoreBackend, String> {
    value.parse().map_err(|err| format!("{err}"))
}

fn parse_access_point(value: &str) -> Result<AccessPoint, String> {
    match value.split_once('=') {
        Some((label, url)) if !label.is_empty() => Ok(AccessPoint::new(label, url)),
        _ => Err(format!("expected LABEL=URL, got `{value}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_access_point, parse_backend, Cli, Commands, SiteCommand};
    use clap::{CommandFactory, Parser};
    use siteledger_core::{AccessPoint, StoreBackend};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_access_point_splits_on_first_equals() {
        assert_eq!(
            parse_access_point("api=http://a?x=1").unwrap(),
            AccessPoint::new("api", "http://a?x=1")
        );
        assert!(parse_access_point("=http://a").is_err());
        assert!(parse_access_point("api").is_err());
    }

    #[test]
    fn parse_backend_is_case_insensitive() {
        assert_eq!(parse_backend("SQLite").unwrap(), StoreBackend::Sqlite);
        assert!(parse_backend("tape").is_err());
    }

    #[test]
    fn create_collects_repeated_access_points() {
        let cli = Cli::parse_from([
            "siteledger",
            "--data-dir",
            "/tmp/x",
            "site",
            "create",
            "acme",
            "--access-point",
            "api=http://a",
            "--access-point",
            "web=http://w",
        ]);

        match cli.command {
            Commands::Site(SiteCommand::Create { access_points, .. }) => {
                assert_eq!(access_points.len(), 2);
                assert_eq!(access_points[1].label, "web");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
