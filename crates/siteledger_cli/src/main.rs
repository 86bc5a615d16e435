//! `siteledger` command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration from file, environment, then flags.
//! - Translate each subcommand into one `SiteRequest` and print the response.
//!
//! # Invariants
//! - Successful bodies go to stdout as pretty JSON; errors go to stderr.
//! - The exit code is derived from the response status only.

mod commands;

use clap::Parser;
use commands::{AccessPointCommand, Cli, Commands, GlobalOptions, SiteCommand};
use log::warn;
use serde_json::Value;
use siteledger_core::{
    handle, handle_json, init_logging, AccessPoint, BlobSiteRepository, BlobStore, CoreConfig,
    Site, SiteRequest, SiteResponse, SiteService,
};
use std::io::Read;
use std::process::ExitCode;

type Service = SiteService<BlobSiteRepository<Box<dyn BlobStore>>>;

const EXIT_IO: u8 = 1;
const EXIT_NOT_FOUND: u8 = 2;
const EXIT_ALREADY_EXISTS: u8 = 3;
const EXIT_VALIDATION: u8 = 4;
const EXIT_USAGE: u8 = 64;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(&cli.global) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("error: {message}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    if let Some(log_dir) = &config.log_dir {
        if let Err(err) = init_logging(&config.log_level, &log_dir.to_string_lossy()) {
            eprintln!("warning: file logging disabled: {err}");
        }
    }

    let store = match config.open_store() {
        Ok(store) => store,
        Err(err) => {
            warn!("event=store_open module=cli status=error error={err}");
            eprintln!("error: {err}");
            return ExitCode::from(EXIT_IO);
        }
    };
    let service = SiteService::new(BlobSiteRepository::new(store));

    let response = match run(&service, cli.command) {
        Ok(response) => response,
        Err(message) => {
            eprintln!("error: {message}");
            return ExitCode::from(EXIT_USAGE);
        }
    };
    report(&response)
}

fn resolve_config(global: &GlobalOptions) -> Result<CoreConfig, String> {
    let base = match &global.config {
        Some(path) => CoreConfig::load_from_file(path).map_err(|err| err.to_string())?,
        None => CoreConfig::default(),
    };
    let mut config = base.apply_env_overrides().map_err(|err| err.to_string())?;

    if let Some(dir) = &global.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(backend) = global.backend {
        config.backend = backend;
    }
    if let Some(level) = &global.log_level {
        config.log_level = level.clone();
    }
    if let Some(dir) = &global.log_dir {
        config.log_dir = Some(dir.clone());
    }
    Ok(config)
}

fn run(service: &Service, command: Commands) -> Result<SiteResponse, String> {
    let request = match command {
        Commands::Site(command) => match site_request(service, command) {
            Ok(request) => request,
            Err(response) => return Ok(response),
        },
        Commands::Ap(command) => access_point_request(command),
        Commands::Exec { request } => return exec(service, &request),
    };
    Ok(handle(service, &request))
}

fn site_request(service: &Service, command: SiteCommand) -> Result<SiteRequest, SiteResponse> {
    let request = match command {
        SiteCommand::List => SiteRequest::ListSites,
        SiteCommand::Get { name } => SiteRequest::GetSite { name },
        SiteCommand::Create {
            name,
            role,
            uri,
            access_points,
        } => {
            let site = access_points
                .into_iter()
                .fold(Site::new(name, role, uri), Site::with_access_point);
            SiteRequest::CreateSite { site }
        }
        SiteCommand::Edit { name, role, uri } => {
            // Omitted fields keep their stored values.
            let mut site = service
                .get_site(&name)
                .map_err(|err| SiteResponse::from_repo_error(&err))?;
            if let Some(role) = role {
                site.role = role;
            }
            if let Some(uri) = uri {
                site.uri = uri;
            }
            SiteRequest::EditSite { site }
        }
        SiteCommand::Delete { name } => SiteRequest::DeleteSite { name },
        SiteCommand::Rename { name, new_name } => SiteRequest::RenameSite { name, new_name },
    };
    Ok(request)
}

fn access_point_request(command: AccessPointCommand) -> SiteRequest {
    match command {
        AccessPointCommand::List { site } => SiteRequest::ListAccessPoints { site },
        AccessPointCommand::Get { site, label } => SiteRequest::GetAccessPoint { site, label },
        AccessPointCommand::Upsert { site, label, url } => SiteRequest::UpsertAccessPoint {
            site,
            access_point: AccessPoint::new(label, url),
        },
        AccessPointCommand::Create { site, label, url } => SiteRequest::CreateAccessPoint {
            site,
            access_point: AccessPoint::new(label, url),
        },
        AccessPointCommand::Update { site, label, url } => SiteRequest::UpdateAccessPoint {
            site,
            access_point: AccessPoint::new(label, url),
        },
        AccessPointCommand::Delete { site, label } => {
            SiteRequest::DeleteAccessPoint { site, label }
        }
    }
}

fn exec(service: &Service, request: &str) -> Result<SiteResponse, String> {
    if request == "-" {
        let mut input = Vec::new();
        std::io::stdin()
            .read_to_end(&mut input)
            .map_err(|err| format!("failed to read request from stdin: {err}"))?;
        return Ok(handle_json(service, &input));
    }
    Ok(handle_json(service, request.as_bytes()))
}

fn report(response: &SiteResponse) -> ExitCode {
    if response.is_success() {
        match serde_json::to_string_pretty(&response.body) {
            Ok(text) => println!("{text}"),
            Err(err) => {
                eprintln!("error: failed to render response: {err}");
                return ExitCode::from(EXIT_IO);
            }
        }
        return ExitCode::SUCCESS;
    }

    let message = match &response.body["error"] {
        Value::String(message) => message.clone(),
        other => other.to_string(),
    };
    eprintln!("error: {message}");
    ExitCode::from(exit_code_for_status(response.status))
}

fn exit_code_for_status(status: u16) -> u8 {
    match status {
        404 => EXIT_NOT_FOUND,
        409 => EXIT_ALREADY_EXISTS,
        400 => EXIT_VALIDATION,
        _ => EXIT_IO,
    }
}

#[cfg(test)]
mod tests {
    use super::{exit_code_for_status, resolve_config};
    use crate::commands::GlobalOptions;
    use siteledger_core::StoreBackend;
    use std::path::PathBuf;

    #[test]
    fn exit_codes_follow_status() {
        assert_eq!(exit_code_for_status(404), 2);
        assert_eq!(exit_code_for_status(409), 3);
        assert_eq!(exit_code_for_status(400), 4);
        assert_eq!(exit_code_for_status(500), 1);
    }

    #[test]
    fn flags_override_defaults() {
        let global = GlobalOptions {
            data_dir: Some(PathBuf::from("/srv/flag")),
            backend: Some(StoreBackend::Sqlite),
            log_level: Some("warn".to_string()),
            ..GlobalOptions::default()
        };

        let config = resolve_config(&global).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/flag"));
        assert_eq!(config.backend, StoreBackend::Sqlite);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let global = GlobalOptions {
            config: Some(PathBuf::from("/definitely/not/here.toml")),
            ..GlobalOptions::default()
        };
        assert!(resolve_config(&global).unwrap_err().contains("failed to read"));
    }
}
