//! cfv - Rackspace Cloud Files viewer
//!
//! Logs in with the credentials from a user file, then browses data
//! centers, networks, containers and objects through numbered menus.

mod browser;
mod exit_code;
mod output;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cf_core::{
    ConfigManager, Error, HttpTransport, Settings, UserProfile, format_expiration, parse_expiration,
};
use cf_files::{Authenticator, FilesClient, ReqwestTransport};

use crate::browser::{Browser, Prompt};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Rackspace Cloud Files viewer
#[derive(Parser, Debug)]
#[command(name = "cfv", version, about)]
struct Cli {
    /// JSON file with "user", "apikey" and "request-limit"
    #[arg(long, value_name = "FILE")]
    user: PathBuf,

    /// Settings file (TOML); defaults to the platform config directory
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory downloads are written to
    #[arg(long, value_name = "DIR")]
    download_dir: Option<PathBuf>,

    /// Retry a download without certificate validation after a TLS error
    #[arg(long)]
    allow_insecure_fallback: bool,

    /// Log filter directives, e.g. "cf_files=debug"
    #[arg(long, value_name = "FILTER", env = "RUST_LOG", default_value = "warn")]
    log_filter: String,

    /// Disable colors
    #[arg(long)]
    no_color: bool,

    /// Hide the download progress bar
    #[arg(long)]
    no_progress: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_filter);
    run(cli).await.into()
}

fn init_tracing(directives: &str) {
    let filter = EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let manager = match path {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };
    manager
        .load()
        .with_context(|| format!("Failed to load settings from {}", manager.path().display()))
}

async fn run(cli: Cli) -> ExitCode {
    let formatter = Formatter::new(OutputConfig {
        no_color: cli.no_color,
        no_progress: cli.no_progress,
    });
    if !formatter.colors_enabled() {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let profile = match UserProfile::load(&cli.user) {
        Ok(p) => p,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::UsageError;
        }
    };

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            formatter.error(&format!("{e:#}"));
            return ExitCode::UsageError;
        }
    };

    let mut storage = settings.storage.clone();
    storage.allow_insecure_fallback |= cli.allow_insecure_fallback;
    if storage.allow_insecure_fallback {
        formatter.warning("Certificate validation may be disabled for downloads after a TLS error");
    }

    let transport: Arc<dyn HttpTransport> =
        match ReqwestTransport::new(storage.allow_insecure_fallback) {
            Ok(t) => Arc::new(t),
            Err(e) => {
                formatter.error(&e.to_string());
                return ExitCode::NetworkError;
            }
        };

    println!("Logging into CloudFiles...");
    println!("\tUser: {}", formatter.style_name(&profile.user));

    let auth = Authenticator::new(
        profile.credentials(),
        settings.identity.clone(),
        transport.clone(),
    )
    .with_service_name(storage.service_name.clone());

    match auth.get_token(settings.identity.retry_budget).await {
        Ok(token) if !token.is_empty() => {
            let expires = parse_expiration(&auth.expiration_time().await)
                .map(format_expiration)
                .unwrap_or_default();
            println!("{}", formatter.success(&format!("Token valid until {expires} UTC")));
        }
        Ok(_) | Err(Error::AuthenticationFailed { .. }) => {
            formatter.error("Invalid API Key or User Name");
            return ExitCode::AuthError;
        }
        Err(e) => {
            formatter.error(&format!("Authentication failed: {e}"));
            return ExitCode::AuthError;
        }
    }

    let download_dir = cli
        .download_dir
        .or_else(|| storage.download_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let client = FilesClient::from_settings(&storage, Arc::new(auth), transport);

    let prompt = Prompt::new(io::stdin().lock(), io::stdout());
    let mut browser = Browser::new(&client, prompt, formatter.clone())
        .with_page_limit(profile.page_limit())
        .with_download_dir(download_dir);

    match browser.run().await {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            formatter.error(&format!("Terminal I/O failed: {e}"));
            ExitCode::GeneralError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_requires_user_file() {
        assert!(Cli::try_parse_from(["cfv"]).is_err());

        let cli = Cli::try_parse_from(["cfv", "--user", "me.json", "--allow-insecure-fallback"])
            .unwrap();
        assert_eq!(cli.user, PathBuf::from("me.json"));
        assert!(cli.allow_insecure_fallback);
    }

    #[test]
    fn test_load_settings_from_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[storage]\nblock_size = 1024\n").unwrap();

        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.storage.block_size, 1024);
        assert!(settings.identity.ssl);

        let missing = load_settings(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(missing, Settings::default());
    }

    #[test]
    fn test_load_settings_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[storage\n").unwrap();

        let err = load_settings(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("settings.toml"));
    }
}
