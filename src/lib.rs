pub mod ai;
pub mod config;
pub mod models;
pub mod scan;
pub mod sensors;

use std::sync::Arc;

use futures::stream;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ai::gemini::CREDENTIAL_PROVIDER;
use ai::{CredentialManager, GeminiClient};
use config::{AppConfig, ConfigError};
use scan::{ScanController, ScanSnapshot, ScanState};
use sensors::{FixedLocation, OrientationReading};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to render snapshot: {0}")]
    Render(#[from] serde_json::Error),
    #[error("credential store: {0}")]
    Credential(String),
    #[error("usage: kebab-compass [scan | key set <api-key> | key delete | key status] ({0})")]
    Usage(String),
}

/// What the binary was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Acquire a fix, scan once and print the snapshot
    Scan,
    /// Save the Gemini key in the OS keychain
    KeySet(String),
    KeyDelete,
    KeyStatus,
}

impl Command {
    /// Parse arguments without the program name
    pub fn parse<I>(args: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = String>,
    {
        let args: Vec<String> = args.into_iter().collect();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        match args.as_slice() {
            [] | ["scan"] => Ok(Self::Scan),
            ["key", "set", key] if !key.trim().is_empty() => Ok(Self::KeySet(key.trim().to_string())),
            ["key", "set", ..] => Err(AppError::Usage("key set needs exactly one non-empty key".to_string())),
            ["key", "delete"] => Ok(Self::KeyDelete),
            ["key", "status"] => Ok(Self::KeyStatus),
            other => Err(AppError::Usage(format!("unrecognized arguments: {}", other.join(" ")))),
        }
    }
}

/// Run a `key` subcommand against a keychain entry, returning the line to print
pub fn run_key_command(command: &Command, provider: &str) -> Result<String, AppError> {
    match command {
        Command::KeySet(key) => {
            CredentialManager::store_api_key(provider, key).map_err(AppError::Credential)?;
            info!(provider, "API key stored");
            Ok(format!("Stored API key for {}", provider))
        }
        Command::KeyDelete => {
            CredentialManager::delete_api_key(provider).map_err(AppError::Credential)?;
            info!(provider, "API key deleted");
            Ok(format!("Deleted API key for {}", provider))
        }
        Command::KeyStatus => Ok(if CredentialManager::has_api_key(provider) {
            format!("API key for {} is configured", provider)
        } else {
            format!("No API key stored for {}", provider)
        }),
        Command::Scan => Err(AppError::Usage("scan is not a key command".to_string())),
    }
}

/// Initialize tracing with the RUST_LOG env filter
pub fn init_tracing() {
    // Default: warn for most crates, info for ours (scan lifecycle visible)
    // Use RUST_LOG=debug for per-request logs
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,kebab_compass=info")),
        )
        .try_init();
}

/// Load `.env` from the current directory, falling back to the parent
pub fn load_dotenv() {
    if dotenvy::dotenv().is_err() {
        let _ = dotenvy::from_path("../.env");
    }
}

/// Run one headless session: acquire a fix, scan once, return the final frame
pub async fn run_session(config: AppConfig) -> ScanSnapshot {
    let location = Arc::new(FixedLocation::new(config.fixed_location));
    let query = Arc::new(GeminiClient::new(config.gemini));
    let controller = Arc::new(ScanController::new(location, query, config.scan));

    if let Some(heading) = config.fixed_heading {
        let readings = stream::iter([OrientationReading::from_compass(heading)]);
        if let Err(e) = controller.follow_orientation(readings).await {
            warn!(error = %e, "Orientation task failed");
        }
    }

    if controller.start().await == ScanState::Idle {
        match controller.scan().await {
            Ok(state) => info!(?state, "Scan finished"),
            Err(rejected) => warn!(%rejected, "Scan refused"),
        }
    }

    controller.snapshot()
}

/// Headless entry point.
///
/// `scan` (the default) prints the final snapshot as JSON; `key ...` manages
/// the stored Gemini credential.
pub async fn run<I>(args: I) -> Result<(), AppError>
where
    I: IntoIterator<Item = String>,
{
    load_dotenv();
    init_tracing();

    let command = Command::parse(args)?;
    if command != Command::Scan {
        println!("{}", run_key_command(&command, CREDENTIAL_PROVIDER)?);
        return Ok(());
    }

    let config = AppConfig::from_env()?;
    if config.fixed_location.is_none() {
        warn!("KEBAB_LATITUDE/KEBAB_LONGITUDE not set, no position available");
    }

    let snapshot = run_session(config).await;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinates;
    use crate::scan::MessageKind;

    #[tokio::test]
    async fn test_session_without_position_reports_fault() {
        let snapshot = run_session(AppConfig::default()).await;

        assert_eq!(snapshot.state, ScanState::Error);
        let message = snapshot.message.unwrap();
        assert_eq!(message.kind, MessageKind::Error);
        assert_eq!(message.text, "GEOLOCATION HARDWARE NOT FOUND.");
    }

    #[tokio::test]
    async fn test_session_with_unreachable_api_fails_scan() {
        let mut config = AppConfig::default();
        config.fixed_location = Some(Coordinates::new(52.52, 13.405));
        config.fixed_heading = Some(90.0);
        config.scan.lead_in = std::time::Duration::ZERO;
        config.gemini.base_url = "http://127.0.0.1:9".to_string();
        config.gemini.api_key = Some("invalid".to_string());

        let snapshot = run_session(config).await;

        assert_eq!(snapshot.state, ScanState::Error);
        assert_eq!(snapshot.heading, 90.0);
        assert!(snapshot.fix.is_some());
        assert_eq!(
            snapshot.message.unwrap().text,
            "COMMS LINK FAILED (API ERROR)."
        );
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse(args(&[])).unwrap(), Command::Scan);
        assert_eq!(Command::parse(args(&["scan"])).unwrap(), Command::Scan);
        assert_eq!(
            Command::parse(args(&["key", "set", " AIza-123 "])).unwrap(),
            Command::KeySet("AIza-123".to_string())
        );
        assert_eq!(Command::parse(args(&["key", "delete"])).unwrap(), Command::KeyDelete);
        assert_eq!(Command::parse(args(&["key", "status"])).unwrap(), Command::KeyStatus);
    }

    #[test]
    fn test_parse_rejects_bad_arguments() {
        assert!(matches!(Command::parse(args(&["key", "set"])), Err(AppError::Usage(_))));
        assert!(matches!(Command::parse(args(&["key", "set", "  "])), Err(AppError::Usage(_))));
        assert!(matches!(Command::parse(args(&["launch"])), Err(AppError::Usage(_))));
    }

    #[test]
    fn test_key_commands_manage_stored_credential() {
        let provider = format!("kebab-compass-test-{}", uuid::Uuid::new_v4());

        let status = run_key_command(&Command::KeyStatus, &provider).unwrap();
        assert!(status.starts_with("No API key"));

        run_key_command(&Command::KeySet("cli-secret".to_string()), &provider).unwrap();
        let status = run_key_command(&Command::KeyStatus, &provider).unwrap();
        assert!(status.ends_with("is configured"));
        assert_eq!(
            CredentialManager::resolve_api_key(&provider, None).as_deref(),
            Some("cli-secret")
        );

        run_key_command(&Command::KeyDelete, &provider).unwrap();
        let status = run_key_command(&Command::KeyStatus, &provider).unwrap();
        assert!(status.starts_with("No API key"));
    }

    #[test]
    fn test_scan_is_not_a_key_command() {
        assert!(matches!(
            run_key_command(&Command::Scan, "gemini"),
            Err(AppError::Usage(_))
        ));
    }
}
