//! Trustigo Dashboard CLI
//!
//! Renders each dashboard page as JSON and drives dataset ingestion, analysis
//! runs and CSV exports against the Trustigo fraud-scoring backend.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use serde::Serialize;

use trustigo_dashboard::cli::{Cli, Commands, ExportKind, ThemeAction};
use trustigo_dashboard::client::{FraudApi, HttpFraudApi};
use trustigo_dashboard::config::Config;
use trustigo_dashboard::error::ApiResult;
use trustigo_dashboard::services::ingestion::{DatasetFile, IngestionController, IngestionOutcome};
use trustigo_dashboard::services::{encode_financial_export, encode_user_export, views};
use trustigo_dashboard::settings::{detect_os_preference, FileSettingsStore, ThemeSettings};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize tracing; stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    let config = match cli.api_url.as_deref() {
        Some(url) => config.with_api_base_url(url)?,
        None => config,
    };

    tracing::debug!(
        api_base_url = %config.api_base_url,
        timeout_secs = config.request_timeout.as_secs(),
        "Configuration loaded"
    );

    let api = Arc::new(HttpFraudApi::new(config.clone()));

    match cli.command {
        Commands::Overview => {
            let (records, summary) =
                tokio::join!(api.list_risk_users(), api.get_analytics_summary());
            let overview = views::overview_view(&checked(records)?);

            // The financial panel is optional on the landing page
            let analytics = match summary {
                Ok(summary) => Some(views::analytics_view(&summary)),
                Err(e) => {
                    tracing::warn!(code = e.error_code(), error = %e, "Analytics summary unavailable");
                    None
                }
            };
            print_json(&serde_json::json!({ "overview": overview, "analytics": analytics }))
        }
        Commands::Users => {
            let records = checked(api.list_risk_users().await)?;
            print_json(&views::fraud_table_view(&records))
        }
        Commands::User { id } => {
            let detail = checked(api.get_user(id).await)?;
            print_json(&views::user_detail_view(&detail))
        }
        Commands::Analytics => {
            let summary = checked(api.get_analytics_summary().await)?;
            print_json(&views::analytics_view(&summary))
        }
        Commands::Alerts { limit } => {
            let alerts = checked(api.list_alerts(limit).await)?;
            print_json(&views::alerts_view(&alerts))
        }
        Commands::Upload { path } => {
            let file = DatasetFile::read(&path)
                .await
                .with_context(|| format!("Could not read {}", path.display()))?;
            let controller =
                IngestionController::new(api, config.accepted_upload_extensions.clone());
            report(controller.upload_dataset(file).await)
        }
        Commands::Analyze => {
            let controller =
                IngestionController::new(api, config.accepted_upload_extensions.clone());
            report(controller.run_analysis().await)
        }
        Commands::Export { kind, out } => {
            let document = match kind {
                ExportKind::Users => encode_user_export(&checked(api.list_risk_users().await)?),
                ExportKind::Financial => {
                    encode_financial_export(&checked(api.get_analytics_summary().await)?)
                }
            };
            let dir = out.unwrap_or_else(|| config.export_dir.clone());
            let path = document
                .write_to(&dir)
                .await
                .with_context(|| format!("Could not write export to {}", dir.display()))?;
            println!("{}", path.display());
            Ok(())
        }
        Commands::Theme { action } => {
            let store = FileSettingsStore::new(config.settings_path.clone());
            let settings = ThemeSettings::load(Box::new(store), detect_os_preference());
            let theme = match action {
                ThemeAction::Show => settings.current(),
                ThemeAction::Toggle => settings.toggle()?,
            };
            print_json(&serde_json::json!({ "theme": theme }))
        }
    }
}

/// Turn an API failure into an operator-facing error
fn checked<T>(result: ApiResult<T>) -> anyhow::Result<T> {
    result.map_err(|e| {
        tracing::error!(code = e.error_code(), error = %e, "Backend request failed");
        anyhow!(e.user_message())
    })
}

fn report(outcome: IngestionOutcome) -> anyhow::Result<()> {
    if outcome.is_success() {
        println!("{}", outcome.message());
        Ok(())
    } else {
        bail!(outcome.message())
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
