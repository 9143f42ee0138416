use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::client::DEFAULT_ALERT_LIMIT;

#[derive(Parser, Debug)]
#[command(name = "trustigo")]
#[command(about = "Return-fraud dashboard for the Trustigo scoring backend", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Backend base URL (overrides API_BASE_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// KPIs, score distribution and the top elevated-risk users
    Overview,

    /// Every Medium or High risk user, riskiest first
    Users,

    /// Detail page for one user
    User {
        /// User id
        id: i64,
    },

    /// Financial impact summary
    Analytics,

    /// Most recent fraud alerts
    Alerts {
        /// Number of alerts to fetch
        #[arg(short, long, default_value_t = DEFAULT_ALERT_LIMIT)]
        limit: u32,
    },

    /// Upload a transaction dataset, then score and refresh
    Upload {
        /// Dataset file
        path: PathBuf,
    },

    /// Re-run fraud analysis on the stored data
    Analyze,

    /// Write a CSV export
    Export {
        #[arg(value_enum)]
        kind: ExportKind,

        /// Output directory (defaults to EXPORT_DIR)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show or toggle the display theme
    Theme {
        #[arg(value_enum, default_value = "show")]
        action: ThemeAction,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportKind {
    /// User risk listing
    Users,
    /// Financial impact report
    Financial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeAction {
    Show,
    Toggle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_alerts_default_limit() {
        let cli = Cli::parse_from(["trustigo", "alerts"]);
        assert!(matches!(cli.command, Commands::Alerts { limit: 20 }));
    }

    #[test]
    fn test_parse_export_with_out_dir() {
        let cli = Cli::parse_from(["trustigo", "export", "financial", "--out", "/tmp/reports"]);
        match cli.command {
            Commands::Export { kind, out } => {
                assert_eq!(kind, ExportKind::Financial);
                assert_eq!(out, Some(PathBuf::from("/tmp/reports")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_theme_defaults_to_show() {
        let cli = Cli::parse_from(["trustigo", "theme"]);
        assert!(matches!(cli.command, Commands::Theme { action: ThemeAction::Show }));
    }

    #[test]
    fn test_global_api_url() {
        let cli = Cli::parse_from(["trustigo", "user", "42", "--api-url", "http://backend:9000"]);
        assert_eq!(cli.api_url.as_deref(), Some("http://backend:9000"));
        assert!(matches!(cli.command, Commands::User { id: 42 }));
    }
}
