//! Dashboard logic built on top of the API client

pub mod export;
pub mod ingestion;
pub mod metrics;
pub mod risk_classifier;
pub mod views;

pub use export::{encode_financial_export, encode_user_export, ExportDocument};
pub use ingestion::{DatasetFile, IngestionController, IngestionOutcome, IngestionPhase};
pub use metrics::{aggregate, RiskMetrics};
pub use risk_classifier::{classify, RiskClassification, RiskTier};
