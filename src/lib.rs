//! Trustigo Dashboard Library
//!
//! Client core of the Trustigo return-fraud dashboard: the backend API client,
//! risk metrics, the ingestion workflow, CSV exports and page view-models.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod settings;
