//! Dataset ingestion workflow
//!
//! Upload a dataset, have the backend re-score every user, then reload the
//! listing. Each stage that can fail ends the run with its own outcome so the
//! operator knows whether to retry the upload or only the analysis.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::broadcast;

use crate::client::FraudApi;
use crate::error::ApiError;
use crate::models::{UploadStats, UserRiskRecord};

/// Shown when an upload fails without a server-provided reason
pub const UPLOAD_FAILED_MESSAGE: &str = "Failed to upload CSV.";

/// Shown when a stand-alone analysis run fails
pub const ANALYSIS_FAILED_MESSAGE: &str =
    "Failed to run analysis. Make sure the backend is running.";

/// A dataset picked by the operator
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl DatasetFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a dataset from disk, keeping only the file name for the upload
    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, bytes })
    }

    /// Lowercase extension including the leading dot
    pub fn extension(&self) -> Option<String> {
        let dot = self.file_name.rfind('.')?;
        Some(self.file_name[dot..].to_lowercase())
    }
}

/// Where the ingestion pipeline currently is
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IngestionPhase {
    Idle,
    Uploading,
    UploadFailed,
    Uploaded,
    Analyzing,
    AnalysisFailed,
    Refreshing,
    RefreshFailed,
    Complete,
}

impl IngestionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestionPhase::Idle => "idle",
            IngestionPhase::Uploading => "uploading",
            IngestionPhase::UploadFailed => "upload_failed",
            IngestionPhase::Uploaded => "uploaded",
            IngestionPhase::Analyzing => "analyzing",
            IngestionPhase::AnalysisFailed => "analysis_failed",
            IngestionPhase::Refreshing => "refreshing",
            IngestionPhase::RefreshFailed => "refresh_failed",
            IngestionPhase::Complete => "complete",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            IngestionPhase::UploadFailed
                | IngestionPhase::AnalysisFailed
                | IngestionPhase::RefreshFailed
        )
    }
}

/// How an ingestion or analysis request ended
#[derive(Debug, Clone, PartialEq)]
pub enum IngestionOutcome {
    /// Analysis ran and the listing was reloaded
    Complete {
        upload: Option<UploadStats>,
        records: Vec<UserRiskRecord>,
        message: String,
    },
    /// Refused locally before any request was made
    Rejected(ApiError),
    /// Another upload or analysis run is still in flight
    Busy,
    UploadFailed {
        error: ApiError,
        message: String,
    },
    /// Scoring did not run; any uploaded data is already stored
    AnalysisFailed {
        upload: Option<UploadStats>,
        error: ApiError,
        message: String,
    },
    /// Scoring ran but the listing could not be reloaded
    RefreshFailed {
        error: ApiError,
        message: String,
    },
}

impl IngestionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, IngestionOutcome::Complete { .. })
    }

    pub fn message(&self) -> String {
        match self {
            IngestionOutcome::Complete { message, .. }
            | IngestionOutcome::UploadFailed { message, .. }
            | IngestionOutcome::AnalysisFailed { message, .. }
            | IngestionOutcome::RefreshFailed { message, .. } => message.clone(),
            IngestionOutcome::Rejected(error) => error.user_message(),
            IngestionOutcome::Busy => {
                "An upload or analysis run is already in progress.".to_string()
            }
        }
    }
}

/// Notice shown once the backend has stored the upload
pub fn upload_notice(stats: &UploadStats) -> String {
    format!(
        "CSV Uploaded! {} new users, {} transactions added. Running analysis next...",
        stats.new_users, stats.new_transactions
    )
}

/// Runs uploads and analysis runs one at a time
pub struct IngestionController {
    api: Arc<dyn FraudApi>,
    accepted_extensions: Vec<String>,
    busy: AtomicBool,
    phase: Mutex<IngestionPhase>,
    events: broadcast::Sender<IngestionPhase>,
}

/// Releases the busy flag and parks the controller in Idle, even if the
/// running future is dropped part-way.
struct BusyGuard<'a> {
    controller: &'a IngestionController,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.controller.release();
    }
}

impl IngestionController {
    pub fn new(api: Arc<dyn FraudApi>, accepted_extensions: Vec<String>) -> Self {
        let (events, _rx) = broadcast::channel(32);
        Self {
            api,
            accepted_extensions,
            busy: AtomicBool::new(false),
            phase: Mutex::new(IngestionPhase::Idle),
            events,
        }
    }

    /// Receive every phase transition from now on
    pub fn subscribe(&self) -> broadcast::Receiver<IngestionPhase> {
        self.events.subscribe()
    }

    pub fn phase(&self) -> IngestionPhase {
        *self.phase.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Check the file type locally; nothing is sent for a rejected file
    pub fn validate(&self, file: &DatasetFile) -> Result<(), ApiError> {
        let accepted = file
            .extension()
            .map(|ext| self.accepted_extensions.iter().any(|a| *a == ext))
            .unwrap_or(false);

        if accepted {
            Ok(())
        } else {
            Err(ApiError::ValidationError(format!(
                "Please upload a valid {} file.",
                self.accepted_extensions
                    .iter()
                    .map(|ext| ext.trim_start_matches('.').to_uppercase())
                    .collect::<Vec<_>>()
                    .join("/")
            )))
        }
    }

    /// Upload a dataset, then analyze and refresh without further input
    pub async fn upload_dataset(&self, file: DatasetFile) -> IngestionOutcome {
        let Some(_guard) = self.try_begin() else {
            tracing::warn!(file_name = %file.file_name, "Upload ignored, pipeline busy");
            return IngestionOutcome::Busy;
        };

        if let Err(error) = self.validate(&file) {
            tracing::warn!(file_name = %file.file_name, "Rejected dataset with unsupported extension");
            return IngestionOutcome::Rejected(error);
        }

        self.transition(IngestionPhase::Uploading);
        let stats = match self.api.upload_dataset(&file.file_name, file.bytes).await {
            Ok(response) => response.stats,
            Err(error) => {
                self.transition(IngestionPhase::UploadFailed);
                let message = error
                    .server_detail()
                    .map(str::to_string)
                    .unwrap_or_else(|| UPLOAD_FAILED_MESSAGE.to_string());
                tracing::error!(error = %error, code = %error.error_code(), "Dataset upload failed");
                return IngestionOutcome::UploadFailed { error, message };
            }
        };

        self.transition(IngestionPhase::Uploaded);
        tracing::info!(
            new_users = stats.new_users,
            new_transactions = stats.new_transactions,
            "{}",
            upload_notice(&stats)
        );

        // Ingesting implies re-scoring
        self.analyze_and_refresh(Some(stats)).await
    }

    /// Re-score every user and reload the listing
    pub async fn run_analysis(&self) -> IngestionOutcome {
        let Some(_guard) = self.try_begin() else {
            tracing::warn!("Analysis run ignored, pipeline busy");
            return IngestionOutcome::Busy;
        };

        self.analyze_and_refresh(None).await
    }

    async fn analyze_and_refresh(&self, upload: Option<UploadStats>) -> IngestionOutcome {
        self.transition(IngestionPhase::Analyzing);
        let run = match self.api.trigger_analysis_run().await {
            Ok(run) => run,
            Err(error) => {
                self.transition(IngestionPhase::AnalysisFailed);
                tracing::error!(error = %error, code = %error.error_code(), "Fraud analysis failed");
                let message = analysis_failed_message(upload.as_ref(), &error);
                return IngestionOutcome::AnalysisFailed {
                    upload,
                    error,
                    message,
                };
            }
        };

        self.transition(IngestionPhase::Refreshing);
        match self.api.list_risk_users().await {
            Ok(records) => {
                self.transition(IngestionPhase::Complete);
                let message = complete_message(upload.as_ref(), run.message.as_deref(), records.len());
                IngestionOutcome::Complete {
                    upload,
                    records,
                    message,
                }
            }
            Err(error) => {
                self.transition(IngestionPhase::RefreshFailed);
                tracing::error!(error = %error, "Listing refresh after analysis failed");
                let message = format!(
                    "Fraud analysis completed but the user listing could not be reloaded: {}",
                    error.user_message()
                );
                IngestionOutcome::RefreshFailed { error, message }
            }
        }
    }

    fn try_begin(&self) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard { controller: self })
    }

    fn transition(&self, next: IngestionPhase) {
        let mut phase = self.phase.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.publish(&mut *phase, next);
    }

    /// Clear the busy flag and park in Idle as one step under the phase lock,
    /// so a run started right after cannot publish ahead of this Idle.
    fn release(&self) {
        let mut phase = self.phase.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.busy.store(false, Ordering::Release);
        self.publish(&mut *phase, IngestionPhase::Idle);
    }

    /// Caller holds the phase lock
    fn publish(&self, phase: &mut IngestionPhase, next: IngestionPhase) {
        let previous = std::mem::replace(phase, next);
        if previous == next {
            return;
        }

        if next.is_failure() {
            tracing::warn!(from = previous.as_str(), to = next.as_str(), "Ingestion phase changed");
        } else {
            tracing::debug!(from = previous.as_str(), to = next.as_str(), "Ingestion phase changed");
        }
        // No subscribers is fine
        let _ = self.events.send(next);
    }
}

fn analysis_failed_message(upload: Option<&UploadStats>, error: &ApiError) -> String {
    match upload {
        Some(stats) => format!(
            "Dataset stored ({} new users, {} transactions) but fraud analysis did not run: {} Retry the analysis only; the upload does not need to be repeated.",
            stats.new_users,
            stats.new_transactions,
            error.user_message()
        ),
        None => match error.server_detail() {
            Some(detail) => format!("{} ({})", ANALYSIS_FAILED_MESSAGE, detail),
            None => ANALYSIS_FAILED_MESSAGE.to_string(),
        },
    }
}

fn complete_message(upload: Option<&UploadStats>, run_message: Option<&str>, evaluated: usize) -> String {
    let head = match upload {
        Some(stats) => format!(
            "{} new users and {} transactions ingested and scored.",
            stats.new_users, stats.new_transactions
        ),
        None => "Fraud analysis complete.".to_string(),
    };
    match run_message {
        Some(run) => format!("{} {} {} users evaluated.", head, run, evaluated),
        None => format!("{} {} users evaluated.", head, evaluated),
    }
}
