//! CSV export documents
//!
//! Both exports are fixed-column text built locally from data the dashboard
//! already holds; writing them never involves the backend.

use std::path::{Path, PathBuf};

use crate::models::{AnalyticsSummary, UserRiskRecord};
use crate::services::risk_classifier::classify;

/// File name of the user listing export
pub const USER_EXPORT_FILE_NAME: &str = "Trustigo_Fraud_Users_Export.csv";

/// File name of the financial impact export
pub const FINANCIAL_EXPORT_FILE_NAME: &str = "Trustigo_Financial_Impact_Report.csv";

pub const USER_EXPORT_HEADER: &str =
    "User ID,Name,Email,Risk Score,Status,90D Return Rate,Fast Returns,High-Value Returns";

pub const FINANCIAL_EXPORT_HEADER: &str = "Month,Gross Volume,Expected Earnings,Capital Saved (Prevented Loss),Unrecognized Leakage,Blocked Transactions,Manual Reviews";

/// Positional period labels; the backend does not send calendar dates
pub const PERIOD_LABELS: [&str; 7] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul"];

/// A rendered CSV file ready to be saved
#[derive(Debug, Clone, PartialEq)]
pub struct ExportDocument {
    pub file_name: &'static str,
    pub content: String,
}

impl ExportDocument {
    /// Write the document into `dir`, returning the full path
    pub async fn write_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(self.file_name);
        tokio::fs::write(&path, self.content.as_bytes()).await?;

        tracing::info!(
            file = %path.display(),
            bytes = self.content.len(),
            "Export written"
        );
        Ok(path)
    }

    /// Number of lines, header included
    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }
}

/// Quote-wrap a free-text field, doubling embedded quotes
fn quoted(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Shortest round-trip rendering: `1200`, `1200.5`
fn number(value: f64) -> String {
    format!("{}", value)
}

fn optional_number<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// One row per record in listing order
pub fn encode_user_export(records: &[UserRiskRecord]) -> ExportDocument {
    let mut content = String::with_capacity(64 * (records.len() + 1));
    content.push_str(USER_EXPORT_HEADER);
    content.push('\n');

    for record in records {
        let status = classify(record.overall_risk_score).label;
        let return_rate = (record.return_rate_90d * 100.0).round();

        content.push_str(&format!(
            "{},{},{},{:.1},{},{:.0}%,{},{}\n",
            record.user_id,
            quoted(record.name.as_deref().unwrap_or_default()),
            quoted(record.email.as_deref().unwrap_or_default()),
            record.overall_risk_score,
            status,
            return_rate,
            record.fast_return_count.unwrap_or(0),
            record.high_value_return_count.unwrap_or(0),
        ));
    }

    ExportDocument {
        file_name: USER_EXPORT_FILE_NAME,
        content,
    }
}

/// Seven period rows, a blank separator, then the TOTALS row
///
/// Per-period gross volume is not reported by the backend, so that column is
/// blank until the totals row. Periods missing from a short series are blank.
pub fn encode_financial_export(summary: &AnalyticsSummary) -> ExportDocument {
    if let Err(e) = summary.validate() {
        tracing::warn!(error = %e, "Exporting misaligned analytics series");
    }

    let revenue = &summary.revenue_timeseries;
    let blocks = &summary.block_timeseries;

    let mut content = String::new();
    content.push_str(FINANCIAL_EXPORT_HEADER);
    content.push('\n');

    for (index, month) in PERIOD_LABELS.iter().enumerate() {
        content.push_str(&format!(
            "{},,{},{},{},{},{}\n",
            month,
            optional_number(revenue.expected_earnings.get(index).copied().map(number)),
            optional_number(revenue.prevented.get(index).copied().map(number)),
            optional_number(revenue.leakage.get(index).copied().map(number)),
            optional_number(blocks.blocked.get(index)),
            optional_number(blocks.manual.get(index)),
        ));
    }

    content.push('\n');
    content.push_str(&format!(
        "TOTALS,{},{},{},{},,\n",
        number(summary.gross_volume),
        number(summary.expected_earnings),
        number(summary.capital_saved),
        number(summary.leakage_total()),
    ));

    ExportDocument {
        file_name: FINANCIAL_EXPORT_FILE_NAME,
        content,
    }
}
