//! Data models returned by the Trustigo backend
//!
//! All records are read-only snapshots fetched per page visit.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::services::risk_classifier::{classify, RiskClassification};

/// Wire tag of the behavioural scoring engine
pub const ENGINE_BEHAVIORAL: &str = "Engine 1: Behavioral";

/// Wire tag of the cold-start scoring engine
pub const ENGINE_FIRST_ORDER: &str = "Engine 2: First-Order";

/// One evaluated user as returned by `GET /fraud-users`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRiskRecord {
    pub user_id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub overall_risk_score: f64,
    #[serde(default)]
    pub return_rate_90d: f64,
    #[serde(default)]
    pub fast_return_count: Option<u32>,
    #[serde(default)]
    pub high_value_return_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_return_time_days: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_used: Option<String>,
}

impl UserRiskRecord {
    /// Minimal record, mostly useful for fixtures
    pub fn new(user_id: i64, overall_risk_score: f64) -> Self {
        Self {
            user_id,
            name: None,
            email: None,
            overall_risk_score,
            return_rate_90d: 0.0,
            fast_return_count: None,
            high_value_return_count: None,
            avg_return_time_days: None,
            anomaly_score: None,
            engine_used: None,
        }
    }

    pub fn classification(&self) -> RiskClassification {
        classify(self.overall_risk_score)
    }
}

/// User profile with its optional score and alert history (`GET /user/{id}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDetail {
    pub user_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub account_age: Option<i64>,
    #[serde(default)]
    pub behavior_score: Option<BehaviorScore>,
    #[serde(default)]
    pub fraud_alerts: Vec<FraudAlert>,
}

impl UserDetail {
    /// A profile with neither a score nor any alert has nothing to show
    pub fn has_behavioral_data(&self) -> bool {
        self.behavior_score.is_some() || !self.fraud_alerts.is_empty()
    }

    /// Score used for the gauge; zero when the backend has not scored the user yet
    pub fn overall_risk_score(&self) -> f64 {
        self.behavior_score
            .as_ref()
            .map(|bs| bs.inputs().overall_risk_score)
            .unwrap_or(0.0)
    }

    /// Reason attached to the first alert in returned order
    pub fn primary_reason(&self) -> Option<&str> {
        self.fraud_alerts.first().map(|a| a.primary_reason.as_str())
    }
}

/// Score inputs shared by both engines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreInputs {
    pub overall_risk_score: f64,
    pub return_rate_90d: f64,
    pub avg_return_time_days: f64,
    pub fast_return_count: u32,
    pub high_value_return_count: u32,
    pub anomaly_score: f64,
}

/// Metrics produced by the behavioural engine (returning customers)
#[derive(Debug, Clone, PartialEq)]
pub struct BehavioralEngineMetrics {
    pub inputs: ScoreInputs,
    pub category_risk_score: f64,
}

/// Metrics produced by the first-order engine (new customers)
#[derive(Debug, Clone, PartialEq)]
pub struct FirstOrderEngineMetrics {
    pub inputs: ScoreInputs,
    pub payment_risk_score: f64,
    pub refund_value_ratio: f64,
}

/// Behaviour score discriminated by the engine that computed it
///
/// On the wire this is a flat object tagged by `engine_used`; the fields of
/// the other engine are present but meaningless, so they are dropped here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBehaviorScore", into = "RawBehaviorScore")]
pub enum BehaviorScore {
    Behavioral(BehavioralEngineMetrics),
    FirstOrder(FirstOrderEngineMetrics),
}

impl BehaviorScore {
    pub fn inputs(&self) -> &ScoreInputs {
        match self {
            BehaviorScore::Behavioral(m) => &m.inputs,
            BehaviorScore::FirstOrder(m) => &m.inputs,
        }
    }

    pub fn engine_tag(&self) -> &'static str {
        match self {
            BehaviorScore::Behavioral(_) => ENGINE_BEHAVIORAL,
            BehaviorScore::FirstOrder(_) => ENGINE_FIRST_ORDER,
        }
    }
}

/// Flat wire representation of a behaviour score
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawBehaviorScore {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<i64>,
    #[serde(default)]
    overall_risk_score: f64,
    #[serde(default)]
    return_rate_90d: f64,
    #[serde(default)]
    avg_return_time_days: f64,
    #[serde(default)]
    fast_return_count: u32,
    #[serde(default)]
    high_value_return_count: u32,
    #[serde(default)]
    anomaly_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category_risk_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payment_risk_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refund_value_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    engine_used: Option<String>,
}

impl From<RawBehaviorScore> for BehaviorScore {
    fn from(raw: RawBehaviorScore) -> Self {
        let inputs = ScoreInputs {
            overall_risk_score: raw.overall_risk_score,
            return_rate_90d: raw.return_rate_90d,
            avg_return_time_days: raw.avg_return_time_days,
            fast_return_count: raw.fast_return_count,
            high_value_return_count: raw.high_value_return_count,
            anomaly_score: raw.anomaly_score,
        };

        // The backend model defaults to the behavioural engine, and so does
        // the detail page for any tag it does not recognise
        match raw.engine_used.as_deref().unwrap_or(ENGINE_BEHAVIORAL) {
            ENGINE_FIRST_ORDER => BehaviorScore::FirstOrder(FirstOrderEngineMetrics {
                inputs,
                payment_risk_score: raw.payment_risk_score.unwrap_or(0.0),
                refund_value_ratio: raw.refund_value_ratio.unwrap_or(0.0),
            }),
            tag => {
                if tag != ENGINE_BEHAVIORAL {
                    tracing::warn!(engine = %tag, "Unknown scoring engine, showing behavioral metrics");
                }
                BehaviorScore::Behavioral(BehavioralEngineMetrics {
                    inputs,
                    category_risk_score: raw.category_risk_score.unwrap_or(0.0),
                })
            }
        }
    }
}

impl From<BehaviorScore> for RawBehaviorScore {
    fn from(score: BehaviorScore) -> Self {
        let engine_used = Some(score.engine_tag().to_string());
        match score {
            BehaviorScore::Behavioral(m) => RawBehaviorScore {
                category_risk_score: Some(m.category_risk_score),
                engine_used,
                ..RawBehaviorScore::from_inputs(m.inputs)
            },
            BehaviorScore::FirstOrder(m) => RawBehaviorScore {
                payment_risk_score: Some(m.payment_risk_score),
                refund_value_ratio: Some(m.refund_value_ratio),
                engine_used,
                ..RawBehaviorScore::from_inputs(m.inputs)
            },
        }
    }
}

impl RawBehaviorScore {
    fn from_inputs(inputs: ScoreInputs) -> Self {
        Self {
            overall_risk_score: inputs.overall_risk_score,
            return_rate_90d: inputs.return_rate_90d,
            avg_return_time_days: inputs.avg_return_time_days,
            fast_return_count: inputs.fast_return_count,
            high_value_return_count: inputs.high_value_return_count,
            anomaly_score: inputs.anomaly_score,
            ..Default::default()
        }
    }
}

/// Fraud alert raised against a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudAlert {
    pub alert_id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub date: DateTime<Utc>,
    pub risk_score: f64,
    pub primary_reason: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Accepts RFC 3339 timestamps as well as naive ones, which are taken as UTC
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))
}

/// Revenue series, one value per period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueTimeseries {
    #[serde(default)]
    pub expected_earnings: Vec<f64>,
    #[serde(default)]
    pub prevented: Vec<f64>,
    #[serde(default)]
    pub leakage: Vec<f64>,
}

/// Block-rate series, one count per period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockTimeseries {
    #[serde(default)]
    pub blocked: Vec<u64>,
    #[serde(default)]
    pub manual: Vec<u64>,
}

/// Aggregate financial snapshot (`GET /analytics-summary`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub gross_volume: f64,
    pub expected_earnings: f64,
    pub capital_saved: f64,
    #[serde(default)]
    pub catch_rate: Option<f64>,
    #[serde(default)]
    pub total_txns: Option<u64>,
    #[serde(default)]
    pub revenue_timeseries: RevenueTimeseries,
    #[serde(default)]
    pub block_timeseries: BlockTimeseries,
}

impl AnalyticsSummary {
    /// Money that slipped past the scoring engines
    pub fn leakage_total(&self) -> f64 {
        self.gross_volume - self.expected_earnings
    }

    /// Number of periods, taken from the longest series
    pub fn period_count(&self) -> usize {
        self.series_lengths().into_iter().max().unwrap_or(0)
    }

    /// Checks that all time series are index-aligned
    pub fn validate(&self) -> Result<(), String> {
        let lengths = self.series_lengths();
        if lengths.iter().all(|len| *len == lengths[0]) {
            Ok(())
        } else {
            Err(format!(
                "time series lengths differ: expected_earnings={}, prevented={}, leakage={}, blocked={}, manual={}",
                lengths[0], lengths[1], lengths[2], lengths[3], lengths[4]
            ))
        }
    }

    fn series_lengths(&self) -> [usize; 5] {
        [
            self.revenue_timeseries.expected_earnings.len(),
            self.revenue_timeseries.prevented.len(),
            self.revenue_timeseries.leakage.len(),
            self.block_timeseries.blocked.len(),
            self.block_timeseries.manual.len(),
        ]
    }
}

/// Counts reported after a dataset upload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadStats {
    pub new_users: u64,
    pub new_transactions: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_returns: Option<u64>,
}

/// Body of a successful `POST /upload-csv`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub stats: UploadStats,
}

/// Body of a successful `POST /run-fraud-analysis`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRun {
    #[serde(default)]
    pub message: Option<String>,
}
