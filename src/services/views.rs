//! Page view-models
//!
//! One assembler per page. Each takes fetched data and returns exactly what
//! the renderer draws; there is no I/O or shared state in here.

use serde::Serialize;

use crate::models::{AnalyticsSummary, BehaviorScore, FraudAlert, UserDetail, UserRiskRecord};
use crate::services::export::PERIOD_LABELS;
use crate::services::metrics::{self, aggregate, HISTOGRAM_LABELS};
use crate::services::risk_classifier::{classify, RiskClassification, RiskTier};

/// Rows shown in the dashboard's elevated-risk preview
pub const PREVIEW_ROWS: usize = 15;

/// Explanation used when a high-risk user has no alert on file
const NO_ALERT_REASON: &str = "Pattern appears normal.";

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct KpiCard {
    pub title: &'static str,
    pub value: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct BarSeries {
    pub labels: Vec<&'static str>,
    pub values: Vec<usize>,
    pub colors: Vec<&'static str>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DonutSeries {
    pub labels: Vec<&'static str>,
    pub values: Vec<usize>,
    pub colors: Vec<&'static str>,
    pub center_label: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct LineDataset {
    pub label: &'static str,
    pub values: Vec<f64>,
    pub color: &'static str,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct LineSeries {
    pub labels: Vec<&'static str>,
    pub datasets: Vec<LineDataset>,
}

/// One user in a table
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct UserRow {
    pub user_id: i64,
    pub display_id: String,
    pub score: String,
    pub return_rate: String,
    pub fast_returns: u32,
    pub badge: RiskClassification,
    pub detail_path: String,
}

impl From<&UserRiskRecord> for UserRow {
    fn from(record: &UserRiskRecord) -> Self {
        Self {
            user_id: record.user_id,
            display_id: format!("#{}", record.user_id),
            score: format!("{:.1}", record.overall_risk_score),
            return_rate: format!("{:.0}%", (record.return_rate_90d * 100.0).round()),
            fast_returns: record.fast_return_count.unwrap_or(0),
            badge: record.classification(),
            detail_path: format!("/user/{}", record.user_id),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct OverviewView {
    pub kpis: Vec<KpiCard>,
    pub distribution: BarSeries,
    pub breakdown: DonutSeries,
    pub elevated_preview: Vec<UserRow>,
}

/// Dashboard landing page
pub fn overview_view(records: &[UserRiskRecord]) -> OverviewView {
    let stats = aggregate(records);

    let kpis = vec![
        KpiCard {
            title: "Total Evaluated",
            value: stats.total.to_string(),
        },
        KpiCard {
            title: "High Risk Users",
            value: stats.high_risk_count.to_string(),
        },
        KpiCard {
            title: "Average Risk Score",
            value: stats.mean_score_display(),
        },
    ];

    // Colour each bucket by the tier of its lower edge
    let distribution = BarSeries {
        labels: HISTOGRAM_LABELS.to_vec(),
        values: stats.histogram.to_vec(),
        colors: (0..HISTOGRAM_LABELS.len())
            .map(|i| classify(i as f64 * 20.0).color)
            .collect(),
    };

    let tiers = RiskTier::all();
    let breakdown = DonutSeries {
        labels: tiers.iter().map(|t| t.label()).collect(),
        values: tiers.iter().map(|t| stats.composition.count(*t)).collect(),
        colors: tiers.iter().map(|t| t.color()).collect(),
        center_label: format!("{} high risk", stats.composition.high),
    };

    let elevated_preview = metrics::elevated(records, Some(PREVIEW_ROWS))
        .into_iter()
        .map(UserRow::from)
        .collect();

    OverviewView {
        kpis,
        distribution,
        breakdown,
        elevated_preview,
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FraudTableView {
    pub total_evaluated: usize,
    pub rows: Vec<UserRow>,
}

/// Fraud evaluation log: every Medium or High user, riskiest first
pub fn fraud_table_view(records: &[UserRiskRecord]) -> FraudTableView {
    FraudTableView {
        total_evaluated: records.len(),
        rows: metrics::elevated(records, None)
            .into_iter()
            .map(UserRow::from)
            .collect(),
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct GaugeView {
    pub value: f64,
    pub remaining: f64,
    pub color: &'static str,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MetricTile {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct AlertRow {
    pub alert_id: i64,
    pub user_id: Option<i64>,
    pub date: String,
    pub risk_score: String,
    pub reason: String,
    pub badge: RiskClassification,
}

impl From<&FraudAlert> for AlertRow {
    fn from(alert: &FraudAlert) -> Self {
        Self {
            alert_id: alert.alert_id,
            user_id: alert.user_id,
            date: alert.date.format("%b %d, %Y").to_string(),
            risk_score: format!("{:.0}", alert.risk_score),
            reason: alert.primary_reason.clone(),
            badge: classify(alert.risk_score),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct UserProfileView {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub account_status: &'static str,
    pub gauge: GaugeView,
    pub badge: RiskClassification,
    pub tier_description: &'static str,
    pub explanation: String,
    pub engine: Option<&'static str>,
    pub metrics: Vec<MetricTile>,
    pub timeline: Vec<AlertRow>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UserDetailView {
    NoData { user_id: i64, message: &'static str },
    Profile(UserProfileView),
}

/// Per-user detail page
pub fn user_detail_view(detail: &UserDetail) -> UserDetailView {
    if !detail.has_behavioral_data() {
        return UserDetailView::NoData {
            user_id: detail.user_id,
            message: "No behavioral data found.",
        };
    }

    let score = detail.overall_risk_score();
    let badge = classify(score);
    let is_high_risk = badge.tier == RiskTier::High;

    let explanation = if is_high_risk {
        format!(
            "User flagged due to: {}",
            detail.primary_reason().unwrap_or(NO_ALERT_REASON)
        )
    } else {
        "No fraud indicators detected. Normal behavior.".to_string()
    };

    let value = score.clamp(0.0, 100.0);
    UserDetailView::Profile(UserProfileView {
        user_id: detail.user_id,
        name: detail.name.clone(),
        email: detail.email.clone(),
        account_status: if is_high_risk {
            "High Risk Account"
        } else {
            "Clean Account"
        },
        gauge: GaugeView {
            value,
            remaining: (100.0 - value).max(0.0),
            color: badge.color,
        },
        badge,
        tier_description: badge.tier.description(),
        explanation,
        engine: detail.behavior_score.as_ref().map(|bs| bs.engine_tag()),
        metrics: detail
            .behavior_score
            .as_ref()
            .map(engine_metric_tiles)
            .unwrap_or_default(),
        timeline: detail.fraud_alerts.iter().map(AlertRow::from).collect(),
    })
}

/// Metric panel for whichever engine scored the user
fn engine_metric_tiles(score: &BehaviorScore) -> Vec<MetricTile> {
    let inputs = score.inputs();
    let anomaly = MetricTile {
        label: "Isolation Forest Anomaly Coefficient (0.0 to 1.0)",
        value: format!("{:.3}", inputs.anomaly_score),
    };

    match score {
        BehaviorScore::Behavioral(m) => vec![
            MetricTile {
                label: "Return Rate (Historical)",
                value: format!("{:.1}%", inputs.return_rate_90d * 100.0),
            },
            MetricTile {
                label: "Category Abuse Risk",
                value: format!("{:.0} / 100", m.category_risk_score),
            },
            MetricTile {
                label: "Fast Returns (< 48h)",
                value: inputs.fast_return_count.to_string(),
            },
            MetricTile {
                label: "High-Value Abuse",
                value: inputs.high_value_return_count.to_string(),
            },
            anomaly,
        ],
        BehaviorScore::FirstOrder(m) => vec![
            MetricTile {
                label: "Payment & Shipping Risk",
                value: format!("{:.0} / 100", m.payment_risk_score),
            },
            MetricTile {
                label: "Refund / Value Ratio",
                value: format!("{:.1}%", m.refund_value_ratio * 100.0),
            },
            MetricTile {
                label: "High-Value First Orders",
                value: inputs.high_value_return_count.to_string(),
            },
            MetricTile {
                label: "Fast Returns",
                value: inputs.fast_return_count.to_string(),
            },
            anomaly,
        ],
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct AnalyticsView {
    pub kpis: Vec<KpiCard>,
    pub revenue_chart: LineSeries,
    pub block_chart: LineSeries,
    pub series_aligned: bool,
}

/// Financial impact page
pub fn analytics_view(summary: &AnalyticsSummary) -> AnalyticsView {
    let mut kpis = vec![
        KpiCard {
            title: "Gross Volume",
            value: format_currency(summary.gross_volume),
        },
        KpiCard {
            title: "Expected Earnings",
            value: format_currency(summary.expected_earnings),
        },
        KpiCard {
            title: "Capital Saved",
            value: format_currency(summary.capital_saved),
        },
    ];
    if let Some(rate) = summary.catch_rate {
        kpis.push(KpiCard {
            title: "Catch Rate",
            value: format!("{:.1}%", rate),
        });
    }

    let revenue = &summary.revenue_timeseries;
    let blocks = &summary.block_timeseries;
    let as_f64 = |counts: &[u64]| counts.iter().map(|c| *c as f64).collect::<Vec<_>>();

    AnalyticsView {
        kpis,
        revenue_chart: LineSeries {
            labels: PERIOD_LABELS.to_vec(),
            datasets: vec![
                LineDataset {
                    label: "Expected Earnings ($)",
                    values: revenue.expected_earnings.clone(),
                    color: "#6366F1",
                },
                LineDataset {
                    label: "Prevented Fraud Loss ($) (Capital Saved)",
                    values: revenue.prevented.clone(),
                    color: RiskTier::Safe.color(),
                },
            ],
        },
        block_chart: LineSeries {
            labels: PERIOD_LABELS.to_vec(),
            datasets: vec![
                LineDataset {
                    label: "Blocked Transactions",
                    values: as_f64(&blocks.blocked),
                    color: RiskTier::High.color(),
                },
                LineDataset {
                    label: "Manual Reviews",
                    values: as_f64(&blocks.manual),
                    color: RiskTier::Medium.color(),
                },
            ],
        },
        series_aligned: summary.validate().is_ok(),
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct AlertsView {
    pub rows: Vec<AlertRow>,
}

/// Recent alerts feed
pub fn alerts_view(alerts: &[FraudAlert]) -> AlertsView {
    AlertsView {
        rows: alerts.iter().map(AlertRow::from).collect(),
    }
}

/// `1234567.891` -> `1,234,567.89`
pub fn format_currency(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (whole, fraction) = formatted.split_once('.').unwrap_or((&formatted, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BehavioralEngineMetrics, FirstOrderEngineMetrics, ScoreInputs};
    use chrono::{TimeZone, Utc};

    fn alert(id: i64, score: f64, reason: &str) -> FraudAlert {
        FraudAlert {
            alert_id: id,
            user_id: Some(7),
            date: Utc.with_ymd_and_hms(2025, 3, 5, 9, 30, 0).unwrap(),
            risk_score: score,
            primary_reason: reason.to_string(),
            status: Some("Active".to_string()),
        }
    }

    fn detail(score: Option<BehaviorScore>, alerts: Vec<FraudAlert>) -> UserDetail {
        UserDetail {
            user_id: 7,
            name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            account_age: Some(40),
            behavior_score: score,
            fraud_alerts: alerts,
        }
    }

    fn behavioral(overall: f64) -> BehaviorScore {
        BehaviorScore::Behavioral(BehavioralEngineMetrics {
            inputs: ScoreInputs {
                overall_risk_score: overall,
                return_rate_90d: 0.625,
                fast_return_count: 3,
                high_value_return_count: 1,
                anomaly_score: 0.41234,
                ..Default::default()
            },
            category_risk_score: 48.6,
        })
    }

    #[test]
    fn test_overview_kpis_and_series() {
        let records: Vec<UserRiskRecord> = [65.0, 35.0, 10.0]
            .iter()
            .enumerate()
            .map(|(i, s)| UserRiskRecord::new(i as i64, *s))
            .collect();
        let view = overview_view(&records);

        assert_eq!(view.kpis[0].value, "3");
        assert_eq!(view.kpis[1].value, "1");
        assert_eq!(view.kpis[2].value, "36.7");
        assert_eq!(view.distribution.values, vec![1, 1, 0, 1, 0]);
        assert_eq!(
            view.distribution.colors,
            vec!["#10b981", "#10b981", "#f59e0b", "#ef4444", "#ef4444"]
        );
        assert_eq!(view.breakdown.labels, vec!["Safe", "Medium", "High Risk"]);
        assert_eq!(view.breakdown.values, vec![1, 1, 1]);
        assert_eq!(view.breakdown.center_label, "1 high risk");
        assert_eq!(view.elevated_preview.len(), 2);
        assert_eq!(view.elevated_preview[0].score, "65.0");
    }

    #[test]
    fn test_overview_preview_is_capped() {
        let records: Vec<UserRiskRecord> =
            (0..40).map(|i| UserRiskRecord::new(i, 50.0 + i as f64)).collect();
        let view = overview_view(&records);
        assert_eq!(view.elevated_preview.len(), PREVIEW_ROWS);
        assert_eq!(view.elevated_preview[0].user_id, 39);
    }

    #[test]
    fn test_fraud_table_rows() {
        let mut record = UserRiskRecord::new(11, 44.44);
        record.return_rate_90d = 0.333;
        record.fast_return_count = Some(2);
        let view = fraud_table_view(&[record, UserRiskRecord::new(12, 5.0)]);

        assert_eq!(view.total_evaluated, 2);
        assert_eq!(view.rows.len(), 1);
        let row = &view.rows[0];
        assert_eq!(row.display_id, "#11");
        assert_eq!(row.score, "44.4");
        assert_eq!(row.return_rate, "33%");
        assert_eq!(row.fast_returns, 2);
        assert_eq!(row.badge.style_key, "badge-medium");
        assert_eq!(row.detail_path, "/user/11");
    }

    #[test]
    fn test_user_detail_no_data() {
        let view = user_detail_view(&detail(None, vec![]));
        assert!(matches!(view, UserDetailView::NoData { user_id: 7, .. }));
    }

    #[test]
    fn test_user_detail_high_risk_explains_first_alert() {
        let view = user_detail_view(&detail(
            Some(behavioral(82.0)),
            vec![alert(2, 82.4, "Serial wardrobing"), alert(1, 70.0, "Older reason")],
        ));
        let UserDetailView::Profile(profile) = view else {
            panic!("expected profile");
        };

        assert_eq!(profile.account_status, "High Risk Account");
        assert_eq!(profile.explanation, "User flagged due to: Serial wardrobing");
        assert_eq!(profile.gauge.value, 82.0);
        assert_eq!(profile.gauge.remaining, 18.0);
        assert_eq!(profile.gauge.color, "#ef4444");
        assert_eq!(profile.engine, Some("Engine 1: Behavioral"));
        assert_eq!(profile.metrics[0].value, "62.5%");
        assert_eq!(profile.metrics[1].value, "49 / 100");
        assert_eq!(profile.metrics[4].value, "0.412");
        assert_eq!(profile.timeline[0].date, "Mar 05, 2025");
        assert_eq!(profile.timeline[0].risk_score, "82");
    }

    #[test]
    fn test_user_detail_high_risk_without_alerts() {
        let view = user_detail_view(&detail(Some(behavioral(75.0)), vec![]));
        let UserDetailView::Profile(profile) = view else {
            panic!("expected profile");
        };
        assert_eq!(profile.explanation, "User flagged due to: Pattern appears normal.");
    }

    #[test]
    fn test_user_detail_first_order_panel() {
        let score = BehaviorScore::FirstOrder(FirstOrderEngineMetrics {
            inputs: ScoreInputs {
                overall_risk_score: 35.0,
                fast_return_count: 1,
                high_value_return_count: 2,
                ..Default::default()
            },
            payment_risk_score: 71.6,
            refund_value_ratio: 0.925,
        });
        let view = user_detail_view(&detail(Some(score), vec![]));
        let UserDetailView::Profile(profile) = view else {
            panic!("expected profile");
        };

        assert_eq!(profile.account_status, "Clean Account");
        assert_eq!(profile.explanation, "No fraud indicators detected. Normal behavior.");
        assert_eq!(profile.badge.label, "Medium");
        assert_eq!(profile.gauge.color, "#f59e0b");
        let labels: Vec<&str> = profile.metrics.iter().map(|m| m.label).collect();
        assert_eq!(labels[0], "Payment & Shipping Risk");
        assert_eq!(profile.metrics[0].value, "72 / 100");
        assert_eq!(profile.metrics[1].value, "92.5%");
        assert_eq!(profile.metrics[2].value, "2");
    }

    #[test]
    fn test_user_detail_alerts_only() {
        let view = user_detail_view(&detail(None, vec![alert(1, 66.0, "Reason")]));
        let UserDetailView::Profile(profile) = view else {
            panic!("expected profile");
        };
        assert_eq!(profile.gauge.value, 0.0);
        assert_eq!(profile.gauge.remaining, 100.0);
        assert!(profile.metrics.is_empty());
        assert_eq!(profile.engine, None);
        assert_eq!(profile.timeline.len(), 1);
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "0.00");
        assert_eq!(format_currency(999.999), "1,000.00");
        assert_eq!(format_currency(1_234_567.891), "1,234,567.89");
        assert_eq!(format_currency(-4500.5), "-4,500.50");
    }

    #[test]
    fn test_alerts_view() {
        let view = alerts_view(&[alert(5, 91.0, "Bracketing"), alert(4, 45.0, "Mild")]);
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.rows[0].badge.label, "High Risk");
        assert_eq!(view.rows[1].badge.label, "Medium");
    }
}
