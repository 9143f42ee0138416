//! HTTP Client Tests
//!
//! Runs `HttpFraudApi` against an in-process axum backend bound to an
//! ephemeral port.

use std::collections::HashMap;
use std::time::Duration;

use axum::extract::{Multipart, Path, Query};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use trustigo_dashboard::client::{FraudApi, HttpFraudApi};
use trustigo_dashboard::config::Config;
use trustigo_dashboard::error::ApiError;
use trustigo_dashboard::models::BehaviorScore;

async fn spawn_backend(app: Router) -> HttpFraudApi {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = Config {
        request_timeout: Duration::from_secs(5),
        ..Config::default()
    }
    .with_api_base_url(&format!("http://{}/", addr))
    .unwrap();
    HttpFraudApi::new(config)
}

fn healthy_backend() -> Router {
    Router::new()
        .route(
            "/fraud-users",
            get(|| async {
                Json(json!([
                    {
                        "user_id": 4,
                        "overall_risk_score": 81.5,
                        "return_rate_90d": 0.72,
                        "avg_return_time_days": 1.4,
                        "fast_return_count": 6,
                        "high_value_return_count": 2,
                        "category_risk_score": 55.0,
                        "anomaly_score": 0.81,
                        "engine_used": "Engine 1: Behavioral",
                        "last_updated": "2025-03-05T09:30:00"
                    },
                    { "user_id": 5, "overall_risk_score": 12.0 }
                ]))
            }),
        )
        .route(
            "/user/:id",
            get(|Path(id): Path<i64>| async move {
                Json(json!({
                    "user_id": id,
                    "name": "Ada",
                    "email": "ada@example.com",
                    "account_age": 3,
                    "behavior_score": {
                        "overall_risk_score": 64.0,
                        "payment_risk_score": 80.0,
                        "refund_value_ratio": 0.9,
                        "engine_used": "Engine 2: First-Order"
                    },
                    "fraud_alerts": [{
                        "alert_id": 11,
                        "user_id": id,
                        "date": "2025-03-05T09:30:00",
                        "risk_score": 64.0,
                        "primary_reason": "High-value first order refunded",
                        "status": "Active"
                    }]
                }))
            }),
        )
        .route(
            "/alerts",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let limit = params.get("limit").cloned().unwrap_or_default();
                Json(json!([{
                    "alert_id": 1,
                    "date": "2025-03-05T09:30:00Z",
                    "risk_score": 70.0,
                    "primary_reason": format!("limit={}", limit)
                }]))
            }),
        )
        .route("/upload-csv", post(echo_upload))
        .route("/run-fraud-analysis", post(|| async { StatusCode::OK }))
}

/// Reports the multipart field and file name it received
async fn echo_upload(mut multipart: Multipart) -> Json<Value> {
    let mut received = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.unwrap();
        received.push(format!("{}:{}:{}", name, file_name, data.len()));
    }
    Json(json!({
        "message": received.join(","),
        "stats": { "new_users": 2, "new_transactions": 10, "new_returns": 1 }
    }))
}

// ============================================================================
// Successful Requests
// ============================================================================

#[tokio::test]
async fn test_listing_decodes_behavior_rows() {
    let api = spawn_backend(healthy_backend()).await;
    let records = api.list_risk_users().await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].user_id, 4);
    assert_eq!(records[0].name, None);
    assert_eq!(records[0].fast_return_count, Some(6));
    assert_eq!(records[1].return_rate_90d, 0.0);
    assert_eq!(records[1].fast_return_count, None);
}

#[tokio::test]
async fn test_user_detail_selects_engine_variant() {
    let api = spawn_backend(healthy_backend()).await;
    let detail = api.get_user(9).await.unwrap();

    assert_eq!(detail.user_id, 9);
    match detail.behavior_score {
        Some(BehaviorScore::FirstOrder(metrics)) => {
            assert_eq!(metrics.payment_risk_score, 80.0);
            assert_eq!(metrics.inputs.overall_risk_score, 64.0);
        }
        other => panic!("unexpected score: {:?}", other),
    }
    assert_eq!(detail.fraud_alerts.len(), 1);
}

#[tokio::test]
async fn test_alerts_pass_limit() {
    let api = spawn_backend(healthy_backend()).await;
    let alerts = api.list_alerts(5).await.unwrap();
    assert_eq!(alerts[0].primary_reason, "limit=5");
}

#[tokio::test]
async fn test_upload_sends_file_field() {
    let api = spawn_backend(healthy_backend()).await;
    let response = api
        .upload_dataset("returns.csv", b"a,b\n1,2\n".to_vec())
        .await
        .unwrap();

    assert_eq!(response.message.as_deref(), Some("file:returns.csv:8"));
    assert_eq!(response.stats.new_users, 2);
    assert_eq!(response.stats.new_returns, Some(1));
}

#[tokio::test]
async fn test_analysis_trigger_accepts_empty_body() {
    let api = spawn_backend(healthy_backend()).await;
    let run = api.trigger_analysis_run().await.unwrap();
    assert_eq!(run.message, None);
}

// ============================================================================
// Failure Classification
// ============================================================================

#[tokio::test]
async fn test_error_status_carries_detail() {
    let app = Router::new().route(
        "/upload-csv",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "detail": "The uploaded CSV file is empty." })),
            )
        }),
    );
    let api = spawn_backend(app).await;

    let err = api.upload_dataset("empty.csv", vec![]).await.unwrap_err();
    assert_eq!(
        err,
        ApiError::ServerError {
            status: 400,
            detail: Some("The uploaded CSV file is empty.".to_string()),
        }
    );
    assert_eq!(err.user_message(), "The uploaded CSV file is empty.");
}

#[tokio::test]
async fn test_error_status_without_json_body() {
    let app = Router::new().route(
        "/run-fraud-analysis",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error") }),
    );
    let api = spawn_backend(app).await;

    let err = api.trigger_analysis_run().await.unwrap_err();
    assert_eq!(
        err,
        ApiError::ServerError {
            status: 500,
            detail: None
        }
    );
}

#[tokio::test]
async fn test_unknown_route_is_server_error() {
    let api = spawn_backend(Router::new()).await;
    let err = api.get_analytics_summary().await.unwrap_err();
    assert!(matches!(err, ApiError::ServerError { status: 404, .. }));
}

#[tokio::test]
async fn test_malformed_payload_is_decode_error() {
    let app = Router::new().route(
        "/analytics-summary",
        get(|| async { Json(json!({ "gross_volume": "lots" })) }),
    );
    let api = spawn_backend(app).await;

    let err = api.get_analytics_summary().await.unwrap_err();
    assert_eq!(err.error_code(), "DECODE_ERROR");
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let config = Config::default()
        .with_api_base_url(&format!("http://{}", addr))
        .unwrap();
    let api = HttpFraudApi::new(config);

    let err = api.list_risk_users().await.unwrap_err();
    assert!(err.is_transport(), "expected transport error, got {:?}", err);
}
