use anyhow::{Context, Result};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{error, info, info_span, Instrument, Span};

use crate::calculator::{CalculateRequest, CalculatorService};
use crate::config::Config;
use crate::error::CalcError;
use crate::logging::SERVICE_NAME;

/// 演算対象のクエリパラメータ。同じキーが複数あれば最初の値を使う。
#[derive(Debug, Default, PartialEq)]
pub struct CalculateParams {
    pub n1: Option<String>,
    pub n2: Option<String>,
}

impl CalculateParams {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "n1" => &mut params.n1,
                "n2" => &mut params.n2,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        params
    }
}

/// レスポンスボディ。成功時は `data`、失敗時は `msg` のみを持つ。
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CalcResponse {
    pub statuscode: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl CalcResponse {
    pub fn success(data: f64) -> Self {
        Self {
            statuscode: StatusCode::OK.as_u16(),
            data: Some(data),
            msg: None,
        }
    }

    pub fn failure(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            statuscode: status.as_u16(),
            data: None,
            msg: Some(msg.into()),
        }
    }
}

pub fn router(service: CalculatorService) -> Router {
    Router::new()
        .route("/{operation}", get(calculate))
        .with_state(service)
}

async fn calculate(
    State(service): State<CalculatorService>,
    Path(operation): Path<String>,
    pairs: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Response {
    let span = info_span!("calculate", service = SERVICE_NAME, operation = %operation);

    async move {
        // デコードできないクエリは数値エラーとして扱う
        let result = pairs
            .map_err(|_| CalcError::InvalidNumberFormat)
            .and_then(|Query(pairs)| {
                let params = CalculateParams::from_pairs(pairs);
                service.calculate(CalculateRequest {
                    operation,
                    n1: params.n1,
                    n2: params.n2,
                })
            });

        match result {
            Ok(data) => (StatusCode::OK, Json(CalcResponse::success(data))).into_response(),
            Err(e) => {
                error!("{}", e);
                e.into_response()
            }
        }
    }
    .instrument(span)
    .await
}

pub async fn serve(config: &Config) -> Result<()> {
    let span = info_span!("server", service = SERVICE_NAME);
    run(config).instrument(span).await
}

async fn run(config: &Config) -> Result<()> {
    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("{} にバインドできません", address))?;

    info!("Server is listening on port {}", config.port);

    axum::serve(listener, router(CalculatorService::new()))
        // シグナル待ちは別タスクで動くのでスパンを引き継ぐ
        .with_graceful_shutdown(shutdown_signal().instrument(Span::current()))
        .await
        .context("サーバが異常終了しました")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Ctrl-C ハンドラを登録できません: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("SIGTERM ハンドラを登録できません: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_params_take_first_value() {
        let params = CalculateParams::from_pairs(pairs(&[
            ("n1", "1"),
            ("other", "x"),
            ("n1", "2"),
            ("n2", "3"),
        ]));
        assert_eq!(params.n1.as_deref(), Some("1"));
        assert_eq!(params.n2.as_deref(), Some("3"));

        let params = CalculateParams::from_pairs(pairs(&[("n2", "")]));
        assert_eq!(params.n1, None);
        assert_eq!(params.n2.as_deref(), Some(""));
    }

    #[test]
    fn test_success_body_shape() {
        let body = serde_json::to_value(CalcResponse::success(5.0)).unwrap();
        assert_eq!(body, json!({"statuscode": 200, "data": 5.0}));
    }

    #[test]
    fn test_failure_body_shape() {
        let body = serde_json::to_value(CalcResponse::failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Invalid operation",
        ))
        .unwrap();
        assert_eq!(body, json!({"statuscode": 500, "msg": "Invalid operation"}));
    }

    #[test]
    fn test_result_round_trips_exactly() {
        let inputs = vec![5.0, -0.25, 20.0, 1.5, 1024.0, 9007199254740992.0, 0.0];

        for data in inputs {
            let encoded = serde_json::to_string(&CalcResponse::success(data)).unwrap();
            let decoded: CalcResponse = serde_json::from_str(&encoded).unwrap();
            assert_eq!(decoded.data, Some(data));
        }
    }

    #[test]
    fn test_overflow_serializes_as_null() {
        let body = serde_json::to_value(CalcResponse::success(f64::INFINITY)).unwrap();
        assert_eq!(body["statuscode"], 200);
        assert!(body["data"].is_null());
    }
}
