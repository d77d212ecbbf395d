//! HTTP API 수신기
//!
//! REST 제출 경로의 세 라우트를 제공합니다:
//!
//! | 메서드 | 경로 | 동작 |
//! |---|---|---|
//! | POST | `/api/logs` | JSON 로그 파싱 후 삽입, `201 {"id":N,"status":"created"}` |
//! | GET  | `/api/logs` | `200 {"count":N}` |
//! | GET  | `/health`   | `200 {"status":"ok"}` |
//!
//! 그 외 경로는 `404 {"error":"Not Found"}`, 잘못된 본문은
//! `400 {"error":"Invalid JSON"}`, 스토리지 실패는
//! `500 {"error":"Storage Error"}`입니다.
//!
//! POST 경로는 응답에 부여된 행 ID를 포함해야 하므로 쓰기 큐를 거치지
//! 않고 스토어에 직접 삽입합니다.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use metrics::counter;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use logvault_core::error::{LogvaultError, ReceiverError};
use logvault_core::metrics as m;
use logvault_core::pipeline::{HealthStatus, LogParser, Receiver};
use logvault_core::types::LogSource;
use logvault_storage::LogStore;

use super::{IngestCounters, ReceiverStatus};
use crate::parser::JsonLogParser;

/// HTTP 수신기 설정
#[derive(Debug, Clone)]
pub struct HttpReceiverConfig {
    /// 바인드 주소 (예: "0.0.0.0:8080")
    pub bind_addr: String,
}

/// 라우트 핸들러가 공유하는 상태
#[derive(Clone)]
pub struct ApiState {
    store: Arc<Mutex<LogStore>>,
    parser: Arc<JsonLogParser>,
    counters: Arc<IngestCounters>,
}

impl ApiState {
    /// 새 API 상태를 생성합니다.
    pub fn new(store: Arc<Mutex<LogStore>>, counters: Arc<IngestCounters>) -> Self {
        Self {
            store,
            parser: Arc::new(JsonLogParser::new()),
            counters,
        }
    }
}

/// API 라우터를 생성합니다.
///
/// 테스트와 임베딩에서 서버 없이 라우터만 사용할 수 있습니다.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/logs", post(ingest_log).get(count_logs))
        .route("/health", get(health))
        .fallback(not_found)
        .with_state(state)
}

async fn ingest_log(State(state): State<ApiState>, body: Bytes) -> Response {
    state.counters.add_received(1);
    counter!(m::INGEST_RECEIVED_TOTAL, m::LABEL_SOURCE => LogSource::RestApi.as_str())
        .increment(1);

    let entry = match state.parser.parse(&body) {
        Ok(entry) => entry,
        Err(e) => {
            state.counters.add_errors(1);
            counter!(m::INGEST_PARSE_ERRORS_TOTAL, m::LABEL_SOURCE => LogSource::RestApi.as_str())
                .increment(1);
            debug!(error = %e, "rejecting invalid JSON submission");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "Invalid JSON"})),
            )
                .into_response();
        }
    };

    let inserted = {
        let mut store = state.store.lock().await;
        store.insert(&entry)
    };

    match inserted {
        Ok(id) => {
            state.counters.add_written(1);
            counter!(m::STORAGE_ROWS_WRITTEN_TOTAL).increment(1);
            (
                StatusCode::CREATED,
                Json(json!({"id": id, "status": "created"})),
            )
                .into_response()
        }
        Err(e) => {
            state.counters.add_errors(1);
            error!(error = %e, "storage insert failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Storage Error"})),
            )
                .into_response()
        }
    }
}

async fn count_logs(State(state): State<ApiState>) -> Response {
    let count = {
        let store = state.store.lock().await;
        store.count()
    };

    match count {
        Ok(count) => (StatusCode::OK, Json(json!({"count": count}))).into_response(),
        Err(e) => {
            error!(error = %e, "count query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Storage Error"})),
            )
                .into_response()
        }
    }
}

async fn health() -> Response {
    (StatusCode::OK, Json(json!({"status": "ok"}))).into_response()
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"error": "Not Found"}))).into_response()
}

/// HTTP API 수신기
///
/// axum 서버를 백그라운드 태스크로 실행하며, 취소 토큰으로 graceful
/// shutdown을 수행합니다.
pub struct HttpReceiver {
    config: HttpReceiverConfig,
    state: ApiState,
    cancel_token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    status: ReceiverStatus,
    local_addr: Option<SocketAddr>,
}

impl HttpReceiver {
    /// 새 HTTP 수신기를 생성합니다.
    pub fn new(
        config: HttpReceiverConfig,
        store: Arc<Mutex<LogStore>>,
        counters: Arc<IngestCounters>,
    ) -> Self {
        Self {
            config,
            state: ApiState::new(store, counters),
            cancel_token: CancellationToken::new(),
            tasks: Vec::new(),
            status: ReceiverStatus::Idle,
            local_addr: None,
        }
    }

    /// 서버 없이 라우터만 반환합니다 (테스트용).
    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// 실제 바인드된 주소를 반환합니다 (시작 전에는 `None`).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// 현재 상태를 반환합니다.
    pub fn status(&self) -> &ReceiverStatus {
        &self.status
    }
}

impl Receiver for HttpReceiver {
    async fn start(&mut self) -> Result<(), LogvaultError> {
        if self.status == ReceiverStatus::Running {
            return Err(ReceiverError::AlreadyRunning.into());
        }

        let listener = TcpListener::bind(&self.config.bind_addr).await.map_err(|e| {
            ReceiverError::Bind {
                addr: self.config.bind_addr.clone(),
                reason: e.to_string(),
            }
        })?;
        self.local_addr = listener.local_addr().ok();

        info!(addr = ?self.local_addr, "HTTP receiver listening");

        let app = router(self.state.clone());
        let cancel = self.cancel_token.clone();
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(cancel.cancelled_owned())
                .await
            {
                error!(error = %e, "HTTP receiver terminated with error");
            }
        });
        self.tasks.push(task);
        self.status = ReceiverStatus::Running;
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), LogvaultError> {
        if self.status != ReceiverStatus::Running {
            return Err(ReceiverError::NotRunning.into());
        }

        self.cancel_token.cancel();
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }

        self.cancel_token = CancellationToken::new();
        self.status = ReceiverStatus::Stopped;
        info!("HTTP receiver stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match &self.status {
            ReceiverStatus::Running => HealthStatus::Healthy,
            ReceiverStatus::Idle => HealthStatus::Unhealthy("not started".to_owned()),
            ReceiverStatus::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
            ReceiverStatus::Error(reason) => HealthStatus::Unhealthy(reason.clone()),
        }
    }
}
