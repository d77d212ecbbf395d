//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 크레이트는 이 상수를 사용하여 `metrics::counter!()`,
//! `metrics::gauge!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logvault_`
//! - 접미어: `_total` (counter), `_seconds` (uptime), 없음 (gauge)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 유입 채널 레이블 키 (syslog, rest_api, snmp)
pub const LABEL_SOURCE: &str = "source";

// ─── 수집 메트릭 ───────────────────────────────────────────────────

/// 수신된 전체 레코드 수 (counter, label: source)
pub const INGEST_RECEIVED_TOTAL: &str = "logvault_ingest_received_total";

/// 파싱 실패로 드롭된 레코드 수 (counter, label: source)
pub const INGEST_PARSE_ERRORS_TOTAL: &str = "logvault_ingest_parse_errors_total";

// ─── 스토리지/큐 메트릭 ────────────────────────────────────────────

/// 영속화된 행 수 (counter)
pub const STORAGE_ROWS_WRITTEN_TOTAL: &str = "logvault_storage_rows_written_total";

/// 플러시된 배치 수 (counter)
pub const QUEUE_BATCHES_FLUSHED_TOTAL: &str = "logvault_queue_batches_flushed_total";

/// 현재 큐에 대기 중인 엔트리 수 (gauge)
pub const QUEUE_DEPTH: &str = "logvault_queue_depth";

// ─── 데몬 메트릭 ───────────────────────────────────────────────────

/// 데몬 업타임 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "logvault_daemon_uptime_seconds";

/// 모든 메트릭의 설명을 등록합니다.
///
/// 메트릭 레코더 설치 직후 한 번 호출합니다.
pub fn describe_all() {
    metrics::describe_counter!(
        INGEST_RECEIVED_TOTAL,
        "Total log records received, labeled by source channel"
    );
    metrics::describe_counter!(
        INGEST_PARSE_ERRORS_TOTAL,
        "Total records dropped due to parse failure, labeled by source channel"
    );
    metrics::describe_counter!(
        STORAGE_ROWS_WRITTEN_TOTAL,
        "Total rows persisted to the log store"
    );
    metrics::describe_counter!(
        QUEUE_BATCHES_FLUSHED_TOTAL,
        "Total write-queue batches flushed to storage"
    );
    metrics::describe_gauge!(QUEUE_DEPTH, "Entries currently staged in the write queue");
    metrics::describe_gauge!(DAEMON_UPTIME_SECONDS, "Daemon uptime in seconds");
}
