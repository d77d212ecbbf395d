//! 에러 타입 — 도메인별 에러 정의

/// Logvault 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LogvaultError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 로그 파싱 에러
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// 스토리지 에러
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// 수신기 에러
    #[error("receiver error: {0}")]
    Receiver(#[from] ReceiverError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파싱 에러
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// 파싱 실패
    #[error("parse failed: {format} at offset {offset}: {reason}")]
    Failed {
        format: String,
        offset: usize,
        reason: String,
    },

    /// 지원하지 않는 형식
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// 입력 데이터 초과
    #[error("input too large: {size} bytes (max: {max})")]
    TooLarge { size: usize, max: usize },
}

/// 스토리지 에러
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// 데이터베이스 열기 실패
    #[error("failed to open database '{path}': {reason}")]
    Open { path: String, reason: String },

    /// 쿼리 실패
    #[error("query failed: {0}")]
    Query(String),

    /// 무결성 체인 검증 실패
    #[error("hmac chain broken at row {id}")]
    ChainBroken { id: i64 },
}

/// 수신기 에러
#[derive(Debug, thiserror::Error)]
pub enum ReceiverError {
    /// 소켓 바인드 실패
    #[error("failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },

    /// 수신 실패
    #[error("receive error: {source_type}: {reason}")]
    Recv { source_type: String, reason: String },

    /// 이미 실행 중
    #[error("receiver already running")]
    AlreadyRunning,

    /// 실행 중이 아님
    #[error("receiver not running")]
    NotRunning,
}
