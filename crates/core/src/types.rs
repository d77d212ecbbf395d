//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 모든 수집 경로가 생성하고 스토리지가 영속화하는 정규 레코드
//! [`LogEntry`]와 그 구성 열거형을 정의합니다.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// 현재 벽시계 시각을 Unix epoch 초로 반환합니다.
///
/// 시스템 시간이 epoch 이전이면 0을 반환합니다.
pub fn now_epoch() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// 로그 심각도 레벨
///
/// syslog의 8단계 severity 코드(0=emergency ~ 7=debug)와 1:1 대응합니다.
/// 숫자 코드가 작을수록 심각합니다.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Level {
    /// 시스템 사용 불가 (0)
    Emergency,
    /// 즉시 조치 필요 (1)
    Alert,
    /// 치명적 상태 (2)
    Critical,
    /// 에러 (3)
    Error,
    /// 경고 (4)
    Warning,
    /// 정상이지만 주목할 상태 (5)
    Notice,
    /// 정보성 (6)
    #[default]
    Info,
    /// 디버그 (7)
    Debug,
}

impl Level {
    /// syslog severity 코드(0~7)에서 레벨을 생성합니다.
    ///
    /// 범위 밖의 코드는 `Info`로 매핑됩니다.
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Emergency,
            1 => Self::Alert,
            2 => Self::Critical,
            3 => Self::Error,
            4 => Self::Warning,
            5 => Self::Notice,
            6 => Self::Info,
            7 => Self::Debug,
            _ => Self::Info,
        }
    }

    /// syslog severity 코드를 반환합니다.
    pub fn code(self) -> u8 {
        match self {
            Self::Emergency => 0,
            Self::Alert => 1,
            Self::Critical => 2,
            Self::Error => 3,
            Self::Warning => 4,
            Self::Notice => 5,
            Self::Info => 6,
            Self::Debug => 7,
        }
    }

    /// 레벨 문자열에서 레벨을 생성합니다.
    ///
    /// 대소문자를 구분하며, 알 수 없는 문자열은 `Info`로 매핑됩니다.
    pub fn from_label(label: &str) -> Self {
        match label {
            "emergency" => Self::Emergency,
            "alert" => Self::Alert,
            "critical" => Self::Critical,
            "error" => Self::Error,
            "warning" => Self::Warning,
            "notice" => Self::Notice,
            "info" => Self::Info,
            "debug" => Self::Debug,
            _ => Self::Info,
        }
    }

    /// 레벨 이름을 반환합니다.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Emergency => "emergency",
            Self::Alert => "alert",
            Self::Critical => "critical",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Notice => "notice",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 로그 유입 채널
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum LogSource {
    /// UDP syslog (0)
    #[default]
    Syslog,
    /// HTTP REST API (1)
    RestApi,
    /// SNMP 트랩 (2)
    Snmp,
}

impl LogSource {
    /// 저장용 숫자 코드를 반환합니다.
    pub fn code(self) -> u8 {
        match self {
            Self::Syslog => 0,
            Self::RestApi => 1,
            Self::Snmp => 2,
        }
    }

    /// 숫자 코드에서 소스를 생성합니다. 알 수 없는 코드는 `Syslog`로 매핑됩니다.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::RestApi,
            2 => Self::Snmp,
            _ => Self::Syslog,
        }
    }

    /// 소스 이름을 반환합니다.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Syslog => "syslog",
            Self::RestApi => "rest_api",
            Self::Snmp => "snmp",
        }
    }
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 로그 엔트리
///
/// 모든 수집 경로(syslog, REST, SNMP)가 생성하는 정규 인메모리 레코드입니다.
/// `id`와 `hmac`은 스토리지가 삽입 시점에 채우며, 삽입 전에는 `None`입니다.
/// `raw_data`는 원본 레코드의 바이트를 변형 없이 보존합니다 (NUL 포함 가능).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// 스토리지가 부여하는 행 ID (단조 증가)
    pub id: Option<i64>,
    /// Unix epoch 초. 소스에 없으면 파싱 시점 벽시계로 채워집니다.
    pub timestamp: i64,
    /// 심각도
    pub level: Level,
    /// 유입 채널
    pub source: LogSource,
    /// 호스트명. 소스에 없으면 "unknown".
    pub host: String,
    /// syslog facility (0~23)
    pub facility: Option<u8>,
    /// 애플리케이션 이름
    pub app_name: Option<String>,
    /// 프로세스 ID
    pub proc_id: Option<String>,
    /// 메시지 ID
    pub msg_id: Option<String>,
    /// 메시지 본문
    pub message: String,
    /// 원본 레코드 바이트 (byte-exact)
    pub raw_data: Vec<u8>,
    /// 32바이트 체인 다이제스트 (스토리지가 계산)
    pub hmac: Option<Vec<u8>>,
}

impl LogEntry {
    /// 기본값이 채워진 새 엔트리를 생성합니다.
    ///
    /// 타임스탬프는 현재 벽시계, 호스트는 "unknown"으로 설정됩니다.
    pub fn new(source: LogSource, message: impl Into<String>, raw_data: Vec<u8>) -> Self {
        Self {
            id: None,
            timestamp: now_epoch(),
            level: Level::Info,
            source,
            host: "unknown".to_owned(),
            facility: None,
            app_name: None,
            proc_id: None,
            msg_id: None,
            message: message.into(),
            raw_data,
            hmac: None,
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} {}: {}",
            self.level,
            self.source,
            self.host,
            self.app_name.as_deref().unwrap_or("-"),
            self.message,
        )
    }
}
