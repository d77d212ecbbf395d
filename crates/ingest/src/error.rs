//! 수집 파이프라인 에러 타입
//!
//! [`IngestError`]는 파서와 수신기 내부에서 발생하는 모든 에러를
//! 표현합니다. `From<IngestError> for LogvaultError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use logvault_core::error::{LogvaultError, ParseError, ReceiverError};

/// 수집 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// syslog PRI 필드 파싱 실패
    #[error("invalid priority at offset {offset}: {reason}")]
    InvalidPriority { offset: usize, reason: String },

    /// BER 구조 불일치 — 해당 데이터그램은 드롭됩니다
    #[error("invalid ASN.1 at offset {offset}: {reason}")]
    InvalidAsn1 { offset: usize, reason: String },

    /// 지원하지 않는 SNMP 버전
    #[error("invalid SNMP version: {version}")]
    InvalidVersion { version: i64 },

    /// 일반 파싱 실패
    #[error("parse error: {format} at offset {offset}: {reason}")]
    Parse {
        /// 파서 형식 (syslog, json, snmp)
        format: String,
        /// 실패 위치 (바이트 오프셋)
        offset: usize,
        /// 실패 사유
        reason: String,
    },

    /// 입력 데이터 초과
    #[error("input too large: {size} bytes (max: {max})")]
    TooLarge { size: usize, max: usize },

    /// 수신기 에러 (소켓 I/O 등)
    #[error("receiver error: {source_type}: {reason}")]
    Receiver { source_type: String, reason: String },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IngestError> for LogvaultError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::InvalidPriority { offset, reason } => {
                LogvaultError::Parse(ParseError::Failed {
                    format: "syslog".to_owned(),
                    offset,
                    reason,
                })
            }
            IngestError::InvalidAsn1 { offset, reason } => {
                LogvaultError::Parse(ParseError::Failed {
                    format: "snmp".to_owned(),
                    offset,
                    reason,
                })
            }
            IngestError::InvalidVersion { version } => LogvaultError::Parse(ParseError::Failed {
                format: "snmp".to_owned(),
                offset: 0,
                reason: format!("unsupported version {version}"),
            }),
            IngestError::Parse {
                format,
                offset,
                reason,
            } => LogvaultError::Parse(ParseError::Failed {
                format,
                offset,
                reason,
            }),
            IngestError::TooLarge { size, max } => {
                LogvaultError::Parse(ParseError::TooLarge { size, max })
            }
            IngestError::Receiver {
                source_type,
                reason,
            } => LogvaultError::Receiver(ReceiverError::Recv {
                source_type,
                reason,
            }),
            IngestError::Io(e) => LogvaultError::Io(e),
        }
    }
}
