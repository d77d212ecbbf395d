#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`parser`]: Syslog RFC 3164, JSON, SNMP 트랩 파서
//! - [`receiver`]: UDP/HTTP 수신기 및 수집 카운터
//! - [`error`]: 도메인 에러 타입
//!
//! # 데이터 흐름
//!
//! ```text
//! UDP 514 ──> SyslogParser ──┐
//! UDP 162 ──> TrapParser  ───┼──> WriteQueue ──> LogStore
//! HTTP    ──> JsonLogParser ─┘ (HTTP는 스토어 직접 삽입)
//! ```

pub mod error;
pub mod parser;
pub mod receiver;

// --- 주요 타입 re-export ---

// 에러
pub use error::IngestError;

// 파서
pub use parser::{JsonLogParser, SnmpVersion, SyslogParser, TrapParser};

// 수신기
pub use receiver::{
    ApiState, HttpReceiver, HttpReceiverConfig, IngestCounters, ReceiverStatus, UdpLogReceiver,
    UdpReceiverConfig,
};
