//! 로그 파싱 모듈 — 채널별 파서
//!
//! 각 파서는 core의 [`LogParser`](logvault_core::pipeline::LogParser)
//! trait을 구현하며, 원본 바이트 전체를 `raw_data`로 보존합니다.
//!
//! # 지원 형식
//! - Syslog RFC 3164 ([`SyslogParser`])
//! - REST 제출 JSON ([`JsonLogParser`])
//! - SNMP v1/v2c 트랩 ([`TrapParser`])

pub mod json;
pub mod snmp;
pub mod syslog;

pub use json::JsonLogParser;
pub use snmp::{SnmpVersion, TrapParser};
pub use syslog::SyslogParser;
