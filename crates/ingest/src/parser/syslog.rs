//! Syslog RFC 3164 파서
//!
//! [RFC 3164](https://tools.ietf.org/html/rfc3164) (BSD syslog) 형식의
//! 데이터그램을 탐욕적 좌→우 스캔으로 파싱합니다.
//!
//! # 메시지 형식
//! ```text
//! <PRI>MMM DD HH:MM:SS hostname app[pid]: message
//! ```
//!
//! 타임스탬프는 선택적이며, 15바이트 형태가 일치하지 않으면 같은 위치에서
//! 호스트명 파싱을 계속합니다. `facility = PRI >> 3`, `severity = PRI & 7`,
//! 레벨은 severity 코드와 동일합니다.
//!
//! # 사용 예시
//! ```ignore
//! use logvault_ingest::parser::SyslogParser;
//! use logvault_core::pipeline::LogParser;
//!
//! let parser = SyslogParser::new();
//! let entry = parser.parse(b"<34>Jan 15 12:00:00 myhost sshd[1234]: Failed password")?;
//! assert_eq!(entry.app_name.as_deref(), Some("sshd"));
//! ```

use chrono::{Datelike, NaiveDateTime, Utc};

use logvault_core::error::LogvaultError;
use logvault_core::pipeline::LogParser;
use logvault_core::types::{Level, LogEntry, LogSource, now_epoch};

use crate::error::IngestError;

/// 유효한 최대 PRI 값
const MAX_SYSLOG_PRI: u32 = 255;

/// RFC 3164 타임스탬프 고정 길이 ("MMM DD HH:MM:SS")
const TIMESTAMP_LEN: usize = 15;

/// 세 글자 영어 월 이름 (RFC 3164 고정 표기)
const MONTHS: [&[u8; 3]; 12] = [
    b"Jan", b"Feb", b"Mar", b"Apr", b"May", b"Jun", b"Jul", b"Aug", b"Sep", b"Oct", b"Nov", b"Dec",
];

/// Syslog RFC 3164 파서
///
/// core의 [`LogParser`] trait을 구현하여 데이터그램을 `LogEntry`로
/// 변환합니다. 원본 데이터그램 전체가 `raw_data`로 보존됩니다.
pub struct SyslogParser {
    /// 최대 허용 입력 크기 (바이트)
    max_input_size: usize,
}

impl SyslogParser {
    /// 기본 설정으로 새 파서를 생성합니다.
    pub fn new() -> Self {
        Self {
            max_input_size: 65_535, // 최대 UDP 페이로드
        }
    }

    /// 최대 입력 크기를 설정합니다.
    pub fn with_max_input_size(mut self, size: usize) -> Self {
        self.max_input_size = size;
        self
    }

    /// PRI 값에서 facility와 severity를 분리합니다.
    ///
    /// facility = PRI >> 3, severity = PRI & 7
    fn decode_pri(pri: u32) -> (u8, u8) {
        ((pri >> 3) as u8, (pri & 7) as u8)
    }

    /// 원시 syslog 데이터그램을 파싱합니다.
    fn parse_syslog(&self, raw: &[u8]) -> Result<LogEntry, IngestError> {
        if raw.len() > self.max_input_size {
            return Err(IngestError::TooLarge {
                size: raw.len(),
                max: self.max_input_size,
            });
        }

        // PRI: <DDD> (1~3자리 십진수, 0~255)
        if raw.first() != Some(&b'<') {
            return Err(IngestError::InvalidPriority {
                offset: 0,
                reason: "missing leading '<'".to_owned(),
            });
        }

        let mut pos = 1;
        let mut pri: u32 = 0;
        let mut digits = 0;
        while pos < raw.len() && raw[pos].is_ascii_digit() && digits < 3 {
            pri = pri * 10 + u32::from(raw[pos] - b'0');
            pos += 1;
            digits += 1;
        }

        if digits == 0 {
            return Err(IngestError::InvalidPriority {
                offset: pos,
                reason: "missing digits".to_owned(),
            });
        }
        if raw.get(pos) != Some(&b'>') {
            return Err(IngestError::InvalidPriority {
                offset: pos,
                reason: "missing closing '>'".to_owned(),
            });
        }
        if pri > MAX_SYSLOG_PRI {
            return Err(IngestError::InvalidPriority {
                offset: 1,
                reason: format!("value {pri} out of range (0-{MAX_SYSLOG_PRI})"),
            });
        }
        pos += 1;

        let (facility, severity) = Self::decode_pri(pri);

        // 타임스탬프 (선택): 15바이트 형태가 일치할 때만 소비
        let timestamp = match parse_rfc3164_timestamp(&raw[pos..]) {
            Some(ts) => {
                pos += TIMESTAMP_LEN;
                if raw.get(pos) == Some(&b' ') {
                    pos += 1;
                }
                ts
            }
            None => now_epoch(),
        };

        // 호스트명: 첫 공백 또는 콜론 전까지
        let host_start = pos;
        while pos < raw.len() && raw[pos] != b' ' && raw[pos] != b':' {
            pos += 1;
        }
        let host = if pos == host_start {
            "unknown".to_owned()
        } else {
            String::from_utf8_lossy(&raw[host_start..pos]).into_owned()
        };
        while raw.get(pos) == Some(&b' ') {
            pos += 1;
        }

        // app[pid]: 태그. '[', ':', 공백 전까지가 app 이름
        let app_start = pos;
        while pos < raw.len() && raw[pos] != b'[' && raw[pos] != b':' && raw[pos] != b' ' {
            pos += 1;
        }
        let app_name = if pos == app_start {
            None
        } else {
            Some(String::from_utf8_lossy(&raw[app_start..pos]).into_owned())
        };

        let mut proc_id = None;
        if raw.get(pos) == Some(&b'[') {
            pos += 1;
            let pid_start = pos;
            while pos < raw.len() && raw[pos] != b']' {
                pos += 1;
            }
            proc_id = Some(String::from_utf8_lossy(&raw[pid_start..pos]).into_owned());
            if pos < raw.len() {
                pos += 1; // consume ']'
            }
        }

        // 후행 콜론과 공백 소비
        while matches!(raw.get(pos), Some(&b':') | Some(&b' ')) {
            pos += 1;
        }

        // 나머지 전체가 메시지
        let message = String::from_utf8_lossy(&raw[pos..]).into_owned();

        Ok(LogEntry {
            id: None,
            timestamp,
            level: Level::from_code(severity),
            source: LogSource::Syslog,
            host,
            facility: Some(facility),
            app_name,
            proc_id,
            msg_id: None,
            message,
            raw_data: raw.to_vec(),
            hmac: None,
        })
    }
}

/// 15바이트 RFC 3164 타임스탬프를 epoch 초로 변환합니다.
///
/// 형태가 일치하지 않으면 `None`을 반환하며, 이 경우 호출자는 같은
/// 위치에서 파싱을 계속합니다. 연도 정보가 없으므로 현재 UTC 연도를
/// 가정합니다.
fn parse_rfc3164_timestamp(input: &[u8]) -> Option<i64> {
    if input.len() < TIMESTAMP_LEN {
        return None;
    }
    let ts = &input[..TIMESTAMP_LEN];

    // 구조 검사: "MMM DD HH:MM:SS"
    if ts[3] != b' ' || ts[6] != b' ' || ts[9] != b':' || ts[12] != b':' {
        return None;
    }
    let month: &[u8; 3] = ts[0..3].try_into().ok()?;
    if !MONTHS.contains(&month) {
        return None;
    }
    // 일(DD)은 공백 패딩 허용
    if !(ts[4] == b' ' || ts[4].is_ascii_digit()) || !ts[5].is_ascii_digit() {
        return None;
    }
    for idx in [7, 8, 10, 11, 13, 14] {
        if !ts[idx].is_ascii_digit() {
            return None;
        }
    }

    // 형태가 일치하면 15바이트를 소비. 달력상 불가능한 날짜는 현재
    // 시각으로 대체한다.
    let text = String::from_utf8_lossy(ts);
    let with_year = format!("{} {}", Utc::now().year(), text);
    let epoch = NaiveDateTime::parse_from_str(&with_year, "%Y %b %e %H:%M:%S")
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_else(|_| now_epoch());
    Some(epoch)
}

impl Default for SyslogParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LogParser for SyslogParser {
    fn format_name(&self) -> &str {
        "syslog"
    }

    fn parse(&self, raw: &[u8]) -> Result<LogEntry, LogvaultError> {
        self.parse_syslog(raw).map_err(LogvaultError::from)
    }
}
