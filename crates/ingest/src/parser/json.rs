//! JSON 로그 추출기
//!
//! 범용 JSON 파서가 아니라, REST 제출 본문에서 인정된 키
//! (`message`, `level`, `host`, `app_name`, `timestamp`)만 바이트 스캔으로
//! 찾아내는 필드 타겟 추출기입니다. 요청 본문 전체는 변형 없이
//! `raw_data`로 보존됩니다.
//!
//! # 추출 규칙
//! - 문자열 값: `"key"` 부분 문자열 위치에서 공백과 `:`를 건너뛰고 `"`를
//!   기대한 뒤, 다음 비이스케이프 `"`까지의 바이트 범위 (`\x` 쌍은
//!   이스케이프된 1바이트로 취급)
//! - `timestamp`: 콜론 뒤의 연속 ASCII 십진수를 부호 있는 64비트 정수로
//! - 누락된 필드는 null이며, 레벨 문자열은 대소문자를 구분해 8단계
//!   열거형에 매핑되고 알 수 없는 값은 `info`가 됩니다

use logvault_core::error::LogvaultError;
use logvault_core::pipeline::LogParser;
use logvault_core::types::{Level, LogEntry, LogSource, now_epoch};

use crate::error::IngestError;

/// JSON 로그 추출기
pub struct JsonLogParser {
    /// 최대 허용 입력 크기 (바이트)
    max_input_size: usize,
}

impl JsonLogParser {
    /// 기본 설정으로 새 추출기를 생성합니다.
    pub fn new() -> Self {
        Self {
            max_input_size: 1024 * 1024, // 1MB
        }
    }

    /// 최대 입력 크기를 설정합니다.
    pub fn with_max_input_size(mut self, size: usize) -> Self {
        self.max_input_size = size;
        self
    }

    fn parse_json(&self, raw: &[u8]) -> Result<LogEntry, IngestError> {
        if raw.len() > self.max_input_size {
            return Err(IngestError::TooLarge {
                size: raw.len(),
                max: self.max_input_size,
            });
        }

        // 최상위가 JSON 객체 형태인지 확인
        let first = raw.iter().position(|b| !b.is_ascii_whitespace());
        if first.map(|idx| raw[idx]) != Some(b'{') {
            return Err(IngestError::Parse {
                format: "json".to_owned(),
                offset: 0,
                reason: "expected JSON object".to_owned(),
            });
        }

        let message = find_string_field(raw, "message")
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default();

        let level = find_string_field(raw, "level")
            .map(|bytes| Level::from_label(&String::from_utf8_lossy(bytes)))
            .unwrap_or_default();

        let host = match find_string_field(raw, "host") {
            Some(bytes) if !bytes.is_empty() => String::from_utf8_lossy(bytes).into_owned(),
            _ => "unknown".to_owned(),
        };

        let app_name =
            find_string_field(raw, "app_name").map(|b| String::from_utf8_lossy(b).into_owned());

        let timestamp = find_int_field(raw, "timestamp").unwrap_or_else(now_epoch);

        Ok(LogEntry {
            id: None,
            timestamp,
            level,
            source: LogSource::RestApi,
            host,
            facility: None,
            app_name,
            proc_id: None,
            msg_id: None,
            message,
            raw_data: raw.to_vec(),
            hmac: None,
        })
    }
}

impl Default for JsonLogParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LogParser for JsonLogParser {
    fn format_name(&self) -> &str {
        "json"
    }

    fn parse(&self, raw: &[u8]) -> Result<LogEntry, LogvaultError> {
        self.parse_json(raw).map_err(LogvaultError::from)
    }
}

/// `"key"` 다음의 따옴표로 감싼 값 바이트 범위를 찾습니다.
///
/// 이스케이프 시퀀스는 해석하지 않고 그대로 반환합니다.
fn find_string_field<'a>(raw: &'a [u8], key: &str) -> Option<&'a [u8]> {
    let mut pos = skip_to_value(raw, key)?;

    if raw.get(pos) != Some(&b'"') {
        return None;
    }
    pos += 1;

    let start = pos;
    while pos < raw.len() {
        match raw[pos] {
            b'\\' => pos += 2, // 이스케이프 쌍은 1바이트로 취급
            b'"' => return Some(&raw[start..pos]),
            _ => pos += 1,
        }
    }
    None
}

/// `"key"` 다음의 연속 십진수를 부호 있는 64비트 정수로 파싱합니다.
fn find_int_field(raw: &[u8], key: &str) -> Option<i64> {
    let mut pos = skip_to_value(raw, key)?;

    let negative = raw.get(pos) == Some(&b'-');
    if negative {
        pos += 1;
    }

    let start = pos;
    while pos < raw.len() && raw[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos == start {
        return None;
    }

    let digits = std::str::from_utf8(&raw[start..pos]).ok()?;
    let value: i64 = digits.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// `"key"` 부분 문자열을 찾아 콜론 뒤 값 시작 위치를 반환합니다.
fn skip_to_value(raw: &[u8], key: &str) -> Option<usize> {
    let needle = format!("\"{key}\"");
    let found = raw
        .windows(needle.len())
        .position(|window| window == needle.as_bytes())?;

    let mut pos = found + needle.len();
    while pos < raw.len() && raw[pos].is_ascii_whitespace() {
        pos += 1;
    }
    if raw.get(pos) != Some(&b':') {
        return None;
    }
    pos += 1;
    while pos < raw.len() && raw[pos].is_ascii_whitespace() {
        pos += 1;
    }
    Some(pos)
}
