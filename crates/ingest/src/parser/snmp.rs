//! SNMP 트랩 파서 (BER 서브셋)
//!
//! SNMP v1/v2c 트랩 데이터그램의 봉투(버전, 커뮤니티, PDU 태그)를
//! BER(Basic Encoding Rules) 서브셋으로 디코딩합니다. varbind 해석은
//! 이 코어의 범위 밖이며, v1 트랩의 PDU 본문에서는 에이전트 주소만
//! 베스트에포트로 추출합니다.
//!
//! # 지원 BER 타입
//! - 길이: 단축형 (0~127), 장축형 (`0x80|n`, n ≤ 4 빅엔디언 길이 바이트)
//! - INTEGER (0x02): 부호 있는 2의 보수
//! - OCTET STRING (0x04): 원시 바이트
//! - SEQUENCE (0x30): 내부 슬라이스 반환
//! - OID (0x06): 첫 바이트 `v1 = b/40`, `v2 = b%40`, 이후 base-128 연속
//! - PDU 태그: 0xA4 (trap v1), 0xA7 (trap v2)
//!
//! BER 불일치는 `InvalidAsn1`이 되어 데이터그램이 드롭됩니다.

use std::fmt;

use logvault_core::error::LogvaultError;
use logvault_core::pipeline::LogParser;
use logvault_core::types::{Level, LogEntry, LogSource};

use crate::error::IngestError;

const TAG_INTEGER: u8 = 0x02;
const TAG_OCTET_STRING: u8 = 0x04;
const TAG_OID: u8 = 0x06;
const TAG_SEQUENCE: u8 = 0x30;
const TAG_IP_ADDRESS: u8 = 0x40;
const TAG_TRAP_V1: u8 = 0xA4;
const TAG_TRAP_V2: u8 = 0xA7;

/// SNMP 프로토콜 버전
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnmpVersion {
    /// SNMPv1 (wire 값 0)
    V1,
    /// SNMPv2c (wire 값 1)
    V2c,
    /// SNMPv3 (wire 값 3)
    V3,
}

impl fmt::Display for SnmpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "v1"),
            Self::V2c => write!(f, "v2c"),
            Self::V3 => write!(f, "v3"),
        }
    }
}

/// BER 바이트 리더
///
/// 슬라이스 위에서 태그-길이-값 구조를 순차적으로 읽습니다.
struct BerReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BerReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn invalid(&self, reason: impl Into<String>) -> IngestError {
        IngestError::InvalidAsn1 {
            offset: self.pos,
            reason: reason.into(),
        }
    }

    fn read_byte(&mut self) -> Result<u8, IngestError> {
        let byte = *self
            .buf
            .get(self.pos)
            .ok_or_else(|| self.invalid("unexpected end of input"))?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8], IngestError> {
        if len > self.remaining() {
            return Err(self.invalid(format!(
                "length {len} exceeds remaining {} bytes",
                self.remaining()
            )));
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// BER 길이를 읽습니다 (단축형/장축형).
    fn read_length(&mut self) -> Result<usize, IngestError> {
        let first = self.read_byte()?;
        if first & 0x80 == 0 {
            return Ok(first as usize);
        }

        let count = (first & 0x7F) as usize;
        if count == 0 || count > 4 {
            return Err(self.invalid(format!("unsupported length form 0x{first:02X}")));
        }

        let mut len = 0usize;
        for _ in 0..count {
            len = (len << 8) | self.read_byte()? as usize;
        }
        Ok(len)
    }

    /// 태그와 길이를 읽습니다. 길이는 잔여 입력을 넘을 수 없습니다.
    fn read_header(&mut self) -> Result<(u8, usize), IngestError> {
        let tag = self.read_byte()?;
        let len = self.read_length()?;
        if len > self.remaining() {
            return Err(self.invalid(format!("declared length {len} exceeds input")));
        }
        Ok((tag, len))
    }

    /// 기대하는 태그의 길이를 읽습니다.
    fn expect_tag(&mut self, expected: u8) -> Result<usize, IngestError> {
        let (tag, len) = self.read_header()?;
        if tag != expected {
            return Err(self.invalid(format!(
                "expected tag 0x{expected:02X}, found 0x{tag:02X}"
            )));
        }
        Ok(len)
    }

    /// INTEGER (0x02)를 부호 있는 64비트 정수로 읽습니다.
    fn read_integer(&mut self) -> Result<i64, IngestError> {
        let len = self.expect_tag(TAG_INTEGER)?;
        if len == 0 || len > 8 {
            return Err(self.invalid(format!("integer length {len} out of range")));
        }
        let bytes = self.read_slice(len)?;

        // 2의 보수 부호 확장
        let mut value: i64 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
        for &byte in bytes {
            value = (value << 8) | i64::from(byte);
        }
        Ok(value)
    }

    /// OCTET STRING (0x04)의 원시 바이트를 읽습니다.
    fn read_octet_string(&mut self) -> Result<&'a [u8], IngestError> {
        let len = self.expect_tag(TAG_OCTET_STRING)?;
        self.read_slice(len)
    }

    /// SEQUENCE (0x30)의 내부 슬라이스를 읽습니다.
    fn read_sequence(&mut self) -> Result<&'a [u8], IngestError> {
        let len = self.expect_tag(TAG_SEQUENCE)?;
        self.read_slice(len)
    }

    /// OID (0x06)를 점 표기 문자열로 읽습니다.
    fn read_oid(&mut self) -> Result<String, IngestError> {
        let len = self.expect_tag(TAG_OID)?;
        if len == 0 {
            return Err(self.invalid("empty OID"));
        }
        let bytes = self.read_slice(len)?;

        // 첫 바이트는 처음 두 서브 식별자를 인코딩
        let first = bytes[0];
        let mut rendered = format!("{}.{}", first / 40, first % 40);

        let mut value: u64 = 0;
        for &byte in &bytes[1..] {
            value = (value << 7) | u64::from(byte & 0x7F);
            if byte & 0x80 == 0 {
                rendered.push('.');
                rendered.push_str(&value.to_string());
                value = 0;
            }
        }
        if bytes.len() > 1 && bytes[bytes.len() - 1] & 0x80 != 0 {
            return Err(self.invalid("truncated OID sub-identifier"));
        }
        Ok(rendered)
    }
}

/// SNMP 트랩 파서
///
/// 봉투를 디코딩하여 `LogEntry`로 매핑합니다:
/// `source = snmp`, `level = notice`, `app_name = "snmptrapd"`,
/// `host`는 v1 에이전트 주소의 dotted-quad (파싱 실패 시 "unknown").
pub struct TrapParser {
    /// 최대 허용 입력 크기 (바이트)
    max_input_size: usize,
}

impl TrapParser {
    /// 기본 설정으로 새 파서를 생성합니다.
    pub fn new() -> Self {
        Self {
            max_input_size: 65_535,
        }
    }

    fn parse_trap(&self, raw: &[u8]) -> Result<LogEntry, IngestError> {
        if raw.len() > self.max_input_size {
            return Err(IngestError::TooLarge {
                size: raw.len(),
                max: self.max_input_size,
            });
        }

        let mut outer = BerReader::new(raw);
        let body = outer.read_sequence()?;

        let mut reader = BerReader::new(body);
        let version = match reader.read_integer()? {
            0 => SnmpVersion::V1,
            1 => SnmpVersion::V2c,
            3 => SnmpVersion::V3,
            other => return Err(IngestError::InvalidVersion { version: other }),
        };
        let _community = reader.read_octet_string()?;

        let (pdu_tag, pdu_len) = reader.read_header()?;
        let pdu = reader.read_slice(pdu_len)?;

        let (generic_trap, specific_trap, host) = match pdu_tag {
            // v1 trap PDU 본문은 에이전트 주소만 추출하고 generic trap은
            // enterpriseSpecific(6) 플레이스홀더로 둔다
            TAG_TRAP_V1 => {
                let host = v1_agent_addr(pdu).unwrap_or_else(|| "unknown".to_owned());
                (6, 0, host)
            }
            TAG_TRAP_V2 => (0, 0, "unknown".to_owned()),
            tag => {
                return Err(IngestError::InvalidAsn1 {
                    offset: 0,
                    reason: format!("unexpected PDU tag 0x{tag:02X}"),
                });
            }
        };

        tracing::debug!(%version, generic_trap, specific_trap, "decoded SNMP trap envelope");

        let message = format!("Trap Type: {generic_trap} Specific: {specific_trap}");

        let mut entry = LogEntry::new(LogSource::Snmp, message, raw.to_vec());
        entry.level = Level::Notice;
        entry.host = host;
        entry.app_name = Some("snmptrapd".to_owned());
        Ok(entry)
    }
}

/// v1 trap PDU에서 에이전트 주소를 추출합니다.
///
/// PDU 본문은 enterprise OID, agent-addr(0x40, 4바이트) 순서로
/// 시작합니다. 어느 단계든 실패하면 `None`입니다.
fn v1_agent_addr(pdu: &[u8]) -> Option<String> {
    let mut reader = BerReader::new(pdu);
    reader.read_oid().ok()?;

    let (tag, len) = reader.read_header().ok()?;
    if tag != TAG_IP_ADDRESS || len != 4 {
        return None;
    }
    let addr = reader.read_slice(4).ok()?;
    Some(format!("{}.{}.{}.{}", addr[0], addr[1], addr[2], addr[3]))
}

impl Default for TrapParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LogParser for TrapParser {
    fn format_name(&self) -> &str {
        "snmp"
    }

    fn parse(&self, raw: &[u8]) -> Result<LogEntry, LogvaultError> {
        self.parse_trap(raw).map_err(LogvaultError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_integer_short() {
        let mut reader = BerReader::new(&[0x02, 0x01, 0x05]);
        assert_eq!(reader.read_integer().unwrap(), 5);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn read_integer_multi_byte() {
        let mut reader = BerReader::new(&[0x02, 0x02, 0x01, 0x00]);
        assert_eq!(reader.read_integer().unwrap(), 256);
    }

    #[test]
    fn read_integer_negative() {
        let mut reader = BerReader::new(&[0x02, 0x01, 0xFF]);
        assert_eq!(reader.read_integer().unwrap(), -1);

        let mut reader = BerReader::new(&[0x02, 0x02, 0xFF, 0x7F]);
        assert_eq!(reader.read_integer().unwrap(), -129);
    }

    #[test]
    fn read_integer_rejects_empty_and_oversized() {
        let mut reader = BerReader::new(&[0x02, 0x00]);
        assert!(reader.read_integer().is_err());

        let mut reader = BerReader::new(&[0x02, 0x09, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert!(reader.read_integer().is_err());
    }

    #[test]
    fn read_octet_string_public() {
        let mut reader = BerReader::new(&[0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c']);
        assert_eq!(reader.read_octet_string().unwrap(), b"public");
    }

    #[test]
    fn read_length_long_form_256_consumes_three_bytes() {
        let mut reader = BerReader::new(&[0x82, 0x01, 0x00]);
        assert_eq!(reader.read_length().unwrap(), 256);
        assert_eq!(reader.pos, 3);
    }

    #[test]
    fn read_length_short_form() {
        let mut reader = BerReader::new(&[0x7F]);
        assert_eq!(reader.read_length().unwrap(), 127);
        assert_eq!(reader.pos, 1);
    }

    #[test]
    fn read_length_rejects_more_than_four_bytes() {
        let mut reader = BerReader::new(&[0x85, 0x01, 0x02, 0x03, 0x04, 0x05]);
        assert!(reader.read_length().is_err());
    }

    #[test]
    fn read_sequence_returns_inner_slice() {
        let mut reader = BerReader::new(&[0x30, 0x03, 0x02, 0x01, 0x07]);
        let inner = reader.read_sequence().unwrap();
        assert_eq!(inner, &[0x02, 0x01, 0x07]);
    }

    #[test]
    fn read_oid_sys_descr() {
        // 1.3.6.1.2.1.1.1.0 (sysDescr)
        let mut reader =
            BerReader::new(&[0x06, 0x08, 0x2B, 0x06, 0x01, 0x02, 0x01, 0x01, 0x01, 0x00]);
        assert_eq!(reader.read_oid().unwrap(), "1.3.6.1.2.1.1.1.0");
    }

    #[test]
    fn read_oid_with_multibyte_subidentifier() {
        // 1.3.6.1.4.1.311 — 311 = 0x82 0x37 (base-128 연속)
        let mut reader =
            BerReader::new(&[0x06, 0x07, 0x2B, 0x06, 0x01, 0x04, 0x01, 0x82, 0x37]);
        assert_eq!(reader.read_oid().unwrap(), "1.3.6.1.4.1.311");
    }

    #[test]
    fn read_oid_rejects_trailing_continuation() {
        let mut reader = BerReader::new(&[0x06, 0x02, 0x2B, 0x86]);
        assert!(reader.read_oid().is_err());
    }

    /// v2c 트랩 봉투: SEQUENCE { INTEGER 1, OCTET STRING "public", 0xA7 빈 PDU }
    fn v2c_trap_packet() -> Vec<u8> {
        vec![
            0x30, 0x0D, // SEQUENCE, len 13
            0x02, 0x01, 0x01, // INTEGER 1 (v2c)
            0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c', // community
            0xA7, 0x00, // SNMPv2-Trap-PDU, 비어 있음
        ]
    }

    /// v1 트랩 봉투: enterprise OID + agent addr 192.168.1.1 포함
    fn v1_trap_packet() -> Vec<u8> {
        vec![
            0x30, 0x25, // SEQUENCE, len 37
            0x02, 0x01, 0x00, // INTEGER 0 (v1)
            0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c', // community
            0xA4, 0x18, // Trap-PDU, len 24
            0x06, 0x05, 0x2B, 0x06, 0x01, 0x04, 0x01, // enterprise 1.3.6.1.4.1
            0x40, 0x04, 0xC0, 0xA8, 0x01, 0x01, // agent addr 192.168.1.1
            0x02, 0x01, 0x06, // generic-trap 6
            0x02, 0x01, 0x00, // specific-trap 0
            0x43, 0x01, 0x00, // time-ticks 0
            0x30, 0x00, // 빈 varbind 목록
        ]
    }

    #[test]
    fn parse_v2c_trap_maps_to_entry() {
        let parser = TrapParser::new();
        let raw = v2c_trap_packet();
        let entry = parser.parse(&raw).unwrap();
        assert_eq!(entry.source, LogSource::Snmp);
        assert_eq!(entry.level, Level::Notice);
        assert_eq!(entry.app_name.as_deref(), Some("snmptrapd"));
        assert_eq!(entry.host, "unknown");
        assert_eq!(entry.message, "Trap Type: 0 Specific: 0");
        assert_eq!(entry.raw_data, raw);
    }

    #[test]
    fn parse_v1_trap_extracts_agent_address() {
        let parser = TrapParser::new();
        let entry = parser.parse(&v1_trap_packet()).unwrap();
        assert_eq!(entry.host, "192.168.1.1");
        assert_eq!(entry.message, "Trap Type: 6 Specific: 0");
        assert_eq!(entry.level, Level::Notice);
    }

    #[test]
    fn parse_v1_trap_without_agent_addr_is_unknown_host() {
        // PDU 본문이 비어 있는 v1 트랩
        let raw = vec![
            0x30, 0x0D, 0x02, 0x01, 0x00, 0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c', 0xA4,
            0x00,
        ];
        let parser = TrapParser::new();
        let entry = parser.parse(&raw).unwrap();
        assert_eq!(entry.host, "unknown");
        assert_eq!(entry.message, "Trap Type: 6 Specific: 0");
    }

    #[test]
    fn parse_rejects_invalid_version() {
        // version 2는 정의되지 않은 wire 값
        let raw = vec![
            0x30, 0x0D, 0x02, 0x01, 0x02, 0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c', 0xA7,
            0x00,
        ];
        let parser = TrapParser::new();
        let err = parser.parse(&raw).unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn parse_rejects_unexpected_pdu_tag() {
        // 0xA0 (GetRequest)은 트랩이 아님
        let raw = vec![
            0x30, 0x0D, 0x02, 0x01, 0x01, 0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c', 0xA0,
            0x00,
        ];
        let parser = TrapParser::new();
        assert!(parser.parse(&raw).is_err());
    }

    #[test]
    fn parse_rejects_garbage() {
        let parser = TrapParser::new();
        assert!(parser.parse(b"").is_err());
        assert!(parser.parse(b"not ber at all").is_err());
        assert!(parser.parse(&[0x30]).is_err());
        // 선언된 길이가 입력보다 긴 경우
        assert!(parser.parse(&[0x30, 0x7F, 0x02, 0x01, 0x00]).is_err());
    }

    #[test]
    fn parse_preserves_raw_datagram() {
        let parser = TrapParser::new();
        let raw = v1_trap_packet();
        let entry = parser.parse(&raw).unwrap();
        assert_eq!(entry.raw_data, raw);
    }

    #[test]
    fn format_name_is_snmp() {
        assert_eq!(TrapParser::new().format_name(), "snmp");
    }
}
