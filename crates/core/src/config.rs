//! 설정 관리 — 런타임 설정 및 검증
//!
//! [`LogvaultConfig`]는 데몬 전체의 섹션별 설정을 담습니다.
//! CLI 플래그에서 조립되며, 시작 전 [`LogvaultConfig::validate`]로
//! 검증됩니다.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Logvault 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogvaultConfig {
    /// 일반 설정
    pub general: GeneralConfig,
    /// 스토리지 설정
    pub storage: StorageConfig,
    /// 쓰기 큐 설정
    pub queue: QueueConfig,
    /// Syslog 수신기 설정
    pub syslog: SyslogConfig,
    /// REST API 수신기 설정
    pub rest: RestConfig,
    /// SNMP 트랩 수신기 설정
    pub snmp: SnmpConfig,
    /// 메트릭 설정
    pub metrics: MetricsConfig,
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// 로그 레벨
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 스토리지 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite 데이터베이스 파일 경로
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "logs.db".to_owned(),
        }
    }
}

/// 쓰기 큐 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// 배치 크기 (이 개수만큼 모이면 즉시 플러시)
    pub batch_size: usize,
    /// 배치 플러시 간격 (밀리초)
    pub flush_interval_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            flush_interval_ms: 1_000,
        }
    }
}

/// Syslog 수신기 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyslogConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 바인드 주소
    pub bind_addr: String,
}

impl Default for SyslogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_addr: "0.0.0.0:514".to_owned(),
        }
    }
}

/// REST API 수신기 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 바인드 주소
    pub bind_addr: String,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_addr: "0.0.0.0:8080".to_owned(),
        }
    }
}

/// SNMP 트랩 수신기 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnmpConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 바인드 주소
    pub bind_addr: String,
}

impl Default for SnmpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_addr: "0.0.0.0:162".to_owned(),
        }
    }
}

/// 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// Prometheus 엔드포인트 바인드 주소
    pub listen_addr: String,
    /// Prometheus 엔드포인트 포트
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9100,
        }
    }
}

impl LogvaultConfig {
    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        const MAX_BATCH_SIZE: usize = 100_000;
        const MAX_FLUSH_INTERVAL_MS: u64 = 3_600_000; // 1 hour

        if self.storage.db_path.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "storage.db_path".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.queue.batch_size == 0 || self.queue.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "queue.batch_size".to_owned(),
                reason: format!("must be 1-{MAX_BATCH_SIZE}"),
            });
        }

        if self.queue.flush_interval_ms == 0 || self.queue.flush_interval_ms > MAX_FLUSH_INTERVAL_MS
        {
            return Err(ConfigError::InvalidValue {
                field: "queue.flush_interval_ms".to_owned(),
                reason: format!("must be 1-{MAX_FLUSH_INTERVAL_MS}"),
            });
        }

        if !matches!(self.general.log_format.as_str(), "json" | "pretty") {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("unknown format '{}'", self.general.log_format),
            });
        }

        for (field, enabled, addr) in [
            ("syslog.bind_addr", self.syslog.enabled, &self.syslog.bind_addr),
            ("rest.bind_addr", self.rest.enabled, &self.rest.bind_addr),
            ("snmp.bind_addr", self.snmp.enabled, &self.snmp.bind_addr),
        ] {
            if enabled && addr.parse::<SocketAddr>().is_err() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_owned(),
                    reason: format!("'{addr}' is not a valid socket address"),
                });
            }
        }

        if !self.syslog.enabled && !self.rest.enabled && !self.snmp.enabled {
            return Err(ConfigError::InvalidValue {
                field: "receivers".to_owned(),
                reason: "at least one receiver must be enabled".to_owned(),
            });
        }

        Ok(())
    }
}
