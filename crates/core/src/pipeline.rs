//! 수신기/파서 trait — 모듈 생명주기 및 확장 포인트 정의
//!
//! [`Receiver`] trait은 세 수신기(syslog UDP, HTTP API, SNMP UDP)가
//! 공유하는 생명주기 인터페이스입니다. [`LogParser`] trait은 원시 바이트를
//! [`LogEntry`]로 변환하는 확장 포인트입니다.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::LogvaultError;
use crate::types::LogEntry;

/// dyn-compatible Future 타입 별칭
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 모든 수신기가 구현하는 생명주기 trait
///
/// `logvault-daemon`의 오케스트레이터가 각 수신기를 시작/정지하고
/// 상태를 확인하는 데 사용됩니다.
///
/// # 구현 예시
/// ```ignore
/// struct UdpReceiver { /* ... */ }
///
/// impl Receiver for UdpReceiver {
///     async fn start(&mut self) -> Result<(), LogvaultError> {
///         // 소켓 바인드, 수신 루프 스폰
///         Ok(())
///     }
///
///     async fn stop(&mut self) -> Result<(), LogvaultError> {
///         // 취소 토큰 발동, 태스크 대기
///         Ok(())
///     }
///
///     async fn health_check(&self) -> HealthStatus {
///         HealthStatus::Healthy
///     }
/// }
/// ```
pub trait Receiver: Send + Sync {
    /// 수신기를 시작합니다.
    ///
    /// 소켓 바인드와 수신 루프 스폰을 수행합니다.
    /// 이미 실행 중인 경우 `ReceiverError::AlreadyRunning`을 반환합니다.
    fn start(&mut self) -> impl Future<Output = Result<(), LogvaultError>> + Send;

    /// 수신기를 정지합니다.
    ///
    /// Graceful shutdown을 수행합니다. 진행 중인 데이터그램/요청 처리를
    /// 완료하고 리소스를 정리합니다.
    fn stop(&mut self) -> impl Future<Output = Result<(), LogvaultError>> + Send;

    /// 수신기의 현재 상태를 확인합니다.
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send;
}

/// dyn-compatible 수신기 trait
///
/// `Receiver` trait은 RPITIT를 사용하므로 `dyn Receiver`가 불가합니다.
/// `DynReceiver`는 `BoxFuture`를 반환하여 `Vec<Box<dyn DynReceiver>>`로
/// 수신기를 동적 관리할 수 있게 합니다.
pub trait DynReceiver: Send + Sync {
    /// 수신기를 시작합니다.
    fn start(&mut self) -> BoxFuture<'_, Result<(), LogvaultError>>;

    /// 수신기를 정지합니다.
    fn stop(&mut self) -> BoxFuture<'_, Result<(), LogvaultError>>;

    /// 수신기의 현재 상태를 확인합니다.
    fn health_check(&self) -> BoxFuture<'_, HealthStatus>;
}

impl<T: Receiver> DynReceiver for T {
    fn start(&mut self) -> BoxFuture<'_, Result<(), LogvaultError>> {
        Box::pin(Receiver::start(self))
    }

    fn stop(&mut self) -> BoxFuture<'_, Result<(), LogvaultError>> {
        Box::pin(Receiver::stop(self))
    }

    fn health_check(&self) -> BoxFuture<'_, HealthStatus> {
        Box::pin(Receiver::health_check(self))
    }
}

/// 수신기 헬스 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// 정상 동작 중
    Healthy,
    /// 성능 저하 또는 부분적 장애 (서비스는 계속 동작)
    Degraded(String),
    /// 비정상 — 서비스 불가 상태
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 상태인지 확인합니다.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// 비정상 상태인지 확인합니다.
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded(reason) => write!(f, "degraded: {reason}"),
            Self::Unhealthy(reason) => write!(f, "unhealthy: {reason}"),
        }
    }
}

/// 로그 파서 trait
///
/// 원시 데이터그램/요청 본문 바이트를 [`LogEntry`]로 변환합니다.
/// Syslog RFC 3164, JSON, SNMP 트랩 파서가 이 trait을 구현합니다.
pub trait LogParser: Send + Sync {
    /// 지원하는 로그 형식 이름
    fn format_name(&self) -> &str;

    /// 원시 바이트를 로그 엔트리로 파싱합니다.
    ///
    /// 파싱 실패 시 데이터그램은 드롭되어야 하며, 엔트리의 `raw_data`는
    /// 입력 바이트 전체를 보존해야 합니다.
    fn parse(&self, raw: &[u8]) -> Result<LogEntry, LogvaultError>;
}
