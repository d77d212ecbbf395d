//! 수신기 모듈 — 세 유입 채널의 네트워크 수신부
//!
//! # 수신기
//! - [`UdpLogReceiver`]: UDP 데이터그램 수신 (syslog 514, SNMP 트랩 162)
//! - [`HttpReceiver`]: HTTP REST API (`/api/logs`, `/health`)
//!
//! # 아키텍처
//! 각 수신기는 자체 tokio 태스크에서 실행되며, 파싱된 엔트리를
//! 쓰기 큐([`WriteQueue`](logvault_storage::WriteQueue))로 전달합니다.
//! HTTP 경로는 응답에 행 ID를 포함해야 하므로 스토어에 직접 삽입합니다.

pub mod http;
pub mod udp;

pub use http::{ApiState, HttpReceiver, HttpReceiverConfig};
pub use udp::{UdpLogReceiver, UdpReceiverConfig};

use std::sync::atomic::{AtomicU64, Ordering};

/// 수신기 상태
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiverStatus {
    /// 실행 대기 중
    Idle,
    /// 실행 중
    Running,
    /// 에러로 중단됨
    Error(String),
    /// 정상 종료됨
    Stopped,
}

/// 수집 카운터
///
/// 모든 수신기가 공유하는 집계 카운터입니다. 오케스트레이터가 주기
/// 보고에 사용합니다. 순차 일관성(SeqCst) 순서를 사용합니다.
#[derive(Debug, Default)]
pub struct IngestCounters {
    received: AtomicU64,
    written: AtomicU64,
    errors: AtomicU64,
}

impl IngestCounters {
    /// 0으로 초기화된 카운터를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 수신된 레코드 수를 증가시킵니다.
    pub fn add_received(&self, n: u64) {
        self.received.fetch_add(n, Ordering::SeqCst);
    }

    /// 직접 기록된 행 수를 증가시킵니다 (HTTP 경로).
    pub fn add_written(&self, n: u64) {
        self.written.fetch_add(n, Ordering::SeqCst);
    }

    /// 에러(파싱 실패, 삽입 실패) 수를 증가시킵니다.
    pub fn add_errors(&self, n: u64) {
        self.errors.fetch_add(n, Ordering::SeqCst);
    }

    /// 수신된 레코드 수를 반환합니다.
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::SeqCst)
    }

    /// 직접 기록된 행 수를 반환합니다.
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::SeqCst)
    }

    /// 에러 수를 반환합니다.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::SeqCst)
    }
}
