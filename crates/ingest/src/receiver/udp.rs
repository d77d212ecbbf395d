//! UDP 데이터그램 수신기
//!
//! syslog(514/udp)와 SNMP 트랩(162/udp)이 공유하는 수신기입니다.
//! 어떤 파서를 연결하느냐로 채널이 결정되며, 데이터그램 하나가
//! 레코드 하나로 취급됩니다. 파싱에 실패한 데이터그램은 조용히
//! 드롭됩니다.

use std::net::SocketAddr;
use std::sync::Arc;

use metrics::counter;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use logvault_core::error::{LogvaultError, ReceiverError};
use logvault_core::metrics as m;
use logvault_core::pipeline::{HealthStatus, LogParser, Receiver};
use logvault_core::types::LogSource;
use logvault_storage::WriteQueue;

use super::{IngestCounters, ReceiverStatus};

/// UDP 수신기 설정
#[derive(Debug, Clone)]
pub struct UdpReceiverConfig {
    /// 수신 소스 식별자 (예: "syslog_udp", "snmp_udp")
    pub source_type: String,
    /// 바인드 주소 (예: "0.0.0.0:514")
    pub bind_addr: String,
    /// 수신 버퍼 크기 (바이트, UDP 최대 페이로드)
    pub max_message_size: usize,
}

impl UdpReceiverConfig {
    /// syslog 수신용 설정을 생성합니다.
    pub fn syslog(bind_addr: impl Into<String>) -> Self {
        Self {
            source_type: "syslog_udp".to_owned(),
            bind_addr: bind_addr.into(),
            max_message_size: 65_536,
        }
    }

    /// SNMP 트랩 수신용 설정을 생성합니다.
    pub fn snmp(bind_addr: impl Into<String>) -> Self {
        Self {
            source_type: "snmp_udp".to_owned(),
            bind_addr: bind_addr.into(),
            max_message_size: 65_536,
        }
    }
}

/// UDP 로그 수신기
///
/// 소켓에서 데이터그램을 읽어 연결된 파서로 파싱한 뒤 쓰기 큐에
/// 전달합니다. 동일 소스 내에서는 수신 순서가 enqueue 순서로
/// 보존됩니다.
pub struct UdpLogReceiver {
    /// 수신기 설정
    config: UdpReceiverConfig,
    /// 메트릭 레이블용 유입 채널
    source: LogSource,
    /// 연결된 파서
    parser: Arc<dyn LogParser>,
    /// 공유 쓰기 큐
    queue: Arc<WriteQueue>,
    /// 공유 수집 카운터
    counters: Arc<IngestCounters>,
    /// graceful shutdown을 위한 취소 토큰
    cancel_token: CancellationToken,
    /// 백그라운드 태스크 핸들
    tasks: Vec<JoinHandle<()>>,
    /// 현재 상태
    status: ReceiverStatus,
    /// 실제 바인드된 주소 (시작 후)
    local_addr: Option<SocketAddr>,
}

impl UdpLogReceiver {
    /// 새 UDP 수신기를 생성합니다.
    pub fn new(
        config: UdpReceiverConfig,
        source: LogSource,
        parser: Arc<dyn LogParser>,
        queue: Arc<WriteQueue>,
        counters: Arc<IngestCounters>,
    ) -> Self {
        Self {
            config,
            source,
            parser,
            queue,
            counters,
            cancel_token: CancellationToken::new(),
            tasks: Vec::new(),
            status: ReceiverStatus::Idle,
            local_addr: None,
        }
    }

    /// 실제 바인드된 주소를 반환합니다 (시작 전에는 `None`).
    ///
    /// 포트 0으로 바인드한 테스트가 실제 포트를 알아내는 데 사용합니다.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// 현재 상태를 반환합니다.
    pub fn status(&self) -> &ReceiverStatus {
        &self.status
    }
}

impl Receiver for UdpLogReceiver {
    async fn start(&mut self) -> Result<(), LogvaultError> {
        if self.status == ReceiverStatus::Running {
            return Err(ReceiverError::AlreadyRunning.into());
        }

        let socket = UdpSocket::bind(&self.config.bind_addr).await.map_err(|e| {
            ReceiverError::Bind {
                addr: self.config.bind_addr.clone(),
                reason: e.to_string(),
            }
        })?;
        self.local_addr = socket.local_addr().ok();

        info!(
            source_type = %self.config.source_type,
            addr = ?self.local_addr,
            "UDP receiver listening"
        );

        let task = tokio::spawn(recv_loop(
            socket,
            Arc::clone(&self.parser),
            Arc::clone(&self.queue),
            Arc::clone(&self.counters),
            self.cancel_token.clone(),
            self.config.source_type.clone(),
            self.source,
            self.config.max_message_size,
        ));
        self.tasks.push(task);
        self.status = ReceiverStatus::Running;
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), LogvaultError> {
        if self.status != ReceiverStatus::Running {
            return Err(ReceiverError::NotRunning.into());
        }

        self.cancel_token.cancel();
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }

        // 재시작 지원을 위해 토큰 재생성
        self.cancel_token = CancellationToken::new();
        self.status = ReceiverStatus::Stopped;
        info!(source_type = %self.config.source_type, "UDP receiver stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match &self.status {
            ReceiverStatus::Running => HealthStatus::Healthy,
            ReceiverStatus::Idle => HealthStatus::Unhealthy("not started".to_owned()),
            ReceiverStatus::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
            ReceiverStatus::Error(reason) => HealthStatus::Unhealthy(reason.clone()),
        }
    }
}

/// 데이터그램 수신 루프
///
/// 취소될 때까지 한 번에 데이터그램 하나를 읽어 파싱/적재합니다.
#[allow(clippy::too_many_arguments)]
async fn recv_loop(
    socket: UdpSocket,
    parser: Arc<dyn LogParser>,
    queue: Arc<WriteQueue>,
    counters: Arc<IngestCounters>,
    cancel_token: CancellationToken,
    source_type: String,
    source: LogSource,
    max_message_size: usize,
) {
    let mut buf = vec![0u8; max_message_size];

    loop {
        tokio::select! {
            result = socket.recv_from(&mut buf) => {
                match result {
                    Ok((len, addr)) => {
                        debug!(len, %addr, source_type = %source_type, "received datagram");
                        if len == 0 {
                            continue;
                        }

                        counters.add_received(1);
                        counter!(m::INGEST_RECEIVED_TOTAL, m::LABEL_SOURCE => source.as_str())
                            .increment(1);

                        match parser.parse(&buf[..len]) {
                            Ok(entry) => {
                                if let Err(e) = queue.enqueue(entry).await {
                                    counters.add_errors(1);
                                    warn!(
                                        source_type = %source_type,
                                        error = %e,
                                        "failed to enqueue entry"
                                    );
                                }
                            }
                            Err(e) => {
                                // 파싱 실패한 데이터그램은 드롭하고 계속 진행
                                counters.add_errors(1);
                                counter!(
                                    m::INGEST_PARSE_ERRORS_TOTAL,
                                    m::LABEL_SOURCE => source.as_str()
                                )
                                .increment(1);
                                debug!(
                                    source_type = %source_type,
                                    error = %e,
                                    "dropping unparsable datagram"
                                );
                            }
                        }
                    }
                    Err(e) => {
                        warn!(source_type = %source_type, error = %e, "UDP recv error");
                    }
                }
            }
            _ = cancel_token.cancelled() => {
                info!(source_type = %source_type, "UDP receiver received shutdown signal");
                break;
            }
        }
    }
}
