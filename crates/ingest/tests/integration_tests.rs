//! 통합 테스트 — 수신기부터 스토리지까지의 전체 흐름 검증

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use logvault_core::pipeline::Receiver;
use logvault_core::types::{Level, LogSource};
use logvault_ingest::parser::{SyslogParser, TrapParser};
use logvault_ingest::receiver::{IngestCounters, UdpLogReceiver, UdpReceiverConfig};
use logvault_storage::{LogStore, WriteQueue};

struct TestHarness {
    store: Arc<Mutex<LogStore>>,
    queue: Arc<WriteQueue>,
    counters: Arc<IngestCounters>,
}

impl TestHarness {
    fn new() -> Self {
        let store = Arc::new(Mutex::new(LogStore::open_in_memory().unwrap()));
        let queue = Arc::new(WriteQueue::new(
            Arc::clone(&store),
            100,
            Duration::from_secs(3600),
        ));
        Self {
            store,
            queue,
            counters: Arc::new(IngestCounters::new()),
        }
    }
}

/// 데이터그램 수신을 폴링으로 기다립니다 (UDP 전달 지연 흡수).
async fn wait_for_received(counters: &IngestCounters, expected: u64) {
    for _ in 0..100 {
        if counters.received() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {expected} datagrams");
}

#[tokio::test]
async fn syslog_datagram_lands_in_store() {
    let harness = TestHarness::new();
    let mut receiver = UdpLogReceiver::new(
        UdpReceiverConfig::syslog("127.0.0.1:0"),
        LogSource::Syslog,
        Arc::new(SyslogParser::new()),
        Arc::clone(&harness.queue),
        Arc::clone(&harness.counters),
    );

    receiver.start().await.unwrap();
    let addr = receiver.local_addr().unwrap();

    let sender = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let raw = b"<134>Jan 15 12:34:56 myhost myapp[1234]: Test message";
    sender.send_to(raw, addr).await.unwrap();

    wait_for_received(&harness.counters, 1).await;
    receiver.stop().await.unwrap();
    harness.queue.force_flush().await.unwrap();

    let store = harness.store.lock().await;
    assert_eq!(store.count().unwrap(), 1);

    let rows = store.query_by_time_range(0, i64::MAX, 1).unwrap();
    assert_eq!(rows[0].host, "myhost");
    assert_eq!(rows[0].app_name.as_deref(), Some("myapp"));
    assert_eq!(rows[0].proc_id.as_deref(), Some("1234"));
    assert_eq!(rows[0].message, "Test message");
    assert_eq!(rows[0].facility, Some(16));
    assert_eq!(rows[0].raw_data, raw);
}

#[tokio::test]
async fn snmp_trap_datagram_lands_in_store() {
    let harness = TestHarness::new();
    let mut receiver = UdpLogReceiver::new(
        UdpReceiverConfig::snmp("127.0.0.1:0"),
        LogSource::Snmp,
        Arc::new(TrapParser::new()),
        Arc::clone(&harness.queue),
        Arc::clone(&harness.counters),
    );

    receiver.start().await.unwrap();
    let addr = receiver.local_addr().unwrap();

    // v1 트랩: enterprise 1.3.6.1.4.1, agent addr 10.0.0.9
    let trap: Vec<u8> = vec![
        0x30, 0x25, 0x02, 0x01, 0x00, 0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c', 0xA4, 0x18,
        0x06, 0x05, 0x2B, 0x06, 0x01, 0x04, 0x01, 0x40, 0x04, 0x0A, 0x00, 0x00, 0x09, 0x02, 0x01,
        0x06, 0x02, 0x01, 0x00, 0x43, 0x01, 0x00, 0x30, 0x00,
    ];

    let sender = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
    sender.send_to(&trap, addr).await.unwrap();

    wait_for_received(&harness.counters, 1).await;
    receiver.stop().await.unwrap();
    harness.queue.force_flush().await.unwrap();

    let store = harness.store.lock().await;
    let rows = store.query_by_time_range(0, i64::MAX, 1).unwrap();
    assert_eq!(rows[0].source, LogSource::Snmp);
    assert_eq!(rows[0].level, Level::Notice);
    assert_eq!(rows[0].host, "10.0.0.9");
    assert_eq!(rows[0].app_name.as_deref(), Some("snmptrapd"));
    assert_eq!(rows[0].message, "Trap Type: 6 Specific: 0");
    assert_eq!(rows[0].raw_data, trap);
}

#[tokio::test]
async fn unparsable_datagram_is_dropped_silently() {
    let harness = TestHarness::new();
    let mut receiver = UdpLogReceiver::new(
        UdpReceiverConfig::syslog("127.0.0.1:0"),
        LogSource::Syslog,
        Arc::new(SyslogParser::new()),
        Arc::clone(&harness.queue),
        Arc::clone(&harness.counters),
    );

    receiver.start().await.unwrap();
    let addr = receiver.local_addr().unwrap();

    let sender = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
    sender.send_to(b"no priority here", addr).await.unwrap();
    sender.send_to(b"<34>valid one", addr).await.unwrap();

    wait_for_received(&harness.counters, 2).await;
    receiver.stop().await.unwrap();
    harness.queue.force_flush().await.unwrap();

    // 유효한 데이터그램만 저장됨
    assert_eq!(harness.store.lock().await.count().unwrap(), 1);
    assert_eq!(harness.counters.errors(), 1);
}

#[tokio::test]
async fn same_source_datagrams_keep_order() {
    let harness = TestHarness::new();
    let mut receiver = UdpLogReceiver::new(
        UdpReceiverConfig::syslog("127.0.0.1:0"),
        LogSource::Syslog,
        Arc::new(SyslogParser::new()),
        Arc::clone(&harness.queue),
        Arc::clone(&harness.counters),
    );

    receiver.start().await.unwrap();
    let addr = receiver.local_addr().unwrap();
    let sender = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();

    for i in 0..10 {
        let raw = format!("<34>host app: message {i}");
        sender.send_to(raw.as_bytes(), addr).await.unwrap();
        // 로컬 UDP는 순서 보존; 전송 간 양보로 수신 루프가 따라오게 함
        tokio::task::yield_now().await;
    }

    wait_for_received(&harness.counters, 10).await;
    receiver.stop().await.unwrap();
    harness.queue.force_flush().await.unwrap();

    let store = harness.store.lock().await;
    let mut rows = store.query_by_time_range(0, i64::MAX, 100).unwrap();
    rows.sort_by_key(|e| e.id);
    assert_eq!(rows.len(), 10);
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row.message, format!("message {i}"));
    }
}
