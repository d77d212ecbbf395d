//! Orchestrator lifecycle tests with ephemeral ports and a temp database.

use logvault_core::config::LogvaultConfig;
use logvault_daemon::orchestrator::Orchestrator;

/// Build a config that binds every receiver to an ephemeral localhost
/// port and stores the database in the given directory.
fn test_config(dir: &std::path::Path) -> LogvaultConfig {
    let mut config = LogvaultConfig::default();
    config.storage.db_path = dir.join("logs.db").to_string_lossy().into_owned();
    config.syslog.bind_addr = "127.0.0.1:0".to_owned();
    config.rest.bind_addr = "127.0.0.1:0".to_owned();
    config.snmp.bind_addr = "127.0.0.1:0".to_owned();
    config
}

#[tokio::test]
async fn build_opens_storage_and_registers_receivers() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::build(test_config(dir.path())).await.unwrap();

    assert_eq!(orchestrator.receiver_count(), 3);
    assert_eq!(orchestrator.counters().received(), 0);
    assert_eq!(orchestrator.store().lock().await.count().unwrap(), 0);
}

#[tokio::test]
async fn build_rejects_invalid_config() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.queue.batch_size = 0;

    assert!(Orchestrator::build(config).await.is_err());
}

#[tokio::test]
async fn start_and_stop_complete_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let mut orchestrator = Orchestrator::build(test_config(dir.path())).await.unwrap();

    orchestrator.start().await.unwrap();
    assert_eq!(orchestrator.receiver_count(), 3);

    orchestrator.stop().await.unwrap();
    // stop is idempotent
    orchestrator.stop().await.unwrap();
}

#[tokio::test]
async fn disabled_receivers_are_not_registered() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.syslog.enabled = false;
    config.snmp.enabled = false;

    let mut orchestrator = Orchestrator::build(config).await.unwrap();
    assert_eq!(orchestrator.receiver_count(), 1);

    orchestrator.start().await.unwrap();
    orchestrator.stop().await.unwrap();
}

#[tokio::test]
async fn stop_drains_queued_entries() {
    let dir = tempfile::tempdir().unwrap();
    let mut orchestrator = Orchestrator::build(test_config(dir.path())).await.unwrap();
    orchestrator.start().await.unwrap();

    // Stage entries directly on the queue; they must land in the store
    // on shutdown even though no flush trigger fired.
    let queue = orchestrator.queue();
    for i in 0..5 {
        let entry = logvault_core::types::LogEntry::new(
            logvault_core::types::LogSource::Syslog,
            format!("drain {i}"),
            format!("raw {i}").into_bytes(),
        );
        queue.enqueue(entry).await.unwrap();
    }

    orchestrator.stop().await.unwrap();
    assert_eq!(orchestrator.store().lock().await.count().unwrap(), 5);
}
