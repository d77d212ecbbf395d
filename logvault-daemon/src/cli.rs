//! CLI argument definitions for logvault-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments and map
//! them onto the runtime [`LogvaultConfig`].

use clap::Parser;

use logvault_core::config::LogvaultConfig;

/// Tamper-evident log collection daemon.
///
/// Ingests RFC 3164 syslog datagrams, JSON submissions over HTTP, and
/// SNMP trap datagrams, and persists them to a hash-chained SQLite store.
#[derive(Parser, Debug)]
#[command(name = "logvault-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to the SQLite database file.
    #[arg(short = 'd', long = "database", default_value = "logs.db")]
    pub database: String,

    /// UDP port for RFC 3164 syslog datagrams.
    #[arg(long, default_value_t = 514)]
    pub syslog_port: u16,

    /// TCP port for the HTTP log API.
    #[arg(long, default_value_t = 8080)]
    pub rest_port: u16,

    /// UDP port for SNMP trap datagrams.
    #[arg(long, default_value_t = 162)]
    pub snmp_port: u16,

    /// Number of queued entries that triggers an immediate batch flush.
    #[arg(long, default_value_t = 100)]
    pub batch_size: usize,

    /// Disable the syslog receiver.
    #[arg(long)]
    pub no_syslog: bool,

    /// Disable the HTTP API receiver.
    #[arg(long)]
    pub no_rest: bool,

    /// Disable the SNMP trap receiver.
    #[arg(long)]
    pub no_snmp: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log format (json, pretty).
    #[arg(long, default_value = "pretty")]
    pub log_format: String,

    /// Expose Prometheus metrics on this port (disabled when absent).
    #[arg(long)]
    pub metrics_port: Option<u16>,
}

impl DaemonCli {
    /// Build the runtime configuration from parsed flags.
    pub fn to_config(&self) -> LogvaultConfig {
        let mut config = LogvaultConfig::default();

        config.general.log_level = self.log_level.clone();
        config.general.log_format = self.log_format.clone();

        config.storage.db_path = self.database.clone();
        config.queue.batch_size = self.batch_size;

        config.syslog.enabled = !self.no_syslog;
        config.syslog.bind_addr = format!("0.0.0.0:{}", self.syslog_port);
        config.rest.enabled = !self.no_rest;
        config.rest.bind_addr = format!("0.0.0.0:{}", self.rest_port);
        config.snmp.enabled = !self.no_snmp;
        config.snmp.bind_addr = format!("0.0.0.0:{}", self.snmp_port);

        if let Some(port) = self.metrics_port {
            config.metrics.enabled = true;
            config.metrics.port = port;
        }

        config
    }
}
