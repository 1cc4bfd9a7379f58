use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Runtime settings, read from the command line with environment fallbacks.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "Peer-to-peer loan lifecycle service", long_about = None)]
pub struct Settings {
    /// Address to bind the HTTP server to
    #[arg(long, env = "LOANFLOW_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "LOANFLOW_PORT", default_value_t = 7002)]
    pub port: u16,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "LOANFLOW_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Log output format
    #[arg(long, env = "LOANFLOW_LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,
}

impl Settings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parses the bind address, failing on an unusable host.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.bind_addr().parse()
    }
}
