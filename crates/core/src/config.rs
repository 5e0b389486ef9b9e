//! Negotiated parameters for a single sender or receiver run.
//!
//! Built by `cli` from parsed command-line flags; kept separate from the
//! `clap` argument structs so the state machines in [`crate::sender`] and
//! [`crate::receiver`] don't depend on the CLI crate.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Parameters driving a single outbound transfer.
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// Receiver address to hand off datagrams to.
    pub peer: SocketAddr,
    /// Path to the file to send.
    pub file: PathBuf,
    /// Payload bytes per DATA packet.
    pub chunk_size: u16,
    /// Sliding window size, in packets.
    pub window: u16,
    /// Response timeout for HANDSHAKE_ACK, ACK, and FIN_ACK.
    pub timeout: Duration,
    /// Maximum consecutive timer expirations before aborting.
    pub max_retries: u32,
}

impl SenderConfig {
    /// Default chunk size in bytes, matching the documented invocation surface.
    pub const DEFAULT_CHUNK_SIZE: u16 = 1024;
    /// Default sliding window size in packets.
    pub const DEFAULT_WINDOW: u16 = 8;
    /// Default response timeout in milliseconds.
    pub const DEFAULT_TIMEOUT_MS: u64 = 300;
    /// Default maximum retry count.
    pub const DEFAULT_MAX_RETRIES: u32 = 20;
}

/// Parameters driving a single receiver process.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// UDP port to listen on.
    pub port: u16,
    /// Directory sinks are created under.
    pub out_dir: PathBuf,
    /// Advisory window size reported in HANDSHAKE_ACK/ACK packets.
    pub window: u16,
}

impl ReceiverConfig {
    /// Default listening port.
    pub const DEFAULT_PORT: u16 = 9000;
    /// Default output directory, relative to the working directory.
    pub const DEFAULT_OUT_DIR: &'static str = "./server_data";
    /// Default advisory window size in packets.
    pub const DEFAULT_WINDOW: u16 = 8;

    /// Maximum number of concurrently open sessions; the 101st concurrent
    /// HANDSHAKE is dropped rather than evicting an existing transfer.
    pub const SESSION_CAPACITY: usize = 100;
    /// Idle eviction threshold: sessions untouched this long are closed.
    pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30);
    /// Cadence at which the idle-eviction sweep runs.
    pub const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(10);
}
