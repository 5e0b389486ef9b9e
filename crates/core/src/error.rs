//! Structured failure modes for the sender and receiver state machines.

use std::io;
use std::path::PathBuf;

use transport::TransportError;

use crate::exit_code::{ExitCode, HasExitCode};

/// Failures the sender state machine can terminate with.
#[derive(Debug, thiserror::Error)]
pub enum SenderError {
    /// The source file could not be opened or read.
    #[error("failed to read source file {path}: {source}")]
    SourceIo {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The UDP socket could not be bound or used.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// No HANDSHAKE_ACK arrived within `max_retries` attempts.
    #[error("handshake not acknowledged after {attempts} attempt(s)")]
    HandshakeFailed {
        /// Number of HANDSHAKE transmissions made.
        attempts: u32,
    },
    /// The receiver replied with an ERROR packet during handshake.
    #[error("receiver rejected handshake: {message}")]
    HandshakeRejected {
        /// Diagnostic text carried by the ERROR packet.
        message: String,
    },
    /// Windowed transmission exhausted its retransmit budget.
    #[error("transfer aborted after {retries} consecutive retransmit timeout(s)")]
    TransferFailed {
        /// Number of consecutive retransmit-timer expirations.
        retries: u32,
    },
    /// The receiver replied with an ERROR packet mid-transfer (for example
    /// after a session was evicted or the receiver restarted).
    #[error("receiver reported an error mid-transfer: {message}")]
    TransferRejected {
        /// Diagnostic text carried by the ERROR packet.
        message: String,
    },
    /// No FIN_ACK arrived within `max_retries` attempts.
    #[error("FIN not acknowledged after {attempts} attempt(s)")]
    FinFailed {
        /// Number of FIN transmissions made.
        attempts: u32,
    },
}

impl HasExitCode for SenderError {
    fn exit_code(&self) -> ExitCode {
        match self {
            Self::SourceIo { .. } | Self::Transport(_) => ExitCode::ArgumentOrIo,
            Self::HandshakeFailed { .. } | Self::HandshakeRejected { .. } => {
                ExitCode::HandshakeFailed
            }
            Self::TransferFailed { .. } | Self::TransferRejected { .. } => ExitCode::TransferFailed,
            Self::FinFailed { .. } => ExitCode::FinUnacknowledged,
        }
    }
}

/// Failures the receiver process can terminate with.
#[derive(Debug, thiserror::Error)]
pub enum ReceiverError {
    /// The listening socket could not be bound.
    #[error("failed to bind receiver socket: {0}")]
    Bind(#[source] TransportError),
    /// The output directory could not be created or is not writable.
    #[error("failed to prepare output directory {path}: {source}")]
    OutDir {
        /// Output directory path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl HasExitCode for ReceiverError {
    fn exit_code(&self) -> ExitCode {
        match self {
            Self::Bind(_) | Self::OutDir { .. } => ExitCode::ArgumentOrIo,
        }
    }
}
