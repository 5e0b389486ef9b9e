//! Process exit codes shared by the sender and receiver binaries.
//!
//! # Overview
//!
//! The sender and receiver each expose a small, fixed set of exit codes to
//! their shell callers (see the `--help` surface in `cli`). This module
//! centralizes that mapping so both binaries report failures consistently
//! and so [`SenderError`](crate::error::SenderError) and
//! [`ReceiverError`](crate::error::ReceiverError) don't each reinvent it.

use std::fmt;

/// Exit codes returned by the `ru-send` and `ru-recv` processes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ExitCode {
    /// Clean completion.
    Ok = 0,
    /// Bad arguments, or a local I/O error opening the source file or
    /// output directory.
    ArgumentOrIo = 1,
    /// Handshake not acknowledged within `max_retries` attempts.
    HandshakeFailed = 2,
    /// Windowed transmission exhausted its retransmit budget.
    TransferFailed = 3,
    /// FIN not acknowledged within `max_retries` attempts.
    FinUnacknowledged = 4,
}

impl ExitCode {
    /// Returns the raw process exit status.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Returns a short, human-readable description of this code.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Ok => "success",
            Self::ArgumentOrIo => "argument or I/O error",
            Self::HandshakeFailed => "handshake not acknowledged",
            Self::TransferFailed => "transfer retries exhausted",
            Self::FinUnacknowledged => "FIN not acknowledged",
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}

/// Implemented by error types that carry a specific [`ExitCode`].
pub trait HasExitCode {
    /// Returns the exit code a process should report for this error.
    fn exit_code(&self) -> ExitCode;
}
