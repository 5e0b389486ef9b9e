#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` bridges the sender/receiver binaries' `--verbose`/`--debug`
//! command-line flags onto [`tracing`]'s structured event macros, and
//! provides a single place to initialize the stderr subscriber so both
//! `ru-send` and `ru-recv` configure logging identically.
//!
//! # Design
//!
//! [`Verbosity`] is an ordered enum (`Quiet` < `Normal` < `Verbose` <
//! `Debug`) mapped to a [`tracing::level_filters::LevelFilter`] by
//! [`Verbosity::level_filter`]. [`init`] installs a
//! `tracing-subscriber` `fmt` subscriber writing to stderr at that filter;
//! call it once at process startup, before constructing any sender/receiver
//! state.
//!
//! # Examples
//!
//! ```
//! use logging::Verbosity;
//!
//! logging::init(Verbosity::Verbose);
//! logging::log_info!("listening on {}", "0.0.0.0:9000");
//! ```
//!
//! # See also
//!
//! - `core` for the state machines whose progress these macros report.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Verbosity level selected by the `--verbose`/`--debug`/`--quiet` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Only warnings and errors.
    Quiet,
    /// Warnings, errors, and top-level progress (handshake, completion).
    #[default]
    Normal,
    /// Adds per-packet send/receive/ACK events.
    Verbose,
    /// Adds internal state-machine transitions (timer arm/cancel, retries).
    Debug,
}

impl Verbosity {
    /// Maps this verbosity to a `tracing` level filter.
    #[must_use]
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Self::Quiet => LevelFilter::WARN,
            Self::Normal => LevelFilter::INFO,
            Self::Verbose => LevelFilter::DEBUG,
            Self::Debug => LevelFilter::TRACE,
        }
    }
}

/// Installs a `tracing-subscriber` `fmt` layer writing to stderr at `verbosity`.
///
/// Idempotent-by-convention: call once per process. A second call in the
/// same process is a logic error in the caller (both `ru-send` and
/// `ru-recv` call this exactly once from `main`), so this silently ignores
/// a failed re-installation rather than panicking.
pub fn init(verbosity: Verbosity) {
    let filter = EnvFilter::builder()
        .with_default_directive(verbosity.level_filter().into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Logs a top-level progress event (handshake, transfer completion, FIN).
///
/// Gated at [`Verbosity::Normal`] and above.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        ::tracing::info!($($arg)*)
    };
}

/// Logs a per-packet event (send, receive, ACK, retransmit).
///
/// Gated at [`Verbosity::Verbose`] and above.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        ::tracing::debug!($($arg)*)
    };
}

/// Logs an internal state-machine transition (timer arm/cancel, eviction sweep).
///
/// Gated at [`Verbosity::Debug`].
#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => {
        ::tracing::trace!($($arg)*)
    };
}

/// Logs a recoverable anomaly (checksum mismatch, dropped datagram, stale ACK).
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        ::tracing::warn!($($arg)*)
    };
}

/// Logs a fatal or near-fatal condition (retry exhaustion, bind failure).
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        ::tracing::error!($($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::Verbosity;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn verbosity_orders_quiet_below_debug() {
        assert!(Verbosity::Quiet < Verbosity::Normal);
        assert!(Verbosity::Normal < Verbosity::Verbose);
        assert!(Verbosity::Verbose < Verbosity::Debug);
    }

    #[test]
    fn default_verbosity_is_normal() {
        assert_eq!(Verbosity::default(), Verbosity::Normal);
    }

    #[test]
    fn level_filter_mapping() {
        assert_eq!(Verbosity::Quiet.level_filter(), LevelFilter::WARN);
        assert_eq!(Verbosity::Normal.level_filter(), LevelFilter::INFO);
        assert_eq!(Verbosity::Verbose.level_filter(), LevelFilter::DEBUG);
        assert_eq!(Verbosity::Debug.level_filter(), LevelFilter::TRACE);
    }
}
