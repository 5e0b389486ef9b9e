#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` is the thin layer between the `ru-send`/`ru-recv` binaries and the
//! protocol state machines in `core`: it owns `clap` argument parsing, exit
//! code reporting, and the signal-handling glue both processes need.
//! Everything protocol-related lives in `core`; this crate never touches a
//! socket directly.
//!
//! # Design
//!
//! [`SenderArgs`]/[`ReceiverArgs`] are `clap::Parser` structs mirroring the
//! documented invocation surface. [`run_sender`] and [`run_receiver`]
//! resolve a parsed-args struct into a `core` config, drive the matching
//! `core` entry point, and translate the `Result` into a process
//! [`std::process::ExitCode`] via [`core::exit_code::HasExitCode`].
//!
//! # Examples
//!
//! ```no_run
//! use clap::Parser;
//! use cli::SenderArgs;
//!
//! let args = SenderArgs::parse_from(["ru-send", "--host", "127.0.0.1", "--file", "a.bin"]);
//! let exit_code = cli::run_sender(args);
//! ```
//!
//! # See also
//!
//! - `core` for the state machines this crate drives.

use std::net::ToSocketAddrs;
use std::path::PathBuf;
use std::process::ExitCode as ProcessExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use core::exit_code::HasExitCode;
use core::{ReceiverConfig, SenderConfig};
use logging::Verbosity;

/// Parsed command-line arguments for the `ru-send` binary.
#[derive(Debug, Parser)]
#[command(
    name = "ru-send",
    about = "Send a single file over the RU reliable-UDP protocol"
)]
pub struct SenderArgs {
    /// Receiver host to connect to.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    /// Receiver UDP port.
    #[arg(long, default_value_t = ReceiverConfig::DEFAULT_PORT)]
    pub port: u16,
    /// Path to the file to send. Required unless `--version` is passed.
    #[arg(long, required_unless_present = "version")]
    pub file: Option<PathBuf>,
    /// Payload bytes per DATA packet.
    #[arg(long, default_value_t = SenderConfig::DEFAULT_CHUNK_SIZE)]
    pub chunk: u16,
    /// Sliding window size, in packets.
    #[arg(long, default_value_t = SenderConfig::DEFAULT_WINDOW)]
    pub window: u16,
    /// Response timeout in milliseconds.
    #[arg(long, default_value_t = SenderConfig::DEFAULT_TIMEOUT_MS)]
    pub timeout: u64,
    /// Maximum consecutive retransmit timeouts before aborting.
    #[arg(long = "max-retries", default_value_t = SenderConfig::DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,
    /// Increase log verbosity (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
    /// Print the version and exit.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub version: bool,
}

/// Parsed command-line arguments for the `ru-recv` binary.
#[derive(Debug, Parser)]
#[command(
    name = "ru-recv",
    about = "Receive files over the RU reliable-UDP protocol"
)]
pub struct ReceiverArgs {
    /// UDP port to listen on.
    #[arg(long, default_value_t = ReceiverConfig::DEFAULT_PORT)]
    pub port: u16,
    /// Directory sinks are created under.
    #[arg(long, default_value = ReceiverConfig::DEFAULT_OUT_DIR)]
    pub out: PathBuf,
    /// Advisory window size reported to senders.
    #[arg(long, default_value_t = ReceiverConfig::DEFAULT_WINDOW)]
    pub window: u16,
    /// Increase log verbosity (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
    /// Print the version and exit.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub version: bool,
}

fn verbosity_from_count(count: u8) -> Verbosity {
    match count {
        0 => Verbosity::Normal,
        1 => Verbosity::Verbose,
        _ => Verbosity::Debug,
    }
}

/// Parses `SenderArgs` into a [`SenderConfig`], resolving `host`/`port` via
/// DNS/parsing.
///
/// # Errors
///
/// Returns a human-readable message if the host cannot be resolved.
pub fn resolve_sender_config(args: &SenderArgs) -> Result<SenderConfig, String> {
    let peer = (args.host.as_str(), args.port)
        .to_socket_addrs()
        .map_err(|err| format!("failed to resolve {}:{}: {err}", args.host, args.port))?
        .next()
        .ok_or_else(|| format!("no addresses found for {}:{}", args.host, args.port))?;
    let file = args
        .file
        .clone()
        .ok_or_else(|| "--file is required".to_string())?;

    Ok(SenderConfig {
        peer,
        file,
        chunk_size: args.chunk,
        window: args.window,
        timeout: Duration::from_millis(args.timeout),
        max_retries: args.max_retries,
    })
}

/// Parses `ReceiverArgs` into a [`ReceiverConfig`].
#[must_use]
pub fn resolve_receiver_config(args: &ReceiverArgs) -> ReceiverConfig {
    ReceiverConfig {
        port: args.port,
        out_dir: args.out.clone(),
        window: args.window,
    }
}

/// Runs the sender: parses args (already done by the caller), resolves
/// config, and drives [`core::send_file`] to completion.
///
/// Prints `CARGO_PKG_VERSION` and returns success immediately if
/// `--version` was passed, without touching the network.
#[must_use]
#[allow(clippy::needless_pass_by_value)]
pub fn run_sender(args: SenderArgs) -> ProcessExitCode {
    if args.version {
        println!("ru-send {}", env!("CARGO_PKG_VERSION"));
        return ProcessExitCode::SUCCESS;
    }

    logging::init(verbosity_from_count(args.verbose));

    let config = match resolve_sender_config(&args) {
        Ok(config) => config,
        Err(message) => {
            logging::log_error!(%message, "invalid arguments");
            return ProcessExitCode::from(core::exit_code::ExitCode::ArgumentOrIo.as_i32() as u8);
        }
    };

    match core::send_file(&config) {
        Ok(()) => ProcessExitCode::SUCCESS,
        Err(err) => {
            logging::log_error!(error = %err, "transfer failed");
            ProcessExitCode::from(err.exit_code().as_i32() as u8)
        }
    }
}

/// Runs the receiver: parses args (already done by the caller), resolves
/// config, installs a Ctrl-C shutdown flag, and drives [`core::receiver::run`]
/// until shutdown.
///
/// Prints `CARGO_PKG_VERSION` and returns success immediately if
/// `--version` was passed, without binding a socket.
#[must_use]
#[allow(clippy::needless_pass_by_value)]
pub fn run_receiver(args: ReceiverArgs) -> ProcessExitCode {
    if args.version {
        println!("ru-recv {}", env!("CARGO_PKG_VERSION"));
        return ProcessExitCode::SUCCESS;
    }

    logging::init(verbosity_from_count(args.verbose));

    let config = resolve_receiver_config(&args);
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_for_handler = Arc::clone(&shutdown);
    let _ = ctrlc_shutdown(shutdown_for_handler);

    match core::receiver::run(&config, &shutdown) {
        Ok(()) => ProcessExitCode::SUCCESS,
        Err(err) => {
            logging::log_error!(error = %err, "receiver exited with an error");
            ProcessExitCode::from(err.exit_code().as_i32() as u8)
        }
    }
}

/// Installs a SIGINT/SIGTERM handler that flips `shutdown` to `true`.
///
/// Returns `Err` if a handler is already installed in this process (this
/// should never happen in the `ru-recv` binary, which calls it exactly
/// once).
fn ctrlc_shutdown(shutdown: Arc<AtomicBool>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        shutdown.store(true, Ordering::Relaxed);
    })
}
