#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `core` holds the two state machines that make up the substance of the RU
//! reliable-UDP transfer protocol: [`sender::send_file`] drives a single
//! outbound transfer (handshake, windowed transmission, teardown), and
//! [`receiver::run`] is the receiver's ingress loop (session table,
//! in-order delivery, idle eviction). Both are built on the [`transport`]
//! socket adapter and the [`wire`] packet codec.
//!
//! # Design
//!
//! The crate is organized by role rather than by layer: [`sender`] owns the
//! send-window/retransmit-timer bookkeeping in
//! [`sender::SendState`][SendState], and [`receiver`] owns the session
//! table in [`receiver::SessionTable`][SessionTable]. [`config`] holds the
//! plain-data parameter structs `cli` builds from parsed flags, and
//! [`error`]/[`exit_code`] give both roles a consistent way to report
//! failure to their process exit status.
//!
//! # See also
//!
//! - [`wire`] for the on-wire packet format.
//! - [`transport`] for the non-blocking UDP socket adapter.
//! - `cli` for the argument parsing and entry points built on top of this
//!   crate.

pub mod config;
pub mod error;
pub mod exit_code;
pub mod receiver;
pub mod sender;

pub use config::{ReceiverConfig, SenderConfig};
pub use error::{ReceiverError, SenderError};
pub use sender::send_file;
