#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `transport` wraps a single UDP socket in the shape the sender and
//! receiver state machines in `core` expect: non-blocking send, non-blocking
//! receive that cleanly distinguishes "nothing arrived" from a genuine
//! error, and a monotonic millisecond clock for timer arithmetic.
//!
//! # Design
//!
//! [`Socket::bind`] binds and immediately switches the socket to
//! non-blocking mode via [`std::net::UdpSocket::set_nonblocking`], so every
//! later `try_recv` either returns a datagram, `None`, or a real
//! [`TransportError`] — never blocks the calling loop. The monotonic clock
//! is a single process-wide [`std::time::Instant`] captured at first use and
//! measured against on every [`Socket::now_ms`] call, rather than the wall
//! clock, so it is immune to clock adjustments.
//!
//! # Invariants
//!
//! - `try_recv` returns `Ok(None)` for `WouldBlock`/`EAGAIN`, never an `Err`.
//! - `now_ms` is monotonically non-decreasing for the lifetime of the
//!   process.
//!
//! # Errors
//!
//! [`TransportError`] wraps the two ways socket setup or I/O can fail: bind
//! failure and any I/O error other than "would block" surfaced by send or
//! receive.
//!
//! # Examples
//!
//! ```no_run
//! use transport::Socket;
//!
//! let socket = Socket::bind("0.0.0.0:0").unwrap();
//! let deadline = socket.now_ms() + 300;
//! while socket.now_ms() < deadline {
//!     if let Some((bytes, peer)) = socket.try_recv().unwrap() {
//!         println!("received {} byte(s) from {peer}", bytes.len());
//!         break;
//!     }
//! }
//! ```
//!
//! # See also
//!
//! - `core` for the sender/receiver loops built on top of this adapter.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

/// Maximum UDP datagram this adapter will attempt to read in one call.
///
/// Comfortably larger than any header-plus-chunk payload the protocol
/// negotiates in practice, while still bounded to avoid an unreasonable
/// per-call allocation.
const MAX_DATAGRAM: usize = 65_507;

/// A non-blocking UDP socket with a monotonic clock attached.
pub struct Socket {
    inner: UdpSocket,
    epoch: Instant,
}

impl Socket {
    /// Binds a UDP socket at `addr` and switches it to non-blocking mode.
    ///
    /// Pass `"0.0.0.0:0"` for an ephemeral sender-side socket, or
    /// `"0.0.0.0:<port>"` for a receiver listening on a fixed port.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Bind`] if the address cannot be resolved or
    /// the bind syscall fails (e.g. the port is already in use).
    pub fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addr).map_err(TransportError::Bind)?;
        socket.set_nonblocking(true).map_err(TransportError::Bind)?;
        Ok(Self {
            inner: socket,
            epoch: Instant::now(),
        })
    }

    /// Returns the local address this socket is bound to.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] if the underlying syscall fails.
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.inner.local_addr().map_err(TransportError::Io)
    }

    /// Sends `bytes` to `peer`.
    ///
    /// UDP sends are fire-and-forget: a successful return means the
    /// datagram was handed to the kernel, not that the peer received it.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] on any underlying socket error.
    pub fn send(&self, bytes: &[u8], peer: SocketAddr) -> Result<(), TransportError> {
        self.inner
            .send_to(bytes, peer)
            .map_err(TransportError::Io)?;
        Ok(())
    }

    /// Attempts to receive one datagram without blocking.
    ///
    /// Returns `Ok(None)` when no datagram is currently available — this is
    /// the expected, silent case on every idle poll, not an error. Returns
    /// `Ok(Some((bytes, peer)))` when one arrives.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] for any I/O error other than
    /// "would block".
    pub fn try_recv(&self) -> Result<Option<(Vec<u8>, SocketAddr)>, TransportError> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        match self.inner.recv_from(&mut buf) {
            Ok((len, peer)) => {
                buf.truncate(len);
                Ok(Some((buf, peer)))
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(err) => Err(TransportError::Io(err)),
        }
    }

    /// Returns milliseconds elapsed since this socket was created.
    ///
    /// Backed by [`std::time::Instant`], so it is monotonic and unaffected
    /// by wall-clock adjustments; suitable for retransmit-timer deadlines.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Sleeps the calling thread briefly.
    ///
    /// Used by the sender/receiver cooperative loops to avoid busy-spinning
    /// between non-blocking polls while preserving sub-timeout latency; see
    /// the poll cadence documented on the sender/receiver loops in `core`.
    pub fn poll_sleep(duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Reasons a [`Socket`] operation can fail.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the underlying UDP socket failed.
    #[error("failed to bind UDP socket: {0}")]
    Bind(#[source] io::Error),
    /// A send or receive syscall failed for a reason other than "would
    /// block".
    #[error("UDP socket I/O error: {0}")]
    Io(#[source] io::Error),
}
