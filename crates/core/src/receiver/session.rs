//! Receiver-side session state and the fixed-capacity session table.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// State the receiver keeps for one in-flight or completed transfer.
pub struct Session {
    /// Monotonic local identifier, assigned at creation.
    pub session_id: u64,
    /// Filename declared by the sender in the handshake.
    pub filename: String,
    /// Declared total packet count.
    pub total: u32,
    /// Next in-order sequence number expected.
    pub expected: u32,
    /// Count of in-order packets committed to the sink so far.
    pub received: u32,
    /// Append-only destination file.
    sink: File,
    /// Milliseconds (socket-relative monotonic clock) of the last datagram
    /// seen from this peer.
    pub last_activity_ms: u64,
}

impl Session {
    /// Opens a new session's sink at `<outdir>/<filename>_<session_id>_<peer_key>`
    /// and returns the initialized session.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the sink file cannot be created.
    pub fn create(
        out_dir: &Path,
        filename: &str,
        session_id: u64,
        peer_key: &str,
        total: u32,
        now_ms: u64,
    ) -> io::Result<(Self, PathBuf)> {
        let sink_path = out_dir.join(format!("{filename}_{session_id}_{peer_key}"));
        let sink = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&sink_path)?;
        Ok((
            Self {
                session_id,
                filename: filename.to_string(),
                total,
                expected: 0,
                received: 0,
                sink,
                last_activity_ms: now_ms,
            },
            sink_path,
        ))
    }

    /// Appends `payload` to the sink and advances `expected`/`received`.
    ///
    /// Returns an error if the write is short or fails outright; the caller
    /// treats this as a fatal condition for the session (see
    /// `SPEC_FULL.md` §11.2 and the open-question decision recorded in
    /// `DESIGN.md` regarding short sink writes).
    pub fn append(&mut self, payload: &[u8]) -> io::Result<()> {
        self.sink.write_all(payload)?;
        self.expected += 1;
        self.received += 1;
        Ok(())
    }

    /// Flushes and drops the sink. Called on FIN, re-handshake, and idle
    /// eviction.
    pub fn close(mut self) {
        let _ = self.sink.flush();
    }
}

/// Fixed-capacity table of active sessions, keyed by `peer_key`.
///
/// A linear scan over a small `Vec` is deliberate: the bound is small
/// (`capacity`, recommended 100), entries are cache-friendly to scan, and
/// there are no hash collisions to reason about.
pub struct SessionTable {
    entries: Vec<(String, Session)>,
    capacity: usize,
    next_session_id_hint: u64,
}

impl SessionTable {
    /// Creates an empty table bounded to `capacity` concurrent sessions.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            next_session_id_hint: 0,
        }
    }

    /// Looks up the session for `peer_key`, if any.
    pub fn get_mut(&mut self, peer_key: &str) -> Option<&mut Session> {
        self.entries
            .iter_mut()
            .find(|(key, _)| key == peer_key)
            .map(|(_, session)| session)
    }

    /// Removes and returns the session for `peer_key`, if any.
    pub fn remove(&mut self, peer_key: &str) -> Option<Session> {
        let index = self.entries.iter().position(|(key, _)| key == peer_key)?;
        Some(self.entries.remove(index).1)
    }

    /// `true` if the table is at its configured capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Allocates a fresh session id from a monotonic millisecond clock,
    /// nudged forward if two handshakes land in the same millisecond so ids
    /// stay unique within one receiver process (see the open-question
    /// decision on `session_id` collisions in `DESIGN.md`).
    pub fn allocate_session_id(&mut self, now_ms: u64) -> u64 {
        let id = now_ms.max(self.next_session_id_hint);
        self.next_session_id_hint = id + 1;
        id
    }

    /// Inserts `session` for `peer_key`, replacing (and closing) any prior
    /// session for the same peer first. Callers must check [`is_full`]
    /// before inserting a *new* peer; replacing an existing peer never
    /// changes occupancy.
    ///
    /// [`is_full`]: Self::is_full
    pub fn insert(&mut self, peer_key: String, session: Session) {
        if let Some(index) = self.entries.iter().position(|(key, _)| *key == peer_key) {
            let (_, old) = self.entries.remove(index);
            old.close();
        }
        self.entries.push((peer_key, session));
    }

    /// Closes and removes every session whose `last_activity_ms` is older
    /// than `idle_after_ms` relative to `now_ms`.
    ///
    /// Returns the number of sessions evicted, for logging.
    pub fn evict_idle(&mut self, now_ms: u64, idle_after_ms: u64) -> usize {
        let mut evicted = 0;
        self.entries.retain(|(_, session)| {
            let idle = now_ms.saturating_sub(session.last_activity_ms);
            if idle >= idle_after_ms {
                evicted += 1;
                false
            } else {
                true
            }
        });
        evicted
    }
}

/// Ensures `dir` exists, creating it (and parents) if necessary.
pub fn ensure_out_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

/// Builds the canonical `ip:port` textual key for a peer address, matching
/// the wire spec's `peer_key` definition.
#[must_use]
pub fn peer_key(addr: std::net::SocketAddr) -> String {
    addr.to_string()
}
