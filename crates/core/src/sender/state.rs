//! Send-window and single-timer Go-Back-N bookkeeping.

use std::time::Duration;

/// Sliding-window and retransmit-timer state for one outbound transfer.
///
/// Invariants: `base <= next_seq <= min(base + window, total)`; the timer is
/// running iff `base < next_seq`; any increase of `base` resets both the
/// timer and `retry_count`.
pub struct SendState {
    total: u32,
    window: u16,
    base: u32,
    next_seq: u32,
    timer_deadline: Option<u64>,
    retry_count: u32,
}

impl SendState {
    /// Creates fresh state for a transfer of `total` packets with the given
    /// `window` size.
    #[must_use]
    pub fn new(total: u32, window: u16) -> Self {
        Self {
            total,
            window,
            base: 0,
            next_seq: 0,
            timer_deadline: None,
            retry_count: 0,
        }
    }

    /// Oldest unacknowledged sequence number.
    #[must_use]
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Next sequence number to transmit.
    #[must_use]
    pub fn next_seq(&self) -> u32 {
        self.next_seq
    }

    /// Consecutive retransmit-timer expirations since the last forward
    /// progress.
    #[must_use]
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// `true` while the window still has room for another in-flight packet.
    #[must_use]
    pub fn can_send_more(&self) -> bool {
        self.next_seq < self.base + u32::from(self.window) && self.next_seq < self.total
    }

    /// Advances `next_seq` by one, to be called immediately after sending
    /// the packet at the current `next_seq`.
    pub fn advance_next_seq(&mut self) {
        self.next_seq += 1;
    }

    /// Arms the retransmit timer if it is not already running (i.e. if
    /// `base == next_seq` before this send). Returns `true` if it was armed.
    pub fn arm_if_idle(&mut self, now_ms: u64, timeout: Duration) -> bool {
        if self.base == self.next_seq {
            self.timer_deadline = Some(now_ms + timeout.as_millis() as u64);
            true
        } else {
            false
        }
    }

    /// `true` if the timer is running and `now_ms` is past its deadline.
    #[must_use]
    pub fn timer_expired(&self, now_ms: u64) -> bool {
        matches!(self.timer_deadline, Some(deadline) if now_ms >= deadline)
    }

    /// Records a timer expiry: increments `retry_count`. Does not rewind
    /// `next_seq` — outstanding packets in `[base, next_seq)` remain
    /// outstanding and are retransmitted by the caller (Go-Back-N).
    pub fn record_timeout(&mut self) {
        self.retry_count += 1;
    }

    /// Restarts the timer deadline from `now_ms`, after a retransmission.
    pub fn rearm(&mut self, now_ms: u64, timeout: Duration) {
        self.timer_deadline = Some(now_ms + timeout.as_millis() as u64);
    }

    /// Applies a cumulative ACK with the given `seq`. Stale ACKs
    /// (`seq < base`) are ignored. Returns `true` if `base` advanced.
    ///
    /// On forward progress, cancels the timer if the window has drained
    /// (`base == next_seq`), otherwise restarts the deadline from `now_ms`,
    /// and resets `retry_count`.
    pub fn acknowledge(&mut self, seq: u32, now_ms: u64, timeout: Duration) -> bool {
        if seq < self.base {
            return false;
        }
        let new_base = seq + 1;
        if new_base <= self.base {
            return false;
        }
        self.base = new_base;
        self.retry_count = 0;
        if self.base == self.next_seq {
            self.timer_deadline = None;
        } else {
            self.timer_deadline = Some(now_ms + timeout.as_millis() as u64);
        }
        true
    }
}
