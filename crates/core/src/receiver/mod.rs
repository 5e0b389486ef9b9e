//! Receiver state machine: session table, in-order delivery, teardown.

mod session;

pub use session::{ensure_out_dir, peer_key, Session, SessionTable};

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use transport::Socket;
use wire::{CodecError, Packet, PacketType};

use crate::config::ReceiverConfig;
use crate::error::ReceiverError;

/// Minimum number of `|`-separated fields a HANDSHAKE payload must carry.
const HANDSHAKE_MIN_FIELDS: usize = 5;

/// Interval between non-blocking polls when no datagram is pending.
const POLL_SLEEP: Duration = Duration::from_millis(5);

/// Runs the receiver's ingress loop until `shutdown` is set.
///
/// Dispatches every inbound datagram by type, maintains the session table,
/// and periodically sweeps for idle sessions. Returns once `shutdown`
/// observes `true`, after flushing every still-open session (see
/// `SPEC_FULL.md` §11.2 on signal-driven shutdown).
///
/// # Errors
///
/// Returns [`ReceiverError::Bind`] if the listening socket cannot be bound,
/// or [`ReceiverError::OutDir`] if the output directory cannot be created.
pub fn run(config: &ReceiverConfig, shutdown: &Arc<AtomicBool>) -> Result<(), ReceiverError> {
    ensure_out_dir(&config.out_dir).map_err(|source| ReceiverError::OutDir {
        path: config.out_dir.clone(),
        source,
    })?;

    let socket = Socket::bind(("0.0.0.0", config.port)).map_err(ReceiverError::Bind)?;
    logging::log_info!(port = config.port, out_dir = %config.out_dir.display(), "receiver listening");

    let mut table = SessionTable::new(ReceiverConfig::SESSION_CAPACITY);
    let mut next_sweep_at =
        socket.now_ms() + ReceiverConfig::SESSION_SWEEP_INTERVAL.as_millis() as u64;

    while !shutdown.load(Ordering::Relaxed) {
        match socket.try_recv() {
            Ok(Some((bytes, peer))) => handle_datagram(&socket, &mut table, config, &bytes, peer),
            Ok(None) => Socket::poll_sleep(POLL_SLEEP),
            Err(err) => {
                logging::log_warn!(error = %err, "transport error while receiving");
                Socket::poll_sleep(POLL_SLEEP);
            }
        }

        let now = socket.now_ms();
        if now >= next_sweep_at {
            let evicted =
                table.evict_idle(now, ReceiverConfig::SESSION_IDLE_TIMEOUT.as_millis() as u64);
            if evicted > 0 {
                logging::log_info!(evicted, "swept idle session(s)");
            }
            next_sweep_at = now + ReceiverConfig::SESSION_SWEEP_INTERVAL.as_millis() as u64;
        }
    }

    table.evict_idle(u64::MAX, 0);
    logging::log_info!("receiver shutting down");
    Ok(())
}

fn handle_datagram(
    socket: &Socket,
    table: &mut SessionTable,
    config: &ReceiverConfig,
    bytes: &[u8],
    peer: SocketAddr,
) {
    let packet = match Packet::decode(bytes) {
        Ok(packet) => packet,
        Err(err) => {
            codec_error_is_silently_dropped(err);
            return;
        }
    };

    let key = peer_key(peer);
    match packet.packet_type {
        PacketType::Handshake => handle_handshake(socket, table, config, &packet, peer, &key),
        PacketType::Data => handle_data(socket, table, bytes, &packet, peer, &key),
        PacketType::Fin => handle_fin(socket, table, peer, &key),
        _ => {}
    }
}

/// Codec errors (bad magic, short header, truncated payload) are random
/// noise from the receiver's point of view and dropped without a reply, per
/// the error-handling table.
fn codec_error_is_silently_dropped(err: CodecError) {
    logging::log_debug!(error = %err, "dropped undecodable datagram");
}

fn handle_handshake(
    socket: &Socket,
    table: &mut SessionTable,
    config: &ReceiverConfig,
    packet: &Packet,
    peer: SocketAddr,
    key: &str,
) {
    let fields: Vec<&str> = std::str::from_utf8(&packet.payload)
        .unwrap_or("")
        .split('|')
        .collect();
    if fields.len() < HANDSHAKE_MIN_FIELDS {
        reply(
            socket,
            peer,
            &Packet::control_with_payload(PacketType::Error, 0, 0, 0, b"bad handshake".to_vec()),
        );
        return;
    }
    let filename = fields[0];
    let Ok(total) = fields[2].parse::<u32>() else {
        reply(
            socket,
            peer,
            &Packet::control_with_payload(PacketType::Error, 0, 0, 0, b"bad handshake".to_vec()),
        );
        return;
    };

    if table.get_mut(key).is_none() && table.is_full() {
        logging::log_warn!(peer = %peer, "session table at capacity, dropping handshake");
        return;
    }

    let now = socket.now_ms();
    let session_id = table.allocate_session_id(now);
    match Session::create(&config.out_dir, filename, session_id, key, total, now) {
        Ok((session, sink_path)) => {
            table.insert(key.to_string(), session);
            logging::log_info!(peer = %peer, session_id, sink = %sink_path.display(), total, "session opened");
            reply(
                socket,
                peer,
                &Packet::control(PacketType::HandshakeAck, 0, total, config.window),
            );
        }
        Err(err) => {
            logging::log_error!(peer = %peer, error = %err, "failed to open sink");
        }
    }
}

fn handle_data(
    socket: &Socket,
    table: &mut SessionTable,
    raw: &[u8],
    packet: &Packet,
    peer: SocketAddr,
    key: &str,
) {
    let Some(session) = table.get_mut(key) else {
        reply(
            socket,
            peer,
            &Packet::control_with_payload(PacketType::Error, 0, 0, 0, b"no session".to_vec()),
        );
        return;
    };

    let checksum = Packet::checksum_field(raw).unwrap_or(0);
    if !Packet::checksum_valid(&packet.payload, checksum) {
        logging::log_warn!(peer = %peer, seq = packet.seq, "checksum mismatch, dropping datagram");
        let ack_seq = session.expected.saturating_sub(1);
        session.last_activity_ms = socket.now_ms();
        reply(
            socket,
            peer,
            &Packet::control(PacketType::Ack, ack_seq, session.total, 0),
        );
        return;
    }

    if packet.seq == session.expected {
        if let Err(err) = session.append(&packet.payload) {
            logging::log_error!(peer = %peer, error = %err, "failed to write to sink, aborting session");
            if let Some(session) = table.remove(key) {
                session.close();
            }
            return;
        }
    }
    // Out-of-order packets are silently dropped: Go-Back-N semantics, no
    // receiver-side buffering.

    session.last_activity_ms = socket.now_ms();
    let ack_seq = session.expected.max(1) - 1;
    let total = session.total;
    reply(
        socket,
        peer,
        &Packet::control(PacketType::Ack, ack_seq, total, 0),
    );
}

fn handle_fin(socket: &Socket, table: &mut SessionTable, peer: SocketAddr, key: &str) {
    if let Some(session) = table.remove(key) {
        logging::log_info!(peer = %peer, session_id = session.session_id, received = session.received, "transfer complete");
        session.close();
    }
    // FIN_ACK is sent even without a known session, so a sender whose
    // session was evicted still terminates cleanly.
    reply(socket, peer, &Packet::control(PacketType::FinAck, 0, 0, 0));
}

fn reply(socket: &Socket, peer: SocketAddr, packet: &Packet) {
    if let Err(err) = socket.send(&packet.encode(), peer) {
        logging::log_warn!(peer = %peer, error = %err, "failed to send reply datagram");
    }
}
