//! Sender state machine: handshake, windowed transmission, teardown.

mod state;

pub use state::SendState;

use std::fs;
use std::time::Duration;

use transport::Socket;
use wire::{Packet, PacketType};

use crate::config::SenderConfig;
use crate::error::SenderError;

/// Interval between non-blocking polls when no datagram is pending.
const POLL_SLEEP: Duration = Duration::from_millis(5);

/// Drives a single outbound transfer to completion.
///
/// Opens `config.file`, partitions it into `config.chunk_size`-byte chunks,
/// and runs the three-phase protocol: handshake, windowed transmission,
/// teardown.
///
/// # Errors
///
/// Returns [`SenderError::SourceIo`] if the file cannot be read,
/// [`SenderError::Transport`] if the socket cannot be bound,
/// [`SenderError::HandshakeFailed`]/[`SenderError::HandshakeRejected`] if
/// the handshake phase fails, [`SenderError::TransferFailed`]/
/// [`SenderError::TransferRejected`] if windowed transmission fails, and
/// [`SenderError::FinFailed`] if teardown is not acknowledged.
pub fn send_file(config: &SenderConfig) -> Result<(), SenderError> {
    let bytes = fs::read(&config.file).map_err(|source| SenderError::SourceIo {
        path: config.file.clone(),
        source,
    })?;
    let filename = basename(&config.file.to_string_lossy());

    let socket = Socket::bind("0.0.0.0:0")?;
    let chunks = partition(&bytes, config.chunk_size as usize);
    let total = chunks.len() as u32;

    logging::log_info!(peer = %config.peer, %filename, total, "starting transfer");

    handshake(&socket, config, &filename, bytes.len(), total)?;
    transmit(&socket, config, &chunks, total)?;
    teardown(&socket, config)?;

    logging::log_info!(peer = %config.peer, "transfer complete");
    Ok(())
}

/// Splits `bytes` into `chunk_size`-sized chunks; the last may be shorter.
/// A zero-byte source yields zero chunks.
fn partition(bytes: &[u8], chunk_size: usize) -> Vec<&[u8]> {
    if bytes.is_empty() {
        return Vec::new();
    }
    bytes.chunks(chunk_size.max(1)).collect()
}

/// Extracts the final path component, tolerating either `/` or `\`
/// separators regardless of host platform.
fn basename(path: &str) -> String {
    path.rsplit(['/', '\\']).next().unwrap_or(path).to_string()
}

fn handshake(
    socket: &Socket,
    config: &SenderConfig,
    filename: &str,
    filesize: usize,
    total: u32,
) -> Result<(), SenderError> {
    let payload = format!(
        "{filename}|{filesize}|{total}|{}|{}",
        config.chunk_size, config.window
    )
    .into_bytes();
    let packet =
        Packet::control_with_payload(PacketType::Handshake, 0, total, config.window, payload);
    let bytes = packet.encode();

    for attempt in 1..=config.max_retries {
        socket.send(&bytes, config.peer)?;
        logging::log_debug!(attempt, "sent HANDSHAKE");
        let deadline = socket.now_ms() + config.timeout.as_millis() as u64;
        while socket.now_ms() < deadline {
            match socket.try_recv()? {
                Some((reply, peer)) if peer == config.peer => {
                    if let Ok(reply) = Packet::decode(&reply) {
                        match reply.packet_type {
                            PacketType::HandshakeAck => return Ok(()),
                            PacketType::Error => {
                                return Err(SenderError::HandshakeRejected {
                                    message: String::from_utf8_lossy(&reply.payload).into_owned(),
                                })
                            }
                            _ => {}
                        }
                    }
                }
                _ => Socket::poll_sleep(POLL_SLEEP),
            }
        }
    }
    Err(SenderError::HandshakeFailed {
        attempts: config.max_retries,
    })
}

fn transmit(
    socket: &Socket,
    config: &SenderConfig,
    chunks: &[&[u8]],
    total: u32,
) -> Result<(), SenderError> {
    let mut state = SendState::new(total, config.window);

    while state.base() < total {
        // 1. Fill window.
        while state.can_send_more() {
            let seq = state.next_seq();
            let packet = Packet::data(seq, total, config.window, chunks[seq as usize].to_vec());
            socket.send(&packet.encode(), config.peer)?;
            logging::log_debug!(seq, "sent DATA");
            if state.arm_if_idle(socket.now_ms(), config.timeout) {
                logging::log_trace!(seq, "armed retransmit timer");
            }
            state.advance_next_seq();
        }

        // 2. Drain at most one inbound datagram.
        if let Some((bytes, peer)) = socket.try_recv()? {
            if peer == config.peer {
                if let Ok(packet) = Packet::decode(&bytes) {
                    match packet.packet_type {
                        PacketType::Ack
                            if state.acknowledge(packet.seq, socket.now_ms(), config.timeout) =>
                        {
                            logging::log_debug!(seq = packet.seq, "ACK advanced window");
                        }
                        PacketType::Error => {
                            return Err(SenderError::TransferRejected {
                                message: String::from_utf8_lossy(&packet.payload).into_owned(),
                            });
                        }
                        _ => {}
                    }
                }
            }
        } else {
            Socket::poll_sleep(POLL_SLEEP);
        }

        // 3. Check the retransmit timer.
        if state.timer_expired(socket.now_ms()) {
            state.record_timeout();
            if state.retry_count() > config.max_retries {
                return Err(SenderError::TransferFailed {
                    retries: state.retry_count(),
                });
            }
            logging::log_warn!(
                retry = state.retry_count(),
                "retransmit timer expired, resending window"
            );
            for seq in state.base()..state.next_seq() {
                let packet = Packet::data(seq, total, config.window, chunks[seq as usize].to_vec());
                socket.send(&packet.encode(), config.peer)?;
            }
            state.rearm(socket.now_ms(), config.timeout);
        }
    }
    Ok(())
}

fn teardown(socket: &Socket, config: &SenderConfig) -> Result<(), SenderError> {
    let packet = Packet::control(PacketType::Fin, 0, 0, 0);
    let bytes = packet.encode();

    for attempt in 1..=config.max_retries {
        socket.send(&bytes, config.peer)?;
        logging::log_debug!(attempt, "sent FIN");
        let deadline = socket.now_ms() + config.timeout.as_millis() as u64;
        while socket.now_ms() < deadline {
            match socket.try_recv()? {
                Some((reply, peer)) if peer == config.peer => {
                    if let Ok(reply) = Packet::decode(&reply) {
                        if reply.packet_type == PacketType::FinAck {
                            return Ok(());
                        }
                    }
                }
                _ => Socket::poll_sleep(POLL_SLEEP),
            }
        }
    }
    Err(SenderError::FinFailed {
        attempts: config.max_retries,
    })
}
