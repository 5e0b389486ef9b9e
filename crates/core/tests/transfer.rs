//! Loopback end-to-end transfer tests, running the real sender state
//! machine against a hand-rolled receiver loop that can inject packet loss
//! and corruption.

use std::net::{SocketAddr, UdpSocket};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use core::{receiver, SenderConfig};

fn free_port() -> u16 {
    UdpSocket::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn write_source(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn sender_config(peer: SocketAddr, file: PathBuf) -> SenderConfig {
    SenderConfig {
        peer,
        file,
        chunk_size: 4,
        window: 4,
        timeout: Duration::from_millis(120),
        max_retries: 20,
    }
}

fn spawn_receiver(
    port: u16,
    out_dir: PathBuf,
    window: u16,
) -> (Arc<AtomicBool>, thread::JoinHandle<()>) {
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = Arc::clone(&shutdown);
    let config = core::ReceiverConfig {
        port,
        out_dir,
        window,
    };
    let handle = thread::spawn(move || {
        receiver::run(&config, &shutdown_clone).unwrap();
    });
    (shutdown, handle)
}

fn find_sink(out_dir: &std::path::Path, filename: &str) -> Option<PathBuf> {
    std::fs::read_dir(out_dir)
        .unwrap()
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .find(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(&format!("{filename}_")))
        })
}

#[test]
fn happy_path_small_file_round_trips_byte_identical() {
    let src_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let source_bytes = vec![0u8; 1024]
        .iter()
        .enumerate()
        .map(|(i, _)| (i % 251) as u8)
        .collect::<Vec<u8>>();
    let source_path = write_source(&src_dir, "happy.bin", &source_bytes);

    let port = free_port();
    let (shutdown, handle) = spawn_receiver(port, out_dir.path().to_path_buf(), 4);
    thread::sleep(Duration::from_millis(50));

    let mut config = sender_config(format!("127.0.0.1:{port}").parse().unwrap(), source_path);
    config.chunk_size = 256;
    core::send_file(&config).expect("transfer should succeed");

    let sink = find_sink(out_dir.path(), "happy.bin").expect("sink file should exist");
    let sink_bytes = std::fs::read(&sink).unwrap();
    assert_eq!(sink_bytes, source_bytes);

    shutdown.store(true, Ordering::Relaxed);
    handle.join().unwrap();
}

#[test]
fn zero_byte_source_produces_an_empty_sink() {
    let src_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let source_path = write_source(&src_dir, "empty.bin", b"");

    let port = free_port();
    let (shutdown, handle) = spawn_receiver(port, out_dir.path().to_path_buf(), 4);
    thread::sleep(Duration::from_millis(50));

    let config = sender_config(format!("127.0.0.1:{port}").parse().unwrap(), source_path);
    core::send_file(&config).expect("zero-byte transfer should succeed");

    let sink = find_sink(out_dir.path(), "empty.bin").expect("sink file should exist");
    assert_eq!(std::fs::read(&sink).unwrap().len(), 0);

    shutdown.store(true, Ordering::Relaxed);
    handle.join().unwrap();
}

#[test]
fn exact_multiple_of_chunk_size_has_no_short_tail_corruption() {
    let src_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let source_bytes: Vec<u8> = (0..32).collect();
    let source_path = write_source(&src_dir, "exact.bin", &source_bytes);

    let port = free_port();
    let (shutdown, handle) = spawn_receiver(port, out_dir.path().to_path_buf(), 4);
    thread::sleep(Duration::from_millis(50));

    let mut config = sender_config(format!("127.0.0.1:{port}").parse().unwrap(), source_path);
    config.chunk_size = 8;
    core::send_file(&config).expect("transfer should succeed");

    let sink = find_sink(out_dir.path(), "exact.bin").unwrap();
    assert_eq!(std::fs::read(&sink).unwrap(), source_bytes);

    shutdown.store(true, Ordering::Relaxed);
    handle.join().unwrap();
}

/// A UDP relay sitting between the sender and the real receiver, able to
/// drop or corrupt DATA packets matching a chosen sequence number. Replies
/// are forwarded back untouched.
fn spawn_lossy_relay(
    receiver_addr: SocketAddr,
    drop_seq: Option<u32>,
    corrupt_seq: Option<u32>,
) -> (SocketAddr, thread::JoinHandle<()>) {
    let relay = UdpSocket::bind("127.0.0.1:0").unwrap();
    let relay_addr = relay.local_addr().unwrap();
    relay
        .set_read_timeout(Some(Duration::from_millis(50)))
        .unwrap();

    let mut dropped_once = false;
    let mut corrupted_once = false;

    let handle = thread::spawn(move || {
        let mut sender_addr: Option<SocketAddr> = None;
        let mut buf = vec![0u8; 65_507];
        loop {
            match relay.recv_from(&mut buf) {
                Ok((len, from)) => {
                    if from == receiver_addr {
                        if let Some(dest) = sender_addr {
                            let _ = relay.send_to(&buf[..len], dest);
                        }
                        continue;
                    }
                    sender_addr = Some(from);
                    let mut datagram = buf[..len].to_vec();

                    if let Ok(packet) = wire::Packet::decode(&datagram) {
                        if packet.packet_type == wire::PacketType::Data {
                            if !dropped_once && Some(packet.seq) == drop_seq {
                                dropped_once = true;
                                continue;
                            }
                            if !corrupted_once && Some(packet.seq) == corrupt_seq {
                                corrupted_once = true;
                                let last = datagram.len() - 1;
                                datagram[last] ^= 0xFF;
                            }
                        }
                    }
                    let _ = relay.send_to(&datagram, receiver_addr);
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {}
                Err(_) => break,
            }
        }
    });

    (relay_addr, handle)
}

#[test]
fn single_data_loss_triggers_retransmission_and_still_completes() {
    let src_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let source_bytes: Vec<u8> = (0..64).collect();
    let source_path = write_source(&src_dir, "lossy.bin", &source_bytes);

    let port = free_port();
    let (shutdown, receiver_handle) = spawn_receiver(port, out_dir.path().to_path_buf(), 4);
    thread::sleep(Duration::from_millis(50));

    let receiver_addr: SocketAddr = format!("127.0.0.1:{port}").parse().unwrap();
    let (relay_addr, _relay_handle) = spawn_lossy_relay(receiver_addr, Some(1), None);

    let mut config = sender_config(relay_addr, source_path);
    config.chunk_size = 8;
    config.timeout = Duration::from_millis(80);
    core::send_file(&config).expect("transfer should survive a single dropped packet");

    let sink = find_sink(out_dir.path(), "lossy.bin").unwrap();
    assert_eq!(std::fs::read(&sink).unwrap(), source_bytes);

    shutdown.store(true, Ordering::Relaxed);
    receiver_handle.join().unwrap();
}

#[test]
fn checksum_corruption_triggers_retransmission_and_still_completes() {
    let src_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let source_bytes: Vec<u8> = (0..64).map(|b| b ^ 0x5A).collect();
    let source_path = write_source(&src_dir, "corrupt.bin", &source_bytes);

    let port = free_port();
    let (shutdown, receiver_handle) = spawn_receiver(port, out_dir.path().to_path_buf(), 4);
    thread::sleep(Duration::from_millis(50));

    let receiver_addr: SocketAddr = format!("127.0.0.1:{port}").parse().unwrap();
    let (relay_addr, _relay_handle) = spawn_lossy_relay(receiver_addr, None, Some(2));

    let mut config = sender_config(relay_addr, source_path);
    config.chunk_size = 8;
    config.timeout = Duration::from_millis(80);
    core::send_file(&config).expect("transfer should survive one corrupted packet");

    let sink = find_sink(out_dir.path(), "corrupt.bin").unwrap();
    assert_eq!(std::fs::read(&sink).unwrap(), source_bytes);

    shutdown.store(true, Ordering::Relaxed);
    receiver_handle.join().unwrap();
}

#[test]
fn sender_fails_with_handshake_failed_when_nothing_is_listening() {
    let src_dir = tempfile::tempdir().unwrap();
    let source_path = write_source(&src_dir, "unreachable.bin", b"hello world");

    // free_port() binds then immediately drops the socket, so this port is
    // almost certainly unoccupied for the duration of the test.
    let port = free_port();
    let mut config = sender_config(format!("127.0.0.1:{port}").parse().unwrap(), source_path);
    config.timeout = Duration::from_millis(20);
    config.max_retries = 2;

    let err = core::send_file(&config).expect_err("handshake should fail with nobody listening");
    assert!(matches!(err, core::SenderError::HandshakeFailed { .. }));
}
