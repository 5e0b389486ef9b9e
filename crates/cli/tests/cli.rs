//! End-to-end tests driving the real `ru-send`/`ru-recv` binaries as
//! separate OS processes over loopback UDP.

use std::net::UdpSocket;
use std::path::Path;
use std::process::{Child, Command as StdCommand};
use std::thread;
use std::time::Duration;

use assert_cmd::Command;
use predicates::prelude::*;

fn free_port() -> u16 {
    UdpSocket::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn spawn_receiver(port: u16, out_dir: &Path) -> Child {
    StdCommand::new(assert_cmd::cargo::cargo_bin("ru-recv"))
        .args(["--port", &port.to_string(), "--out"])
        .arg(out_dir)
        .spawn()
        .expect("ru-recv should spawn")
}

/// Sends a raw HANDSHAKE from a fresh ephemeral socket and waits briefly for
/// the HANDSHAKE_ACK, to open a session without running a full transfer.
fn open_bare_session(receiver: std::net::SocketAddr) -> UdpSocket {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket.set_nonblocking(true).unwrap();
    let payload = b"filler.bin|0|0|256|4".to_vec();
    let packet = wire::Packet::control_with_payload(wire::PacketType::Handshake, 0, 0, 4, payload);
    socket.send_to(&packet.encode(), receiver).unwrap();

    let mut buf = [0u8; 64];
    let deadline = std::time::Instant::now() + Duration::from_millis(500);
    while std::time::Instant::now() < deadline {
        if socket.recv_from(&mut buf).is_ok() {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    socket
}

#[test]
fn sender_and_receiver_report_their_version() {
    Command::cargo_bin("ru-send")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ru-send"));

    Command::cargo_bin("ru-recv")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ru-recv"));
}

#[test]
fn happy_path_transfer_round_trips_a_small_file_between_real_binaries() {
    let src_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let source_path = src_dir.path().join("greeting.bin");
    std::fs::write(&source_path, b"hello over real sockets").unwrap();

    let port = free_port();
    let mut receiver = spawn_receiver(port, out_dir.path());
    thread::sleep(Duration::from_millis(100));

    Command::cargo_bin("ru-send")
        .unwrap()
        .args(["--host", "127.0.0.1", "--port", &port.to_string()])
        .arg("--file")
        .arg(&source_path)
        .assert()
        .success();

    let _ = receiver.kill();
    let _ = receiver.wait();
}

/// Spec §8 scenario 5: once the receiver's session table is at capacity, a
/// new HANDSHAKE gets no reply and the sender gives up with exit code 2.
#[test]
fn handshake_is_refused_once_the_session_table_is_at_capacity() {
    let out_dir = tempfile::tempdir().unwrap();
    let src_dir = tempfile::tempdir().unwrap();
    let source_path = src_dir.path().join("overflow.bin");
    std::fs::write(&source_path, b"one more byte than there's room for").unwrap();

    let port = free_port();
    let receiver_addr: std::net::SocketAddr = format!("127.0.0.1:{port}").parse().unwrap();
    let mut receiver = spawn_receiver(port, out_dir.path());
    thread::sleep(Duration::from_millis(100));

    // Fill the table (SESSION_CAPACITY = 100) with bare, never-torn-down
    // sessions so the 101st HANDSHAKE below is the one that overflows it.
    let _fillers: Vec<UdpSocket> = (0..core::ReceiverConfig::SESSION_CAPACITY)
        .map(|_| open_bare_session(receiver_addr))
        .collect();

    Command::cargo_bin("ru-send")
        .unwrap()
        .args(["--host", "127.0.0.1", "--port", &port.to_string()])
        .args(["--timeout", "50", "--max-retries", "3"])
        .arg("--file")
        .arg(&source_path)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("handshake"));

    let _ = receiver.kill();
    let _ = receiver.wait();
}

/// Spec §8 scenario 6: if the receiver restarts mid-transfer and loses its
/// session table, a subsequent DATA packet gets an ERROR "no session" reply
/// and the sender aborts with exit code 3.
#[test]
fn sender_aborts_when_the_receiver_restarts_mid_transfer() {
    let out_dir = tempfile::tempdir().unwrap();
    let src_dir = tempfile::tempdir().unwrap();
    let source_bytes: Vec<u8> = (0..20_000).map(|i| (i % 251) as u8).collect();
    let source_path = src_dir.path().join("restart.bin");
    std::fs::write(&source_path, &source_bytes).unwrap();

    let port = free_port();
    let mut first_receiver = spawn_receiver(port, out_dir.path());
    thread::sleep(Duration::from_millis(100));

    let sender = StdCommand::new(assert_cmd::cargo::cargo_bin("ru-send"))
        .args(["--host", "127.0.0.1", "--port", &port.to_string()])
        .args(["--chunk", "64", "--window", "2"])
        .args(["--timeout", "150", "--max-retries", "50"])
        .arg("--file")
        .arg(&source_path)
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .expect("ru-send should spawn");

    // Let the handshake and a few DATA/ACK round trips land before pulling
    // the rug out from under the session.
    thread::sleep(Duration::from_millis(200));
    let _ = first_receiver.kill();
    let _ = first_receiver.wait();

    let mut second_receiver = spawn_receiver(port, out_dir.path());

    let output = sender.wait_with_output().expect("ru-send should exit");
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        predicate::str::contains("no session").eval(&stderr),
        "expected a \"no session\" error in stderr, got: {stderr}"
    );

    let _ = second_receiver.kill();
    let _ = second_receiver.wait();
}
