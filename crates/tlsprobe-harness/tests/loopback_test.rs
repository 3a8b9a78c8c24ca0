//! End-to-end exchanges over loopback sockets.
//!
//! Two drivers share one idler, as a test program running a client and a
//! server on one thread would.

use std::{
    net::{TcpListener, TcpStream, UdpSocket},
    time::Duration,
};

use tlsprobe_crypto::DrbgKind;
use tlsprobe_harness::{HarnessConfig, HarnessError, IoMode, TestDriver};
use tlsprobe_io::{Direction, IdleReason, Idler};

fn peer_config(io_mode: IoMode, personalization: &[u8]) -> HarnessConfig {
    HarnessConfig {
        drbg: DrbgKind::Hmac,
        reproducible: true,
        personalization: personalization.to_vec(),
        io_mode,
        delay_io: true,
        read_timeout: Some(Duration::from_secs(5)),
        ..Default::default()
    }
}

fn tcp_pair(idler: &Idler) -> (tokio::net::TcpStream, tokio::net::TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let client = TcpStream::connect(listener.local_addr().expect("addr")).expect("connect");
    let (server, _) = listener.accept().expect("accept");
    (idler.register_tcp(client).expect("register"), idler.register_tcp(server).expect("register"))
}

fn echo_rounds(io_mode: IoMode, rounds: usize, size: usize) -> Vec<u8> {
    let idler = Idler::new().expect("idler");
    let (client_io, server_io) = tcp_pair(&idler);
    let mut client =
        TestDriver::new(&peer_config(io_mode, b"client"), client_io, &idler).expect("client");
    let mut server =
        TestDriver::new(&peer_config(io_mode, b"server"), server_io, &idler).expect("server");

    let mut transcript = Vec::new();
    let mut payload = vec![0u8; size];
    let mut echoed = vec![0u8; size];
    for _ in 0..rounds {
        client.random(&mut payload).expect("random");
        client.send_all(&payload).expect("client send");
        server.recv_exact(&mut echoed).expect("server recv");
        server.send_all(&echoed).expect("server send");
        client.recv_exact(&mut echoed).expect("client recv");
        assert_eq!(echoed, payload);
        transcript.extend_from_slice(&payload);
    }

    assert!(client.transport().forced(Direction::Write) >= rounds as u64);
    assert!(server.transport().forced(Direction::Read) >= rounds as u64);
    transcript
}

#[test]
fn blocking_mode_echo() {
    let transcript = echo_rounds(IoMode::Blocking, 4, 512);
    assert_eq!(transcript.len(), 4 * 512);
}

#[test]
fn event_driven_echo() {
    let transcript = echo_rounds(IoMode::EventDriven, 4, 512);
    assert_eq!(transcript.len(), 4 * 512);
}

#[test]
fn reproducible_runs_replay_the_same_traffic() {
    assert_eq!(echo_rounds(IoMode::EventDriven, 3, 64), echo_rounds(IoMode::Blocking, 3, 64));
}

#[test]
fn dtls_style_timer_expiry_is_a_timeout() {
    let idler = Idler::new().expect("idler");
    let a = UdpSocket::bind("127.0.0.1:0").expect("bind");
    let b = UdpSocket::bind("127.0.0.1:0").expect("bind");
    a.connect(b.local_addr().expect("addr")).expect("connect");
    b.connect(a.local_addr().expect("addr")).expect("connect");

    let config = HarnessConfig { read_timeout: None, ..peer_config(IoMode::EventDriven, b"dtls") };
    let mut peer =
        TestDriver::new(&config, idler.register_udp(a).expect("register"), &idler).expect("peer");
    peer.set_timer(Duration::from_millis(10), Duration::from_millis(40));

    let mut buf = [0u8; 64];
    let err = peer.recv_retrying(&mut buf).expect_err("nothing sent");
    assert!(matches!(err, HarnessError::Timeout { reason: IdleReason::WantRead }));
    assert!(peer.timer_status().is_expired());

    // A datagram that arrives before the next deadline is delivered
    b.send(b"flight").expect("send");
    peer.set_timer(Duration::from_millis(500), Duration::from_secs(5));
    let n = peer.recv_retrying(&mut buf).expect("datagram");
    assert_eq!(&buf[..n], b"flight");
}

#[test]
fn closed_peer_ends_recv_exact() {
    let idler = Idler::new().expect("idler");
    let (client_io, server_io) = tcp_pair(&idler);
    let mut server =
        TestDriver::new(&peer_config(IoMode::EventDriven, b"server"), server_io, &idler)
            .expect("server");
    drop(client_io);

    let mut buf = [0u8; 16];
    assert!(matches!(server.recv_exact(&mut buf), Err(HarnessError::Closed)));
}
