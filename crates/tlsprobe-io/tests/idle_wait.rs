//! Wait semantics of the idler.
//!
//! Timing tests run on a paused tokio clock, so "T1 vs T2" comparisons are
//! exact rather than subject to scheduler jitter. The loopback tests use
//! real sockets to check that readiness is wired to the reactor.

use std::{
    future::Future,
    io,
    net::{TcpListener, TcpStream, UdpSocket},
    time::Duration,
};

use proptest::prelude::*;
use tlsprobe_io::{
    DelayTimer, DelayedIo, IdleOutcome, IdleReason, Idler, Readiness, Transport, TransportError,
    WaitRequest,
};
use tokio::{io::Interest, time::Instant};

/// Becomes ready at a fixed instant on the runtime clock.
struct ReadyAt(Instant);

impl Readiness for ReadyAt {
    fn wait_ready(&self, _interest: Interest) -> impl Future<Output = io::Result<()>> {
        let at = self.0;
        async move {
            tokio::time::sleep_until(at).await;
            Ok(())
        }
    }
}

/// Readiness polling itself fails.
struct Broken;

impl Readiness for Broken {
    async fn wait_ready(&self, _interest: Interest) -> io::Result<()> {
        Err(io::Error::other("poller gone"))
    }
}

fn paused_idler() -> Idler {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .expect("runtime");
    Idler::from_runtime(runtime)
}

#[test]
fn prop_earlier_event_wins() {
    proptest!(|(ready_ms in 0u64..500, deadline_ms in 0u64..500)| {
        let idler = paused_idler();
        let start = idler.now();
        let transport = ReadyAt(start + Duration::from_millis(ready_ms));
        let request = WaitRequest::new(IdleReason::WantRead)
            .with_deadline(start + Duration::from_millis(deadline_ms));

        let outcome = idler.wait(&transport, request);
        let expected = if ready_ms < deadline_ms {
            IdleOutcome::TransportReady
        } else {
            IdleOutcome::DeadlineElapsed
        };
        prop_assert!(matches!(outcome, Ok(o) if o == expected));
        prop_assert_eq!(idler.now() - start, Duration::from_millis(ready_ms.min(deadline_ms)));
    });
}

#[test]
fn timer_final_deadline_bounds_the_wait() {
    let idler = paused_idler();
    let start = idler.now();
    let mut timer = DelayTimer::new();
    timer.set(start, Duration::from_millis(250), Duration::from_millis(1000));

    let transport = ReadyAt(start + Duration::from_secs(5));
    let outcome = idler.idle(&transport, Some(&timer), IdleReason::Either).expect("wait");

    assert_eq!(outcome, IdleOutcome::DeadlineElapsed);
    assert_eq!(idler.now() - start, Duration::from_millis(1000), "intermediate delay ignored");
}

#[test]
fn no_deadline_waits_for_readiness() {
    let idler = paused_idler();
    let start = idler.now();
    let transport = ReadyAt(start + Duration::from_secs(3600));

    let outcome = idler.idle(&transport, None, IdleReason::WantRead).expect("wait");

    assert_eq!(outcome, IdleOutcome::TransportReady);
    assert_eq!(idler.now() - start, Duration::from_secs(3600));
}

#[test]
fn cancelled_timer_waits_for_readiness() {
    let idler = paused_idler();
    let start = idler.now();
    let mut timer = DelayTimer::new();
    timer.set(start, Duration::from_millis(1), Duration::ZERO);

    let transport = ReadyAt(start + Duration::from_secs(10));
    let outcome = idler.idle(&transport, Some(&timer), IdleReason::WantWrite).expect("wait");
    assert_eq!(outcome, IdleOutcome::TransportReady);
}

#[test]
fn poll_failure_is_distinct_from_timeout() {
    let idler = paused_idler();
    let request =
        WaitRequest::new(IdleReason::WantRead).with_deadline(idler.now() + Duration::from_secs(1));

    let err = idler.wait(&Broken, request).expect_err("poll fails");
    assert!(matches!(err, tlsprobe_io::WaitError::Poll(_)));
}

#[test]
fn loopback_exchange_through_delayed_io() {
    let idler = Idler::new().expect("idler");
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let client = TcpStream::connect(listener.local_addr().expect("addr")).expect("connect");
    let (server, _) = listener.accept().expect("accept");

    let mut client = DelayedIo::new(idler.register_tcp(client).expect("register"));
    let mut server = DelayedIo::new(idler.register_tcp(server).expect("register"));

    let mut sent = 0;
    let payload = b"client hello";
    while sent < payload.len() {
        match client.send(&payload[sent..]) {
            Ok(n) => sent += n,
            Err(e) => {
                let reason = IdleReason::for_error(&e).expect("retryable");
                idler.idle(client.get_ref(), None, reason).expect("wait");
            },
        }
    }

    let mut timer = DelayTimer::new();
    timer.set(idler.now(), Duration::from_millis(500), Duration::from_secs(5));

    let mut buf = [0u8; 32];
    let mut received = Vec::new();
    while received.len() < payload.len() {
        match server.recv(&mut buf) {
            Ok(0) => panic!("unexpected close"),
            Ok(n) => received.extend_from_slice(&buf[..n]),
            Err(TransportError::WantRead) => {
                let outcome = idler.idle(&server, Some(&timer), IdleReason::WantRead).expect("wait");
                assert_eq!(outcome, IdleOutcome::TransportReady, "data should arrive before 5s");
            },
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(received, payload);
    assert!(server.faults().forced(tlsprobe_io::Direction::Read) >= 1);
}

#[test]
fn silent_datagram_peer_times_out() {
    let idler = Idler::new().expect("idler");
    let a = UdpSocket::bind("127.0.0.1:0").expect("bind");
    let b = UdpSocket::bind("127.0.0.1:0").expect("bind");
    a.connect(b.local_addr().expect("addr")).expect("connect");

    let a = idler.register_udp(a).expect("register");
    let mut timer = DelayTimer::new();
    timer.set(idler.now(), Duration::from_millis(10), Duration::from_millis(50));

    let outcome = idler.idle(&a, Some(&timer), IdleReason::WantRead).expect("wait");
    assert_eq!(outcome, IdleOutcome::DeadlineElapsed);
    drop(b);
}
