//! Fuzz target for the retry-forcing transport wrapper
//!
//! # Strategy
//!
//! - Script the inner transport with data, stalls, EOF and hard errors
//! - Interleave reads and writes of arbitrary sizes, including empty ones
//! - Inject pending socket errors and fault resets between calls
//!
//! # Invariants
//!
//! - An armed direction never reaches the inner transport
//! - An armed call returns exactly the direction's retry signal, unless a
//!   pending error is reported instead (and the direction stays armed)
//! - A delegated call re-arms the direction unless it would block
//! - Read and write state never leak into each other
//! - Bytes accepted by writes are exactly the bytes the inner transport saw

#![no_main]

use std::io;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tlsprobe_io::{DelayedIo, Direction, ScriptedTransport, Transport, TransportError};

#[derive(Debug, Clone, Arbitrary)]
enum IoOp {
    PushRead(Vec<u8>),
    PushReadStall,
    PushEof,
    PushReadReset,
    PushWriteLimit(u8),
    PushWriteStall,
    PushWriteError,
    SetPendingError,
    Recv { len: u8 },
    Send { data: Vec<u8> },
    Reset,
}

fuzz_target!(|ops: Vec<IoOp>| {
    let mut wrapped = DelayedIo::new(ScriptedTransport::new());
    let mut armed = [true, true];
    let mut pending_error = false;
    let mut accepted = Vec::new();

    for op in ops {
        match op {
            IoOp::PushRead(data) => wrapped.get_mut().push_read(&data),
            IoOp::PushReadStall => wrapped.get_mut().push_read_would_block(),
            IoOp::PushEof => wrapped.get_mut().push_eof(),
            IoOp::PushReadReset => wrapped.get_mut().push_read_error(io::ErrorKind::ConnectionReset),
            IoOp::PushWriteLimit(limit) => wrapped.get_mut().push_write_limit(limit as usize),
            IoOp::PushWriteStall => wrapped.get_mut().push_write_would_block(),
            IoOp::PushWriteError => wrapped.get_mut().push_write_error(io::ErrorKind::BrokenPipe),
            IoOp::SetPendingError => {
                wrapped.get_mut().set_pending_error(io::ErrorKind::ConnectionAborted);
                pending_error = true;
            }
            IoOp::Reset => {
                wrapped.reset_faults();
                armed = [true, true];
            }

            IoOp::Recv { len } => {
                let was_armed = armed[0];
                let calls_before = wrapped.get_ref().recv_calls();
                let mut buf = vec![0xA5u8; len as usize];
                let result = wrapped.recv(&mut buf);
                check(Direction::Read, &result, &mut armed, &mut pending_error);

                if was_armed {
                    assert_eq!(wrapped.get_ref().recv_calls(), calls_before, "armed read reached inner");
                    assert!(buf.iter().all(|&b| b == 0xA5), "armed read touched the buffer");
                }
            }

            IoOp::Send { data } => {
                let was_armed = armed[1];
                let calls_before = wrapped.get_ref().send_calls();
                let result = wrapped.send(&data);
                check(Direction::Write, &result, &mut armed, &mut pending_error);

                if was_armed {
                    assert_eq!(wrapped.get_ref().send_calls(), calls_before, "armed write reached inner");
                }
                if let Ok(n) = result {
                    assert!(n <= data.len());
                    accepted.extend_from_slice(&data[..n]);
                }
                assert_eq!(wrapped.get_ref().written(), &accepted[..]);
            }
        }

        assert_eq!(wrapped.faults().is_armed(Direction::Read), armed[0]);
        assert_eq!(wrapped.faults().is_armed(Direction::Write), armed[1]);
    }
});

/// Advance the model for one call and check the wrapper agreed with it.
fn check(
    direction: Direction,
    result: &Result<usize, TransportError>,
    armed: &mut [bool; 2],
    pending_error: &mut bool,
) {
    let slot = match direction {
        Direction::Read => 0,
        Direction::Write => 1,
    };

    if armed[slot] {
        if std::mem::take(pending_error) {
            assert!(matches!(result, Err(e) if !e.is_would_block()), "pending error masked");
            return;
        }
        let expected_retry = matches!(
            (direction, result),
            (Direction::Read, Err(TransportError::WantRead))
                | (Direction::Write, Err(TransportError::WantWrite))
        );
        assert!(expected_retry, "armed {direction:?} call was not forced: {result:?}");
        armed[slot] = false;
        return;
    }

    let would_block = matches!(result, Err(e) if e.is_would_block());
    if !would_block {
        armed[slot] = true;
    }
}
