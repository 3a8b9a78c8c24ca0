//! Deterministic in-memory transport for tests.
//!
//! Reads are served from a queue of scripted steps. Writes are accepted into
//! a capture buffer unless a scripted write step says otherwise. An empty
//! read queue reports "would block", never end of stream; push an explicit
//! [`ScriptedTransport::push_eof`] for that.

use std::{collections::VecDeque, future::Future, io};

use tokio::io::Interest;

use crate::{
    idle::Readiness,
    transport::{Direction, Transport, TransportError},
};

#[derive(Debug)]
enum Step {
    Data(Vec<u8>),
    WouldBlock,
    Eof,
    Error(io::ErrorKind),
}

#[derive(Debug)]
enum WriteStep {
    Accept(usize),
    WouldBlock,
    Error(io::ErrorKind),
}

/// Scripted transport double.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    reads: VecDeque<Step>,
    writes: VecDeque<WriteStep>,
    written: Vec<u8>,
    pending_error: Option<io::ErrorKind>,
    recv_calls: usize,
    send_calls: usize,
}

impl ScriptedTransport {
    /// Empty script: reads block, writes are accepted in full.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the next read. Larger than the caller's buffer means
    /// the remainder is served by later reads.
    pub fn push_read(&mut self, data: &[u8]) {
        self.reads.push_back(Step::Data(data.to_vec()));
    }

    /// Queue one "would block" read outcome.
    pub fn push_read_would_block(&mut self) {
        self.reads.push_back(Step::WouldBlock);
    }

    /// Queue an orderly close.
    pub fn push_eof(&mut self) {
        self.reads.push_back(Step::Eof);
    }

    /// Queue a read failure.
    pub fn push_read_error(&mut self, kind: io::ErrorKind) {
        self.reads.push_back(Step::Error(kind));
    }

    /// Accept at most `limit` bytes on the next write.
    pub fn push_write_limit(&mut self, limit: usize) {
        self.writes.push_back(WriteStep::Accept(limit));
    }

    /// Queue one "would block" write outcome.
    pub fn push_write_would_block(&mut self) {
        self.writes.push_back(WriteStep::WouldBlock);
    }

    /// Queue a write failure.
    pub fn push_write_error(&mut self, kind: io::ErrorKind) {
        self.writes.push_back(WriteStep::Error(kind));
    }

    /// Report `kind` from the next [`Transport::take_error`].
    pub fn set_pending_error(&mut self, kind: io::ErrorKind) {
        self.pending_error = Some(kind);
    }

    /// Everything accepted by `send` so far.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Number of `recv` calls that reached this transport.
    pub fn recv_calls(&self) -> usize {
        self.recv_calls
    }

    /// Number of `send` calls that reached this transport.
    pub fn send_calls(&self) -> usize {
        self.send_calls
    }

    /// Whether scripted read steps remain.
    pub fn has_pending_reads(&self) -> bool {
        !self.reads.is_empty()
    }
}

impl Transport for ScriptedTransport {
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        self.recv_calls += 1;
        match self.reads.pop_front() {
            None | Some(Step::WouldBlock) => Err(TransportError::WantRead),
            Some(Step::Eof) => Ok(0),
            Some(Step::Error(kind)) => {
                Err(TransportError::from_io(io::Error::from(kind), Direction::Read))
            },
            Some(Step::Data(mut data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    self.reads.push_front(Step::Data(data.split_off(n)));
                }
                Ok(n)
            },
        }
    }

    fn send(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        self.send_calls += 1;
        let limit = match self.writes.pop_front() {
            None => buf.len(),
            Some(WriteStep::Accept(limit)) => limit.min(buf.len()),
            Some(WriteStep::WouldBlock) => return Err(TransportError::WantWrite),
            Some(WriteStep::Error(kind)) => {
                return Err(TransportError::from_io(io::Error::from(kind), Direction::Write));
            },
        };
        self.written.extend_from_slice(&buf[..limit]);
        Ok(limit)
    }

    fn take_error(&mut self) -> Result<(), TransportError> {
        match self.pending_error.take() {
            None => Ok(()),
            Some(kind) => Err(TransportError::from_pending(io::Error::from(kind))),
        }
    }
}

/// Readable while read steps remain; always writable. A wait that can never
/// be satisfied stays pending until its deadline.
impl Readiness for ScriptedTransport {
    fn wait_ready(&self, interest: Interest) -> impl Future<Output = io::Result<()>> {
        let ready = interest.is_writable() || (interest.is_readable() && self.has_pending_reads());
        async move {
            if !ready {
                std::future::pending::<()>().await;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_script_blocks_rather_than_closing() {
        let mut t = ScriptedTransport::new();
        let mut buf = [0u8; 4];
        assert!(matches!(t.recv(&mut buf), Err(TransportError::WantRead)));
        assert_eq!(t.recv_calls(), 1);
    }

    #[test]
    fn oversized_data_is_served_across_reads() {
        let mut t = ScriptedTransport::new();
        t.push_read(b"abcdef");

        let mut buf = [0u8; 4];
        assert_eq!(t.recv(&mut buf).expect("first"), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(t.recv(&mut buf).expect("second"), 2);
        assert_eq!(&buf[..2], b"ef");
        assert!(!t.has_pending_reads());
    }

    #[test]
    fn write_limits_and_failures() {
        let mut t = ScriptedTransport::new();
        t.push_write_limit(2);
        t.push_write_would_block();
        t.push_write_error(io::ErrorKind::ConnectionReset);

        assert_eq!(t.send(b"hello").expect("short"), 2);
        assert!(matches!(t.send(b"llo"), Err(TransportError::WantWrite)));
        assert!(matches!(t.send(b"llo"), Err(TransportError::ConnectionReset)));
        assert_eq!(t.send(b"llo").expect("unscripted"), 3);
        assert_eq!(t.written(), b"hello");
    }

    #[test]
    fn pending_error_is_reported_once() {
        let mut t = ScriptedTransport::new();
        t.set_pending_error(io::ErrorKind::PermissionDenied);
        assert!(matches!(t.take_error(), Err(TransportError::Io(_))));
        assert!(t.take_error().is_ok());
    }
}
