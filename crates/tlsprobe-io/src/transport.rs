//! Byte-stream transport abstraction.
//!
//! Protocol engines call [`Transport::recv`] and [`Transport::send`] and
//! expect either a byte count or one of the "operation incomplete" signals.
//! `Ok(0)` from `recv` is an orderly close.
//!
//! Implementations are provided for blocking `std` sockets and for tokio
//! sockets used in event-driven mode. `WouldBlock` and `Interrupted` map to
//! [`TransportError::WantRead`] / [`TransportError::WantWrite`];
//! `ConnectionReset` and `BrokenPipe` map to
//! [`TransportError::ConnectionReset`].

use std::io::{self, Read, Write};

use thiserror::Error;

/// Transfer direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Receiving from the peer
    Read,
    /// Sending to the peer
    Write,
}

impl Direction {
    /// The "retry later" signal for this direction.
    pub fn would_block(self) -> TransportError {
        match self {
            Self::Read => TransportError::WantRead,
            Self::Write => TransportError::WantWrite,
        }
    }
}

/// Outcomes other than a completed transfer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No data available yet; retry once the transport is readable
    #[error("operation incomplete: want read")]
    WantRead,

    /// No buffer space yet; retry once the transport is writable
    #[error("operation incomplete: want write")]
    WantWrite,

    /// Peer reset the connection
    #[error("connection reset by peer")]
    ConnectionReset,

    /// Any other I/O failure
    #[error("transport error: {0}")]
    Io(#[source] io::Error),
}

impl TransportError {
    /// Classify an I/O error for the given direction.
    pub fn from_io(err: io::Error, direction: Direction) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => direction.would_block(),
            io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe => Self::ConnectionReset,
            _ => Self::Io(err),
        }
    }

    /// Classify a pending socket error (`SO_ERROR`).
    ///
    /// A pending error is never a retry signal, whichever direction
    /// surfaced it.
    pub fn from_pending(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe => Self::ConnectionReset,
            _ => Self::Io(err),
        }
    }

    /// Returns true for the "retry later" signals.
    ///
    /// These are control flow for the protocol engine's retry loop, not
    /// failures.
    pub fn is_would_block(&self) -> bool {
        matches!(self, Self::WantRead | Self::WantWrite)
    }
}

/// Read/write callbacks consumed by a protocol engine's I/O layer.
pub trait Transport {
    /// Receive up to `buf.len()` bytes. `Ok(0)` signals end of stream.
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Send up to `buf.len()` bytes, returning how many were accepted.
    fn send(&mut self, buf: &[u8]) -> Result<usize, TransportError>;

    /// Surface a pending asynchronous error (e.g. `SO_ERROR`) without
    /// transferring data.
    fn take_error(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        (**self).recv(buf)
    }

    fn send(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        (**self).send(buf)
    }

    fn take_error(&mut self) -> Result<(), TransportError> {
        (**self).take_error()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        (**self).recv(buf)
    }

    fn send(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        (**self).send(buf)
    }

    fn take_error(&mut self) -> Result<(), TransportError> {
        (**self).take_error()
    }
}

fn map_transfer(result: io::Result<usize>, direction: Direction) -> Result<usize, TransportError> {
    result.map_err(|e| TransportError::from_io(e, direction))
}

fn map_pending(pending: io::Result<Option<io::Error>>) -> Result<(), TransportError> {
    match pending {
        Ok(None) => Ok(()),
        Ok(Some(err)) | Err(err) => Err(TransportError::from_pending(err)),
    }
}

impl Transport for std::net::TcpStream {
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        map_transfer(Read::read(self, buf), Direction::Read)
    }

    fn send(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        map_transfer(Write::write(self, buf), Direction::Write)
    }

    fn take_error(&mut self) -> Result<(), TransportError> {
        map_pending(std::net::TcpStream::take_error(self))
    }
}

/// Connected datagram socket. Each call moves one datagram.
impl Transport for std::net::UdpSocket {
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        map_transfer(std::net::UdpSocket::recv(self, buf), Direction::Read)
    }

    fn send(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        map_transfer(std::net::UdpSocket::send(self, buf), Direction::Write)
    }

    fn take_error(&mut self) -> Result<(), TransportError> {
        map_pending(std::net::UdpSocket::take_error(self))
    }
}

impl Transport for tokio::net::TcpStream {
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        map_transfer(self.try_read(buf), Direction::Read)
    }

    fn send(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        map_transfer(self.try_write(buf), Direction::Write)
    }

    fn take_error(&mut self) -> Result<(), TransportError> {
        map_pending(tokio::net::TcpStream::take_error(self))
    }
}

/// Connected datagram socket. Each call moves one datagram.
impl Transport for tokio::net::UdpSocket {
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        map_transfer(self.try_recv(buf), Direction::Read)
    }

    fn send(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        map_transfer(self.try_send(buf), Direction::Write)
    }

    fn take_error(&mut self) -> Result<(), TransportError> {
        map_pending(tokio::net::UdpSocket::take_error(self))
    }
}
