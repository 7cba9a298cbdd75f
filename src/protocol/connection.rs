//! Transport capabilities consumed by the server.
//!
//! The dispatcher never touches sockets directly. It accepts through a [`Listener`] and talks to
//! clients through a [`Connection`], which keeps the queue, the worker pool and the handler
//! testable with in-memory streams.
use std::{
    io::{self, Read, Write},
    net::{Shutdown, TcpListener, TcpStream},
};

/// A bidirectional byte channel to one accepted client.
///
/// A connection is owned by exactly one component at a time and is destroyed through
/// [`Connection::close`], which consumes it.
pub trait Connection: Read + Write + Send {
    /// Close the channel and release it.
    fn close(self) -> io::Result<()>
    where
        Self: Sized;

    /// Human readable description of the client, used for diagnostics.
    fn peer(&self) -> String {
        String::from("unknown")
    }
}

/// A listening endpoint producing new connections.
pub trait Listener {
    type Connection: Connection + 'static;

    /// Block until a client connects.
    fn accept(&self) -> io::Result<Self::Connection>;
}

impl Connection for TcpStream {
    fn close(self) -> io::Result<()> {
        match self.shutdown(Shutdown::Both) {
            // The client may already have hung up.
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            res => res,
        }
    }

    fn peer(&self) -> String {
        self.peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| String::from("unknown"))
    }
}

impl Listener for TcpListener {
    type Connection = TcpStream;

    fn accept(&self) -> io::Result<TcpStream> {
        TcpListener::accept(self).map(|(stream, _)| stream)
    }
}
