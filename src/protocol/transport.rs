use std::io::{self, Read, Write};

use thiserror::Error;

use super::{Request, RequestError, Response};

const READ_CHUNK: usize = 1024;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to read request: {0}")]
    Request(#[from] RequestError),
    #[error("Transport IO Error: {0}")]
    Io(#[from] io::Error),
}

/// Reads request heads from and writes responses to a byte stream.
pub struct ProtocolTransport<T: Read + Write> {
    stream: T,
}

impl<T: Read + Write> ProtocolTransport<T> {
    pub fn new(stream: T) -> Self {
        Self { stream }
    }

    pub fn read_request(&mut self) -> Result<Request, TransportError> {
        let mut buf = Vec::with_capacity(READ_CHUNK);
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            let n = self.stream.read(&mut chunk)?;
            if n == 0 {
                return Err(RequestError::Incomplete.into());
            }
            buf.extend_from_slice(&chunk[..n]);

            if let Some(req) = Request::parse(&buf)? {
                return Ok(req);
            }
        }
    }

    pub fn write_response(&mut self, resp: &Response) -> Result<(), TransportError> {
        self.stream.write_all(&resp.to_bytes())?;
        self.stream.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> T {
        self.stream
    }
}
