//! Connection handling for the gunrock server.
//!
//! This module moves accepted connections from the listening socket to a fixed pool of worker
//! threads and turns each connection into exactly one HTTP exchange.
//!
//! # Overview
//!
//! A single accept loop ([`Server::serve`]) accepts clients and pushes them into a bounded
//! [`ConnectionQueue`]. When the queue is full the accept loop blocks, which holds back new
//! clients until a worker frees a slot. Each worker of the [`WorkerPool`] pops one connection,
//! handles it to completion and goes back to waiting.
//!
//! ```text
//! Listener ──accept──▶ ConnectionQueue ──pop──▶ Worker ──▶ handle_connection ──▶ dispatch
//! ```
//!
//! # Per-connection lifecycle
//!
//! [`handle_connection`] reads one request head, dispatches it through the
//! [`ServiceRegistry`](crate::service::ServiceRegistry), writes the response and closes the
//! connection. Clients whose request cannot be read are disconnected without a response. The
//! connection is closed on every path.
//!
//! # Key Components
//!
//! - [`Connection`] / [`Listener`]: transport capabilities, implemented for TCP.
//! - [`ConnectionQueue`]: bounded FIFO between the accept loop and the workers.
//! - [`ProtocolTransport`]: reads [`Request`] heads and writes [`Response`]s over a stream.
//! - [`ServerContext`]: queue and registry shared by the accept loop and the workers.
//!
//! # See Also
//!
//! - [`service`](crate::service): Routing of requests to services.
mod connection;
mod handler;
mod queue;
mod request;
mod response;
mod server;
mod thread;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

use thread::WorkerPool;

pub use connection::{Connection, Listener};
pub use handler::{ConnectionOutcome, handle_connection};
pub use queue::{ConnectionQueue, QueueClosed};
pub use request::{MAX_HEAD_BYTES, Method, Request, RequestError};
pub use response::Response;
pub use server::{Server, ServerContext, ServerError};
pub use transport::{ProtocolTransport, TransportError};
