use log::{debug, info, warn};

use crate::service::{ServiceRegistry, dispatch};

use super::{Connection, ProtocolTransport, Response, transport::TransportError};

/// How processing of a single connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionOutcome {
    /// The request could not be read; nothing was written back.
    Abandoned,
    /// A response with this status was written.
    Responded(u16),
}

/// Serve one request on `conn` and close it.
///
/// The connection is closed on every path. Read and parse failures abandon the connection
/// without a response; a failed write is returned after the connection has been closed.
pub fn handle_connection<C: Connection>(
    conn: C,
    registry: &ServiceRegistry,
) -> Result<ConnectionOutcome, TransportError> {
    let client = conn.peer();
    let mut transport = ProtocolTransport::new(conn);

    debug!("read_request_enter client: {client}");
    let request = match transport.read_request() {
        Ok(request) => request,
        Err(e) => {
            debug!("read_request_error client: {client}: {e}");
            close(transport.into_inner(), &client);
            return Ok(ConnectionOutcome::Abandoned);
        }
    };
    debug!("read_request_return client: {client}");

    let mut response = Response::new();
    dispatch(registry, &request, &mut response);

    let status = response.status();
    debug!("write_response {status} client: {client}");
    info!("RESPONSE {status} client: {client}");
    let written = transport.write_response(&response);

    close(transport.into_inner(), &client);
    written.map(|_| ConnectionOutcome::Responded(status))
}

fn close<C: Connection>(conn: C, client: &str) {
    if let Err(e) = conn.close() {
        warn!("failed to close connection to {client}: {e}");
    }
    debug!("close_connection client: {client}");
}
