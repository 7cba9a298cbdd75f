use std::{
    io,
    net::{SocketAddr, TcpListener},
    num::NonZeroUsize,
    sync::Arc,
};

use log::{debug, info, warn};
use thiserror::Error;

use crate::{cli::ServerOptions, service::ServiceRegistry};

use super::{Connection, ConnectionQueue, Listener, QueueClosed, WorkerPool};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind listener: {0}")]
    Bind(io::Error),
    #[error("failed to start worker pool: {0}")]
    Spawn(io::Error),
    #[error(transparent)]
    Queue(#[from] QueueClosed),
}

/// State shared between the accept loop and every worker.
pub struct ServerContext<C> {
    queue: ConnectionQueue<C>,
    registry: ServiceRegistry,
}

impl<C> ServerContext<C> {
    pub fn new(capacity: NonZeroUsize, registry: ServiceRegistry) -> Self {
        Self {
            queue: ConnectionQueue::new(capacity),
            registry,
        }
    }

    pub fn queue(&self) -> &ConnectionQueue<C> {
        &self.queue
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }
}

pub struct Server<L: Listener> {
    listener: L,
    threads: NonZeroUsize,
    context: Arc<ServerContext<L::Connection>>,
}

impl Server<TcpListener> {
    /// Bind on every interface at the configured port.
    pub fn bind(options: &ServerOptions, registry: ServiceRegistry) -> Result<Self, ServerError> {
        Self::bind_to(SocketAddr::from(([0, 0, 0, 0], options.port)), options, registry)
    }

    pub fn bind_to(
        address: SocketAddr,
        options: &ServerOptions,
        registry: ServiceRegistry,
    ) -> Result<Self, ServerError> {
        if !options.is_fifo() {
            warn!(
                "scheduling algorithm '{}' is not supported, falling back to FIFO",
                options.schedalg
            );
        }

        let listener = TcpListener::bind(address).map_err(ServerError::Bind)?;
        info!("listening at {}", listener.local_addr().map_err(ServerError::Bind)?);

        Ok(Self::new(listener, options.buffers, options.threads, registry))
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl<L: Listener> Server<L> {
    pub fn new(
        listener: L,
        capacity: NonZeroUsize,
        threads: NonZeroUsize,
        registry: ServiceRegistry,
    ) -> Self {
        Self {
            listener,
            threads,
            context: Arc::new(ServerContext::new(capacity, registry)),
        }
    }

    /// Start the worker pool and run the accept loop on the calling thread.
    ///
    /// Only returns on a fatal error. Accepting blocks while the connection queue is full.
    pub fn serve(self) -> Result<(), ServerError> {
        let pool = WorkerPool::spawn(self.threads, Arc::clone(&self.context))
            .map_err(ServerError::Spawn)?;
        info!(
            "serving {} services with {} workers, queue capacity {}",
            self.context.registry().len(),
            pool.size(),
            self.context.queue().capacity()
        );
        debug!(
            "workers: {}",
            pool.thread_names().collect::<Vec<_>>().join(", ")
        );

        loop {
            debug!("waiting_to_accept");
            match self.listener.accept() {
                Ok(conn) => {
                    debug!("client_accepted {}", conn.peer());
                    self.context.queue().push(conn)?;
                }
                Err(e) => warn!("broken connection: {e:?}"),
            }
        }
    }
}
