use std::{io, num::NonZeroUsize, sync::Arc, thread};

use log::{debug, warn};

use super::{Connection, ServerContext, handler::handle_connection};

/// Fixed set of long-lived workers draining the connection queue.
///
/// Workers never exit; dropping the pool detaches them.
#[derive(Debug)]
pub struct WorkerPool {
    workers: Vec<Worker>,
}

impl WorkerPool {
    /// Start exactly `size` workers. Fails if any thread cannot be created.
    pub fn spawn<C>(size: NonZeroUsize, context: Arc<ServerContext<C>>) -> io::Result<Self>
    where
        C: Connection + 'static,
    {
        let mut workers = Vec::with_capacity(size.get());

        for i in 0..size.get() {
            workers.push(Worker::spawn(i, Arc::clone(&context))?);
        }

        Ok(Self { workers })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub fn thread_names(&self) -> impl Iterator<Item = &str> {
        self.workers.iter().filter_map(|w| w.thread.thread().name())
    }
}

#[derive(Debug)]
struct Worker {
    thread: thread::JoinHandle<()>,
}

impl Worker {
    fn spawn<C>(id: usize, context: Arc<ServerContext<C>>) -> io::Result<Self>
    where
        C: Connection + 'static,
    {
        let thread = thread::Builder::new()
            .name(format!("gunrock-worker-{id}"))
            .spawn(move || {
                loop {
                    let Some(conn) = context.queue().pop() else {
                        debug!("worker {id} disconnected!");
                        break;
                    };

                    debug!("worker {id} handling a connection!");
                    if let Err(e) = handle_connection(conn, context.registry()) {
                        warn!("worker {id} failed to answer connection: {e}");
                    }
                }
            })?;

        Ok(Self { thread })
    }
}
