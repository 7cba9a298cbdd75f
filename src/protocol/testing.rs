//! In-memory connections for tests.
use std::{
    cell::RefCell,
    io::{self, Cursor, Read, Write},
    sync::{
        Arc, Mutex, Once,
        atomic::{AtomicUsize, Ordering},
    },
};

use log::{LevelFilter, Log, Metadata, Record};

use super::Connection;

thread_local! {
    static CAPTURED: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

/// Records log lines emitted on the thread that is currently capturing.
struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        CAPTURED.with(|captured| {
            if let Some(lines) = captured.borrow_mut().as_mut() {
                lines.push(record.args().to_string());
            }
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static INIT: Once = Once::new();

/// Run `f` and return every log line it emitted on the current thread, in order.
pub(crate) fn capture_logs(f: impl FnOnce()) -> Vec<String> {
    INIT.call_once(|| {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(LevelFilter::Trace);
    });

    CAPTURED.with(|captured| *captured.borrow_mut() = Some(Vec::new()));
    f();
    CAPTURED
        .with(|captured| captured.borrow_mut().take())
        .unwrap_or_default()
}

/// Shared view on every [`MockConnection`] created from it.
#[derive(Clone, Default)]
pub(crate) struct Wire {
    state: Arc<WireState>,
}

#[derive(Default)]
struct WireState {
    written: Mutex<Vec<u8>>,
    closed: AtomicUsize,
    live: AtomicUsize,
}

impl Wire {
    pub(crate) fn connection(&self, input: impl Into<Vec<u8>>) -> MockConnection {
        self.state.live.fetch_add(1, Ordering::SeqCst);
        MockConnection {
            input: Cursor::new(input.into()),
            wire: self.clone(),
        }
    }

    pub(crate) fn written(&self) -> Vec<u8> {
        self.state.written.lock().unwrap().clone()
    }

    pub(crate) fn closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Connections created but not yet dropped.
    pub(crate) fn live(&self) -> usize {
        self.state.live.load(Ordering::SeqCst)
    }
}

pub(crate) struct MockConnection {
    input: Cursor<Vec<u8>>,
    wire: Wire,
}

impl Read for MockConnection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for MockConnection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.wire.state.written.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Connection for MockConnection {
    fn close(self) -> io::Result<()> {
        self.wire.state.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn peer(&self) -> String {
        String::from("mock")
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.wire.state.live.fetch_sub(1, Ordering::SeqCst);
    }
}
