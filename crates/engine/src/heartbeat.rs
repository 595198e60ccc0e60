//! Keep-alive monitor for the coordinator connection.
//!
//! While a job streams data the coordinator connection can sit idle for a
//! long time. The monitor thread sends a heartbeat signal on it at a fixed
//! interval. Signals are whole packets written under the connection's lock,
//! so they never split an application frame.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use protocol::packet::{Signal, send_signal};

/// How long [`HeartbeatMonitor::start`] waits for the thread to come up.
pub const START_WAIT: Duration = Duration::from_millis(10);

/// How long [`HeartbeatMonitor::stop`] waits for the thread to exit.
pub const STOP_WAIT: Duration = Duration::from_millis(100);

/// A writer shared between the job and the heartbeat thread.
///
/// Every `write` call holds the lock for its duration, so callers should
/// write a complete packet per call.
#[derive(Debug)]
pub struct SharedWriter<W> {
    inner: Arc<Mutex<W>>,
}

impl<W> Clone for SharedWriter<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W> SharedWriter<W> {
    /// Wraps `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    /// Returns the shared handle.
    pub fn handle(&self) -> Arc<Mutex<W>> {
        Arc::clone(&self.inner)
    }

    /// Runs `f` with the writer locked.
    pub fn with<T>(&self, f: impl FnOnce(&mut W) -> T) -> T {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl<W: Write> Write for SharedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with(|writer| {
            writer.write_all(buf)?;
            Ok(buf.len())
        })
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with(Write::flush)
    }
}

/// Handle to a running heartbeat thread.
#[derive(Debug)]
pub struct HeartbeatMonitor {
    stop: Option<Sender<()>>,
    stopped: Receiver<()>,
    handle: Option<JoinHandle<()>>,
    beats: Arc<AtomicU64>,
}

impl HeartbeatMonitor {
    /// Spawns the monitor, sending a heartbeat on `connection` every
    /// `interval`.
    ///
    /// Waits up to [`START_WAIT`] for the thread to report that it runs; a
    /// slow start is not an error.
    pub fn start<W>(
        connection: SharedWriter<W>,
        interval: Duration,
        last_fname: Arc<Mutex<String>>,
    ) -> io::Result<Self>
    where
        W: Write + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let (started_tx, started_rx) = bounded::<()>(1);
        let (stopped_tx, stopped_rx) = bounded::<()>(1);
        let beats = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&beats);

        let handle = thread::Builder::new()
            .name("heartbeat".to_owned())
            .spawn(move || {
                let _ = started_tx.send(());
                run(&connection, interval, &stop_rx, &counter, &last_fname);
                let _ = stopped_tx.send(());
            })?;

        if started_rx.recv_timeout(START_WAIT).is_err() {
            logging::trace_heartbeat!(debug, "monitor did not confirm start in time");
        }

        Ok(Self {
            stop: Some(stop_tx),
            stopped: stopped_rx,
            handle: Some(handle),
            beats,
        })
    }

    /// Number of heartbeats sent so far.
    pub fn beats(&self) -> u64 {
        self.beats.load(Ordering::Relaxed)
    }

    /// Stops the thread, waiting up to [`STOP_WAIT`] for it to exit.
    ///
    /// Returns `true` when the thread confirmed the stop in time. A thread
    /// that does not is detached.
    pub fn stop(&mut self) -> bool {
        let Some(stop) = self.stop.take() else {
            return true;
        };
        let _ = stop.send(());
        drop(stop);

        let confirmed = self.stopped.recv_timeout(STOP_WAIT).is_ok();
        if let Some(handle) = self.handle.take() {
            if confirmed {
                let _ = handle.join();
            } else {
                logging::trace_heartbeat!(warn, "monitor did not stop in time; detaching");
            }
        }
        confirmed
    }
}

impl Drop for HeartbeatMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<W: Write>(
    connection: &SharedWriter<W>,
    interval: Duration,
    stop: &Receiver<()>,
    beats: &AtomicU64,
    last_fname: &Mutex<String>,
) {
    loop {
        match stop.recv_timeout(interval) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
            Err(RecvTimeoutError::Timeout) => {}
        }
        let sent = connection.with(|writer| {
            send_signal(writer, Signal::Heartbeat)?;
            writer.flush()
        });
        match sent {
            Ok(()) => {
                beats.fetch_add(1, Ordering::Relaxed);
                let current = last_fname
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone();
                logging::trace_heartbeat!(trace, file = %current, "heartbeat sent");
            }
            Err(error) => {
                logging::trace_heartbeat!(warn, %error, "heartbeat send failed; monitor exits");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use protocol::packet::{PacketKind, PacketReader};

    use super::*;

    #[test]
    fn sends_heartbeat_signals_until_stopped() {
        let connection = SharedWriter::new(Vec::new());
        let mut monitor = HeartbeatMonitor::start(
            connection.clone(),
            Duration::from_millis(5),
            Arc::new(Mutex::new("/var/log/messages".to_owned())),
        )
        .expect("spawn");
        thread::sleep(Duration::from_millis(80));
        assert!(monitor.stop());
        let beats = monitor.beats();
        assert!(beats >= 1, "expected at least one heartbeat, got {beats}");

        let wire = connection.with(|buffer| buffer.clone());
        let mut reader = PacketReader::new(wire.as_slice());
        let mut seen = 0;
        while let Some(kind) = reader.recv().expect("recv") {
            assert_eq!(kind, PacketKind::Signal(Signal::Heartbeat));
            seen += 1;
        }
        assert_eq!(seen, beats);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut monitor = HeartbeatMonitor::start(
            SharedWriter::new(io::sink()),
            Duration::from_secs(60),
            Arc::new(Mutex::new(String::new())),
        )
        .expect("spawn");
        assert!(monitor.stop());
        assert!(monitor.stop());
        assert_eq!(monitor.beats(), 0);
    }

    #[test]
    fn shared_writer_interleaves_whole_writes() {
        let mut writer = SharedWriter::new(Vec::new());
        let mut other = writer.clone();
        writer.write_all(b"abc").expect("write");
        other.write_all(b"def").expect("write");
        assert_eq!(writer.with(|buffer| buffer.clone()), b"abcdef");
    }
}
