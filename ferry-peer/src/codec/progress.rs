use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

const MIB: f64 = 1024.0 * 1024.0;

/// Snapshot of a running transfer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Progress {
    pub transferred: u64,
    /// Declared size, `None` while streaming or before the metadata is known.
    pub total: Option<u64>,
    pub elapsed: Duration,
}

impl Progress {
    pub fn percent(&self) -> Option<f64> {
        let total = self.total?;
        if total == 0 {
            return Some(100.0);
        }
        Some(self.transferred as f64 / total as f64 * 100.0)
    }

    pub fn throughput_mib_s(&self) -> f64 {
        throughput(self.transferred, self.elapsed)
    }
}

fn throughput(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        bytes as f64 / secs / MIB
    } else {
        0.0
    }
}

/// Publishes [`Progress`] to any number of watchers.
pub struct ProgressReporter<'a> {
    tx: &'a watch::Sender<Progress>,
    started: Instant,
    total: Option<u64>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(tx: &'a watch::Sender<Progress>) -> Self {
        Self {
            tx,
            started: Instant::now(),
            total: None,
        }
    }

    /// Restarts the clock, e.g. once the payload starts flowing.
    pub fn start(&mut self, total: Option<u64>) {
        self.started = Instant::now();
        self.total = total;
        self.update(0);
    }

    pub fn update(&self, transferred: u64) {
        self.tx.send_replace(Progress {
            transferred,
            total: self.total,
            elapsed: self.started.elapsed(),
        });
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Outcome of a finished transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferSummary {
    pub file_name: String,
    pub bytes: u64,
    pub elapsed: Duration,
    /// Where the receiver stored the file. `None` on the sending side.
    pub path: Option<PathBuf>,
    /// Sending side only: whether the receiver confirmed.
    pub acknowledged: bool,
}

impl TransferSummary {
    pub fn throughput_mib_s(&self) -> f64 {
        throughput(self.bytes, self.elapsed)
    }
}
