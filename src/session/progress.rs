//! Progress side channel and cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc;

/// One progress tick: percent is monotonically non-decreasing within a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    pub percent: u8,
    pub message: String,
}

/// Receives progress ticks from a generation run.
///
/// Reports may arrive from worker threads during the image-acquisition
/// fan-out, hence `Sync`.
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: Progress);
}

/// Discards all progress.
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn report(&self, _progress: Progress) {}
}

/// Forwards progress into an mpsc channel, dropping ticks nobody listens to.
pub struct ChannelProgress {
    tx: std::sync::Mutex<mpsc::Sender<Progress>>,
}

impl ChannelProgress {
    pub fn new() -> (Self, mpsc::Receiver<Progress>) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                tx: std::sync::Mutex::new(tx),
            },
            rx,
        )
    }
}

impl ProgressSink for ChannelProgress {
    fn report(&self, progress: Progress) {
        if let Ok(tx) = self.tx.lock() {
            let _ = tx.send(progress);
        }
    }
}

/// Clamps reported percents to be non-decreasing before forwarding.
///
/// Parallel acquisition can complete out of order; the contract to the
/// outside is monotonic percent within one run.
pub(crate) struct MonotonicReporter<'a> {
    sink: &'a dyn ProgressSink,
    last: AtomicU8,
}

impl<'a> MonotonicReporter<'a> {
    pub(crate) fn new(sink: &'a dyn ProgressSink) -> Self {
        Self {
            sink,
            last: AtomicU8::new(0),
        }
    }

    pub(crate) fn report(&self, percent: u8, message: &str) {
        let clamped = self.last.fetch_max(percent.min(100), Ordering::SeqCst);
        let percent = clamped.max(percent.min(100));
        self.sink.report(Progress {
            percent,
            message: message.to_string(),
        });
    }

    pub(crate) fn last_percent(&self) -> u8 {
        self.last.load(Ordering::SeqCst)
    }
}

/// Cooperative cancellation token checked between frames.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_reporter_never_goes_backward() {
        let (sink, rx) = ChannelProgress::new();
        let reporter = MonotonicReporter::new(&sink);
        reporter.report(10, "a");
        reporter.report(5, "b");
        reporter.report(40, "c");
        drop(sink);
        let percents: Vec<u8> = rx.iter().map(|p| p.percent).collect();
        assert_eq!(percents, vec![10, 10, 40]);
    }

    #[test]
    fn monotonic_reporter_caps_at_100() {
        let (sink, rx) = ChannelProgress::new();
        let reporter = MonotonicReporter::new(&sink);
        reporter.report(250, "overflow");
        drop(sink);
        assert_eq!(rx.recv().unwrap().percent, 100);
    }

    #[test]
    fn cancel_token_flips_once() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
