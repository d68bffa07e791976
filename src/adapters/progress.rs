use crate::domain::ports::ProgressSink;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 以日誌回報進度 (不繪製進度條)
#[derive(Debug)]
pub struct LogProgress {
    label: String,
    every: usize,
    total: AtomicUsize,
    done: AtomicUsize,
}

impl LogProgress {
    pub fn new(label: impl Into<String>, every: usize) -> Self {
        Self {
            label: label.into(),
            every: every.max(1),
            total: AtomicUsize::new(0),
            done: AtomicUsize::new(0),
        }
    }

    pub fn done(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new("Enriching data", 50)
    }
}

impl ProgressSink for LogProgress {
    fn start(&self, total: usize) {
        self.total.store(total, Ordering::Relaxed);
        self.done.store(0, Ordering::Relaxed);
        tracing::info!("⏱️ {}: 0/{} entries", self.label, total);
    }

    fn advance(&self) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        let total = self.total.load(Ordering::Relaxed);
        if done % self.every == 0 && done != total {
            tracing::info!("⏱️ {}: {}/{} entries", self.label, done, total);
        }
    }

    fn finish(&self) {
        tracing::info!(
            "⏱️ {}: {}/{} entries done",
            self.label,
            self.done(),
            self.total.load(Ordering::Relaxed)
        );
    }
}

/// 不回報任何進度
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn advance(&self) {}
}
