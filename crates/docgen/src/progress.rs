use serde::Serialize;

/// Position within a batch, reported once per node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    pub message: String,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.current as f64 / self.total as f64
        }
    }
}

pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, progress: &Progress);
}

/// Observer that ignores every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressObserver for SilentProgress {
    fn on_progress(&self, _progress: &Progress) {}
}

impl<F> ProgressObserver for F
where
    F: Fn(&Progress) + Send + Sync,
{
    fn on_progress(&self, progress: &Progress) {
        self(progress)
    }
}
