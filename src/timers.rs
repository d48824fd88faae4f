use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerKind {
    Countdown,
    Feedback,
    /// Round time limit while waiting for or playing against content.
    Round,
}

#[derive(Debug, Clone, Default)]
pub struct TimerSet {
    pending: Vec<(TimerKind, f64)>,
}

impl TimerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, kind: TimerKind, now_ms: f64, duration_ms: f64) {
        self.cancel(kind);
        self.pending.push((kind, now_ms + duration_ms));
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        self.pending.retain(|(k, _)| *k != kind);
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.pending.iter().any(|(k, _)| *k == kind)
    }

    pub fn remaining_ms(&self, kind: TimerKind, now_ms: f64) -> Option<f64> {
        self.pending
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, deadline)| (deadline - now_ms).max(0.0))
    }

    /// Remove and return every timer whose deadline has passed, earliest
    /// first.
    pub fn poll(&mut self, now_ms: f64) -> Vec<TimerKind> {
        let mut expired: Vec<(TimerKind, f64)> = Vec::new();
        self.pending.retain(|&(kind, deadline)| {
            if deadline <= now_ms {
                expired.push((kind, deadline));
                false
            } else {
                true
            }
        });
        expired.sort_by(|a, b| a.1.total_cmp(&b.1));
        expired.into_iter().map(|(kind, _)| kind).collect()
    }
}
