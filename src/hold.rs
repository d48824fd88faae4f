//! Hold-to-confirm debounce. Any change of candidate throws progress away,
//! and a sustained hold confirms once until the candidate is released.

use serde::{Deserialize, Serialize};

/// Most a hold can be credited for the tick that starts it, whatever gap
/// came before that frame. About one frame at 30 fps.
pub const START_CREDIT_MS: f64 = 1000.0 / 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoldConfig {
    /// Answer / choice hold duration.
    pub required_ms: f64,
    /// Start-gesture hold duration in the ready check.
    pub ready_ms: f64,
}

impl Default for HoldConfig {
    fn default() -> Self {
        Self {
            required_ms: 3000.0,
            ready_ms: 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HoldPhase<T> {
    Idle,
    Holding { candidate: T, elapsed_ms: f64 },
    /// Fired for `candidate`; waiting for it to be released.
    Confirmed { candidate: T },
}

#[derive(Debug, Clone)]
pub struct HoldToConfirm<T> {
    phase: HoldPhase<T>,
    required_ms: f64,
}

impl<T: PartialEq + Clone> HoldToConfirm<T> {
    pub fn new(required_ms: f64) -> Self {
        Self {
            phase: HoldPhase::Idle,
            required_ms,
        }
    }

    pub fn phase(&self) -> &HoldPhase<T> {
        &self.phase
    }

    pub fn required_ms(&self) -> f64 {
        self.required_ms
    }

    /// Change the requirement, e.g. per game mode. Progress is kept.
    pub fn set_required(&mut self, required_ms: f64) {
        self.required_ms = required_ms;
    }

    pub fn elapsed_ms(&self) -> f64 {
        match &self.phase {
            HoldPhase::Holding { elapsed_ms, .. } => *elapsed_ms,
            _ => 0.0,
        }
    }

    pub fn candidate(&self) -> Option<&T> {
        match &self.phase {
            HoldPhase::Idle => None,
            HoldPhase::Holding { candidate, .. } | HoldPhase::Confirmed { candidate } => {
                Some(candidate)
            }
        }
    }

    /// Fraction of the requirement reached, for progress rings.
    pub fn progress(&self) -> f64 {
        if self.required_ms <= 0.0 {
            return 0.0;
        }
        (self.elapsed_ms() / self.required_ms).clamp(0.0, 1.0)
    }

    /// Feed this tick's candidate. Returns the value on the tick the
    /// requirement is first met.
    ///
    /// The tick that starts a hold counts as at most [`START_CREDIT_MS`] and
    /// never confirms by itself.
    pub fn observe(&mut self, observed: Option<T>, dt_ms: f64) -> Option<T> {
        let dt_ms = dt_ms.max(0.0);
        let Some(value) = observed else {
            self.phase = HoldPhase::Idle;
            return None;
        };

        let (candidate, elapsed_ms) = match std::mem::replace(&mut self.phase, HoldPhase::Idle) {
            HoldPhase::Confirmed { candidate } if candidate == value => {
                self.phase = HoldPhase::Confirmed { candidate };
                return None;
            }
            HoldPhase::Holding {
                candidate,
                elapsed_ms,
            } if candidate == value => (candidate, elapsed_ms + dt_ms),
            _ => {
                self.phase = HoldPhase::Holding {
                    candidate: value,
                    elapsed_ms: dt_ms.min(START_CREDIT_MS),
                };
                return None;
            }
        };

        if elapsed_ms >= self.required_ms {
            self.phase = HoldPhase::Confirmed {
                candidate: candidate.clone(),
            };
            Some(candidate)
        } else {
            self.phase = HoldPhase::Holding {
                candidate,
                elapsed_ms,
            };
            None
        }
    }

    pub fn reset(&mut self) {
        self.phase = HoldPhase::Idle;
    }
}
