//! Sticky hand tracking: roles lock to a handedness label, not an index.

use serde::{Deserialize, Serialize};

use crate::landmarks::{FrameResult, Handedness};

/// A role and the label it wants. `Unknown` accepts any hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSpec {
    pub name: String,
    pub target: Handedness,
}

impl RoleSpec {
    pub fn new(name: impl Into<String>, target: Handedness) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }

    fn accepts(&self, label: Handedness) -> bool {
        self.target == Handedness::Unknown || self.target == label
    }
}

/// Persisted role -> label lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBinding {
    pub role: String,
    pub locked: Option<Handedness>,
}

/// Where a role landed this tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleResolution {
    pub role: String,
    pub locked: Option<Handedness>,
    /// Index into this tick's `FrameResult::hands`.
    pub hand_index: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct HandResolver {
    specs: Vec<RoleSpec>,
    locks: Vec<Option<Handedness>>,
    /// Hands below this handedness score never start a lock.
    min_score: f32,
}

impl HandResolver {
    pub fn new(specs: Vec<RoleSpec>, min_score: f32) -> Self {
        let locks = vec![None; specs.len()];
        Self {
            specs,
            locks,
            min_score,
        }
    }

    pub fn bindings(&self) -> Vec<RoleBinding> {
        self.specs
            .iter()
            .zip(&self.locks)
            .map(|(spec, lock)| RoleBinding {
                role: spec.name.clone(),
                locked: *lock,
            })
            .collect()
    }

    pub fn binding(&self, role: &str) -> Option<Handedness> {
        self.specs
            .iter()
            .position(|s| s.name == role)
            .and_then(|i| self.locks[i])
    }

    pub fn roles(&self) -> &[RoleSpec] {
        &self.specs
    }

    /// Resolve every role against this tick's frame.
    ///
    /// Existing locks are served first so a newly locking role can never
    /// steal a hand from an established one. No hand is handed to two roles
    /// in the same tick; with duplicate labels the first unclaimed hand wins.
    pub fn resolve(&mut self, frame: &FrameResult) -> Vec<RoleResolution> {
        if frame.is_empty() {
            if self.locks.iter().any(Option::is_some) {
                log::debug!("all hands lost, clearing role bindings");
            }
            self.clear();
            return self.resolutions(&vec![None; self.specs.len()]);
        }

        let mut claimed = vec![false; frame.hands.len()];
        let mut assigned: Vec<Option<usize>> = vec![None; self.specs.len()];

        for (role, lock) in self.locks.iter().enumerate() {
            let Some(label) = lock else { continue };
            let found = frame
                .hands
                .iter()
                .enumerate()
                .position(|(i, h)| !claimed[i] && h.handedness == *label);
            if let Some(i) = found {
                claimed[i] = true;
                assigned[role] = Some(i);
            }
        }

        for role in 0..self.specs.len() {
            if self.locks[role].is_some() {
                continue;
            }
            let spec = &self.specs[role];
            let found = frame.hands.iter().enumerate().position(|(i, h)| {
                !claimed[i] && h.score >= self.min_score && spec.accepts(h.handedness)
            });
            if let Some(i) = found {
                let label = frame.hands[i].handedness;
                log::debug!("role '{}' locked to {} hand", spec.name, label.as_str());
                self.locks[role] = Some(label);
                claimed[i] = true;
                assigned[role] = Some(i);
            }
        }

        self.resolutions(&assigned)
    }

    pub fn clear(&mut self) {
        self.locks.iter_mut().for_each(|l| *l = None);
    }

    fn resolutions(&self, assigned: &[Option<usize>]) -> Vec<RoleResolution> {
        self.specs
            .iter()
            .zip(&self.locks)
            .zip(assigned)
            .map(|((spec, lock), index)| RoleResolution {
                role: spec.name.clone(),
                locked: *lock,
                hand_index: *index,
            })
            .collect()
    }
}
