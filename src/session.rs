use serde::{Deserialize, Serialize};

use crate::classifier::{Gesture, GestureClassifier, GestureState, TenFingerPolicy};
use crate::config::CoreConfig;
use crate::landmarks::{FrameResult, Handedness};
use crate::resolver::{HandResolver, RoleBinding, RoleResolution, RoleSpec};
use crate::smoother::{Point2, SmootherBank};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandReport {
    pub handedness: Handedness,
    pub state: GestureState,
    pub gesture: Gesture,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorReport {
    pub role: String,
    pub point: Point2,
}

/// A value accepted by a hold-to-confirm this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Confirmation {
    /// The ready-check start gesture.
    Start,
    /// A held finger count.
    Count(u8),
    Clear,
    Submit,
}

/// What the core hands downstream once per tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: u64,
    pub hands: Vec<HandReport>,
    pub roles: Vec<RoleResolution>,
    pub cursors: Vec<CursorReport>,
    pub total_raised: u8,
    pub ten_fingers: bool,
    pub confirmed: Option<Confirmation>,
}

impl TickReport {
    pub fn hand_for_role(&self, role: &str) -> Option<&HandReport> {
        self.roles
            .iter()
            .find(|r| r.role == role)
            .and_then(|r| r.hand_index)
            .and_then(|i| self.hands.get(i))
    }

    pub fn gesture_for_role(&self, role: &str) -> Gesture {
        self.hand_for_role(role)
            .map_or(Gesture::None, |h| h.gesture)
    }

    pub fn cursor(&self, role: &str) -> Option<Point2> {
        self.cursors.iter().find(|c| c.role == role).map(|c| c.point)
    }

    pub fn has_hands(&self) -> bool {
        !self.hands.is_empty()
    }
}

pub struct GestureSession {
    classifier: GestureClassifier,
    resolver: HandResolver,
    cursors: SmootherBank,
    ten_fingers: TenFingerPolicy,
    max_hands: usize,
    tick: u64,
}

impl GestureSession {
    pub fn new(config: &CoreConfig, roles: Vec<RoleSpec>) -> Self {
        Self {
            classifier: GestureClassifier::new(config.classifier.clone()),
            resolver: HandResolver::new(roles, config.tracking.min_detection_confidence),
            cursors: SmootherBank::new(config.smoother),
            ten_fingers: config.game.ten_fingers,
            max_hands: config.tracking.max_hands,
            tick: 0,
        }
    }

    pub fn bindings(&self) -> Vec<RoleBinding> {
        self.resolver.bindings()
    }

    /// Run one tick. Cursors follow each resolved role's action point; a
    /// role that loses its hand has its cursor re-seeded on return so the
    /// stroke does not streak across the gap.
    pub fn process(&mut self, frame: &FrameResult) -> TickReport {
        self.tick += 1;

        let mut frame = frame.clone();
        frame.truncate(self.max_hands);

        let gestures = self.classifier.classify_frame(&frame);
        let ten_fingers = gestures.is_ten_fingers(self.ten_fingers);
        let roles = self.resolver.resolve(&frame);

        let hands: Vec<HandReport> = gestures
            .hands
            .into_iter()
            .map(|(handedness, state)| HandReport {
                handedness,
                gesture: state.gesture(),
                state,
            })
            .collect();

        let mut cursors = Vec::new();
        for resolution in &roles {
            let point = resolution
                .hand_index
                .and_then(|i| hands[i].state.action_point);
            match point {
                Some(p) => {
                    let smoothed = self.cursors.update(&resolution.role, Point2::new(p.x, p.y));
                    cursors.push(CursorReport {
                        role: resolution.role.clone(),
                        point: smoothed,
                    });
                }
                None => self.cursors.reset_lane(&resolution.role),
            }
        }

        TickReport {
            tick: self.tick,
            total_raised: gestures.total_raised,
            ten_fingers,
            hands,
            roles,
            cursors,
            confirmed: None,
        }
    }

    pub fn reset(&mut self) {
        self.resolver.clear();
        self.cursors.reset();
        self.tick = 0;
    }
}
