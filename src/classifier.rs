//! Per-hand gesture classification. `Vertical` compares tip and PIP heights
//! and holds only for upright hands (within about 45 degrees); `Angle` is
//! rotation-invariant.

use serde::{Deserialize, Serialize};

use crate::landmarks::{
    FrameResult, Hand, Handedness, Landmark, FINGER_JOINTS, INDEX_MCP, INDEX_TIP, THUMB_IP,
    THUMB_MCP, THUMB_TIP,
};

// ── Config ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FingerStrategy {
    /// Extended iff tip.y < pip.y.
    #[default]
    Vertical,
    /// Extended iff the MCP-PIP-TIP interior angle exceeds `threshold_deg`.
    Angle { threshold_deg: f32 },
}

/// Joint the thumb tip is compared against under the vertical strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThumbReference {
    Mcp,
    #[default]
    Ip,
    IndexMcp,
}

impl ThumbReference {
    fn index(self) -> usize {
        match self {
            Self::Mcp => THUMB_MCP,
            Self::Ip => THUMB_IP,
            Self::IndexMcp => INDEX_MCP,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinchMetric {
    #[default]
    Planar,
    Spatial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub strategy: FingerStrategy,
    pub thumb_reference: ThumbReference,
    /// Thumb-tip to index-tip distance (normalized units) below which the
    /// hand is pinching.
    pub pinch_threshold: f32,
    pub pinch_metric: PinchMetric,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            strategy: FingerStrategy::Vertical,
            thumb_reference: ThumbReference::Ip,
            pinch_threshold: 0.05,
            pinch_metric: PinchMetric::Planar,
        }
    }
}

// ── Output ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    fn slot(self) -> usize {
        self as usize
    }
}

/// Per-hand, per-tick classification result. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GestureState {
    /// Thumb, index, middle, ring, pinky.
    pub extended: [bool; 5],
    pub raised_count: u8,
    pub is_pointing: bool,
    pub is_pinching: bool,
    /// Index fingertip; `None` for a malformed hand.
    pub action_point: Option<Landmark>,
    /// False when the hand was too malformed to classify.
    pub well_formed: bool,
}

impl GestureState {
    pub fn is_extended(&self, finger: Finger) -> bool {
        self.extended[finger.slot()]
    }

    pub fn gesture(&self) -> Gesture {
        Gesture::from(self)
    }
}

/// Discrete gesture vocabulary consumed by game rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "count", rename_all = "snake_case")]
pub enum Gesture {
    /// Nothing classifiable.
    None,
    Pinch,
    Point,
    OpenPalm,
    Fist,
    /// Any other raised-finger count.
    Fingers(u8),
}

impl From<&GestureState> for Gesture {
    fn from(state: &GestureState) -> Self {
        if !state.well_formed {
            return Gesture::None;
        }
        if state.is_pinching {
            Gesture::Pinch
        } else if state.is_pointing {
            Gesture::Point
        } else {
            match state.raised_count {
                5 => Gesture::OpenPalm,
                0 => Gesture::Fist,
                n => Gesture::Fingers(n),
            }
        }
    }
}

/// How many raised fingers across the frame count as the "ten fingers"
/// gesture. 10 is strict; 9 tolerates one occluded finger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TenFingerPolicy {
    pub min_total: u8,
}

impl Default for TenFingerPolicy {
    fn default() -> Self {
        Self { min_total: 10 }
    }
}

/// Classification of every hand in one frame, in frame order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameGestures {
    pub hands: Vec<(Handedness, GestureState)>,
    pub total_raised: u8,
}

impl FrameGestures {
    /// Requires two hands so a single hand can never satisfy it, whatever
    /// the policy.
    pub fn is_ten_fingers(&self, policy: TenFingerPolicy) -> bool {
        self.hands.len() >= 2 && self.total_raised >= policy.min_total.min(10)
    }
}

// ── Classifier ─────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct GestureClassifier {
    pub config: ClassifierConfig,
}

impl GestureClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Classify a single hand. Total: malformed input gives the neutral state.
    pub fn classify(&self, hand: &Hand) -> GestureState {
        if !hand.is_well_formed() {
            return GestureState::default();
        }
        let lm = &hand.landmarks;

        let mut extended = [false; 5];
        extended[Finger::Thumb.slot()] = self.thumb_extended(hand);
        for (slot, &(mcp, pip, tip)) in FINGER_JOINTS.iter().enumerate() {
            extended[slot + 1] = self.finger_extended(&lm[mcp], &lm[pip], &lm[tip]);
        }

        let raised_count = extended.iter().filter(|e| **e).count() as u8;
        let is_pointing = extended[Finger::Index.slot()]
            && !extended[Finger::Middle.slot()]
            && !extended[Finger::Ring.slot()]
            && !extended[Finger::Pinky.slot()];

        let pinch_distance = match self.config.pinch_metric {
            PinchMetric::Planar => lm[THUMB_TIP].planar_distance(&lm[INDEX_TIP]),
            PinchMetric::Spatial => lm[THUMB_TIP].spatial_distance(&lm[INDEX_TIP]),
        };

        GestureState {
            extended,
            raised_count,
            is_pointing,
            is_pinching: pinch_distance < self.config.pinch_threshold,
            action_point: Some(lm[INDEX_TIP]),
            well_formed: true,
        }
    }

    pub fn classify_frame(&self, frame: &FrameResult) -> FrameGestures {
        let hands: Vec<_> = frame
            .hands
            .iter()
            .map(|h| (h.handedness, self.classify(h)))
            .collect();
        let total_raised = hands
            .iter()
            .fold(0u8, |acc, (_, s)| acc.saturating_add(s.raised_count));
        FrameGestures {
            hands,
            total_raised,
        }
    }

    fn finger_extended(&self, mcp: &Landmark, pip: &Landmark, tip: &Landmark) -> bool {
        match self.config.strategy {
            FingerStrategy::Vertical => tip.y < pip.y,
            FingerStrategy::Angle { threshold_deg } => {
                joint_angle_deg(mcp, pip, tip) > threshold_deg
            }
        }
    }

    fn thumb_extended(&self, hand: &Hand) -> bool {
        let lm = &hand.landmarks;
        let tip = &lm[THUMB_TIP];

        if let FingerStrategy::Angle { threshold_deg } = self.config.strategy {
            return joint_angle_deg(&lm[THUMB_MCP], &lm[THUMB_IP], tip) > threshold_deg;
        }

        let reference = &lm[self.config.thumb_reference.index()];
        match hand.handedness {
            // Mirrored camera: a right thumb opens toward smaller x.
            Handedness::Right => tip.x < reference.x,
            Handedness::Left => tip.x > reference.x,
            Handedness::Unknown => {
                // Infer the thumb side from its base relative to the index base.
                let thumb_on_low_x = lm[THUMB_MCP].x < lm[INDEX_MCP].x;
                if thumb_on_low_x {
                    tip.x < reference.x
                } else {
                    tip.x > reference.x
                }
            }
        }
    }
}

/// Interior angle at `b` formed by `a`-`b`-`c`, in degrees within [0, 180].
pub fn joint_angle_deg(a: &Landmark, b: &Landmark, c: &Landmark) -> f32 {
    let radians = (c.y - b.y).atan2(c.x - b.x) - (a.y - b.y).atan2(a.x - b.x);
    let mut degrees = radians.to_degrees().abs();
    if degrees > 180.0 {
        degrees = 360.0 - degrees;
    }
    degrees
}

// ── Test helpers ───────────────────────────────────────────
