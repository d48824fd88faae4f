//! 21-point MediaPipe hand landmarks and per-tick frames.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

pub const LANDMARK_COUNT: usize = 21;

/// (mcp, pip, tip) for index, middle, ring, pinky.
pub const FINGER_JOINTS: [(usize, usize, usize); 4] = [
    (INDEX_MCP, INDEX_PIP, INDEX_TIP),
    (MIDDLE_MCP, MIDDLE_PIP, MIDDLE_TIP),
    (RING_MCP, RING_PIP, RING_TIP),
    (PINKY_MCP, PINKY_PIP, PINKY_TIP),
];

/// A single landmark. `x`/`y` are normalized to the image, `z` is depth
/// relative to the wrist.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn planar_distance(&self, other: &Landmark) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn spatial_distance(&self, other: &Landmark) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Handedness label as reported by the pose model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Handedness {
    Left,
    Right,
    #[default]
    Unknown,
}

impl From<String> for Handedness {
    fn from(label: String) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "left" => Self::Left,
            "right" => Self::Right,
            _ => Self::Unknown,
        }
    }
}

impl Handedness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "Left",
            Self::Right => "Right",
            Self::Unknown => "Unknown",
        }
    }
}

/// One detected hand.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Hand {
    pub landmarks: Vec<Landmark>,
    #[serde(default)]
    pub handedness: Handedness,
    /// Handedness confidence, 0.0 to 1.0.
    #[serde(default)]
    pub score: f32,
}

impl Hand {
    pub fn new(landmarks: Vec<Landmark>, handedness: Handedness, score: f32) -> Self {
        Self {
            landmarks,
            handedness,
            score,
        }
    }

    /// True when every expected landmark is present and finite.
    pub fn is_well_formed(&self) -> bool {
        self.landmarks.len() >= LANDMARK_COUNT && self.landmarks.iter().all(Landmark::is_finite)
    }

    pub fn landmark(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index)
    }
}

/// Everything the pose model produced for one tick. Hand order is not stable
/// between ticks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    #[serde(default)]
    pub hands: Vec<Hand>,
}

impl FrameResult {
    pub fn new(hands: Vec<Hand>) -> Self {
        Self { hands }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.hands.is_empty()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CoreError::InvalidFrame(e.to_string()))
    }

    /// Drop hands past `max_hands`, keeping upstream order.
    pub fn truncate(&mut self, max_hands: usize) {
        if self.hands.len() > max_hands {
            log::debug!(
                "dropping {} hands beyond max_hands={}",
                self.hands.len() - max_hands,
                max_hands
            );
            self.hands.truncate(max_hands);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_from_json() {
        let json = r#"{"hands":[{"landmarks":[{"x":0.1,"y":0.2}],"handedness":"Right","score":0.9}]}"#;
        let frame = FrameResult::from_json(json).unwrap();
        assert_eq!(frame.hands.len(), 1);
        assert_eq!(frame.hands[0].handedness, Handedness::Right);
        assert_eq!(frame.hands[0].landmarks[0].z, 0.0);
        assert!(!frame.hands[0].is_well_formed());
    }

    #[test]
    fn test_unknown_handedness_label() {
        let json = r#"{"hands":[{"landmarks":[],"handedness":"Ambidextrous"}]}"#;
        let frame = FrameResult::from_json(json).unwrap();
        assert_eq!(frame.hands[0].handedness, Handedness::Unknown);
    }

    #[test]
    fn test_lowercase_handedness_label() {
        let json = r#"{"hands":[{"landmarks":[],"handedness":"left"}]}"#;
        let frame = FrameResult::from_json(json).unwrap();
        assert_eq!(frame.hands[0].handedness, Handedness::Left);
    }

    #[test]
    fn test_bad_json_is_error() {
        assert!(matches!(
            FrameResult::from_json("{hands:"),
            Err(CoreError::InvalidFrame(_))
        ));
    }

    #[test]
    fn test_truncate_keeps_order() {
        let mut frame = FrameResult::new(vec![
            Hand::new(vec![], Handedness::Left, 0.9),
            Hand::new(vec![], Handedness::Right, 0.9),
            Hand::new(vec![], Handedness::Unknown, 0.9),
        ]);
        frame.truncate(2);
        assert_eq!(frame.hands.len(), 2);
        assert_eq!(frame.hands[1].handedness, Handedness::Right);
    }

    #[test]
    fn test_distances() {
        let a = Landmark::new(0.0, 0.0, 0.0);
        let b = Landmark::new(0.3, 0.4, 1.2);
        assert!((a.planar_distance(&b) - 0.5).abs() < 1e-6);
        assert!((a.spatial_distance(&b) - 1.3).abs() < 1e-6);
    }
}
