use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A 2D coordinate in normalized image space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmootherConfig {
    /// Lower is smoother and laggier, higher is snappier.
    pub alpha: f32,
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self { alpha: 0.3 }
    }
}

/// One tracked control point. Seeded by its first observation.
#[derive(Debug, Clone)]
pub struct Smoother {
    alpha: f32,
    point: Option<Point2>,
}

impl Smoother {
    /// `alpha` is clamped into (0, 1]; non-finite values fall back to the
    /// default.
    pub fn new(alpha: f32) -> Self {
        let alpha = if alpha.is_finite() {
            alpha.clamp(f32::EPSILON, 1.0)
        } else {
            SmootherConfig::default().alpha
        };
        Self { alpha, point: None }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn update(&mut self, raw: Point2) -> Point2 {
        let next = match self.point {
            None => raw,
            Some(s) => Point2 {
                x: s.x + self.alpha * (raw.x - s.x),
                y: s.y + self.alpha * (raw.y - s.y),
            },
        };
        self.point = Some(next);
        next
    }

    pub fn current(&self) -> Option<Point2> {
        self.point
    }

    /// Forget the seed; the next observation passes through unsmoothed.
    pub fn reset(&mut self) {
        self.point = None;
    }
}

impl Default for Smoother {
    fn default() -> Self {
        Self::new(SmootherConfig::default().alpha)
    }
}

/// Independent smoothers keyed by lane or role name.
#[derive(Debug, Clone)]
pub struct SmootherBank {
    alpha: f32,
    lanes: HashMap<String, Smoother>,
}

impl SmootherBank {
    pub fn new(config: SmootherConfig) -> Self {
        Self {
            alpha: config.alpha,
            lanes: HashMap::new(),
        }
    }

    pub fn update(&mut self, lane: &str, raw: Point2) -> Point2 {
        let alpha = self.alpha;
        self.lanes
            .entry(lane.to_string())
            .or_insert_with(|| Smoother::new(alpha))
            .update(raw)
    }

    pub fn current(&self, lane: &str) -> Option<Point2> {
        self.lanes.get(lane).and_then(Smoother::current)
    }

    pub fn reset_lane(&mut self, lane: &str) {
        if let Some(s) = self.lanes.get_mut(lane) {
            s.reset();
        }
    }

    pub fn reset(&mut self) {
        self.lanes.clear();
    }
}

impl Default for SmootherBank {
    fn default() -> Self {
        Self::new(SmootherConfig::default())
    }
}
