use serde::{Deserialize, Serialize};

use crate::classifier::{ClassifierConfig, FingerStrategy, TenFingerPolicy};
use crate::error::{CoreError, Result};
use crate::hold::HoldConfig;
use crate::smoother::SmootherConfig;

/// Upper bound on `tracking.max_hands`. Games are built for two hands; the
/// slack allows spectators in frame.
pub const MAX_TRACKED_HANDS: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub max_hands: usize,
    /// Minimum handedness score for a hand to start a role lock.
    pub min_detection_confidence: f32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            max_hands: 2,
            min_detection_confidence: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub countdown_ms: f64,
    pub feedback_ms: f64,
    pub lives: u32,
    /// Rounds before the game ends on its own; 0 plays until lives run out.
    pub rounds: u32,
    /// Per-round time limit; 0 disables it.
    pub round_ms: f64,
    pub ten_fingers: TenFingerPolicy,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            countdown_ms: 3000.0,
            feedback_ms: 1500.0,
            lives: 3,
            rounds: 10,
            round_ms: 0.0,
            ten_fingers: TenFingerPolicy::default(),
        }
    }
}

/// Everything the core can be tuned with. Missing JSON fields take their
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub classifier: ClassifierConfig,
    pub smoother: SmootherConfig,
    pub hold: HoldConfig,
    pub tracking: TrackingConfig,
    pub game: GameConfig,
}

impl CoreConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: CoreConfig =
            serde_json::from_str(json).map_err(|e| CoreError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CoreError::InvalidConfig(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        let alpha = self.smoother.alpha;
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(invalid(format!("smoother.alpha must be in (0, 1], got {alpha}")));
        }
        if !(self.classifier.pinch_threshold > 0.0) {
            return Err(invalid("classifier.pinch_threshold must be positive"));
        }
        if let FingerStrategy::Angle { threshold_deg } = self.classifier.strategy {
            if !(0.0..=180.0).contains(&threshold_deg) {
                return Err(invalid("classifier.strategy.threshold_deg must be in [0, 180]"));
            }
        }
        for (name, value) in [
            ("hold.required_ms", self.hold.required_ms),
            ("hold.ready_ms", self.hold.ready_ms),
            ("game.countdown_ms", self.game.countdown_ms),
            ("game.feedback_ms", self.game.feedback_ms),
        ] {
            if !(value > 0.0) {
                return Err(invalid(format!("{name} must be positive, got {value}")));
            }
        }
        if !(self.game.round_ms >= 0.0) {
            return Err(invalid("game.round_ms must not be negative"));
        }
        if !(1..=MAX_TRACKED_HANDS).contains(&self.tracking.max_hands) {
            return Err(invalid(format!(
                "tracking.max_hands must be in 1..={MAX_TRACKED_HANDS}, got {}",
                self.tracking.max_hands
            )));
        }
        if self.game.lives == 0 {
            return Err(invalid("game.lives must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> CoreError {
    CoreError::InvalidConfig(msg.into())
}
