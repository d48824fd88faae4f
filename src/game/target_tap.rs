//! Point at targets before they vanish.

use serde::{Deserialize, Serialize};

use super::{GameRules, RoundOutcome, Step, TickContext};
use crate::classifier::Gesture;
use crate::config::CoreConfig;
use crate::error::Result;
use crate::landmarks::Handedness;
use crate::resolver::RoleSpec;
use crate::smoother::Point2;

pub const POINTER_ROLE: &str = "pointer";

const DEFAULT_SEED: u32 = 0x9E37_79B9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub center: Point2,
    pub radius: f32,
    pub expires_at_ms: f64,
}

impl Target {
    pub fn contains(&self, p: Point2) -> bool {
        self.center.distance(&p) <= self.radius
    }
}

/// xorshift32; reproducible target placement for a given seed.
#[derive(Debug, Clone)]
struct Spawner(u32);

impl Spawner {
    fn new(seed: u32) -> Self {
        Self(if seed == 0 { DEFAULT_SEED } else { seed })
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }

    /// Uniform in [0, 1).
    fn next_unit(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    fn spawn(&mut self, radius: f32, now_ms: f64, lifetime_ms: f64) -> Target {
        let span = (1.0 - 2.0 * radius).max(0.0);
        let x = radius + span * self.next_unit();
        let y = radius + span * self.next_unit();
        Target {
            center: Point2::new(x, y),
            radius,
            expires_at_ms: now_ms + lifetime_ms,
        }
    }
}

pub struct TargetTap {
    seed: u32,
    spawner: Spawner,
    target: Option<Target>,
    radius: f32,
    lifetime_ms: f64,
}

impl TargetTap {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            spawner: Spawner::new(seed),
            target: None,
            radius: 0.08,
            lifetime_ms: 2500.0,
        }
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }
}

impl Default for TargetTap {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl GameRules for TargetTap {
    type Content = ();

    fn name(&self) -> &'static str {
        "target_tap"
    }

    fn roles(&self) -> Vec<RoleSpec> {
        vec![RoleSpec::new(POINTER_ROLE, Handedness::Unknown)]
    }

    fn configure(&mut self, config: &CoreConfig) {
        if config.game.round_ms > 0.0 {
            self.lifetime_ms = config.game.round_ms;
        }
    }

    fn begin_round(&mut self, now_ms: f64) -> bool {
        let target = self.spawner.spawn(self.radius, now_ms, self.lifetime_ms);
        log::debug!(
            "target at ({:.2}, {:.2})",
            target.center.x,
            target.center.y
        );
        self.target = Some(target);
        false
    }

    fn on_content(&mut self, _content: ()) -> Result<()> {
        Ok(())
    }

    fn on_tick(&mut self, ctx: &TickContext<'_>) -> Step {
        let Some(target) = self.target else {
            return Step::cont();
        };

        let pointing = ctx.report.gesture_for_role(POINTER_ROLE) == Gesture::Point;
        let hit = pointing
            && ctx
                .report
                .cursor(POINTER_ROLE)
                .is_some_and(|p| target.contains(p));
        if hit {
            self.target = None;
            return Step::outcome(RoundOutcome::Correct { points: 1 });
        }
        if ctx.now_ms >= target.expires_at_ms {
            self.target = None;
            return Step::outcome(RoundOutcome::Wrong);
        }
        Step::cont()
    }

    fn reset(&mut self) {
        self.spawner = Spawner::new(self.seed);
        self.target = None;
    }
}
