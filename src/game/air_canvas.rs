//! Right hand points to draw and pinches to erase. Ten fingers held clears,
//! an open left palm held submits for judging.

use serde::{Deserialize, Serialize};

use super::{GameRules, RoundOutcome, Step, TickContext};
use crate::classifier::Gesture;
use crate::config::CoreConfig;
use crate::error::Result;
use crate::hold::HoldToConfirm;
use crate::landmarks::Handedness;
use crate::resolver::RoleSpec;
use crate::session::Confirmation;
use crate::smoother::Point2;

pub const DRAW_ROLE: &str = "draw";
pub const GESTURE_ROLE: &str = "gesture";

/// Judge's answer for a submitted drawing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub correct: bool,
    #[serde(default)]
    pub label: String,
}

pub struct AirCanvas {
    strokes: Vec<Vec<Point2>>,
    pen_down: bool,
    clear_hold: HoldToConfirm<bool>,
    submit_hold: HoldToConfirm<bool>,
    awaiting_verdict: bool,
    verdict: Option<Verdict>,
    erase_radius: f32,
    min_spacing: f32,
}

impl AirCanvas {
    pub fn new() -> Self {
        let hold = CoreConfig::default().hold;
        Self {
            strokes: Vec::new(),
            pen_down: false,
            clear_hold: HoldToConfirm::new(hold.ready_ms),
            submit_hold: HoldToConfirm::new(hold.required_ms),
            awaiting_verdict: false,
            verdict: None,
            erase_radius: 0.04,
            min_spacing: 0.002,
        }
    }

    pub fn strokes(&self) -> &[Vec<Point2>] {
        &self.strokes
    }

    pub fn is_awaiting_verdict(&self) -> bool {
        self.awaiting_verdict
    }

    fn draw_to(&mut self, p: Point2) {
        match self.strokes.last_mut() {
            Some(stroke) if self.pen_down => {
                let far_enough = stroke
                    .last()
                    .map_or(true, |last| last.distance(&p) >= self.min_spacing);
                if far_enough {
                    stroke.push(p);
                }
            }
            _ => {
                self.strokes.push(vec![p]);
                self.pen_down = true;
            }
        }
    }

    fn erase_at(&mut self, p: Point2) {
        let r = self.erase_radius;
        let before = self.strokes.len();
        self.strokes
            .retain(|stroke| !stroke.iter().any(|q| q.distance(&p) <= r));
        if self.strokes.len() != before {
            log::debug!("erased {} strokes", before - self.strokes.len());
        }
    }

    fn clear_canvas(&mut self) {
        self.strokes.clear();
        self.pen_down = false;
    }
}

impl Default for AirCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl GameRules for AirCanvas {
    type Content = Verdict;

    fn name(&self) -> &'static str {
        "air_canvas"
    }

    fn roles(&self) -> Vec<RoleSpec> {
        vec![
            RoleSpec::new(DRAW_ROLE, Handedness::Right),
            RoleSpec::new(GESTURE_ROLE, Handedness::Left),
        ]
    }

    fn needs_content(&self) -> bool {
        true
    }

    fn configure(&mut self, config: &CoreConfig) {
        self.clear_hold.set_required(config.hold.ready_ms);
        self.submit_hold.set_required(config.hold.required_ms);
    }

    fn begin_round(&mut self, _now_ms: f64) -> bool {
        self.clear_canvas();
        self.clear_hold.reset();
        self.submit_hold.reset();
        self.awaiting_verdict = false;
        self.verdict = None;
        false
    }

    fn on_content(&mut self, content: Verdict) -> Result<()> {
        if self.awaiting_verdict {
            self.verdict = Some(content);
        } else {
            log::debug!("verdict arrived with nothing submitted");
        }
        Ok(())
    }

    fn on_tick(&mut self, ctx: &TickContext<'_>) -> Step {
        let report = ctx.report;

        if let Some(verdict) = self.verdict.take() {
            self.awaiting_verdict = false;
            let outcome = if verdict.correct {
                RoundOutcome::Correct { points: 1 }
            } else {
                RoundOutcome::Wrong
            };
            return Step::outcome(outcome);
        }
        if self.awaiting_verdict {
            return Step::cont();
        }

        let ten = report.ten_fingers;
        if ten {
            // Both hands are busy clearing; a pending submit starts over.
            self.submit_hold.reset();
        }
        if self.clear_hold.observe(ten.then_some(true), ctx.dt_ms).is_some() {
            self.clear_canvas();
            return Step::cont().with_confirmed(Confirmation::Clear);
        }
        if ten {
            self.pen_down = false;
            return Step::cont();
        }

        let palm = report.gesture_for_role(GESTURE_ROLE) == Gesture::OpenPalm;
        if self.submit_hold.observe(palm.then_some(true), ctx.dt_ms).is_some() {
            self.pen_down = false;
            if self.strokes.is_empty() {
                log::debug!("ignoring submit of an empty canvas");
                return Step::cont();
            }
            self.awaiting_verdict = true;
            return Step::cont()
                .with_confirmed(Confirmation::Submit)
                .with_content_request();
        }

        let cursor = report.cursor(DRAW_ROLE);
        match (report.gesture_for_role(DRAW_ROLE), cursor) {
            (Gesture::Point, Some(p)) => self.draw_to(p),
            (Gesture::Pinch, Some(p)) => {
                self.pen_down = false;
                self.erase_at(p);
            }
            (Gesture::Point | Gesture::Pinch, None)
            | (Gesture::None | Gesture::OpenPalm | Gesture::Fist | Gesture::Fingers(_), _) => {
                self.pen_down = false;
            }
        }
        Step::cont()
    }

    fn reset(&mut self) {
        self.begin_round(0.0);
    }
}
