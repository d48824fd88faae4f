//! Answer arithmetic questions by holding up the right number of fingers.

use serde::{Deserialize, Serialize};

use super::{GameRules, RoundOutcome, Step, TickContext};
use crate::config::CoreConfig;
use crate::error::{CoreError, Result};
use crate::hold::HoldToConfirm;
use crate::session::Confirmation;

/// A question from the content generator. Answers above 10 cannot be shown
/// with two hands and are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MathProblem {
    pub prompt: String,
    pub answer: u8,
}

pub struct FingerMath {
    problem: Option<MathProblem>,
    answer_hold: HoldToConfirm<u8>,
}

impl FingerMath {
    pub fn new() -> Self {
        Self {
            problem: None,
            answer_hold: HoldToConfirm::new(CoreConfig::default().hold.required_ms),
        }
    }

    pub fn problem(&self) -> Option<&MathProblem> {
        self.problem.as_ref()
    }

    pub fn hold_progress(&self) -> f64 {
        self.answer_hold.progress()
    }
}

impl Default for FingerMath {
    fn default() -> Self {
        Self::new()
    }
}

impl GameRules for FingerMath {
    type Content = MathProblem;

    fn name(&self) -> &'static str {
        "finger_math"
    }

    fn needs_content(&self) -> bool {
        true
    }

    fn configure(&mut self, config: &CoreConfig) {
        self.answer_hold.set_required(config.hold.required_ms);
    }

    fn begin_round(&mut self, _now_ms: f64) -> bool {
        self.problem = None;
        self.answer_hold.reset();
        true
    }

    fn on_content(&mut self, content: MathProblem) -> Result<()> {
        if content.answer > 10 {
            return Err(CoreError::ContentFailed(format!(
                "answer {} cannot be shown with ten fingers",
                content.answer
            )));
        }
        log::debug!("new problem: {}", content.prompt);
        self.problem = Some(content);
        self.answer_hold.reset();
        Ok(())
    }

    fn on_tick(&mut self, ctx: &TickContext<'_>) -> Step {
        let Some(problem) = &self.problem else {
            return Step::cont();
        };
        let candidate = ctx.report.has_hands().then_some(ctx.report.total_raised);
        match self.answer_hold.observe(candidate, ctx.dt_ms) {
            None => Step::cont(),
            Some(count) => {
                let outcome = if count == problem.answer {
                    RoundOutcome::Correct { points: 1 }
                } else {
                    RoundOutcome::Wrong
                };
                self.problem = None;
                Step::outcome(outcome).with_confirmed(Confirmation::Count(count))
            }
        }
    }

    fn reset(&mut self) {
        self.problem = None;
        self.answer_hold.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Gesture, GestureState};
    use crate::landmarks::Handedness;
    use crate::session::{HandReport, TickReport};

    fn report(total: u8) -> TickReport {
        TickReport {
            total_raised: total,
            hands: vec![HandReport {
                handedness: Handedness::Right,
                state: GestureState::default(),
                gesture: Gesture::None,
            }],
            ..TickReport::default()
        }
    }

    fn step(game: &mut FingerMath, report: &TickReport, dt_ms: f64) -> Step {
        game.on_tick(&TickContext {
            report,
            now_ms: 0.0,
            dt_ms,
        })
    }

    fn problem(game: &mut FingerMath, prompt: &str, answer: u8) {
        game.on_content(MathProblem {
            prompt: prompt.into(),
            answer,
        })
        .unwrap();
    }

    #[test]
    fn test_waits_for_problem() {
        let mut game = FingerMath::new();
        assert!(game.begin_round(0.0));
        step(&mut game, &report(3), 16.0);
        assert_eq!(step(&mut game, &report(3), 5000.0), Step::cont());
    }

    #[test]
    fn test_correct_answer_after_hold() {
        let mut game = FingerMath::new();
        game.begin_round(0.0);
        problem(&mut game, "2 + 2", 4);
        assert_eq!(step(&mut game, &report(4), 16.0), Step::cont());
        assert_eq!(step(&mut game, &report(4), 1000.0), Step::cont());
        assert_eq!(step(&mut game, &report(4), 1000.0), Step::cont());
        let s = step(&mut game, &report(4), 1000.0);
        assert_eq!(s.outcome, RoundOutcome::Correct { points: 1 });
        assert_eq!(s.confirmed, Some(Confirmation::Count(4)));
        assert!(game.problem().is_none());
    }

    #[test]
    fn test_wrong_answer() {
        let mut game = FingerMath::new();
        game.begin_round(0.0);
        problem(&mut game, "3 + 4", 7);
        step(&mut game, &report(6), 16.0);
        let s = step(&mut game, &report(6), 3000.0);
        assert_eq!(s.outcome, RoundOutcome::Wrong);
    }

    #[test]
    fn test_one_late_frame_does_not_answer() {
        let mut game = FingerMath::new();
        game.begin_round(0.0);
        problem(&mut game, "3 + 4", 7);
        assert_eq!(step(&mut game, &report(7), 3000.0), Step::cont());
        assert!(game.problem().is_some());
        assert!(game.hold_progress() < 0.05);
    }

    #[test]
    fn test_changing_count_restarts_hold() {
        let mut game = FingerMath::new();
        game.begin_round(0.0);
        problem(&mut game, "1 + 1", 2);
        step(&mut game, &report(2), 16.0);
        step(&mut game, &report(2), 2500.0);
        step(&mut game, &report(3), 100.0);
        assert_eq!(step(&mut game, &report(2), 16.0), Step::cont());
        assert_eq!(game.hold_progress(), 16.0 / 3000.0);
    }

    #[test]
    fn test_no_hands_is_no_answer() {
        let mut game = FingerMath::new();
        game.begin_round(0.0);
        problem(&mut game, "0 + 0", 0);
        step(&mut game, &TickReport::default(), 16.0);
        assert_eq!(step(&mut game, &TickReport::default(), 5000.0), Step::cont());
    }

    #[test]
    fn test_rejects_unreachable_answer() {
        let mut game = FingerMath::new();
        let err = game.on_content(MathProblem {
            prompt: "9 + 9".into(),
            answer: 18,
        });
        assert!(matches!(err, Err(CoreError::ContentFailed(_))));
        assert!(game.problem().is_none());
    }
}
