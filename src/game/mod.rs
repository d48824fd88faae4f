//! Shared game phase machine:
//!
//! ```text
//! Idle -> Loading -> ReadyCheck -> Countdown -> Active <-> Feedback -> GameOver
//! ```

pub mod air_canvas;
pub mod finger_math;
pub mod target_tap;

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::capture::{CaptureLease, CaptureSlot};
use crate::config::CoreConfig;
use crate::error::{CoreError, Result};
use crate::hold::HoldToConfirm;
use crate::landmarks::FrameResult;
use crate::resolver::RoleSpec;
use crate::session::{Confirmation, GestureSession, TickReport};
use crate::timers::{TimerKind, TimerSet};

pub use air_canvas::AirCanvas;
pub use finger_math::FingerMath;
pub use target_tap::TargetTap;

#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Idle,
    Loading,
    ReadyCheck,
    Countdown,
    Active,
    Feedback,
    GameOver,
}

impl GamePhase {
    /// Phases in which hand frames are sampled.
    pub fn samples_gestures(self) -> bool {
        matches!(
            self,
            Self::ReadyCheck | Self::Countdown | Self::Active | Self::Feedback
        )
    }
}

/// Results arriving from collaborators outside the core.
#[derive(Debug, Clone, PartialEq)]
pub enum ExternalEvent<C> {
    CaptureReady,
    CaptureFailed(String),
    ContentReady(C),
    ContentFailed(String),
    Quit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub score: u32,
    pub lives: u32,
    pub round: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum GameEffect {
    PhaseChanged { from: GamePhase, to: GamePhase },
    /// Ask the content generator for the next question or verdict.
    RequestContent,
    Confirmed { value: Confirmation },
    Feedback { correct: bool },
    ScoreChanged { scoreboard: Scoreboard },
    ReleaseCapture,
    Error { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Continue,
    Correct { points: u32 },
    Wrong,
    /// The rules have nothing more to play.
    Finished,
}

/// What a rule set decided this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub outcome: RoundOutcome,
    pub confirmed: Option<Confirmation>,
    pub request_content: bool,
}

impl Step {
    pub fn cont() -> Self {
        Self::outcome(RoundOutcome::Continue)
    }

    pub fn outcome(outcome: RoundOutcome) -> Self {
        Self {
            outcome,
            confirmed: None,
            request_content: false,
        }
    }

    pub fn with_confirmed(mut self, value: Confirmation) -> Self {
        self.confirmed = Some(value);
        self
    }

    pub fn with_content_request(mut self) -> Self {
        self.request_content = true;
        self
    }
}

/// Read-only view handed to [`GameRules::on_tick`].
pub struct TickContext<'a> {
    pub report: &'a TickReport,
    pub now_ms: f64,
    pub dt_ms: f64,
}

/// Per-game scoring logic plugged into a [`GameController`].
pub trait GameRules {
    /// Payload delivered by the external content generator.
    type Content;

    fn name(&self) -> &'static str;

    fn roles(&self) -> Vec<RoleSpec> {
        Vec::new()
    }

    /// Pick up hold durations and other tunables. Called on construction and
    /// on every reconfigure.
    fn configure(&mut self, _config: &CoreConfig) {}

    /// A content failure ends the game only for rules that depend on it.
    fn needs_content(&self) -> bool {
        false
    }

    /// Prepare a new round. Returning true requests content for it.
    fn begin_round(&mut self, now_ms: f64) -> bool;

    /// An error here ends the game like a content failure.
    fn on_content(&mut self, content: Self::Content) -> Result<()>;

    fn on_tick(&mut self, ctx: &TickContext<'_>) -> Step;

    /// Back to the state right after construction.
    fn reset(&mut self);
}

/// Output of one [`GameController::tick`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickOutput {
    /// `None` in phases that do not sample gestures.
    pub report: Option<TickReport>,
    pub effects: Vec<GameEffect>,
}

pub struct GameController<R: GameRules> {
    rules: R,
    config: CoreConfig,
    session: GestureSession,
    start_hold: HoldToConfirm<bool>,
    timers: TimerSet,
    capture: CaptureSlot,
    lease: Option<CaptureLease>,
    phase: GamePhase,
    scoreboard: Scoreboard,
    last_error: Option<CoreError>,
    last_frame_ms: f64,
}

impl<R: GameRules> GameController<R> {
    pub fn new(mut rules: R, config: CoreConfig, capture: CaptureSlot) -> Self {
        rules.configure(&config);
        let session = GestureSession::new(&config, rules.roles());
        let start_hold = HoldToConfirm::new(config.hold.ready_ms);
        Self {
            rules,
            session,
            start_hold,
            timers: TimerSet::new(),
            capture,
            lease: None,
            phase: GamePhase::Idle,
            scoreboard: Scoreboard::default(),
            last_error: None,
            last_frame_ms: f64::NAN,
            config,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn scoreboard(&self) -> Scoreboard {
        self.scoreboard
    }

    pub fn last_error(&self) -> Option<&CoreError> {
        self.last_error.as_ref()
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn session(&self) -> &GestureSession {
        &self.session
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn holds_capture(&self) -> bool {
        self.lease.is_some()
    }

    /// Swap in a new config. Only allowed between games.
    pub fn reconfigure(&mut self, config: CoreConfig) -> Result<()> {
        config.validate()?;
        self.expect_stopped()?;
        self.session = GestureSession::new(&config, self.rules.roles());
        self.start_hold = HoldToConfirm::new(config.hold.ready_ms);
        self.rules.configure(&config);
        self.config = config;
        Ok(())
    }

    /// Claim the capture session and begin loading. Retryable after any
    /// failure.
    pub fn start(&mut self, now_ms: f64) -> Result<Vec<GameEffect>> {
        self.expect_stopped()?;
        self.reset_game_state();
        self.lease = Some(self.capture.acquire(self.rules.name())?);
        self.last_error = None;
        self.scoreboard = Scoreboard {
            score: 0,
            lives: self.config.game.lives,
            round: 0,
        };
        self.last_frame_ms = now_ms;

        let mut effects = Vec::new();
        self.set_phase(GamePhase::Loading, &mut effects);
        effects.push(GameEffect::ScoreChanged {
            scoreboard: self.scoreboard,
        });
        Ok(effects)
    }

    pub fn handle_event(&mut self, event: ExternalEvent<R::Content>) -> Vec<GameEffect> {
        let mut effects = Vec::new();
        match event {
            ExternalEvent::CaptureReady => {
                if self.phase == GamePhase::Loading {
                    self.start_hold.reset();
                    self.set_phase(GamePhase::ReadyCheck, &mut effects);
                } else {
                    log::debug!("ignoring capture ready in {:?}", self.phase);
                }
            }
            ExternalEvent::CaptureFailed(msg) => {
                if self.phase != GamePhase::Idle {
                    log::warn!("{}: capture failed: {msg}", self.rules.name());
                    self.teardown(Some(CoreError::CaptureFailed(msg)), &mut effects);
                }
            }
            ExternalEvent::ContentReady(content) => {
                if self.phase.samples_gestures() {
                    if let Err(err) = self.rules.on_content(content) {
                        log::warn!("{}: {err}", self.rules.name());
                        self.teardown(Some(err), &mut effects);
                    }
                } else {
                    log::debug!("dropping late content in {:?}", self.phase);
                }
            }
            ExternalEvent::ContentFailed(msg) => {
                if self.rules.needs_content() && self.phase.samples_gestures() {
                    log::warn!("{}: content failed: {msg}", self.rules.name());
                    self.teardown(Some(CoreError::ContentFailed(msg)), &mut effects);
                }
            }
            ExternalEvent::Quit => {
                if self.phase != GamePhase::Idle {
                    self.teardown(None, &mut effects);
                }
            }
        }
        effects
    }

    /// Leave the game from any phase.
    pub fn quit(&mut self) -> Vec<GameEffect> {
        self.handle_event(ExternalEvent::Quit)
    }

    /// Advance one frame.
    pub fn tick(&mut self, frame: &FrameResult, now_ms: f64) -> TickOutput {
        let dt_ms = if self.last_frame_ms.is_nan() {
            0.0
        } else {
            (now_ms - self.last_frame_ms).max(0.0)
        };
        self.last_frame_ms = now_ms;

        let mut effects = Vec::new();
        for kind in self.timers.poll(now_ms) {
            self.on_timer(kind, now_ms, &mut effects);
        }

        if !self.phase.samples_gestures() {
            return TickOutput {
                report: None,
                effects,
            };
        }

        let mut report = self.session.process(frame);
        match self.phase {
            GamePhase::ReadyCheck => {
                let candidate = report.ten_fingers.then_some(true);
                if self.start_hold.observe(candidate, dt_ms).is_some() {
                    report.confirmed = Some(Confirmation::Start);
                    effects.push(GameEffect::Confirmed {
                        value: Confirmation::Start,
                    });
                    self.timers
                        .start(TimerKind::Countdown, now_ms, self.config.game.countdown_ms);
                    self.set_phase(GamePhase::Countdown, &mut effects);
                }
            }
            GamePhase::Active => {
                let step = self.rules.on_tick(&TickContext {
                    report: &report,
                    now_ms,
                    dt_ms,
                });
                if let Some(value) = step.confirmed {
                    report.confirmed = Some(value);
                    effects.push(GameEffect::Confirmed { value });
                }
                if step.request_content {
                    effects.push(GameEffect::RequestContent);
                }
                self.apply_outcome(step.outcome, now_ms, &mut effects);
            }
            _ => {}
        }

        TickOutput {
            report: Some(report),
            effects,
        }
    }

    fn on_timer(&mut self, kind: TimerKind, now_ms: f64, effects: &mut Vec<GameEffect>) {
        match (kind, self.phase) {
            (TimerKind::Countdown, GamePhase::Countdown) => self.begin_round(now_ms, effects),
            (TimerKind::Feedback, GamePhase::Feedback) => {
                let out_of_rounds =
                    self.config.game.rounds > 0 && self.scoreboard.round >= self.config.game.rounds;
                if self.scoreboard.lives == 0 || out_of_rounds {
                    self.finish(effects);
                } else {
                    self.begin_round(now_ms, effects);
                }
            }
            (TimerKind::Round, GamePhase::Active) => {
                log::debug!("{}: round timed out", self.rules.name());
                self.apply_outcome(RoundOutcome::Wrong, now_ms, effects);
            }
            (kind, phase) => log::debug!("stale {kind:?} timer in {phase:?}"),
        }
    }

    fn begin_round(&mut self, now_ms: f64, effects: &mut Vec<GameEffect>) {
        self.scoreboard.round += 1;
        if self.rules.begin_round(now_ms) {
            effects.push(GameEffect::RequestContent);
        }
        if self.config.game.round_ms > 0.0 {
            self.timers
                .start(TimerKind::Round, now_ms, self.config.game.round_ms);
        }
        self.set_phase(GamePhase::Active, effects);
        effects.push(GameEffect::ScoreChanged {
            scoreboard: self.scoreboard,
        });
    }

    fn apply_outcome(&mut self, outcome: RoundOutcome, now_ms: f64, effects: &mut Vec<GameEffect>) {
        let correct = match outcome {
            RoundOutcome::Continue => return,
            RoundOutcome::Finished => {
                self.finish(effects);
                return;
            }
            RoundOutcome::Correct { points } => {
                self.scoreboard.score += points;
                true
            }
            RoundOutcome::Wrong => {
                self.scoreboard.lives = self.scoreboard.lives.saturating_sub(1);
                false
            }
        };
        self.timers.cancel(TimerKind::Round);
        effects.push(GameEffect::Feedback { correct });
        effects.push(GameEffect::ScoreChanged {
            scoreboard: self.scoreboard,
        });
        self.timers
            .start(TimerKind::Feedback, now_ms, self.config.game.feedback_ms);
        self.set_phase(GamePhase::Feedback, effects);
    }

    /// Normal completion: keep the final score, give the camera back.
    fn finish(&mut self, effects: &mut Vec<GameEffect>) {
        self.timers.cancel_all();
        self.release_capture(effects);
        self.set_phase(GamePhase::GameOver, effects);
    }

    /// Abort: timers, then capture, then per-game sensing state.
    fn teardown(&mut self, error: Option<CoreError>, effects: &mut Vec<GameEffect>) {
        self.timers.cancel_all();
        self.release_capture(effects);
        self.reset_game_state();
        if let Some(err) = &error {
            effects.push(GameEffect::Error {
                message: err.to_string(),
            });
        }
        self.last_error = error;
        self.set_phase(GamePhase::Idle, effects);
    }

    fn release_capture(&mut self, effects: &mut Vec<GameEffect>) {
        if let Some(lease) = self.lease.take() {
            lease.release();
            effects.push(GameEffect::ReleaseCapture);
        }
    }

    fn reset_game_state(&mut self) {
        self.timers.cancel_all();
        self.session.reset();
        self.start_hold.reset();
        self.rules.reset();
    }

    fn expect_stopped(&self) -> Result<()> {
        match self.phase {
            GamePhase::Idle | GamePhase::GameOver => Ok(()),
            actual => Err(CoreError::InvalidPhase {
                expected: GamePhase::Idle,
                actual,
            }),
        }
    }

    fn set_phase(&mut self, to: GamePhase, effects: &mut Vec<GameEffect>) {
        if self.phase == to {
            return;
        }
        let from = self.phase;
        log::info!("{}: {:?} -> {:?}", self.rules.name(), from, to);
        self.phase = to;
        effects.push(GameEffect::PhaseChanged { from, to });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::fixtures::*;
    use crate::landmarks::Handedness;

    /// Rules that do whatever the test queued up.
    #[derive(Default)]
    struct Scripted {
        next: Option<RoundOutcome>,
        contents: Vec<u32>,
        rounds_begun: u32,
    }

    impl GameRules for Scripted {
        type Content = u32;

        fn name(&self) -> &'static str {
            "scripted"
        }

        fn needs_content(&self) -> bool {
            true
        }

        fn begin_round(&mut self, _now_ms: f64) -> bool {
            self.rounds_begun += 1;
            false
        }

        fn on_content(&mut self, content: u32) -> Result<()> {
            if content == 0 {
                return Err(CoreError::ContentFailed("empty content".into()));
            }
            self.contents.push(content);
            Ok(())
        }

        fn on_tick(&mut self, _ctx: &TickContext<'_>) -> Step {
            Step::outcome(self.next.take().unwrap_or(RoundOutcome::Continue))
        }

        fn reset(&mut self) {
            self.next = None;
        }
    }

    fn controller() -> GameController<Scripted> {
        let mut config = CoreConfig::default();
        config.hold.ready_ms = 100.0;
        config.game.countdown_ms = 50.0;
        config.game.feedback_ms = 100.0;
        GameController::new(Scripted::default(), config, CaptureSlot::new())
    }

    fn ten() -> FrameResult {
        FrameResult::new(vec![open_palm(Handedness::Left), open_palm(Handedness::Right)])
    }

    fn to_active(ctrl: &mut GameController<Scripted>) {
        ctrl.start(0.0).unwrap();
        ctrl.handle_event(ExternalEvent::CaptureReady);
        ctrl.tick(&ten(), 0.0);
        ctrl.tick(&ten(), 100.0);
        ctrl.tick(&FrameResult::empty(), 150.0);
        assert_eq!(ctrl.phase(), GamePhase::Active);
    }

    #[test]
    fn test_late_frame_does_not_skip_ready_check() {
        let mut ctrl = controller();
        ctrl.start(0.0).unwrap();
        ctrl.handle_event(ExternalEvent::CaptureReady);
        ctrl.tick(&ten(), 2000.0);
        assert_eq!(ctrl.phase(), GamePhase::ReadyCheck);
        ctrl.tick(&ten(), 2100.0);
        assert_eq!(ctrl.phase(), GamePhase::Countdown);
    }

    #[test]
    fn test_finished_goes_to_game_over() {
        let mut ctrl = controller();
        to_active(&mut ctrl);
        ctrl.rules.next = Some(RoundOutcome::Finished);
        let out = ctrl.tick(&FrameResult::empty(), 200.0);
        assert_eq!(ctrl.phase(), GamePhase::GameOver);
        assert!(out.effects.contains(&GameEffect::ReleaseCapture));
        assert!(!ctrl.holds_capture());
        assert_eq!(ctrl.last_error(), None);
    }

    #[test]
    fn test_content_outside_sampling_phases_is_dropped() {
        let mut ctrl = controller();
        ctrl.handle_event(ExternalEvent::ContentReady(1));
        ctrl.start(0.0).unwrap();
        ctrl.handle_event(ExternalEvent::ContentReady(2));
        assert!(ctrl.rules().contents.is_empty());

        ctrl.handle_event(ExternalEvent::CaptureReady);
        ctrl.tick(&ten(), 0.0);
        ctrl.tick(&ten(), 100.0);
        ctrl.tick(&FrameResult::empty(), 150.0);
        ctrl.handle_event(ExternalEvent::ContentReady(3));
        assert_eq!(ctrl.rules().contents, vec![3]);
    }

    #[test]
    fn test_rejected_content_tears_down() {
        let mut ctrl = controller();
        to_active(&mut ctrl);
        let effects = ctrl.handle_event(ExternalEvent::ContentReady(0));
        assert_eq!(ctrl.phase(), GamePhase::Idle);
        assert!(effects.contains(&GameEffect::ReleaseCapture));
        assert_eq!(
            ctrl.last_error(),
            Some(&CoreError::ContentFailed("empty content".into()))
        );
    }

    #[test]
    fn test_stale_timer_is_ignored() {
        let mut ctrl = controller();
        ctrl.start(0.0).unwrap();
        ctrl.handle_event(ExternalEvent::CaptureReady);
        ctrl.timers.start(TimerKind::Feedback, 0.0, 10.0);
        ctrl.timers.start(TimerKind::Countdown, 0.0, 10.0);

        let out = ctrl.tick(&FrameResult::empty(), 20.0);
        assert_eq!(ctrl.phase(), GamePhase::ReadyCheck);
        assert!(out.effects.is_empty());
        assert_eq!(ctrl.rules().rounds_begun, 0);
        assert!(!ctrl.timers.is_pending(TimerKind::Feedback));
    }

    #[test]
    fn test_feedback_returns_to_active_with_next_round() {
        let mut ctrl = controller();
        to_active(&mut ctrl);
        ctrl.rules.next = Some(RoundOutcome::Correct { points: 3 });
        let out = ctrl.tick(&FrameResult::empty(), 200.0);
        assert!(out.effects.contains(&GameEffect::Feedback { correct: true }));
        assert_eq!(ctrl.phase(), GamePhase::Feedback);

        // Rules are not consulted while feedback is showing.
        ctrl.rules.next = Some(RoundOutcome::Wrong);
        ctrl.tick(&FrameResult::empty(), 250.0);
        assert_eq!(ctrl.scoreboard().lives, 3);
        assert_eq!(ctrl.rules().next, Some(RoundOutcome::Wrong));
        ctrl.rules.next = None;

        ctrl.tick(&FrameResult::empty(), 300.0);
        assert_eq!(ctrl.phase(), GamePhase::Active);
        assert_eq!(ctrl.rules().rounds_begun, 2);
        assert_eq!(ctrl.scoreboard().score, 3);
    }
}
