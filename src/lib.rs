//! Gesture arcade core. [`ArcadeCoreRs`] is the wasm entry point; native
//! callers use [`game::GameController`] directly.

pub mod capture;
pub mod classifier;
pub mod config;
pub mod error;
pub mod game;
pub mod hold;
pub mod landmarks;
pub mod resolver;
pub mod session;
pub mod smoother;
pub mod timers;

use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub use capture::{CaptureLease, CaptureSlot};
pub use classifier::{Gesture, GestureClassifier, GestureState};
pub use config::CoreConfig;
pub use error::{CoreError, Result};
pub use game::{
    AirCanvas, ExternalEvent, FingerMath, GameController, GameEffect, GamePhase, GameRules,
    Scoreboard, TargetTap, TickOutput,
};
pub use hold::HoldToConfirm;
pub use landmarks::{FrameResult, Hand, Handedness, Landmark};
pub use resolver::{HandResolver, RoleSpec};
pub use smoother::{Point2, Smoother};

/// Type-erased controller so the facade can hold any game.
trait ArcadeGame {
    fn phase(&self) -> GamePhase;
    fn scoreboard(&self) -> Scoreboard;
    fn config(&self) -> &CoreConfig;
    fn reconfigure(&mut self, config: CoreConfig) -> Result<()>;
    fn start(&mut self, now_ms: f64) -> Result<Vec<GameEffect>>;
    /// `ContentReady` carries the game's content as JSON. Content that does
    /// not parse is handled as a content failure.
    fn handle(&mut self, event: ExternalEvent<String>) -> Vec<GameEffect>;
    fn tick(&mut self, frame: &FrameResult, now_ms: f64) -> TickOutput;
}

impl<R> ArcadeGame for GameController<R>
where
    R: GameRules,
    R::Content: DeserializeOwned,
{
    fn phase(&self) -> GamePhase {
        GameController::phase(self)
    }

    fn scoreboard(&self) -> Scoreboard {
        GameController::scoreboard(self)
    }

    fn config(&self) -> &CoreConfig {
        GameController::config(self)
    }

    fn reconfigure(&mut self, config: CoreConfig) -> Result<()> {
        GameController::reconfigure(self, config)
    }

    fn start(&mut self, now_ms: f64) -> Result<Vec<GameEffect>> {
        GameController::start(self, now_ms)
    }

    fn handle(&mut self, event: ExternalEvent<String>) -> Vec<GameEffect> {
        let event = match event {
            ExternalEvent::ContentReady(json) => match serde_json::from_str::<R::Content>(&json) {
                Ok(content) => ExternalEvent::ContentReady(content),
                Err(e) => ExternalEvent::ContentFailed(format!("unreadable content: {e}")),
            },
            ExternalEvent::CaptureReady => ExternalEvent::CaptureReady,
            ExternalEvent::CaptureFailed(msg) => ExternalEvent::CaptureFailed(msg),
            ExternalEvent::ContentFailed(msg) => ExternalEvent::ContentFailed(msg),
            ExternalEvent::Quit => ExternalEvent::Quit,
        };
        self.handle_event(event)
    }

    fn tick(&mut self, frame: &FrameResult, now_ms: f64) -> TickOutput {
        GameController::tick(self, frame, now_ms)
    }
}

fn build_game(name: &str, config: CoreConfig, capture: CaptureSlot) -> Result<Box<dyn ArcadeGame>> {
    config.validate()?;
    let game: Box<dyn ArcadeGame> = match name {
        "finger_math" => Box::new(GameController::new(FingerMath::new(), config, capture)),
        "air_canvas" => Box::new(GameController::new(AirCanvas::new(), config, capture)),
        "target_tap" => Box::new(GameController::new(TargetTap::default(), config, capture)),
        other => return Err(CoreError::InvalidConfig(format!("unknown game {other:?}"))),
    };
    Ok(game)
}

fn encode<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| CoreError::Encode(e.to_string()))
}

fn to_js(err: CoreError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Host-facing handle for one game. Effects and tick output cross the
/// boundary as JSON strings.
#[wasm_bindgen]
pub struct ArcadeCoreRs {
    game: Box<dyn ArcadeGame>,
}

#[wasm_bindgen]
impl ArcadeCoreRs {
    /// `game` is one of `finger_math`, `air_canvas`, `target_tap`.
    #[wasm_bindgen(constructor)]
    pub fn new(game: &str) -> std::result::Result<ArcadeCoreRs, JsValue> {
        Self::with_slot(game, CoreConfig::default(), CaptureSlot::global()).map_err(to_js)
    }

    pub fn get_phase(&self) -> GamePhase {
        self.game.phase()
    }

    pub fn get_score(&self) -> u32 {
        self.game.scoreboard().score
    }

    pub fn get_lives(&self) -> u32 {
        self.game.scoreboard().lives
    }

    pub fn get_round(&self) -> u32 {
        self.game.scoreboard().round
    }

    pub fn configure(
        &mut self,
        hold_ms: Option<f64>,
        countdown_ms: Option<f64>,
        feedback_ms: Option<f64>,
    ) -> std::result::Result<(), JsValue> {
        self.try_configure(hold_ms, countdown_ms, feedback_ms)
            .map_err(to_js)
    }

    pub fn configure_json(&mut self, json: &str) -> std::result::Result<(), JsValue> {
        CoreConfig::from_json(json)
            .and_then(|config| self.game.reconfigure(config))
            .map_err(to_js)
    }

    pub fn start(&mut self, now_ms: f64) -> std::result::Result<String, JsValue> {
        self.try_start(now_ms).map_err(to_js)
    }

    pub fn capture_ready(&mut self) -> std::result::Result<String, JsValue> {
        self.try_event(ExternalEvent::CaptureReady).map_err(to_js)
    }

    pub fn capture_failed(&mut self, message: &str) -> std::result::Result<String, JsValue> {
        self.try_event(ExternalEvent::CaptureFailed(message.to_string()))
            .map_err(to_js)
    }

    pub fn content_ready(&mut self, json: &str) -> std::result::Result<String, JsValue> {
        self.try_event(ExternalEvent::ContentReady(json.to_string()))
            .map_err(to_js)
    }

    pub fn content_failed(&mut self, message: &str) -> std::result::Result<String, JsValue> {
        self.try_event(ExternalEvent::ContentFailed(message.to_string()))
            .map_err(to_js)
    }

    pub fn quit(&mut self) -> std::result::Result<String, JsValue> {
        self.try_event(ExternalEvent::Quit).map_err(to_js)
    }

    /// Feed one pose-model frame; returns the tick output as JSON.
    pub fn process_frame(
        &mut self,
        frame_json: &str,
        now_ms: f64,
    ) -> std::result::Result<String, JsValue> {
        self.try_process_frame(frame_json, now_ms).map_err(to_js)
    }
}

impl ArcadeCoreRs {
    /// Build a game bound to a specific capture slot.
    pub fn with_slot(game: &str, config: CoreConfig, capture: CaptureSlot) -> Result<Self> {
        Ok(Self {
            game: build_game(game, config, capture)?,
        })
    }

    pub fn try_configure(
        &mut self,
        hold_ms: Option<f64>,
        countdown_ms: Option<f64>,
        feedback_ms: Option<f64>,
    ) -> Result<()> {
        let mut config = self.game.config().clone();
        if let Some(val) = hold_ms {
            config.hold.required_ms = val;
        }
        if let Some(val) = countdown_ms {
            config.game.countdown_ms = val;
        }
        if let Some(val) = feedback_ms {
            config.game.feedback_ms = val;
        }
        self.game.reconfigure(config)
    }

    pub fn try_start(&mut self, now_ms: f64) -> Result<String> {
        let effects = self.game.start(now_ms)?;
        encode(&effects)
    }

    pub fn try_event(&mut self, event: ExternalEvent<String>) -> Result<String> {
        encode(&self.game.handle(event))
    }

    pub fn try_process_frame(&mut self, frame_json: &str, now_ms: f64) -> Result<String> {
        let frame = FrameResult::from_json(frame_json)?;
        encode(&self.game.tick(&frame, now_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::fixtures::*;

    fn core(game: &str) -> ArcadeCoreRs {
        ArcadeCoreRs::with_slot(game, CoreConfig::default(), CaptureSlot::new()).unwrap()
    }

    fn frame_json(hands: Vec<Hand>) -> String {
        serde_json::to_string(&FrameResult::new(hands)).unwrap()
    }

    #[test]
    fn test_unknown_game_is_rejected() {
        let err = ArcadeCoreRs::with_slot("pong", CoreConfig::default(), CaptureSlot::new());
        assert!(matches!(err, Err(CoreError::InvalidConfig(_))));
    }

    #[test]
    fn test_finger_math_through_json() {
        let mut core = core("finger_math");
        assert_eq!(core.get_phase(), GamePhase::Idle);
        core.try_configure(Some(500.0), Some(100.0), None).unwrap();

        let effects = core.try_start(0.0).unwrap();
        assert!(effects.contains("\"to\":\"Loading\""));
        core.try_event(ExternalEvent::CaptureReady).unwrap();
        assert_eq!(core.get_phase(), GamePhase::ReadyCheck);

        let ten = frame_json(vec![open_palm(Handedness::Left), open_palm(Handedness::Right)]);
        core.try_process_frame(&ten, 0.0).unwrap();
        core.try_process_frame(&ten, 1000.0).unwrap();
        assert_eq!(core.get_phase(), GamePhase::Countdown);

        let out = core.try_process_frame(&frame_json(vec![]), 1100.0).unwrap();
        assert!(out.contains("request_content"));
        assert_eq!(core.get_phase(), GamePhase::Active);
        assert_eq!(core.get_round(), 1);

        core.try_event(ExternalEvent::ContentReady(
            r#"{"prompt": "1 + 2", "answer": 3}"#.to_string(),
        ))
        .unwrap();
        let three = frame_json(vec![with_fingers(Handedness::Right, 3)]);
        core.try_process_frame(&three, 1200.0).unwrap();
        core.try_process_frame(&three, 1700.0).unwrap();
        assert_eq!(core.get_phase(), GamePhase::Feedback);
        assert_eq!(core.get_score(), 1);
    }

    #[test]
    fn test_unreadable_content_ends_the_game() {
        let mut core = core("finger_math");
        core.try_start(0.0).unwrap();
        core.try_event(ExternalEvent::CaptureReady).unwrap();
        let ten = frame_json(vec![open_palm(Handedness::Left), open_palm(Handedness::Right)]);
        core.try_process_frame(&ten, 0.0).unwrap();
        core.try_process_frame(&ten, 1000.0).unwrap();
        core.try_process_frame(&frame_json(vec![]), 4000.0).unwrap();
        assert_eq!(core.get_phase(), GamePhase::Active);

        let effects = core.try_event(ExternalEvent::ContentReady("{".into())).unwrap();
        assert!(effects.contains("unreadable content"));
        assert_eq!(core.get_phase(), GamePhase::Idle);
    }

    #[test]
    fn test_encode_failure_is_not_a_frame_error() {
        struct Unencodable;

        impl Serialize for Unencodable {
            fn serialize<S: serde::Serializer>(
                &self,
                _serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("no encoding"))
            }
        }

        assert!(matches!(encode(&Unencodable), Err(CoreError::Encode(_))));
    }

    #[test]
    fn test_bad_frame_json_is_an_error() {
        let mut core = core("target_tap");
        assert!(matches!(
            core.try_process_frame("not json", 0.0),
            Err(CoreError::InvalidFrame(_))
        ));
    }

    #[test]
    fn test_configure_rejected_mid_game() {
        let mut core = core("air_canvas");
        core.try_start(0.0).unwrap();
        assert!(matches!(
            core.try_configure(Some(1000.0), None, None),
            Err(CoreError::InvalidPhase { .. })
        ));
        core.try_event(ExternalEvent::Quit).unwrap();
        assert_eq!(core.get_phase(), GamePhase::Idle);
        core.try_configure(Some(1000.0), None, None).unwrap();
    }
}
