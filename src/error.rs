use std::fmt;

use crate::game::GamePhase;

/// Recoverable failures surfaced by the core.
///
/// None of these are retried internally; the caller decides whether to
/// start again.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Another game still holds the capture session.
    CaptureBusy,
    /// Camera permission denied or model load failure.
    CaptureFailed(String),
    /// The external content generator gave up.
    ContentFailed(String),
    InvalidConfig(String),
    InvalidFrame(String),
    /// Output could not be serialized for the host.
    Encode(String),
    InvalidPhase {
        expected: GamePhase,
        actual: GamePhase,
    },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CaptureBusy => write!(f, "capture session is already in use"),
            Self::CaptureFailed(msg) => write!(f, "capture failed: {msg}"),
            Self::ContentFailed(msg) => write!(f, "content generation failed: {msg}"),
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::InvalidFrame(msg) => write!(f, "invalid frame: {msg}"),
            Self::Encode(msg) => write!(f, "could not encode output: {msg}"),
            Self::InvalidPhase { expected, actual } => {
                write!(f, "expected phase {expected:?}, game is in {actual:?}")
            }
        }
    }
}

impl std::error::Error for CoreError {}

pub type Result<T> = std::result::Result<T, CoreError>;
