use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Category of a rejected kernel call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidTarget,
    InsufficientResources,
    InsufficientActionPoints,
    InvalidState,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidTarget => "invalid_target",
            ErrorKind::InsufficientResources => "insufficient_resources",
            ErrorKind::InsufficientActionPoints => "insufficient_action_points",
            ErrorKind::InvalidState => "invalid_state",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-fatal rejection of an action or turn advance. The game state is left
/// exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind}: {message}")]
pub struct GameError {
    pub kind: ErrorKind,
    pub message: String,
}

impl GameError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_target(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidTarget, message)
    }

    pub fn insufficient_resources(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InsufficientResources, message)
    }

    pub fn insufficient_action_points(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InsufficientActionPoints, message)
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidState, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_wire_format() {
        let err = GameError::insufficient_action_points("need 3, have 1");
        assert_eq!(err.to_string(), "insufficient_action_points: need 3, have 1");

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "insufficient_action_points");
        assert_eq!(json["message"], "need 3, have 1");
    }
}
