//! Recorded action traces and their deterministic replay.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::actions::{ActionReport, ActionRequest};
use crate::config::{ConfigError, GameConfig};
use crate::engine::TurnResult;
use crate::error::GameError;
use crate::game::GameState;
use crate::scoring::{score, ScoreBreakdown};

/// Pseudo action type that advances the turn instead of acting
pub const END_TURN: &str = "end_turn";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trace {
    pub steps: Vec<ActionRequest>,
}

impl Trace {
    pub fn new(steps: Vec<ActionRequest>) -> Self {
        Self { steps }
    }

    /// Read a trace from YAML, or JSON when the file ends in `.json`
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read trace file {}", path.display()))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let trace = if is_json {
            serde_json::from_str(&data)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            serde_yaml::from_str(&data)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        };
        Ok(trace)
    }

    pub fn push(&mut self, request: ActionRequest) {
        self.steps.push(request);
    }

    pub fn end_turn(&mut self) {
        self.steps.push(ActionRequest::new(END_TURN));
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum StepOutcome {
    Applied(ActionReport),
    Advanced(TurnResult),
    Rejected(GameError),
}

impl StepOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, StepOutcome::Rejected(_))
    }
}

#[derive(Debug)]
pub struct Replay {
    pub state: GameState,
    pub outcomes: Vec<StepOutcome>,
}

impl Replay {
    pub fn score(&self) -> ScoreBreakdown {
        score(&self.state)
    }

    pub fn rejected(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_rejected()).count()
    }
}

/// Apply one trace step to `state`
pub fn step(state: &mut GameState, request: &ActionRequest) -> StepOutcome {
    if request.action_type.trim().eq_ignore_ascii_case(END_TURN) {
        match state.advance_turn() {
            Ok(result) => StepOutcome::Advanced(result),
            Err(error) => StepOutcome::Rejected(error),
        }
    } else {
        match state.apply_action(request) {
            Ok(report) => StepOutcome::Applied(report),
            Err(error) => StepOutcome::Rejected(error),
        }
    }
}

/// Start a fresh game from `config` and feed it every step of `trace`.
/// Rejected steps are recorded and the replay carries on.
pub fn run(config: GameConfig, trace: &Trace) -> Result<Replay, ConfigError> {
    let mut state = GameState::new(config)?;
    let outcomes = trace
        .steps
        .iter()
        .map(|request| step(&mut state, request))
        .collect();
    Ok(Replay { state, outcomes })
}

/// Advance until the game ends. Returns the number of turns resolved.
pub fn finish(state: &mut GameState) -> u32 {
    let mut resolved = 0;
    while state.advance_turn().is_ok() {
        resolved += 1;
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn end_turn_steps_advance_the_clock() {
        let mut trace = Trace::default();
        trace.push(ActionRequest::research());
        trace.end_turn();
        trace.push(ActionRequest::new("dance"));

        let replay = run(GameConfig::default(), &trace).unwrap();
        assert_eq!(replay.outcomes.len(), 3);
        assert!(matches!(replay.outcomes[0], StepOutcome::Applied(_)));
        assert!(matches!(replay.outcomes[1], StepOutcome::Advanced(_)));
        assert!(matches!(
            &replay.outcomes[2],
            StepOutcome::Rejected(error) if error.kind == ErrorKind::InvalidState
        ));
        assert_eq!(replay.state.turn(), 2);
        assert_eq!(replay.rejected(), 1);
    }

    #[test]
    fn finish_runs_to_turn_limit() {
        let mut config = GameConfig::default();
        config.turns.max_turns = 3;
        let mut state = GameState::new(config).unwrap();

        assert_eq!(finish(&mut state), 4);
        assert!(state.is_terminal());
    }

    #[test]
    fn trace_parses_yaml() {
        let trace: Trace = serde_yaml::from_str(
            "- action_type: explore\n  target_x: 1\n  target_y: 5\n- action_type: end_turn\n",
        )
        .unwrap();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace.steps[0], ActionRequest::explore(1, 5));
    }
}
