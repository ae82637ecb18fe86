//! Action engine: request parsing, validation and atomic application.
//!
//! Every action kind is described by one entry of [`RULES`]. Validation is a
//! read-only pass producing a [`Plan`]; only a complete plan is committed, and
//! committing cannot fail, so a rejected request never leaves a trace.

mod rules;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GameError;
use crate::events::{Event, EventKind};
use crate::game::{GameState, GameStatus};
use crate::spatial::TilePos;
use crate::world::{BuildingKind, Resources, Terrain};

pub use rules::{rule_for, ActionRule, RULES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Explore,
    Expand,
    Exploit,
    Build,
    Research,
    Migrate,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::Explore,
        ActionKind::Expand,
        ActionKind::Exploit,
        ActionKind::Build,
        ActionKind::Research,
        ActionKind::Migrate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Explore => "explore",
            ActionKind::Expand => "expand",
            ActionKind::Exploit => "exploit",
            ActionKind::Build => "build",
            ActionKind::Research => "research",
            ActionKind::Migrate => "migrate",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value))
    }

    pub fn event_kind(self) -> EventKind {
        match self {
            ActionKind::Explore => EventKind::Explored,
            ActionKind::Expand => EventKind::Expanded,
            ActionKind::Exploit => EventKind::Exploited,
            ActionKind::Build => EventKind::Built,
            ActionKind::Research => EventKind::Researched,
            ActionKind::Migrate => EventKind::Migrated,
        }
    }

    pub fn ap_cost(self) -> u32 {
        rule_for(self).ap_cost
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action as submitted by a client. Fields are loose on purpose: whatever is
/// missing or malformed for the given `action_type` is reported as a rejection
/// rather than a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionRequest {
    pub action_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_x: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_y: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub building_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_x: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_y: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
}

impl ActionRequest {
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            ..Self::default()
        }
    }

    fn targeted(kind: ActionKind, x: i64, y: i64) -> Self {
        Self {
            target_x: Some(x),
            target_y: Some(y),
            ..Self::new(kind.as_str())
        }
    }

    pub fn explore(x: i64, y: i64) -> Self {
        Self::targeted(ActionKind::Explore, x, y)
    }

    pub fn expand(x: i64, y: i64) -> Self {
        Self::targeted(ActionKind::Expand, x, y)
    }

    pub fn exploit(x: i64, y: i64) -> Self {
        Self::targeted(ActionKind::Exploit, x, y)
    }

    pub fn build(x: i64, y: i64, building: BuildingKind) -> Self {
        Self {
            building_type: Some(building.as_str().to_string()),
            ..Self::targeted(ActionKind::Build, x, y)
        }
    }

    pub fn research() -> Self {
        Self::new(ActionKind::Research.as_str())
    }

    /// Migrate into (x, y); the source defaults to the most populated neighbour
    pub fn migrate(x: i64, y: i64) -> Self {
        Self::targeted(ActionKind::Migrate, x, y)
    }

    pub fn from_source(mut self, x: i64, y: i64) -> Self {
        self.source_x = Some(x);
        self.source_y = Some(y);
        self
    }

    pub fn with_amount(mut self, amount: i64) -> Self {
        self.amount = Some(amount);
        self
    }
}

/// What a successful action changed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionEffect {
    Explored {
        pos: TilePos,
        terrain: Terrain,
        revealed: Resources,
    },
    Expanded {
        pos: TilePos,
        population: u32,
        cost: Resources,
    },
    Exploited {
        pos: TilePos,
        level: u8,
    },
    Built {
        pos: TilePos,
        building: BuildingKind,
        cost: Resources,
    },
    Researched {
        level: u32,
        multiplier: f64,
        cost: Resources,
    },
    Migrated {
        from: TilePos,
        to: TilePos,
        amount: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionReport {
    pub action: ActionKind,
    pub ap_spent: u32,
    pub action_points_remaining: u32,
    pub effect: ActionEffect,
    pub event: Event,
}

pub type ActionResult = Result<ActionReport, GameError>;

impl GameState {
    /// Validate and apply one action. On rejection the state is untouched.
    pub fn apply_action(&mut self, request: &ActionRequest) -> ActionResult {
        let outcome = self.try_apply(request);
        match &outcome {
            Ok(report) => debug!(
                target: "x4sim::actions",
                turn = self.clock.turn,
                action = %report.action,
                ap_left = report.action_points_remaining,
                "action applied"
            ),
            Err(error) => debug!(
                target: "x4sim::actions",
                turn = self.clock.turn,
                action = %request.action_type,
                x = ?request.target_x,
                y = ?request.target_y,
                %error,
                "action rejected"
            ),
        }
        outcome
    }

    fn try_apply(&mut self, request: &ActionRequest) -> ActionResult {
        if let GameStatus::Ended(reason) = self.status {
            return Err(GameError::invalid_state(format!(
                "game has already ended ({reason})"
            )));
        }
        let kind = ActionKind::parse(&request.action_type).ok_or_else(|| {
            GameError::invalid_state(format!("unknown action type '{}'", request.action_type))
        })?;
        let rule = rule_for(kind);
        if self.clock.action_points < rule.ap_cost {
            return Err(GameError::insufficient_action_points(format!(
                "{kind} needs {} action points, {} left",
                rule.ap_cost, self.clock.action_points
            )));
        }
        let target = if rule.needs_target {
            Some(self.resolve_target(request)?)
        } else {
            None
        };

        let plan = (rule.prepare)(self, request, target)?;
        let (effect, description, tiles) = plan.commit(self);

        self.clock.action_points -= rule.ap_cost;
        self.world.ledger.record_action(kind, rule.ap_cost);
        self.world.refresh_ledger();
        let event = Event {
            turn: self.clock.turn,
            kind: kind.event_kind(),
            description,
            tiles,
        };
        self.events.push(event.clone());

        Ok(ActionReport {
            action: kind,
            ap_spent: rule.ap_cost,
            action_points_remaining: self.clock.action_points,
            effect,
            event,
        })
    }

    fn resolve_target(&self, request: &ActionRequest) -> Result<TilePos, GameError> {
        let (Some(x), Some(y)) = (request.target_x, request.target_y) else {
            return Err(GameError::invalid_target(format!(
                "{} requires target_x and target_y",
                request.action_type
            )));
        };
        self.world
            .grid
            .shape()
            .checked_pos(x, y)
            .ok_or_else(|| GameError::invalid_target(format!("({x}, {y}) is outside the map")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parsing_is_lenient_on_case() {
        assert_eq!(ActionKind::parse("Explore"), Some(ActionKind::Explore));
        assert_eq!(ActionKind::parse(" migrate"), Some(ActionKind::Migrate));
        assert_eq!(ActionKind::parse("end_turn"), None);
    }

    #[test]
    fn action_point_costs() {
        let costs: Vec<u32> = ActionKind::ALL.iter().map(|k| k.ap_cost()).collect();
        assert_eq!(costs, vec![1, 2, 1, 2, 3, 1]);
    }

    #[test]
    fn request_deserializes_with_missing_fields() {
        let request: ActionRequest =
            serde_json::from_str(r#"{"action_type": "build", "target_x": 1}"#).unwrap();
        assert_eq!(request.action_type, "build");
        assert_eq!(request.target_x, Some(1));
        assert_eq!(request.target_y, None);
        assert_eq!(request.building_type, None);
    }

    #[test]
    fn builders_fill_expected_fields() {
        let request = ActionRequest::migrate(2, 1).from_source(1, 1).with_amount(3);
        assert_eq!(request.action_type, "migrate");
        assert_eq!(request.source_x, Some(1));
        assert_eq!(request.amount, Some(3));

        let build = ActionRequest::build(0, 0, BuildingKind::House);
        assert_eq!(build.building_type.as_deref(), Some("house"));
    }
}
