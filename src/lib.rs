//! Turn-based resource-economy grid simulation for evaluating decision-making agents.

pub mod actions;
pub mod config;
pub mod economy;
pub mod engine;
pub mod error;
pub mod events;
pub mod game;
pub mod ledger;
pub mod mapgen;
pub mod observation;
pub mod registry;
pub mod replay;
pub mod rng;
pub mod scoring;
pub mod spatial;
pub mod systems;
pub mod world;

pub use actions::{ActionEffect, ActionKind, ActionReport, ActionRequest, ActionResult};
pub use config::{ConfigError, GameConfig};
pub use engine::{System, SystemContext, TurnController, TurnResult};
pub use error::{ErrorKind, GameError};
pub use events::{Event, EventKind};
pub use game::{EndReason, GameState, GameStatus};
pub use observation::Observation;
pub use registry::{GameId, GameRegistry, RegistryError};
pub use scoring::ScoreBreakdown;
pub use spatial::TilePos;
pub use world::{BuildingKind, ResourceKind, Resources, Terrain};

pub fn new_game(config: GameConfig) -> Result<GameState, ConfigError> {
    GameState::new(config)
}

pub fn apply_action(state: &mut GameState, request: &ActionRequest) -> ActionResult {
    state.apply_action(request)
}

pub fn advance_turn(state: &mut GameState) -> Result<TurnResult, GameError> {
    state.advance_turn()
}

pub fn observe(state: &GameState, simple: bool) -> Observation {
    observation::observe(state, simple)
}

pub fn score(state: &GameState) -> ScoreBreakdown {
    scoring::score(state)
}
