use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    config::{ConfigError, GameConfig},
    engine::TurnController,
    events::EventLog,
    ledger::Ledger,
    mapgen,
    rng::{RngManager, MAP_STREAM},
    spatial::TilePos,
    world::{Tile, World, WorldGrid},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Victory,
    Defeat,
    TurnLimit,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EndReason::Victory => "victory",
            EndReason::Defeat => "defeat",
            EndReason::TurnLimit => "turn_limit",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum GameStatus {
    Active,
    Ended(EndReason),
}

impl GameStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, GameStatus::Active)
    }
}

/// Turn counter and the action-point budget of the current turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameClock {
    pub turn: u32,
    pub action_points: u32,
    pub max_action_points: u32,
    pub max_turns: u32,
}

/// Aggregate root of one game. Owns the grid, clock, ledger, log and random
/// streams; nothing inside is shared with another game.
#[derive(Debug, Serialize)]
pub struct GameState {
    pub(crate) config: GameConfig,
    pub(crate) world: World,
    pub(crate) clock: GameClock,
    pub(crate) events: EventLog,
    pub(crate) status: GameStatus,
    #[serde(skip)]
    pub(crate) rng: RngManager,
    #[serde(skip)]
    pub(crate) controller: TurnController,
}

impl GameState {
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        Self::with_controller(config, TurnController::standard())
    }

    /// Build a game whose ticks run `controller` instead of the standard pipeline
    pub fn with_controller(
        config: GameConfig,
        controller: TurnController,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = RngManager::new(config.seed);
        let grid = mapgen::generate(&config, &mut rng.stream(MAP_STREAM))?;
        let clock = GameClock {
            turn: 1,
            action_points: config.turns.action_points,
            max_action_points: config.turns.action_points,
            max_turns: config.turns.max_turns,
        };
        info!(
            target: "x4sim::turn",
            name = %config.name,
            seed = config.seed,
            width = config.map.width,
            height = config.map.height,
            "game created"
        );
        Ok(Self {
            world: World::new(grid),
            clock,
            events: EventLog::default(),
            status: GameStatus::Active,
            rng,
            controller,
            config,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn grid(&self) -> &WorldGrid {
        &self.world.grid
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn turn(&self) -> u32 {
        self.clock.turn
    }

    pub fn action_points(&self) -> u32 {
        self.clock.action_points
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        !self.status.is_active()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn ledger(&self) -> &Ledger {
        &self.world.ledger
    }

    pub fn research_level(&self) -> u32 {
        self.world.research_level
    }

    pub fn tile(&self, pos: TilePos) -> Option<&Tile> {
        self.world.grid.tile(pos)
    }

    /// Direct tile access for scenario setup. Call [`GameState::refresh_ledger`]
    /// afterwards so the aggregates match the grid again.
    pub fn tile_mut(&mut self, pos: TilePos) -> Option<&mut Tile> {
        self.world.grid.tile_mut(pos)
    }

    pub fn refresh_ledger(&mut self) {
        self.world.refresh_ledger();
    }
}
