use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::{
    config::GameConfig,
    error::GameError,
    events::{Event, EventKind},
    game::{EndReason, GameState, GameStatus},
    rng::{RngManager, SystemRng},
    systems::{HazardSystem, ProductionSystem, SmeltingSystem, UpkeepSystem},
    world::World,
};

pub struct SystemContext<'a> {
    pub turn: u32,
    pub config: &'a GameConfig,
}

/// One phase of the economy tick.
pub trait System: Send {
    fn name(&self) -> &'static str;

    /// Random stream this system draws from
    fn stream(&self) -> &'static str {
        self.name()
    }

    fn run(
        &mut self,
        ctx: &SystemContext<'_>,
        world: &mut World,
        rng: &mut SystemRng<'_>,
        events: &mut Vec<Event>,
    );
}

/// Ordered tick pipeline. Systems run in insertion order, each over the grid in
/// row-major order.
pub struct TurnController {
    systems: Vec<Box<dyn System>>,
}

impl TurnController {
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
        }
    }

    /// production, smelting, upkeep, hazards
    pub fn standard() -> Self {
        Self::new()
            .with_system(ProductionSystem::new())
            .with_system(SmeltingSystem::new())
            .with_system(UpkeepSystem::new())
            .with_system(HazardSystem::new())
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.push_system(system);
        self
    }

    pub fn push_system(&mut self, system: impl System + 'static) {
        self.systems.push(Box::new(system));
    }

    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|system| system.name()).collect()
    }

    pub fn run(
        &mut self,
        ctx: &SystemContext<'_>,
        world: &mut World,
        rng: &mut RngManager,
    ) -> Vec<Event> {
        let mut events = Vec::new();
        for system in &mut self.systems {
            let mut stream = rng.stream(system.stream());
            system.run(ctx, world, &mut stream, &mut events);
        }
        events
    }
}

impl Default for TurnController {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for TurnController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnController")
            .field("systems", &self.system_names())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnResult {
    pub new_turn_number: u32,
    pub events_this_tick: Vec<Event>,
    pub termination: Option<EndReason>,
}

/// Defeat wins over victory, which wins over the turn limit.
pub fn evaluate_termination(
    world: &World,
    resolved_turn: u32,
    config: &GameConfig,
) -> Option<EndReason> {
    if world.ledger.total_population == 0 {
        Some(EndReason::Defeat)
    } else if world.ledger.stock.metal >= config.victory.metal_target {
        Some(EndReason::Victory)
    } else if resolved_turn > config.turns.max_turns {
        Some(EndReason::TurnLimit)
    } else {
        None
    }
}

fn terminal_event(turn: u32, reason: EndReason, world: &World, config: &GameConfig) -> Event {
    let (kind, description) = match reason {
        EndReason::Victory => (
            EventKind::Victory,
            format!(
                "Metal stock reached {} of {}",
                world.ledger.stock.metal, config.victory.metal_target
            ),
        ),
        EndReason::Defeat => (
            EventKind::Defeat,
            "The last inhabitants are gone".to_string(),
        ),
        EndReason::TurnLimit => (
            EventKind::TurnLimit,
            format!("Turn limit of {} exhausted", config.turns.max_turns),
        ),
    };
    Event::new(turn, kind, description)
}

impl GameState {
    /// Resolve the current turn: run the tick pipeline, refill action points and
    /// check for the end of the game.
    pub fn advance_turn(&mut self) -> Result<TurnResult, GameError> {
        if let GameStatus::Ended(reason) = self.status {
            debug!(target: "x4sim::turn", turn = self.clock.turn, %reason, "advance rejected");
            return Err(GameError::invalid_state(format!(
                "game has already ended ({reason})"
            )));
        }

        let resolved = self.clock.turn;
        let ctx = SystemContext {
            turn: resolved,
            config: &self.config,
        };
        let mut events = self.controller.run(&ctx, &mut self.world, &mut self.rng);
        self.world.refresh_ledger();
        self.clock.action_points = self.clock.max_action_points;
        self.clock.turn += 1;

        let termination = evaluate_termination(&self.world, resolved, &self.config);
        if let Some(reason) = termination {
            self.status = GameStatus::Ended(reason);
            events.push(terminal_event(resolved, reason, &self.world, &self.config));
            info!(
                target: "x4sim::turn",
                turn = resolved,
                %reason,
                metal = self.world.ledger.stock.metal,
                population = self.world.ledger.total_population,
                "game ended"
            );
        }

        debug!(
            target: "x4sim::turn",
            turn = resolved,
            population = self.world.ledger.total_population,
            metal = self.world.ledger.stock.metal,
            food = self.world.ledger.stock.food,
            events = events.len(),
            "turn resolved"
        );
        self.events.extend(events.iter().cloned());

        Ok(TurnResult {
            new_turn_number: self.clock.turn,
            events_this_tick: events,
            termination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::TilePos;

    struct CountingSystem {
        runs: u32,
    }

    impl System for CountingSystem {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn run(
            &mut self,
            ctx: &SystemContext<'_>,
            _world: &mut World,
            _rng: &mut SystemRng<'_>,
            events: &mut Vec<Event>,
        ) {
            self.runs += 1;
            events.push(Event::new(ctx.turn, EventKind::Harvest, "tick"));
        }
    }

    #[test]
    fn standard_pipeline_order() {
        assert_eq!(
            TurnController::standard().system_names(),
            vec!["production", "smelting", "upkeep", "hazards"]
        );
    }

    #[test]
    fn custom_pipeline_runs_each_tick() {
        let controller = TurnController::new().with_system(CountingSystem { runs: 0 });
        let mut state = GameState::with_controller(GameConfig::default(), controller).unwrap();

        let first = state.advance_turn().unwrap();
        assert_eq!(first.new_turn_number, 2);
        assert_eq!(first.events_this_tick.len(), 1);
        assert_eq!(first.events_this_tick[0].turn, 1);

        state.advance_turn().unwrap();
        assert_eq!(state.events().len(), 2);
    }

    #[test]
    fn advance_refills_action_points() {
        let mut state = GameState::new(GameConfig::default()).unwrap();
        state.clock.action_points = 0;

        state.advance_turn().unwrap();
        assert_eq!(state.action_points(), state.clock().max_action_points);
    }

    #[test]
    fn defeat_takes_precedence() {
        let mut config = GameConfig::default();
        config.turns.max_turns = 1;
        config.victory.metal_target = 10;
        let mut state = GameState::new(config).unwrap();
        let start = state.config().map.start_position();
        if let Some(tile) = state.tile_mut(start) {
            tile.population = 0;
        }
        state.refresh_ledger();

        let result = state.advance_turn().unwrap();
        assert_eq!(result.termination, Some(EndReason::Defeat));
        assert_eq!(state.status(), GameStatus::Ended(EndReason::Defeat));
        assert_eq!(
            result.events_this_tick.last().map(|e| e.kind),
            Some(EventKind::Defeat)
        );
    }

    #[test]
    fn ended_game_rejects_advance_without_change() {
        let mut config = GameConfig::default();
        config.victory.metal_target = 20;
        let mut state = GameState::new(config).unwrap();

        let result = state.advance_turn().unwrap();
        assert_eq!(result.termination, Some(EndReason::Victory));

        let before = serde_json::to_string(&state).unwrap();
        let err = state.advance_turn().unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::InvalidState);
        assert_eq!(serde_json::to_string(&state).unwrap(), before);
        assert_eq!(state.tile(TilePos::new(0, 5)).map(|t| t.stock.metal), Some(20));
    }
}
