//! Hosting for many independent games. Each game sits behind its own mutex, so
//! calls against one game are serialized while different games proceed in
//! parallel.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use thiserror::Error;
use tracing::{debug, info};

use crate::actions::{ActionRequest, ActionResult};
use crate::config::{ConfigError, GameConfig};
use crate::engine::TurnResult;
use crate::error::GameError;
use crate::game::GameState;
use crate::observation::{observe, Observation};
use crate::scoring::{score, ScoreBreakdown};

pub const DEFAULT_MAX_GAMES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameId(u64);

impl GameId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "game-{:06}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown game {0}")]
    UnknownGame(GameId),
    #[error("registry is full ({0} games)")]
    Full(usize),
    #[error("lock poisoned for {0}")]
    Poisoned(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

type SharedGame = Arc<Mutex<GameState>>;

pub struct GameRegistry {
    games: RwLock<BTreeMap<GameId, SharedGame>>,
    next_id: AtomicU64,
    max_games: usize,
}

impl GameRegistry {
    pub fn new(max_games: usize) -> Self {
        Self {
            games: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            max_games,
        }
    }

    pub fn create(&self, config: GameConfig) -> Result<GameId, RegistryError> {
        let mut games = self
            .games
            .write()
            .map_err(|_| RegistryError::Poisoned("registry".to_string()))?;
        if games.len() >= self.max_games {
            return Err(RegistryError::Full(self.max_games));
        }
        let state = GameState::new(config)?;
        let id = GameId(self.next_id.fetch_add(1, Ordering::Relaxed));
        games.insert(id, Arc::new(Mutex::new(state)));
        info!(target: "x4sim::registry", game = %id, active = games.len(), "game registered");
        Ok(id)
    }

    fn game(&self, id: GameId) -> Result<SharedGame, RegistryError> {
        let games = self
            .games
            .read()
            .map_err(|_| RegistryError::Poisoned("registry".to_string()))?;
        games.get(&id).cloned().ok_or(RegistryError::UnknownGame(id))
    }

    /// Run `f` while holding the game's lock. The registry map itself is not
    /// locked during the call.
    pub fn with_game<T>(
        &self,
        id: GameId,
        f: impl FnOnce(&mut GameState) -> T,
    ) -> Result<T, RegistryError> {
        let game = self.game(id)?;
        let mut state = game
            .lock()
            .map_err(|_| RegistryError::Poisoned(id.to_string()))?;
        Ok(f(&mut state))
    }

    pub fn apply_action(
        &self,
        id: GameId,
        request: &ActionRequest,
    ) -> Result<ActionResult, RegistryError> {
        self.with_game(id, |state| state.apply_action(request))
    }

    pub fn advance_turn(&self, id: GameId) -> Result<Result<TurnResult, GameError>, RegistryError> {
        self.with_game(id, |state| state.advance_turn())
    }

    pub fn observe(&self, id: GameId, simple: bool) -> Result<Observation, RegistryError> {
        self.with_game(id, |state| observe(state, simple))
    }

    pub fn score(&self, id: GameId) -> Result<ScoreBreakdown, RegistryError> {
        self.with_game(id, |state| score(state))
    }

    pub fn remove(&self, id: GameId) -> Result<(), RegistryError> {
        let mut games = self
            .games
            .write()
            .map_err(|_| RegistryError::Poisoned("registry".to_string()))?;
        games.remove(&id).ok_or(RegistryError::UnknownGame(id))?;
        debug!(target: "x4sim::registry", game = %id, "game removed");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.games.read().map(|games| games.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<GameId> {
        self.games
            .read()
            .map(|games| games.keys().copied().collect())
            .unwrap_or_default()
    }
}

impl Default for GameRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_GAMES)
    }
}

impl fmt::Debug for GameRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameRegistry")
            .field("games", &self.len())
            .field("max_games", &self.max_games)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_and_formatted() {
        let registry = GameRegistry::default();
        let first = registry.create(GameConfig::default()).unwrap();
        let second = registry.create(GameConfig::default()).unwrap();

        assert_eq!(first.to_string(), "game-000001");
        assert_eq!(second.value(), 2);
        assert_eq!(registry.ids(), vec![first, second]);
    }

    #[test]
    fn capacity_is_enforced() {
        let registry = GameRegistry::new(1);
        registry.create(GameConfig::default()).unwrap();
        assert!(matches!(
            registry.create(GameConfig::default()),
            Err(RegistryError::Full(1))
        ));
    }

    #[test]
    fn unknown_and_removed_games() {
        let registry = GameRegistry::default();
        let id = registry.create(GameConfig::default()).unwrap();
        registry.remove(id).unwrap();

        assert!(registry.is_empty());
        assert!(matches!(
            registry.score(id),
            Err(RegistryError::UnknownGame(missing)) if missing == id
        ));
    }

    #[test]
    fn invalid_config_is_not_registered() {
        let registry = GameRegistry::default();
        let mut config = GameConfig::default();
        config.map.width = 0;

        assert!(matches!(
            registry.create(config),
            Err(RegistryError::Config(_))
        ));
        assert!(registry.is_empty());
    }
}
