use serde::{Deserialize, Serialize};

use crate::spatial::TilePos;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Explored,
    Expanded,
    Exploited,
    Built,
    Researched,
    Migrated,
    Starvation,
    Depopulated,
    Drought,
    Harvest,
    Discovery,
    Plague,
    Victory,
    Defeat,
    TurnLimit,
}

/// One entry of the game log. Never mutated after it is pushed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub turn: u32,
    pub kind: EventKind,
    pub description: String,
    pub tiles: Vec<TilePos>,
}

impl Event {
    pub fn new(turn: u32, kind: EventKind, description: impl Into<String>) -> Self {
        Self {
            turn,
            kind,
            description: description.into(),
            tiles: Vec::new(),
        }
    }

    pub fn at(mut self, pos: TilePos) -> Self {
        self.tiles.push(pos);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct EventLog {
    entries: Vec<Event>,
}

impl EventLog {
    pub fn push(&mut self, event: Event) {
        self.entries.push(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = Event>) {
        self.entries.extend(events);
    }

    pub fn all(&self) -> &[Event] {
        &self.entries
    }

    /// The last `count` events, oldest first
    pub fn tail(&self, count: usize) -> &[Event] {
        let start = self.entries.len().saturating_sub(count);
        &self.entries[start..]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
