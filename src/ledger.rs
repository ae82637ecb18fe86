use serde::Serialize;

use crate::actions::ActionKind;
use crate::world::{Resources, WorldGrid};

/// Successful actions per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActionCounts {
    pub explore: u32,
    pub expand: u32,
    pub exploit: u32,
    pub build: u32,
    pub research: u32,
    pub migrate: u32,
}

impl ActionCounts {
    pub fn get(&self, kind: ActionKind) -> u32 {
        match kind {
            ActionKind::Explore => self.explore,
            ActionKind::Expand => self.expand,
            ActionKind::Exploit => self.exploit,
            ActionKind::Build => self.build,
            ActionKind::Research => self.research,
            ActionKind::Migrate => self.migrate,
        }
    }

    pub fn increment(&mut self, kind: ActionKind) {
        let slot = match kind {
            ActionKind::Explore => &mut self.explore,
            ActionKind::Expand => &mut self.expand,
            ActionKind::Exploit => &mut self.exploit,
            ActionKind::Build => &mut self.build,
            ActionKind::Research => &mut self.research,
            ActionKind::Migrate => &mut self.migrate,
        };
        *slot += 1;
    }

    pub fn total(&self) -> u32 {
        ActionKind::ALL.into_iter().map(|kind| self.get(kind)).sum()
    }
}

/// Global aggregates and the running totals scoring reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ledger {
    pub stock: Resources,
    pub total_population: u64,
    /// Everything produced by ticks so far, smelted metal included
    pub cumulative_production: Resources,
    pub action_points_spent: u64,
    pub action_counts: ActionCounts,
}

impl Ledger {
    pub fn refresh(&mut self, grid: &WorldGrid) {
        self.stock = grid.aggregate_stock();
        self.total_population = grid.total_population();
    }

    pub fn record_action(&mut self, kind: ActionKind, ap_cost: u32) {
        self.action_points_spent += u64::from(ap_cost);
        self.action_counts.increment(kind);
    }

    pub fn record_production(&mut self, produced: &Resources) {
        self.cumulative_production.add(produced);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_action_tracks_spend_and_counts() {
        let mut ledger = Ledger::default();
        ledger.record_action(ActionKind::Build, 2);
        ledger.record_action(ActionKind::Build, 2);
        ledger.record_action(ActionKind::Research, 3);

        assert_eq!(ledger.action_points_spent, 7);
        assert_eq!(ledger.action_counts.get(ActionKind::Build), 2);
        assert_eq!(ledger.action_counts.get(ActionKind::Explore), 0);
        assert_eq!(ledger.action_counts.total(), 3);
    }
}
