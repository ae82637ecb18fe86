//! Multi-dimensional game score. Safe to compute at any point; after the game
//! ends it is the final result.

use serde::Serialize;

use crate::actions::ActionKind;
use crate::game::GameState;
use crate::ledger::ActionCounts;

/// Sub-scores each normalised to [0, 1], plus their weighted sum
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub resource_efficiency: f64,
    pub population_health: f64,
    pub goal_progress: f64,
    pub strategy_diversity: f64,
    pub total: f64,
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        (numerator / denominator).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Shannon entropy of the action mix, divided by the entropy of a perfectly even mix
pub fn strategy_diversity(counts: &ActionCounts) -> f64 {
    let total = f64::from(counts.total());
    if total == 0.0 {
        return 0.0;
    }
    let entropy: f64 = ActionKind::ALL
        .into_iter()
        .map(|kind| f64::from(counts.get(kind)))
        .filter(|count| *count > 0.0)
        .map(|count| {
            let p = count / total;
            -p * p.log2()
        })
        .sum();
    let max_entropy = (ActionKind::ALL.len() as f64).log2();
    ratio(entropy, max_entropy)
}

pub fn score(state: &GameState) -> ScoreBreakdown {
    let config = state.config();
    let ledger = state.ledger();

    let spent = ledger.action_points_spent as f64;
    let resource_efficiency = if spent > 0.0 {
        let per_point = ledger.cumulative_production.total() as f64 / spent;
        ratio(per_point, config.scoring.efficiency_reference)
    } else {
        0.0
    };
    let population_health = ratio(
        ledger.total_population as f64,
        state.grid().max_population() as f64,
    );
    let goal_progress = ratio(
        ledger.stock.metal as f64,
        config.victory.metal_target as f64,
    );
    let strategy_diversity = strategy_diversity(&ledger.action_counts);

    let weights = &config.scoring.weights;
    let total = weights.resource_efficiency * resource_efficiency
        + weights.population_health * population_health
        + weights.goal_progress * goal_progress
        + weights.strategy_diversity * strategy_diversity;

    ScoreBreakdown {
        resource_efficiency,
        population_health,
        goal_progress,
        strategy_diversity,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    #[test]
    fn diversity_bounds() {
        assert_eq!(strategy_diversity(&ActionCounts::default()), 0.0);

        let single = ActionCounts {
            explore: 9,
            ..ActionCounts::default()
        };
        assert_eq!(strategy_diversity(&single), 0.0);

        let even = ActionCounts {
            explore: 2,
            expand: 2,
            exploit: 2,
            build: 2,
            research: 2,
            migrate: 2,
        };
        assert!((strategy_diversity(&even) - 1.0).abs() < 1e-12);

        let two = ActionCounts {
            explore: 1,
            build: 1,
            ..ActionCounts::default()
        };
        assert!((strategy_diversity(&two) - 1.0 / 6f64.log2()).abs() < 1e-12);
    }

    #[test]
    fn fresh_game_score() {
        let state = GameState::new(GameConfig::default()).unwrap();
        let breakdown = score(&state);

        assert_eq!(breakdown.resource_efficiency, 0.0);
        assert_eq!(breakdown.strategy_diversity, 0.0);
        // 20 settlers on one tile of capacity 100
        assert!((breakdown.population_health - 0.2).abs() < 1e-12);
        assert!((breakdown.goal_progress - 0.02).abs() < 1e-12);
        assert!((breakdown.total - (0.2 * 0.2 + 0.4 * 0.02)).abs() < 1e-12);
    }
}
