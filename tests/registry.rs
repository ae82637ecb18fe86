use std::sync::Arc;
use std::thread;

use x4sim::{ActionRequest, GameConfig, GameRegistry, Observation, RegistryError};

fn config(seed: u64) -> GameConfig {
    let mut config = GameConfig::default();
    config.seed = seed;
    config.map.width = 4;
    config.map.height = 4;
    config
}

#[test]
fn games_are_isolated() {
    let registry = GameRegistry::default();
    let busy = registry.create(config(1)).unwrap();
    let idle = registry.create(config(1)).unwrap();

    registry
        .apply_action(busy, &ActionRequest::research())
        .unwrap()
        .unwrap();
    registry.advance_turn(busy).unwrap().unwrap();

    let busy_view = registry.observe(busy, true).unwrap();
    let idle_view = registry.observe(idle, true).unwrap();
    let (Observation::Simple(busy_view), Observation::Simple(idle_view)) = (busy_view, idle_view)
    else {
        panic!("expected simple observations");
    };
    assert_eq!(busy_view.turn, 2);
    assert_eq!(idle_view.turn, 1);
    assert_eq!(idle_view.stock.metal, 20);
    assert_eq!(busy_view.stock.metal, 5);
}

#[test]
fn rejections_pass_through_as_game_errors() {
    let registry = GameRegistry::default();
    let id = registry.create(config(2)).unwrap();

    let outcome = registry
        .apply_action(id, &ActionRequest::explore(9, 9))
        .unwrap();
    assert!(outcome.is_err());
    assert_eq!(registry.score(id).unwrap().resource_efficiency, 0.0);
}

#[test]
fn parallel_games_progress_independently() {
    let registry = Arc::new(GameRegistry::new(8));
    let ids: Vec<_> = (0..4)
        .map(|seed| registry.create(config(seed)).unwrap())
        .collect();

    let handles: Vec<_> = ids
        .iter()
        .map(|&id| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..10 {
                    registry.advance_turn(id).unwrap().unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for id in ids {
        let turn = registry.with_game(id, |state| state.turn()).unwrap();
        assert_eq!(turn, 11);
    }
}

#[test]
fn removed_game_is_unknown() {
    let registry = GameRegistry::default();
    let id = registry.create(config(3)).unwrap();
    registry.remove(id).unwrap();

    assert!(matches!(
        registry.advance_turn(id),
        Err(RegistryError::UnknownGame(_))
    ));
    assert!(matches!(registry.remove(id), Err(RegistryError::UnknownGame(_))));
}
