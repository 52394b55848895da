//! Integration tests for the turn orchestrator, status effects and monster AI.

use delve::{
    apply_effect, decide, process_effects, process_turn, AiAction, AiState, EffectOutcome,
    Entity, EntityId, EntityStore, GameEvent, GameMap, MonsterTemplate, Position, StatusEffect,
    StatusEffectKind,
};
use rand::{rngs::StdRng, SeedableRng};

fn open_world(player_at: Position) -> (EntityStore, GameMap, EntityId) {
    let mut store = EntityStore::new();
    let player = store.spawn(Entity::player(player_at));
    (store, GameMap::open_room(40, 40), player)
}

/// Poison for 3 per tick over 2 turns on a 10 HP entity.
#[test]
fn test_poison_ticks_then_expires() {
    let mut store = EntityStore::new();
    let orc = store.spawn(
        Entity::monster(&MonsterTemplate::ORC, Position::new(3, 3)).with_health(10),
    );
    let mut events: Vec<GameEvent> = Vec::new();
    apply_effect(&mut store, orc, StatusEffect::Poison { damage: 3 }, 2, &mut events)
        .expect("poison applies");
    events.clear();

    let outcome = process_effects(&mut store, orc, &mut events).expect("first tick");
    assert_eq!(outcome, EffectOutcome::Survived);
    let entity = store.entity(orc).expect("orc alive");
    assert_eq!(entity.health().expect("health").current(), 7);
    let poison = entity
        .status_effects
        .as_ref()
        .and_then(|effects| effects.get(StatusEffectKind::Poison))
        .copied()
        .expect("still poisoned");
    assert_eq!(poison.remaining, 1);

    events.clear();
    process_effects(&mut store, orc, &mut events).expect("second tick");
    let entity = store.entity(orc).expect("orc alive");
    assert_eq!(entity.health().expect("health").current(), 4);
    assert!(!entity.has_status(StatusEffectKind::Poison));
    assert!(events.iter().any(|event| matches!(
        event,
        GameEvent::EffectExpired { kind: StatusEffectKind::Poison, .. }
    )));
}

#[test]
fn test_lethal_tick_removes_every_effect() {
    let mut store = EntityStore::new();
    let rat = store.spawn(Entity::monster(&MonsterTemplate::RAT, Position::new(3, 3)));
    let mut events: Vec<GameEvent> = Vec::new();
    apply_effect(&mut store, rat, StatusEffect::Confusion, 5, &mut events).expect("confuse");
    apply_effect(&mut store, rat, StatusEffect::Poison { damage: 50 }, 5, &mut events)
        .expect("poison");
    events.clear();

    let outcome = process_effects(&mut store, rat, &mut events).expect("tick");
    assert_eq!(outcome, EffectOutcome::Died);
    let entity = store.entity(rat).expect("still in the store until death is handled");
    assert!(entity.status_effects.as_ref().map_or(true, |effects| effects.is_empty()));
    assert!(!events
        .iter()
        .any(|event| matches!(event, GameEvent::EffectTicked { entity, .. } if *entity == rat)));
}

/// A monster at Manhattan distance 9 chases and closes in.
#[test]
fn test_distant_monster_steps_closer() {
    let map = GameMap::open_room(30, 30);
    let player = Position::new(5, 5);
    let orc = Entity::monster(&MonsterTemplate::ORC, Position::new(5, 14));
    let mut rng = StdRng::seed_from_u64(3);

    let decision = decide(&orc, player, &map, &mut rng).expect("orc has ai");
    assert_eq!(decision.state, AiState::Chase);
    let AiAction::MoveTo(step) = decision.action else {
        panic!("expected a move, got {:?}", decision.action);
    };
    assert_eq!(step.manhattan_distance(player), 8);
}

#[test]
fn test_monster_killed_by_effects_is_not_acted_on_again() {
    let (mut store, map, player) = open_world(Position::new(2, 2));
    let doomed = store.spawn(Entity::monster(&MonsterTemplate::RAT, Position::new(20, 20)));
    let survivor = store.spawn(Entity::monster(&MonsterTemplate::ORC, Position::new(25, 25)));
    let mut events: Vec<GameEvent> = Vec::new();
    apply_effect(&mut store, doomed, StatusEffect::Poison { damage: 10 }, 3, &mut events)
        .expect("poison");

    let mut rng = StdRng::seed_from_u64(9);
    let first = process_turn(&mut store, &map, player, 1, &mut rng, &mut events).expect("turn 1");
    assert_eq!(first.monster_deaths, vec![doomed]);
    assert!(!store.contains(doomed));

    let second = process_turn(&mut store, &map, player, 2, &mut rng, &mut events).expect("turn 2");
    let acted: Vec<EntityId> = second.monster_actions.iter().map(|(id, _)| *id).collect();
    assert_eq!(acted, vec![survivor]);
}

#[test]
fn test_player_death_stops_the_turn() {
    let (mut store, map, player) = open_world(Position::new(5, 5));
    store
        .entity_mut(player)
        .expect("player")
        .health_mut()
        .expect("health")
        .set_current(2);
    let first = store.spawn(Entity::monster(&MonsterTemplate::TROLL, Position::new(5, 6)));
    let second = store.spawn(Entity::monster(&MonsterTemplate::TROLL, Position::new(6, 5)));
    let mut events: Vec<GameEvent> = Vec::new();
    let mut rng = StdRng::seed_from_u64(1);

    let summary = process_turn(&mut store, &map, player, 1, &mut rng, &mut events).expect("turn");
    assert!(summary.player_died);
    assert_eq!(summary.monster_actions, vec![(first, AiAction::Attack)]);
    assert!(!summary.monster_actions.iter().any(|(id, _)| *id == second));
    assert_eq!(events.last(), Some(&GameEvent::GameOver));
}

#[test]
fn test_poisoned_player_dies_before_monsters_act() {
    let (mut store, map, player) = open_world(Position::new(5, 5));
    store.spawn(Entity::monster(&MonsterTemplate::ORC, Position::new(5, 6)));
    let mut events: Vec<GameEvent> = Vec::new();
    apply_effect(&mut store, player, StatusEffect::Poison { damage: 99 }, 3, &mut events)
        .expect("poison");
    let mut rng = StdRng::seed_from_u64(1);

    let summary = process_turn(&mut store, &map, player, 1, &mut rng, &mut events).expect("turn");
    assert!(summary.player_died);
    assert!(summary.monster_actions.is_empty());
}

#[test]
fn test_same_seed_same_turns() {
    let run = |seed: u64| {
        let (mut store, map, player) = open_world(Position::new(10, 10));
        for x in [4, 8, 12] {
            let id = store.spawn(Entity::monster(&MonsterTemplate::RAT, Position::new(x, 14)));
            let mut sink: Vec<GameEvent> = Vec::new();
            apply_effect(&mut store, id, StatusEffect::Confusion, 4, &mut sink).expect("confuse");
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let mut events: Vec<GameEvent> = Vec::new();
        for turn in 1..=6 {
            process_turn(&mut store, &map, player, turn, &mut rng, &mut events).expect("turn");
        }
        events
    };
    assert_eq!(run(77), run(77));
}
