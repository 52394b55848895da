//! # Turn Orchestrator
//!
//! Runs everything that happens after a turn-consuming player command, in a
//! fixed order:
//!
//! 1. status effects on the player; if the player dies the turn ends here
//! 2. every living monster, in creation order, decides and acts
//! 3. status effects on every monster still alive, in the same order
//!
//! The monster list is snapshotted before step 2, so monsters created during
//! the turn wait for the next one. A monster that dies at any point is
//! skipped for the rest of the pass.

use crate::{
    ai, combat, status, AiAction, AiState, DelveResult, EffectOutcome, EntityId, EntityStore,
    GameEvent, GameMap, MapQuery, NotificationSink, StatusEffectKind, WorldView,
};
use rand::Rng;

/// What happened during one turn.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TurnSummary {
    /// Turn number this summary belongs to
    pub turn: u64,
    /// Actions taken by monsters, in the order they acted
    pub monster_actions: Vec<(EntityId, AiAction)>,
    /// Monsters that died during the turn
    pub monster_deaths: Vec<EntityId>,
    /// The player died and the game is over
    pub player_died: bool,
}

impl TurnSummary {
    pub fn new(turn: u64) -> Self {
        Self {
            turn,
            ..Self::default()
        }
    }
}

/// Processes one full turn.
///
/// Call only when the player's command consumed a turn. Returns after the
/// whole pipeline has run, or as soon as the player dies.
pub fn process_turn<R: Rng + ?Sized>(
    store: &mut EntityStore,
    map: &GameMap,
    player: EntityId,
    turn: u64,
    rng: &mut R,
    sink: &mut impl NotificationSink,
) -> DelveResult<TurnSummary> {
    let mut summary = TurnSummary::new(turn);
    log::debug!("turn {} begins", turn);

    if status::process_effects(store, player, sink)? == EffectOutcome::Died {
        player_killed(store, player, None, &mut summary, sink)?;
        return Ok(summary);
    }

    let monsters = store.monster_ids();
    for &monster in &monsters {
        if !store.is_alive(monster) {
            continue;
        }
        let action = act(store, map, monster, player, rng, sink)?;
        summary.monster_actions.push((monster, action));

        if action == AiAction::Attack {
            let outcome = combat::resolve_attack(store, monster, player, sink)?;
            if outcome.defender_died {
                player_killed(store, player, Some(monster), &mut summary, sink)?;
                return Ok(summary);
            }
        }
    }

    for &monster in &monsters {
        if !store.is_alive(monster) {
            continue;
        }
        if status::process_effects(store, monster, sink)? == EffectOutcome::Died {
            combat::handle_death(store, monster, None, sink)?;
            summary.monster_deaths.push(monster);
        }
    }

    log::debug!(
        "turn {} done: {} monsters acted, {} died",
        turn,
        summary.monster_actions.len(),
        summary.monster_deaths.len()
    );
    Ok(summary)
}

/// Decides one monster's action, records its state and applies any move.
///
/// Attacks are returned for the caller to resolve.
fn act<R: Rng + ?Sized>(
    store: &mut EntityStore,
    map: &GameMap,
    monster: EntityId,
    player: EntityId,
    rng: &mut R,
    sink: &mut impl NotificationSink,
) -> DelveResult<AiAction> {
    let player_entity = store.entity(player)?;
    let player_position = player_entity.position;
    let player_hidden = player_entity.has_status(StatusEffectKind::Invisibility);

    let (decision, from, name) = {
        let entity = store.entity(monster)?;
        let view = WorldView::new(map, store, Some(monster));
        let mut decision = ai::decide(entity, player_position, &view, rng)?;
        if player_hidden
            && decision.state != AiState::Confused
            && decision.action != AiAction::NoAction
        {
            decision.action = ai::wander(entity.position, &view, rng);
        }
        (decision, entity.position, entity.name.clone())
    };

    let entity = store.entity_mut(monster)?;
    entity.ai_mut()?.state = decision.state;
    log::debug!("{} {:?}: {:?}", name, decision.state, decision.action);
    sink.notify(GameEvent::MonsterActed {
        monster,
        name,
        state: decision.state,
        action: decision.action,
    });

    if let AiAction::MoveTo(to) = decision.action {
        if to != from && WorldView::new(map, store, Some(monster)).is_walkable(to) {
            store.entity_mut(monster)?.position = to;
            sink.notify(GameEvent::EntityMoved {
                entity: monster,
                from,
                to,
            });
        }
    }
    Ok(decision.action)
}

fn player_killed(
    store: &mut EntityStore,
    player: EntityId,
    killer: Option<EntityId>,
    summary: &mut TurnSummary,
    sink: &mut impl NotificationSink,
) -> DelveResult<()> {
    combat::handle_death(store, player, killer, sink)?;
    summary.player_died = true;
    log::info!("player died on turn {}", summary.turn);
    sink.notify(GameEvent::GameOver);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{apply_effect, Entity, MonsterTemplate, Position, StatusEffect};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Fixture {
        store: EntityStore,
        map: GameMap,
        player: EntityId,
        rng: StdRng,
    }

    impl Fixture {
        fn new(player_at: Position) -> Self {
            let mut store = EntityStore::new();
            let player = store.spawn(Entity::player(player_at));
            Self {
                store,
                map: GameMap::open_room(30, 30),
                player,
                rng: StdRng::seed_from_u64(42),
            }
        }

        fn monster(&mut self, template: &MonsterTemplate, x: i32, y: i32) -> EntityId {
            self.store.spawn(Entity::monster(template, Position::new(x, y)))
        }

        fn run(&mut self, events: &mut Vec<GameEvent>) -> TurnSummary {
            process_turn(
                &mut self.store,
                &self.map,
                self.player,
                1,
                &mut self.rng,
                events,
            )
            .unwrap()
        }
    }

    #[test]
    fn test_player_poison_death_skips_monsters() {
        let mut fx = Fixture::new(Position::new(5, 5));
        let orc = fx.monster(&MonsterTemplate::ORC, 5, 6);
        let mut events: Vec<GameEvent> = Vec::new();
        apply_effect(
            &mut fx.store,
            fx.player,
            StatusEffect::Poison { damage: 100 },
            3,
            &mut events,
        )
        .unwrap();
        events.clear();

        let summary = fx.run(&mut events);
        assert!(summary.player_died);
        assert!(summary.monster_actions.is_empty());
        assert_eq!(fx.store.entity(orc).unwrap().ai_state(), Some(AiState::Idle));
        assert_eq!(events.last(), Some(&GameEvent::GameOver));
    }

    #[test]
    fn test_monsters_act_in_creation_order() {
        let mut fx = Fixture::new(Position::new(5, 5));
        let far = fx.monster(&MonsterTemplate::RAT, 5, 12);
        let near = fx.monster(&MonsterTemplate::RAT, 6, 5);
        let mut events: Vec<GameEvent> = Vec::new();

        let summary = fx.run(&mut events);
        let order: Vec<EntityId> = summary.monster_actions.iter().map(|(id, _)| *id).collect();
        assert_eq!(order, vec![far, near]);
        assert_eq!(summary.monster_actions[1].1, AiAction::Attack);
        assert_eq!(fx.store.entity(far).unwrap().position, Position::new(5, 11));
    }

    #[test]
    fn test_monster_killing_player_stops_turn() {
        let mut fx = Fixture::new(Position::new(5, 5));
        let troll = fx.monster(&MonsterTemplate::TROLL, 5, 6);
        let later = fx.monster(&MonsterTemplate::ORC, 9, 5);
        fx.store
            .entity_mut(fx.player)
            .unwrap()
            .health_mut()
            .unwrap()
            .set_current(1);

        let mut events: Vec<GameEvent> = Vec::new();
        let summary = fx.run(&mut events);
        assert!(summary.player_died);
        assert_eq!(summary.monster_actions, vec![(troll, AiAction::Attack)]);
        assert_eq!(fx.store.entity(later).unwrap().position, Position::new(9, 5));
        assert!(events.iter().any(|event| matches!(
            event,
            GameEvent::Died { killer: Some(k), .. } if *k == troll
        )));
    }

    #[test]
    fn test_monster_dying_to_poison_is_removed_once() {
        let mut fx = Fixture::new(Position::new(2, 2));
        let rat = fx.monster(&MonsterTemplate::RAT, 20, 20);
        let mut events: Vec<GameEvent> = Vec::new();
        apply_effect(&mut fx.store, rat, StatusEffect::Poison { damage: 50 }, 5, &mut events)
            .unwrap();
        events.clear();

        let summary = fx.run(&mut events);
        assert_eq!(summary.monster_deaths, vec![rat]);
        assert!(!fx.store.contains(rat));
        let deaths = events
            .iter()
            .filter(|event| matches!(event, GameEvent::Died { .. }))
            .count();
        assert_eq!(deaths, 1);
    }

    #[test]
    fn test_invisible_player_is_not_attacked() {
        let mut fx = Fixture::new(Position::new(5, 5));
        fx.monster(&MonsterTemplate::TROLL, 5, 6);
        let mut events: Vec<GameEvent> = Vec::new();
        apply_effect(&mut fx.store, fx.player, StatusEffect::Invisibility, 10, &mut events)
            .unwrap();

        // the effect expires during the player phase of the tenth turn
        for _ in 0..9 {
            let summary = fx.run(&mut events);
            assert!(summary
                .monster_actions
                .iter()
                .all(|(_, action)| *action != AiAction::Attack));
        }
        assert_eq!(fx.store.entity(fx.player).unwrap().health().unwrap().current(), 30);
    }

    #[test]
    fn test_ai_state_written_back() {
        let mut fx = Fixture::new(Position::new(5, 5));
        let orc = fx.monster(&MonsterTemplate::ORC, 5, 10);
        let mut events: Vec<GameEvent> = Vec::new();
        fx.run(&mut events);
        assert_eq!(fx.store.entity(orc).unwrap().ai_state(), Some(AiState::Chase));
    }
}
