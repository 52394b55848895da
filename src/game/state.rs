//! # Game State Module
//!
//! Central game state and the entry points the presentation layer drives.
//!
//! [`GameState`] owns the map, the field of view, the entity store and the
//! random number generator. Commands go through [`GameState::execute`];
//! ranged items and spells first go through the targeting entry points here.

use crate::{
    DelveError, DelveResult, Entity, EntityId, EntityStore, FovMap, GameConfig, GameEvent,
    GameMap, Item, MonsterTemplate, NotificationSink, Position, TargetingController,
    TargetingStart, VisibilityQuery,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Layout used by the binary when no other map is supplied.
pub const DEMO_LAYOUT: &[&str] = &[
    "##################################################",
    "#@....!.....#..........#.............r...........#",
    "#...........#....o.....#.........................#",
    "#.....?..........................~...#######.....#",
    "#...........#..........#.............#.....#.....#",
    "######.######..........#......o......#..t..#.....#",
    "#...........############.............#.....#.....#",
    "#..r.....*..#..........#.............###.###.....#",
    "#...........#...&......#.........................#",
    "#....../.........+.....#..........[.........>....#",
    "#...........#..........#.....o...................#",
    "##################################################",
];

/// Game statistics for player progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatistics {
    pub enemies_defeated: u32,
    pub items_collected: u32,
    pub items_used: u32,
    pub spells_cast: u32,
    pub damage_dealt: u64,
    pub damage_taken: u64,
    pub steps_taken: u64,
}

impl GameStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates statistics from an event, seen from the player's side.
    pub fn update_from_event(&mut self, event: &GameEvent, player: EntityId) {
        match event {
            GameEvent::EntityMoved { entity, .. } if *entity == player => {
                self.steps_taken += 1;
            }
            GameEvent::Attacked {
                attacker,
                defender,
                damage,
                ..
            } => {
                if *attacker == player {
                    self.damage_dealt += *damage as u64;
                } else if *defender == player {
                    self.damage_taken += *damage as u64;
                }
            }
            GameEvent::Damaged { entity, amount, .. } if *entity != player => {
                self.damage_dealt += *amount as u64;
            }
            GameEvent::EffectTicked {
                entity,
                effect: crate::StatusEffect::Poison { damage },
                ..
            } if *entity == player => {
                self.damage_taken += (*damage).max(0) as u64;
            }
            GameEvent::Died {
                killer: Some(killer),
                ..
            } if *killer == player => {
                self.enemies_defeated += 1;
            }
            GameEvent::ItemPickedUp { .. } => self.items_collected += 1,
            GameEvent::ItemUsed { .. } => self.items_used += 1,
            GameEvent::SpellCast { caster, .. } if *caster == player => self.spells_cast += 1,
            _ => {}
        }
    }
}

/// Whether the game is still running, and how it ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameCompletionState {
    Playing,
    PlayerDied { turn: u64 },
    Descended { turn: u64 },
}

/// What a target is being picked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPurpose {
    /// The inventory slot of a targeted consumable
    Item { slot: usize },
    /// The spellbook index of a single-target spell
    Spell { index: usize },
}

/// Result of [`GameState::begin_targeting`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetingBegin {
    Started { candidates: usize },
    /// No living monster is in view
    NoVisibleTargets,
    /// Monsters are in view, but none within range
    NoTargetsInRange,
}

/// Central game state containing all game data.
#[derive(Debug, Clone)]
pub struct GameState {
    pub config: GameConfig,
    pub map: GameMap,
    pub fov: FovMap,
    pub store: EntityStore,
    pub player_id: EntityId,
    /// Number of turns processed so far
    pub turn_number: u64,
    pub targeting: TargetingController,
    /// Set while targeting; consumed by [`GameState::confirm_target`]
    pub pending_target: Option<TargetPurpose>,
    pub statistics: GameStatistics,
    pub completion_state: GameCompletionState,
    pub(crate) rng: StdRng,
}

impl GameState {
    /// Creates a game on a map with the player at a position.
    pub fn new(map: GameMap, player_position: Position, config: GameConfig) -> Self {
        let mut store = EntityStore::new();
        let mut player = Entity::player(player_position);
        if let Some(mana) = player.mana.as_mut() {
            mana.regen = config.mana_regen_per_turn;
        }
        let player_id = store.spawn(player);
        let fov = FovMap::new(&map);
        let rng = StdRng::seed_from_u64(config.seed);

        let mut state = Self {
            config,
            map,
            fov,
            store,
            player_id,
            turn_number: 0,
            targeting: TargetingController::new(),
            pending_target: None,
            statistics: GameStatistics::new(),
            completion_state: GameCompletionState::Playing,
            rng,
        };
        state.refresh_fov_at(player_position);
        state
    }

    /// Builds a game from an ASCII layout.
    ///
    /// The layout needs exactly one `@`. Monster glyphs spawn monsters, item
    /// glyphs spawn floor items; anything else is an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{GameConfig, GameState};
    ///
    /// let state = GameState::from_layout(&[
    ///     "#######",
    ///     "#@.!.o#",
    ///     "#######",
    /// ], GameConfig::default()).unwrap();
    ///
    /// assert_eq!(state.store.living_monsters().len(), 1);
    /// assert_eq!(state.player().unwrap().position.x, 1);
    /// ```
    pub fn from_layout(rows: &[&str], config: GameConfig) -> DelveResult<Self> {
        let (map, spawns) = GameMap::from_ascii(rows)?;
        let players: Vec<Position> = spawns
            .iter()
            .filter(|spawn| spawn.glyph == '@')
            .map(|spawn| spawn.position)
            .collect();
        let player_position = match players.as_slice() {
            [position] => *position,
            other => {
                return Err(DelveError::InvalidLayout(format!(
                    "expected one player start, found {}",
                    other.len()
                )))
            }
        };

        let confusion_turns = config.confusion_turns;
        let mut state = Self::new(map, player_position, config);
        for spawn in spawns.iter().filter(|spawn| spawn.glyph != '@') {
            if let Some(template) = MonsterTemplate::for_glyph(spawn.glyph) {
                state.spawn_monster(template, spawn.position);
            } else if let Some(item) = Item::for_glyph(spawn.glyph, confusion_turns) {
                state.spawn_item(item, spawn.position);
            } else {
                return Err(DelveError::InvalidLayout(format!(
                    "unknown glyph '{}' at {}",
                    spawn.glyph, spawn.position
                )));
            }
        }
        log::info!(
            "loaded {}x{} layout with {} monsters",
            state.map.width(),
            state.map.height(),
            state.store.living_monsters().len()
        );
        Ok(state)
    }

    /// The built-in demo level.
    pub fn demo(config: GameConfig) -> DelveResult<Self> {
        Self::from_layout(DEMO_LAYOUT, config)
    }

    /// Adds a monster with the configured chase range.
    pub fn spawn_monster(&mut self, template: &MonsterTemplate, position: Position) -> EntityId {
        let mut monster = Entity::monster(template, position);
        if let Some(ai) = monster.ai.as_mut() {
            ai.chase_range = self.config.chase_range;
        }
        self.store.spawn(monster)
    }

    /// Drops an item on the floor.
    pub fn spawn_item(&mut self, item: Item, position: Position) -> EntityId {
        self.store.spawn(Entity::floor_item(item, position))
    }

    pub fn player(&self) -> DelveResult<&Entity> {
        self.store.entity(self.player_id)
    }

    pub fn player_mut(&mut self) -> DelveResult<&mut Entity> {
        self.store.entity_mut(self.player_id)
    }

    pub fn player_position(&self) -> DelveResult<Position> {
        Ok(self.player()?.position)
    }

    pub fn is_game_ended(&self) -> bool {
        self.completion_state != GameCompletionState::Playing
    }

    /// Recomputes the player's field of view.
    pub fn refresh_fov(&mut self) -> DelveResult<()> {
        let origin = self.player_position()?;
        self.refresh_fov_at(origin);
        Ok(())
    }

    fn refresh_fov_at(&mut self, origin: Position) {
        self.fov.compute(&self.map, origin, self.config.fov_radius);
    }

    /// Enters targeting mode for an item or spell.
    ///
    /// Reports "nothing visible" and "nothing in range" separately; neither
    /// starts a session. Fails if the purpose does not name a targeted item
    /// or spell, or if the game is over.
    pub fn begin_targeting(
        &mut self,
        purpose: TargetPurpose,
        sink: &mut impl NotificationSink,
    ) -> DelveResult<TargetingBegin> {
        if self.is_game_ended() {
            return Err(DelveError::InvalidState("the game is over".to_string()));
        }
        let range = self.targeting_range(purpose)?;
        let origin = self.player_position()?;

        let visible: Vec<EntityId> = self
            .store
            .living_monsters()
            .into_iter()
            .filter(|id| {
                self.store
                    .get(*id)
                    .map(|entity| self.fov.is_visible(entity.position))
                    .unwrap_or(false)
            })
            .collect();
        if visible.is_empty() {
            return Ok(TargetingBegin::NoVisibleTargets);
        }

        match self
            .targeting
            .start(origin, range, &visible, &self.store, &self.fov)?
        {
            TargetingStart::NoTargets => Ok(TargetingBegin::NoTargetsInRange),
            TargetingStart::Started(session) => {
                let candidates = session.candidates().len();
                self.pending_target = Some(purpose);
                log::info!("targeting {:?} with {} candidates", purpose, candidates);
                sink.notify(GameEvent::TargetingStarted { origin, candidates });
                Ok(TargetingBegin::Started { candidates })
            }
        }
    }

    /// Leaves targeting mode without doing anything.
    pub fn cancel_targeting(&mut self, sink: &mut impl NotificationSink) -> DelveResult<()> {
        self.targeting.cancel()?;
        self.pending_target = None;
        sink.notify(GameEvent::TargetingCancelled);
        Ok(())
    }

    fn targeting_range(&self, purpose: TargetPurpose) -> DelveResult<u32> {
        let player = self.player()?;
        match purpose {
            TargetPurpose::Item { slot } => {
                let targeted = player
                    .inventory()?
                    .get(slot)
                    .and_then(Item::effect)
                    .map(|effect| effect.needs_target())
                    .unwrap_or(false);
                if targeted {
                    Ok(self.config.targeting_range)
                } else {
                    Err(DelveError::InvalidAction(format!(
                        "inventory slot {} holds no targeted item",
                        slot
                    )))
                }
            }
            TargetPurpose::Spell { index } => match player.spellbook()?.get(index) {
                Some(spell) if spell.needs_target() => Ok(spell.range),
                _ => Err(DelveError::InvalidAction(format!(
                    "spell {} is not a targeted spell",
                    index
                ))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Direction, TargetingState};

    const ARENA: &[&str] = &[
        "####################",
        "#@......o..........#",
        "#..................#",
        "##########.#########",
        "#.........t........#",
        "####################",
    ];

    fn arena() -> GameState {
        GameState::from_layout(ARENA, GameConfig::default()).unwrap()
    }

    #[test]
    fn test_from_layout_requires_one_player() {
        let none = GameState::from_layout(&["###", "#.#", "###"], GameConfig::default());
        assert!(matches!(none, Err(DelveError::InvalidLayout(_))));
        let two = GameState::from_layout(&["####", "#@@#", "####"], GameConfig::default());
        assert!(matches!(two, Err(DelveError::InvalidLayout(_))));
    }

    #[test]
    fn test_from_layout_rejects_unknown_glyph() {
        let result = GameState::from_layout(&["####", "#@X#", "####"], GameConfig::default());
        assert!(matches!(result, Err(DelveError::InvalidLayout(_))));
    }

    #[test]
    fn test_demo_layout_loads() {
        let state = GameState::demo(GameConfig::default()).unwrap();
        assert!(!state.store.living_monsters().is_empty());
        assert!(state.fov.is_visible(state.player_position().unwrap()));
    }

    #[test]
    fn test_spawned_monsters_use_config_chase_range() {
        let mut config = GameConfig::default();
        config.chase_range = 4;
        let state = GameState::from_layout(ARENA, config).unwrap();
        let orc = state.store.living_monsters()[0];
        assert_eq!(state.store.entity(orc).unwrap().ai.unwrap().chase_range, 4);
    }

    #[test]
    fn test_begin_targeting_distinguishes_visibility_and_range() {
        let mut state = arena();
        state
            .player_mut()
            .unwrap()
            .inventory_mut()
            .unwrap()
            .add(Item::confusion_scroll(10))
            .unwrap();
        let mut events: Vec<GameEvent> = Vec::new();

        // the orc at distance 7 is visible and in range
        let begin = state
            .begin_targeting(TargetPurpose::Item { slot: 0 }, &mut events)
            .unwrap();
        assert_eq!(begin, TargetingBegin::Started { candidates: 1 });
        state.cancel_targeting(&mut events).unwrap();

        state.config.targeting_range = 5;
        let begin = state
            .begin_targeting(TargetPurpose::Item { slot: 0 }, &mut events)
            .unwrap();
        assert_eq!(begin, TargetingBegin::NoTargetsInRange);
        assert_eq!(state.targeting.state(), TargetingState::Inactive);

        let orc = state.store.living_monsters()[0];
        state.store.despawn(orc);
        let begin = state
            .begin_targeting(TargetPurpose::Item { slot: 0 }, &mut events)
            .unwrap();
        // the troll is behind the wall
        assert_eq!(begin, TargetingBegin::NoVisibleTargets);
    }

    #[test]
    fn test_begin_targeting_rejects_untargeted_purpose() {
        let mut state = arena();
        let mut events: Vec<GameEvent> = Vec::new();
        assert!(state
            .begin_targeting(TargetPurpose::Item { slot: 0 }, &mut events)
            .is_err());
        // minor heal is self-only
        assert!(state
            .begin_targeting(TargetPurpose::Spell { index: 1 }, &mut events)
            .is_err());
        assert!(state.cancel_targeting(&mut events).is_err());
    }

    #[test]
    fn test_statistics_track_player_side() {
        let mut stats = GameStatistics::new();
        let player = EntityId(0);
        let orc = EntityId(1);
        stats.update_from_event(
            &GameEvent::Attacked {
                attacker: player,
                attacker_name: "Player".into(),
                defender: orc,
                defender_name: "Orc".into(),
                damage: 4,
            },
            player,
        );
        stats.update_from_event(
            &GameEvent::Attacked {
                attacker: orc,
                attacker_name: "Orc".into(),
                defender: player,
                defender_name: "Player".into(),
                damage: 2,
            },
            player,
        );
        stats.update_from_event(
            &GameEvent::EntityMoved {
                entity: orc,
                from: Position::new(0, 0),
                to: Direction::East.to_delta(),
            },
            player,
        );
        assert_eq!(stats.damage_dealt, 4);
        assert_eq!(stats.damage_taken, 2);
        assert_eq!(stats.steps_taken, 0);
    }

    #[test]
    fn test_statistics_ignore_negative_poison_ticks() {
        let mut stats = GameStatistics::new();
        let player = EntityId(0);
        stats.update_from_event(
            &GameEvent::EffectTicked {
                entity: player,
                name: "Player".into(),
                effect: crate::StatusEffect::Poison { damage: -3 },
                remaining: 2,
            },
            player,
        );
        assert_eq!(stats.damage_taken, 0);
    }
}
