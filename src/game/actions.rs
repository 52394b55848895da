//! # Commands
//!
//! The player-facing command surface. Each [`Command`] either consumes a turn,
//! and the turn orchestrator then runs, or it is rejected with a
//! [`Rejection`] and nothing else happens.

use crate::{
    apply_item_effect, cast_spell, combat, process_turn, CommitOutcome, DelveError, DelveResult,
    Direction, EntityId, EquipSlot, GameCompletionState, GameEvent, GameState, ItemKind,
    MapQuery, NotificationSink, StatusEffectKind, TargetPurpose, TileType, TurnSummary,
    UseOutcome, WorldView,
};
use rand::seq::SliceRandom;

/// One player intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Step in a direction; bumping a monster attacks it
    Move(Direction),
    Wait,
    /// Melee an adjacent monster
    Attack(EntityId),
    UseItem {
        slot: usize,
        target: Option<EntityId>,
    },
    CastSpell {
        spell: usize,
        target: Option<EntityId>,
    },
    PickUp,
    Equip(usize),
    Unequip(EquipSlot),
    Descend,
}

/// Why a command did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Blocked,
    NotAdjacent,
    NothingToPickUp,
    InventoryFull,
    NoSuchItem,
    NotUsable,
    NotEquippable,
    SlotEmpty,
    FullHealth,
    FullMana,
    NeedsTarget,
    InvalidTarget,
    OutOfRange,
    UnknownSpell,
    NotEnoughMana { have: i32, need: i32 },
    CasterDead,
    NotOnStairs,
    /// Targeting ended without a live target
    NoTargetSelected,
    GameOver,
}

/// What a command did.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub turn_consumed: bool,
    pub rejection: Option<Rejection>,
    /// Present when the turn orchestrator ran
    pub turn: Option<TurnSummary>,
    /// Everything that happened, in order
    pub events: Vec<GameEvent>,
}

impl CommandOutcome {
    fn rejected(rejection: Rejection, events: Vec<GameEvent>) -> Self {
        Self {
            turn_consumed: false,
            rejection: Some(rejection),
            turn: None,
            events,
        }
    }
}

/// How a command resolved before the turn runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    TurnConsumed,
    /// Succeeded without spending a turn
    Free,
    Rejected(Rejection),
}

impl GameState {
    /// Executes a player command.
    ///
    /// When the command consumes a turn, the turn orchestrator runs before
    /// this returns, and the player then regenerates mana if still alive.
    /// Issuing a command while targeting is an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{Command, Direction, GameConfig, GameState, Position};
    ///
    /// let mut state = GameState::from_layout(&[
    ///     "#####",
    ///     "#@..#",
    ///     "#####",
    /// ], GameConfig::default()).unwrap();
    ///
    /// let outcome = state.execute(Command::Move(Direction::East)).unwrap();
    /// assert!(outcome.turn_consumed);
    /// assert_eq!(state.player_position().unwrap(), Position::new(2, 1));
    /// assert_eq!(state.turn_number, 1);
    ///
    /// let outcome = state.execute(Command::Move(Direction::North)).unwrap();
    /// assert!(!outcome.turn_consumed);
    /// ```
    pub fn execute(&mut self, command: Command) -> DelveResult<CommandOutcome> {
        if self.targeting.is_active() {
            return Err(DelveError::InvalidState(
                "commands cannot be issued while targeting".to_string(),
            ));
        }
        if self.is_game_ended() {
            return Ok(CommandOutcome::rejected(Rejection::GameOver, Vec::new()));
        }

        let mut events = Vec::new();
        let resolution = self.resolve(command, &mut events)?;
        log::debug!("{:?} -> {:?}", command, resolution);
        let outcome = match resolution {
            Resolution::Rejected(rejection) => CommandOutcome::rejected(rejection, events),
            Resolution::Free => CommandOutcome {
                turn_consumed: false,
                rejection: None,
                turn: None,
                events,
            },
            Resolution::TurnConsumed => {
                let summary = self.end_turn(&mut events)?;
                CommandOutcome {
                    turn_consumed: true,
                    rejection: None,
                    turn: Some(summary),
                    events,
                }
            }
        };

        for event in &outcome.events {
            self.statistics.update_from_event(event, self.player_id);
        }
        Ok(outcome)
    }

    /// Commits the targeting session and performs the pending item or spell.
    ///
    /// A commit that finds no live target ends targeting with
    /// [`Rejection::NoTargetSelected`] and changes nothing else.
    pub fn confirm_target(&mut self) -> DelveResult<CommandOutcome> {
        let purpose = self.pending_target.ok_or_else(|| {
            DelveError::InvalidState("no item or spell is waiting for a target".to_string())
        })?;
        let commit = self.targeting.commit(&self.store)?;
        self.pending_target = None;

        let target = match commit {
            CommitOutcome::Committed(target) => target,
            CommitOutcome::Cancelled(reason) => {
                log::debug!("targeting ended without a target: {:?}", reason);
                return Ok(CommandOutcome::rejected(
                    Rejection::NoTargetSelected,
                    vec![GameEvent::TargetingCancelled],
                ));
            }
        };

        let name = self.store.entity(target)?.name.clone();
        let command = match purpose {
            TargetPurpose::Item { slot } => Command::UseItem {
                slot,
                target: Some(target),
            },
            TargetPurpose::Spell { index } => Command::CastSpell {
                spell: index,
                target: Some(target),
            },
        };
        let mut outcome = self.execute(command)?;
        outcome
            .events
            .insert(0, GameEvent::TargetingCommitted { target, name });
        Ok(outcome)
    }

    fn resolve(
        &mut self,
        command: Command,
        events: &mut Vec<GameEvent>,
    ) -> DelveResult<Resolution> {
        match command {
            Command::Move(direction) => self.move_player(direction, events),
            Command::Wait => Ok(Resolution::TurnConsumed),
            Command::Attack(target) => self.attack(target, events),
            Command::UseItem { slot, target } => self.use_item(slot, target, events),
            Command::CastSpell { spell, target } => self.cast(spell, target, events),
            Command::PickUp => self.pick_up(events),
            Command::Equip(slot) => self.equip(slot, events),
            Command::Unequip(slot) => self.unequip(slot, events),
            Command::Descend => self.descend(events),
        }
    }

    /// Runs the turn orchestrator and the end-of-turn bookkeeping.
    fn end_turn(&mut self, events: &mut Vec<GameEvent>) -> DelveResult<TurnSummary> {
        self.turn_number += 1;
        let summary = process_turn(
            &mut self.store,
            &self.map,
            self.player_id,
            self.turn_number,
            &mut self.rng,
            events,
        )?;

        if summary.player_died {
            self.completion_state = GameCompletionState::PlayerDied {
                turn: self.turn_number,
            };
        } else if let Some(mana) = self.player_mut()?.mana.as_mut() {
            mana.regenerate();
        }
        Ok(summary)
    }

    fn move_player(
        &mut self,
        direction: Direction,
        events: &mut Vec<GameEvent>,
    ) -> DelveResult<Resolution> {
        let player = self.player()?;
        let from = player.position;
        let confused = player.has_status(StatusEffectKind::Confusion);
        let direction = if confused {
            Direction::all()
                .choose(&mut self.rng)
                .copied()
                .unwrap_or(direction)
        } else {
            direction
        };
        let to = from + direction.to_delta();

        if let Some(occupant) = self.store.blocking_entity_at(to) {
            if self.store.entity(occupant)?.is_monster() {
                return self.attack(occupant, events);
            }
        }

        let walkable = WorldView::new(&self.map, &self.store, Some(self.player_id)).is_walkable(to);
        if !walkable {
            // a confused stumble into a wall still costs the turn
            return Ok(if confused {
                Resolution::TurnConsumed
            } else {
                Resolution::Rejected(Rejection::Blocked)
            });
        }

        self.player_mut()?.position = to;
        events.notify(GameEvent::EntityMoved {
            entity: self.player_id,
            from,
            to,
        });
        self.refresh_fov()?;
        Ok(Resolution::TurnConsumed)
    }

    fn attack(&mut self, target: EntityId, events: &mut Vec<GameEvent>) -> DelveResult<Resolution> {
        let Some(defender) = self.store.get(target) else {
            return Ok(Resolution::Rejected(Rejection::InvalidTarget));
        };
        if !defender.is_monster() || !defender.is_alive() {
            return Ok(Resolution::Rejected(Rejection::InvalidTarget));
        }
        let from = self.player_position()?;
        let delta = defender.position - from;
        if delta.x.abs().max(delta.y.abs()) != 1 {
            return Ok(Resolution::Rejected(Rejection::NotAdjacent));
        }

        let outcome = combat::resolve_attack(&mut self.store, self.player_id, target, events)?;
        if outcome.defender_died {
            combat::handle_death(&mut self.store, target, Some(self.player_id), events)?;
        }
        Ok(Resolution::TurnConsumed)
    }

    fn use_item(
        &mut self,
        slot: usize,
        target: Option<EntityId>,
        events: &mut Vec<GameEvent>,
    ) -> DelveResult<Resolution> {
        let Some(item) = self.player()?.inventory()?.get(slot).cloned() else {
            return Ok(Resolution::Rejected(Rejection::NoSuchItem));
        };
        let Some(effect) = item.effect() else {
            return Ok(Resolution::Rejected(Rejection::NotUsable));
        };
        if let (true, Some(target)) = (effect.needs_target(), target) {
            let origin = self.player_position()?;
            let Some(entity) = self.store.get(target) else {
                return Ok(Resolution::Rejected(Rejection::InvalidTarget));
            };
            if origin.manhattan_distance(entity.position) > self.config.targeting_range {
                return Ok(Resolution::Rejected(Rejection::OutOfRange));
            }
        }

        let mut effect_events = Vec::new();
        match apply_item_effect(
            &mut self.store,
            self.player_id,
            &item,
            target,
            &mut effect_events,
        )? {
            UseOutcome::Failed(rejection) => Ok(Resolution::Rejected(rejection)),
            UseOutcome::Applied => {
                self.player_mut()?.inventory_mut()?.take(slot);
                events.notify(GameEvent::ItemUsed {
                    entity: self.player_id,
                    item_name: item.name,
                });
                events.extend(effect_events);
                Ok(Resolution::TurnConsumed)
            }
        }
    }

    fn cast(
        &mut self,
        index: usize,
        target: Option<EntityId>,
        events: &mut Vec<GameEvent>,
    ) -> DelveResult<Resolution> {
        let Some(spell) = self.player()?.spellbook()?.get(index).cloned() else {
            return Ok(Resolution::Rejected(Rejection::UnknownSpell));
        };
        match cast_spell(&mut self.store, self.player_id, &spell, target, events)? {
            UseOutcome::Applied => Ok(Resolution::TurnConsumed),
            UseOutcome::Failed(rejection) => Ok(Resolution::Rejected(rejection)),
        }
    }

    fn pick_up(&mut self, events: &mut Vec<GameEvent>) -> DelveResult<Resolution> {
        let position = self.player_position()?;
        let Some(item_id) = self.store.item_at(position) else {
            return Ok(Resolution::Rejected(Rejection::NothingToPickUp));
        };
        if self.player()?.inventory()?.is_full() {
            return Ok(Resolution::Rejected(Rejection::InventoryFull));
        }
        let Some(item) = self.store.despawn(item_id).and_then(|entity| entity.item) else {
            return Err(DelveError::InvalidState(format!(
                "floor item {} has no item data",
                item_id
            )));
        };

        let name = item.name.clone();
        if self.player_mut()?.inventory_mut()?.add(item).is_err() {
            return Err(DelveError::InvalidState(
                "inventory filled during pickup".to_string(),
            ));
        }
        events.notify(GameEvent::ItemPickedUp {
            entity: self.player_id,
            item_name: name,
        });
        Ok(Resolution::TurnConsumed)
    }

    fn equip(&mut self, slot: usize, events: &mut Vec<GameEvent>) -> DelveResult<Resolution> {
        let player_id = self.player_id;
        let player = self.player_mut()?;
        let Some(item) = player.inventory()?.get(slot) else {
            return Ok(Resolution::Rejected(Rejection::NoSuchItem));
        };
        let ItemKind::Equippable {
            slot: equip_slot, ..
        } = item.kind
        else {
            return Ok(Resolution::Rejected(Rejection::NotEquippable));
        };

        let Some(item) = player.inventory_mut()?.take(slot) else {
            return Ok(Resolution::Rejected(Rejection::NoSuchItem));
        };
        let previous = player.equipment_mut()?.slot_mut(equip_slot).take();
        if let Some(previous) = previous {
            apply_bonuses(player.combat_mut()?, &previous.kind, -1);
            events.notify(GameEvent::ItemUnequipped {
                entity: player_id,
                item_name: previous.name.clone(),
                slot: equip_slot,
            });
            if player.inventory_mut()?.add(previous).is_err() {
                return Err(DelveError::InvalidState(
                    "no room for the unequipped item".to_string(),
                ));
            }
        }

        apply_bonuses(player.combat_mut()?, &item.kind, 1);
        events.notify(GameEvent::ItemEquipped {
            entity: player_id,
            item_name: item.name.clone(),
            slot: equip_slot,
        });
        *player.equipment_mut()?.slot_mut(equip_slot) = Some(item);
        Ok(Resolution::TurnConsumed)
    }

    fn unequip(&mut self, slot: EquipSlot, events: &mut Vec<GameEvent>) -> DelveResult<Resolution> {
        let player_id = self.player_id;
        let player = self.player_mut()?;
        if player.equipment_mut()?.slot(slot).is_none() {
            return Ok(Resolution::Rejected(Rejection::SlotEmpty));
        }
        if player.inventory()?.is_full() {
            return Ok(Resolution::Rejected(Rejection::InventoryFull));
        }
        let Some(item) = player.equipment_mut()?.slot_mut(slot).take() else {
            return Ok(Resolution::Rejected(Rejection::SlotEmpty));
        };

        apply_bonuses(player.combat_mut()?, &item.kind, -1);
        events.notify(GameEvent::ItemUnequipped {
            entity: player_id,
            item_name: item.name.clone(),
            slot,
        });
        if player.inventory_mut()?.add(item).is_err() {
            return Err(DelveError::InvalidState(
                "inventory filled during unequip".to_string(),
            ));
        }
        Ok(Resolution::TurnConsumed)
    }

    fn descend(&mut self, events: &mut Vec<GameEvent>) -> DelveResult<Resolution> {
        let position = self.player_position()?;
        if self.map.tile(position) != Some(TileType::StairsDown) {
            return Ok(Resolution::Rejected(Rejection::NotOnStairs));
        }
        self.completion_state = GameCompletionState::Descended {
            turn: self.turn_number,
        };
        log::info!("player descended on turn {}", self.turn_number);
        events.notify(GameEvent::Descended);
        Ok(Resolution::Free)
    }
}

fn apply_bonuses(combat: &mut crate::CombatComponent, kind: &ItemKind, sign: i32) {
    if let ItemKind::Equippable { power, defense, .. } = kind {
        combat.power += sign * power;
        combat.defense += sign * defense;
    }
}
