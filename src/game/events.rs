//! # Game Events
//!
//! Structured notifications emitted by the game systems.
//!
//! Systems never format user-facing text. Every call that can produce
//! notifications takes a [`NotificationSink`] and reports discrete
//! [`GameEvent`]s to it, in the order they happened. The presentation layer
//! decides what to show.

use crate::{AiAction, AiState, EntityId, EquipSlot, Position, StatusEffect, StatusEffectKind};
use serde::{Deserialize, Serialize};

/// Something that happened during a command or a turn.
///
/// Events carry entity names as they were at the time of the event, since the
/// entity may be gone by the time the event is displayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A status effect was applied or refreshed
    EffectApplied {
        entity: EntityId,
        name: String,
        effect: StatusEffect,
        duration: i32,
    },
    /// A status effect ran its per-turn behavior
    EffectTicked {
        entity: EntityId,
        name: String,
        effect: StatusEffect,
        /// Turns left once this tick's countdown is applied
        remaining: i32,
    },
    /// A status effect ran out or was removed
    EffectExpired {
        entity: EntityId,
        name: String,
        kind: StatusEffectKind,
    },
    /// A monster's AI produced a decision
    MonsterActed {
        monster: EntityId,
        name: String,
        state: AiState,
        action: AiAction,
    },
    /// An entity changed position
    EntityMoved {
        entity: EntityId,
        from: Position,
        to: Position,
    },
    /// A melee attack was resolved
    Attacked {
        attacker: EntityId,
        attacker_name: String,
        defender: EntityId,
        defender_name: String,
        damage: i32,
    },
    /// Damage from a spell or item
    Damaged {
        entity: EntityId,
        name: String,
        amount: i32,
        source: String,
    },
    /// Hit points restored
    Healed {
        entity: EntityId,
        name: String,
        amount: i32,
    },
    /// Mana restored by an item
    ManaRestored {
        entity: EntityId,
        amount: i32,
    },
    /// An entity died
    Died {
        entity: EntityId,
        name: String,
        killer: Option<EntityId>,
    },
    /// Experience awarded
    XpGained {
        entity: EntityId,
        amount: u32,
    },
    /// A character reached a new level
    LevelUp {
        entity: EntityId,
        name: String,
        level: u32,
    },
    ItemPickedUp {
        entity: EntityId,
        item_name: String,
    },
    ItemUsed {
        entity: EntityId,
        item_name: String,
    },
    ItemEquipped {
        entity: EntityId,
        item_name: String,
        slot: EquipSlot,
    },
    ItemUnequipped {
        entity: EntityId,
        item_name: String,
        slot: EquipSlot,
    },
    SpellCast {
        caster: EntityId,
        spell_name: String,
        target: EntityId,
        target_name: String,
    },
    TargetingStarted {
        origin: Position,
        candidates: usize,
    },
    TargetingCommitted {
        target: EntityId,
        name: String,
    },
    TargetingCancelled,
    /// The player descended the stairs
    Descended,
    /// The player died and the game is over
    GameOver,
}

/// Receiver for [`GameEvent`]s.
///
/// # Examples
///
/// ```
/// use delve::{GameEvent, NotificationSink};
///
/// let mut events: Vec<GameEvent> = Vec::new();
/// events.notify(GameEvent::TargetingCancelled);
/// assert_eq!(events.len(), 1);
/// ```
pub trait NotificationSink {
    /// Receives one event.
    fn notify(&mut self, event: GameEvent);
}

impl NotificationSink for Vec<GameEvent> {
    fn notify(&mut self, event: GameEvent) {
        self.push(event);
    }
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&mut self, _event: GameEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_sink_preserves_order() {
        let mut events: Vec<GameEvent> = Vec::new();
        events.notify(GameEvent::Descended);
        events.notify(GameEvent::GameOver);
        assert_eq!(events, vec![GameEvent::Descended, GameEvent::GameOver]);
    }

    #[test]
    fn test_event_serializes() {
        let event = GameEvent::XpGained {
            entity: EntityId(2),
            amount: 35,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("XpGained"));
    }
}
