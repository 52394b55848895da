//! # Message Log
//!
//! Turns structured game events into the lines the player reads.

use crate::{
    EquipSlot, GameEvent, Rejection, StatusEffect, StatusEffectKind, TargetingBegin,
    DEFAULT_MESSAGE_CAPACITY,
};
use std::collections::VecDeque;

/// Bounded, oldest-first list of messages.
///
/// # Examples
///
/// ```
/// use delve::{GameEvent, MessageLog};
///
/// let mut log = MessageLog::new(2);
/// log.push("one");
/// log.push("two");
/// log.push("three");
/// assert_eq!(log.recent(5).collect::<Vec<_>>(), vec!["two", "three"]);
///
/// log.record(&GameEvent::TargetingCancelled);
/// assert_eq!(log.recent(1).next(), Some("Targeting cancelled."));
/// ```
#[derive(Debug, Clone)]
pub struct MessageLog {
    messages: VecDeque<String>,
    capacity: usize,
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new(DEFAULT_MESSAGE_CAPACITY)
    }
}

impl MessageLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Adds a message, dropping the oldest when full.
    pub fn push(&mut self, message: impl Into<String>) {
        if self.messages.len() == self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(message.into());
    }

    /// Adds the message for an event, if it has one.
    pub fn record(&mut self, event: &GameEvent) {
        if let Some(message) = describe(event) {
            self.push(message);
        }
    }

    pub fn record_all<'a>(&mut self, events: impl IntoIterator<Item = &'a GameEvent>) {
        for event in events {
            self.record(event);
        }
    }

    /// The last `count` messages, oldest first.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &str> {
        let skip = self.messages.len().saturating_sub(count);
        self.messages.iter().skip(skip).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// The player-facing line for an event. Bookkeeping events have none.
pub fn describe(event: &GameEvent) -> Option<String> {
    let text = match event {
        GameEvent::EffectApplied {
            name,
            effect,
            duration,
            ..
        } => format!("{} is affected by {} for {} turns.", name, effect.kind(), duration),
        GameEvent::EffectTicked {
            name,
            effect: StatusEffect::Poison { damage },
            ..
        } => format!("{} takes {} poison damage.", name, damage),
        GameEvent::EffectTicked { .. } => return None,
        GameEvent::EffectExpired { name, kind, .. } => match kind {
            StatusEffectKind::Confusion => format!("{} is no longer confused.", name),
            other => format!("The {} on {} wears off.", other, name),
        },
        GameEvent::MonsterActed { .. } | GameEvent::EntityMoved { .. } => return None,
        GameEvent::Attacked {
            attacker_name,
            defender_name,
            damage: 0,
            ..
        } => format!("{} attacks {} but does no damage.", attacker_name, defender_name),
        GameEvent::Attacked {
            attacker_name,
            defender_name,
            damage,
            ..
        } => format!("{} attacks {} for {} hit points.", attacker_name, defender_name, damage),
        GameEvent::Damaged {
            name,
            amount,
            source,
            ..
        } => format!("{} hits {} for {} damage.", source, name, amount),
        GameEvent::Healed { name, amount, .. } => format!("{} heals {} hit points.", name, amount),
        GameEvent::ManaRestored { amount, .. } => format!("You recover {} mana.", amount),
        GameEvent::Died { name, .. } => format!("{} dies!", name),
        GameEvent::XpGained { amount, .. } => format!("You gain {} experience.", amount),
        GameEvent::LevelUp { level, .. } => format!("You reach level {}!", level),
        GameEvent::ItemPickedUp { item_name, .. } => format!("You pick up the {}.", item_name),
        GameEvent::ItemUsed { item_name, .. } => format!("You use the {}.", item_name),
        GameEvent::ItemEquipped {
            item_name, slot, ..
        } => format!("You equip the {} as your {}.", item_name, slot_name(*slot)),
        GameEvent::ItemUnequipped { item_name, .. } => format!("You remove the {}.", item_name),
        GameEvent::SpellCast {
            spell_name,
            target_name,
            ..
        } => format!("You cast {} on {}.", spell_name, target_name),
        GameEvent::TargetingStarted { candidates, .. } => format!(
            "Select a target ({} in range). Tab cycles, Enter fires, Esc cancels.",
            candidates
        ),
        GameEvent::TargetingCommitted { name, .. } => format!("Targeting {}.", name),
        GameEvent::TargetingCancelled => "Targeting cancelled.".to_string(),
        GameEvent::Descended => "You descend the stairs.".to_string(),
        GameEvent::GameOver => "You die...".to_string(),
    };
    Some(text)
}

/// Feedback for a command that did nothing.
pub fn describe_rejection(rejection: Rejection) -> String {
    match rejection {
        Rejection::Blocked => "Something is in the way.".to_string(),
        Rejection::NotAdjacent => "That is too far away to hit.".to_string(),
        Rejection::NothingToPickUp => "There is nothing here to pick up.".to_string(),
        Rejection::InventoryFull => "Your inventory is full.".to_string(),
        Rejection::NoSuchItem => "You have no item in that slot.".to_string(),
        Rejection::NotUsable => "You cannot use that.".to_string(),
        Rejection::NotEquippable => "You cannot equip that.".to_string(),
        Rejection::SlotEmpty => "You have nothing equipped there.".to_string(),
        Rejection::FullHealth => "You are already at full health.".to_string(),
        Rejection::FullMana => "Your mana is already full.".to_string(),
        Rejection::NeedsTarget => "That needs a target.".to_string(),
        Rejection::InvalidTarget => "That is not a valid target.".to_string(),
        Rejection::OutOfRange => "The target is out of range.".to_string(),
        Rejection::UnknownSpell => "You do not know that spell.".to_string(),
        Rejection::NotEnoughMana { have, need } => {
            format!("Not enough mana ({} of {}).", have, need)
        }
        Rejection::CasterDead => "The dead cast no spells.".to_string(),
        Rejection::NotOnStairs => "There are no stairs here.".to_string(),
        Rejection::NoTargetSelected => "No target selected.".to_string(),
        Rejection::GameOver => "The game is over.".to_string(),
    }
}

/// Feedback when targeting could not start.
pub fn describe_targeting_begin(begin: TargetingBegin) -> Option<String> {
    match begin {
        TargetingBegin::Started { .. } => None,
        TargetingBegin::NoVisibleTargets => Some("No visible targets.".to_string()),
        TargetingBegin::NoTargetsInRange => Some("No targets in range.".to_string()),
    }
}

fn slot_name(slot: EquipSlot) -> &'static str {
    match slot {
        EquipSlot::Weapon => "weapon",
        EquipSlot::Armor => "armor",
    }
}
