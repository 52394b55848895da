//! # Status Effects
//!
//! Timed modifiers attached to an entity and the engine that ticks them.
//!
//! Each entity keeps at most one active effect per [`StatusEffectKind`], in
//! the order the kinds were first applied. [`process_effects`] runs once per
//! entity per turn:
//!
//! 1. per-turn behavior in insertion order (poison deals damage)
//! 2. if that killed the entity, every effect is cleared and processing stops
//! 3. otherwise one tick notification per active effect
//! 4. every duration drops by one; effects reaching zero expire

use crate::{DelveResult, Entity, EntityId, EntityStore, GameEvent, NotificationSink};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Effect kind, the key of an entity's effect collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusEffectKind {
    Confusion,
    Poison,
    Invisibility,
    Strength,
    Shield,
}

impl fmt::Display for StatusEffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusEffectKind::Confusion => "confusion",
            StatusEffectKind::Poison => "poison",
            StatusEffectKind::Invisibility => "invisibility",
            StatusEffectKind::Strength => "strength",
            StatusEffectKind::Shield => "shield",
        };
        f.write_str(name)
    }
}

/// An effect together with its kind-specific payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusEffect {
    /// Movement is randomized; confused monsters never attack
    Confusion,
    /// Damage dealt at the start of each of the owner's effect phases
    Poison { damage: i32 },
    /// Monsters do not pursue or attack the owner
    Invisibility,
    /// Added to attack power
    Strength { bonus: i32 },
    /// Added to defense
    Shield { bonus: i32 },
}

impl StatusEffect {
    pub fn kind(&self) -> StatusEffectKind {
        match self {
            StatusEffect::Confusion => StatusEffectKind::Confusion,
            StatusEffect::Poison { .. } => StatusEffectKind::Poison,
            StatusEffect::Invisibility => StatusEffectKind::Invisibility,
            StatusEffect::Strength { .. } => StatusEffectKind::Strength,
            StatusEffect::Shield { .. } => StatusEffectKind::Shield,
        }
    }

    /// Strength of the payload, used to keep the stronger one on refresh.
    pub fn magnitude(&self) -> i32 {
        match self {
            StatusEffect::Poison { damage } => *damage,
            StatusEffect::Strength { bonus } | StatusEffect::Shield { bonus } => *bonus,
            StatusEffect::Confusion | StatusEffect::Invisibility => 0,
        }
    }
}

/// An effect and the turns it has left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub effect: StatusEffect,
    pub remaining: i32,
}

/// Per-entity effect collection keyed by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffects {
    active: Vec<ActiveEffect>,
}

impl StatusEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an effect, or refreshes the existing one of the same kind.
    ///
    /// A refresh keeps the longer duration and the stronger payload, and the
    /// effect keeps its original position. Returns `false` for a
    /// non-positive duration or a poison that deals no damage.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{StatusEffect, StatusEffectKind, StatusEffects};
    ///
    /// let mut effects = StatusEffects::new();
    /// assert!(effects.add(StatusEffect::Poison { damage: 2 }, 5));
    /// assert!(effects.add(StatusEffect::Poison { damage: 3 }, 2));
    ///
    /// let poison = effects.get(StatusEffectKind::Poison).unwrap();
    /// assert_eq!(poison.remaining, 5);
    /// assert_eq!(poison.effect, StatusEffect::Poison { damage: 3 });
    /// assert_eq!(effects.len(), 1);
    /// ```
    pub fn add(&mut self, effect: StatusEffect, duration: i32) -> bool {
        if duration <= 0 {
            return false;
        }
        if let StatusEffect::Poison { damage } = effect {
            if damage <= 0 {
                return false;
            }
        }
        match self
            .active
            .iter_mut()
            .find(|active| active.effect.kind() == effect.kind())
        {
            Some(existing) => {
                existing.remaining = existing.remaining.max(duration);
                if effect.magnitude() > existing.effect.magnitude() {
                    existing.effect = effect;
                }
            }
            None => self.active.push(ActiveEffect {
                effect,
                remaining: duration,
            }),
        }
        true
    }

    /// Removes the effect of a kind. Returns whether one was present.
    pub fn remove(&mut self, kind: StatusEffectKind) -> bool {
        let before = self.active.len();
        self.active.retain(|active| active.effect.kind() != kind);
        self.active.len() != before
    }

    pub fn has(&self, kind: StatusEffectKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn get(&self, kind: StatusEffectKind) -> Option<&ActiveEffect> {
        self.active.iter().find(|active| active.effect.kind() == kind)
    }

    /// Active effects in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ActiveEffect> {
        self.active.iter()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }

    /// Decrements every duration and removes the effects that reach zero.
    ///
    /// Returns the expired kinds in insertion order.
    pub fn tick_durations(&mut self) -> Vec<StatusEffectKind> {
        let mut expired = Vec::new();
        for active in &mut self.active {
            active.remaining -= 1;
            if active.remaining <= 0 {
                expired.push(active.effect.kind());
            }
        }
        self.active.retain(|active| active.remaining > 0);
        expired
    }

    /// Summed `(power, defense)` bonuses from active effects.
    pub fn stat_modifiers(&self) -> (i32, i32) {
        self.active
            .iter()
            .fold((0, 0), |(power, defense), active| match active.effect {
                StatusEffect::Strength { bonus } => (power + bonus, defense),
                StatusEffect::Shield { bonus } => (power, defense + bonus),
                _ => (power, defense),
            })
    }
}

/// What [`process_effects`] did to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectOutcome {
    /// No effect collection, or an empty one
    Unaffected,
    /// Effects ticked and the entity is still alive
    Survived,
    /// An effect killed the entity; its effects were cleared
    Died,
}

/// Applies an effect to an entity and reports it.
///
/// Returns `false` without notifying when the collection refuses the effect.
pub fn apply_effect(
    store: &mut EntityStore,
    id: EntityId,
    effect: StatusEffect,
    duration: i32,
    sink: &mut impl NotificationSink,
) -> DelveResult<bool> {
    let entity = store.entity_mut(id)?;
    if !entity.status_effects_mut().add(effect, duration) {
        return Ok(false);
    }
    let remaining = entity
        .status_effects_mut()
        .get(effect.kind())
        .map(|active| active.remaining)
        .unwrap_or(duration);
    log::debug!("{} gains {} for {} turns", entity.name, effect.kind(), remaining);
    sink.notify(GameEvent::EffectApplied {
        entity: id,
        name: entity.name.clone(),
        effect,
        duration: remaining,
    });
    Ok(true)
}

/// Removes an effect immediately and reports its expiry.
pub fn remove_effect(
    store: &mut EntityStore,
    id: EntityId,
    kind: StatusEffectKind,
    sink: &mut impl NotificationSink,
) -> DelveResult<bool> {
    let entity = store.entity_mut(id)?;
    let removed = entity
        .status_effects
        .as_mut()
        .map(|effects| effects.remove(kind))
        .unwrap_or(false);
    if removed {
        sink.notify(GameEvent::EffectExpired {
            entity: id,
            name: entity.name.clone(),
            kind,
        });
    }
    Ok(removed)
}

/// `(power, defense)` bonuses granted by an entity's effects.
pub fn stat_modifiers(entity: &Entity) -> (i32, i32) {
    entity
        .status_effects
        .as_ref()
        .map(StatusEffects::stat_modifiers)
        .unwrap_or((0, 0))
}

/// Runs one turn of status effects for one entity.
///
/// # Examples
///
/// ```
/// use delve::{
///     apply_effect, process_effects, EffectOutcome, Entity, EntityStore, GameEvent,
///     MonsterTemplate, Position, StatusEffect,
/// };
///
/// let mut store = EntityStore::new();
/// let rat = store.spawn(Entity::monster(&MonsterTemplate::RAT, Position::new(1, 1)));
/// let mut events: Vec<GameEvent> = Vec::new();
///
/// apply_effect(&mut store, rat, StatusEffect::Poison { damage: 10 }, 3, &mut events).unwrap();
/// let outcome = process_effects(&mut store, rat, &mut events).unwrap();
///
/// assert_eq!(outcome, EffectOutcome::Died);
/// assert!(store.entity(rat).unwrap().status_effects.as_ref().unwrap().is_empty());
/// ```
pub fn process_effects(
    store: &mut EntityStore,
    id: EntityId,
    sink: &mut impl NotificationSink,
) -> DelveResult<EffectOutcome> {
    let entity = store.entity_mut(id)?;
    let snapshot: Vec<StatusEffect> = match entity.status_effects.as_ref() {
        Some(effects) if !effects.is_empty() => {
            effects.iter().map(|active| active.effect).collect()
        }
        _ => return Ok(EffectOutcome::Unaffected),
    };

    for effect in snapshot {
        if let StatusEffect::Poison { damage } = effect {
            let health = entity.health_mut()?;
            health.take_damage(damage);
            if !health.is_alive() {
                entity.status_effects_mut().clear();
                log::info!("{} succumbs to {}", entity.name, effect.kind());
                return Ok(EffectOutcome::Died);
            }
        }
    }

    let name = entity.name.clone();
    let effects = entity.status_effects_mut();
    for active in effects.iter() {
        sink.notify(GameEvent::EffectTicked {
            entity: id,
            name: name.clone(),
            effect: active.effect,
            remaining: active.remaining - 1,
        });
    }

    for kind in effects.tick_durations() {
        log::debug!("{} on {} expired", kind, name);
        sink.notify(GameEvent::EffectExpired {
            entity: id,
            name: name.clone(),
            kind,
        });
    }
    Ok(EffectOutcome::Survived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MonsterTemplate, Position};

    fn store_with_target(max_hp: i32) -> (EntityStore, EntityId) {
        let mut store = EntityStore::new();
        let id = store.spawn(
            Entity::monster(&MonsterTemplate::ORC, Position::new(2, 2)).with_health(max_hp),
        );
        (store, id)
    }

    #[test]
    fn test_non_positive_duration_rejected() {
        let (mut store, id) = store_with_target(10);
        let mut events: Vec<GameEvent> = Vec::new();
        assert!(!apply_effect(&mut store, id, StatusEffect::Confusion, 0, &mut events).unwrap());
        assert!(!apply_effect(&mut store, id, StatusEffect::Confusion, -2, &mut events).unwrap());
        assert!(events.is_empty());
        assert!(!store.entity(id).unwrap().has_status(StatusEffectKind::Confusion));
    }

    #[test]
    fn test_refresh_keeps_insertion_position() {
        let mut effects = StatusEffects::new();
        effects.add(StatusEffect::Confusion, 3);
        effects.add(StatusEffect::Strength { bonus: 2 }, 3);
        effects.add(StatusEffect::Confusion, 8);

        let kinds: Vec<_> = effects.iter().map(|a| a.effect.kind()).collect();
        assert_eq!(
            kinds,
            vec![StatusEffectKind::Confusion, StatusEffectKind::Strength]
        );
        assert_eq!(effects.get(StatusEffectKind::Confusion).unwrap().remaining, 8);
    }

    #[test]
    fn test_poison_ticks_and_expires() {
        let (mut store, id) = store_with_target(10);
        let mut events: Vec<GameEvent> = Vec::new();
        apply_effect(&mut store, id, StatusEffect::Poison { damage: 3 }, 2, &mut events).unwrap();
        events.clear();

        let outcome = process_effects(&mut store, id, &mut events).unwrap();
        assert_eq!(outcome, EffectOutcome::Survived);
        let entity = store.entity(id).unwrap();
        assert_eq!(entity.health().unwrap().current(), 7);
        assert_eq!(
            entity
                .status_effects
                .as_ref()
                .unwrap()
                .get(StatusEffectKind::Poison)
                .unwrap()
                .remaining,
            1
        );
        assert!(matches!(
            events.as_slice(),
            [GameEvent::EffectTicked { remaining: 1, .. }]
        ));

        events.clear();
        process_effects(&mut store, id, &mut events).unwrap();
        let entity = store.entity(id).unwrap();
        assert_eq!(entity.health().unwrap().current(), 4);
        assert!(!entity.has_status(StatusEffectKind::Poison));
        assert!(events.iter().any(|event| matches!(
            event,
            GameEvent::EffectExpired {
                kind: StatusEffectKind::Poison,
                ..
            }
        )));
    }

    #[test]
    fn test_death_clears_all_effects_without_ticks() {
        let (mut store, id) = store_with_target(5);
        let mut events: Vec<GameEvent> = Vec::new();
        apply_effect(&mut store, id, StatusEffect::Confusion, 4, &mut events).unwrap();
        apply_effect(&mut store, id, StatusEffect::Poison { damage: 9 }, 4, &mut events).unwrap();
        apply_effect(&mut store, id, StatusEffect::Shield { bonus: 1 }, 4, &mut events).unwrap();
        events.clear();

        let outcome = process_effects(&mut store, id, &mut events).unwrap();
        assert_eq!(outcome, EffectOutcome::Died);
        assert!(events.is_empty());
        let entity = store.entity(id).unwrap();
        assert!(entity.status_effects.as_ref().unwrap().is_empty());
        assert_eq!(entity.health().unwrap().current(), 0);
    }

    #[test]
    fn test_no_collection_is_noop() {
        let mut store = EntityStore::new();
        let id = store.spawn(Entity::new("Statue", 'S', crate::EntityKind::Monster, Position::new(0, 0)));
        let mut events: Vec<GameEvent> = Vec::new();
        assert_eq!(
            process_effects(&mut store, id, &mut events).unwrap(),
            EffectOutcome::Unaffected
        );
    }

    #[test]
    fn test_poison_without_health_is_error() {
        let mut store = EntityStore::new();
        let id = store.spawn(Entity::new("Statue", 'S', crate::EntityKind::Monster, Position::new(0, 0)));
        let mut events: Vec<GameEvent> = Vec::new();
        apply_effect(&mut store, id, StatusEffect::Poison { damage: 1 }, 2, &mut events).unwrap();
        assert!(process_effects(&mut store, id, &mut events).is_err());
    }

    #[test]
    fn test_remove_effect_reports_expiry() {
        let (mut store, id) = store_with_target(10);
        let mut events: Vec<GameEvent> = Vec::new();
        apply_effect(&mut store, id, StatusEffect::Invisibility, 5, &mut events).unwrap();
        events.clear();

        assert!(remove_effect(&mut store, id, StatusEffectKind::Invisibility, &mut events).unwrap());
        assert!(!remove_effect(&mut store, id, StatusEffectKind::Invisibility, &mut events).unwrap());
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_stat_modifiers_sum() {
        let (mut store, id) = store_with_target(10);
        let mut events: Vec<GameEvent> = Vec::new();
        apply_effect(&mut store, id, StatusEffect::Strength { bonus: 3 }, 5, &mut events).unwrap();
        apply_effect(&mut store, id, StatusEffect::Shield { bonus: 2 }, 5, &mut events).unwrap();
        assert_eq!(stat_modifiers(store.entity(id).unwrap()), (3, 2));
    }

    #[test]
    fn test_harmless_poison_rejected() {
        let (mut store, id) = store_with_target(10);
        let mut events: Vec<GameEvent> = Vec::new();
        assert!(!apply_effect(&mut store, id, StatusEffect::Poison { damage: 0 }, 3, &mut events)
            .unwrap());
        assert!(!apply_effect(&mut store, id, StatusEffect::Poison { damage: -4 }, 3, &mut events)
            .unwrap());
        assert!(events.is_empty());
        assert!(!store.entity(id).unwrap().has_status(StatusEffectKind::Poison));
    }
}
