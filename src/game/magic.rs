//! # Magic
//!
//! Spells, the spellbook, and casting.

use crate::{
    apply_effect, deal_damage, DelveResult, EntityId, EntityStore, GameEvent, NotificationSink,
    Rejection, StatusEffect, UseOutcome,
};
use serde::{Deserialize, Serialize};

/// Who a spell can be aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpellTarget {
    SelfOnly,
    Single,
}

/// What a spell does; the magnitude comes from [`Spell::power`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpellEffect {
    Damage,
    Heal,
    Confuse { turns: i32 },
    Poison { turns: i32 },
    Empower { turns: i32 },
}

/// A castable spell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spell {
    pub name: String,
    pub mana_cost: i32,
    pub power: i32,
    pub range: u32,
    pub targeting: SpellTarget,
    pub effect: SpellEffect,
}

impl Spell {
    pub fn magic_missile() -> Self {
        Self {
            name: "Magic Missile".to_string(),
            mana_cost: 5,
            power: 8,
            range: 8,
            targeting: SpellTarget::Single,
            effect: SpellEffect::Damage,
        }
    }

    pub fn minor_heal() -> Self {
        Self {
            name: "Minor Heal".to_string(),
            mana_cost: 6,
            power: 10,
            range: 0,
            targeting: SpellTarget::SelfOnly,
            effect: SpellEffect::Heal,
        }
    }

    pub fn befuddle() -> Self {
        Self {
            name: "Befuddle".to_string(),
            mana_cost: 8,
            power: 0,
            range: 8,
            targeting: SpellTarget::Single,
            effect: SpellEffect::Confuse { turns: 5 },
        }
    }

    pub fn venom() -> Self {
        Self {
            name: "Venom".to_string(),
            mana_cost: 7,
            power: 2,
            range: 6,
            targeting: SpellTarget::Single,
            effect: SpellEffect::Poison { turns: 5 },
        }
    }

    pub fn empower() -> Self {
        Self {
            name: "Empower".to_string(),
            mana_cost: 10,
            power: 3,
            range: 0,
            targeting: SpellTarget::SelfOnly,
            effect: SpellEffect::Empower { turns: 10 },
        }
    }

    pub fn needs_target(&self) -> bool {
        self.targeting == SpellTarget::Single
    }
}

/// Spells an entity knows, in learning order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spellbook {
    spells: Vec<Spell>,
}

impl Spellbook {
    /// The player's starting spells.
    pub fn starting() -> Self {
        Self {
            spells: vec![
                Spell::magic_missile(),
                Spell::minor_heal(),
                Spell::befuddle(),
                Spell::venom(),
                Spell::empower(),
            ],
        }
    }

    pub fn get(&self, index: usize) -> Option<&Spell> {
        self.spells.get(index)
    }

    pub fn spells(&self) -> &[Spell] {
        &self.spells
    }
}

/// Casts a spell.
///
/// All checks run before any mana is spent: the caster must be alive with
/// enough mana, the target alive and within range, and a heal must have
/// something to heal. Self-only spells ignore `target`.
///
/// # Examples
///
/// ```
/// use delve::{cast_spell, Entity, EntityStore, GameEvent, MonsterTemplate, Position, Spell, UseOutcome};
///
/// let mut store = EntityStore::new();
/// let player = store.spawn(Entity::player(Position::new(1, 1)));
/// let orc = store.spawn(Entity::monster(&MonsterTemplate::ORC, Position::new(3, 1)));
/// let mut events: Vec<GameEvent> = Vec::new();
///
/// let outcome = cast_spell(&mut store, player, &Spell::magic_missile(), Some(orc), &mut events).unwrap();
/// assert_eq!(outcome, UseOutcome::Applied);
/// assert_eq!(store.entity(orc).unwrap().health().unwrap().current(), 2);
/// ```
pub fn cast_spell(
    store: &mut EntityStore,
    caster: EntityId,
    spell: &Spell,
    target: Option<EntityId>,
    sink: &mut impl NotificationSink,
) -> DelveResult<UseOutcome> {
    let caster_entity = store.entity(caster)?;
    if !caster_entity.is_alive() {
        return Ok(UseOutcome::Failed(Rejection::CasterDead));
    }
    let have = caster_entity.mana.map(|mana| mana.current()).unwrap_or(0);
    if have < spell.mana_cost {
        return Ok(UseOutcome::Failed(Rejection::NotEnoughMana {
            have,
            need: spell.mana_cost,
        }));
    }

    let target = match spell.targeting {
        SpellTarget::SelfOnly => caster,
        SpellTarget::Single => match target {
            None => return Ok(UseOutcome::Failed(Rejection::NeedsTarget)),
            Some(id) if id == caster || !store.is_alive(id) => {
                return Ok(UseOutcome::Failed(Rejection::InvalidTarget))
            }
            Some(id) => id,
        },
    };
    let caster_position = caster_entity.position;
    let target_entity = store.entity(target)?;
    if caster_position.manhattan_distance(target_entity.position) > spell.range {
        return Ok(UseOutcome::Failed(Rejection::OutOfRange));
    }
    if spell.effect == SpellEffect::Heal && target_entity.health()?.is_full() {
        return Ok(UseOutcome::Failed(Rejection::FullHealth));
    }
    let target_name = target_entity.name.clone();

    store.entity_mut(caster)?.mana_mut()?.consume(spell.mana_cost);
    log::debug!("{} cast on {}", spell.name, target_name);
    sink.notify(GameEvent::SpellCast {
        caster,
        spell_name: spell.name.clone(),
        target,
        target_name: target_name.clone(),
    });

    match spell.effect {
        SpellEffect::Damage => {
            deal_damage(store, caster, target, spell.power, &spell.name, sink)?;
        }
        SpellEffect::Heal => {
            let healed = store.entity_mut(target)?.health_mut()?.heal(spell.power);
            sink.notify(GameEvent::Healed {
                entity: target,
                name: target_name,
                amount: healed,
            });
        }
        SpellEffect::Confuse { turns } => {
            apply_effect(store, target, StatusEffect::Confusion, turns, sink)?;
        }
        SpellEffect::Poison { turns } => {
            let poison = StatusEffect::Poison {
                damage: spell.power,
            };
            apply_effect(store, target, poison, turns, sink)?;
        }
        SpellEffect::Empower { turns } => {
            let strength = StatusEffect::Strength { bonus: spell.power };
            apply_effect(store, target, strength, turns, sink)?;
        }
    }
    Ok(UseOutcome::Applied)
}
