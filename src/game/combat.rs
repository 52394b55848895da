//! # Combat
//!
//! Melee resolution, death processing and experience.

use crate::{
    stat_modifiers, DelveResult, Entity, EntityId, EntityStore, GameEvent, NotificationSink,
};

/// Hit points gained per level.
pub const LEVEL_UP_HP: i32 = 20;

/// Result of one melee attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackOutcome {
    pub damage: i32,
    pub defender_died: bool,
}

/// Base power plus status-effect bonuses.
pub fn effective_power(entity: &Entity) -> DelveResult<i32> {
    Ok(entity.combat()?.power + stat_modifiers(entity).0)
}

/// Base defense plus status-effect bonuses.
pub fn effective_defense(entity: &Entity) -> DelveResult<i32> {
    Ok(entity.combat()?.defense + stat_modifiers(entity).1)
}

/// Resolves a melee attack. Damage is power minus defense, floored at zero.
///
/// Death is reported but not processed; call [`handle_death`] when
/// `defender_died` is set.
///
/// # Examples
///
/// ```
/// use delve::{resolve_attack, Entity, EntityStore, GameEvent, MonsterTemplate, Position};
///
/// let mut store = EntityStore::new();
/// let player = store.spawn(Entity::player(Position::new(1, 1)));
/// let orc = store.spawn(Entity::monster(&MonsterTemplate::ORC, Position::new(2, 1)));
/// let mut events: Vec<GameEvent> = Vec::new();
///
/// let outcome = resolve_attack(&mut store, player, orc, &mut events).unwrap();
/// assert_eq!(outcome.damage, 5);
/// assert!(!outcome.defender_died);
/// ```
pub fn resolve_attack(
    store: &mut EntityStore,
    attacker: EntityId,
    defender: EntityId,
    sink: &mut impl NotificationSink,
) -> DelveResult<AttackOutcome> {
    let (power, attacker_name) = {
        let entity = store.entity(attacker)?;
        (effective_power(entity)?, entity.name.clone())
    };

    let target = store.entity_mut(defender)?;
    let defense = effective_defense(target)?;
    let damage = target.health_mut()?.take_damage((power - defense).max(0));
    let defender_died = !target.is_alive();

    log::debug!(
        "{} hits {} for {} ({} vs {})",
        attacker_name,
        target.name,
        damage,
        power,
        defense
    );
    sink.notify(GameEvent::Attacked {
        attacker,
        attacker_name,
        defender,
        defender_name: target.name.clone(),
        damage,
    });
    Ok(AttackOutcome {
        damage,
        defender_died,
    })
}

/// Processes a death.
///
/// The victim's effects are cleared and it stops blocking. Monsters leave the
/// store; the player stays so the game-over screen can read it. A killer with
/// experience collects the victim's XP.
pub fn handle_death(
    store: &mut EntityStore,
    victim: EntityId,
    killer: Option<EntityId>,
    sink: &mut impl NotificationSink,
) -> DelveResult<()> {
    let entity = store.entity_mut(victim)?;
    if let Some(effects) = entity.status_effects.as_mut() {
        effects.clear();
    }
    entity.blocks_movement = false;
    let name = entity.name.clone();
    let xp_value = entity.xp_value;
    let is_monster = entity.is_monster();

    log::info!("{} dies", name);
    sink.notify(GameEvent::Died {
        entity: victim,
        name,
        killer,
    });

    if is_monster {
        store.despawn(victim);
    }
    if let Some(killer) = killer {
        if xp_value > 0 {
            award_xp(store, killer, xp_value, sink)?;
        }
    }
    Ok(())
}

/// Adds experience and applies any level-ups.
///
/// Entities without an experience component ignore XP.
pub fn award_xp(
    store: &mut EntityStore,
    recipient: EntityId,
    amount: u32,
    sink: &mut impl NotificationSink,
) -> DelveResult<()> {
    let entity = store.entity_mut(recipient)?;
    let Some(experience) = entity.experience.as_mut() else {
        return Ok(());
    };
    let levels = experience.gain(amount);
    let first_new_level = experience.level + 1 - levels;
    sink.notify(GameEvent::XpGained {
        entity: recipient,
        amount,
    });

    for level in first_new_level..first_new_level + levels {
        if let Some(health) = entity.health.as_mut() {
            health.raise_max(LEVEL_UP_HP);
        }
        if let Some(combat) = entity.combat.as_mut() {
            combat.power += 1;
            combat.defense += 1;
        }
        log::info!("{} reaches level {}", entity.name, level);
        sink.notify(GameEvent::LevelUp {
            entity: recipient,
            name: entity.name.clone(),
            level,
        });
    }
    Ok(())
}
