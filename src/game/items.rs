//! # Items
//!
//! Item definitions and the effects consumables apply when used.

use crate::{
    apply_effect, combat, DelveResult, EntityId, EntityStore, GameEvent, NotificationSink,
    Rejection, StatusEffect,
};
use serde::{Deserialize, Serialize};

/// Equipment slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipSlot {
    Weapon,
    Armor,
}

/// What a consumable does when used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemEffect {
    Heal(i32),
    Confuse { turns: i32 },
    Lightning { damage: i32 },
    Poison { damage: i32, turns: i32 },
    Invisibility { turns: i32 },
    Strength { bonus: i32, turns: i32 },
    ManaRestore(i32),
}

impl ItemEffect {
    /// Whether the effect is aimed at another entity.
    pub fn needs_target(&self) -> bool {
        matches!(
            self,
            ItemEffect::Confuse { .. } | ItemEffect::Lightning { .. } | ItemEffect::Poison { .. }
        )
    }
}

/// Consumable or equippable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Consumable(ItemEffect),
    Equippable {
        slot: EquipSlot,
        power: i32,
        defense: i32,
    },
}

/// An item, on the floor or carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub glyph: char,
    pub kind: ItemKind,
}

impl Item {
    pub fn new(name: impl Into<String>, glyph: char, kind: ItemKind) -> Self {
        Self {
            name: name.into(),
            glyph,
            kind,
        }
    }

    pub fn healing_potion() -> Self {
        Self::new("Healing Potion", '!', ItemKind::Consumable(ItemEffect::Heal(20)))
    }

    pub fn confusion_scroll(turns: i32) -> Self {
        Self::new(
            "Scroll of Confusion",
            '?',
            ItemKind::Consumable(ItemEffect::Confuse { turns }),
        )
    }

    pub fn lightning_scroll() -> Self {
        Self::new(
            "Scroll of Lightning",
            '?',
            ItemKind::Consumable(ItemEffect::Lightning { damage: 20 }),
        )
    }

    pub fn poison_vial() -> Self {
        Self::new(
            "Vial of Poison",
            '!',
            ItemKind::Consumable(ItemEffect::Poison {
                damage: 2,
                turns: 5,
            }),
        )
    }

    pub fn invisibility_potion() -> Self {
        Self::new(
            "Potion of Invisibility",
            '!',
            ItemKind::Consumable(ItemEffect::Invisibility { turns: 10 }),
        )
    }

    pub fn strength_potion() -> Self {
        Self::new(
            "Potion of Strength",
            '!',
            ItemKind::Consumable(ItemEffect::Strength { bonus: 3, turns: 20 }),
        )
    }

    pub fn mana_potion() -> Self {
        Self::new("Mana Potion", '!', ItemKind::Consumable(ItemEffect::ManaRestore(10)))
    }

    pub fn dagger() -> Self {
        Self::new(
            "Dagger",
            '/',
            ItemKind::Equippable {
                slot: EquipSlot::Weapon,
                power: 2,
                defense: 0,
            },
        )
    }

    pub fn leather_armor() -> Self {
        Self::new(
            "Leather Armor",
            '[',
            ItemKind::Equippable {
                slot: EquipSlot::Armor,
                power: 0,
                defense: 1,
            },
        )
    }

    /// The item spawned by a layout glyph.
    ///
    /// `!` healing potion, `?` confusion scroll, `*` lightning scroll,
    /// `~` poison vial, `"` invisibility potion, `+` strength potion,
    /// `&` mana potion, `/` dagger, `[` leather armor.
    pub fn for_glyph(glyph: char, confusion_turns: i32) -> Option<Self> {
        let item = match glyph {
            '!' => Self::healing_potion(),
            '?' => Self::confusion_scroll(confusion_turns),
            '*' => Self::lightning_scroll(),
            '~' => Self::poison_vial(),
            '"' => Self::invisibility_potion(),
            '+' => Self::strength_potion(),
            '&' => Self::mana_potion(),
            '/' => Self::dagger(),
            '[' => Self::leather_armor(),
            _ => return None,
        };
        Some(item)
    }

    /// The effect if this is a consumable.
    pub fn effect(&self) -> Option<ItemEffect> {
        match self.kind {
            ItemKind::Consumable(effect) => Some(effect),
            ItemKind::Equippable { .. } => None,
        }
    }
}

/// Outcome of using an item or casting a spell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseOutcome {
    Applied,
    Failed(Rejection),
}

/// Applies a consumable's effect.
///
/// Checks come first, so a failure changes nothing. Removing the item from
/// the inventory is the caller's job.
pub fn apply_item_effect(
    store: &mut EntityStore,
    user: EntityId,
    item: &Item,
    target: Option<EntityId>,
    sink: &mut impl NotificationSink,
) -> DelveResult<UseOutcome> {
    let Some(effect) = item.effect() else {
        return Ok(UseOutcome::Failed(Rejection::NotUsable));
    };

    let target = if effect.needs_target() {
        match target {
            Some(id) if store.is_alive(id) && id != user => id,
            Some(_) => return Ok(UseOutcome::Failed(Rejection::InvalidTarget)),
            None => return Ok(UseOutcome::Failed(Rejection::NeedsTarget)),
        }
    } else {
        user
    };

    match effect {
        ItemEffect::Heal(amount) => {
            let entity = store.entity_mut(user)?;
            let health = entity.health_mut()?;
            if health.is_full() {
                return Ok(UseOutcome::Failed(Rejection::FullHealth));
            }
            let healed = health.heal(amount);
            sink.notify(GameEvent::Healed {
                entity: user,
                name: entity.name.clone(),
                amount: healed,
            });
        }
        ItemEffect::ManaRestore(amount) => {
            let mana = store.entity_mut(user)?.mana_mut()?;
            if mana.is_full() {
                return Ok(UseOutcome::Failed(Rejection::FullMana));
            }
            let restored = mana.restore(amount);
            sink.notify(GameEvent::ManaRestored {
                entity: user,
                amount: restored,
            });
        }
        ItemEffect::Confuse { turns } => {
            apply_effect(store, target, StatusEffect::Confusion, turns, sink)?;
        }
        ItemEffect::Poison { damage, turns } => {
            apply_effect(store, target, StatusEffect::Poison { damage }, turns, sink)?;
        }
        ItemEffect::Invisibility { turns } => {
            apply_effect(store, target, StatusEffect::Invisibility, turns, sink)?;
        }
        ItemEffect::Strength { bonus, turns } => {
            apply_effect(store, target, StatusEffect::Strength { bonus }, turns, sink)?;
        }
        ItemEffect::Lightning { damage } => {
            deal_damage(store, user, target, damage, &item.name, sink)?;
        }
    }
    Ok(UseOutcome::Applied)
}

/// Direct damage that ignores defense. Processes the death if it kills.
pub fn deal_damage(
    store: &mut EntityStore,
    source: EntityId,
    target: EntityId,
    amount: i32,
    source_name: &str,
    sink: &mut impl NotificationSink,
) -> DelveResult<bool> {
    let entity = store.entity_mut(target)?;
    let dealt = entity.health_mut()?.take_damage(amount);
    let died = !entity.is_alive();
    sink.notify(GameEvent::Damaged {
        entity: target,
        name: entity.name.clone(),
        amount: dealt,
        source: source_name.to_string(),
    });
    if died {
        combat::handle_death(store, target, Some(source), sink)?;
    }
    Ok(died)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Entity, MonsterTemplate, Position, StatusEffectKind};

    fn setup() -> (EntityStore, EntityId, EntityId) {
        let mut store = EntityStore::new();
        let player = store.spawn(Entity::player(Position::new(1, 1)));
        let orc = store.spawn(Entity::monster(&MonsterTemplate::ORC, Position::new(4, 1)));
        (store, player, orc)
    }

    #[test]
    fn test_heal_fails_at_full_health() {
        let (mut store, player, _) = setup();
        let mut events: Vec<GameEvent> = Vec::new();
        let outcome =
            apply_item_effect(&mut store, player, &Item::healing_potion(), None, &mut events)
                .unwrap();
        assert_eq!(outcome, UseOutcome::Failed(Rejection::FullHealth));
        assert!(events.is_empty());

        store.entity_mut(player).unwrap().health_mut().unwrap().set_current(25);
        let outcome =
            apply_item_effect(&mut store, player, &Item::healing_potion(), None, &mut events)
                .unwrap();
        assert_eq!(outcome, UseOutcome::Applied);
        assert_eq!(store.entity(player).unwrap().health().unwrap().current(), 30);
    }

    #[test]
    fn test_confusion_needs_live_target() {
        let (mut store, player, orc) = setup();
        let scroll = Item::confusion_scroll(10);
        let mut events: Vec<GameEvent> = Vec::new();

        assert_eq!(
            apply_item_effect(&mut store, player, &scroll, None, &mut events).unwrap(),
            UseOutcome::Failed(Rejection::NeedsTarget)
        );
        assert_eq!(
            apply_item_effect(&mut store, player, &scroll, Some(player), &mut events).unwrap(),
            UseOutcome::Failed(Rejection::InvalidTarget)
        );
        assert_eq!(
            apply_item_effect(&mut store, player, &scroll, Some(orc), &mut events).unwrap(),
            UseOutcome::Applied
        );
        let confusion = store
            .entity(orc)
            .unwrap()
            .status_effects
            .as_ref()
            .unwrap()
            .get(StatusEffectKind::Confusion)
            .copied()
            .unwrap();
        assert_eq!(confusion.remaining, 10);
    }

    #[test]
    fn test_lightning_kill_awards_xp() {
        let (mut store, player, orc) = setup();
        let mut events: Vec<GameEvent> = Vec::new();
        apply_item_effect(
            &mut store,
            player,
            &Item::lightning_scroll(),
            Some(orc),
            &mut events,
        )
        .unwrap();
        assert!(!store.contains(orc));
        assert_eq!(store.entity(player).unwrap().experience.unwrap().xp, 35);
    }

    #[test]
    fn test_equipment_is_not_usable() {
        let (mut store, player, _) = setup();
        let mut events: Vec<GameEvent> = Vec::new();
        assert_eq!(
            apply_item_effect(&mut store, player, &Item::dagger(), None, &mut events).unwrap(),
            UseOutcome::Failed(Rejection::NotUsable)
        );
    }

    #[test]
    fn test_glyph_lookup() {
        assert_eq!(Item::for_glyph('?', 4), Some(Item::confusion_scroll(4)));
        assert_eq!(Item::for_glyph('x', 4), None);
    }
}
