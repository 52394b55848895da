//! # Components
//!
//! Plain data components attached to entities. Each entity owns zero or one of
//! each; the systems read and mutate them through the [`EntityStore`].
//!
//! [`EntityStore`]: crate::EntityStore

use crate::{AiState, EquipSlot, Item, INVENTORY_CAPACITY};
use serde::{Deserialize, Serialize};

/// Hit points of a living entity.
///
/// Invariant: `0 <= current <= max`. Death is the transition to `current == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthComponent {
    current: i32,
    max: i32,
}

impl HealthComponent {
    /// Creates a health component at full health.
    pub fn new(max: i32) -> Self {
        let max = max.max(1);
        Self { current: max, max }
    }

    /// Current hit points.
    pub fn current(&self) -> i32 {
        self.current
    }

    /// Maximum hit points.
    pub fn max(&self) -> i32 {
        self.max
    }

    /// Whether the entity still has hit points.
    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    /// Whether the entity is at full health.
    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Sets hit points, clamped to `0..=max`.
    pub fn set_current(&mut self, value: i32) {
        self.current = value.clamp(0, self.max);
    }

    /// Applies damage and returns the amount actually taken.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::HealthComponent;
    ///
    /// let mut health = HealthComponent::new(10);
    /// assert_eq!(health.take_damage(3), 3);
    /// assert_eq!(health.take_damage(50), 7);
    /// assert_eq!(health.current(), 0);
    /// assert!(!health.is_alive());
    /// ```
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let before = self.current;
        self.set_current(self.current - amount.max(0));
        before - self.current
    }

    /// Heals and returns the amount actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.current;
        self.set_current(self.current + amount.max(0));
        self.current - before
    }

    /// Raises the maximum and heals by the same amount.
    pub fn raise_max(&mut self, amount: i32) {
        self.max += amount;
        self.set_current(self.current + amount);
    }
}

/// Base attack and defense values.
///
/// Equipment writes these directly; bonuses may be negative, so defense can
/// legitimately drop below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatComponent {
    pub power: i32,
    pub defense: i32,
}

impl CombatComponent {
    /// Creates a combat component.
    pub fn new(power: i32, defense: i32) -> Self {
        Self { power, defense }
    }
}

/// Mana points for spellcasters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManaComponent {
    current: i32,
    max: i32,
    /// Mana restored by [`ManaComponent::regenerate`]
    pub regen: i32,
}

impl ManaComponent {
    /// Creates a full mana pool.
    pub fn new(max: i32, regen: i32) -> Self {
        Self {
            current: max.max(0),
            max: max.max(0),
            regen,
        }
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Whether at least `amount` mana is available.
    pub fn has(&self, amount: i32) -> bool {
        self.current >= amount
    }

    /// Spends mana if enough is available.
    pub fn consume(&mut self, amount: i32) -> bool {
        if !self.has(amount) {
            return false;
        }
        self.current -= amount;
        true
    }

    /// Restores mana, clamped to the maximum. Returns the amount restored.
    pub fn restore(&mut self, amount: i32) -> i32 {
        let before = self.current;
        self.current = (self.current + amount.max(0)).min(self.max);
        self.current - before
    }

    /// Restores `regen` mana.
    pub fn regenerate(&mut self) -> i32 {
        self.restore(self.regen)
    }
}

/// Experience and character level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub level: u32,
    pub xp: u32,
}

impl Experience {
    /// Creates a level 1 character with no experience.
    pub fn new() -> Self {
        Self { level: 1, xp: 0 }
    }

    /// Experience required to leave the current level.
    pub fn next_level_at(&self) -> u32 {
        self.level * 100
    }

    /// Adds experience and returns the number of levels gained.
    pub fn gain(&mut self, amount: u32) -> u32 {
        self.xp += amount;
        let mut gained = 0;
        while self.xp >= self.next_level_at() {
            self.xp -= self.next_level_at();
            self.level += 1;
            gained += 1;
        }
        gained
    }
}

impl Default for Experience {
    fn default() -> Self {
        Self::new()
    }
}

/// Items carried by an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    items: Vec<Item>,
    capacity: usize,
}

impl Inventory {
    /// Creates an empty inventory with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Adds an item, handing it back if the inventory is full.
    pub fn add(&mut self, item: Item) -> Result<(), Item> {
        if self.is_full() {
            return Err(item);
        }
        self.items.push(item);
        Ok(())
    }

    /// Gets the item in the given slot.
    pub fn get(&self, slot: usize) -> Option<&Item> {
        self.items.get(slot)
    }

    /// Removes and returns the item in the given slot.
    pub fn take(&mut self, slot: usize) -> Option<Item> {
        if slot < self.items.len() {
            Some(self.items.remove(slot))
        } else {
            None
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new(INVENTORY_CAPACITY)
    }
}

/// Worn and wielded items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub weapon: Option<Item>,
    pub armor: Option<Item>,
}

impl Equipment {
    /// Gets the item in a slot.
    pub fn slot(&self, slot: EquipSlot) -> Option<&Item> {
        match slot {
            EquipSlot::Weapon => self.weapon.as_ref(),
            EquipSlot::Armor => self.armor.as_ref(),
        }
    }

    /// Mutable access to a slot.
    pub fn slot_mut(&mut self, slot: EquipSlot) -> &mut Option<Item> {
        match slot {
            EquipSlot::Weapon => &mut self.weapon,
            EquipSlot::Armor => &mut self.armor,
        }
    }
}

/// Behavior state holder for a monster.
///
/// The state is a classification recomputed on every decision, not owned
/// behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterAi {
    pub state: AiState,
    /// Monsters closer than this chase; at or beyond it they idle
    pub chase_range: u32,
}

impl MonsterAi {
    /// Creates an idle AI with the given chase range.
    pub fn new(chase_range: u32) -> Self {
        Self {
            state: AiState::Idle,
            chase_range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_clamps() {
        let mut health = HealthComponent::new(10);
        assert_eq!(health.take_damage(4), 4);
        assert_eq!(health.current(), 6);
        assert_eq!(health.heal(100), 4);
        assert!(health.is_full());
        assert_eq!(health.take_damage(-5), 0);
        health.set_current(-3);
        assert_eq!(health.current(), 0);
        assert!(!health.is_alive());
    }

    #[test]
    fn test_health_raise_max() {
        let mut health = HealthComponent::new(20);
        health.take_damage(5);
        health.raise_max(10);
        assert_eq!(health.max(), 30);
        assert_eq!(health.current(), 25);
    }

    #[test]
    fn test_mana_consume_and_regen() {
        let mut mana = ManaComponent::new(10, 2);
        assert!(mana.consume(7));
        assert!(!mana.consume(7));
        assert_eq!(mana.current(), 3);
        assert_eq!(mana.regenerate(), 2);
        assert_eq!(mana.restore(100), 5);
        assert!(mana.is_full());
    }

    #[test]
    fn test_experience_levels() {
        let mut xp = Experience::new();
        assert_eq!(xp.gain(50), 0);
        assert_eq!(xp.gain(60), 1);
        assert_eq!(xp.level, 2);
        assert_eq!(xp.xp, 10);
        assert_eq!(xp.gain(500), 2);
        assert_eq!(xp.level, 4);
    }

    #[test]
    fn test_inventory_capacity() {
        let mut inventory = Inventory::new(1);
        assert!(inventory.add(Item::healing_potion()).is_ok());
        let rejected = inventory.add(Item::healing_potion());
        assert!(rejected.is_err());
        assert!(inventory.is_full());
        assert!(inventory.take(3).is_none());
        assert!(inventory.take(0).is_some());
        assert!(inventory.is_empty());
    }
}
