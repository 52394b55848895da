//! # Entities
//!
//! The per-entity component record and the arena that owns every entity.
//!
//! An [`Entity`] is a typed record with one optional slot per component kind,
//! so "at most one component of each kind" holds by construction. The
//! [`EntityStore`] hands out [`EntityId`]s in creation order and never reuses
//! them; iteration always follows creation order.

use crate::{
    AiState, CombatComponent, DelveError, DelveResult, Equipment, EntityId, Experience,
    HealthComponent, Inventory, Item, ManaComponent, MonsterAi, Position, Spellbook,
    StatusEffectKind, StatusEffects, DEFAULT_CHASE_RANGE, DEFAULT_MANA_REGEN,
};
use serde::{Deserialize, Serialize};

/// Broad category of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Monster,
    Item,
}

/// A game object and its components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Assigned by [`EntityStore::spawn`]
    pub id: EntityId,
    pub name: String,
    pub glyph: char,
    pub kind: EntityKind,
    pub position: Position,
    pub blocks_movement: bool,
    pub health: Option<HealthComponent>,
    pub combat: Option<CombatComponent>,
    pub mana: Option<ManaComponent>,
    pub status_effects: Option<StatusEffects>,
    pub ai: Option<MonsterAi>,
    pub inventory: Option<Inventory>,
    pub equipment: Option<Equipment>,
    pub spellbook: Option<Spellbook>,
    pub experience: Option<Experience>,
    /// Item lying on the floor
    pub item: Option<Item>,
    /// Experience awarded for killing this entity
    pub xp_value: u32,
}

impl Entity {
    /// Creates a bare entity with no components.
    pub fn new(name: impl Into<String>, glyph: char, kind: EntityKind, position: Position) -> Self {
        Self {
            id: EntityId(0),
            name: name.into(),
            glyph,
            kind,
            position,
            blocks_movement: false,
            health: None,
            combat: None,
            mana: None,
            status_effects: None,
            ai: None,
            inventory: None,
            equipment: None,
            spellbook: None,
            experience: None,
            item: None,
            xp_value: 0,
        }
    }

    /// Creates the player character.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{Entity, Position};
    ///
    /// let player = Entity::player(Position::new(1, 1));
    /// assert!(player.is_player());
    /// assert!(player.is_alive());
    /// assert!(player.blocks_movement);
    /// ```
    pub fn player(position: Position) -> Self {
        let mut player = Self::new("Player", '@', EntityKind::Player, position);
        player.blocks_movement = true;
        player.health = Some(HealthComponent::new(30));
        player.combat = Some(CombatComponent::new(5, 2));
        player.mana = Some(ManaComponent::new(20, DEFAULT_MANA_REGEN));
        player.status_effects = Some(StatusEffects::new());
        player.inventory = Some(Inventory::default());
        player.equipment = Some(Equipment::default());
        player.spellbook = Some(Spellbook::starting());
        player.experience = Some(Experience::new());
        player
    }

    /// Creates a monster from a template.
    pub fn monster(template: &MonsterTemplate, position: Position) -> Self {
        let mut monster = Self::new(template.name, template.glyph, EntityKind::Monster, position);
        monster.blocks_movement = true;
        monster.health = Some(HealthComponent::new(template.max_hp));
        monster.combat = Some(CombatComponent::new(template.power, template.defense));
        monster.status_effects = Some(StatusEffects::new());
        monster.ai = Some(MonsterAi::new(DEFAULT_CHASE_RANGE));
        monster.xp_value = template.xp_value;
        monster
    }

    /// Creates an item lying on the floor.
    pub fn floor_item(item: Item, position: Position) -> Self {
        let mut entity = Self::new(item.name.clone(), item.glyph, EntityKind::Item, position);
        entity.item = Some(item);
        entity
    }

    /// Builder-style health override.
    pub fn with_health(mut self, max_hp: i32) -> Self {
        self.health = Some(HealthComponent::new(max_hp));
        self
    }

    /// Builder-style combat override.
    pub fn with_combat(mut self, power: i32, defense: i32) -> Self {
        self.combat = Some(CombatComponent::new(power, defense));
        self
    }

    pub fn is_player(&self) -> bool {
        self.kind == EntityKind::Player
    }

    pub fn is_monster(&self) -> bool {
        self.kind == EntityKind::Monster
    }

    /// Alive means a health component with hit points left.
    pub fn is_alive(&self) -> bool {
        self.health.map(|health| health.is_alive()).unwrap_or(false)
    }

    /// Whether the entity carries an active effect of the given kind.
    pub fn has_status(&self, kind: StatusEffectKind) -> bool {
        self.status_effects
            .as_ref()
            .map(|effects| effects.has(kind))
            .unwrap_or(false)
    }

    /// Current AI state, if this entity has an AI.
    pub fn ai_state(&self) -> Option<AiState> {
        self.ai.map(|ai| ai.state)
    }

    pub fn health(&self) -> DelveResult<&HealthComponent> {
        self.health.as_ref().ok_or(self.missing("health"))
    }

    pub fn health_mut(&mut self) -> DelveResult<&mut HealthComponent> {
        let missing = self.missing("health");
        self.health.as_mut().ok_or(missing)
    }

    pub fn combat(&self) -> DelveResult<&CombatComponent> {
        self.combat.as_ref().ok_or(self.missing("combat"))
    }

    pub fn combat_mut(&mut self) -> DelveResult<&mut CombatComponent> {
        let missing = self.missing("combat");
        self.combat.as_mut().ok_or(missing)
    }

    pub fn mana_mut(&mut self) -> DelveResult<&mut ManaComponent> {
        let missing = self.missing("mana");
        self.mana.as_mut().ok_or(missing)
    }

    pub fn ai_mut(&mut self) -> DelveResult<&mut MonsterAi> {
        let missing = self.missing("ai");
        self.ai.as_mut().ok_or(missing)
    }

    pub fn inventory(&self) -> DelveResult<&Inventory> {
        self.inventory.as_ref().ok_or(self.missing("inventory"))
    }

    pub fn inventory_mut(&mut self) -> DelveResult<&mut Inventory> {
        let missing = self.missing("inventory");
        self.inventory.as_mut().ok_or(missing)
    }

    pub fn equipment_mut(&mut self) -> DelveResult<&mut Equipment> {
        let missing = self.missing("equipment");
        self.equipment.as_mut().ok_or(missing)
    }

    pub fn spellbook(&self) -> DelveResult<&Spellbook> {
        self.spellbook.as_ref().ok_or(self.missing("spellbook"))
    }

    /// The status effect collection, created on first use.
    pub fn status_effects_mut(&mut self) -> &mut StatusEffects {
        self.status_effects.get_or_insert_with(StatusEffects::new)
    }

    fn missing(&self, component: &'static str) -> DelveError {
        DelveError::MissingComponent {
            entity: self.id,
            component,
        }
    }
}

/// Stat block used to create monsters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonsterTemplate {
    pub name: &'static str,
    pub glyph: char,
    pub max_hp: i32,
    pub power: i32,
    pub defense: i32,
    pub xp_value: u32,
}

impl MonsterTemplate {
    pub const RAT: MonsterTemplate = MonsterTemplate {
        name: "Rat",
        glyph: 'r',
        max_hp: 4,
        power: 2,
        defense: 0,
        xp_value: 10,
    };

    pub const ORC: MonsterTemplate = MonsterTemplate {
        name: "Orc",
        glyph: 'o',
        max_hp: 10,
        power: 3,
        defense: 0,
        xp_value: 35,
    };

    pub const TROLL: MonsterTemplate = MonsterTemplate {
        name: "Troll",
        glyph: 't',
        max_hp: 16,
        power: 4,
        defense: 1,
        xp_value: 100,
    };

    /// Looks up the template spawned by a layout glyph.
    pub fn for_glyph(glyph: char) -> Option<&'static MonsterTemplate> {
        match glyph {
            'r' => Some(&Self::RAT),
            'o' => Some(&Self::ORC),
            't' => Some(&Self::TROLL),
            _ => None,
        }
    }
}

/// Arena owning every entity in the game.
///
/// # Examples
///
/// ```
/// use delve::{Entity, EntityStore, MonsterTemplate, Position};
///
/// let mut store = EntityStore::new();
/// let player = store.spawn(Entity::player(Position::new(1, 1)));
/// let orc = store.spawn(Entity::monster(&MonsterTemplate::ORC, Position::new(3, 1)));
///
/// assert_eq!(store.all_entities(), vec![player, orc]);
/// assert_eq!(store.blocking_entity_at(Position::new(3, 1)), Some(orc));
/// ```
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    slots: Vec<Option<Entity>>,
}

impl EntityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity and returns its new id.
    pub fn spawn(&mut self, mut entity: Entity) -> EntityId {
        let id = EntityId(self.slots.len() as u32);
        entity.id = id;
        self.slots.push(Some(entity));
        id
    }

    /// Removes an entity from the active set.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        self.slots.get_mut(id.index()).and_then(Option::take)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Like [`EntityStore::get`], but a missing entity is an error.
    pub fn entity(&self, id: EntityId) -> DelveResult<&Entity> {
        self.get(id).ok_or(DelveError::UnknownEntity(id))
    }

    /// Like [`EntityStore::get_mut`], but a missing entity is an error.
    pub fn entity_mut(&mut self, id: EntityId) -> DelveResult<&mut Entity> {
        self.get_mut(id).ok_or(DelveError::UnknownEntity(id))
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Whether the entity exists and has hit points left.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.get(id).map(Entity::is_alive).unwrap_or(false)
    }

    /// Ids of every active entity, in creation order.
    pub fn all_entities(&self) -> Vec<EntityId> {
        self.iter().map(|entity| entity.id).collect()
    }

    /// Iterates active entities in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    /// Ids of every monster, in creation order.
    pub fn monster_ids(&self) -> Vec<EntityId> {
        self.iter()
            .filter(|entity| entity.is_monster())
            .map(|entity| entity.id)
            .collect()
    }

    /// Ids of living monsters, in creation order.
    pub fn living_monsters(&self) -> Vec<EntityId> {
        self.iter()
            .filter(|entity| entity.is_monster() && entity.is_alive())
            .map(|entity| entity.id)
            .collect()
    }

    /// The living entity that blocks movement at a position, if any.
    pub fn blocking_entity_at(&self, position: Position) -> Option<EntityId> {
        self.iter()
            .find(|entity| {
                entity.position == position && entity.blocks_movement && entity.is_alive()
            })
            .map(|entity| entity.id)
    }

    /// The first floor item at a position, if any.
    pub fn item_at(&self, position: Position) -> Option<EntityId> {
        self.iter()
            .find(|entity| entity.position == position && entity.item.is_some())
            .map(|entity| entity.id)
    }

    /// Number of active entities.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
