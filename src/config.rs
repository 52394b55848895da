//! # Game Configuration
//!
//! Compile-time defaults and the run-time [`GameConfig`] that can be loaded
//! from a JSON file.

use crate::DelveResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Player field-of-view radius in tiles
pub const DEFAULT_FOV_RADIUS: u32 = 8;

/// Monsters closer than this (Manhattan) chase the player; at or beyond it they idle
pub const DEFAULT_CHASE_RANGE: u32 = 10;

/// Maximum Manhattan range of the targeting cursor for scrolls
pub const DEFAULT_TARGETING_RANGE: u32 = 10;

/// Turns of confusion applied by a confusion scroll
pub const DEFAULT_CONFUSION_TURNS: i32 = 10;

/// Mana the player regains after each turn-consuming command
pub const DEFAULT_MANA_REGEN: i32 = 1;

/// Number of items an inventory holds
pub const INVENTORY_CAPACITY: usize = 26;

/// Maximum number of messages kept in the log
pub const DEFAULT_MESSAGE_CAPACITY: usize = 100;

/// Tile size in pixels for the display
pub const TILE_SIZE: f32 = 20.0;

/// Run-time configuration for a game session.
///
/// Every field has a default, so a config file only needs to name the values
/// it overrides.
///
/// # Examples
///
/// ```
/// use delve::GameConfig;
///
/// let config = GameConfig::from_json_str(r#"{ "seed": 7 }"#).unwrap();
/// assert_eq!(config.seed, 7);
/// assert_eq!(config.chase_range, delve::DEFAULT_CHASE_RANGE);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Random seed for monster wandering
    pub seed: u64,
    /// Player sight radius
    pub fov_radius: u32,
    /// Distance below which monsters chase
    pub chase_range: u32,
    /// Range of targeted scrolls
    pub targeting_range: u32,
    /// Duration of confusion scrolls
    pub confusion_turns: i32,
    /// Mana regained per consumed turn
    pub mana_regen_per_turn: i32,
    /// Message log capacity
    pub message_capacity: usize,
}

impl GameConfig {
    /// Creates the default configuration with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            fov_radius: DEFAULT_FOV_RADIUS,
            chase_range: DEFAULT_CHASE_RANGE,
            targeting_range: DEFAULT_TARGETING_RANGE,
            confusion_turns: DEFAULT_CONFUSION_TURNS,
            mana_regen_per_turn: DEFAULT_MANA_REGEN,
            message_capacity: DEFAULT_MESSAGE_CAPACITY,
        }
    }

    /// Parses a configuration from JSON text.
    pub fn from_json_str(json: &str) -> DelveResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> DelveResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new(12345)
    }
}
