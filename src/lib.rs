//! # Delve Roguelike
//!
//! A turn-based ASCII roguelike with monster AI, timed status effects, and an
//! interactive ranged-targeting mode.
//!
//! ## Architecture Overview
//!
//! The game advances one discrete turn per turn-consuming player command. The
//! core revolves around a handful of systems that all operate on a single
//! [`EntityStore`]:
//!
//! - **Status Effects**: timed modifiers (poison, confusion, buffs) ticked once
//!   per entity per turn
//! - **Monster AI**: a per-monster Idle / Chase / Attack classification with a
//!   confusion override
//! - **Turn Orchestrator**: the fixed ordering of player effects, monster
//!   actions, and monster effects
//! - **Targeting**: a self-contained cursor/candidate state machine used by
//!   targeted items and spells
//! - **Commands**: the player-facing surface that decides whether a turn is
//!   consumed
//!
//! Systems never format text. They report structured [`GameEvent`]s to a
//! [`NotificationSink`] passed into each call; the presentation layer turns
//! those into log messages.

pub mod config;
pub mod game;
pub mod input;
pub mod rendering;
pub mod scenes;

// Core module re-exports
pub use config::*;
pub use game::*;
pub use input::*;
pub use rendering::*;

/// Core error type for the Delve game engine.
///
/// Every variant is a fault: either an I/O or parse failure, or a broken
/// precondition. Ordinary "nothing happened" outcomes (no targets, a blocked
/// move, a rejected cursor step) are reported through return values instead.
#[derive(thiserror::Error, Debug)]
pub enum DelveError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// An entity is missing a component the operation requires
    #[error("Entity {entity} has no {component} component")]
    MissingComponent {
        entity: EntityId,
        component: &'static str,
    },

    /// The entity does not exist in the store
    #[error("Unknown entity: {0}")]
    UnknownEntity(EntityId),

    /// A targeting operation was called outside the state that allows it
    #[error("Targeting operation '{operation}' is invalid while {state:?}")]
    InvalidTargetingState {
        operation: &'static str,
        state: TargetingState,
    },

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Action cannot be performed
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// A map layout could not be parsed
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),
}

/// Result type used throughout the Delve codebase.
pub type DelveResult<T> = Result<T, DelveError>;

/// Version information for the game.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
