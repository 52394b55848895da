//! # Monster AI
//!
//! One decision function over a plain state tag. Each call reclassifies the
//! monster from scratch:
//!
//! - confused: a random adjacent walkable tile, never an attack
//! - distance `<= 1`: attack
//! - distance below the chase range: step toward the player
//! - otherwise: idle
//!
//! The decision only states intent. The turn orchestrator applies it and
//! stores the new state on the monster.

use crate::{DelveResult, Entity, MapQuery, Position, StatusEffectKind};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Behavior classification of a monster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiState {
    Idle,
    Chase,
    Attack,
    /// Confusion overrides the other states while it lasts
    Confused,
}

/// What a monster intends to do this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiAction {
    NoAction,
    MoveTo(Position),
    /// Attack the player
    Attack,
}

/// A state plus the action it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiDecision {
    pub state: AiState,
    pub action: AiAction,
}

/// Classifies a distance into Idle / Chase / Attack.
pub fn classify(distance: u32, chase_range: u32) -> AiState {
    if distance <= 1 {
        AiState::Attack
    } else if distance < chase_range {
        AiState::Chase
    } else {
        AiState::Idle
    }
}

/// Decides a living monster's action for this turn.
///
/// Fails with a missing-component error when the monster has no AI.
///
/// # Examples
///
/// ```
/// use delve::{decide, AiAction, AiState, Entity, GameMap, MonsterTemplate, Position};
/// use rand::SeedableRng;
///
/// let map = GameMap::open_room(20, 20);
/// let orc = Entity::monster(&MonsterTemplate::ORC, Position::new(5, 5));
/// let mut rng = rand::rngs::StdRng::seed_from_u64(1);
///
/// let decision = decide(&orc, Position::new(5, 6), &map, &mut rng).unwrap();
/// assert_eq!(decision.state, AiState::Attack);
/// assert_eq!(decision.action, AiAction::Attack);
/// ```
pub fn decide<R: Rng + ?Sized>(
    monster: &Entity,
    player_position: Position,
    map: &impl MapQuery,
    rng: &mut R,
) -> DelveResult<AiDecision> {
    let ai = monster.ai.ok_or(crate::DelveError::MissingComponent {
        entity: monster.id,
        component: "ai",
    })?;

    if monster.has_status(StatusEffectKind::Confusion) {
        let target = random_adjacent(monster.position, map, rng).unwrap_or(monster.position);
        return Ok(AiDecision {
            state: AiState::Confused,
            action: AiAction::MoveTo(target),
        });
    }

    let distance = monster.position.manhattan_distance(player_position);
    let state = classify(distance, ai.chase_range);
    let action = match state {
        AiState::Attack => AiAction::Attack,
        AiState::Chase => match map.step_toward(monster.position, player_position) {
            Some(step) => AiAction::MoveTo(step),
            None => AiAction::NoAction,
        },
        AiState::Idle | AiState::Confused => AiAction::NoAction,
    };
    Ok(AiDecision { state, action })
}

/// A random walk step, or no action when boxed in.
pub fn wander<R: Rng + ?Sized>(from: Position, map: &impl MapQuery, rng: &mut R) -> AiAction {
    match random_adjacent(from, map, rng) {
        Some(target) => AiAction::MoveTo(target),
        None => AiAction::NoAction,
    }
}

fn random_adjacent<R: Rng + ?Sized>(
    from: Position,
    map: &impl MapQuery,
    rng: &mut R,
) -> Option<Position> {
    let candidates: Vec<Position> = from
        .adjacent_positions()
        .into_iter()
        .filter(|position| map.is_walkable(*position))
        .collect();
    candidates.choose(rng).copied()
}
