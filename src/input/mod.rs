//! # Input Module
//!
//! Keyboard handling for player interactions.
//!
//! Keys map to [`PlayerInput`] through [`map_key`], which knows nothing about
//! the window and can be exercised directly. The same movement keys steer the
//! player in normal mode and the cursor in targeting mode.

use crate::{CycleDirection, Direction, EquipSlot};
use macroquad::prelude::*;

/// Spell hotkeys, in spellbook order.
pub const SPELL_KEYS: [KeyCode; 5] = [KeyCode::Z, KeyCode::X, KeyCode::C, KeyCode::V, KeyCode::Q];

const ITEM_KEYS: [KeyCode; 9] = [
    KeyCode::Key1,
    KeyCode::Key2,
    KeyCode::Key3,
    KeyCode::Key4,
    KeyCode::Key5,
    KeyCode::Key6,
    KeyCode::Key7,
    KeyCode::Key8,
    KeyCode::Key9,
];

/// Which key mapping is in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Targeting,
}

/// Player input types that can be processed by the scene manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerInput {
    /// Move the player, or the cursor while targeting
    Move(Direction),
    /// Wait/rest for one turn
    Wait,
    /// Pick up the item underfoot
    PickUp,
    /// Use or equip the item in an inventory slot
    UseItem(usize),
    /// Cast the spell at a spellbook index
    CastSpell(usize),
    Unequip(EquipSlot),
    /// Take the stairs down
    Descend,
    /// Jump to the next or previous candidate
    CycleTarget(CycleDirection),
    /// Commit the current target
    Confirm,
    /// Leave targeting mode
    Cancel,
    /// Show help information
    Help,
    /// Quit the game
    Quit,
}

/// Maps a key press to an input.
///
/// # Examples
///
/// ```
/// use delve::{map_key, Direction, InputMode, PlayerInput};
/// use macroquad::prelude::KeyCode;
///
/// assert_eq!(
///     map_key(KeyCode::K, false, InputMode::Normal),
///     Some(PlayerInput::Move(Direction::North))
/// );
/// assert_eq!(map_key(KeyCode::Escape, false, InputMode::Targeting), Some(PlayerInput::Cancel));
/// assert_eq!(map_key(KeyCode::Escape, false, InputMode::Normal), Some(PlayerInput::Quit));
/// ```
pub fn map_key(key: KeyCode, shift: bool, mode: InputMode) -> Option<PlayerInput> {
    if let Some(direction) = movement_direction(key) {
        return Some(PlayerInput::Move(direction));
    }

    match mode {
        InputMode::Targeting => match key {
            KeyCode::Tab if shift => Some(PlayerInput::CycleTarget(CycleDirection::Backward)),
            KeyCode::Tab => Some(PlayerInput::CycleTarget(CycleDirection::Forward)),
            KeyCode::Enter | KeyCode::KpEnter | KeyCode::F => Some(PlayerInput::Confirm),
            KeyCode::Escape => Some(PlayerInput::Cancel),
            _ => None,
        },
        InputMode::Normal => {
            if let Some(slot) = ITEM_KEYS.iter().position(|candidate| *candidate == key) {
                return Some(PlayerInput::UseItem(slot));
            }
            if let Some(index) = SPELL_KEYS.iter().position(|candidate| *candidate == key) {
                return Some(PlayerInput::CastSpell(index));
            }
            match key {
                KeyCode::Period if shift => Some(PlayerInput::Descend),
                KeyCode::Period | KeyCode::Space => Some(PlayerInput::Wait),
                KeyCode::G | KeyCode::Comma => Some(PlayerInput::PickUp),
                KeyCode::R => Some(PlayerInput::Unequip(EquipSlot::Weapon)),
                KeyCode::T => Some(PlayerInput::Unequip(EquipSlot::Armor)),
                KeyCode::F1 => Some(PlayerInput::Help),
                KeyCode::Escape => Some(PlayerInput::Quit),
                _ => None,
            }
        }
    }
}

fn movement_direction(key: KeyCode) -> Option<Direction> {
    let direction = match key {
        KeyCode::Up | KeyCode::K => Direction::North,
        KeyCode::Down | KeyCode::J => Direction::South,
        KeyCode::Left | KeyCode::H => Direction::West,
        KeyCode::Right | KeyCode::L => Direction::East,
        KeyCode::Y => Direction::Northwest,
        KeyCode::U => Direction::Northeast,
        KeyCode::B => Direction::Southwest,
        KeyCode::N => Direction::Southeast,
        _ => return None,
    };
    Some(direction)
}

/// Input handler for processing player commands.
///
/// Polls macroquad once per frame and hands the last key pressed to
/// [`map_key`].
#[derive(Debug, Default)]
pub struct InputHandler;

impl InputHandler {
    /// Creates a new input handler.
    pub fn new() -> Self {
        Self
    }

    /// Gets this frame's input, if any key was pressed.
    pub fn get_input(&self, mode: InputMode) -> Option<PlayerInput> {
        let key = get_last_key_pressed()?;
        let shift = is_key_down(KeyCode::LeftShift) || is_key_down(KeyCode::RightShift);
        map_key(key, shift, mode)
    }
}

/// Key reference shown by the help command.
pub fn help_lines() -> &'static [&'static str] {
    &[
        "Move: arrows or hjkl/yubn (bump to attack)",
        "Wait: . or space   Pick up: g   Descend: >",
        "Use item: 1-9   Cast: z x c v q",
        "Unequip weapon: r   Unequip armor: t",
        "Targeting: move cursor, Tab cycles, Enter/f fires, Esc cancels",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vi_and_arrow_keys_agree() {
        for (arrow, vi) in [
            (KeyCode::Up, KeyCode::K),
            (KeyCode::Down, KeyCode::J),
            (KeyCode::Left, KeyCode::H),
            (KeyCode::Right, KeyCode::L),
        ] {
            assert_eq!(
                map_key(arrow, false, InputMode::Normal),
                map_key(vi, false, InputMode::Normal)
            );
        }
        assert_eq!(
            map_key(KeyCode::N, false, InputMode::Targeting),
            Some(PlayerInput::Move(Direction::Southeast))
        );
    }

    #[test]
    fn test_period_waits_and_shift_period_descends() {
        assert_eq!(map_key(KeyCode::Period, false, InputMode::Normal), Some(PlayerInput::Wait));
        assert_eq!(map_key(KeyCode::Period, true, InputMode::Normal), Some(PlayerInput::Descend));
    }

    #[test]
    fn test_item_and_spell_hotkeys() {
        assert_eq!(map_key(KeyCode::Key1, false, InputMode::Normal), Some(PlayerInput::UseItem(0)));
        assert_eq!(map_key(KeyCode::Key9, false, InputMode::Normal), Some(PlayerInput::UseItem(8)));
        assert_eq!(map_key(KeyCode::Q, false, InputMode::Normal), Some(PlayerInput::CastSpell(4)));
        // hotkeys do nothing while aiming
        assert_eq!(map_key(KeyCode::Key1, false, InputMode::Targeting), None);
    }

    #[test]
    fn test_targeting_keys() {
        assert_eq!(
            map_key(KeyCode::Tab, true, InputMode::Targeting),
            Some(PlayerInput::CycleTarget(CycleDirection::Backward))
        );
        assert_eq!(map_key(KeyCode::F, false, InputMode::Targeting), Some(PlayerInput::Confirm));
        assert_eq!(map_key(KeyCode::Tab, false, InputMode::Normal), None);
    }
}
