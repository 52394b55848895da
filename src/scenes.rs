//! # Scene Management System
//!
//! Routes player input to the right place for the current scene: commands
//! while playing, the targeting session while aiming, and nothing but quit
//! once the game has ended.

use crate::{
    describe_rejection, describe_targeting_begin, help_lines, AsciiDisplay, Command,
    CommandOutcome, CursorMove, DelveResult, GameCompletionState, GameEvent, GameState,
    InputHandler, InputMode, ItemKind, MessageLog, PlayerInput, Rejection, TargetPurpose,
};
use macroquad::prelude::next_frame;

/// Represents the current scene in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneType {
    /// Normal gameplay
    Playing,
    /// Picking a target for an item or spell
    Targeting,
    /// Death or descent
    GameOver(GameCompletionState),
}

/// Whether the main loop keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneFlow {
    Continue,
    Quit,
}

/// The main scene manager that coordinates all game scenes
pub struct SceneManager {
    current_scene: SceneType,
    game_state: GameState,
    display: AsciiDisplay,
    input_handler: InputHandler,
    messages: MessageLog,
}

impl SceneManager {
    pub fn new(game_state: GameState, input_handler: InputHandler) -> Self {
        let mut messages = MessageLog::new(game_state.config.message_capacity);
        messages.push("Welcome to the dungeon. Press F1 for help.");
        Self {
            current_scene: SceneType::Playing,
            game_state,
            display: AsciiDisplay::new(),
            input_handler,
            messages,
        }
    }

    pub fn scene(&self) -> SceneType {
        self.current_scene
    }

    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }

    /// Runs the main scene loop until the player quits.
    pub async fn run(&mut self) -> DelveResult<()> {
        loop {
            if let Some(input) = self.input_handler.get_input(self.input_mode()) {
                if self.handle_input(input)? == SceneFlow::Quit {
                    log::info!("quit requested on turn {}", self.game_state.turn_number);
                    return Ok(());
                }
            }

            match self.current_scene {
                SceneType::GameOver(_) => self
                    .display
                    .render_game_over(&self.game_state, &self.messages)?,
                _ => self.display.render_game(
                    &self.game_state,
                    &self.messages,
                    self.input_mode(),
                )?,
            }
            next_frame().await;
        }
    }

    /// The key mapping for the current scene.
    pub fn input_mode(&self) -> InputMode {
        match self.current_scene {
            SceneType::Targeting => InputMode::Targeting,
            _ => InputMode::Normal,
        }
    }

    /// Applies one input and moves to whatever scene results.
    pub fn handle_input(&mut self, input: PlayerInput) -> DelveResult<SceneFlow> {
        let flow = match self.current_scene {
            SceneType::Playing => self.handle_playing(input)?,
            SceneType::Targeting => self.handle_targeting(input)?,
            SceneType::GameOver(_) => match input {
                PlayerInput::Quit | PlayerInput::Cancel => SceneFlow::Quit,
                _ => SceneFlow::Continue,
            },
        };
        self.update_scene();
        Ok(flow)
    }

    fn update_scene(&mut self) {
        self.current_scene = if self.game_state.is_game_ended() {
            SceneType::GameOver(self.game_state.completion_state)
        } else if self.game_state.targeting.is_active() {
            SceneType::Targeting
        } else {
            SceneType::Playing
        };
    }

    fn handle_playing(&mut self, input: PlayerInput) -> DelveResult<SceneFlow> {
        let command = match input {
            PlayerInput::Quit => return Ok(SceneFlow::Quit),
            PlayerInput::Help => {
                for line in help_lines() {
                    self.messages.push(*line);
                }
                return Ok(SceneFlow::Continue);
            }
            PlayerInput::Move(direction) => Command::Move(direction),
            PlayerInput::Wait => Command::Wait,
            PlayerInput::PickUp => Command::PickUp,
            PlayerInput::Descend => Command::Descend,
            PlayerInput::Unequip(slot) => Command::Unequip(slot),
            PlayerInput::UseItem(slot) => match self.item_command(slot)? {
                Some(command) => command,
                None => return Ok(SceneFlow::Continue),
            },
            PlayerInput::CastSpell(index) => match self.spell_command(index)? {
                Some(command) => command,
                None => return Ok(SceneFlow::Continue),
            },
            PlayerInput::CycleTarget(_) | PlayerInput::Confirm | PlayerInput::Cancel => {
                return Ok(SceneFlow::Continue)
            }
        };

        let outcome = self.game_state.execute(command)?;
        self.report(&outcome);
        Ok(SceneFlow::Continue)
    }

    /// Equips gear, uses self-targeted consumables, and starts aiming for the rest.
    fn item_command(&mut self, slot: usize) -> DelveResult<Option<Command>> {
        let Some(item) = self.game_state.player()?.inventory()?.get(slot) else {
            self.messages.push(describe_rejection(Rejection::NoSuchItem));
            return Ok(None);
        };
        let kind = item.kind;
        match kind {
            ItemKind::Equippable { .. } => Ok(Some(Command::Equip(slot))),
            ItemKind::Consumable(effect) if effect.needs_target() => {
                self.begin_targeting(TargetPurpose::Item { slot })?;
                Ok(None)
            }
            ItemKind::Consumable(_) => Ok(Some(Command::UseItem { slot, target: None })),
        }
    }

    fn spell_command(&mut self, index: usize) -> DelveResult<Option<Command>> {
        let player = self.game_state.player()?;
        let Some(spell) = player.spellbook()?.get(index) else {
            self.messages.push(describe_rejection(Rejection::UnknownSpell));
            return Ok(None);
        };
        if !spell.needs_target() {
            return Ok(Some(Command::CastSpell {
                spell: index,
                target: None,
            }));
        }

        // no point aiming a spell that cannot be paid for
        let have = player.mana.map(|mana| mana.current()).unwrap_or(0);
        if have < spell.mana_cost {
            let need = spell.mana_cost;
            self.messages
                .push(describe_rejection(Rejection::NotEnoughMana { have, need }));
            return Ok(None);
        }
        self.begin_targeting(TargetPurpose::Spell { index })?;
        Ok(None)
    }

    fn begin_targeting(&mut self, purpose: TargetPurpose) -> DelveResult<()> {
        let mut events: Vec<GameEvent> = Vec::new();
        let begin = self.game_state.begin_targeting(purpose, &mut events)?;
        self.messages.record_all(&events);
        if let Some(message) = describe_targeting_begin(begin) {
            self.messages.push(message);
        }
        Ok(())
    }

    fn handle_targeting(&mut self, input: PlayerInput) -> DelveResult<SceneFlow> {
        match input {
            PlayerInput::Move(direction) => {
                let delta = direction.to_delta();
                if self.game_state.targeting.move_cursor(delta.x, delta.y)? == CursorMove::Rejected
                {
                    log::debug!("cursor step {:?} out of range", direction);
                }
            }
            PlayerInput::CycleTarget(direction) => {
                self.game_state.targeting.cycle(direction)?;
            }
            PlayerInput::Confirm => {
                let outcome = self.game_state.confirm_target()?;
                self.report(&outcome);
            }
            PlayerInput::Cancel | PlayerInput::Quit => {
                let mut events: Vec<GameEvent> = Vec::new();
                self.game_state.cancel_targeting(&mut events)?;
                self.messages.record_all(&events);
            }
            _ => {}
        }
        Ok(SceneFlow::Continue)
    }

    fn report(&mut self, outcome: &CommandOutcome) {
        self.messages.record_all(&outcome.events);
        if let Some(rejection) = outcome.rejection {
            self.messages.push(describe_rejection(rejection));
        }
    }
}
