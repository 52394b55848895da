//! # Display Management
//!
//! ASCII rendering of the game with macroquad: the map, the entities the
//! player can see, the targeting cursor, a side panel and the message log.

use crate::{
    combat, Entity, EntityKind, GameCompletionState, GameState, InputMode, MessageLog, Position,
    TileType, VisibilityQuery, SPELL_KEYS, TILE_SIZE,
};
use crate::DelveResult;
use macroquad::prelude::*;

/// Explored but out-of-sight tiles are drawn at this brightness.
const DIM_FACTOR: f32 = 0.35;

/// Macroquad display for the game.
#[derive(Debug, Clone)]
pub struct AsciiDisplay {
    /// Tile size in pixels
    pub tile_size: f32,
    /// Side panel width in pixels
    pub panel_width: f32,
    /// Number of log lines shown under the map
    pub message_lines: usize,
}

impl Default for AsciiDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl AsciiDisplay {
    pub fn new() -> Self {
        Self {
            tile_size: TILE_SIZE,
            panel_width: 320.0,
            message_lines: 6,
        }
    }

    /// Renders the complete game screen.
    pub fn render_game(
        &self,
        state: &GameState,
        log: &MessageLog,
        mode: InputMode,
    ) -> DelveResult<()> {
        clear_background(BLACK);
        self.render_map(state);
        self.render_entities(state);
        if mode == InputMode::Targeting {
            self.render_targeting(state);
        }
        self.render_panel(state, mode)?;
        self.render_messages(state, log);
        Ok(())
    }

    /// Renders the ending screen over the last frame of the map.
    pub fn render_game_over(&self, state: &GameState, log: &MessageLog) -> DelveResult<()> {
        clear_background(BLACK);
        self.render_map(state);
        self.render_entities(state);
        self.render_messages(state, log);

        let (title, color) = match state.completion_state {
            GameCompletionState::PlayerDied { turn } => (format!("You died on turn {}", turn), RED),
            GameCompletionState::Descended { turn } => {
                (format!("You descended on turn {}", turn), GREEN)
            }
            GameCompletionState::Playing => return Ok(()),
        };
        let x = 40.0;
        let mut y = screen_height() / 3.0;
        draw_rectangle(
            x - 20.0,
            y - 40.0,
            420.0,
            230.0,
            Color::new(0.0, 0.0, 0.0, 0.85),
        );
        draw_text(&title, x, y, 32.0, color);
        y += 40.0;

        let stats = &state.statistics;
        let lines = [
            format!("Enemies defeated: {}", stats.enemies_defeated),
            format!("Damage dealt: {}", stats.damage_dealt),
            format!("Damage taken: {}", stats.damage_taken),
            format!("Items used: {}", stats.items_used),
            format!("Spells cast: {}", stats.spells_cast),
        ];
        for line in &lines {
            draw_text(line, x, y, 20.0, WHITE);
            y += 22.0;
        }
        draw_text("Press Esc to quit", x, y + 12.0, 20.0, GRAY);
        Ok(())
    }

    fn map_origin(&self) -> (f32, f32) {
        (10.0, 10.0)
    }

    fn cell(&self, position: Position) -> (f32, f32) {
        let (ox, oy) = self.map_origin();
        (
            ox + position.x as f32 * self.tile_size,
            oy + position.y as f32 * self.tile_size,
        )
    }

    fn draw_glyph(&self, glyph: char, position: Position, color: Color) {
        let (x, y) = self.cell(position);
        let mut buffer = [0u8; 4];
        draw_text(
            glyph.encode_utf8(&mut buffer),
            x + self.tile_size * 0.2,
            y + self.tile_size * 0.8,
            self.tile_size,
            color,
        );
    }

    fn render_map(&self, state: &GameState) {
        for y in 0..state.map.height() {
            for x in 0..state.map.width() {
                let position = Position::new(x, y);
                let Some(tile) = state.map.tile(position) else {
                    continue;
                };
                if state.fov.is_visible(position) {
                    self.draw_glyph(tile.glyph(), position, tile_color(tile));
                } else if state.fov.is_explored(position) {
                    self.draw_glyph(tile.glyph(), position, dim(tile_color(tile)));
                }
            }
        }
    }

    fn render_entities(&self, state: &GameState) {
        // items under monsters, the player on top
        for layer in [EntityKind::Item, EntityKind::Monster, EntityKind::Player] {
            for entity in state.store.iter().filter(|entity| entity.kind == layer) {
                if state.fov.is_visible(entity.position) {
                    self.draw_glyph(entity.glyph, entity.position, entity_color(entity));
                }
            }
        }
    }

    fn render_targeting(&self, state: &GameState) {
        let Some(session) = state.targeting.session() else {
            return;
        };
        for candidate in session.candidates() {
            let (x, y) = self.cell(candidate.position);
            draw_rectangle_lines(x, y, self.tile_size, self.tile_size, 1.0, ORANGE);
        }
        let (x, y) = self.cell(session.cursor());
        draw_rectangle(
            x,
            y,
            self.tile_size,
            self.tile_size,
            Color::new(1.0, 1.0, 0.0, 0.25),
        );
        draw_rectangle_lines(x, y, self.tile_size, self.tile_size, 2.0, YELLOW);
    }

    fn render_panel(&self, state: &GameState, mode: InputMode) -> DelveResult<()> {
        let x = screen_width() - self.panel_width + 10.0;
        let mut y = 30.0;
        let line = 20.0;
        let text = |content: &str, color: Color, y: &mut f32| {
            draw_text(content, x, *y, 18.0, color);
            *y += line;
        };

        text("DELVE", SKYBLUE, &mut y);
        text(&format!("Turn {}", state.turn_number), GRAY, &mut y);
        y += line / 2.0;

        let player = state.player()?;
        let health = player.health()?;
        let hp_color = if health.current() * 3 <= health.max() {
            RED
        } else {
            WHITE
        };
        text(
            &format!("HP   {}/{}", health.current(), health.max()),
            hp_color,
            &mut y,
        );
        if let Some(mana) = player.mana {
            text(
                &format!("Mana {}/{}", mana.current(), mana.max()),
                SKYBLUE,
                &mut y,
            );
        }
        if let Some(experience) = player.experience {
            text(
                &format!(
                    "Level {}  XP {}/{}",
                    experience.level,
                    experience.xp,
                    experience.next_level_at()
                ),
                WHITE,
                &mut y,
            );
        }
        text(
            &format!(
                "Power {}  Defense {}",
                combat::effective_power(player)?,
                combat::effective_defense(player)?
            ),
            WHITE,
            &mut y,
        );

        if let Some(effects) = player.status_effects.as_ref().filter(|effects| !effects.is_empty()) {
            y += line / 2.0;
            for active in effects.iter() {
                text(
                    &format!("{} ({})", active.effect.kind(), active.remaining),
                    MAGENTA,
                    &mut y,
                );
            }
        }

        y += line / 2.0;
        text("Equipment", GREEN, &mut y);
        if let Some(equipment) = player.equipment.as_ref() {
            let weapon = equipment.weapon.as_ref().map(|item| item.name.as_str());
            let armor = equipment.armor.as_ref().map(|item| item.name.as_str());
            text(&format!(" r) {}", weapon.unwrap_or("-")), WHITE, &mut y);
            text(&format!(" t) {}", armor.unwrap_or("-")), WHITE, &mut y);
        }

        y += line / 2.0;
        text("Inventory", GREEN, &mut y);
        let inventory = player.inventory()?;
        if inventory.is_empty() {
            text(" (empty)", GRAY, &mut y);
        }
        for (slot, item) in inventory.items().iter().enumerate() {
            text(&format!(" {}) {}", slot + 1, item.name), WHITE, &mut y);
        }

        y += line / 2.0;
        text("Spells", GREEN, &mut y);
        let have = player.mana.map(|mana| mana.current()).unwrap_or(0);
        for (spell, key) in player.spellbook()?.spells().iter().zip(SPELL_KEYS) {
            let color = if have >= spell.mana_cost { WHITE } else { GRAY };
            text(
                &format!(" {}) {} [{}]", key_label(key), spell.name, spell.mana_cost),
                color,
                &mut y,
            );
        }

        if mode == InputMode::Targeting {
            y += line / 2.0;
            text("TARGETING", YELLOW, &mut y);
            if let Some(candidate) = state
                .targeting
                .session()
                .and_then(|session| session.current_candidate())
            {
                if let Some(entity) = state.store.get(candidate.id) {
                    if let Some(health) = entity.health {
                        text(
                            &format!("{} {}/{}", entity.name, health.current(), health.max()),
                            ORANGE,
                            &mut y,
                        );
                    }
                }
            }
        }
        Ok(())
    }

    fn render_messages(&self, state: &GameState, log: &MessageLog) {
        let line = 18.0;
        let (ox, oy) = self.map_origin();
        let mut y = oy + state.map.height() as f32 * self.tile_size + 24.0;
        for message in log.recent(self.message_lines) {
            draw_text(message, ox, y, 18.0, LIGHTGRAY);
            y += line;
        }
    }
}

fn tile_color(tile: TileType) -> Color {
    match tile {
        TileType::Wall => Color::new(0.6, 0.6, 0.7, 1.0),
        TileType::Floor => DARKGRAY,
        TileType::StairsDown => ORANGE,
    }
}

fn entity_color(entity: &Entity) -> Color {
    match entity.kind {
        EntityKind::Player => YELLOW,
        EntityKind::Item => SKYBLUE,
        EntityKind::Monster => match entity.glyph {
            'r' => BROWN,
            'o' => GREEN,
            't' => RED,
            _ => WHITE,
        },
    }
}

fn dim(color: Color) -> Color {
    Color::new(
        color.r * DIM_FACTOR,
        color.g * DIM_FACTOR,
        color.b * DIM_FACTOR,
        color.a,
    )
}

fn key_label(key: KeyCode) -> char {
    match key {
        KeyCode::Z => 'z',
        KeyCode::X => 'x',
        KeyCode::C => 'c',
        KeyCode::V => 'v',
        KeyCode::Q => 'q',
        _ => '?',
    }
}
