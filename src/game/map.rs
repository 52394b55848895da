//! # Map
//!
//! The tile grid, ASCII layout loading, and the walkability query used by the
//! AI and movement code.

use crate::{DelveError, DelveResult, EntityId, EntityStore, Position};
use pathfinding::prelude::astar;
use serde::{Deserialize, Serialize};

/// Kinds of map tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    Wall,
    Floor,
    StairsDown,
}

impl TileType {
    /// Whether entities can stand on this tile.
    pub fn is_passable(self) -> bool {
        !matches!(self, TileType::Wall)
    }

    /// Whether this tile blocks line of sight.
    pub fn blocks_sight(self) -> bool {
        matches!(self, TileType::Wall)
    }

    /// Glyph used to draw this tile.
    pub fn glyph(self) -> char {
        match self {
            TileType::Wall => '#',
            TileType::Floor => '.',
            TileType::StairsDown => '>',
        }
    }
}

/// A spawn point read from an ASCII layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnMarker {
    pub glyph: char,
    pub position: Position,
}

/// Fixed-size grid of tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMap {
    width: i32,
    height: i32,
    tiles: Vec<TileType>,
}

impl GameMap {
    /// Creates a map filled with walls.
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            tiles: vec![TileType::Wall; (width * height) as usize],
        }
    }

    /// Creates a floor-filled map surrounded by walls.
    pub fn open_room(width: i32, height: i32) -> Self {
        let mut map = Self::new(width, height);
        for y in 1..height - 1 {
            for x in 1..width - 1 {
                let index = map.index(Position::new(x, y));
                map.tiles[index] = TileType::Floor;
            }
        }
        map
    }

    /// Builds a map from ASCII rows.
    ///
    /// `#` is a wall, `.` floor and `>` stairs down. Any other glyph places
    /// floor under it and is returned as a [`SpawnMarker`]; a space is a wall.
    /// Rows shorter than the widest row are padded with walls.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{GameMap, Position, TileType};
    ///
    /// let (map, spawns) = GameMap::from_ascii(&[
    ///     "#####",
    ///     "#@.o#",
    ///     "#####",
    /// ]).unwrap();
    ///
    /// assert_eq!(map.tile(Position::new(2, 1)), Some(TileType::Floor));
    /// assert_eq!(spawns.len(), 2);
    /// assert_eq!(spawns[0].glyph, '@');
    /// ```
    pub fn from_ascii(rows: &[&str]) -> DelveResult<(Self, Vec<SpawnMarker>)> {
        let height = rows.len() as i32;
        let width = rows
            .iter()
            .map(|row| row.chars().count())
            .max()
            .unwrap_or(0) as i32;
        if width == 0 || height == 0 {
            return Err(DelveError::InvalidLayout("layout is empty".to_string()));
        }

        let mut map = Self::new(width, height);
        let mut spawns = Vec::new();
        for (y, row) in rows.iter().enumerate() {
            for (x, glyph) in row.chars().enumerate() {
                let position = Position::new(x as i32, y as i32);
                let tile = match glyph {
                    '#' | ' ' => TileType::Wall,
                    '.' => TileType::Floor,
                    '>' => TileType::StairsDown,
                    other => {
                        spawns.push(SpawnMarker {
                            glyph: other,
                            position,
                        });
                        TileType::Floor
                    }
                };
                map.set_tile(position, tile)?;
            }
        }
        Ok((map, spawns))
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, position: Position) -> bool {
        position.x >= 0 && position.y >= 0 && position.x < self.width && position.y < self.height
    }

    /// The tile at a position, or `None` outside the map.
    pub fn tile(&self, position: Position) -> Option<TileType> {
        if self.in_bounds(position) {
            Some(self.tiles[self.index(position)])
        } else {
            None
        }
    }

    /// Replaces the tile at a position.
    pub fn set_tile(&mut self, position: Position, tile: TileType) -> DelveResult<()> {
        if !self.in_bounds(position) {
            return Err(DelveError::InvalidAction(format!(
                "position {} is outside the map",
                position
            )));
        }
        let index = self.index(position);
        self.tiles[index] = tile;
        Ok(())
    }

    /// Whether the tile can be stood on, ignoring entities.
    pub fn is_passable(&self, position: Position) -> bool {
        self.tile(position).map(TileType::is_passable).unwrap_or(false)
    }

    /// Whether the tile blocks sight. Out-of-bounds blocks.
    pub fn blocks_sight(&self, position: Position) -> bool {
        self.tile(position).map(TileType::blocks_sight).unwrap_or(true)
    }

    fn index(&self, position: Position) -> usize {
        (position.y * self.width + position.x) as usize
    }
}

/// Map queries consumed by the AI and movement code.
pub trait MapQuery {
    /// Whether a mover could step onto the position right now.
    fn is_walkable(&self, position: Position) -> bool;

    /// The first step of a shortest cardinal path from `from` toward `to`.
    ///
    /// `to` itself counts as reachable even when occupied, so a path ending
    /// next to an occupied goal is found. Returns `None` when no path exists
    /// or the only step would be onto an unwalkable goal.
    fn step_toward(&self, from: Position, to: Position) -> Option<Position> {
        first_step(from, to, |position| self.is_walkable(position))
    }
}

impl MapQuery for GameMap {
    fn is_walkable(&self, position: Position) -> bool {
        self.is_passable(position)
    }
}

/// A map plus the entities standing on it, seen from one mover.
///
/// Tiles holding a living blocking entity other than the mover are not
/// walkable.
#[derive(Clone, Copy)]
pub struct WorldView<'a> {
    map: &'a GameMap,
    store: &'a EntityStore,
    mover: Option<EntityId>,
}

impl<'a> WorldView<'a> {
    pub fn new(map: &'a GameMap, store: &'a EntityStore, mover: Option<EntityId>) -> Self {
        Self { map, store, mover }
    }
}

impl MapQuery for WorldView<'_> {
    fn is_walkable(&self, position: Position) -> bool {
        if !self.map.is_passable(position) {
            return false;
        }
        match self.store.blocking_entity_at(position) {
            Some(occupant) => Some(occupant) == self.mover,
            None => true,
        }
    }
}

/// A* over cardinal moves; returns the first step of the path.
fn first_step(
    from: Position,
    to: Position,
    walkable: impl Fn(Position) -> bool,
) -> Option<Position> {
    if from == to {
        return None;
    }
    let (path, _cost) = astar(
        &from,
        |position| {
            position
                .cardinal_adjacent_positions()
                .into_iter()
                .filter(|next| *next == to || walkable(*next))
                .map(|next| (next, 1u32))
                .collect::<Vec<_>>()
        },
        |position| position.manhattan_distance(to),
        |position| *position == to,
    )?;

    let step = *path.get(1)?;
    if step == to && !walkable(to) {
        None
    } else {
        Some(step)
    }
}
