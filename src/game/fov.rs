//! # Field of View
//!
//! Radius-limited visibility from the player with Bresenham line-of-sight.
//! The game recomputes it only when the player moves; targeting reads it
//! through [`VisibilityQuery`].

use crate::{GameMap, Position};

/// Answers whether a tile is currently visible.
pub trait VisibilityQuery {
    fn is_visible(&self, position: Position) -> bool;
}

/// Visible and explored tiles for one viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FovMap {
    width: i32,
    height: i32,
    visible: Vec<bool>,
    explored: Vec<bool>,
}

impl FovMap {
    /// Creates an empty field of view sized to the map.
    pub fn new(map: &GameMap) -> Self {
        let size = (map.width() * map.height()) as usize;
        Self {
            width: map.width(),
            height: map.height(),
            visible: vec![false; size],
            explored: vec![false; size],
        }
    }

    /// Recomputes visibility from `origin`.
    ///
    /// A tile is visible when it lies within `radius` (Euclidean) and no
    /// sight-blocking tile sits strictly between it and the origin. Walls
    /// themselves can be seen. Visible tiles become explored.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{FovMap, GameMap, Position, VisibilityQuery};
    ///
    /// let map = GameMap::open_room(10, 10);
    /// let mut fov = FovMap::new(&map);
    /// fov.compute(&map, Position::new(5, 5), 3);
    ///
    /// assert!(fov.is_visible(Position::new(5, 7)));
    /// assert!(!fov.is_visible(Position::new(1, 1)));
    /// ```
    pub fn compute(&mut self, map: &GameMap, origin: Position, radius: u32) {
        self.visible.iter_mut().for_each(|cell| *cell = false);
        let r = radius as i32;
        for y in (origin.y - r)..=(origin.y + r) {
            for x in (origin.x - r)..=(origin.x + r) {
                let target = Position::new(x, y);
                let Some(index) = self.index(target) else {
                    continue;
                };
                if origin.euclidean_distance(target) > radius as f64 {
                    continue;
                }
                if line_of_sight(map, origin, target) {
                    self.visible[index] = true;
                    self.explored[index] = true;
                }
            }
        }
    }

    /// Whether the tile has ever been seen.
    pub fn is_explored(&self, position: Position) -> bool {
        self.index(position)
            .map(|index| self.explored[index])
            .unwrap_or(false)
    }

    fn index(&self, position: Position) -> Option<usize> {
        if position.x < 0 || position.y < 0 || position.x >= self.width || position.y >= self.height
        {
            return None;
        }
        Some((position.y * self.width + position.x) as usize)
    }
}

impl VisibilityQuery for FovMap {
    fn is_visible(&self, position: Position) -> bool {
        self.index(position)
            .map(|index| self.visible[index])
            .unwrap_or(false)
    }
}

/// Bresenham line-of-sight between two tiles.
///
/// Only the tiles strictly between the endpoints are tested.
pub fn line_of_sight(map: &GameMap, from: Position, to: Position) -> bool {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;
    let mut current = from;

    while current != to {
        let doubled = 2 * err;
        if doubled >= dy {
            err += dy;
            current.x += sx;
        }
        if doubled <= dx {
            err += dx;
            current.y += sy;
        }
        if current != to && map.blocks_sight(current) {
            return false;
        }
    }
    true
}
