//! Grid-cell occupancy index used by chain movement
//!
//! Keys are grid cells of `GRID_SIZE` pixels. Each key is reference counted
//! so two blocks snapped into the same cell do not unregister each other.

use std::collections::HashMap;

use glam::Vec2;

use crate::consts::GRID_SIZE;

/// Grid cell coordinate
pub type CellKey = (i32, i32);

/// Cell containing a point
#[inline]
pub fn cell_key(pos: Vec2) -> CellKey {
    (
        (pos.x / GRID_SIZE).floor() as i32,
        (pos.y / GRID_SIZE).floor() as i32,
    )
}

#[derive(Debug, Clone, Default)]
pub struct ObstacleIndex {
    cells: HashMap<CellKey, u32>,
}

impl ObstacleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pos: Vec2) {
        *self.cells.entry(cell_key(pos)).or_insert(0) += 1;
    }

    pub fn remove(&mut self, pos: Vec2) {
        let key = cell_key(pos);
        if let Some(count) = self.cells.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                self.cells.remove(&key);
            }
        }
    }

    /// O(1) occupancy check for the cell containing `pos`
    #[inline]
    pub fn is_occupied(&self, pos: Vec2) -> bool {
        self.cells.contains_key(&cell_key(pos))
    }

    pub fn contains_key(&self, key: CellKey) -> bool {
        self.cells.contains_key(&key)
    }

    /// Number of occupied cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_key_floors() {
        assert_eq!(cell_key(Vec2::new(0.0, 0.0)), (0, 0));
        assert_eq!(cell_key(Vec2::new(19.9, 39.9)), (0, 1));
        assert_eq!(cell_key(Vec2::new(20.0, 40.0)), (1, 2));
        assert_eq!(cell_key(Vec2::new(-0.5, 0.0)), (-1, 0));
    }

    #[test]
    fn test_shared_cell_is_reference_counted() {
        let mut index = ObstacleIndex::new();
        index.insert(Vec2::new(40.0, 40.0));
        index.insert(Vec2::new(45.0, 41.0));
        assert_eq!(index.len(), 1);

        index.remove(Vec2::new(40.0, 40.0));
        assert!(index.is_occupied(Vec2::new(50.0, 50.0)));

        index.remove(Vec2::new(45.0, 41.0));
        assert!(!index.is_occupied(Vec2::new(50.0, 50.0)));
        assert!(index.is_empty());
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut index = ObstacleIndex::new();
        index.remove(Vec2::new(100.0, 100.0));
        assert!(index.is_empty());
    }
}
