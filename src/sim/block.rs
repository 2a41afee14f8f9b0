//! Destructible blocks ("mushrooms")
//!
//! A block is a 4x4 grid of independently destructible cells. `health`
//! always equals the number of intact cells; the block is gone at zero.

use glam::Vec2;
use rand::Rng;

use super::geometry::Rect;
use super::obstacles::ObstacleIndex;
use crate::consts::{BLOCK_SIZE, BORDER_WIDTH, BOTTOM_BORDER_WIDTH, GRID_SIZE, SECTION_SIZE};
use crate::Field;

/// Cells per block
pub const SECTION_COUNT: usize = 16;
/// Cells per block row
pub const SECTIONS_PER_ROW: usize = 4;
/// Number of colour palettes blocks pick from
pub const BLOCK_PALETTES: u8 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub pos: Vec2,
    pub size: f32,
    pub health: u8,
    pub sections: [bool; SECTION_COUNT],
    /// Palette index for rendering
    pub color_set: u8,
}

impl Block {
    pub fn new(pos: Vec2, color_set: u8) -> Self {
        Self {
            pos,
            size: BLOCK_SIZE,
            health: SECTION_COUNT as u8,
            sections: [true; SECTION_COUNT],
            color_set,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::square(self.pos, self.size)
    }

    /// Top-left corner of a cell
    pub fn section_origin(&self, index: usize) -> Vec2 {
        let col = (index % SECTIONS_PER_ROW) as f32;
        let row = (index / SECTIONS_PER_ROW) as f32;
        self.pos + Vec2::new(col * SECTION_SIZE, row * SECTION_SIZE)
    }

    pub fn section_center(&self, index: usize) -> Vec2 {
        self.section_origin(index) + Vec2::splat(SECTION_SIZE * 0.5)
    }

    pub fn section_rect(&self, index: usize) -> Rect {
        Rect::square(self.section_origin(index), SECTION_SIZE)
    }

    pub fn is_intact(&self, index: usize) -> bool {
        self.sections.get(index).copied().unwrap_or(false)
    }

    pub fn is_destroyed(&self) -> bool {
        self.health == 0
    }

    /// Clear one cell; returns false if it was already gone or out of range
    pub fn clear_section(&mut self, index: usize) -> bool {
        match self.sections.get_mut(index) {
            Some(cell) if *cell => {
                *cell = false;
                self.health -= 1;
                true
            }
            _ => false,
        }
    }

    /// In-grid orthogonal neighbours: right, left, below, above
    pub fn neighbors(index: usize) -> Vec<usize> {
        let row = index / SECTIONS_PER_ROW;
        let col = index % SECTIONS_PER_ROW;
        let mut out = Vec::with_capacity(4);
        if col + 1 < SECTIONS_PER_ROW {
            out.push(index + 1);
        }
        if col > 0 {
            out.push(index - 1);
        }
        if row + 1 < SECTIONS_PER_ROW {
            out.push(index + SECTIONS_PER_ROW);
        }
        if row > 0 {
            out.push(index - SECTIONS_PER_ROW);
        }
        out
    }

    /// First intact neighbour in right/left/below/above order
    pub fn intact_neighbor(&self, index: usize) -> Option<usize> {
        Self::neighbors(index).into_iter().find(|&n| self.sections[n])
    }

    /// Indices of every intact cell
    pub fn intact_sections(&self) -> Vec<usize> {
        (0..SECTION_COUNT).filter(|&i| self.sections[i]).collect()
    }

    /// Apply `damage` cell-clears starting at `index`, spreading to the
    /// nearest intact cells so health keeps matching the grid. Returns the
    /// cleared cells.
    pub fn damage_from(&mut self, index: usize, damage: u8) -> Vec<usize> {
        let mut cleared = Vec::with_capacity(damage as usize);
        if self.clear_section(index) {
            cleared.push(index);
        }
        while cleared.len() < damage as usize && !self.is_destroyed() {
            let origin = self.section_center(index);
            let next = self
                .intact_sections()
                .into_iter()
                .min_by(|&a, &b| {
                    let da = self.section_center(a).distance_squared(origin);
                    let db = self.section_center(b).distance_squared(origin);
                    da.total_cmp(&db)
                });
            match next {
                Some(n) => {
                    self.clear_section(n);
                    cleared.push(n);
                }
                None => break,
            }
        }
        cleared
    }

    /// Clear one randomly chosen in-grid neighbour if it is still intact
    pub fn splash<R: Rng + ?Sized>(&mut self, index: usize, rng: &mut R) -> Option<usize> {
        let neighbors = Self::neighbors(index);
        if neighbors.is_empty() {
            return None;
        }
        let pick = neighbors[rng.random_range(0..neighbors.len())];
        self.clear_section(pick).then_some(pick)
    }
}

/// Blocks plus the obstacle index, kept in lock-step
#[derive(Debug, Clone, Default)]
pub struct BlockField {
    pub blocks: Vec<Block>,
    pub index: ObstacleIndex,
}

impl BlockField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snap a requested position to the grid, keeping clear of the borders
    pub fn snap(field: &Field, pos: Vec2) -> Vec2 {
        let x = (pos.x / GRID_SIZE).floor() * GRID_SIZE;
        let y = (pos.y / GRID_SIZE).floor() * GRID_SIZE;
        let min_x = BORDER_WIDTH + GRID_SIZE;
        let max_x = field.width - BORDER_WIDTH - BLOCK_SIZE - GRID_SIZE;
        let min_y = BORDER_WIDTH + GRID_SIZE;
        let max_y = field.height - BOTTOM_BORDER_WIDTH - BLOCK_SIZE - GRID_SIZE;
        Vec2::new(x.clamp(min_x, max_x), y.clamp(min_y, max_y))
    }

    /// Grid-aligned spawn used for level layout
    pub fn spawn_snapped<R: Rng + ?Sized>(&mut self, field: &Field, pos: Vec2, rng: &mut R) -> Vec2 {
        let snapped = Self::snap(field, pos);
        self.spawn_at(snapped, rng);
        snapped
    }

    /// Spawn exactly at `pos` (blocks planted by destroyed segments)
    pub fn spawn_at<R: Rng + ?Sized>(&mut self, pos: Vec2, rng: &mut R) {
        let color_set = rng.random_range(0..BLOCK_PALETTES);
        self.blocks.push(Block::new(pos, color_set));
        self.index.insert(pos);
    }

    /// Block anchored exactly at `pos`
    pub fn find_at_mut(&mut self, pos: Vec2) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.pos == pos)
    }

    /// Drop destroyed blocks and unregister them from the index
    pub fn prune(&mut self) -> usize {
        let before = self.blocks.len();
        let index = &mut self.index;
        self.blocks.retain(|b| {
            if b.is_destroyed() {
                index.remove(b.pos);
                false
            } else {
                true
            }
        });
        before - self.blocks.len()
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn intact_count(block: &Block) -> u8 {
        block.sections.iter().filter(|&&s| s).count() as u8
    }

    #[test]
    fn test_new_block_is_full() {
        let block = Block::new(Vec2::new(40.0, 40.0), 0);
        assert_eq!(block.health, 16);
        assert_eq!(intact_count(&block), 16);
    }

    #[test]
    fn test_neighbors_stay_in_grid() {
        assert_eq!(Block::neighbors(0), vec![1, 4]);
        assert_eq!(Block::neighbors(3), vec![2, 7]);
        assert_eq!(Block::neighbors(5), vec![6, 4, 9, 1]);
        assert_eq!(Block::neighbors(15), vec![14, 11]);
    }

    #[test]
    fn test_clear_section_twice() {
        let mut block = Block::new(Vec2::ZERO, 0);
        assert!(block.clear_section(5));
        assert!(!block.clear_section(5));
        assert!(!block.clear_section(99));
        assert_eq!(block.health, 15);
    }

    #[test]
    fn test_plasma_damage_clears_three_cells() {
        let mut block = Block::new(Vec2::ZERO, 0);
        let cleared = block.damage_from(5, 3);
        assert_eq!(cleared.len(), 3);
        assert_eq!(cleared[0], 5);
        assert_eq!(block.health, 13);
    }

    #[test]
    fn test_prune_unregisters_destroyed_blocks() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut field = BlockField::new();
        field.spawn_at(Vec2::new(100.0, 100.0), &mut rng);
        field.spawn_at(Vec2::new(200.0, 100.0), &mut rng);
        for i in 0..SECTION_COUNT {
            field.blocks[0].clear_section(i);
        }
        assert_eq!(field.prune(), 1);
        assert_eq!(field.len(), 1);
        assert!(!field.index.is_occupied(Vec2::new(100.0, 100.0)));
        assert!(field.index.is_occupied(Vec2::new(200.0, 100.0)));
    }

    #[test]
    fn test_snap_keeps_blocks_inside_borders() {
        let field = Field::default();
        let p = BlockField::snap(&field, Vec2::new(-50.0, 10_000.0));
        assert_eq!(p.x, BORDER_WIDTH + GRID_SIZE);
        assert!(p.y + BLOCK_SIZE <= field.height - BOTTOM_BORDER_WIDTH);
        let q = BlockField::snap(&field, Vec2::new(123.0, 87.0));
        assert_eq!(q, Vec2::new(120.0, 80.0));
    }

    proptest! {
        #[test]
        fn prop_health_matches_sections(
            seed in any::<u64>(),
            hits in proptest::collection::vec((0usize..16, 1u8..4), 0..40),
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut block = Block::new(Vec2::ZERO, 0);
            for (index, damage) in hits {
                block.damage_from(index, damage);
                block.splash(index, &mut rng);
                prop_assert_eq!(block.health, intact_count(&block));
            }
        }
    }
}
