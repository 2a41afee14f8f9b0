//! Spider pursuer
//!
//! Spiders drift toward the player, chew through blocks in their way and
//! hunt aggressively along the bottom edge.

use glam::Vec2;
use rand::Rng;

use super::block::{Block, BlockField};
use super::geometry::{normalize_or, Rect};
use crate::consts::{BORDER_WIDTH, SECTION_SIZE, SPIDER_SIZE};
use crate::tuning::SpiderTuning;
use crate::{Field, Millis};

/// Distance a spider backs off after finishing a chew
const CHEW_NUDGE: f32 = 2.0;
/// Jitter applied when re-aiming after a chew
const CHEW_AIM_JITTER: f32 = 0.3;
/// Jitter applied to ordinary pursuit
const PURSUE_JITTER: f32 = 0.2;
/// Jitter applied when bouncing off an eaten-out block
const BOUNCE_JITTER: f32 = 0.4;
/// Most sections targeted by a single collision chew
const MAX_CHEW_TARGETS: usize = 3;

/// An in-progress chew on one block
#[derive(Debug, Clone, PartialEq)]
pub struct Chew {
    /// Anchor of the block being eaten
    pub block: Vec2,
    pub sections: Vec<usize>,
    pub elapsed_ms: Millis,
}

/// Cells a spider removed from a block this tick
#[derive(Debug, Clone, PartialEq)]
pub struct ChewReport {
    pub block: Vec2,
    pub cleared: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct Spider {
    pub pos: Vec2,
    pub direction: Vec2,
    pub speed: f32,
    pub size: f32,
    pub alive: bool,
    pub at_bottom: bool,
    pub chew: Option<Chew>,
    last_direction_change: Millis,
    last_update: Millis,
}

fn jitter<R: Rng + ?Sized>(rng: &mut R, amount: f32) -> Vec2 {
    Vec2::new(
        rng.random_range(-amount..=amount),
        rng.random_range(-amount..=amount),
    )
}

fn random_heading<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    normalize_or(jitter(rng, 1.0), Vec2::X)
}

fn random_sign<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    if rng.random_bool(0.5) { 1.0 } else { -1.0 }
}

impl Spider {
    /// New spider heading left or right at random
    pub fn new<R: Rng + ?Sized>(pos: Vec2, speed: f32, now: Millis, rng: &mut R) -> Self {
        Self {
            pos,
            direction: Vec2::new(random_sign(rng), 0.0),
            speed,
            size: SPIDER_SIZE,
            alive: true,
            at_bottom: false,
            chew: None,
            last_direction_change: now,
            last_update: now,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::square(self.pos, self.size)
    }

    pub fn center(&self) -> Vec2 {
        self.rect().center()
    }

    pub fn is_chewing(&self) -> bool {
        self.chew.is_some()
    }

    fn bottom_limit(&self, field: &Field) -> f32 {
        field.height - BORDER_WIDTH - self.size
    }

    /// Unit vector toward `target` plus jitter
    fn aim_at<R: Rng + ?Sized>(&self, target: Vec2, amount: f32, rng: &mut R) -> Vec2 {
        let to_target = (target - self.pos).normalize_or_zero();
        let aimed = to_target + jitter(rng, amount);
        if aimed == Vec2::ZERO {
            random_heading(rng)
        } else {
            normalize_or(aimed, Vec2::X)
        }
    }

    /// One simulation step toward `target` (the player's position)
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        now: Millis,
        field: &Field,
        blocks: &mut BlockField,
        target: Vec2,
        tuning: &SpiderTuning,
        rng: &mut R,
    ) -> Option<ChewReport> {
        let dt = now.saturating_sub(self.last_update);
        self.last_update = now;

        if let Some(chew) = self.chew.as_mut() {
            chew.elapsed_ms += dt;
            if chew.elapsed_ms < tuning.chew_duration_ms {
                return None;
            }
            return self.finish_chew(blocks, target, rng);
        }

        if let Some((block_idx, section)) = self.find_block_in_path(&blocks.blocks) {
            let block = &blocks.blocks[block_idx];
            let mut sections = vec![section];
            if let Some(extra) = block.intact_neighbor(section) {
                sections.push(extra);
            }
            log::debug!("spider chewing block at {:?}", block.pos);
            self.chew = Some(Chew {
                block: block.pos,
                sections,
                elapsed_ms: 0,
            });
            self.last_direction_change = now;
            return None;
        }

        self.steer(now, field, target, tuning, rng);

        let previous = self.pos;
        let speed = if self.at_bottom {
            tuning.aggressive_speed
        } else if self.direction.y < 0.0 {
            tuning.chase_speed
        } else {
            self.speed
        };
        self.pos += self.direction * speed;
        self.clamp_to_field(field, rng);

        self.collide_with_blocks(previous, now, blocks, target, tuning, rng)
    }

    fn finish_chew<R: Rng + ?Sized>(
        &mut self,
        blocks: &mut BlockField,
        target: Vec2,
        rng: &mut R,
    ) -> Option<ChewReport> {
        let chew = self.chew.take()?;
        let cleared: Vec<usize> = match blocks.find_at_mut(chew.block) {
            Some(block) => chew
                .sections
                .iter()
                .copied()
                .filter(|&s| block.clear_section(s))
                .collect(),
            None => Vec::new(),
        };

        self.direction = self.aim_at(target, CHEW_AIM_JITTER, rng);
        self.pos += self.direction * CHEW_NUDGE;

        (!cleared.is_empty()).then_some(ChewReport {
            block: chew.block,
            cleared,
        })
    }

    /// Pick the direction for this step
    fn steer<R: Rng + ?Sized>(
        &mut self,
        now: Millis,
        field: &Field,
        target: Vec2,
        tuning: &SpiderTuning,
        rng: &mut R,
    ) {
        self.at_bottom = self.pos.y >= self.bottom_limit(field) - tuning.bottom_zone;
        let cooled_down = now.saturating_sub(self.last_direction_change) > tuning.direction_cooldown_ms;
        let to_target = (target - self.pos).normalize_or_zero();

        if self.at_bottom {
            if rng.random_bool(tuning.bottom_retarget_chance) || cooled_down {
                // Hunt sideways or upward, never deeper
                let y = if to_target.y < 0.0 { -1.0 } else { 0.0 };
                let fallback = Vec2::new(random_sign(rng), 0.0);
                self.direction = normalize_or(Vec2::new(to_target.x, y), fallback);
                self.last_direction_change = now;
            }
        } else if cooled_down && rng.random_bool(tuning.pursue_chance) {
            self.direction = self.aim_at(target, PURSUE_JITTER, rng);
            self.last_direction_change = now;
        } else if cooled_down && rng.random_bool(tuning.wander_chance) {
            self.direction = if self.direction.y == 0.0 {
                Vec2::Y
            } else {
                Vec2::new(random_sign(rng), 0.0)
            };
            self.last_direction_change = now;
        }
    }

    fn clamp_to_field<R: Rng + ?Sized>(&mut self, field: &Field, rng: &mut R) {
        let right = field.width - BORDER_WIDTH - self.size;
        if self.pos.x < BORDER_WIDTH {
            self.pos.x = BORDER_WIDTH;
            self.direction.x = -self.direction.x;
        } else if self.pos.x > right {
            self.pos.x = right;
            self.direction.x = -self.direction.x;
        }

        let bottom = self.bottom_limit(field);
        if self.pos.y >= bottom {
            self.pos.y = bottom;
            if self.direction.y > 0.0 {
                self.direction = Vec2::new(random_sign(rng), 0.0);
            }
        }

        if self.pos.y <= BORDER_WIDTH {
            self.pos.y = BORDER_WIDTH;
            let down = if rng.random_bool(0.7) { 1.0 } else { 0.0 };
            self.direction = normalize_or(Vec2::new(random_sign(rng), down), Vec2::X);
        }
    }

    /// After moving into a block: maybe bite, then chew or bounce off
    fn collide_with_blocks<R: Rng + ?Sized>(
        &mut self,
        previous: Vec2,
        now: Millis,
        blocks: &mut BlockField,
        target: Vec2,
        tuning: &SpiderTuning,
        rng: &mut R,
    ) -> Option<ChewReport> {
        let rect = self.rect();
        let block = blocks
            .blocks
            .iter_mut()
            .find(|b| !b.is_destroyed() && b.rect().overlaps(&rect))?;

        let bite_chance = if self.at_bottom {
            tuning.aggressive_bite_chance
        } else {
            tuning.bite_chance
        };

        let mut cleared = Vec::new();
        if rng.random_bool(bite_chance) {
            let intact = block.intact_sections();
            if !intact.is_empty() {
                let pick = intact[rng.random_range(0..intact.len())];
                block.clear_section(pick);
                cleared.push(pick);
            }
        }

        let mut remaining = block.intact_sections();
        if remaining.is_empty() {
            self.pos = previous;
            self.direction = self.aim_at(target, BOUNCE_JITTER, rng);
            self.last_direction_change = now;
        } else {
            let mut sections = Vec::with_capacity(MAX_CHEW_TARGETS);
            while sections.len() < MAX_CHEW_TARGETS && !remaining.is_empty() {
                sections.push(remaining.swap_remove(rng.random_range(0..remaining.len())));
            }
            self.chew = Some(Chew {
                block: block.pos,
                sections,
                elapsed_ms: 0,
            });
        }

        (!cleared.is_empty()).then_some(ChewReport {
            block: block.pos,
            cleared,
        })
    }

    /// Intact section directly ahead within one step of travel
    pub fn find_block_in_path(&self, blocks: &[Block]) -> Option<(usize, usize)> {
        let pos = self.pos;
        let size = self.size;
        let reach = self.speed;
        let dir = self.direction;

        for (block_idx, block) in blocks.iter().enumerate() {
            for section in block.intact_sections() {
                let s = block.section_origin(section);
                let overlaps_x = pos.x < s.x + SECTION_SIZE && pos.x + size > s.x;
                let overlaps_y = pos.y < s.y + SECTION_SIZE && pos.y + size > s.y;

                let below = dir.y > 0.0
                    && overlaps_x
                    && pos.y + size <= s.y
                    && pos.y + size + reach >= s.y;
                let above = dir.y < 0.0
                    && overlaps_x
                    && pos.y >= s.y + SECTION_SIZE
                    && pos.y - reach <= s.y + SECTION_SIZE;
                let left = dir.x < 0.0
                    && overlaps_y
                    && pos.x >= s.x + SECTION_SIZE
                    && pos.x - reach <= s.x + SECTION_SIZE;
                let right = dir.x > 0.0
                    && overlaps_y
                    && pos.x + size <= s.x
                    && pos.x + size + reach >= s.x;

                if below || above || left || right {
                    return Some((block_idx, section));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::block::SECTION_COUNT;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn spider_at(pos: Vec2, direction: Vec2) -> Spider {
        let mut rng = Pcg32::seed_from_u64(0);
        let mut s = Spider::new(pos, 1.0, 0, &mut rng);
        s.direction = direction;
        s
    }

    #[test]
    fn test_block_in_path_starts_chewing() {
        let mut rng = Pcg32::seed_from_u64(4);
        let tuning = SpiderTuning::default();
        let field = Field::default();
        let mut blocks = BlockField::new();
        blocks.spawn_at(Vec2::new(121.0, 100.0), &mut rng);
        let mut spider = spider_at(Vec2::new(100.0, 100.0), Vec2::X);

        let report = spider.update(16, &field, &mut blocks, Vec2::new(400.0, 500.0), &tuning, &mut rng);
        assert!(report.is_none());
        let chew = spider.chew.clone().unwrap();
        assert_eq!(chew.block, Vec2::new(121.0, 100.0));
        assert_eq!(chew.sections, vec![0, 1]);
        // Stays put while chewing
        assert_eq!(spider.pos, Vec2::new(100.0, 100.0));

        spider.update(200, &field, &mut blocks, Vec2::new(400.0, 500.0), &tuning, &mut rng);
        assert!(spider.is_chewing());

        let report = spider
            .update(400, &field, &mut blocks, Vec2::new(400.0, 500.0), &tuning, &mut rng)
            .unwrap();
        assert_eq!(report.cleared, vec![0, 1]);
        assert!(!spider.is_chewing());
        assert_eq!(blocks.blocks[0].health, SECTION_COUNT as u8 - 2);
        assert!((spider.direction.length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_pursuit_waits_for_cooldown() {
        let mut rng = Pcg32::seed_from_u64(9);
        let tuning = SpiderTuning {
            pursue_chance: 1.0,
            ..Default::default()
        };
        let field = Field::default();
        let mut blocks = BlockField::new();
        let player = Vec2::new(400.0, 500.0);
        let mut spider = spider_at(Vec2::new(400.0, 100.0), Vec2::X);

        spider.update(tuning.direction_cooldown_ms, &field, &mut blocks, player, &tuning, &mut rng);
        assert_eq!(spider.direction, Vec2::X);

        let later = tuning.direction_cooldown_ms + 16;
        spider.update(later, &field, &mut blocks, player, &tuning, &mut rng);
        // Player is straight below; jitter only tilts the heading a little
        assert!(spider.direction.y > 0.9, "{:?}", spider.direction);
        assert!(spider.direction.x.abs() < 0.3);
        assert!((spider.direction.length() - 1.0).abs() < 1e-4);

        // Freshly re-aimed, so the next step keeps the heading
        let aimed = spider.direction;
        spider.update(later + 16, &field, &mut blocks, player, &tuning, &mut rng);
        assert_eq!(spider.direction, aimed);
    }

    #[test]
    fn test_bottom_zone_uses_aggressive_speed() {
        let mut rng = Pcg32::seed_from_u64(2);
        let tuning = SpiderTuning {
            pursue_chance: 0.0,
            wander_chance: 0.0,
            bottom_retarget_chance: 0.0,
            ..Default::default()
        };
        let field = Field::default();
        let mut blocks = BlockField::new();
        let player = Vec2::new(600.0, 300.0);

        let floor_y = field.height - BORDER_WIDTH - SPIDER_SIZE - 1.0;
        let mut low = spider_at(Vec2::new(300.0, floor_y), Vec2::X);
        low.update(16, &field, &mut blocks, player, &tuning, &mut rng);
        assert!(low.at_bottom);
        assert_eq!(low.pos, Vec2::new(300.0 + tuning.aggressive_speed, floor_y));

        let mut high = spider_at(Vec2::new(300.0, 200.0), Vec2::X);
        high.update(16, &field, &mut blocks, player, &tuning, &mut rng);
        assert!(!high.at_bottom);
        assert_eq!(high.pos, Vec2::new(301.0, 200.0));
    }

    #[test]
    fn test_clamps_to_side_walls() {
        let mut rng = Pcg32::seed_from_u64(4);
        let tuning = SpiderTuning {
            pursue_chance: 0.0,
            wander_chance: 0.0,
            ..Default::default()
        };
        let field = Field::default();
        let mut blocks = BlockField::new();
        let mut spider = spider_at(Vec2::new(BORDER_WIDTH + 0.5, 200.0), -Vec2::X);

        spider.update(16, &field, &mut blocks, Vec2::new(400.0, 500.0), &tuning, &mut rng);
        assert_eq!(spider.pos.x, BORDER_WIDTH);
        assert_eq!(spider.direction.x, 1.0);
    }

    #[test]
    fn test_bottom_spider_never_heads_down() {
        let mut rng = Pcg32::seed_from_u64(9);
        let tuning = SpiderTuning::default();
        let field = Field::default();
        let mut blocks = BlockField::new();
        let bottom = field.height - BORDER_WIDTH - SPIDER_SIZE;
        let mut spider = spider_at(Vec2::new(300.0, bottom), Vec2::Y);

        spider.update(16, &field, &mut blocks, Vec2::new(600.0, 560.0), &tuning, &mut rng);
        assert!(spider.at_bottom);
        assert!(spider.pos.y <= bottom);
        assert!(spider.direction.y <= 0.0);
    }

    #[test]
    fn test_direction_stays_normalized() {
        let mut rng = Pcg32::seed_from_u64(11);
        let tuning = SpiderTuning::default();
        let field = Field::default();
        let mut blocks = BlockField::new();
        let mut spider = spider_at(Vec2::new(300.0, 100.0), Vec2::X);

        for t in 1..500 {
            spider.update(t * 16, &field, &mut blocks, Vec2::new(400.0, 520.0), &tuning, &mut rng);
            assert!((spider.direction.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_bite_on_last_section_bounces_back() {
        let mut rng = Pcg32::seed_from_u64(2);
        let tuning = SpiderTuning {
            bite_chance: 1.0,
            pursue_chance: 0.0,
            wander_chance: 0.0,
            ..Default::default()
        };
        let field = Field::default();
        let mut blocks = BlockField::new();
        blocks.spawn_at(Vec2::new(200.0, 200.0), &mut rng);
        for i in 1..SECTION_COUNT {
            blocks.blocks[0].clear_section(i);
        }

        // Diagonal approach so the look-ahead misses the remaining cell
        let start = Vec2::new(180.5, 180.5);
        let mut spider = spider_at(start, Vec2::new(1.0, 1.0).normalize());
        let report = spider
            .update(16, &field, &mut blocks, Vec2::new(400.0, 500.0), &tuning, &mut rng)
            .unwrap();
        assert_eq!(report.cleared, vec![0]);
        assert!(blocks.blocks[0].is_destroyed());
        assert_eq!(spider.pos, start);
        assert!(!spider.is_chewing());
    }
}
