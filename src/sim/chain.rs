//! Segmented enemy chains ("Moloch" centipedes)
//!
//! A chain owns an ordered list of segments. Only the head paths; each body
//! segment steps into the spot the segment ahead of it just left. Chains
//! sweep sideways, drop a row at every obstacle, armor up on the floor and
//! can be cut into independent chains.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::obstacles::ObstacleIndex;
use crate::consts::{BORDER_WIDTH, SEGMENT_SIZE};
use crate::tuning::ChainTuning;
use crate::{Field, Millis};

/// Metallic tints an armored body can take
pub const METALLIC_TINTS: u8 = 4;

/// Per-level values every chain of that level is built from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelContext {
    pub level: u32,
    /// Glyph drawn on every head this level
    pub glyph: char,
    /// Horizontal/vertical step per cadence tick
    pub step: f32,
    /// Cadence between chain updates
    pub delay_ms: Millis,
}

/// Segment colouring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentTint {
    Head,
    Body,
    /// Armored body, one of `METALLIC_TINTS` shades
    Metallic(u8),
}

/// Outcome of `Segment::take_damage`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Segment was already dead
    Ignored,
    /// Armor soaked the hit; segment still alive
    Absorbed,
    /// Armor ran out and the segment died
    ArmorBroken,
    /// Unarmored segment died outright
    Killed,
}

impl DamageOutcome {
    pub fn destroyed(self) -> bool {
        matches!(self, DamageOutcome::ArmorBroken | DamageOutcome::Killed)
    }

    pub fn hit_armor(self) -> bool {
        matches!(self, DamageOutcome::Absorbed | DamageOutcome::ArmorBroken)
    }
}

/// Notable things a chain reports from `update`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainEvent {
    /// Head went down to the floor and climbed back to the top
    RoundTrip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub pos: Vec2,
    /// +1 = moving right, -1 = moving left
    pub direction: i32,
    pub size: f32,
    pub is_head: bool,
    pub alive: bool,
    pub armored: bool,
    pub armor: i32,
    pub tint: SegmentTint,
    pub glyph: Option<char>,
    pub reached_bottom: bool,
}

impl Segment {
    pub fn new(pos: Vec2, direction: i32, is_head: bool) -> Self {
        Self {
            pos,
            direction,
            size: SEGMENT_SIZE,
            is_head,
            alive: true,
            armored: false,
            armor: 0,
            tint: if is_head { SegmentTint::Head } else { SegmentTint::Body },
            glyph: None,
            reached_bottom: false,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::splat(self.size * 0.5)
    }

    /// Armor is a hit-point pool; unarmored segments die to any hit
    pub fn take_damage(&mut self, amount: u8) -> DamageOutcome {
        if !self.alive {
            return DamageOutcome::Ignored;
        }
        if self.armored {
            self.armor -= i32::from(amount);
            if self.armor <= 0 {
                self.armor = 0;
                self.armored = false;
                self.alive = false;
                DamageOutcome::ArmorBroken
            } else {
                DamageOutcome::Absorbed
            }
        } else {
            self.alive = false;
            DamageOutcome::Killed
        }
    }

    /// Make this segment the leader of its chain
    fn promote(&mut self, glyph: char) {
        self.is_head = true;
        self.glyph = Some(glyph);
        if self.tint == SegmentTint::Body {
            self.tint = SegmentTint::Head;
        }
    }

    /// Advance a head one cadence step
    fn step_head<R: Rng + ?Sized>(
        &mut self,
        step: f32,
        field: &Field,
        obstacles: &ObstacleIndex,
        tuning: &ChainTuning,
        rng: &mut R,
    ) -> Option<ChainEvent> {
        let floor = field.chain_floor(self.size);
        let right_limit = field.width - BORDER_WIDTH - self.size;

        if self.pos.y >= floor {
            if !self.reached_bottom {
                self.reached_bottom = true;
                self.armored = true;
                self.armor = tuning.floor_head_armor;
            }
            self.pos.y = floor;

            // Sweep along the floor, ignoring obstacles
            let next_x = self.pos.x + self.direction as f32 * step;
            if next_x < BORDER_WIDTH || next_x >= right_limit {
                self.direction = -self.direction;
            } else {
                self.pos.x = next_x;
            }

            if rng.random_bool(tuning.climb_chance) {
                self.pos.y -= step;
            }
            return None;
        }

        let next_x = self.pos.x + self.direction as f32 * step;
        let hits_boundary = next_x < BORDER_WIDTH || next_x >= right_limit;
        let hits_obstacle = obstacles.is_occupied(Vec2::new(next_x, self.pos.y));

        if hits_boundary || hits_obstacle {
            self.direction = -self.direction;
            if self.reached_bottom {
                self.pos.y -= step;
            } else {
                self.pos.y += step;
            }
        } else {
            self.pos.x = next_x;
        }

        if self.reached_bottom && self.pos.y <= field.chain_ceiling(self.size) {
            self.reached_bottom = false;
            // Only floor-granted armor comes off
            if self.armored && self.armor <= tuning.floor_head_armor {
                self.armored = false;
                self.armor = 0;
            }
            return Some(ChainEvent::RoundTrip);
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub segments: Vec<Segment>,
    pub step: f32,
    pub delay_ms: Millis,
    last_update: Millis,
}

impl Chain {
    /// Build a fresh chain trailing horizontally behind its head
    pub fn spawn(ctx: &LevelContext, count: usize, start: Vec2, direction: i32, now: Millis) -> Self {
        let segments = (0..count)
            .map(|i| {
                let offset = Vec2::new(i as f32 * SEGMENT_SIZE * direction as f32, 0.0);
                let mut seg = Segment::new(start - offset, direction, i == 0);
                if i == 0 {
                    seg.glyph = Some(ctx.glyph);
                }
                seg
            })
            .collect();
        Self {
            segments,
            step: ctx.step,
            delay_ms: ctx.delay_ms,
            last_update: now,
        }
    }

    /// Wrap existing segments, keeping the parent's cadence
    fn with_segments(&self, segments: Vec<Segment>) -> Self {
        Self {
            segments,
            step: self.step,
            delay_ms: self.delay_ms,
            last_update: self.last_update,
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn head(&self) -> Option<&Segment> {
        self.segments.first().filter(|s| s.is_head)
    }

    pub fn alive_count(&self) -> usize {
        self.segments.iter().filter(|s| s.alive).count()
    }

    /// Advance one cadence tick if `delay_ms` has elapsed
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        now: Millis,
        field: &Field,
        obstacles: &ObstacleIndex,
        tuning: &ChainTuning,
        rng: &mut R,
    ) -> Option<ChainEvent> {
        if now.saturating_sub(self.last_update) < self.delay_ms {
            return None;
        }
        self.last_update = now;
        if self.segments.is_empty() {
            return None;
        }

        let trail: Vec<Vec2> = self.segments.iter().map(|s| s.pos).collect();

        let step = self.step;
        let head = &mut self.segments[0];
        let event = if head.is_head && head.alive {
            head.step_head(step, field, obstacles, tuning, rng)
        } else {
            None
        };
        let direction = self.segments[0].direction;

        for (seg, ahead) in self.segments.iter_mut().skip(1).zip(trail) {
            if seg.alive {
                seg.pos = ahead;
                seg.direction = direction;
            }
        }

        self.apply_floor_armor(field, tuning, rng);
        event
    }

    /// Once any member touches the floor, armor every unarmored member.
    /// Already-armored segments are left alone. Returns true if the floor
    /// was touched.
    pub fn apply_floor_armor<R: Rng + ?Sized>(
        &mut self,
        field: &Field,
        tuning: &ChainTuning,
        rng: &mut R,
    ) -> bool {
        let floor = field.chain_floor(SEGMENT_SIZE);
        if !self.segments.iter().any(|s| s.alive && s.pos.y >= floor) {
            return false;
        }
        for seg in self.segments.iter_mut().filter(|s| s.alive && !s.armored) {
            seg.armored = true;
            if seg.is_head {
                seg.armor = tuning.floor_chain_head_armor;
            } else {
                seg.armor = tuning.floor_chain_body_armor;
                seg.tint = SegmentTint::Metallic(rng.random_range(0..METALLIC_TINTS));
            }
        }
        true
    }

    /// Cut the chain at an interior segment. The segment at `index` is
    /// removed; the one after it becomes a head keeping its direction.
    /// Invalid indices return the chain unchanged.
    pub fn split_at(self, index: usize, glyph: char) -> Vec<Chain> {
        if index == 0 || index >= self.segments.len() {
            return vec![self];
        }
        let mut left = self.segments.clone();
        let mut right = left.split_off(index);
        right.remove(0);

        if let Some(first) = right.first_mut() {
            first.promote(glyph);
        }

        let mut chains = Vec::with_capacity(2);
        if !left.is_empty() {
            chains.push(self.with_segments(left));
        }
        if !right.is_empty() {
            chains.push(self.with_segments(right));
        }
        chains
    }

    /// Detach `[index..]` into a new chain whose head turns around.
    /// Returns `None` unless both sides keep at least one segment.
    pub fn detach_from(&mut self, index: usize, glyph: char) -> Option<Chain> {
        if index == 0 || index >= self.segments.len() {
            return None;
        }
        let mut tail = self.segments.split_off(index);
        if let Some(first) = tail.first_mut() {
            first.promote(glyph);
            first.direction = -first.direction;
        }
        let direction = tail[0].direction;
        for seg in tail.iter_mut().skip(1) {
            seg.direction = direction;
        }
        Some(self.with_segments(tail))
    }

    /// Drop dead segments and make sure the first survivor leads
    pub fn prune_dead(&mut self, glyph: char) {
        self.segments.retain(|s| s.alive);
        for (i, seg) in self.segments.iter_mut().enumerate() {
            if i == 0 {
                if !seg.is_head {
                    seg.promote(glyph);
                }
            } else {
                seg.is_head = false;
            }
        }
    }
}
