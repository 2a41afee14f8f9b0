//! Player ship, bullets and the timed power states

use glam::Vec2;

use super::geometry::Rect;
use crate::consts::{
    BORDER_WIDTH, BOTTOM_BORDER_WIDTH, BULLET_HIT_RADIUS, BULLET_SIZE, PLASMA_BULLET_SIZE,
    PLASMA_HIT_RADIUS_SCALE, PLAYER_SIZE,
};
use crate::tuning::PlayerTuning;
use crate::{Field, Millis};

#[derive(Debug, Clone, PartialEq)]
pub struct Bullet {
    pub pos: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    pub plasma: bool,
    pub active: bool,
}

impl Bullet {
    pub fn new(pos: Vec2, velocity: Vec2, plasma: bool) -> Self {
        Self {
            pos,
            velocity,
            size: if plasma { PLASMA_BULLET_SIZE } else { BULLET_SIZE },
            plasma,
            active: true,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::splat(self.size * 0.5)
    }

    pub fn rect(&self) -> Rect {
        Rect::square(self.pos, self.size)
    }

    /// Generous hit radius used against block cells and segments
    pub fn hit_radius(&self) -> f32 {
        if self.plasma {
            BULLET_HIT_RADIUS * PLASMA_HIT_RADIUS_SCALE
        } else {
            BULLET_HIT_RADIUS
        }
    }

    pub fn damage(&self, tuning: &PlayerTuning) -> u8 {
        if self.plasma { tuning.plasma_damage } else { 1 }
    }

    /// Move one tick; leaving the field through the top or sides retires it
    pub fn advance(&mut self, field: &Field) {
        self.pos += self.velocity;
        if self.pos.y < BORDER_WIDTH || self.pos.x < 0.0 || self.pos.x > field.width {
            self.active = false;
        }
    }
}

/// Which timed power states ran out this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowerExpiry {
    pub energy: bool,
    pub plasma: bool,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub pos: Vec2,
    pub size: f32,
    pub speed: f32,
    /// Kill credit toward the next energize
    pub kill_count: u32,
    /// Start of the current energize, if any
    pub energized_at: Option<Millis>,
    /// Start of the current plasma window, if any
    pub plasma_at: Option<Millis>,
    last_shot: Option<Millis>,
}

impl Player {
    /// Centred horizontally, two ship-heights above the bottom
    pub fn new(field: &Field, tuning: &PlayerTuning) -> Self {
        Self {
            pos: Vec2::new(
                field.width / 2.0 - PLAYER_SIZE / 2.0,
                field.height - PLAYER_SIZE * 2.0,
            ),
            size: PLAYER_SIZE,
            speed: tuning.speed,
            kill_count: 0,
            energized_at: None,
            plasma_at: None,
            last_shot: None,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::splat(self.size * 0.5)
    }

    pub fn rect(&self) -> Rect {
        Rect::square(self.pos, self.size)
    }

    pub fn is_energized(&self) -> bool {
        self.energized_at.is_some()
    }

    pub fn is_plasma(&self) -> bool {
        self.plasma_at.is_some()
    }

    /// Move by `axis` (each component in -1..=1) and clamp to the lower half
    pub fn steer(&mut self, axis: Vec2, field: &Field) {
        self.pos += axis * self.speed;
        self.pos.x = self
            .pos
            .x
            .clamp(BORDER_WIDTH, field.width - BORDER_WIDTH - self.size);
        self.pos.y = self
            .pos
            .y
            .clamp(field.midline(), field.height - BOTTOM_BORDER_WIDTH - self.size);
    }

    /// Add kill credit. Credit only counts while not energized; crossing the
    /// threshold starts an energize and zeroes the counter. Returns true when
    /// that happens.
    pub fn credit_kill(&mut self, credit: u32, now: Millis, tuning: &PlayerTuning) -> bool {
        if self.is_energized() {
            return false;
        }
        self.kill_count += credit;
        if self.kill_count >= tuning.energy_threshold {
            self.kill_count = 0;
            self.energized_at = Some(now);
            true
        } else {
            false
        }
    }

    pub fn grant_plasma(&mut self, now: Millis) {
        self.plasma_at = Some(now);
    }

    /// End power states whose windows have elapsed
    pub fn expire_powers(&mut self, now: Millis, tuning: &PlayerTuning) -> PowerExpiry {
        let mut expiry = PowerExpiry::default();
        if let Some(since) = self.energized_at
            && now.saturating_sub(since) > tuning.energy_duration_ms
        {
            self.energized_at = None;
            expiry.energy = true;
        }
        if let Some(since) = self.plasma_at
            && now.saturating_sub(since) > tuning.plasma_duration_ms
        {
            self.plasma_at = None;
            expiry.plasma = true;
        }
        expiry
    }

    /// Remaining energize time, for the HUD meter
    pub fn energy_remaining_ms(&self, now: Millis, tuning: &PlayerTuning) -> Millis {
        self.energized_at
            .map(|since| tuning.energy_duration_ms.saturating_sub(now.saturating_sub(since)))
            .unwrap_or(0)
    }

    /// Fire if the cooldown allows: a single shot normally, a spread while
    /// energized. Plasma enlarges and slows every bullet.
    pub fn try_fire(&mut self, now: Millis, tuning: &PlayerTuning) -> Vec<Bullet> {
        if let Some(last) = self.last_shot
            && now.saturating_sub(last) <= tuning.shoot_cooldown_ms
        {
            return Vec::new();
        }
        self.last_shot = Some(now);

        let plasma = self.is_plasma();
        let size = if plasma { PLASMA_BULLET_SIZE } else { BULLET_SIZE };
        let speed = if plasma {
            tuning.bullet_speed * tuning.plasma_speed_scale
        } else {
            tuning.bullet_speed
        };
        let muzzle = Vec2::new(self.pos.x + self.size / 2.0 - size / 2.0, self.pos.y - size);

        if self.is_energized() {
            tuning
                .spread_angles
                .iter()
                .map(|&angle| {
                    let velocity = Vec2::new(
                        angle.sin() * speed * tuning.spread_horizontal_scale,
                        -angle.cos() * speed,
                    );
                    Bullet::new(muzzle, velocity, plasma)
                })
                .collect()
        } else {
            vec![Bullet::new(muzzle, Vec2::new(0.0, -speed), plasma)]
        }
    }
}
