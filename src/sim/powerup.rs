//! Plasma power-ups and their milestone spawner

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use crate::consts::{BORDER_WIDTH, BOTTOM_BORDER_WIDTH, POWERUP_SIZE};
use crate::tuning::PowerUpTuning;
use crate::{Field, Millis};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUpKind {
    /// Larger, slower, harder-hitting bullets for a while
    Plasma,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PowerUp {
    pub pos: Vec2,
    pub size: f32,
    pub kind: PowerUpKind,
    pub active: bool,
    pub created_at: Millis,
    /// Animation phase in radians, wraps at TAU
    pub pulse_phase: f32,
}

impl PowerUp {
    pub fn new(pos: Vec2, kind: PowerUpKind, now: Millis) -> Self {
        Self {
            pos,
            size: POWERUP_SIZE,
            kind,
            active: true,
            created_at: now,
            pulse_phase: 0.0,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::splat(self.size * 0.5)
    }

    /// Pickup test against a circle, with the combined radii scaled up
    pub fn touches(&self, center: Vec2, radius: f32, tuning: &PowerUpTuning) -> bool {
        let reach = (radius + self.size * 0.5) * tuning.collect_radius_scale;
        self.center().distance(center) < reach
    }

    pub fn advance_pulse(&mut self, tuning: &PowerUpTuning) {
        self.pulse_phase = (self.pulse_phase + tuning.pulse_step) % TAU;
    }

    /// Glow scale for the renderer
    pub fn pulse_scale(&self) -> f32 {
        1.0 + self.pulse_phase.sin() * 0.2
    }
}

/// Spawns one power-up per spider-kill milestone
#[derive(Debug, Clone, Default)]
pub struct PowerUpSpawner {
    last_milestone: u32,
}

impl PowerUpSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new power-up the first time `spider_kills` sits on a
    /// milestone
    pub fn check<R: Rng + ?Sized>(
        &mut self,
        spider_kills: u32,
        field: &Field,
        now: Millis,
        tuning: &PowerUpTuning,
        rng: &mut R,
    ) -> Option<PowerUp> {
        let every = tuning.spider_kill_milestone.max(1);
        if spider_kills == 0 || spider_kills % every != 0 || spider_kills == self.last_milestone {
            return None;
        }
        self.last_milestone = spider_kills;

        let margin = tuning.spawn_margin;
        let span_x = (field.width - BORDER_WIDTH * 2.0 - POWERUP_SIZE - margin * 2.0).max(0.0);
        let span_y =
            (field.height / 2.0 - BOTTOM_BORDER_WIDTH - POWERUP_SIZE - margin * 2.0).max(0.0);
        let pos = Vec2::new(
            BORDER_WIDTH + margin + rng.random::<f32>() * span_x,
            field.midline() + margin + rng.random::<f32>() * span_y,
        );
        log::info!("power-up spawned at {pos:?} after {spider_kills} spider kills");
        Some(PowerUp::new(pos, PowerUpKind::Plasma, now))
    }

    pub fn reset(&mut self) {
        self.last_milestone = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_one_spawn_per_milestone() {
        let mut rng = Pcg32::seed_from_u64(5);
        let tuning = PowerUpTuning::default();
        let field = Field::default();
        let mut spawner = PowerUpSpawner::new();

        assert!(spawner.check(0, &field, 0, &tuning, &mut rng).is_none());
        assert!(spawner.check(4, &field, 0, &tuning, &mut rng).is_none());
        assert!(spawner.check(5, &field, 0, &tuning, &mut rng).is_some());
        assert!(spawner.check(5, &field, 10, &tuning, &mut rng).is_none());
        assert!(spawner.check(7, &field, 10, &tuning, &mut rng).is_none());
        assert!(spawner.check(10, &field, 10, &tuning, &mut rng).is_some());
    }

    #[test]
    fn test_spawns_inside_lower_half() {
        let mut rng = Pcg32::seed_from_u64(8);
        let tuning = PowerUpTuning::default();
        let field = Field::default();
        for milestone in 1..50 {
            let mut spawner = PowerUpSpawner::new();
            let p = spawner
                .check(milestone * 5, &field, 0, &tuning, &mut rng)
                .unwrap();
            assert!(p.pos.x >= BORDER_WIDTH + tuning.spawn_margin);
            assert!(p.pos.x + p.size <= field.width - BORDER_WIDTH);
            assert!(p.pos.y >= field.midline());
            assert!(p.pos.y + p.size <= field.height - BOTTOM_BORDER_WIDTH);
        }
    }

    #[test]
    fn test_touch_radius_is_generous() {
        let tuning = PowerUpTuning::default();
        let p = PowerUp::new(Vec2::new(100.0, 100.0), PowerUpKind::Plasma, 0);
        // Combined radius 40 scaled to 64
        assert!(p.touches(Vec2::new(120.0 + 63.0, 120.0), 20.0, &tuning));
        assert!(!p.touches(Vec2::new(120.0 + 65.0, 120.0), 20.0, &tuning));
    }

    #[test]
    fn test_pulse_wraps() {
        let tuning = PowerUpTuning::default();
        let mut p = PowerUp::new(Vec2::ZERO, PowerUpKind::Plasma, 0);
        for _ in 0..200 {
            p.advance_pulse(&tuning);
            assert!(p.pulse_phase < TAU);
        }
        assert!((0.8..=1.2).contains(&p.pulse_scale()));
    }
}
