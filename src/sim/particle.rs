//! Cosmetic particles and the energize-expiry shockwave ring

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use crate::Millis;

const BLOCK_PARTICLES: usize = 8;
const ARMOR_PARTICLES: usize = 5;
const POWERUP_PARTICLES: usize = 15;
const ARMOR_LIFESPAN_MS: f32 = 500.0;
const POWERUP_LIFESPAN_MS: f32 = 1000.0;

/// What a particle is coloured after
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleTint {
    /// Block palette and shade within it
    Palette { set: u8, shade: u8 },
    Gold,
    Cyan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    pub tint: ParticleTint,
    pub born: Millis,
    pub lifespan_ms: f32,
}

impl Particle {
    /// 0.0 when fresh, 1.0 when expired
    pub fn age_ratio(&self, now: Millis) -> f32 {
        (now.saturating_sub(self.born) as f32 / self.lifespan_ms).min(1.0)
    }

    pub fn is_expired(&self, now: Millis) -> bool {
        now.saturating_sub(self.born) as f32 >= self.lifespan_ms
    }
}

/// Bounded particle pool
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    pub particles: Vec<Particle>,
    cap: usize,
}

impl ParticleSystem {
    pub fn new(cap: usize) -> Self {
        Self {
            particles: Vec::with_capacity(cap.min(1024)),
            cap,
        }
    }

    pub fn set_cap(&mut self, cap: usize) {
        self.cap = cap;
        self.particles.truncate(cap);
    }

    fn push(&mut self, particle: Particle) {
        if self.particles.len() < self.cap {
            self.particles.push(particle);
        }
    }

    /// Debris from a cleared block cell
    pub fn block_burst<R: Rng + ?Sized>(&mut self, center: Vec2, set: u8, now: Millis, rng: &mut R) {
        for _ in 0..BLOCK_PARTICLES {
            let angle = rng.random::<f32>() * TAU;
            let speed = rng.random_range(1.0..4.0);
            self.push(Particle {
                pos: center,
                velocity: Vec2::from_angle(angle) * speed,
                size: rng.random_range(1.0..3.0),
                tint: ParticleTint::Palette {
                    set,
                    shade: rng.random_range(0..4),
                },
                born: now,
                lifespan_ms: rng.random_range(200.0..500.0),
            });
        }
    }

    /// Gold sparks from a hit that armor soaked
    pub fn armor_burst<R: Rng + ?Sized>(&mut self, pos: Vec2, now: Millis, rng: &mut R) {
        for _ in 0..ARMOR_PARTICLES {
            self.push(Particle {
                pos,
                velocity: Vec2::new(rng.random_range(-1.5..1.5), rng.random_range(-1.5..1.5)),
                size: 1.5,
                tint: ParticleTint::Gold,
                born: now,
                lifespan_ms: ARMOR_LIFESPAN_MS,
            });
        }
    }

    pub fn powerup_burst<R: Rng + ?Sized>(&mut self, pos: Vec2, now: Millis, rng: &mut R) {
        for _ in 0..POWERUP_PARTICLES {
            self.push(Particle {
                pos,
                velocity: Vec2::new(rng.random_range(-2.5..2.5), rng.random_range(-2.5..2.5)),
                size: 3.0,
                tint: ParticleTint::Cyan,
                born: now,
                lifespan_ms: POWERUP_LIFESPAN_MS,
            });
        }
    }

    /// Drift everything one tick and drop the expired
    pub fn update(&mut self, now: Millis) {
        self.particles.retain_mut(|p| {
            p.pos += p.velocity;
            !p.is_expired(now)
        });
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

/// Expanding ring left behind when energize ends
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shockwave {
    pub center: Vec2,
    pub max_radius: f32,
    pub started: Millis,
    pub duration_ms: Millis,
}

impl Shockwave {
    pub fn progress(&self, now: Millis) -> f32 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        (now.saturating_sub(self.started) as f32 / self.duration_ms as f32).min(1.0)
    }

    pub fn radius(&self, now: Millis) -> f32 {
        self.max_radius * self.progress(now)
    }

    pub fn alpha(&self, now: Millis) -> f32 {
        1.0 - self.progress(now)
    }

    pub fn is_done(&self, now: Millis) -> bool {
        now.saturating_sub(self.started) >= self.duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_bursts_respect_cap() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut ps = ParticleSystem::new(10);
        ps.block_burst(Vec2::ZERO, 0, 0, &mut rng);
        assert_eq!(ps.len(), 8);
        ps.powerup_burst(Vec2::ZERO, 0, &mut rng);
        assert_eq!(ps.len(), 10);
        ps.set_cap(4);
        assert_eq!(ps.len(), 4);
    }

    #[test]
    fn test_particles_expire() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut ps = ParticleSystem::new(100);
        ps.block_burst(Vec2::new(50.0, 50.0), 2, 1000, &mut rng);
        ps.armor_burst(Vec2::new(50.0, 50.0), 1000, &mut rng);
        ps.update(1100);
        assert_eq!(ps.len(), 13);
        ps.update(1499);
        let gold = ps.particles.iter().filter(|p| p.tint == ParticleTint::Gold).count();
        assert_eq!(gold, 5);
        ps.update(1500);
        assert!(ps.is_empty());
    }

    #[test]
    fn test_shockwave_expands_then_ends() {
        let wave = Shockwave {
            center: Vec2::ZERO,
            max_radius: 150.0,
            started: 1000,
            duration_ms: 500,
        };
        assert_eq!(wave.radius(1000), 0.0);
        assert_eq!(wave.radius(1250), 75.0);
        assert!(!wave.is_done(1499));
        assert!(wave.is_done(1500));
        assert_eq!(wave.alpha(2000), 0.0);
    }
}
