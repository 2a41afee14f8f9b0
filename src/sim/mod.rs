//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time is injected by the caller, never read from a clock
//! - Seeded RNG only, owned by the session
//! - Stable iteration order (entity vectors, never hash maps)
//! - No rendering or platform dependencies

pub mod block;
pub mod chain;
pub mod collision;
pub mod geometry;
pub mod level;
pub mod obstacles;
pub mod particle;
pub mod player;
pub mod powerup;
pub mod spider;
pub mod state;
pub mod tick;

pub use block::{Block, BlockField};
pub use chain::{Chain, ChainEvent, DamageOutcome, LevelContext, Segment, SegmentTint};
pub use collision::{BulletHit, resolve_bullets, trigger_shockwave};
pub use geometry::Rect;
pub use level::{maybe_spawn_spider, spawn_chain, start_level};
pub use obstacles::ObstacleIndex;
pub use particle::{Particle, ParticleSystem, ParticleTint, Shockwave};
pub use player::{Bullet, Player};
pub use powerup::{PowerUp, PowerUpKind, PowerUpSpawner};
pub use spider::Spider;
pub use state::{EnemyKind, GameEvent, GamePhase, SessionState};
pub use tick::{TickInput, start_run, tick};
