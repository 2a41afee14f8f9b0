//! Moloch Blaster - a segmented-centipede arcade shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, collisions, level state machine)
//! - `renderer`: WebGPU rendering pipeline
//! - `platform`: Clock, input and entitlement boundaries
//! - `highscores`: Leaderboard and reward submission boundary
//! - `tuning`: Data-driven game balance

pub mod highscores;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use highscores::HighScores;
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

/// Milliseconds on the injected monotonic clock
pub type Millis = u64;

/// Game configuration constants
///
/// Screen-space coordinates: origin at the top-left corner, y grows downward.
pub mod consts {
    /// Playfield dimensions
    pub const FIELD_WIDTH: f32 = 800.0;
    pub const FIELD_HEIGHT: f32 = 600.0;
    pub const BORDER_WIDTH: f32 = 1.0;
    /// Thicker bottom border (holds the status text)
    pub const BOTTOM_BORDER_WIDTH: f32 = 40.0;

    /// Entity sizes
    pub const PLAYER_SIZE: f32 = 40.0;
    pub const BULLET_SIZE: f32 = 5.0;
    pub const PLASMA_BULLET_SIZE: f32 = 25.0;
    pub const SEGMENT_SIZE: f32 = 20.0;
    pub const BLOCK_SIZE: f32 = 20.0;
    pub const SECTION_SIZE: f32 = BLOCK_SIZE / 4.0;
    pub const SPIDER_SIZE: f32 = 20.0;
    pub const POWERUP_SIZE: f32 = 40.0;

    /// Obstacle index cell size
    pub const GRID_SIZE: f32 = SEGMENT_SIZE;

    /// Generous bullet hit radius (keeps fast bullets from tunneling)
    pub const BULLET_HIT_RADIUS: f32 = 6.0;
    /// Plasma bullets get a wider hit radius
    pub const PLASMA_HIT_RADIUS_SCALE: f32 = 1.5;

    /// Starting segment count of a level-1 chain
    pub const BASE_SEGMENT_COUNT: usize = 20;

    /// Glyph drawn on chain heads
    pub const DEFAULT_HEAD_GLYPH: char = '👹';
}

/// Playfield bounds passed to movement code
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field {
    pub width: f32,
    pub height: f32,
}

impl Default for Field {
    fn default() -> Self {
        Self {
            width: consts::FIELD_WIDTH,
            height: consts::FIELD_HEIGHT,
        }
    }
}

impl Field {
    /// Lowest y a chain segment may occupy (the "floor" row)
    #[inline]
    pub fn chain_floor(&self, segment_size: f32) -> f32 {
        self.height - consts::BOTTOM_BORDER_WIDTH - segment_size * 2.0
    }

    /// y at or above which a floored chain counts as back at the top
    #[inline]
    pub fn chain_ceiling(&self, segment_size: f32) -> f32 {
        consts::BORDER_WIDTH + segment_size * 2.0
    }

    /// Vertical midline; the player may not move above it
    #[inline]
    pub fn midline(&self) -> f32 {
        self.height / 2.0
    }
}
