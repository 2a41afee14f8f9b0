//! Session state and core simulation types
//!
//! `SessionState` is the single owner of every entity. The controller in
//! `tick` is its only writer; the renderer and HUD only read it.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::block::BlockField;
use super::chain::{Chain, LevelContext};
use super::particle::{ParticleSystem, Shockwave};
use super::player::{Bullet, Player};
use super::powerup::{PowerUp, PowerUpSpawner};
use super::spider::Spider;
use crate::consts::{DEFAULT_HEAD_GLYPH, SEGMENT_SIZE};
use crate::tuning::Tuning;
use crate::{Field, Millis};

/// Default particle budget until settings say otherwise
pub const DEFAULT_MAX_PARTICLES: usize = 512;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for an entitled start
    Idle,
    /// Level countdown before play
    Intro { started: Millis },
    /// Active gameplay
    Playing,
    /// Short banner between levels
    LevelComplete { started: Millis },
    /// Run ended, waiting for restart
    GameOver,
}

/// Kinds of enemy, for events and scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    Head,
    Body,
    Spider,
}

/// Things that happened this tick, for the sound and HUD collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    RunStarted,
    LevelStarted { level: u32 },
    ShotFired { plasma: bool },
    BlockDestroyed,
    ArmorHit,
    EnemyKilled { kind: EnemyKind, points: u64 },
    ChainSpawned,
    ChainSplit,
    SpiderSpawned,
    Energized,
    Shockwave { kills: u32 },
    PowerUpSpawned,
    PowerUpCollected,
    LevelComplete { level: u32 },
    GameOver { score: u64 },
}

/// Complete session state (deterministic for a given seed and input script)
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub field: Field,
    pub phase: GamePhase,
    pub level: u32,
    pub score: u64,
    /// Granted by the entitlement gate; consumed when a run starts
    pub entitled: bool,
    pub auto_fire: bool,

    pub player: Player,
    pub bullets: Vec<Bullet>,
    pub blocks: BlockField,
    pub chains: Vec<Chain>,
    pub spiders: Vec<Spider>,
    pub powerups: Vec<PowerUp>,
    /// Visual particles (not gameplay-affecting)
    pub particles: ParticleSystem,
    pub shockwave: Option<Shockwave>,

    /// Per-level values threaded into every chain spawned this level
    pub level_ctx: LevelContext,
    pub centipedes_spawned: u32,
    pub round_trips: u32,
    /// Spider kills this run, from every source
    pub spider_kills: u32,
    pub powerup_spawner: PowerUpSpawner,
    pub last_spider_spawn: Millis,
    /// Time passed to the most recent tick
    pub now: Millis,

    events: Vec<GameEvent>,
}

impl SessionState {
    /// Create a new session with the baseline ruleset
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        let field = Field::default();
        let player = Player::new(&field, &tuning.player);
        let level_ctx = LevelContext {
            level: 1,
            glyph: DEFAULT_HEAD_GLYPH,
            step: tuning.chain_step(1, SEGMENT_SIZE),
            delay_ms: tuning.chain_delay_ms(1),
        };
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            field,
            phase: GamePhase::Idle,
            level: 1,
            score: 0,
            entitled: false,
            auto_fire: false,
            player,
            bullets: Vec::new(),
            blocks: BlockField::new(),
            chains: Vec::new(),
            spiders: Vec::new(),
            powerups: Vec::new(),
            particles: ParticleSystem::new(DEFAULT_MAX_PARTICLES),
            shockwave: None,
            level_ctx,
            centipedes_spawned: 0,
            round_trips: 0,
            spider_kills: 0,
            powerup_spawner: PowerUpSpawner::new(),
            last_spider_spawn: 0,
            now: 0,
            events: Vec::new(),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Pending events, oldest first
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Hand the queued events to the caller
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn award(&mut self, points: u64) {
        self.score += points;
    }

    /// Whole seconds left on the intro countdown, if in the intro
    pub fn intro_countdown(&self, now: Millis) -> Option<u32> {
        match self.phase {
            GamePhase::Intro { started } => {
                let total = u64::from(self.tuning.level.intro_countdown_secs) * 1000;
                let left = total.saturating_sub(now.saturating_sub(started));
                Some(left.div_ceil(1000) as u32)
            }
            _ => None,
        }
    }

    /// Live segments across every chain
    pub fn segment_count(&self) -> usize {
        self.chains.iter().map(Chain::alive_count).sum()
    }

    pub fn spiders_alive(&self) -> usize {
        self.spiders.iter().filter(|s| s.alive).count()
    }

    /// Drop every entity, keeping score and run counters
    pub fn clear_entities(&mut self) {
        self.bullets.clear();
        self.blocks.clear();
        self.chains.clear();
        self.spiders.clear();
        self.powerups.clear();
        self.particles.clear();
        self.shockwave = None;
    }
}
