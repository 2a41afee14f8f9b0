//! Data-driven game balance
//!
//! Every numeric tuning knob lives here so balance passes never touch the
//! simulation code. `Tuning::default()` is the baseline ruleset; a JSON
//! document may override any subset of fields.

use serde::{Deserialize, Serialize};

use crate::Millis;

/// Player, bullet and power-state tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Movement per tick (pixels)
    pub speed: f32,
    /// Kills needed to become energized
    pub energy_threshold: u32,
    pub energy_duration_ms: Millis,
    pub plasma_duration_ms: Millis,
    pub shoot_cooldown_ms: Millis,
    /// Bullet travel per tick (pixels)
    pub bullet_speed: f32,
    /// Plasma bullets travel slower
    pub plasma_speed_scale: f32,
    /// Spread-shot angles while energized (radians from vertical)
    pub spread_angles: Vec<f32>,
    /// Horizontal damping of spread bullets
    pub spread_horizontal_scale: f32,
    /// Damage dealt by a plasma bullet (plain bullets deal 1)
    pub plasma_damage: u8,
    pub shockwave_radius: f32,
    pub shockwave_duration_ms: Millis,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            speed: 5.0,
            energy_threshold: 20,
            energy_duration_ms: 5000,
            plasma_duration_ms: 5000,
            shoot_cooldown_ms: 200,
            bullet_speed: 10.0,
            plasma_speed_scale: 0.7,
            spread_angles: vec![-0.3, 0.0, 0.3],
            spread_horizontal_scale: 0.8,
            plasma_damage: 3,
            shockwave_radius: 150.0,
            shockwave_duration_ms: 500,
        }
    }
}

/// Centipede chain tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainTuning {
    pub base_segment_count: usize,
    /// Extra segments added per level after the first
    pub segments_per_level: usize,
    /// Step size multiplier on level 1 (later levels use a full segment)
    pub first_level_step_scale: f32,
    pub base_delay_ms: Millis,
    pub delay_step_ms: Millis,
    pub min_delay_ms: Millis,
    /// Armor granted to a head the moment it reaches the floor
    pub floor_head_armor: i32,
    /// Armor granted chain-wide once any member touches the floor
    pub floor_chain_head_armor: i32,
    pub floor_chain_body_armor: i32,
    /// Per-tick chance a floored head tries to climb
    pub climb_chance: f64,
    pub max_per_level: u32,
    pub target_concurrency: usize,
}

impl Default for ChainTuning {
    fn default() -> Self {
        Self {
            base_segment_count: crate::consts::BASE_SEGMENT_COUNT,
            segments_per_level: 1,
            first_level_step_scale: 0.7,
            base_delay_ms: 90,
            delay_step_ms: 20,
            min_delay_ms: 30,
            floor_head_armor: 6,
            floor_chain_head_armor: 5,
            floor_chain_body_armor: 7,
            climb_chance: 0.05,
            max_per_level: 4,
            target_concurrency: 2,
        }
    }
}

/// Spider tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiderTuning {
    pub base_speed: f32,
    pub speed_per_level: f32,
    /// Spawn-time multiplier on the level speed
    pub speed_multiplier: f32,
    /// Speed while heading upward
    pub chase_speed: f32,
    /// Speed while hunting along the bottom edge
    pub aggressive_speed: f32,
    pub chew_duration_ms: Millis,
    pub direction_cooldown_ms: Millis,
    pub pursue_chance: f64,
    pub wander_chance: f64,
    /// Chance per tick a floored spider re-aims ignoring the cooldown
    pub bottom_retarget_chance: f64,
    pub bite_chance: f64,
    pub aggressive_bite_chance: f64,
    /// Distance above the bottom edge that counts as "at the bottom"
    pub bottom_zone: f32,
    pub spawn_interval_base_ms: Millis,
    pub spawn_interval_step_ms: Millis,
    pub spawn_interval_min_ms: Millis,
    pub max_alive_cap: usize,
}

impl Default for SpiderTuning {
    fn default() -> Self {
        Self {
            base_speed: 0.5,
            speed_per_level: 0.1,
            speed_multiplier: 1.5,
            chase_speed: 0.5,
            aggressive_speed: 1.5,
            chew_duration_ms: 350,
            direction_cooldown_ms: 1000,
            pursue_chance: 0.5,
            wander_chance: 0.02,
            bottom_retarget_chance: 0.3,
            bite_chance: 0.3,
            aggressive_bite_chance: 0.6,
            bottom_zone: 10.0,
            spawn_interval_base_ms: 5000,
            spawn_interval_step_ms: 300,
            spawn_interval_min_ms: 2000,
            max_alive_cap: 5,
        }
    }
}

/// Points and kill-counter credit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringTuning {
    pub block_destroyed: u64,
    pub body_kill: u64,
    pub body_armor_chip: u64,
    pub head_kill: u64,
    pub spider_kill: u64,
    pub contact_segment_kill: u64,
    pub shockwave_head_kill: u64,
    pub shockwave_body_kill: u64,
    /// Per cell the ship grinds away by flying into a block
    pub section_rammed: u64,
    pub head_kill_credit: u32,
    pub body_kill_credit: u32,
    pub spider_kill_credit: u32,
}

impl Default for ScoringTuning {
    fn default() -> Self {
        Self {
            block_destroyed: 10,
            body_kill: 100,
            body_armor_chip: 25,
            head_kill: 150,
            spider_kill: 300,
            contact_segment_kill: 200,
            shockwave_head_kill: 100,
            shockwave_body_kill: 50,
            section_rammed: 1,
            head_kill_credit: 2,
            body_kill_credit: 1,
            spider_kill_credit: 2,
        }
    }
}

/// Level layout and phase timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelTuning {
    pub base_blocks: u32,
    pub blocks_per_level: u32,
    /// Share of the blocks placed in the upper half
    pub upper_share: f32,
    pub intro_countdown_secs: u32,
    pub level_complete_ms: Millis,
}

impl Default for LevelTuning {
    fn default() -> Self {
        Self {
            base_blocks: 80,
            blocks_per_level: 10,
            upper_share: 0.6,
            intro_countdown_secs: 5,
            level_complete_ms: 1500,
        }
    }
}

/// Power-up spawning and collection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUpTuning {
    /// A power-up appears at every multiple of this many spider kills
    pub spider_kill_milestone: u32,
    pub spawn_margin: f32,
    /// Generous multiplier on combined radii for pickup tests
    pub collect_radius_scale: f32,
    pub pulse_step: f32,
}

impl Default for PowerUpTuning {
    fn default() -> Self {
        Self {
            spider_kill_milestone: 5,
            spawn_margin: 10.0,
            collect_radius_scale: 1.6,
            pulse_step: 0.1,
        }
    }
}

/// Complete balance sheet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub chain: ChainTuning,
    pub spider: SpiderTuning,
    pub scoring: ScoringTuning,
    pub level: LevelTuning,
    pub powerup: PowerUpTuning,
}

impl Tuning {
    /// Parse a (possibly partial) JSON override on top of the defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Chain update cadence for a level (shorter = faster)
    pub fn chain_delay_ms(&self, level: u32) -> Millis {
        let step = self.chain.delay_step_ms * u64::from(level.saturating_sub(1));
        self.chain
            .base_delay_ms
            .saturating_sub(step)
            .max(self.chain.min_delay_ms)
    }

    /// Segments in a freshly spawned chain
    pub fn chain_length(&self, level: u32) -> usize {
        self.chain.base_segment_count
            + self.chain.segments_per_level * level.saturating_sub(1) as usize
    }

    /// Chain step size for a level
    pub fn chain_step(&self, level: u32, segment_size: f32) -> f32 {
        if level <= 1 {
            segment_size * self.chain.first_level_step_scale
        } else {
            segment_size
        }
    }

    /// Spider cruise speed for a level
    pub fn spider_speed(&self, level: u32) -> f32 {
        let s = &self.spider;
        s.speed_multiplier * (s.base_speed + level.saturating_sub(1) as f32 * s.speed_per_level)
    }

    /// Time between spider spawn attempts
    pub fn spider_spawn_interval_ms(&self, level: u32) -> Millis {
        let s = &self.spider;
        let step = s.spawn_interval_step_ms * u64::from(level.saturating_sub(1));
        s.spawn_interval_base_ms
            .saturating_sub(step)
            .max(s.spawn_interval_min_ms)
    }

    /// Maximum concurrent spiders
    pub fn max_spiders(&self, level: u32) -> usize {
        (1 + level as usize / 2).min(self.spider.max_alive_cap)
    }

    /// Number of blocks laid out at level start
    pub fn block_count(&self, level: u32) -> u32 {
        self.level.base_blocks + self.level.blocks_per_level * level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_scaling() {
        let t = Tuning::default();
        assert_eq!(t.chain_delay_ms(1), 90);
        assert_eq!(t.chain_delay_ms(2), 70);
        assert_eq!(t.chain_delay_ms(10), 30);
        assert_eq!(t.chain_length(1), 20);
        assert_eq!(t.chain_length(4), 23);
        assert_eq!(t.spider_spawn_interval_ms(1), 5000);
        assert_eq!(t.spider_spawn_interval_ms(20), 2000);
        assert_eq!(t.max_spiders(1), 1);
        assert_eq!(t.max_spiders(4), 3);
        assert_eq!(t.max_spiders(30), 5);
        assert_eq!(t.block_count(1), 90);
    }

    #[test]
    fn test_partial_json_override() {
        let t = Tuning::from_json(r#"{ "chain": { "max_per_level": 7 }, "player": { "speed": 3.5 } }"#)
            .unwrap();
        assert_eq!(t.chain.max_per_level, 7);
        assert_eq!(t.player.speed, 3.5);
        // Untouched fields keep their defaults
        assert_eq!(t.chain.floor_chain_body_armor, 7);
        assert_eq!(t.spider.chew_duration_ms, 350);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(Tuning::from_json("{ not json").is_err());
    }
}
