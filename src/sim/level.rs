//! Level setup and spawning
//!
//! Each level repopulates the block field, picks the head glyph, scales the
//! chain cadence and lays down the first chain. Chains and spiders are
//! spawned through here so the per-level caps live in one place.

use glam::Vec2;
use rand::Rng;

use super::chain::{Chain, LevelContext};
use super::player::Player;
use super::spider::Spider;
use super::state::{GameEvent, SessionState};
use crate::consts::{BLOCK_SIZE, BORDER_WIDTH, SEGMENT_SIZE, SPIDER_SIZE};
use crate::tuning::Tuning;
use crate::Millis;

/// Glyphs a level may draw on its chain heads
pub const HEAD_GLYPHS: &[char] = &['👹', '👺', '👾', '💀'];

/// Values every chain of `level` is built from
pub fn level_context<R: Rng + ?Sized>(level: u32, tuning: &Tuning, rng: &mut R) -> LevelContext {
    LevelContext {
        level,
        glyph: HEAD_GLYPHS[rng.random_range(0..HEAD_GLYPHS.len())],
        step: tuning.chain_step(level, SEGMENT_SIZE),
        delay_ms: tuning.chain_delay_ms(level),
    }
}

/// Scatter the level's blocks: most in the upper half, the rest in the
/// player's half
pub fn layout_blocks(state: &mut SessionState) {
    let count = state.tuning.block_count(state.level) as usize;
    let upper = ((count as f32 * state.tuning.level.upper_share).round() as usize).min(count);
    let lower = count - upper;
    let field = state.field;
    let span_x = field.width - BLOCK_SIZE * 2.0 - BORDER_WIDTH * 2.0;

    for _ in 0..upper {
        let x = (state.rng.random::<f32>() * span_x + BORDER_WIDTH).floor();
        let y = (state.rng.random::<f32>() * (field.midline() - BLOCK_SIZE * 2.0) + BORDER_WIDTH).floor();
        state.blocks.spawn_snapped(&field, Vec2::new(x, y), &mut state.rng);
    }
    for _ in 0..lower {
        let x = (state.rng.random::<f32>() * span_x + BORDER_WIDTH).floor();
        let y = (state.rng.random::<f32>() * field.midline() + field.midline()).floor();
        state.blocks.spawn_snapped(&field, Vec2::new(x, y), &mut state.rng);
    }
}

/// Reset the field for `state.level` and put the first chain down
pub fn start_level(state: &mut SessionState, now: Millis) {
    state.clear_entities();
    state.player = Player::new(&state.field, &state.tuning.player);
    state.level_ctx = level_context(state.level, &state.tuning, &mut state.rng);
    state.centipedes_spawned = 0;
    state.round_trips = 0;
    state.last_spider_spawn = now;

    layout_blocks(state);
    spawn_chain(state, now);

    log::info!(
        "level {} started: {} blocks, chain delay {}ms, glyph {}",
        state.level,
        state.blocks.len(),
        state.level_ctx.delay_ms,
        state.level_ctx.glyph
    );
    state.push_event(GameEvent::LevelStarted { level: state.level });
}

/// Spawn a chain at a random top corner, facing inward. Returns false once
/// the per-level cap is used up.
pub fn spawn_chain(state: &mut SessionState, now: Millis) -> bool {
    if state.centipedes_spawned >= state.tuning.chain.max_per_level {
        return false;
    }
    let count = state.tuning.chain_length(state.level);
    let from_left = state.rng.random_bool(0.5);
    let (x, direction) = if from_left {
        (BORDER_WIDTH, 1)
    } else {
        (state.field.width - BORDER_WIDTH - SEGMENT_SIZE, -1)
    };
    let start = Vec2::new(x, SEGMENT_SIZE + BORDER_WIDTH);

    state
        .chains
        .push(Chain::spawn(&state.level_ctx, count, start, direction, now));
    state.centipedes_spawned += 1;
    log::info!(
        "spawned chain {}/{} ({} segments) on level {}",
        state.centipedes_spawned,
        state.tuning.chain.max_per_level,
        count,
        state.level
    );
    state.push_event(GameEvent::ChainSpawned);
    true
}

/// Spawn a spider on the interval, if under the level's cap
pub fn maybe_spawn_spider(state: &mut SessionState, now: Millis) -> bool {
    let interval = state.tuning.spider_spawn_interval_ms(state.level);
    if now.saturating_sub(state.last_spider_spawn) <= interval {
        return false;
    }
    state.last_spider_spawn = now;

    if state.spiders_alive() >= state.tuning.max_spiders(state.level) {
        return false;
    }
    let x = state.rng.random::<f32>() * (state.field.width - SPIDER_SIZE * 2.0) + SPIDER_SIZE;
    let speed = state.tuning.spider_speed(state.level);
    let spider = Spider::new(Vec2::new(x, BORDER_WIDTH), speed, now, &mut state.rng);
    state.spiders.push(spider);
    log::debug!("spider spawned at x={x:.0}");
    state.push_event(GameEvent::SpiderSpawned);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::BASE_SEGMENT_COUNT;

    #[test]
    fn test_start_level_one() {
        let mut state = SessionState::new(3);
        start_level(&mut state, 0);
        assert_eq!(state.chains.len(), 1);
        assert_eq!(state.chains[0].len(), BASE_SEGMENT_COUNT);
        assert!(state.spiders.is_empty());
        assert_eq!(state.centipedes_spawned, 1);
        // 90 blocks requested; some may share a snapped cell
        assert_eq!(state.blocks.len(), 90);
        assert!(state.blocks.index.len() <= 90);
    }

    #[test]
    fn test_blocks_stay_in_bounds() {
        let mut state = SessionState::new(17);
        state.level = 6;
        start_level(&mut state, 0);
        let field = state.field;
        for b in &state.blocks.blocks {
            assert!(b.pos.x >= BORDER_WIDTH);
            assert!(b.pos.x + b.size <= field.width - BORDER_WIDTH);
            assert!(b.pos.y >= BORDER_WIDTH);
            assert!(b.pos.y + b.size <= field.height - crate::consts::BOTTOM_BORDER_WIDTH);
        }
    }

    #[test]
    fn test_chain_cap() {
        let mut state = SessionState::new(3);
        start_level(&mut state, 0);
        for _ in 0..10 {
            spawn_chain(&mut state, 0);
        }
        assert_eq!(state.centipedes_spawned, state.tuning.chain.max_per_level);
        assert_eq!(state.chains.len(), 4);
    }

    #[test]
    fn test_chain_spawns_face_inward() {
        let mut state = SessionState::new(11);
        for _ in 0..8 {
            state.centipedes_spawned = 0;
            spawn_chain(&mut state, 0);
        }
        for chain in &state.chains {
            let head = chain.head().unwrap();
            if head.pos.x == BORDER_WIDTH {
                assert_eq!(head.direction, 1);
            } else {
                assert_eq!(head.direction, -1);
            }
        }
    }

    #[test]
    fn test_spider_cadence_and_cap() {
        let mut state = SessionState::new(5);
        start_level(&mut state, 0);
        assert!(!maybe_spawn_spider(&mut state, 4000));
        assert!(maybe_spawn_spider(&mut state, 5001));
        assert_eq!(state.spiders.len(), 1);
        // Level 1 allows a single spider
        assert!(!maybe_spawn_spider(&mut state, 10_002));
        assert_eq!(state.spiders.len(), 1);
    }
}
