//! Session controller tick
//!
//! One call per animation frame. Time comes in from the caller so every
//! timer (energize, plasma, cooldowns, spawn cadence) runs off the injected
//! clock rather than frame counts.

use glam::Vec2;

use super::chain::ChainEvent;
use super::collision::{
    player_vs_blocks, player_vs_powerups, player_vs_segments, player_vs_spiders, resolve_bullets,
    trigger_shockwave,
};
use super::level::{maybe_spawn_spider, spawn_chain, start_level};
use super::state::{GameEvent, GamePhase, SessionState};
use crate::Millis;

/// Distance at which the autopilot starts dodging a spider
const AUTOPILOT_DODGE_RANGE: f32 = 120.0;

/// Input intents for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    /// Fire held
    pub fire: bool,
    /// Flip auto-fire (edge, not level)
    pub auto_fire_toggle: bool,
    /// Start a run from idle
    pub start: bool,
    /// Leave the game-over screen
    pub restart: bool,
    /// Demo mode - the ship plays itself
    pub autopilot: bool,
}

impl TickInput {
    /// Movement axis from the held directions
    pub fn axis(&self) -> Vec2 {
        let x = f32::from(i8::from(self.right) - i8::from(self.left));
        let y = f32::from(i8::from(self.down) - i8::from(self.up));
        Vec2::new(x, y)
    }
}

/// Advance the session to `now`
pub fn tick(state: &mut SessionState, input: &TickInput, now: Millis) {
    state.now = now;

    let mut input = input.clone();
    if input.autopilot {
        autopilot(state, &mut input);
    }
    let input = &input;

    match state.phase {
        GamePhase::Idle => {
            if input.start {
                if state.entitled {
                    start_run(state, now);
                } else {
                    log::warn!("start requested without entitlement");
                }
            }
        }
        GamePhase::Intro { started } => {
            let intro_ms = u64::from(state.tuning.level.intro_countdown_secs) * 1000;
            if now.saturating_sub(started) >= intro_ms {
                start_level(state, now);
                state.phase = GamePhase::Playing;
            }
        }
        GamePhase::Playing => play(state, input, now),
        GamePhase::LevelComplete { started } => {
            if now.saturating_sub(started) >= state.tuning.level.level_complete_ms {
                state.level += 1;
                state.clear_entities();
                state.phase = GamePhase::Intro { started: now };
                log::info!("advancing to level {}", state.level);
            }
        }
        GamePhase::GameOver => {
            if input.restart {
                state.clear_entities();
                state.phase = GamePhase::Idle;
            }
        }
    }

    // Cosmetics keep animating in every phase
    state.particles.update(now);
    if state.shockwave.is_some_and(|w| w.is_done(now)) {
        state.shockwave = None;
    }
}

/// Begin a brand-new run at level 1. Consumes the entitlement.
pub fn start_run(state: &mut SessionState, now: Millis) {
    state.entitled = false;
    state.score = 0;
    state.level = 1;
    state.spider_kills = 0;
    state.powerup_spawner.reset();
    state.clear_entities();
    state.phase = GamePhase::Intro { started: now };
    log::info!("run started (seed {})", state.seed);
    state.push_event(GameEvent::RunStarted);
}

fn end_run(state: &mut SessionState) {
    state.phase = GamePhase::GameOver;
    log::info!("game over on level {} with {} points", state.level, state.score);
    state.push_event(GameEvent::GameOver { score: state.score });
}

/// One frame of active play
fn play(state: &mut SessionState, input: &TickInput, now: Millis) {
    if input.auto_fire_toggle {
        state.auto_fire = !state.auto_fire;
    }
    let field = state.field;
    state.player.steer(input.axis(), &field);

    let expiry = state.player.expire_powers(now, &state.tuning.player);
    if expiry.energy {
        trigger_shockwave(state, now);
    }

    if input.fire || state.auto_fire {
        let shots = state.player.try_fire(now, &state.tuning.player);
        if let Some(first) = shots.first() {
            state.push_event(GameEvent::ShotFired { plasma: first.plasma });
        }
        state.bullets.extend(shots);
    }

    for powerup in state.powerups.iter_mut() {
        powerup.advance_pulse(&state.tuning.powerup);
    }
    player_vs_powerups(state, now);
    player_vs_blocks(state, now);

    for bullet in state.bullets.iter_mut() {
        bullet.advance(&field);
    }
    resolve_bullets(state, now);
    state.blocks.prune();

    // Chains move on their own cadence
    let mut round_trips = 0;
    for chain in state.chains.iter_mut() {
        let event = chain.update(
            now,
            &field,
            &state.blocks.index,
            &state.tuning.chain,
            &mut state.rng,
        );
        if event == Some(ChainEvent::RoundTrip) {
            round_trips += 1;
        }
    }
    if player_vs_segments(state) {
        end_run(state);
        return;
    }
    let glyph = state.level_ctx.glyph;
    for chain in state.chains.iter_mut() {
        chain.prune_dead(glyph);
    }
    state.chains.retain(|c| !c.is_empty());

    maybe_spawn_spider(state, now);
    let spawned = state.powerup_spawner.check(
        state.spider_kills,
        &field,
        now,
        &state.tuning.powerup,
        &mut state.rng,
    );
    if let Some(powerup) = spawned {
        state.powerups.push(powerup);
        state.push_event(GameEvent::PowerUpSpawned);
    }

    let target = state.player.pos;
    for spider in state.spiders.iter_mut().filter(|s| s.alive) {
        let report = spider.update(
            now,
            &field,
            &mut state.blocks,
            target,
            &state.tuning.spider,
            &mut state.rng,
        );
        if let Some(report) = report
            && let Some(block) = state.blocks.blocks.iter().find(|b| b.pos == report.block)
        {
            for &cell in &report.cleared {
                state
                    .particles
                    .block_burst(block.section_center(cell), block.color_set, now, &mut state.rng);
            }
        }
    }
    state.blocks.prune();
    if player_vs_spiders(state) {
        end_run(state);
        return;
    }
    state.spiders.retain(|s| s.alive);

    for _ in 0..round_trips {
        state.round_trips += 1;
        log::debug!("round trip {} on level {}", state.round_trips, state.level);
        spawn_chain(state, now);
    }
    if state.chains.len() < state.tuning.chain.target_concurrency {
        spawn_chain(state, now);
    }

    if state.chains.is_empty() && state.centipedes_spawned >= state.tuning.chain.max_per_level {
        log::info!("level {} complete", state.level);
        state.phase = GamePhase::LevelComplete { started: now };
        state.push_event(GameEvent::LevelComplete { level: state.level });
    }
}

/// Demo driver: fire constantly, dodge close spiders, track the lowest
/// segment
fn autopilot(state: &SessionState, input: &mut TickInput) {
    match state.phase {
        GamePhase::Idle => input.start = true,
        GamePhase::GameOver => input.restart = true,
        _ => {}
    }
    input.fire = true;

    let me = state.player.center();
    let threat = state
        .spiders
        .iter()
        .filter(|s| s.alive)
        .map(|s| s.center())
        .min_by(|a, b| a.distance_squared(me).total_cmp(&b.distance_squared(me)));
    if let Some(t) = threat
        && t.distance(me) < AUTOPILOT_DODGE_RANGE
    {
        input.left = t.x >= me.x;
        input.right = t.x < me.x;
        input.down = t.y < me.y;
        input.up = false;
        return;
    }

    let lowest = state
        .chains
        .iter()
        .flat_map(|c| c.segments.iter())
        .filter(|s| s.alive)
        .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
        .map(|s| s.center().x);
    if let Some(x) = lowest {
        input.left = x < me.x - 4.0;
        input.right = x > me.x + 4.0;
    }
}
