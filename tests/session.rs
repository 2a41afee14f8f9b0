//! Whole-session behaviour driven through the public tick API

use glam::Vec2;
use proptest::prelude::*;

use moloch_blaster::consts::{BASE_SEGMENT_COUNT, SEGMENT_SIZE};
use moloch_blaster::platform::{Binding, Clock, InputState, Key, ManualClock};
use moloch_blaster::sim::block::SECTION_COUNT;
use moloch_blaster::sim::{GameEvent, GamePhase, SessionState, Spider, TickInput, tick};

const FRAME_MS: u64 = 16;

/// Entitle, start and run through the intro. Returns the time play began.
fn begin_play(state: &mut SessionState) -> u64 {
    state.entitled = true;
    let start = TickInput {
        start: true,
        ..Default::default()
    };
    tick(state, &start, 0);
    let intro_ms = u64::from(state.tuning.level.intro_countdown_secs) * 1000;
    tick(state, &TickInput::default(), intro_ms);
    assert_eq!(state.phase, GamePhase::Playing);
    intro_ms
}

fn autopilot() -> TickInput {
    TickInput {
        autopilot: true,
        ..Default::default()
    }
}

#[test]
fn test_fresh_level_one() {
    let mut state = SessionState::new(2024);
    begin_play(&mut state);
    assert_eq!(state.level, 1);
    assert_eq!(state.chains.len(), 1);
    assert_eq!(state.chains[0].len(), BASE_SEGMENT_COUNT);
    assert!(state.chains[0].segments[0].is_head);
    assert!(state.spiders.is_empty());
    assert_eq!(state.score, 0);
}

#[test]
fn test_touching_a_segment_ends_the_run() {
    let mut state = SessionState::new(11);
    let now = begin_play(&mut state);
    state.blocks.clear();
    assert!(state.player.kill_count < state.tuning.player.energy_threshold);
    let target = state.player.center() - Vec2::splat(SEGMENT_SIZE / 2.0);
    state.chains[0].segments[0].pos = target;

    tick(&mut state, &TickInput::default(), now + FRAME_MS);
    assert_eq!(state.phase, GamePhase::GameOver);
    let events = state.drain_events();
    assert!(events.contains(&GameEvent::GameOver { score: state.score }));

    // Play no longer advances once over
    let frozen = state.chains[0].segments.clone();
    tick(&mut state, &TickInput::default(), now + 1000);
    assert_eq!(state.chains[0].segments, frozen);
}

#[test]
fn test_energized_player_eats_spider() {
    let mut state = SessionState::new(12);
    let now = begin_play(&mut state);
    state.blocks.clear();
    state.player.energized_at = Some(now);
    let before = state.score;
    let spider = Spider::new(state.player.pos + Vec2::splat(8.0), 0.5, now, &mut state.rng);
    state.spiders.push(spider);

    tick(&mut state, &TickInput::default(), now + FRAME_MS);
    assert_eq!(state.phase, GamePhase::Playing);
    assert!(state.spiders.iter().all(|s| !s.alive) || state.spiders.is_empty());
    assert!(state.score > before);
    assert_eq!(state.player.energized_at, Some(now));
}

#[test]
fn test_restart_needs_a_new_entitlement() {
    let mut state = SessionState::new(13);
    let now = begin_play(&mut state);
    state.blocks.clear();
    let target = state.player.center() - Vec2::splat(SEGMENT_SIZE / 2.0);
    state.chains[0].segments[3].pos = target;
    tick(&mut state, &TickInput::default(), now + FRAME_MS);
    assert_eq!(state.phase, GamePhase::GameOver);

    let restart = TickInput {
        restart: true,
        start: true,
        ..Default::default()
    };
    tick(&mut state, &restart, now + 2000);
    assert_eq!(state.phase, GamePhase::Idle);
    tick(&mut state, &restart, now + 2016);
    assert_eq!(state.phase, GamePhase::Idle);

    state.entitled = true;
    tick(&mut state, &restart, now + 2032);
    assert!(matches!(state.phase, GamePhase::Intro { .. }));
    assert_eq!(state.score, 0);
    assert_eq!(state.level, 1);
}

#[test]
fn test_same_seed_same_session() {
    let run = |seed: u64| {
        let mut state = SessionState::new(seed);
        state.entitled = true;
        let mut now = 0;
        for _ in 0..1500 {
            now += FRAME_MS;
            tick(&mut state, &autopilot(), now);
        }
        (
            state.score,
            state.level,
            state.phase,
            state.segment_count(),
            state.blocks.len(),
            state.player.pos,
        )
    };
    assert_eq!(run(77), run(77));
}

#[test]
fn test_stuck_key_stops_the_ship() {
    let mut state = SessionState::new(5);
    let clock = ManualClock::new(0);
    let mut input = InputState::new();
    let start_time = begin_play(&mut state);
    clock.set(start_time);

    input.press(Binding::Hold(Key::Left), clock.now_ms());
    // Key-up lost; no repeats arrive
    for _ in 0..700 {
        clock.advance(FRAME_MS);
        let snap = input.snapshot(clock.now_ms());
        tick(&mut state, &snap, clock.now_ms());
        if state.phase != GamePhase::Playing {
            return;
        }
    }
    assert!(!input.is_held(Key::Left));
}

#[test]
fn test_events_reach_collaborators() {
    let mut state = SessionState::new(31);
    state.entitled = true;
    let mut now = 0;
    let mut seen = Vec::new();
    for _ in 0..600 {
        now += FRAME_MS;
        tick(&mut state, &autopilot(), now);
        seen.extend(state.drain_events());
    }
    assert!(seen.contains(&GameEvent::RunStarted));
    assert!(seen.contains(&GameEvent::LevelStarted { level: 1 }));
    assert!(seen.iter().any(|e| matches!(e, GameEvent::ShotFired { .. })));
    assert!(state.events().is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    /// Kill credit stays below the threshold until energize starts, and is
    /// zero on the tick it does
    #[test]
    fn prop_energize_counter(seed in any::<u64>()) {
        let mut state = SessionState::new(seed);
        state.entitled = true;
        let threshold = state.tuning.player.energy_threshold;
        let mut now = 0;
        let mut was_energized = false;
        for _ in 0..2500 {
            now += FRAME_MS;
            tick(&mut state, &autopilot(), now);
            let energized = state.player.is_energized();
            if !energized {
                prop_assert!(state.player.kill_count < threshold);
            }
            if energized && !was_energized {
                prop_assert_eq!(state.player.kill_count, 0);
            }
            was_energized = energized;
        }
    }

    /// Block health always equals its intact cell count
    #[test]
    fn prop_block_health_matches_cells(seed in any::<u64>()) {
        let mut state = SessionState::new(seed);
        state.entitled = true;
        let mut now = 0;
        for _ in 0..1500 {
            now += FRAME_MS;
            tick(&mut state, &autopilot(), now);
            for block in &state.blocks.blocks {
                let intact = block.sections.iter().filter(|&&s| s).count();
                prop_assert_eq!(block.health as usize, intact);
                prop_assert!(intact <= SECTION_COUNT);
                prop_assert!(intact > 0);
            }
        }
    }
}
