//! Collision detection and damage resolution
//!
//! Bullets resolve against targets in a fixed priority: power-ups, then
//! block cells, then chain segments, then spiders. A bullet retires on its
//! first hit. Player contact is checked separately and is fatal unless the
//! player is energized.

use glam::Vec2;

use super::block::SECTION_COUNT;
use super::chain::DamageOutcome;
use super::geometry::{circles_overlap, within_radius};
use super::particle::Shockwave;
use super::player::Bullet;
use super::state::{EnemyKind, GameEvent, SessionState};
use crate::consts::SEGMENT_SIZE;
use crate::Millis;

/// What a single bullet struck
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulletHit {
    PowerUp,
    Block,
    Segment(DamageOutcome),
    Spider,
}

/// Resolve every active bullet, then purge the spent ones
pub fn resolve_bullets(state: &mut SessionState, now: Millis) -> Vec<BulletHit> {
    let mut hits = Vec::new();
    for i in 0..state.bullets.len() {
        if !state.bullets[i].active {
            continue;
        }
        let bullet = state.bullets[i].clone();
        let hit = bullet_vs_powerups(state, &bullet, now)
            .or_else(|| bullet_vs_blocks(state, &bullet, now))
            .or_else(|| bullet_vs_segments(state, &bullet, now))
            .or_else(|| bullet_vs_spiders(state, &bullet, now));
        if let Some(hit) = hit {
            state.bullets[i].active = false;
            hits.push(hit);
        }
    }
    state.bullets.retain(|b| b.active);
    state.powerups.retain(|p| p.active);
    hits
}

fn bullet_vs_powerups(state: &mut SessionState, bullet: &Bullet, now: Millis) -> Option<BulletHit> {
    let tuning = &state.tuning.powerup;
    let index = state
        .powerups
        .iter()
        .position(|p| p.active && p.touches(bullet.center(), bullet.size * 0.5, tuning))?;
    collect_powerup(state, index, now);
    Some(BulletHit::PowerUp)
}

/// Grant the power-up at `index` to the player
pub fn collect_powerup(state: &mut SessionState, index: usize, now: Millis) {
    let Some(powerup) = state.powerups.get_mut(index) else {
        return;
    };
    powerup.active = false;
    let pos = powerup.pos;
    state.player.grant_plasma(now);
    state.particles.powerup_burst(pos, now, &mut state.rng);
    log::info!("plasma power-up collected");
    state.push_event(GameEvent::PowerUpCollected);
}

fn bullet_vs_blocks(state: &mut SessionState, bullet: &Bullet, now: Millis) -> Option<BulletHit> {
    let center = bullet.center();
    let radius = bullet.hit_radius();
    let (block_idx, section) = state.blocks.blocks.iter().enumerate().find_map(|(bi, block)| {
        (0..SECTION_COUNT)
            .find(|&s| block.is_intact(s) && block.section_center(s).distance(center) < radius)
            .map(|s| (bi, s))
    })?;

    let damage = bullet.damage(&state.tuning.player);
    let block = &mut state.blocks.blocks[block_idx];
    let mut cleared = block.damage_from(section, damage);
    cleared.extend(block.splash(section, &mut state.rng));
    let destroyed = block.is_destroyed();
    let set = block.color_set;
    let centers: Vec<Vec2> = cleared.iter().map(|&s| block.section_center(s)).collect();

    for c in centers {
        state.particles.block_burst(c, set, now, &mut state.rng);
    }
    if destroyed {
        state.award(state.tuning.scoring.block_destroyed);
        state.push_event(GameEvent::BlockDestroyed);
    }
    Some(BulletHit::Block)
}

fn bullet_vs_segments(state: &mut SessionState, bullet: &Bullet, now: Millis) -> Option<BulletHit> {
    let center = bullet.center();
    let reach = bullet.hit_radius() + SEGMENT_SIZE / 2.0;
    let (ci, si) = state.chains.iter().enumerate().find_map(|(ci, chain)| {
        chain
            .segments
            .iter()
            .position(|s| s.alive && s.center().distance(center) < reach)
            .map(|si| (ci, si))
    })?;

    let damage = bullet.damage(&state.tuning.player);
    let glyph = state.level_ctx.glyph;
    let chain_len = state.chains[ci].len();
    let segment = &mut state.chains[ci].segments[si];
    let is_head = segment.is_head;
    let pos = segment.pos;
    let outcome = segment.take_damage(damage);
    let scoring = state.tuning.scoring.clone();

    if outcome.hit_armor() {
        state.particles.armor_burst(bullet.pos, now, &mut state.rng);
        state.push_event(GameEvent::ArmorHit);
    }
    if outcome == DamageOutcome::Absorbed {
        state.award(scoring.body_armor_chip);
    }

    if is_head {
        // Struck heads always plant a block where they were
        state.blocks.spawn_at(pos, &mut state.rng);
        if outcome.destroyed() {
            credit_kill(state, EnemyKind::Head, scoring.head_kill, scoring.head_kill_credit, now);
            if si + 1 < chain_len
                && let Some(tail) = state.chains[ci].detach_from(si + 1, glyph)
            {
                log::debug!("head destroyed, {} segments regrow a head", tail.len());
                state.chains.push(tail);
            }
        }
    } else if outcome.destroyed() {
        state.blocks.spawn_at(pos, &mut state.rng);
        credit_kill(state, EnemyKind::Body, scoring.body_kill, scoring.body_kill_credit, now);
        if si > 0 && si + 1 < chain_len {
            let chain = state.chains.remove(ci);
            let parts = chain.split_at(si, glyph);
            log::debug!("chain split at {si} into {} parts", parts.len());
            state.chains.splice(ci..ci, parts);
            state.push_event(GameEvent::ChainSplit);
        }
    }
    Some(BulletHit::Segment(outcome))
}

fn bullet_vs_spiders(state: &mut SessionState, bullet: &Bullet, now: Millis) -> Option<BulletHit> {
    let rect = bullet.rect();
    let spider = state
        .spiders
        .iter_mut()
        .find(|s| s.alive && s.rect().overlaps(&rect))?;
    spider.alive = false;
    let scoring = state.tuning.scoring.clone();
    state.spider_kills += 1;
    credit_kill(state, EnemyKind::Spider, scoring.spider_kill, scoring.spider_kill_credit, now);
    Some(BulletHit::Spider)
}

/// Score a kill and feed the energize counter
fn credit_kill(state: &mut SessionState, kind: EnemyKind, points: u64, credit: u32, now: Millis) {
    state.award(points);
    state.push_event(GameEvent::EnemyKilled { kind, points });
    if state.player.credit_kill(credit, now, &state.tuning.player) {
        log::info!("player energized");
        state.push_event(GameEvent::Energized);
    }
}

/// Player picks up any power-up in reach
pub fn player_vs_powerups(state: &mut SessionState, now: Millis) {
    let center = state.player.center();
    let radius = state.player.size * 0.5;
    loop {
        let tuning = &state.tuning.powerup;
        let found = state
            .powerups
            .iter()
            .position(|p| p.active && p.touches(center, radius, tuning));
        match found {
            Some(index) => collect_powerup(state, index, now),
            None => break,
        }
    }
    state.powerups.retain(|p| p.active);
}

/// Flying into a block grinds away the cells under the ship
pub fn player_vs_blocks(state: &mut SessionState, now: Millis) {
    let ship = state.player.rect();
    let mut ground = Vec::new();
    for block in state.blocks.blocks.iter_mut() {
        if block.is_destroyed() || !block.rect().overlaps(&ship) {
            continue;
        }
        for s in 0..SECTION_COUNT {
            if block.is_intact(s) && block.section_rect(s).overlaps(&ship) {
                block.clear_section(s);
                ground.push((block.section_center(s), block.color_set));
            }
        }
    }
    for (center, set) in &ground {
        state.particles.block_burst(*center, *set, now, &mut state.rng);
    }
    state.award(state.tuning.scoring.section_rammed * ground.len() as u64);
}

/// Contact between the player and live segments. Returns true if fatal.
pub fn player_vs_segments(state: &mut SessionState) -> bool {
    let center = state.player.center();
    let radius = state.player.size / 2.0;
    let energized = state.player.is_energized();
    let points = state.tuning.scoring.contact_segment_kill;
    let mut kills = Vec::new();

    for chain in state.chains.iter_mut() {
        for seg in chain.segments.iter_mut().filter(|s| s.alive) {
            if !circles_overlap(center, radius, seg.center(), SEGMENT_SIZE / 2.0) {
                continue;
            }
            if !energized {
                return true;
            }
            seg.alive = false;
            kills.push(if seg.is_head { EnemyKind::Head } else { EnemyKind::Body });
        }
    }
    for kind in kills {
        state.award(points);
        state.push_event(GameEvent::EnemyKilled { kind, points });
    }
    false
}

/// Contact between the player and live spiders. Returns true if fatal.
pub fn player_vs_spiders(state: &mut SessionState) -> bool {
    let ship = state.player.rect();
    let energized = state.player.is_energized();
    let points = state.tuning.scoring.spider_kill;
    let mut kills = 0;

    for spider in state.spiders.iter_mut().filter(|s| s.alive) {
        if !spider.rect().overlaps(&ship) {
            continue;
        }
        if !energized {
            return true;
        }
        spider.alive = false;
        kills += 1;
    }
    for _ in 0..kills {
        state.spider_kills += 1;
        state.award(points);
        state.push_event(GameEvent::EnemyKilled {
            kind: EnemyKind::Spider,
            points,
        });
    }
    false
}

/// Energize-expiry blast: everything within range dies regardless of armor
pub fn trigger_shockwave(state: &mut SessionState, now: Millis) -> u32 {
    let center = state.player.center();
    let radius = state.tuning.player.shockwave_radius;
    let scoring = state.tuning.scoring.clone();
    let mut kills = 0;
    let mut points = 0;

    for seg in state
        .chains
        .iter_mut()
        .flat_map(|c| c.segments.iter_mut())
        .filter(|s| s.alive)
    {
        if within_radius(center, seg.center(), radius) {
            seg.alive = false;
            kills += 1;
            points += if seg.is_head {
                scoring.shockwave_head_kill
            } else {
                scoring.shockwave_body_kill
            };
        }
    }
    for spider in state.spiders.iter_mut().filter(|s| s.alive) {
        if within_radius(center, spider.center(), radius) {
            spider.alive = false;
            kills += 1;
            points += scoring.spider_kill;
            state.spider_kills += 1;
        }
    }

    state.award(points);
    state.shockwave = Some(Shockwave {
        center,
        max_radius: radius,
        started: now,
        duration_ms: state.tuning.player.shockwave_duration_ms,
    });
    log::info!("shockwave destroyed {kills} enemies for {points} points");
    state.push_event(GameEvent::Shockwave { kills });
    kills
}
