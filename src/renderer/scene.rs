//! Frame builder
//!
//! Turns a read-only `SessionState` into one triangle list in game
//! coordinates. The simulation never calls back into here.

use glam::Vec2;

use super::shapes;
use super::vertex::colors::{self, with_alpha};
use super::vertex::Vertex;
use crate::consts::{BORDER_WIDTH, BOTTOM_BORDER_WIDTH, GRID_SIZE, SECTION_SIZE};
use crate::settings::Settings;
use crate::sim::block::{Block, SECTION_COUNT, SECTIONS_PER_ROW};
use crate::sim::chain::{Segment, SegmentTint};
use crate::sim::geometry::Rect;
use crate::sim::particle::{Particle, ParticleTint};
use crate::sim::state::SessionState;

const CIRCLE_SEGMENTS: u32 = 12;
const SMALL_CIRCLE_SEGMENTS: u32 = 6;

/// Everything visible this frame
pub fn build_frame(state: &SessionState, settings: &Settings) -> Vec<Vertex> {
    let now = state.now;
    let mut out = Vec::with_capacity(8192);

    if settings.quality.grid_enabled() {
        backdrop_grid(state, &mut out);
    }
    borders(state, &mut out);

    for block in &state.blocks.blocks {
        block_cells(block, &mut out);
    }
    for chain in &state.chains {
        // Bodies first so heads sit on top
        for seg in chain.segments.iter().filter(|s| s.alive && !s.is_head) {
            segment(seg, &mut out);
        }
        for seg in chain.segments.iter().filter(|s| s.alive && s.is_head) {
            segment(seg, &mut out);
        }
    }
    for spider in state.spiders.iter().filter(|s| s.alive) {
        out.extend(shapes::circle(
            spider.center(),
            spider.size / 2.0,
            colors::SPIDER,
            CIRCLE_SEGMENTS,
        ));
        if spider.is_chewing() {
            out.extend(shapes::circle(
                spider.center() - Vec2::Y * (spider.size / 2.0 + 3.0),
                2.0,
                colors::CHEWING,
                SMALL_CIRCLE_SEGMENTS,
            ));
        }
    }
    for powerup in state.powerups.iter().filter(|p| p.active) {
        let scale = if settings.effective_pulse() {
            powerup.pulse_scale()
        } else {
            1.0
        };
        out.extend(shapes::diamond(
            powerup.center(),
            powerup.size / 2.0 * scale,
            colors::POWERUP,
        ));
    }
    for bullet in state.bullets.iter().filter(|b| b.active) {
        if bullet.plasma {
            out.extend(shapes::circle(
                bullet.center(),
                bullet.size / 2.0,
                colors::PLASMA,
                CIRCLE_SEGMENTS,
            ));
        } else {
            out.extend(shapes::rect(&bullet.rect(), colors::BULLET));
        }
    }

    player(state, &mut out);

    for p in &state.particles.particles {
        particle(p, now, &mut out);
    }

    if let Some(wave) = &state.shockwave {
        let radius = wave.radius(now);
        let alpha = wave.alpha(now);
        out.extend(shapes::ring(
            wave.center,
            (radius - 4.0).max(0.0),
            radius,
            with_alpha(colors::PLAYER_ENERGIZED, alpha),
            48,
        ));
        if settings.effective_shockwave_flash() {
            let screen = Rect::new(Vec2::ZERO, Vec2::new(state.field.width, state.field.height));
            out.extend(shapes::rect(&screen, [1.0, 1.0, 1.0, alpha * 0.3]));
        }
    }

    out
}

fn backdrop_grid(state: &SessionState, out: &mut Vec<Vertex>) {
    let field = state.field;
    let mut x = 0.0;
    while x <= field.width {
        let line = Rect::new(Vec2::new(x, 0.0), Vec2::new(1.0, field.height));
        out.extend(shapes::rect(&line, colors::GRID));
        x += GRID_SIZE * 2.0;
    }
}

fn borders(state: &SessionState, out: &mut Vec<Vertex>) {
    let field = state.field;
    let frame = Rect::new(Vec2::ZERO, Vec2::new(field.width, field.height));
    out.extend(shapes::rect_outline(&frame, BORDER_WIDTH, colors::BORDER));
    let floor = Rect::new(
        Vec2::new(0.0, field.height - BOTTOM_BORDER_WIDTH),
        Vec2::new(field.width, BOTTOM_BORDER_WIDTH),
    );
    out.extend(shapes::rect(&floor, with_alpha(colors::BORDER, 0.35)));
}

/// Each intact cell as a small disc, shaded in a 2x2 checker from the set
fn block_cells(block: &Block, out: &mut Vec<Vertex>) {
    let palette = &colors::EGG_COLORS[block.color_set as usize % colors::EGG_COLORS.len()];
    for i in (0..SECTION_COUNT).filter(|&i| block.is_intact(i)) {
        let row = i / SECTIONS_PER_ROW;
        let col = i % SECTIONS_PER_ROW;
        let shade = (i % 2) + (row % 2) * 2;

        // Middle rows and columns bulge for the egg outline
        let mut scale: f32 = if row == 0 || row == 3 { 0.9 } else { 1.0 };
        scale *= if col == 0 || col == 3 { 0.95 } else { 1.05 };

        out.extend(shapes::circle(
            block.section_center(i),
            SECTION_SIZE / 2.0 * scale,
            palette[shade],
            SMALL_CIRCLE_SEGMENTS,
        ));
    }
}

fn segment(seg: &Segment, out: &mut Vec<Vertex>) {
    let color = match seg.tint {
        SegmentTint::Head => colors::HEAD,
        SegmentTint::Body => colors::BODY,
        SegmentTint::Metallic(shade) => colors::METALLIC[shade as usize % colors::METALLIC.len()],
    };
    let radius = seg.size / 2.0;
    out.extend(shapes::circle(seg.center(), radius, color, CIRCLE_SEGMENTS));
    if seg.armored {
        out.extend(shapes::ring(
            seg.center(),
            radius,
            radius + 2.0,
            colors::ARMOR_RIM,
            CIRCLE_SEGMENTS,
        ));
    }
}

fn player(state: &SessionState, out: &mut Vec<Vertex>) {
    let player = &state.player;
    if player.is_plasma() {
        out.extend(shapes::circle(
            player.center(),
            player.size * 0.75,
            colors::PLAYER_PLASMA_HALO,
            CIRCLE_SEGMENTS * 2,
        ));
    }
    let color = if player.is_energized() {
        colors::PLAYER_ENERGIZED
    } else {
        colors::PLAYER
    };
    out.extend(shapes::ship(&player.rect(), color));
}

fn particle(p: &Particle, now: crate::Millis, out: &mut Vec<Vertex>) {
    let base = match p.tint {
        ParticleTint::Palette { set, shade } => {
            let palette = &colors::EGG_COLORS[set as usize % colors::EGG_COLORS.len()];
            palette[shade as usize % palette.len()]
        }
        ParticleTint::Gold => colors::GOLD,
        ParticleTint::Cyan => colors::CYAN,
    };
    let alpha = 1.0 - p.age_ratio(now);
    let r = Rect::square(p.pos - Vec2::splat(p.size / 2.0), p.size);
    out.extend(shapes::rect(&r, with_alpha(base, alpha)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::start_level;

    #[test]
    fn test_empty_session_draws_only_chrome() {
        let state = SessionState::new(1);
        let settings = Settings::from_preset(crate::QualityPreset::Low);
        let frame = build_frame(&state, &settings);
        // Outline (4 edges), floor strip, ship
        assert_eq!(frame.len(), 24 + 6 + 3);
    }

    #[test]
    fn test_level_frame_has_every_block_cell() {
        let mut state = SessionState::new(9);
        start_level(&mut state, 0);
        let settings = Settings::from_preset(crate::QualityPreset::Low);
        let frame = build_frame(&state, &settings);

        let cells = state.blocks.len() * SECTION_COUNT;
        let segments = state.segment_count();
        let expected = 30
            + 3
            + cells * (SMALL_CIRCLE_SEGMENTS as usize * 3)
            + segments * (CIRCLE_SEGMENTS as usize * 3);
        assert_eq!(frame.len(), expected);
    }

    #[test]
    fn test_frame_stays_inside_field() {
        let mut state = SessionState::new(4);
        start_level(&mut state, 0);
        // Fresh chains trail in from off-screen
        state.chains.clear();
        let frame = build_frame(&state, &Settings::default());
        let (w, h) = (state.field.width, state.field.height);
        for v in frame {
            assert!(v.position[0] >= -1.0 && v.position[0] <= w + 1.0);
            assert!(v.position[1] >= -1.0 && v.position[1] <= h + 1.0);
        }
    }
}
