//! Triangle-list primitives in game coordinates

use glam::Vec2;
use std::f32::consts::TAU;

use super::vertex::Vertex;
use crate::sim::geometry::Rect;

/// Two triangles covering `[a, b, c, d]` (in winding order)
fn quad(out: &mut Vec<Vertex>, a: Vec2, b: Vec2, c: Vec2, d: Vec2, color: [f32; 4]) {
    out.push(Vertex::new(a.x, a.y, color));
    out.push(Vertex::new(b.x, b.y, color));
    out.push(Vertex::new(c.x, c.y, color));

    out.push(Vertex::new(c.x, c.y, color));
    out.push(Vertex::new(d.x, d.y, color));
    out.push(Vertex::new(a.x, a.y, color));
}

/// Filled axis-aligned rectangle
pub fn rect(r: &Rect, color: [f32; 4]) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity(6);
    let (x0, y0) = (r.pos.x, r.pos.y);
    let (x1, y1) = (r.right(), r.bottom());
    quad(
        &mut vertices,
        Vec2::new(x0, y0),
        Vec2::new(x1, y0),
        Vec2::new(x1, y1),
        Vec2::new(x0, y1),
        color,
    );
    vertices
}

/// Rectangle outline `thickness` wide, drawn inside `r`
pub fn rect_outline(r: &Rect, thickness: f32, color: [f32; 4]) -> Vec<Vertex> {
    let t = thickness.min(r.size.x / 2.0).min(r.size.y / 2.0);
    let mut vertices = Vec::with_capacity(24);
    let edges = [
        Rect::new(r.pos, Vec2::new(r.size.x, t)),
        Rect::new(Vec2::new(r.pos.x, r.bottom() - t), Vec2::new(r.size.x, t)),
        Rect::new(Vec2::new(r.pos.x, r.pos.y + t), Vec2::new(t, r.size.y - 2.0 * t)),
        Rect::new(
            Vec2::new(r.right() - t, r.pos.y + t),
            Vec2::new(t, r.size.y - 2.0 * t),
        ),
    ];
    for edge in &edges {
        vertices.extend(rect(edge, color));
    }
    vertices
}

/// Generate vertices for a filled circle
pub fn circle(center: Vec2, radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 3) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * TAU;
        let theta2 = ((i + 1) as f32 / segments as f32) * TAU;

        // Triangle from center to edge
        vertices.push(Vertex::new(center.x, center.y, color));
        vertices.push(Vertex::new(
            center.x + radius * theta1.cos(),
            center.y + radius * theta1.sin(),
            color,
        ));
        vertices.push(Vertex::new(
            center.x + radius * theta2.cos(),
            center.y + radius * theta2.sin(),
            color,
        ));
    }

    vertices
}

/// Generate vertices for a ring (hollow circle)
pub fn ring(
    center: Vec2,
    inner_radius: f32,
    outer_radius: f32,
    color: [f32; 4],
    segments: u32,
) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 6) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * TAU;
        let theta2 = ((i + 1) as f32 / segments as f32) * TAU;
        let dir1 = Vec2::from_angle(theta1);
        let dir2 = Vec2::from_angle(theta2);

        quad(
            &mut vertices,
            center + dir1 * inner_radius,
            center + dir1 * outer_radius,
            center + dir2 * outer_radius,
            center + dir2 * inner_radius,
            color,
        );
    }

    vertices
}

/// Upward-pointing ship triangle inside `r`
pub fn ship(r: &Rect, color: [f32; 4]) -> Vec<Vertex> {
    let nose = Vec2::new(r.pos.x + r.size.x / 2.0, r.pos.y);
    vec![
        Vertex::new(nose.x, nose.y, color),
        Vertex::new(r.right(), r.bottom(), color),
        Vertex::new(r.pos.x, r.bottom(), color),
    ]
}

/// Diamond centred on `center`, `radius` to each tip
pub fn diamond(center: Vec2, radius: f32, color: [f32; 4]) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity(6);
    quad(
        &mut vertices,
        center - Vec2::Y * radius,
        center + Vec2::X * radius,
        center + Vec2::Y * radius,
        center - Vec2::X * radius,
        color,
    );
    vertices
}
