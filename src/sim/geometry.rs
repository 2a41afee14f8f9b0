//! Geometry and overlap tests shared by every entity

use glam::Vec2;

/// Axis-aligned rectangle (top-left origin)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    /// Square with side `size` at `pos`
    pub fn square(pos: Vec2, size: f32) -> Self {
        Self::new(pos, Vec2::splat(size))
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    /// Strict overlap (touching edges do not count)
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.pos.x < other.right()
            && self.right() > other.pos.x
            && self.pos.y < other.bottom()
            && self.bottom() > other.pos.y
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.pos.x && p.x <= self.right() && p.y >= self.pos.y && p.y <= self.bottom()
    }
}

/// Centre of a square entity anchored at its top-left corner
#[inline]
pub fn square_center(pos: Vec2, size: f32) -> Vec2 {
    pos + Vec2::splat(size * 0.5)
}

/// Circle overlap: centres closer than the combined radius
#[inline]
pub fn circles_overlap(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> bool {
    a.distance_squared(b) < (radius_a + radius_b) * (radius_a + radius_b)
}

/// Point within `radius` of `center` (inclusive)
#[inline]
pub fn within_radius(center: Vec2, point: Vec2, radius: f32) -> bool {
    center.distance_squared(point) <= radius * radius
}

/// Normalize, falling back to `fallback` for zero-length vectors
#[inline]
pub fn normalize_or(v: Vec2, fallback: Vec2) -> Vec2 {
    let n = v.normalize_or_zero();
    if n == Vec2::ZERO { fallback } else { n }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_overlap() {
        let a = Rect::square(Vec2::new(0.0, 0.0), 10.0);
        let b = Rect::square(Vec2::new(5.0, 5.0), 10.0);
        let c = Rect::square(Vec2::new(10.0, 0.0), 10.0);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        // Shared edge only
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_circles_overlap() {
        assert!(circles_overlap(Vec2::ZERO, 5.0, Vec2::new(9.0, 0.0), 5.0));
        assert!(!circles_overlap(Vec2::ZERO, 5.0, Vec2::new(10.0, 0.0), 5.0));
    }

    #[test]
    fn test_square_center_and_radius() {
        let c = square_center(Vec2::new(10.0, 20.0), 20.0);
        assert_eq!(c, Vec2::new(20.0, 30.0));
        assert!(within_radius(c, Vec2::new(20.0, 40.0), 10.0));
        assert!(!within_radius(c, Vec2::new(20.0, 40.1), 10.0));
    }

    #[test]
    fn test_normalize_or_fallback() {
        assert_eq!(normalize_or(Vec2::ZERO, Vec2::X), Vec2::X);
        let n = normalize_or(Vec2::new(3.0, 4.0), Vec2::X);
        assert!((n.length() - 1.0).abs() < 1e-6);
    }
}
