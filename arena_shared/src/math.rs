//! Math types.
//!
//! This module intentionally stays small and deterministic.
//! Everything is `f64`: world distances reach boundary scale (thousands of
//! units) and the camera transform is applied to every entity every frame.

use serde::{Deserialize, Serialize};

/// Width/height of every game object sprite in world units.
///
/// Must match the server; boundary radius and speeds share this space.
pub const GAME_OBJECT_SIZE: f64 = 48.0;

/// 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle` (radians).
    pub fn from_angle(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    pub fn len(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Returns the unit vector, or zero for a zero-length input.
    pub fn normalize_or_zero(self) -> Self {
        let len = self.len();
        if len > 0.0 {
            Self::new(self.x / len, self.y / len)
        } else {
            Self::ZERO
        }
    }

    /// Rotates counter-clockwise by `angle` radians.
    pub fn rotate(self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    pub fn scale(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s)
    }

    pub fn lerp(self, to: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self::new(self.x + (to.x - self.x) * t, self.y + (to.y - self.y) * t)
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Maps a world point into the camera frame of a reference entity.
///
/// The displacement from `reference` is rotated by `-reference_angle`, so the
/// reference entity's heading is always unrotated on screen, then offset by
/// `screen_origin`.
pub fn world_to_screen(
    point: Vec2,
    screen_origin: Vec2,
    reference: Vec2,
    reference_angle: f64,
) -> Vec2 {
    (point - reference).rotate(-reference_angle) + screen_origin
}

/// Inverse of [`world_to_screen`].
pub fn screen_to_world(
    screen: Vec2,
    screen_origin: Vec2,
    reference: Vec2,
    reference_angle: f64,
) -> Vec2 {
    (screen - screen_origin).rotate(reference_angle) + reference
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn assert_close(a: Vec2, b: Vec2) {
        assert!((a.x - b.x).abs() < 1e-9, "{a:?} != {b:?}");
        assert!((a.y - b.y).abs() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn vec2_lerp_midpoint() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(2.0, 4.0);
        assert_eq!(a.lerp(b, 0.5), Vec2::new(1.0, 2.0));
    }

    #[test]
    fn normalize_zero_stays_zero() {
        assert_eq!(Vec2::ZERO.normalize_or_zero(), Vec2::ZERO);
        assert_close(Vec2::new(3.0, 4.0).normalize_or_zero(), Vec2::new(0.6, 0.8));
    }

    #[test]
    fn reference_point_lands_on_origin() {
        let origin = Vec2::new(400.0, 400.0);
        let reference = Vec2::new(-1234.5, 987.25);
        for angle in [0.0, 0.3, FRAC_PI_2, PI, -2.0] {
            assert_close(world_to_screen(reference, origin, reference, angle), origin);
        }
    }

    #[test]
    fn heading_becomes_unrotated() {
        // A point straight ahead of a ship facing +y ends up along +x of the
        // screen frame, the same place it would be for a ship facing +x.
        let origin = Vec2::new(100.0, 50.0);
        let p = world_to_screen(Vec2::new(0.0, 10.0), origin, Vec2::ZERO, FRAC_PI_2);
        assert_close(p, Vec2::new(110.0, 50.0));
    }

    #[test]
    fn screen_round_trip_at_boundary_scale() {
        let origin = Vec2::new(480.0, 460.0);
        let reference = Vec2::new(3200.0, -2750.0);
        let angle = 5.123;
        for point in [
            Vec2::new(-4000.0, 4000.0),
            Vec2::new(3199.0, -2751.5),
            Vec2::new(0.0, 0.0),
        ] {
            let screen = world_to_screen(point, origin, reference, angle);
            assert_close(screen_to_world(screen, origin, reference, angle), point);
        }
    }
}
