//! Player-centered camera.

use arena_shared::{
    math::{world_to_screen, Vec2},
    render::{DrawCmd, Sprite},
};

/// Camera locked on the local ship: its position maps to `origin` and its
/// heading is always drawn unrotated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub origin: Vec2,
    pub reference: Vec2,
    pub angle: f64,
}

impl Camera {
    pub fn new(origin: Vec2, reference: Vec2, angle: f64) -> Self {
        Self {
            origin,
            reference,
            angle,
        }
    }

    pub fn project(&self, point: Vec2) -> Vec2 {
        world_to_screen(point, self.origin, self.reference, self.angle)
    }

    /// Places a world-space sprite with heading `angle` on screen.
    pub fn place(&self, sprite: Sprite, position: Vec2, angle: f64) -> DrawCmd {
        DrawCmd::new(sprite, self.project(position)).rotated(angle - self.angle)
    }

    /// Places the reference entity itself: always at the origin, unrotated.
    pub fn place_reference(&self, sprite: Sprite) -> DrawCmd {
        DrawCmd::new(sprite, self.origin)
    }
}
