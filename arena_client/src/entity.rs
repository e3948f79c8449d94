//! Entity model.
//!
//! Every kind owns its continuous state and a dead-reckoning `advance(dt)`.
//! Rendering is reduced to producing a `DrawCmd` through the camera.

use std::f64::consts::FRAC_PI_2;

use arena_shared::{
    math::Vec2,
    net::{Intent, ProjectileSpawn, ShipSnapshot, ShipSpawn},
    render::{DrawCmd, EffectKind, Sprite, Turn},
};
use rand::Rng;

use crate::camera::Camera;

/// Background star opacity rate multiplier.
const BG_STAR_ALPHA_RATE: f64 = 0.075;
/// Cosmetic spin of the world center marker, radians per second.
const WORLD_SPIN_RATE: f64 = FRAC_PI_2 * 0.25;
/// World center marker size relative to a game object.
const WORLD_CENTER_SCALE: f64 = 3.5;

/// A player ship.
#[derive(Debug, Clone, PartialEq)]
pub struct Ship {
    pub owner: String,
    pub palette: usize,
    pub position: Vec2,
    pub angle: f64,
    pub intent: Intent,
    pub move_speed: f64,
    pub rotate_speed: f64,
    /// Reserved for a death fade; ships currently vanish on death.
    pub opacity: f64,
    dead: bool,
}

impl Ship {
    /// Zero-valued stand-in used before the server creates the ship.
    pub fn placeholder(owner: impl Into<String>) -> Self {
        Self::spawn(owner, &ShipSpawn::default())
    }

    pub fn spawn(owner: impl Into<String>, spawn: &ShipSpawn) -> Self {
        Self {
            owner: owner.into(),
            palette: spawn.palette,
            position: spawn.position,
            angle: spawn.angle,
            intent: Intent::NONE,
            move_speed: spawn.move_speed,
            rotate_speed: spawn.rotate_speed,
            opacity: 1.0,
            dead: false,
        }
    }

    /// Overwrites position, heading and intent wholesale.
    pub fn apply_snapshot(&mut self, snapshot: &ShipSnapshot) {
        self.position = snapshot.position;
        self.angle = snapshot.angle;
        self.intent = snapshot.intent;
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn mark_dead(&mut self) {
        self.dead = true;
    }

    /// Unit movement direction in world space for the current intent.
    ///
    /// `dir_x` strafes along the heading, `dir_y` along the heading turned by
    /// a quarter turn; both are relative to the ship, not the world axes.
    pub fn heading_velocity(&self) -> Vec2 {
        let local = Vec2::new(self.intent.dir_x as f64, self.intent.dir_y as f64);
        local.rotate(self.angle).normalize_or_zero()
    }

    pub fn advance(&mut self, dt: f64) {
        if self.dead {
            return;
        }
        self.angle += self.rotate_speed * dt * self.intent.dir_r as f64;
        self.position += self.heading_velocity().scale(self.move_speed * dt);
    }

    pub fn sprite(&self) -> Sprite {
        Sprite::Ship {
            palette: self.palette,
            turn: Turn::from_dir(self.intent.dir_r),
            boosting: !self.intent.is_idle(),
        }
    }

    pub fn draw_cmd(&self, cam: &Camera) -> Option<DrawCmd> {
        if self.dead {
            return None;
        }
        Some(cam.place(self.sprite(), self.position, self.angle))
    }
}

/// A projectile; pure dead-reckoning, destroyed only by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub owner: String,
    pub sprite: usize,
    pub position: Vec2,
    pub angle: f64,
    pub move_speed: f64,
}

impl Projectile {
    pub fn spawn(owner: impl Into<String>, spawn: &ProjectileSpawn) -> Self {
        Self {
            owner: owner.into(),
            sprite: spawn.sprite,
            position: spawn.position,
            angle: spawn.angle,
            move_speed: spawn.move_speed,
        }
    }

    pub fn advance(&mut self, dt: f64) {
        self.position += Vec2::from_angle(self.angle).scale(self.move_speed * dt);
    }

    pub fn draw_cmd(&self, cam: &Camera) -> DrawCmd {
        // The projectile art points up; the heading points along +x.
        let mut cmd = cam.place(
            Sprite::Projectile { index: self.sprite },
            self.position,
            self.angle,
        );
        cmd.rotation -= FRAC_PI_2;
        cmd
    }
}

/// A one-shot visual effect that fades out over one second.
#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    pub owner: String,
    pub kind: EffectKind,
    pub position: Vec2,
    pub angle: f64,
    opacity: f64,
    dead: bool,
}

impl Effect {
    pub fn new(owner: impl Into<String>, kind: EffectKind, position: Vec2, angle: f64) -> Self {
        Self {
            owner: owner.into(),
            kind,
            position,
            angle,
            opacity: 1.0,
            dead: false,
        }
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn advance(&mut self, dt: f64) {
        if self.dead {
            return;
        }
        self.opacity -= dt;
        if self.opacity < 0.0 {
            self.opacity = 0.0;
            self.dead = true;
        }
    }

    pub fn draw_cmd(&self, cam: &Camera) -> Option<DrawCmd> {
        if self.dead {
            return None;
        }
        Some(
            cam.place(Sprite::Effect(self.kind), self.position, self.angle)
                .with_opacity(self.opacity),
        )
    }
}

/// Decorative background star.
///
/// Pulses its opacity between 0 and 1 and may only die at the bottom of a
/// pulse, once its lifetime has run out.
#[derive(Debug, Clone, PartialEq)]
pub struct BgStar {
    pub position: Vec2,
    pub scale: f64,
    dir: Vec2,
    move_speed: f64,
    opacity: f64,
    alpha_dir: f64,
    alpha_speed: f64,
    lifetime: f64,
    dead: bool,
}

impl BgStar {
    /// Spawns a star with random parameters inside `[min, max)`.
    pub fn spawn<R: Rng + ?Sized>(rng: &mut R, min: Vec2, max: Vec2) -> Self {
        let scale = rng.gen::<f64>() + 0.25;
        let x = min.x + (rng.gen::<f64>() * (max.x - min.x)).floor();
        let y = min.y + (rng.gen::<f64>() * (max.y - min.y)).floor();
        let dir_x = if rng.gen_bool(0.5) { -1.0 } else { 1.0 };
        let dir_y = if rng.gen_bool(0.5) { -1.0 } else { 1.0 };
        Self {
            position: Vec2::new(x, y),
            scale,
            dir: Vec2::new(dir_x, dir_y),
            move_speed: rng.gen::<f64>() * 7.0 + 3.0,
            opacity: 0.0,
            alpha_dir: 1.0,
            alpha_speed: rng.gen::<f64>() * 5.0 + 10.0,
            lifetime: (rng.gen::<f64>() * 2.0).floor() + 1.0,
            dead: false,
        }
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn lifetime(&self) -> f64 {
        self.lifetime
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// True while the opacity pulse is heading toward 1.
    pub fn is_rising(&self) -> bool {
        self.alpha_dir > 0.0
    }

    pub fn advance(&mut self, dt: f64) {
        if self.dead {
            return;
        }

        self.lifetime = (self.lifetime - dt).max(0.0);
        self.position += self.dir.scale(self.move_speed * dt);

        self.opacity += dt * self.alpha_speed * BG_STAR_ALPHA_RATE * self.alpha_dir;
        if self.opacity > 1.0 {
            self.alpha_dir = -self.alpha_dir;
            self.opacity = 1.0;
        } else if self.opacity < 0.0 {
            self.alpha_dir = -self.alpha_dir;
            self.opacity = 0.0;
            if self.lifetime == 0.0 {
                self.alpha_dir = 0.0;
                self.dead = true;
            }
        }
    }

    /// True when outside the window `[min, max]`.
    pub fn is_outside(&self, min: Vec2, max: Vec2) -> bool {
        self.position.x > max.x
            || self.position.x < min.x
            || self.position.y > max.y
            || self.position.y < min.y
    }

    pub fn draw_cmd(&self, cam: &Camera) -> DrawCmd {
        cam.place(Sprite::BgStar, self.position, 0.0)
            .with_opacity(self.opacity)
            .scaled(self.scale)
    }

    /// Screen-space placement, used by the lobby where stars do not follow a
    /// camera.
    pub fn draw_abs(&self) -> DrawCmd {
        DrawCmd::new(Sprite::BgStar, self.position)
            .with_opacity(self.opacity)
            .scaled(self.scale)
    }
}

/// The circular playable area, shrinking toward a minimum radius.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorldBoundary {
    pub radius: f64,
    pub min_radius: f64,
    pub shrink_speed: f64,
    /// Spin of the center marker; cosmetic only.
    pub angle: f64,
}

impl WorldBoundary {
    pub fn init(&mut self, radius: f64, min_radius: f64, shrink_speed: f64) {
        self.radius = radius;
        self.min_radius = min_radius;
        self.shrink_speed = shrink_speed;
    }

    pub fn advance(&mut self, dt: f64) {
        self.radius -= self.shrink_speed * dt;
        if self.radius < self.min_radius {
            self.radius = self.min_radius;
        }
        self.angle += WORLD_SPIN_RATE * dt;
    }

    /// Pulls `position` back onto the boundary if it lies outside.
    pub fn contain(&self, position: Vec2) -> Vec2 {
        let dist = position.len();
        if dist > self.radius {
            position.scale(self.radius.max(0.0) / dist)
        } else {
            position
        }
    }

    pub fn draw_cmds(&self, cam: &Camera) -> [DrawCmd; 2] {
        [
            DrawCmd::new(
                Sprite::WorldRing {
                    radius: self.radius,
                },
                cam.project(Vec2::ZERO),
            ),
            cam.place(Sprite::WorldCenter, Vec2::ZERO, self.angle)
                .scaled(WORLD_CENTER_SCALE),
        ]
    }
}
