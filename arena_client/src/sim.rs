//! Simulation loop.
//!
//! One `step(dt)` recycles background stars around the local ship,
//! dead-reckons every entity, keeps ships inside the world boundary and
//! sweeps dead effects. `draw` then emits the frame through the player-centered
//! camera. The world never decides anything authoritative: entities appear
//! and vanish only through the protocol handler.

use arena_shared::{
    config::ClientConfig,
    math::Vec2,
    render::RenderBackend,
};
use rand::{rngs::StdRng, SeedableRng};
use tracing::trace;

use crate::{
    camera::Camera,
    entity::{BgStar, Ship, WorldBoundary},
    registry::Registry,
};

/// Client-side mirror of one running game.
pub struct GameWorld {
    pub registry: Registry,
    pub boundary: WorldBoundary,
    stars: Vec<BgStar>,
    rng: StdRng,
    local_id: String,
    /// Stand-in camera target until the server creates the local ship.
    placeholder: Ship,
    screen: Vec2,
    origin: Vec2,
    compact_effects: bool,
}

impl GameWorld {
    pub fn new(local_id: &str, cfg: &ClientConfig) -> Self {
        Self::with_rng(local_id, cfg, StdRng::from_entropy())
    }

    pub fn with_rng(local_id: &str, cfg: &ClientConfig, mut rng: StdRng) -> Self {
        let screen = Vec2::new(cfg.screen_width, cfg.screen_height);
        let stars = (0..cfg.bg_star_count)
            .map(|_| BgStar::spawn(&mut rng, Vec2::ZERO, screen))
            .collect();
        Self {
            registry: Registry::new(),
            boundary: WorldBoundary::default(),
            stars,
            rng,
            local_id: local_id.to_string(),
            placeholder: Ship::placeholder(local_id),
            screen,
            origin: cfg.screen_origin(),
            compact_effects: cfg.compact_effects,
        }
    }

    pub fn local_id(&self) -> &str {
        &self.local_id
    }

    /// The local ship, or the zero-valued placeholder before its creation.
    pub fn local_ship(&self) -> &Ship {
        self.registry
            .ship(&self.local_id)
            .unwrap_or(&self.placeholder)
    }

    /// True once the server created the local ship and then killed it.
    pub fn local_dead(&self) -> bool {
        self.local_ship().is_dead()
    }

    pub fn camera(&self) -> Camera {
        let me = self.local_ship();
        Camera::new(self.origin, me.position, me.angle)
    }

    pub fn stars(&self) -> &[BgStar] {
        &self.stars
    }

    /// Advances the world by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        self.boundary.advance(dt);
        // Stars settle around where the local ship was at the start of the
        // frame.
        self.step_stars(dt);

        for ship in self.registry.ships_mut() {
            ship.advance(dt);
            ship.position = self.boundary.contain(ship.position);
        }

        for projectile in self.registry.projectiles_mut() {
            projectile.advance(dt);
        }

        for effect in self.registry.effects_mut() {
            effect.advance(dt);
        }
        if self.compact_effects {
            let swept = self.registry.sweep_effects();
            if swept > 0 {
                trace!(swept, "Swept dead effects");
            }
        }
    }

    fn step_stars(&mut self, dt: f64) {
        let center = self.local_ship().position;
        let half = self.screen.scale(0.5);
        let min = center - half;
        let max = center + half;
        for star in &mut self.stars {
            star.advance(dt);
            if star.is_dead() || star.is_outside(min, max) {
                *star = BgStar::spawn(&mut self.rng, min, max);
            }
        }
    }

    /// Emits the current frame.
    pub fn draw(&self, backend: &mut dyn RenderBackend) {
        let cam = self.camera();

        for cmd in self.boundary.draw_cmds(&cam) {
            backend.draw(cmd);
        }
        for star in &self.stars {
            backend.draw(star.draw_cmd(&cam));
        }
        for ship in self.registry.ships() {
            if ship.is_dead() {
                continue;
            }
            if ship.owner == self.local_id {
                backend.draw(cam.place_reference(ship.sprite()));
            } else if let Some(cmd) = ship.draw_cmd(&cam) {
                backend.draw(cmd);
            }
        }
        for (_, projectile) in self.registry.projectiles() {
            backend.draw(projectile.draw_cmd(&cam));
        }
        for effect in self.registry.effects() {
            if let Some(cmd) = effect.draw_cmd(&cam) {
                backend.draw(cmd);
            }
        }
    }
}
