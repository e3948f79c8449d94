//! Protocol handler.
//!
//! A pure dispatcher: one in-game event in, zero or more registry mutations
//! out. Nothing here blocks, retries or fails; references to entities this
//! client does not know are dropped.

use arena_shared::{net::GameEvent, render::EffectKind};
use tracing::debug;

use crate::{entity::Effect, sim::GameWorld};

/// Terminal result of a game for the local player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Victory,
    GameOver,
}

/// Applies one in-game event to `world`.
///
/// Returns the terminal outcome the event implies for the local player.
pub fn apply_event(world: &mut GameWorld, event: &GameEvent) -> Option<Outcome> {
    match event {
        GameEvent::WorldInit {
            radius,
            min_radius,
            shrink_speed,
        } => {
            debug!(radius, min_radius, shrink_speed, "World init");
            world.boundary.init(*radius, *min_radius, *shrink_speed);
            None
        }
        GameEvent::Victory => Some(Outcome::Victory),
        GameEvent::ShipCreated { owner, spawn } => {
            debug!(owner = %owner, palette = spawn.palette, "Ship created");
            world.registry.create_ship(owner, spawn);
            None
        }
        GameEvent::ShipDied { owner } => {
            let explosion = world
                .registry
                .mark_ship_dead(owner)
                .map(|ship| Effect::new(owner.as_str(), EffectKind::Explosion, ship.position, ship.angle));
            match explosion {
                Some(effect) => world.registry.push_effect(effect),
                None => debug!(owner = %owner, "Death of unknown ship"),
            }
            (owner == world.local_id()).then_some(Outcome::GameOver)
        }
        GameEvent::ShipMoved { owner, snapshot } => {
            if !world.registry.move_ship(owner, snapshot) {
                debug!(owner = %owner, "Move for unknown ship");
            }
            None
        }
        GameEvent::ProjectileCreated { id, owner, spawn } => {
            world.registry.create_projectile(id, owner, spawn);
            None
        }
        GameEvent::ProjectileDestroyed { id } => {
            if !world.registry.destroy_projectile(id) {
                debug!(id = %id, "Destroy for unknown projectile");
            }
            None
        }
    }
}
