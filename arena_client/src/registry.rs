//! Entity registry.
//!
//! Ships and projectiles are keyed by their server identity and iterate in
//! insertion order. Effects live in a plain list and are swept lazily.
//! Every id-based mutation on an unknown id is a silent no-op: the server may
//! legitimately reference entities this client never saw.

use std::collections::HashMap;

use arena_shared::net::{ProjectileSpawn, ShipSnapshot, ShipSpawn};

use crate::entity::{Effect, Projectile, Ship};

/// Insertion-ordered map keyed by string id.
///
/// Re-inserting an existing id replaces the value in place, keeping its slot.
#[derive(Debug, Clone)]
pub struct Keyed<T> {
    items: Vec<(String, T)>,
    index: HashMap<String, usize>,
}

impl<T> Default for Keyed<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> Keyed<T> {
    pub fn insert(&mut self, id: &str, value: T) {
        match self.index.get(id) {
            Some(&slot) => self.items[slot].1 = value,
            None => {
                self.index.insert(id.to_string(), self.items.len());
                self.items.push((id.to_string(), value));
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<T> {
        let slot = self.index.remove(id)?;
        let (_, value) = self.items.remove(slot);
        for (_, i) in self.index.iter_mut() {
            if *i > slot {
                *i -= 1;
            }
        }
        Some(value)
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|&slot| &self.items[slot].1)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        match self.index.get(id) {
            Some(&slot) => Some(&mut self.items[slot].1),
            None => None,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut T)> {
        self.items.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.index.clear();
    }
}

/// Live entity set of one game.
#[derive(Debug, Default)]
pub struct Registry {
    ships: Keyed<Ship>,
    projectiles: Keyed<Projectile>,
    effects: Vec<Effect>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates (or replaces) the ship of `owner`.
    pub fn create_ship(&mut self, owner: &str, spawn: &ShipSpawn) {
        self.ships.insert(owner, Ship::spawn(owner, spawn));
    }

    /// Overwrites the full state of `owner`'s ship. Returns whether it exists.
    pub fn move_ship(&mut self, owner: &str, snapshot: &ShipSnapshot) -> bool {
        match self.ships.get_mut(owner) {
            Some(ship) => {
                ship.apply_snapshot(snapshot);
                true
            }
            None => false,
        }
    }

    /// Flags `owner`'s ship dead; the entry stays in the registry.
    ///
    /// Returns the ship as it was at the moment of death.
    pub fn mark_ship_dead(&mut self, owner: &str) -> Option<&Ship> {
        let ship = self.ships.get_mut(owner)?;
        ship.mark_dead();
        Some(&*ship)
    }

    pub fn create_projectile(&mut self, id: &str, owner: &str, spawn: &ProjectileSpawn) {
        self.projectiles.insert(id, Projectile::spawn(owner, spawn));
    }

    /// Removes projectile `id`. Returns whether it existed.
    pub fn destroy_projectile(&mut self, id: &str) -> bool {
        self.projectiles.remove(id).is_some()
    }

    pub fn push_effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    /// Drops dead effects. Returns how many were removed.
    pub fn sweep_effects(&mut self) -> usize {
        let before = self.effects.len();
        self.effects.retain(|e| !e.is_dead());
        before - self.effects.len()
    }

    pub fn ship(&self, owner: &str) -> Option<&Ship> {
        self.ships.get(owner)
    }

    pub fn projectile(&self, id: &str) -> Option<&Projectile> {
        self.projectiles.get(id)
    }

    pub fn ships(&self) -> impl Iterator<Item = &Ship> {
        self.ships.iter().map(|(_, s)| s)
    }

    pub fn ships_mut(&mut self) -> impl Iterator<Item = &mut Ship> {
        self.ships.iter_mut().map(|(_, s)| s)
    }

    pub fn projectiles(&self) -> impl Iterator<Item = (&str, &Projectile)> {
        self.projectiles.iter()
    }

    pub fn projectiles_mut(&mut self) -> impl Iterator<Item = &mut Projectile> {
        self.projectiles.iter_mut().map(|(_, p)| p)
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn effects_mut(&mut self) -> &mut [Effect] {
        &mut self.effects
    }

    pub fn ship_count(&self) -> usize {
        self.ships.len()
    }

    pub fn projectile_count(&self) -> usize {
        self.projectiles.len()
    }

    pub fn clear(&mut self) {
        self.ships.clear();
        self.projectiles.clear();
        self.effects.clear();
    }
}
