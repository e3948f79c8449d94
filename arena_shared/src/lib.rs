//! `arena_shared`
//!
//! Shared libraries used by the arena client and its tooling.
//!
//! Design goals:
//! - Deterministic and modular where practical.
//! - Clear separation of concerns (net, math, config, render).
//! - Traits at the transport and render seams.
//! - No `unsafe`.

pub mod config;
pub mod math;
pub mod net;
pub mod render;
