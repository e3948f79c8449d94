//! `arena_client`
//!
//! Client-side systems:
//! - Session and scene management (lobby, game)
//! - Entity mirror of the server's world with dead-reckoning between updates
//! - Player-centered camera and draw command emission
//! - Keyboard intents
//! - Scripted bot player

pub mod bot;
pub mod camera;
pub mod client;
pub mod entity;
pub mod handler;
pub mod input;
pub mod registry;
pub mod scene;
pub mod sim;

pub use client::GameClient;
