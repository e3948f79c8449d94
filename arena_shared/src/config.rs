//! Configuration system.
//!
//! Loads client configuration from JSON strings/files (file IO left to app).

use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// Root configuration for the client runtime and the bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server address, e.g. `127.0.0.1:8080`.
    pub server_addr: String,
    /// Render/simulation frame rate.
    pub frame_hz: u32,
    /// Logical screen size in world units.
    pub screen_width: f64,
    pub screen_height: f64,
    /// The local ship is drawn this far below the screen center.
    pub screen_origin_y_offset: f64,
    /// Number of decorative background stars per scene.
    pub bg_star_count: usize,
    /// Drop dead explosion effects every frame instead of keeping them around.
    pub compact_effects: bool,
    /// Delay between `start` and the bot's first action.
    pub bot_start_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:8080".to_string(),
            frame_hz: 60,
            screen_width: 960.0,
            screen_height: 720.0,
            screen_origin_y_offset: 100.0,
            bg_star_count: 15,
            compact_effects: true,
            bot_start_delay_ms: 1500,
        }
    }
}

impl ClientConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Screen position where the local ship is drawn.
    pub fn screen_origin(&self) -> Vec2 {
        Vec2::new(
            self.screen_width / 2.0,
            self.screen_height / 2.0 + self.screen_origin_y_offset,
        )
    }
}
