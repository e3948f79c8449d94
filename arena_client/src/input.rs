//! Input handling.
//!
//! The host samples which keys are held each frame; this module turns that
//! set into outbound intents. Windowing and raw key events stay with the
//! host.

use arena_shared::net::{ClientMsg, Intent};

bitflags::bitflags! {
    /// Keys held during a frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Keys: u16 {
        /// `a`
        const STRAFE_LEFT = 1 << 0;
        /// `d`
        const STRAFE_RIGHT = 1 << 1;
        /// `w`
        const FORWARD = 1 << 2;
        /// `s`
        const BACK = 1 << 3;
        /// `j`
        const ROTATE_LEFT = 1 << 4;
        /// `k`
        const ROTATE_RIGHT = 1 << 5;
        /// `l`
        const FIRE = 1 << 6;
        /// space, activates the lobby button on release
        const BUTTON = 1 << 7;
    }
}

impl Keys {
    /// Maps a lower-cased key name to its flag.
    pub fn from_key_name(name: &str) -> Option<Keys> {
        let key = match name {
            "a" => Keys::STRAFE_LEFT,
            "d" => Keys::STRAFE_RIGHT,
            "w" => Keys::FORWARD,
            "s" => Keys::BACK,
            "j" => Keys::ROTATE_LEFT,
            "k" => Keys::ROTATE_RIGHT,
            "l" => Keys::FIRE,
            " " => Keys::BUTTON,
            _ => return None,
        };
        Some(key)
    }

    /// Movement intent for the held keys; opposite keys cancel out.
    ///
    /// Forward is `dir_y = -1`: the ship art faces the negative side of its
    /// forward axis.
    pub fn intent(self) -> Intent {
        let axis = |neg: Keys, pos: Keys| -> i32 {
            let mut v = 0;
            if self.contains(neg) {
                v -= 1;
            }
            if self.contains(pos) {
                v += 1;
            }
            v
        };
        Intent::new(
            axis(Keys::STRAFE_LEFT, Keys::STRAFE_RIGHT),
            axis(Keys::FORWARD, Keys::BACK),
            axis(Keys::ROTATE_LEFT, Keys::ROTATE_RIGHT),
        )
    }
}

/// Turns per-frame key state into intents.
///
/// Movement is sent only when it changes. Fire is sent on every frame where
/// the fire key was already held on the previous frame.
#[derive(Debug, Default)]
pub struct InputSampler {
    last_intent: Intent,
    last_fire: bool,
    last_button: bool,
}

impl InputSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples gameplay intents for one frame.
    pub fn sample(&mut self, keys: Keys) -> Vec<ClientMsg> {
        let mut out = Vec::new();

        let intent = keys.intent();
        if intent != self.last_intent {
            out.push(ClientMsg::MoveIntent(intent));
        }
        self.last_intent = intent;

        let fire = keys.contains(Keys::FIRE);
        if self.last_fire && fire {
            out.push(ClientMsg::FireIntent);
        }
        self.last_fire = fire;

        out
    }

    /// True on the frame the button key is let go.
    pub fn button_released(&mut self, keys: Keys) -> bool {
        let held = keys.contains(Keys::BUTTON);
        let released = self.last_button && !held;
        self.last_button = held;
        released
    }
}
