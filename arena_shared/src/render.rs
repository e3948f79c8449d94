//! Rendering abstraction.
//!
//! This crate intentionally does not depend on a graphics backend.
//! The simulation emits `DrawCmd`s already transformed into screen space;
//! a backend only has to blit sprites.

use crate::math::{Vec2, GAME_OBJECT_SIZE};

/// Ship sprite frame, picked from the rotation intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Straight,
    Left,
    Right,
}

impl Turn {
    pub fn from_dir(dir_r: i8) -> Self {
        match dir_r {
            d if d < 0 => Turn::Left,
            d if d > 0 => Turn::Right,
            _ => Turn::Straight,
        }
    }
}

/// Kinds of locally spawned visual effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Explosion,
}

/// End-of-game overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Banner {
    Victory,
    GameOver,
}

/// Lobby button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonKind {
    Start,
    Cancel,
}

/// What to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sprite {
    Ship {
        palette: usize,
        turn: Turn,
        boosting: bool,
    },
    Projectile {
        index: usize,
    },
    Effect(EffectKind),
    BgStar,
    WorldCenter,
    /// Boundary circle; radius already in screen units.
    WorldRing {
        radius: f64,
    },
    TitleShip {
        boosting: bool,
    },
    Title,
    Button {
        kind: ButtonKind,
        pressed: bool,
    },
    Banner(Banner),
    /// Full-screen fade mask; `opacity` is how much of the scene shows.
    Fade,
}

/// One sprite placement in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCmd {
    pub sprite: Sprite,
    pub position: Vec2,
    pub rotation: f64,
    pub opacity: f64,
    pub scale: f64,
}

impl DrawCmd {
    pub fn new(sprite: Sprite, position: Vec2) -> Self {
        Self {
            sprite,
            position,
            rotation: 0.0,
            opacity: 1.0,
            scale: 1.0,
        }
    }

    pub fn rotated(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn scaled(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Side of the square the sprite covers, in world units.
    pub fn footprint(&self) -> f64 {
        GAME_OBJECT_SIZE * self.scale
    }
}

/// A minimal rendering API.
pub trait RenderBackend {
    fn begin_frame(&mut self);
    fn draw(&mut self, cmd: DrawCmd);
    fn end_frame(&mut self);
}

/// A no-op renderer useful for headless runs.
#[derive(Default)]
pub struct NullRenderer;

impl RenderBackend for NullRenderer {
    fn begin_frame(&mut self) {}
    fn draw(&mut self, _cmd: DrawCmd) {}
    fn end_frame(&mut self) {}
}

/// Keeps the draw list of the last finished frame.
#[derive(Default, Debug)]
pub struct FrameRecorder {
    pending: Vec<DrawCmd>,
    pub last_frame: Vec<DrawCmd>,
    pub frames: u64,
}

impl FrameRecorder {
    /// Draw commands of the last frame matching `pred`.
    pub fn find<'a>(&'a self, pred: impl Fn(&Sprite) -> bool + 'a) -> impl Iterator<Item = &'a DrawCmd> + 'a {
        self.last_frame.iter().filter(move |c| pred(&c.sprite))
    }
}

impl RenderBackend for FrameRecorder {
    fn begin_frame(&mut self) {
        self.pending.clear();
    }

    fn draw(&mut self, cmd: DrawCmd) {
        self.pending.push(cmd);
    }

    fn end_frame(&mut self) {
        self.last_frame = std::mem::take(&mut self.pending);
        self.frames += 1;
    }
}
