//! Scene state machines.
//!
//! Lobby: `FadeIn -> Steady -> ReadyWait -> Ready -> CancelWait -> Steady`,
//! then `FadeOut -> End` once the server starts the match.
//! Game: `FadeIn -> Steady -> End(outcome)`.
//!
//! Fades only move an opacity number; a backend turns it into pixels.

use arena_shared::{
    config::ClientConfig,
    math::Vec2,
    net::{ClientMsg, GameEvent},
    render::{Banner, ButtonKind, DrawCmd, RenderBackend, Sprite},
};
use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info};

use crate::{
    entity::BgStar,
    handler::{apply_event, Outcome},
    input::{InputSampler, Keys},
    sim::GameWorld,
};

/// Opacity change per second while fading.
const FADE_RATE: f64 = 0.5;
/// Downward star scroll in the lobby while the title ship boosts.
const LOBBY_STAR_SCROLL: f64 = 300.0;
/// Downward slide of the title block while the lobby fades out.
const TITLE_SLIDE: f64 = 200.0;
/// Outcome banner opacity change per second.
const BANNER_RATE: f64 = 1.0;

/// Lobby scene state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyStatus {
    FadeIn,
    Steady,
    /// `ready` sent, waiting for the acknowledgement.
    ReadyWait,
    /// Queued for a match.
    Ready,
    /// `cancel` sent, waiting for the acknowledgement.
    CancelWait,
    FadeOut,
    End,
}

/// Pre-game lobby with a single start/cancel button.
pub struct LobbyScene {
    status: LobbyStatus,
    opacity: f64,
    button: ButtonKind,
    button_pressed: bool,
    title_offset: f64,
    stars: Vec<BgStar>,
    rng: StdRng,
    screen: Vec2,
}

impl LobbyScene {
    pub fn new(cfg: &ClientConfig) -> Self {
        Self::with_rng(cfg, StdRng::from_entropy())
    }

    pub fn with_rng(cfg: &ClientConfig, mut rng: StdRng) -> Self {
        let screen = Vec2::new(cfg.screen_width, cfg.screen_height);
        let stars = (0..cfg.bg_star_count)
            .map(|_| BgStar::spawn(&mut rng, Vec2::ZERO, screen))
            .collect();
        Self {
            status: LobbyStatus::FadeIn,
            opacity: 0.0,
            button: ButtonKind::Start,
            button_pressed: false,
            title_offset: 0.0,
            stars,
            rng,
            screen,
        }
    }

    pub fn status(&self) -> LobbyStatus {
        self.status
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn button(&self) -> ButtonKind {
        self.button
    }

    pub fn is_ended(&self) -> bool {
        self.status == LobbyStatus::End
    }

    /// The title ship boosts while queued or leaving.
    pub fn is_boosting(&self) -> bool {
        matches!(
            self.status,
            LobbyStatus::Ready | LobbyStatus::CancelWait | LobbyStatus::FadeOut
        )
    }

    /// Activates the current button. Returns the request to send, if any.
    pub fn press_button(&mut self) -> Option<ClientMsg> {
        if matches!(self.status, LobbyStatus::FadeOut | LobbyStatus::End) {
            return None;
        }
        match self.button {
            ButtonKind::Start => {
                if self.status == LobbyStatus::ReadyWait {
                    return None;
                }
                self.status = LobbyStatus::ReadyWait;
                self.button_pressed = true;
                Some(ClientMsg::Ready)
            }
            ButtonKind::Cancel => {
                if self.status == LobbyStatus::CancelWait {
                    return None;
                }
                self.status = LobbyStatus::CancelWait;
                self.button_pressed = true;
                Some(ClientMsg::Cancel)
            }
        }
    }

    /// Server accepted the ready request.
    pub fn on_ready_ack(&mut self) {
        if self.is_leaving() {
            return;
        }
        self.status = LobbyStatus::Ready;
        self.button = ButtonKind::Cancel;
        self.button_pressed = false;
    }

    /// Server accepted the cancel request.
    pub fn on_cancel_ack(&mut self) {
        if self.is_leaving() {
            return;
        }
        self.status = LobbyStatus::Steady;
        self.button = ButtonKind::Start;
        self.button_pressed = false;
    }

    /// Match found; the button goes away and the scene fades out.
    pub fn begin_fade_out(&mut self) {
        if !self.is_leaving() {
            self.status = LobbyStatus::FadeOut;
        }
    }

    fn is_leaving(&self) -> bool {
        matches!(self.status, LobbyStatus::FadeOut | LobbyStatus::End)
    }

    pub fn update(&mut self, dt: f64) {
        match self.status {
            LobbyStatus::End => return,
            LobbyStatus::FadeOut => {
                self.title_offset += TITLE_SLIDE * dt;
                self.opacity = (self.opacity - FADE_RATE * dt).max(0.0);
                if self.opacity == 0.0 {
                    self.status = LobbyStatus::End;
                }
            }
            _ => {
                self.opacity = (self.opacity + FADE_RATE * dt).min(1.0);
                if self.status == LobbyStatus::FadeIn && self.opacity == 1.0 {
                    self.status = LobbyStatus::Steady;
                }
            }
        }

        let boosting = self.is_boosting();
        for star in &mut self.stars {
            if boosting {
                star.position.y += LOBBY_STAR_SCROLL * dt;
            }
            star.advance(dt);
            if star.is_dead() || star.is_outside(Vec2::ZERO, self.screen) {
                *star = BgStar::spawn(&mut self.rng, Vec2::ZERO, self.screen);
            }
        }
    }

    pub fn draw(&self, backend: &mut dyn RenderBackend) {
        if self.status == LobbyStatus::End {
            return;
        }
        for star in &self.stars {
            backend.draw(star.draw_abs());
        }

        let center = self.screen.scale(0.5);
        let title = Vec2::new(center.x, center.y - 40.0);
        backend.draw(DrawCmd::new(
            Sprite::TitleShip {
                boosting: self.is_boosting(),
            },
            title,
        ));
        backend.draw(DrawCmd::new(
            Sprite::Title,
            Vec2::new(title.x, title.y + self.title_offset),
        ));
        backend.draw(DrawCmd::new(
            Sprite::Button {
                kind: self.button,
                pressed: self.button_pressed,
            },
            Vec2::new(center.x, center.y + 100.0 + self.title_offset),
        ));

        if self.opacity < 1.0 {
            backend.draw(DrawCmd::new(Sprite::Fade, Vec2::ZERO).with_opacity(self.opacity));
        }
    }
}

/// Game scene state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    FadeIn,
    Steady,
    End(Outcome),
}

/// In-game scene: the world mirror plus local input.
pub struct GameScene {
    status: GameStatus,
    opacity: f64,
    banner_opacity: f64,
    world: GameWorld,
    input: InputSampler,
    origin: Vec2,
}

impl GameScene {
    pub fn new(local_id: &str, cfg: &ClientConfig) -> Self {
        Self::with_world(GameWorld::new(local_id, cfg), cfg)
    }

    pub fn with_world(world: GameWorld, cfg: &ClientConfig) -> Self {
        Self {
            status: GameStatus::FadeIn,
            opacity: 0.0,
            banner_opacity: 0.0,
            world,
            input: InputSampler::new(),
            origin: Vec2::new(cfg.screen_width / 2.0, cfg.screen_height / 2.0 - 40.0),
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.status {
            GameStatus::End(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn world(&self) -> &GameWorld {
        &self.world
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn banner_opacity(&self) -> f64 {
        self.banner_opacity
    }

    /// Local input is live only while the game runs and the local ship lives.
    pub fn accepts_input(&self) -> bool {
        !matches!(self.status, GameStatus::End(_)) && !self.world.local_dead()
    }

    /// Applies an in-game event.
    ///
    /// The first terminal outcome wins: a victory arriving after the local
    /// ship died does not turn the game over screen into a win. Once ended,
    /// the world is frozen and later events are dropped.
    pub fn handle(&mut self, event: &GameEvent) {
        if let GameStatus::End(first) = self.status {
            debug!(?first, ?event, "Game already over, dropping event");
            return;
        }
        if let Some(outcome) = apply_event(&mut self.world, event) {
            info!(?outcome, local_id = %self.world.local_id(), "Game over");
            self.status = GameStatus::End(outcome);
        }
    }

    /// Advances one frame and returns the intents to send.
    ///
    /// Once the game ended the world stays frozen on its last frame; only the
    /// outcome banner keeps fading in.
    pub fn update(&mut self, dt: f64, keys: Keys) -> Vec<ClientMsg> {
        if let GameStatus::End(_) = self.status {
            self.banner_opacity = (self.banner_opacity + BANNER_RATE * dt).min(1.0);
            return Vec::new();
        }

        let intents = if self.accepts_input() {
            self.input.sample(keys)
        } else {
            Vec::new()
        };

        self.world.step(dt);

        if self.status == GameStatus::FadeIn {
            self.opacity = (self.opacity + FADE_RATE * dt).min(1.0);
            if self.opacity == 1.0 {
                self.status = GameStatus::Steady;
            }
        }
        intents
    }

    pub fn draw(&self, backend: &mut dyn RenderBackend) {
        self.world.draw(backend);
        if let GameStatus::End(outcome) = self.status {
            let banner = match outcome {
                Outcome::Victory => Banner::Victory,
                Outcome::GameOver => Banner::GameOver,
            };
            backend.draw(
                DrawCmd::new(Sprite::Banner(banner), self.origin).with_opacity(self.banner_opacity),
            );
        }
        if self.opacity < 1.0 {
            backend.draw(DrawCmd::new(Sprite::Fade, Vec2::ZERO).with_opacity(self.opacity));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_shared::{net::ShipSpawn, render::FrameRecorder};

    fn lobby() -> LobbyScene {
        LobbyScene::with_rng(&ClientConfig::default(), StdRng::seed_from_u64(5))
    }

    fn game() -> GameScene {
        let cfg = ClientConfig::default();
        GameScene::with_world(
            GameWorld::with_rng("me", &cfg, StdRng::seed_from_u64(5)),
            &cfg,
        )
    }

    fn create(owner: &str) -> GameEvent {
        GameEvent::ShipCreated {
            owner: owner.into(),
            spawn: ShipSpawn {
                move_speed: 100.0,
                rotate_speed: 1.0,
                ..ShipSpawn::default()
            },
        }
    }

    #[test]
    fn lobby_fades_in_to_steady() {
        let mut l = lobby();
        assert_eq!(l.status(), LobbyStatus::FadeIn);
        l.update(1.0);
        assert_eq!(l.status(), LobbyStatus::FadeIn);
        l.update(1.0);
        assert_eq!(l.status(), LobbyStatus::Steady);
        assert_eq!(l.opacity(), 1.0);
    }

    #[test]
    fn lobby_ready_cancel_cycle() {
        let mut l = lobby();
        l.update(2.0);
        assert_eq!(l.press_button(), Some(ClientMsg::Ready));
        assert_eq!(l.status(), LobbyStatus::ReadyWait);
        assert_eq!(l.press_button(), None);

        l.on_ready_ack();
        assert_eq!(l.status(), LobbyStatus::Ready);
        assert_eq!(l.button(), ButtonKind::Cancel);
        assert!(l.is_boosting());

        assert_eq!(l.press_button(), Some(ClientMsg::Cancel));
        assert_eq!(l.status(), LobbyStatus::CancelWait);
        assert_eq!(l.press_button(), None);

        l.on_cancel_ack();
        assert_eq!(l.status(), LobbyStatus::Steady);
        assert_eq!(l.button(), ButtonKind::Start);
        assert!(!l.is_boosting());
    }

    #[test]
    fn lobby_fade_out_ends_and_disables_button() {
        let mut l = lobby();
        l.update(2.0);
        l.press_button();
        l.on_ready_ack();
        l.begin_fade_out();
        assert_eq!(l.status(), LobbyStatus::FadeOut);
        assert_eq!(l.press_button(), None);
        l.on_cancel_ack();
        assert_eq!(l.status(), LobbyStatus::FadeOut);

        l.update(1.0);
        assert_eq!(l.status(), LobbyStatus::FadeOut);
        l.update(1.0);
        assert!(l.is_ended());

        let mut rec = FrameRecorder::default();
        rec.begin_frame();
        l.draw(&mut rec);
        rec.end_frame();
        assert!(rec.last_frame.is_empty());
    }

    #[test]
    fn lobby_stars_stay_on_screen() {
        let mut l = lobby();
        l.update(2.0);
        l.press_button();
        l.on_ready_ack();
        for _ in 0..120 {
            l.update(1.0 / 60.0);
            assert!(l
                .stars
                .iter()
                .all(|s| !s.is_outside(Vec2::ZERO, l.screen)));
        }
    }

    #[test]
    fn game_fades_in_then_steady() {
        let mut g = game();
        g.update(1.0, Keys::empty());
        assert_eq!(g.status(), GameStatus::FadeIn);
        g.update(1.0, Keys::empty());
        assert_eq!(g.status(), GameStatus::Steady);
    }

    #[test]
    fn death_before_victory_stays_game_over() {
        let mut g = game();
        g.handle(&create("me"));
        g.handle(&GameEvent::ShipDied { owner: "me".into() });
        g.handle(&GameEvent::Victory);
        assert_eq!(g.outcome(), Some(Outcome::GameOver));
    }

    #[test]
    fn victory_is_terminal() {
        let mut g = game();
        g.handle(&create("me"));
        g.handle(&GameEvent::Victory);
        g.handle(&GameEvent::ShipDied { owner: "me".into() });
        assert_eq!(g.outcome(), Some(Outcome::Victory));
    }

    #[test]
    fn late_events_do_not_touch_the_final_frame() {
        let mut g = game();
        g.handle(&GameEvent::WorldInit {
            radius: 1000.0,
            min_radius: 100.0,
            shrink_speed: 5.0,
        });
        g.handle(&create("me"));
        g.handle(&create("other"));
        g.update(0.5, Keys::empty());
        g.handle(&GameEvent::Victory);

        let scene_cmds = |g: &GameScene| {
            let mut rec = FrameRecorder::default();
            rec.begin_frame();
            g.draw(&mut rec);
            rec.end_frame();
            rec.last_frame
                .into_iter()
                .filter(|c| !matches!(c.sprite, Sprite::Banner(_)))
                .collect::<Vec<_>>()
        };
        let before = scene_cmds(&g);

        // The winner's stop-move and a straggling death arrive after victory.
        g.handle(&GameEvent::ShipMoved {
            owner: "me".into(),
            snapshot: arena_shared::net::ShipSnapshot {
                position: Vec2::new(300.0, 0.0),
                angle: 1.0,
                intent: arena_shared::net::Intent::NONE,
            },
        });
        g.handle(&GameEvent::ShipDied {
            owner: "other".into(),
        });
        for _ in 0..300 {
            g.update(1.0 / 60.0, Keys::empty());
        }

        assert_eq!(scene_cmds(&g), before);
        assert!(g.world().registry.effects().is_empty());
        assert!(!g.world().registry.ship("other").unwrap().is_dead());
    }

    #[test]
    fn ended_game_is_frozen_but_banner_fades_in() {
        let mut g = game();
        g.handle(&create("me"));
        g.handle(&create("other"));
        g.handle(&GameEvent::ShipMoved {
            owner: "other".into(),
            snapshot: arena_shared::net::ShipSnapshot {
                position: Vec2::new(1.0, 1.0),
                angle: 0.0,
                intent: arena_shared::net::Intent::new(1, 0, 0),
            },
        });
        g.handle(&GameEvent::WorldInit {
            radius: 1000.0,
            min_radius: 10.0,
            shrink_speed: 0.0,
        });
        g.handle(&GameEvent::Victory);

        let before = g.world().registry.ship("other").unwrap().position;
        assert!(g.update(0.4, Keys::FIRE | Keys::FORWARD).is_empty());
        g.update(0.4, Keys::FIRE);
        assert_eq!(g.world().registry.ship("other").unwrap().position, before);
        assert!((g.banner_opacity() - 0.8).abs() < 1e-12);
        g.update(1.0, Keys::empty());
        assert_eq!(g.banner_opacity(), 1.0);

        let mut rec = FrameRecorder::default();
        rec.begin_frame();
        g.draw(&mut rec);
        rec.end_frame();
        let banner = rec
            .find(|s| matches!(s, Sprite::Banner(Banner::Victory)))
            .next()
            .unwrap();
        assert_eq!(banner.opacity, 1.0);
    }

    #[test]
    fn dead_local_ship_sends_no_intents() {
        let mut g = game();
        g.handle(&create("me"));
        g.handle(&create("other"));
        assert_eq!(g.update(0.01, Keys::STRAFE_LEFT).len(), 1);
        g.handle(&GameEvent::ShipDied { owner: "me".into() });
        assert!(!g.accepts_input());
        assert!(g.update(0.01, Keys::STRAFE_RIGHT).is_empty());
    }
}
