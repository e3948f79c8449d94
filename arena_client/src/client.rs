//! Client session.
//!
//! `GameClient` owns the transport and the active scene. Each `frame`:
//! - drains every queued inbound message and dispatches it
//! - advances and draws the active scene
//! - flushes the intents that frame produced
//!
//! Inbound handling and the frame tick never interleave, so the registry
//! needs no locking.

use std::fmt;

use anyhow::Context;
use arena_shared::{
    config::ClientConfig,
    net::{ClientMsg, ServerMsg, Transport},
    render::RenderBackend,
};
use tracing::{debug, info, warn};

use crate::{
    input::{InputSampler, Keys},
    scene::{GameScene, LobbyScene, LobbyStatus},
};

/// Which scene the session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Connected, waiting for the server to assign an id.
    AwaitingHello,
    /// In the lobby; may already be fading out towards a started game.
    Lobby,
    Game,
}

/// Actions refused because the session is in the wrong phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No `hello` received yet.
    NotConnected,
    /// The lobby button only exists in the lobby.
    NotInLobby,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotConnected => write!(f, "no client id assigned yet"),
            SessionError::NotInLobby => write!(f, "not in the lobby"),
        }
    }
}

impl std::error::Error for SessionError {}

/// High-level game client.
pub struct GameClient<T: Transport> {
    cfg: ClientConfig,
    transport: T,
    phase: SessionPhase,
    client_id: Option<String>,
    lobby: Option<LobbyScene>,
    game: Option<GameScene>,
    input: InputSampler,
    reload: bool,
}

impl<T: Transport> GameClient<T> {
    pub fn new(cfg: ClientConfig, transport: T) -> Self {
        Self {
            cfg,
            transport,
            phase: SessionPhase::AwaitingHello,
            client_id: None,
            lobby: None,
            game: None,
            input: InputSampler::new(),
            reload: false,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn lobby(&self) -> Option<&LobbyScene> {
        self.lobby.as_ref()
    }

    pub fn game(&self) -> Option<&GameScene> {
        self.game.as_ref()
    }

    /// Returns true once after the server forced a reset.
    pub fn take_reload(&mut self) -> bool {
        std::mem::take(&mut self.reload)
    }

    /// Swaps the transport, e.g. after reconnecting. The session keeps its
    /// phase; call after a reset to start over from `hello`.
    pub fn set_transport(&mut self, transport: T) {
        self.transport = transport;
    }

    /// Drains and dispatches every queued inbound message.
    pub fn poll(&mut self) {
        while let Some(wire) = self.transport.try_recv() {
            match ServerMsg::from_wire(&wire) {
                Some(msg) => self.handle_msg(msg),
                None => debug!(kind = %wire.kind, "Ignoring message"),
            }
        }
    }

    fn handle_msg(&mut self, msg: ServerMsg) {
        match msg {
            ServerMsg::Hello { client_id } => {
                info!(client_id = %client_id, "Assigned client id");
                self.client_id = Some(client_id);
                self.lobby = Some(LobbyScene::new(&self.cfg));
                self.game = None;
                self.phase = SessionPhase::Lobby;
            }
            ServerMsg::Error => {
                warn!(phase = ?self.phase, "Server error, resetting session");
                self.reset();
            }
            ServerMsg::Ready => match self.lobby.as_mut() {
                Some(lobby) if self.phase == SessionPhase::Lobby => lobby.on_ready_ack(),
                _ => debug!(phase = ?self.phase, "Ready ack outside lobby"),
            },
            ServerMsg::Cancel => match self.lobby.as_mut() {
                Some(lobby) if self.phase == SessionPhase::Lobby => lobby.on_cancel_ack(),
                _ => debug!(phase = ?self.phase, "Cancel ack outside lobby"),
            },
            ServerMsg::Start => self.start_game(),
            ServerMsg::Game(event) => match self.game.as_mut() {
                Some(game) => game.handle(&event),
                None => debug!(?event, "Game event without a game"),
            },
        }
    }

    fn start_game(&mut self) {
        let (Some(id), Some(lobby)) = (self.client_id.as_deref(), self.lobby.as_mut()) else {
            debug!(phase = ?self.phase, "Start outside lobby");
            return;
        };
        if self.game.is_some() {
            debug!("Duplicate start");
            return;
        }
        info!(client_id = %id, "Match starting");
        lobby.begin_fade_out();
        self.game = Some(GameScene::new(id, &self.cfg));
    }

    fn reset(&mut self) {
        self.phase = SessionPhase::AwaitingHello;
        self.client_id = None;
        self.lobby = None;
        self.game = None;
        self.input = InputSampler::new();
        self.reload = true;
    }

    /// Activates the lobby button as if the player released it.
    ///
    /// Returns whether a request went out.
    pub fn press_button(&mut self) -> anyhow::Result<bool> {
        let msg = match self.phase {
            SessionPhase::AwaitingHello => return Err(SessionError::NotConnected.into()),
            SessionPhase::Game => return Err(SessionError::NotInLobby.into()),
            SessionPhase::Lobby => self.lobby.as_mut().and_then(LobbyScene::press_button),
        };
        match msg {
            Some(msg) => {
                self.send(msg)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Runs one frame: inbound messages, scene update, draw, outbound intents.
    pub fn frame(
        &mut self,
        dt: f64,
        keys: Keys,
        backend: &mut dyn RenderBackend,
    ) -> anyhow::Result<()> {
        self.poll();

        let mut outbound = Vec::new();
        backend.begin_frame();
        match self.phase {
            SessionPhase::AwaitingHello => {}
            SessionPhase::Lobby => {
                let released = self.input.button_released(keys);
                if let Some(lobby) = self.lobby.as_mut() {
                    if released {
                        outbound.extend(lobby.press_button());
                    }
                    lobby.update(dt);
                    if lobby.is_ended() && self.game.is_some() {
                        debug!("Lobby faded out, entering game");
                        self.phase = SessionPhase::Game;
                        self.lobby = None;
                        outbound.push(ClientMsg::GameInit);
                    } else {
                        lobby.draw(backend);
                    }
                }
            }
            SessionPhase::Game => {}
        }
        if self.phase == SessionPhase::Game {
            if let Some(game) = self.game.as_mut() {
                outbound.extend(game.update(dt, keys));
                game.draw(backend);
            }
        }
        backend.end_frame();

        for msg in outbound {
            self.send(msg)?;
        }
        Ok(())
    }

    /// True while the lobby waits for the player to queue up.
    pub fn lobby_idle(&self) -> bool {
        self.phase == SessionPhase::Lobby
            && self
                .lobby
                .as_ref()
                .is_some_and(|l| l.status() == LobbyStatus::Steady)
    }

    fn send(&mut self, msg: ClientMsg) -> anyhow::Result<()> {
        let Some(id) = self.client_id.as_deref() else {
            debug!(?msg, "Dropping message before hello");
            return Ok(());
        };
        self.transport
            .send(msg.to_wire(id))
            .with_context(|| format!("send {msg:?}"))
    }
}
