//! Shared helpers for the integration tests.
//!
//! `ScriptedServer` plays the server side of an in-process session: tests
//! push typed server messages and read back what the client sent.

use arena_client::{input::Keys, GameClient};
use arena_shared::{
    config::ClientConfig,
    math::Vec2,
    net::{ChannelTransport, ClientMsg, GameEvent, ServerMsg, ShipSpawn, Transport},
    render::FrameRecorder,
};

/// Installs a test-friendly subscriber once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

/// Server end of a `ChannelTransport` pair.
pub struct ScriptedServer {
    conn: ChannelTransport,
    client_id: String,
}

impl ScriptedServer {
    pub fn new(conn: ChannelTransport, client_id: &str) -> Self {
        Self {
            conn,
            client_id: client_id.to_string(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn push(&mut self, msg: ServerMsg) -> anyhow::Result<()> {
        self.conn.send(msg.to_wire(&self.client_id))
    }

    pub fn push_event(&mut self, event: GameEvent) -> anyhow::Result<()> {
        self.push(ServerMsg::Game(event))
    }

    pub fn hello(&mut self) -> anyhow::Result<()> {
        let client_id = self.client_id.clone();
        self.push(ServerMsg::Hello { client_id })
    }

    /// Everything the client sent since the last call, decoded.
    pub fn drain(&mut self) -> Vec<ClientMsg> {
        std::iter::from_fn(|| self.conn.try_recv())
            .filter_map(|w| ClientMsg::from_wire(&w))
            .collect()
    }
}

/// A fresh session wired to a scripted server.
pub fn session(cfg: ClientConfig, client_id: &str) -> (GameClient<ChannelTransport>, ScriptedServer) {
    let (client, server) = ChannelTransport::pair();
    (GameClient::new(cfg, client), ScriptedServer::new(server, client_id))
}

/// Runs frames of `dt` until `done` holds or `max` frames passed.
pub fn run_until(
    client: &mut GameClient<ChannelTransport>,
    dt: f64,
    max: usize,
    mut done: impl FnMut(&GameClient<ChannelTransport>) -> bool,
) -> anyhow::Result<bool> {
    let mut backend = FrameRecorder::default();
    for _ in 0..max {
        client.frame(dt, Keys::empty(), &mut backend)?;
        if done(client) {
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn ship_spawn(x: f64, y: f64, angle: f64) -> ShipSpawn {
    ShipSpawn {
        palette: 0,
        position: Vec2::new(x, y),
        angle,
        move_speed: 200.0,
        rotate_speed: 2.0,
    }
}
