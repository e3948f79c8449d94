//! Networking primitives.
//!
//! Goals:
//! - Mirror the server's JSON envelope exactly (`WireMsg`).
//! - Lift it into exhaustive sum types (`ServerMsg`, `ClientMsg`) so the
//!   client never branches on raw type strings.
//! - Keep the transport an opaque channel of parsed envelopes (`Transport`).
//!
//! Unknown `type` / `event.type` values decode to `None` and are dropped;
//! that is forward compatibility, not an error.

use anyhow::{bail, Context};
use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::mpsc,
};
use tracing::{debug, warn};

use crate::math::Vec2;

/// Top-level envelope `type` values the client handles or sends.
pub mod msg_type {
    pub const HELLO: &str = "hello";
    pub const READY: &str = "ready";
    pub const CANCEL: &str = "cancel";
    pub const START: &str = "start";
    pub const INGAME: &str = "ingame";
    pub const ERROR: &str = "error";
}

/// In-game `event.type` values the client handles or sends.
pub mod event_type {
    pub const GAME_INIT: &str = "game_init";
    pub const GAME_VICTORY: &str = "game_victory";
    pub const PLAYER_CREATE: &str = "player_create";
    pub const PLAYER_DEAD: &str = "player_dead";
    pub const PLAYER_MOVE: &str = "player_move";
    pub const PLAYER_FIRE: &str = "player_fire";
    pub const PROJECTILE_CREATE: &str = "projectile_create";
    pub const PROJECTILE_EXTINCTION: &str = "projectile_extinction";
}

/// Message envelope as it travels on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WireMsg {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<WireEvent>,
}

/// Nested gameplay event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WireEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub data: EventData,
}

/// Union of every payload field the server uses.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EventData {
    pub id: String,
    pub idx: i64,
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub dir_x: i32,
    pub dir_y: i32,
    pub dir_r: i32,
    pub move_speed: f64,
    pub rotate_speed: f64,
}

/// Movement intent: strafe right, strafe forward and rotation, each in
/// `{-1, 0, 1}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Intent {
    pub dir_x: i8,
    pub dir_y: i8,
    pub dir_r: i8,
}

impl Intent {
    pub const NONE: Self = Self {
        dir_x: 0,
        dir_y: 0,
        dir_r: 0,
    };

    /// Builds an intent, clamping every axis into `{-1, 0, 1}`.
    pub fn new(dir_x: i32, dir_y: i32, dir_r: i32) -> Self {
        Self {
            dir_x: dir_x.signum() as i8,
            dir_y: dir_y.signum() as i8,
            dir_r: dir_r.signum() as i8,
        }
    }

    pub fn is_idle(self) -> bool {
        self == Self::NONE
    }
}

/// Spawn parameters of a ship (`player_create`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShipSpawn {
    pub palette: usize,
    pub position: Vec2,
    pub angle: f64,
    pub move_speed: f64,
    pub rotate_speed: f64,
}

/// Full-state ship snapshot (`player_move`). Replaces, never deltas.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShipSnapshot {
    pub position: Vec2,
    pub angle: f64,
    pub intent: Intent,
}

/// Spawn parameters of a projectile (`projectile_create`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProjectileSpawn {
    pub sprite: usize,
    pub position: Vec2,
    pub angle: f64,
    pub move_speed: f64,
}

/// In-game events the client reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    WorldInit {
        radius: f64,
        min_radius: f64,
        shrink_speed: f64,
    },
    Victory,
    ShipCreated {
        owner: String,
        spawn: ShipSpawn,
    },
    ShipDied {
        owner: String,
    },
    ShipMoved {
        owner: String,
        snapshot: ShipSnapshot,
    },
    ProjectileCreated {
        id: String,
        owner: String,
        spawn: ProjectileSpawn,
    },
    ProjectileDestroyed {
        id: String,
    },
}

/// Server -> client messages.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMsg {
    /// Handshake; assigns the client its id.
    Hello { client_id: String },
    /// Fatal; the session must reset.
    Error,
    /// Ready request acknowledged.
    Ready,
    /// Cancel request acknowledged.
    Cancel,
    /// Match found, start the countdown to the game scene.
    Start,
    Game(GameEvent),
}

impl ServerMsg {
    /// Lifts a wire envelope. Returns `None` for kinds the client ignores.
    pub fn from_wire(msg: &WireMsg) -> Option<Self> {
        match msg.kind.as_str() {
            msg_type::HELLO => Some(ServerMsg::Hello {
                client_id: msg.client_id.clone(),
            }),
            msg_type::ERROR => Some(ServerMsg::Error),
            msg_type::READY => Some(ServerMsg::Ready),
            msg_type::CANCEL => Some(ServerMsg::Cancel),
            msg_type::START => Some(ServerMsg::Start),
            msg_type::INGAME => msg
                .event
                .as_ref()
                .and_then(GameEvent::from_wire)
                .map(ServerMsg::Game),
            _ => None,
        }
    }

    /// Builds the envelope a server would send for this message.
    pub fn to_wire(&self, client_id: &str) -> WireMsg {
        let (kind, event) = match self {
            ServerMsg::Hello { .. } => (msg_type::HELLO, None),
            ServerMsg::Error => (msg_type::ERROR, None),
            ServerMsg::Ready => (msg_type::READY, None),
            ServerMsg::Cancel => (msg_type::CANCEL, None),
            ServerMsg::Start => (msg_type::START, None),
            ServerMsg::Game(ev) => (msg_type::INGAME, Some(ev.to_wire())),
        };
        let client_id = match self {
            ServerMsg::Hello { client_id } => client_id.clone(),
            _ => client_id.to_string(),
        };
        WireMsg {
            kind: kind.to_string(),
            client_id,
            event,
        }
    }
}

impl GameEvent {
    pub fn from_wire(ev: &WireEvent) -> Option<Self> {
        let d = &ev.data;
        let position = Vec2::new(d.x, d.y);
        let event = match ev.kind.as_str() {
            event_type::GAME_INIT => GameEvent::WorldInit {
                radius: d.x,
                min_radius: d.y,
                shrink_speed: d.move_speed,
            },
            event_type::GAME_VICTORY => GameEvent::Victory,
            event_type::PLAYER_CREATE => GameEvent::ShipCreated {
                owner: ev.owner_id.clone(),
                spawn: ShipSpawn {
                    palette: d.idx.max(0) as usize,
                    position,
                    angle: d.angle,
                    move_speed: d.move_speed,
                    rotate_speed: d.rotate_speed,
                },
            },
            event_type::PLAYER_DEAD => GameEvent::ShipDied {
                owner: ev.owner_id.clone(),
            },
            event_type::PLAYER_MOVE => GameEvent::ShipMoved {
                owner: ev.owner_id.clone(),
                snapshot: ShipSnapshot {
                    position,
                    angle: d.angle,
                    intent: Intent::new(d.dir_x, d.dir_y, d.dir_r),
                },
            },
            event_type::PROJECTILE_CREATE => GameEvent::ProjectileCreated {
                id: d.id.clone(),
                owner: ev.owner_id.clone(),
                spawn: ProjectileSpawn {
                    sprite: d.idx.max(0) as usize,
                    position,
                    angle: d.angle,
                    move_speed: d.move_speed,
                },
            },
            event_type::PROJECTILE_EXTINCTION => GameEvent::ProjectileDestroyed { id: d.id.clone() },
            _ => return None,
        };
        Some(event)
    }

    pub fn to_wire(&self) -> WireEvent {
        let mut data = EventData::default();
        let (kind, owner_id) = match self {
            GameEvent::WorldInit {
                radius,
                min_radius,
                shrink_speed,
            } => {
                data.x = *radius;
                data.y = *min_radius;
                data.move_speed = *shrink_speed;
                (event_type::GAME_INIT, String::new())
            }
            GameEvent::Victory => (event_type::GAME_VICTORY, String::new()),
            GameEvent::ShipCreated { owner, spawn } => {
                data.idx = spawn.palette as i64;
                data.x = spawn.position.x;
                data.y = spawn.position.y;
                data.angle = spawn.angle;
                data.move_speed = spawn.move_speed;
                data.rotate_speed = spawn.rotate_speed;
                (event_type::PLAYER_CREATE, owner.clone())
            }
            GameEvent::ShipDied { owner } => (event_type::PLAYER_DEAD, owner.clone()),
            GameEvent::ShipMoved { owner, snapshot } => {
                data.x = snapshot.position.x;
                data.y = snapshot.position.y;
                data.angle = snapshot.angle;
                data.dir_x = snapshot.intent.dir_x as i32;
                data.dir_y = snapshot.intent.dir_y as i32;
                data.dir_r = snapshot.intent.dir_r as i32;
                (event_type::PLAYER_MOVE, owner.clone())
            }
            GameEvent::ProjectileCreated { id, owner, spawn } => {
                data.id = id.clone();
                data.idx = spawn.sprite as i64;
                data.x = spawn.position.x;
                data.y = spawn.position.y;
                data.angle = spawn.angle;
                data.move_speed = spawn.move_speed;
                (event_type::PROJECTILE_CREATE, owner.clone())
            }
            GameEvent::ProjectileDestroyed { id } => {
                data.id = id.clone();
                (event_type::PROJECTILE_EXTINCTION, String::new())
            }
        };
        WireEvent {
            kind: kind.to_string(),
            owner_id,
            data,
        }
    }
}

/// Client -> server messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMsg {
    Ready,
    Cancel,
    /// Asks the game for the world parameters and the current ship list.
    GameInit,
    MoveIntent(Intent),
    FireIntent,
}

impl ClientMsg {
    /// Encodes the message for the given client id.
    pub fn to_wire(self, client_id: &str) -> WireMsg {
        let control = |kind: &str| WireMsg {
            kind: kind.to_string(),
            client_id: client_id.to_string(),
            event: None,
        };
        let ingame = |kind: &str, data: EventData| WireMsg {
            kind: msg_type::INGAME.to_string(),
            client_id: client_id.to_string(),
            event: Some(WireEvent {
                kind: kind.to_string(),
                owner_id: client_id.to_string(),
                data,
            }),
        };
        match self {
            ClientMsg::Ready => control(msg_type::READY),
            ClientMsg::Cancel => control(msg_type::CANCEL),
            ClientMsg::GameInit => ingame(event_type::GAME_INIT, EventData::default()),
            ClientMsg::MoveIntent(intent) => ingame(
                event_type::PLAYER_MOVE,
                EventData {
                    dir_x: intent.dir_x as i32,
                    dir_y: intent.dir_y as i32,
                    dir_r: intent.dir_r as i32,
                    ..EventData::default()
                },
            ),
            ClientMsg::FireIntent => ingame(event_type::PLAYER_FIRE, EventData::default()),
        }
    }

    /// Decodes an envelope sent by a client (used by scripted servers).
    pub fn from_wire(msg: &WireMsg) -> Option<Self> {
        match msg.kind.as_str() {
            msg_type::READY => Some(ClientMsg::Ready),
            msg_type::CANCEL => Some(ClientMsg::Cancel),
            msg_type::INGAME => {
                let ev = msg.event.as_ref()?;
                match ev.kind.as_str() {
                    event_type::GAME_INIT => Some(ClientMsg::GameInit),
                    event_type::PLAYER_MOVE => Some(ClientMsg::MoveIntent(Intent::new(
                        ev.data.dir_x,
                        ev.data.dir_y,
                        ev.data.dir_r,
                    ))),
                    event_type::PLAYER_FIRE => Some(ClientMsg::FireIntent),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

/// Opaque message channel between the client and the server.
///
/// Implementations deliver already-parsed envelopes at most once and never
/// block the caller.
pub trait Transport {
    fn send(&mut self, msg: WireMsg) -> anyhow::Result<()>;
    /// Returns the next inbound envelope, if one is queued.
    fn try_recv(&mut self) -> Option<WireMsg>;
}

/// In-process transport over unbounded tokio channels.
#[derive(Debug)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<WireMsg>,
    rx: mpsc::UnboundedReceiver<WireMsg>,
}

impl ChannelTransport {
    /// Creates two connected ends.
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();
        (
            Self { tx: a_tx, rx: a_rx },
            Self { tx: b_tx, rx: b_rx },
        )
    }

    /// Waits for the next inbound envelope; `None` once the peer is gone.
    pub async fn recv(&mut self) -> Option<WireMsg> {
        self.rx.recv().await
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, msg: WireMsg) -> anyhow::Result<()> {
        if self.tx.send(msg).is_err() {
            bail!("transport closed");
        }
        Ok(())
    }

    fn try_recv(&mut self) -> Option<WireMsg> {
        self.rx.try_recv().ok()
    }
}

/// Largest accepted frame payload.
pub const MAX_FRAME_LEN: usize = 1 << 20;

/// Reads one length-prefixed frame.
async fn read_frame<R: AsyncRead + Unpin>(r: &mut R) -> anyhow::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    r.read_exact(&mut len_buf).await.context("tcp read len")?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        bail!("frame of {len} bytes exceeds {MAX_FRAME_LEN}");
    }
    let mut payload = vec![0u8; len];
    r.read_exact(&mut payload)
        .await
        .context("tcp read payload")?;
    Ok(payload)
}

async fn write_frame<W: AsyncWrite + Unpin>(w: &mut W, msg: &WireMsg) -> anyhow::Result<()> {
    let payload = encode(msg)?;
    if payload.len() > MAX_FRAME_LEN {
        bail!("frame of {} bytes exceeds {MAX_FRAME_LEN}", payload.len());
    }
    let mut buf = BytesMut::with_capacity(4 + payload.len());
    buf.put_u32(payload.len() as u32);
    buf.extend_from_slice(&payload);
    w.write_all(&buf).await.context("tcp write")?;
    Ok(())
}

/// Reliable connection over TCP with length-prefixed JSON frames.
#[derive(Debug)]
pub struct ReliableConn {
    stream: TcpStream,
}

impl ReliableConn {
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }

    pub async fn connect(addr: SocketAddr) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await.context("tcp connect")?;
        Ok(Self::new(stream))
    }

    pub async fn send(&mut self, msg: &WireMsg) -> anyhow::Result<()> {
        write_frame(&mut self.stream, msg).await
    }

    pub async fn recv(&mut self) -> anyhow::Result<WireMsg> {
        let payload = read_frame(&mut self.stream).await?;
        decode(&payload)
    }
}

/// TCP listener handing out `ReliableConn`s.
pub struct ReliableListener {
    listener: TcpListener,
}

impl ReliableListener {
    pub async fn bind(addr: SocketAddr) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await.context("tcp bind")?;
        Ok(Self { listener })
    }

    pub async fn accept(&self) -> anyhow::Result<(ReliableConn, SocketAddr)> {
        let (stream, addr) = self.listener.accept().await.context("tcp accept")?;
        Ok((ReliableConn::new(stream), addr))
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}

/// Bridges a TCP connection to a `ChannelTransport` with reader/writer tasks.
///
/// Must be called inside a tokio runtime. Frames that fail to decode are
/// logged and skipped; the reader stops on the first IO error.
pub fn spawn_transport(conn: ReliableConn) -> ChannelTransport {
    let (local, remote) = ChannelTransport::pair();
    let ChannelTransport { tx, mut rx } = remote;
    let (mut rd, mut wr) = conn.stream.into_split();

    tokio::spawn(async move {
        loop {
            let payload = match read_frame(&mut rd).await {
                Ok(p) => p,
                Err(e) => {
                    debug!(error = %e, "Transport reader stopped");
                    break;
                }
            };
            match decode(&payload) {
                Ok(msg) => {
                    if tx.send(msg).is_err() {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "Dropping malformed frame"),
            }
        }
    });

    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = write_frame(&mut wr, &msg).await {
                warn!(error = %e, "Transport writer stopped");
                break;
            }
        }
    });

    local
}

/// Encodes an envelope as JSON.
pub fn encode(msg: &WireMsg) -> anyhow::Result<Vec<u8>> {
    serde_json::to_vec(msg).context("serialize msg")
}

/// Decodes a JSON envelope.
pub fn decode(b: &[u8]) -> anyhow::Result<WireMsg> {
    serde_json::from_slice(b).context("deserialize msg")
}
