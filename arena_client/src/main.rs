//! Standalone client binary.
//!
//! Usage:
//!   cargo run -p arena_client -- [--addr 127.0.0.1:8080] [--config client.json]
//!                                [--frame-hz 60] [--frames N] [--bot]
//!
//! Without a window the client runs headless: it queues up as soon as the
//! lobby settles, plays with no input and logs the outcome. `--bot` runs the
//! scripted player instead.
//!
//! The connection speaks length-prefixed JSON frames over plain TCP (see
//! `arena_shared::net::ReliableConn`), not WebSocket. The server must use
//! the same framing.

use std::env;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::Context;
use arena_client::{bot::Bot, input::Keys, scene::GameScene, GameClient};
use arena_shared::{
    config::ClientConfig,
    net::{spawn_transport, ChannelTransport, ReliableConn},
    render::NullRenderer,
};
use rand::{rngs::StdRng, SeedableRng};
use tracing::{info, warn};

struct Args {
    cfg: ClientConfig,
    bot: bool,
    frames: Option<u64>,
}

fn parse_args() -> anyhow::Result<Args> {
    let args: Vec<String> = env::args().collect();

    let mut cfg = ClientConfig::default();
    if let Some(i) = args.iter().position(|a| a == "--config") {
        let path = args.get(i + 1).context("--config needs a path")?;
        let text = std::fs::read_to_string(path).with_context(|| format!("read {path}"))?;
        cfg = ClientConfig::from_json_str(&text).with_context(|| format!("parse {path}"))?;
    }

    let mut bot = false;
    let mut frames = None;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--addr" if i + 1 < args.len() => {
                cfg.server_addr = args[i + 1].clone();
                i += 2;
            }
            "--frame-hz" if i + 1 < args.len() => {
                cfg.frame_hz = args[i + 1].parse().context("parse --frame-hz")?;
                i += 2;
            }
            "--frames" if i + 1 < args.len() => {
                frames = Some(args[i + 1].parse().context("parse --frames")?);
                i += 2;
            }
            "--bot" => {
                bot = true;
                i += 1;
            }
            _ => i += 1,
        }
    }
    cfg.frame_hz = cfg.frame_hz.max(1);
    Ok(Args { cfg, bot, frames })
}

async fn connect(addr: &str) -> anyhow::Result<ChannelTransport> {
    let addr: SocketAddr = addr.parse().context("parse server_addr")?;
    let conn = ReliableConn::connect(addr).await?;
    info!(server = %addr, "Connected");
    Ok(spawn_transport(conn))
}

async fn run_client(cfg: ClientConfig, frames: Option<u64>) -> anyhow::Result<()> {
    let transport = connect(&cfg.server_addr).await?;
    let mut client = GameClient::new(cfg.clone(), transport);
    let mut renderer = NullRenderer;

    let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / cfg.frame_hz as f64));
    let mut last = Instant::now();
    let mut frame = 0u64;
    let mut reported = false;

    loop {
        interval.tick().await;
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f64();
        last = now;

        if client.lobby_idle() {
            client.press_button()?;
        }
        client.frame(dt, Keys::empty(), &mut renderer)?;

        if let Some(outcome) = client.game().and_then(GameScene::outcome) {
            if !reported {
                info!(?outcome, client_id = ?client.client_id(), "Match finished");
                reported = true;
            }
        }

        if client.take_reload() {
            warn!("Session reset by server, reconnecting");
            client.set_transport(connect(&cfg.server_addr).await?);
            reported = false;
        }

        frame += 1;
        if frames.is_some_and(|n| frame >= n) {
            info!(frames = frame, "Frame limit reached");
            return Ok(());
        }
    }
}

async fn run_bot(cfg: ClientConfig, frames: Option<u64>) -> anyhow::Result<()> {
    let transport = connect(&cfg.server_addr).await?;
    let mut bot = Bot::new(&cfg, transport, StdRng::from_entropy());

    let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / cfg.frame_hz as f64));
    let started = Instant::now();
    let mut tick = 0u64;

    loop {
        interval.tick().await;
        bot.tick(started.elapsed())?;

        if bot.take_reload() {
            warn!("Session reset by server, bot reconnecting");
            bot.set_transport(connect(&cfg.server_addr).await?);
        }

        tick += 1;
        if frames.is_some_and(|n| tick >= n) {
            return Ok(());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let Args { cfg, bot, frames } = parse_args()?;
    info!(server = %cfg.server_addr, frame_hz = cfg.frame_hz, bot, "Starting client");

    if bot {
        run_bot(cfg, frames).await
    } else {
        run_client(cfg, frames).await
    }
}
