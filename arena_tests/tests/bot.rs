//! Scripted bot against an in-process server.

use std::time::Duration;

use arena_client::bot::Bot;
use arena_shared::{
    config::ClientConfig,
    net::{ChannelTransport, ClientMsg, GameEvent, ServerMsg},
};
use arena_tests::{init_tracing, ship_spawn, ScriptedServer};
use rand::{rngs::StdRng, SeedableRng};

fn bot(seed: u64) -> (Bot<ChannelTransport>, ScriptedServer) {
    init_tracing();
    let (client, server) = ChannelTransport::pair();
    let bot = Bot::new(&ClientConfig::default(), client, StdRng::seed_from_u64(seed));
    (bot, ScriptedServer::new(server, "bot"))
}

fn run(bot: &mut Bot<ChannelTransport>, from_ms: u64, to_ms: u64) -> anyhow::Result<()> {
    for t in (from_ms..to_ms).step_by(10) {
        bot.tick(Duration::from_millis(t))?;
    }
    Ok(())
}

#[test]
fn plays_until_victory() -> anyhow::Result<()> {
    let (mut bot, mut server) = bot(21);
    server.hello()?;
    bot.tick(Duration::ZERO)?;
    assert_eq!(bot.client_id(), Some("bot"));
    assert_eq!(server.drain(), vec![ClientMsg::Ready]);

    server.push(ServerMsg::Ready)?;
    server.push(ServerMsg::Start)?;
    server.push_event(GameEvent::ShipCreated {
        owner: "bot".into(),
        spawn: ship_spawn(40.0, 60.0, 0.3),
    })?;
    run(&mut bot, 0, 1500)?;
    assert!(server.drain().is_empty());
    assert_eq!(bot.spawn().map(|s| s.angle), Some(0.3));

    run(&mut bot, 1500, 6500)?;
    let sent = server.drain();
    let moves = sent
        .iter()
        .filter(|m| matches!(m, ClientMsg::MoveIntent(_)))
        .count();
    let fires = sent.iter().filter(|m| **m == ClientMsg::FireIntent).count();
    // 5s of broadcasts every 200-400ms, fires every 200-500ms at 2/3 odds.
    assert!((12..=25).contains(&moves), "moves = {moves}");
    assert!(fires >= 1 && fires <= 25, "fires = {fires}");

    server.push_event(GameEvent::Victory)?;
    run(&mut bot, 6500, 8000)?;
    assert!(bot.is_dead());
    assert!(!bot.is_running());
    assert!(server.drain().is_empty());
    Ok(())
}

#[test]
fn stops_on_own_death_only() -> anyhow::Result<()> {
    let (mut bot, mut server) = bot(5);
    server.hello()?;
    server.push(ServerMsg::Start)?;
    run(&mut bot, 0, 2000)?;
    assert!(bot.is_running());

    server.push_event(GameEvent::ShipDied { owner: "someone".into() })?;
    run(&mut bot, 2000, 2100)?;
    assert!(bot.is_running());

    server.push_event(GameEvent::ShipDied { owner: "bot".into() })?;
    run(&mut bot, 2100, 2200)?;
    assert!(!bot.is_running());
    Ok(())
}

#[test]
fn error_resets_bot() -> anyhow::Result<()> {
    let (mut bot, mut server) = bot(8);
    server.hello()?;
    server.push(ServerMsg::Start)?;
    run(&mut bot, 0, 2000)?;
    server.push(ServerMsg::Error)?;
    bot.tick(Duration::from_millis(2000))?;
    assert!(bot.client_id().is_none());
    assert!(!bot.is_running());
    assert!(bot.take_reload());
    Ok(())
}
