//! End-to-end session tests against a scripted in-process server.

use arena_client::{
    client::SessionPhase,
    handler::Outcome,
    input::Keys,
    scene::{GameStatus, LobbyStatus},
    GameClient,
};
use arena_shared::{
    config::ClientConfig,
    math::Vec2,
    net::{ChannelTransport, ClientMsg, GameEvent, Intent, ProjectileSpawn, ServerMsg, ShipSnapshot},
    render::{Banner, FrameRecorder, Sprite},
};
use arena_tests::{init_tracing, run_until, session, ship_spawn, ScriptedServer};

/// Drives a fresh session through the lobby into a running game.
fn in_game() -> anyhow::Result<(GameClient<ChannelTransport>, ScriptedServer)> {
    init_tracing();
    let (mut client, mut server) = session(ClientConfig::default(), "me");

    server.hello()?;
    assert!(run_until(&mut client, 0.1, 40, |c| c.lobby_idle())?);
    assert!(client.press_button()?);
    assert_eq!(server.drain(), vec![ClientMsg::Ready]);

    server.push(ServerMsg::Ready)?;
    server.push(ServerMsg::Start)?;
    assert!(run_until(&mut client, 0.1, 40, |c| c.phase() == SessionPhase::Game)?);
    assert_eq!(server.drain(), vec![ClientMsg::GameInit]);
    Ok((client, server))
}

#[test]
fn lobby_ready_cancel_then_start() -> anyhow::Result<()> {
    init_tracing();
    let (mut client, mut server) = session(ClientConfig::default(), "p7");
    let mut r = FrameRecorder::default();

    client.frame(0.1, Keys::empty(), &mut r)?;
    assert_eq!(client.phase(), SessionPhase::AwaitingHello);

    server.hello()?;
    client.frame(2.0, Keys::empty(), &mut r)?;
    assert_eq!(client.client_id(), Some("p7"));
    assert!(client.lobby_idle());

    // Space pressed then released.
    client.frame(0.1, Keys::BUTTON, &mut r)?;
    client.frame(0.1, Keys::empty(), &mut r)?;
    assert_eq!(server.drain(), vec![ClientMsg::Ready]);
    assert_eq!(client.lobby().unwrap().status(), LobbyStatus::ReadyWait);

    server.push(ServerMsg::Ready)?;
    client.frame(0.1, Keys::empty(), &mut r)?;
    assert_eq!(client.lobby().unwrap().status(), LobbyStatus::Ready);

    assert!(client.press_button()?);
    assert!(!client.press_button()?);
    assert_eq!(server.drain(), vec![ClientMsg::Cancel]);

    server.push(ServerMsg::Cancel)?;
    client.frame(0.1, Keys::empty(), &mut r)?;
    assert!(client.lobby_idle());

    client.press_button()?;
    server.push(ServerMsg::Ready)?;
    server.push(ServerMsg::Start)?;
    client.frame(0.1, Keys::empty(), &mut r)?;
    assert_eq!(client.lobby().unwrap().status(), LobbyStatus::FadeOut);
    assert!(client.game().is_some());

    assert!(run_until(&mut client, 0.5, 10, |c| c.phase() == SessionPhase::Game)?);
    assert!(client.lobby().is_none());
    Ok(())
}

#[test]
fn entering_game_requests_init_data_once() -> anyhow::Result<()> {
    let (mut client, mut server) = in_game()?;
    let mut r = FrameRecorder::default();

    // The server answers the request with the world and the ship list.
    server.push_event(GameEvent::WorldInit {
        radius: 1500.0,
        min_radius: 200.0,
        shrink_speed: 4.0,
    })?;
    server.push_event(GameEvent::ShipCreated {
        owner: "me".into(),
        spawn: ship_spawn(10.0, 10.0, 0.0),
    })?;
    server.push_event(GameEvent::ShipCreated {
        owner: "B".into(),
        spawn: ship_spawn(-10.0, 10.0, 0.0),
    })?;
    for _ in 0..10 {
        client.frame(0.016, Keys::empty(), &mut r)?;
    }
    assert!(server.drain().is_empty());

    let world = client.game().unwrap().world();
    assert_eq!(world.registry.ship_count(), 2);
    assert_eq!(world.boundary.min_radius, 200.0);
    Ok(())
}

#[test]
fn create_then_move_overwrites_position() -> anyhow::Result<()> {
    let (mut client, mut server) = in_game()?;
    server.push_event(GameEvent::ShipCreated {
        owner: "A".into(),
        spawn: ship_spawn(10.0, 20.0, 0.0),
    })?;
    server.push_event(GameEvent::ShipMoved {
        owner: "A".into(),
        snapshot: ShipSnapshot {
            position: Vec2::new(15.0, 20.0),
            angle: 0.0,
            intent: Intent::new(1, 0, 0),
        },
    })?;
    client.poll();

    let ship = client.game().unwrap().world().registry.ship("A").unwrap();
    assert_eq!(ship.position, Vec2::new(15.0, 20.0));
    Ok(())
}

#[test]
fn death_then_victory_stays_game_over() -> anyhow::Result<()> {
    let (mut client, mut server) = in_game()?;
    server.push_event(GameEvent::ShipCreated {
        owner: "me".into(),
        spawn: ship_spawn(0.0, 0.0, 0.0),
    })?;
    server.push_event(GameEvent::ShipDied { owner: "me".into() })?;
    server.push_event(GameEvent::Victory)?;

    let mut r = FrameRecorder::default();
    client.frame(0.5, Keys::empty(), &mut r)?;
    let game = client.game().unwrap();
    assert_eq!(game.status(), GameStatus::End(Outcome::GameOver));

    client.frame(1.0, Keys::empty(), &mut r)?;
    assert_eq!(
        r.find(|s| matches!(s, Sprite::Banner(Banner::GameOver))).count(),
        1
    );
    assert_eq!(
        r.find(|s| matches!(s, Sprite::Banner(Banner::Victory))).count(),
        0
    );
    Ok(())
}

#[test]
fn projectile_created_then_destroyed_leaves_none() -> anyhow::Result<()> {
    let (mut client, mut server) = in_game()?;
    server.push_event(GameEvent::ProjectileCreated {
        id: "42".into(),
        owner: "A".into(),
        spawn: ProjectileSpawn {
            sprite: 1,
            position: Vec2::new(3.0, 4.0),
            angle: 0.5,
            move_speed: 600.0,
        },
    })?;
    client.poll();
    assert_eq!(client.game().unwrap().world().registry.projectile_count(), 1);

    server.push_event(GameEvent::ProjectileDestroyed { id: "42".into() })?;
    client.poll();
    assert_eq!(client.game().unwrap().world().registry.projectile_count(), 0);
    Ok(())
}

#[test]
fn keys_become_intents_until_death() -> anyhow::Result<()> {
    let (mut client, mut server) = in_game()?;
    server.push_event(GameEvent::ShipCreated {
        owner: "me".into(),
        spawn: ship_spawn(0.0, 0.0, 0.0),
    })?;
    let mut r = FrameRecorder::default();

    client.frame(0.016, Keys::FORWARD | Keys::FIRE, &mut r)?;
    client.frame(0.016, Keys::FORWARD | Keys::FIRE, &mut r)?;
    assert_eq!(
        server.drain(),
        vec![
            ClientMsg::MoveIntent(Intent::new(0, -1, 0)),
            ClientMsg::FireIntent
        ]
    );

    server.push_event(GameEvent::ShipDied { owner: "me".into() })?;
    client.frame(0.016, Keys::STRAFE_LEFT | Keys::FIRE, &mut r)?;
    assert!(server.drain().is_empty());
    Ok(())
}

#[test]
fn local_ship_is_drawn_at_screen_origin() -> anyhow::Result<()> {
    let (mut client, mut server) = in_game()?;
    server.push_event(GameEvent::WorldInit {
        radius: 2000.0,
        min_radius: 300.0,
        shrink_speed: 0.0,
    })?;
    server.push_event(GameEvent::ShipCreated {
        owner: "me".into(),
        spawn: ship_spawn(250.0, -80.0, 1.2),
    })?;
    let mut r = FrameRecorder::default();
    client.frame(0.016, Keys::empty(), &mut r)?;

    let origin = ClientConfig::default().screen_origin();
    let ship = r
        .find(|s| matches!(s, Sprite::Ship { .. }))
        .next()
        .expect("local ship drawn");
    assert_eq!(ship.position, origin);
    assert_eq!(ship.rotation, 0.0);
    Ok(())
}

#[test]
fn error_resets_to_hello() -> anyhow::Result<()> {
    let (mut client, mut server) = in_game()?;
    server.push(ServerMsg::Error)?;
    client.frame(0.016, Keys::empty(), &mut FrameRecorder::default())?;
    assert_eq!(client.phase(), SessionPhase::AwaitingHello);
    assert!(client.take_reload());

    server.hello()?;
    client.poll();
    assert_eq!(client.phase(), SessionPhase::Lobby);
    assert_eq!(client.lobby().unwrap().status(), LobbyStatus::FadeIn);
    Ok(())
}
