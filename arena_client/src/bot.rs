//! Automated player.
//!
//! Queues up as soon as it is greeted, then wanders and shoots at random
//! until it dies or the match is won. Each behavior is a cooperative
//! `BotTask` with its own re-arm delay; `Bot::tick` drives all of them from
//! one loop, so nothing here spawns threads or timers.

use std::time::Duration;

use anyhow::Context;
use arena_shared::{
    config::ClientConfig,
    net::{ClientMsg, GameEvent, Intent, ServerMsg, ShipSpawn, Transport},
};
use rand::{rngs::StdRng, Rng};
use tracing::{debug, info, warn};

/// What a task does when it comes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotAction {
    /// Re-roll the strafe axes.
    Move,
    /// Re-roll the rotation axis.
    Rotate,
    /// Send the current intent.
    Broadcast,
    /// Maybe fire.
    Fire,
}

impl BotAction {
    const ALL: [BotAction; 4] = [
        BotAction::Move,
        BotAction::Rotate,
        BotAction::Broadcast,
        BotAction::Fire,
    ];

    /// Re-arm delay bounds in milliseconds, inclusive.
    fn delay_ms(self) -> (u64, u64) {
        match self {
            BotAction::Move | BotAction::Rotate => (150, 250),
            BotAction::Broadcast => (200, 400),
            BotAction::Fire => (200, 500),
        }
    }
}

/// Result of polling a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPoll {
    Pending,
    /// The action should run now; the task already re-armed itself.
    Due,
    /// The bot is dead; drop the task.
    Stopped,
}

/// One periodic behavior.
#[derive(Debug, Clone)]
pub struct BotTask {
    pub action: BotAction,
    next_at: Duration,
}

impl BotTask {
    /// Arms a task that first fires after one random delay.
    pub fn arm<R: Rng + ?Sized>(action: BotAction, now: Duration, rng: &mut R) -> Self {
        let mut task = Self {
            action,
            next_at: now,
        };
        task.rearm(now, rng);
        task
    }

    pub fn next_at(&self) -> Duration {
        self.next_at
    }

    fn rearm<R: Rng + ?Sized>(&mut self, now: Duration, rng: &mut R) {
        let (min, max) = self.action.delay_ms();
        self.next_at = now + Duration::from_millis(rng.gen_range(min..=max));
    }

    pub fn poll<R: Rng + ?Sized>(&mut self, now: Duration, alive: bool, rng: &mut R) -> TaskPoll {
        if !alive {
            return TaskPoll::Stopped;
        }
        if now < self.next_at {
            return TaskPoll::Pending;
        }
        self.rearm(now, rng);
        TaskPoll::Due
    }
}

/// Scripted client driven by `tick`.
pub struct Bot<T: Transport> {
    transport: T,
    rng: StdRng,
    start_delay: Duration,
    client_id: Option<String>,
    spawn: Option<ShipSpawn>,
    start_at: Option<Duration>,
    tasks: Vec<BotTask>,
    dir: (i32, i32, i32),
    dead: bool,
    reload: bool,
}

impl<T: Transport> Bot<T> {
    pub fn new(cfg: &ClientConfig, transport: T, rng: StdRng) -> Self {
        Self {
            transport,
            rng,
            start_delay: Duration::from_millis(cfg.bot_start_delay_ms),
            client_id: None,
            spawn: None,
            start_at: None,
            tasks: Vec::new(),
            dir: (0, 0, 0),
            dead: false,
            reload: false,
        }
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// True while behaviors are scheduled.
    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Where the server spawned this bot, once known.
    pub fn spawn(&self) -> Option<&ShipSpawn> {
        self.spawn.as_ref()
    }

    pub fn intent(&self) -> Intent {
        Intent::new(self.dir.0, self.dir.1, self.dir.2)
    }

    pub fn tasks(&self) -> &[BotTask] {
        &self.tasks
    }

    /// Returns true once after the server forced a reset.
    pub fn take_reload(&mut self) -> bool {
        std::mem::take(&mut self.reload)
    }

    pub fn set_transport(&mut self, transport: T) {
        self.transport = transport;
    }

    /// Handles inbound messages, then runs every task that is due.
    ///
    /// `now` is measured from any fixed point, as long as it never goes back.
    pub fn tick(&mut self, now: Duration) -> anyhow::Result<()> {
        while let Some(wire) = self.transport.try_recv() {
            if let Some(msg) = ServerMsg::from_wire(&wire) {
                self.handle_msg(msg, now)?;
            }
        }

        if self.start_at.is_some_and(|at| now >= at) {
            self.start_at = None;
            if !self.dead {
                info!(client_id = ?self.client_id, "Bot running");
                let rng = &mut self.rng;
                self.tasks = BotAction::ALL
                    .iter()
                    .map(|&action| BotTask::arm(action, now, rng))
                    .collect();
            }
        }

        let alive = !self.dead;
        let rng = &mut self.rng;
        let mut due = Vec::new();
        self.tasks.retain_mut(|task| match task.poll(now, alive, rng) {
            TaskPoll::Pending => true,
            TaskPoll::Due => {
                due.push(task.action);
                true
            }
            TaskPoll::Stopped => false,
        });

        for action in due {
            self.perform(action)?;
        }
        Ok(())
    }

    fn handle_msg(&mut self, msg: ServerMsg, now: Duration) -> anyhow::Result<()> {
        match msg {
            ServerMsg::Hello { client_id } => {
                info!(client_id = %client_id, "Bot greeted, queueing");
                self.client_id = Some(client_id);
                self.send(ClientMsg::Ready)?;
            }
            ServerMsg::Start => {
                debug!(delay_ms = self.start_delay.as_millis() as u64, "Bot match starting");
                self.dead = false;
                self.spawn = None;
                self.tasks.clear();
                self.start_at = Some(now + self.start_delay);
            }
            ServerMsg::Game(GameEvent::ShipCreated { owner, spawn })
                if self.client_id.as_deref() == Some(owner.as_str()) =>
            {
                self.spawn = Some(spawn);
            }
            ServerMsg::Game(GameEvent::Victory) => {
                info!(client_id = ?self.client_id, "Bot won");
                self.dead = true;
            }
            ServerMsg::Game(GameEvent::ShipDied { owner })
                if self.client_id.as_deref() == Some(owner.as_str()) =>
            {
                info!(client_id = %owner, "Bot died");
                self.dead = true;
            }
            ServerMsg::Error => {
                warn!(client_id = ?self.client_id, "Server error, bot resetting");
                self.client_id = None;
                self.spawn = None;
                self.start_at = None;
                self.tasks.clear();
                self.dead = false;
                self.reload = true;
            }
            ServerMsg::Ready | ServerMsg::Cancel | ServerMsg::Game(_) => {}
        }
        Ok(())
    }

    fn perform(&mut self, action: BotAction) -> anyhow::Result<()> {
        match action {
            BotAction::Move => {
                self.dir.0 = self.rng.gen_range(-1..=1);
                self.dir.1 = self.rng.gen_range(-1..=1);
            }
            BotAction::Rotate => {
                self.dir.2 = self.rng.gen_range(-1..=1);
            }
            BotAction::Broadcast => {
                let intent = self.intent();
                self.send(ClientMsg::MoveIntent(intent))?;
            }
            BotAction::Fire => {
                if self.rng.gen_range(0..3) > 0 {
                    self.send(ClientMsg::FireIntent)?;
                }
            }
        }
        Ok(())
    }

    fn send(&mut self, msg: ClientMsg) -> anyhow::Result<()> {
        let Some(id) = self.client_id.as_deref() else {
            return Ok(());
        };
        self.transport
            .send(msg.to_wire(id))
            .with_context(|| format!("bot send {msg:?}"))
    }
}
