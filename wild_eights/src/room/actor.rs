//! Room actor implementation with async message handling.
//!
//! Each room is a single-writer task: every command, connectivity change,
//! and timer firing for the room funnels through one mpsc inbox and is
//! applied to the session strictly one at a time. Different rooms run as
//! independent tasks.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::{mpsc, oneshot};

use super::config::RoomConfig;
use super::connections::ConnectionSupervisor;
use super::messages::{JoinReply, PlayerCommand, RoomMessage, TimerEvent};
use crate::game::entities::{Nickname, PlayerId};
use crate::game::errors::GameError;
use crate::game::session::{GameSession, GraceOutcome, SessionEvent};
use crate::net::events::{RoomSnapshot, ServerEvent};
use crate::store::repository::{RoomRecord, RoomStore};

/// Room actor handle for sending messages.
#[derive(Clone)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomMessage>,
    code: String,
}

impl RoomHandle {
    pub fn new(sender: mpsc::Sender<RoomMessage>, code: String) -> Self {
        Self { sender, code }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Send a message to the room. A closed room reports as not found.
    pub async fn send(&self, message: RoomMessage) -> Result<(), GameError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| GameError::RoomNotFound)
    }

    pub async fn join(&self, nickname: Nickname) -> Result<JoinReply, GameError> {
        let (tx, rx) = oneshot::channel();
        self.send(RoomMessage::Join {
            nickname,
            response: tx,
        })
        .await?;
        rx.await.map_err(|_| GameError::RoomNotFound)?
    }

    pub async fn attach(
        &self,
        player: PlayerId,
        sender: mpsc::Sender<ServerEvent>,
    ) -> Result<(), GameError> {
        let (tx, rx) = oneshot::channel();
        self.send(RoomMessage::Attach {
            player,
            sender,
            response: tx,
        })
        .await?;
        rx.await.map_err(|_| GameError::RoomNotFound)?
    }

    pub async fn detach(&self, player: PlayerId) -> Result<(), GameError> {
        self.send(RoomMessage::Detach { player }).await
    }

    pub async fn command(&self, player: PlayerId, command: PlayerCommand) -> Result<(), GameError> {
        let (tx, rx) = oneshot::channel();
        self.send(RoomMessage::Command {
            player,
            command,
            response: tx,
        })
        .await?;
        rx.await.map_err(|_| GameError::RoomNotFound)?
    }

    pub async fn snapshot(&self, player: Option<PlayerId>) -> Result<RoomSnapshot, GameError> {
        let (tx, rx) = oneshot::channel();
        self.send(RoomMessage::Snapshot {
            player,
            response: tx,
        })
        .await?;
        rx.await.map_err(|_| GameError::RoomNotFound)
    }

    pub async fn close(&self) -> Result<(), GameError> {
        let (tx, rx) = oneshot::channel();
        self.send(RoomMessage::Close { response: tx }).await?;
        rx.await.map_err(|_| GameError::RoomNotFound)
    }
}

/// Room actor owning a single session.
pub struct RoomActor {
    code: String,
    config: RoomConfig,
    session: GameSession,
    inbox: mpsc::Receiver<RoomMessage>,
    /// Clone of the inbox sender, used by scheduled timers to call home.
    self_sender: mpsc::Sender<RoomMessage>,
    supervisor: ConnectionSupervisor,
    store: Arc<dyn RoomStore>,
    /// The registry listens here to drop the handle once the actor dies.
    evict_tx: mpsc::Sender<String>,
    color_timer_generation: u64,
    idle_timer_generation: u64,
    is_closed: bool,
}

impl RoomActor {
    pub fn new(
        config: RoomConfig,
        session: GameSession,
        store: Arc<dyn RoomStore>,
        evict_tx: mpsc::Sender<String>,
    ) -> (Self, RoomHandle) {
        let (sender, inbox) = mpsc::channel(100);
        let code = session.code().to_string();
        let handle = RoomHandle::new(sender.clone(), code.clone());
        let actor = Self {
            code,
            config,
            session,
            inbox,
            self_sender: sender,
            supervisor: ConnectionSupervisor::new(),
            store,
            evict_tx,
            color_timer_generation: 0,
            idle_timer_generation: 0,
            is_closed: false,
        };
        (actor, handle)
    }

    /// Run the room's event loop until the room closes.
    pub async fn run(mut self) {
        info!("room {} starting", self.code);

        // A created-but-never-joined room should not live forever.
        self.schedule_idle_check();

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message);
            if self.is_closed {
                break;
            }
        }

        let _ = self.evict_tx.send(self.code.clone()).await;
        info!("room {} closed", self.code);
    }

    fn handle_message(&mut self, message: RoomMessage) {
        match message {
            RoomMessage::Join { nickname, response } => {
                let result = self.session.join(nickname).map(|player| {
                    // The room is live again; stop any pending idle check.
                    self.idle_timer_generation += 1;
                    JoinReply {
                        player,
                        snapshot: self.session.snapshot_for(Some(player)),
                    }
                });
                let committed = result.is_ok();
                let _ = response.send(result);
                if committed {
                    self.after_commit();
                }
            }

            RoomMessage::Attach {
                player,
                sender,
                response,
            } => {
                let result = if self.session.contains_player(player) {
                    self.supervisor.attach(player, sender);
                    self.session.mark_reconnected(player).map(|()| {
                        debug!("room {}: player {} attached", self.code, player);
                    })
                } else {
                    Err(GameError::UnknownPlayer)
                };
                let committed = result.is_ok();
                let _ = response.send(result);
                if committed {
                    // Resynchronize the (re)connected client first.
                    self.supervisor.send_to(
                        player,
                        ServerEvent::Snapshot {
                            room: self.session.snapshot_for(Some(player)),
                        },
                    );
                    self.after_commit();
                }
            }

            RoomMessage::Detach { player } => {
                if !self.session.contains_player(player) {
                    return;
                }
                self.supervisor.detach(player);
                if self.session.mark_disconnected(player).is_ok() {
                    let generation = self.supervisor.bump_grace(player);
                    self.schedule_timer(
                        Duration::from_secs(self.config.grace_period_secs),
                        TimerEvent::GraceExpired { player, generation },
                    );
                    debug!("room {}: player {} entered grace", self.code, player);
                    self.after_commit();
                }
            }

            RoomMessage::Command {
                player,
                command,
                response,
            } => {
                let result = self.dispatch_command(player, command);
                let committed = result.is_ok();
                let _ = response.send(result);
                if committed {
                    self.after_commit();
                }
            }

            RoomMessage::Snapshot { player, response } => {
                let _ = response.send(self.session.snapshot_for(player));
            }

            RoomMessage::Timer(event) => self.handle_timer(event),

            RoomMessage::Close { response } => {
                let _ = response.send(());
                self.close_room();
            }
        }
    }

    fn dispatch_command(
        &mut self,
        player: PlayerId,
        command: PlayerCommand,
    ) -> Result<(), GameError> {
        match command {
            PlayerCommand::AssignSeat { target, position } => {
                self.session.assign_seat(player, target, position)
            }
            PlayerCommand::StartGame => self.session.start_game(player),
            PlayerCommand::PlayCard { index } => self.session.play_card(player, index),
            PlayerCommand::DrawCard => self.session.draw_card(player),
            PlayerCommand::ChooseColor { color } => self.session.choose_color(player, color),
            PlayerCommand::CallUno => self.session.call_uno(player),
            PlayerCommand::PauseGame => self.session.pause(player),
            PlayerCommand::ResumeGame => self.session.resume(player),
            PlayerCommand::LeaveRoom => {
                let outcome = self.session.leave(player)?;
                self.supervisor.forget(player);
                if outcome.room_empty {
                    self.schedule_idle_check();
                }
                Ok(())
            }
            PlayerCommand::KickPlayer { target } => {
                let outcome = self.session.kick(player, target)?;
                self.supervisor.send_to(target, ServerEvent::RoomClosed);
                self.supervisor.forget(target);
                if outcome.room_empty {
                    self.schedule_idle_check();
                }
                Ok(())
            }
        }
    }

    fn handle_timer(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::GraceExpired { player, generation } => {
                if !self.supervisor.grace_is_current(player, generation) {
                    debug!("room {}: stale grace expiry for {}", self.code, player);
                    return;
                }
                match self.session.grace_expired(player) {
                    GraceOutcome::Stale => {}
                    GraceOutcome::SpectatorDropped => {
                        self.supervisor.forget(player);
                        if self.session.is_empty() {
                            self.schedule_idle_check();
                        }
                        self.after_commit();
                    }
                    GraceOutcome::CloseRoom => {
                        info!(
                            "room {}: host gone after the game ended, closing",
                            self.code
                        );
                        self.close_room();
                    }
                    GraceOutcome::SeatHeldOffline
                    | GraceOutcome::HostMigrated(_)
                    | GraceOutcome::AutoPaused => {
                        debug!("room {}: grace expired for {}", self.code, player);
                        self.after_commit();
                    }
                }
            }

            TimerEvent::ColorChoiceTimeout { generation } => {
                if generation != self.color_timer_generation {
                    return;
                }
                if self.session.choose_color_timeout().is_some() {
                    self.after_commit();
                }
            }

            TimerEvent::RoomIdle { generation } => {
                if generation != self.idle_timer_generation {
                    return;
                }
                if self.session.is_empty()
                    || self.session.status() == crate::game::entities::RoomStatus::Finished
                {
                    info!("room {} idle, closing", self.code);
                    self.close_room();
                }
            }
        }
    }

    /// Post-commit duties shared by every mutation: drain and fan out
    /// notifications, keep timers in line with the new state, then push a
    /// fresh personalized snapshot to every live connection.
    fn after_commit(&mut self) {
        let events = self.session.drain_events();
        for event in events {
            debug!("room {}: {}", self.code, event);
            match event {
                SessionEvent::GameStarted => self.persist_milestone(),
                SessionEvent::ColorChoiceRequested(player) => {
                    self.color_timer_generation += 1;
                    self.schedule_timer(
                        Duration::from_secs(self.config.color_choice_timeout_secs),
                        TimerEvent::ColorChoiceTimeout {
                            generation: self.color_timer_generation,
                        },
                    );
                    self.supervisor
                        .broadcast(&ServerEvent::ColorChoiceRequested { player });
                }
                SessionEvent::UnoCalled(player) => {
                    self.supervisor.broadcast(&ServerEvent::UnoCalled { player });
                }
                SessionEvent::PenaltyApplied { player, amount } => {
                    self.supervisor
                        .broadcast(&ServerEvent::PenaltyApplied { player, amount });
                }
                SessionEvent::PlayerFinished { player, rank } => {
                    info!(
                        "room {}: player {} finished at rank {}",
                        self.code, player, rank
                    );
                }
                SessionEvent::GameEnded { winner, rankings } => {
                    self.persist_milestone();
                    self.schedule_idle_check();
                    self.supervisor
                        .broadcast(&ServerEvent::GameEnded { winner, rankings });
                }
                SessionEvent::HostMigrated(new_host) => {
                    self.supervisor
                        .broadcast(&ServerEvent::HostMigrated { new_host });
                }
            }
        }

        // A gate that closed by any path invalidates its timeout.
        if self.session.awaiting_color_from().is_none() {
            self.color_timer_generation += 1;
        }

        self.broadcast_snapshots();
    }

    fn broadcast_snapshots(&mut self) {
        for player in self.supervisor.linked_players() {
            let room = self.session.snapshot_for(Some(player));
            self.supervisor.send_to(player, ServerEvent::Snapshot { room });
        }
    }

    fn schedule_timer(&self, delay: Duration, event: TimerEvent) {
        let sender = self.self_sender.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = sender.send(RoomMessage::Timer(event)).await;
        });
    }

    fn schedule_idle_check(&mut self) {
        self.idle_timer_generation += 1;
        self.schedule_timer(
            Duration::from_secs(self.config.finished_room_ttl_secs),
            TimerEvent::RoomIdle {
                generation: self.idle_timer_generation,
            },
        );
    }

    /// Persist the room on significant milestones (start, finish), never
    /// per turn. Failures are logged, not fatal: storage is a collaborator,
    /// not the source of truth for a live room.
    fn persist_milestone(&self) {
        let record = RoomRecord {
            code: self.code.clone(),
            kind: self.session.kind(),
            status: self.session.status(),
            player_count: self.session.player_count(),
            rankings: self.session.rankings(),
            updated_at: chrono::Utc::now(),
        };
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(err) = store.save_room(&record).await {
                warn!("failed to persist room {}: {err}", record.code);
            }
        });
    }

    fn close_room(&mut self) {
        self.supervisor.broadcast(&ServerEvent::RoomClosed);
        self.is_closed = true;
    }
}
