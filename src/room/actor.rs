use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::SendError;
use tokio::sync::oneshot::Sender as OneshotSender;
use tokio::sync::{
    broadcast, mpsc,
    mpsc::{Receiver, Sender},
};
use tokio::time;
use uuid::Uuid;

use crate::config::GameSettings;
use crate::error::domain_error::DomainError;
use crate::error::Error;
use crate::generator::{GeneratorError, NormalizedDefinition, RoundGenerator};
use crate::metrics::ACTIVE_ROOMS;
use crate::player::Session;
use crate::registry::actor_client::RegistryClient;
use crate::room::actor_client::RoomClient;
use crate::room::room_fsm::RoomFsmState;
use crate::room::{NextRoundPlan, Room};
use crate::snapshot::{RoomSnapshot, RoomView};

pub struct RoomActor {
    room: Room,
    generator: Arc<dyn RoundGenerator>,
    room_rx: Receiver<RoomCommand>,
    /// Handle the actor gives to its own timers and normalization tasks, so
    /// that their outcomes re-enter the queue as ordinary commands.
    room_tx: Sender<RoomCommand>,
    broadcast_tx: broadcast::Sender<RoomWideEvent>,
    registry: RegistryClient,
    inactivity_timeout: Duration,
}

impl RoomActor {
    /// Runs the room actor in background, returning a client to talk to it
    /// plus the credentials of the host player created with the room.
    pub fn spawn(
        code: &str,
        settings: GameSettings,
        host_name: &str,
        generator: Arc<dyn RoundGenerator>,
        registry: RegistryClient,
    ) -> Result<(RoomClient, Session, String), Error> {
        let inactivity_timeout = settings.inactivity_timeout();
        let room = Room::new(code, settings, host_name)?;
        let host_session = room.host_player().session();
        let host_name = room.host_player().name.clone();
        let (room_tx, room_rx): (Sender<RoomCommand>, Receiver<RoomCommand>) = mpsc::channel(128);
        let (broadcast_tx, _): (
            broadcast::Sender<RoomWideEvent>,
            broadcast::Receiver<RoomWideEvent>,
        ) = broadcast::channel(32);

        tokio::spawn(
            RoomActor {
                room,
                generator,
                room_rx,
                room_tx: room_tx.clone(),
                broadcast_tx,
                registry,
                inactivity_timeout,
            }
            .start(),
        );

        Ok((RoomClient { room_tx }, host_session, host_name))
    }

    async fn start(mut self) {
        ACTIVE_ROOMS.inc();

        loop {
            match time::timeout(self.inactivity_timeout, self.room_rx.recv()).await {
                Err(_) => {
                    if self.room.all_players_are_disconnected() {
                        log::info!(
                            "No activity detected in room {} after {} seconds. Stopping room actor.",
                            self.room.code(),
                            self.inactivity_timeout.as_secs()
                        );
                        break;
                    }
                }
                Ok(None) => {
                    log::info!("Room channel has been dropped. Stopping room actor.");
                    break;
                }
                Ok(Some(command)) => {
                    if self.handle(command).await == Flow::Stop {
                        break;
                    }
                }
            }
        }

        self.stop_room().await;
        ACTIVE_ROOMS.dec();
    }

    async fn handle(&mut self, command: RoomCommand) -> Flow {
        let mut flow = Flow::Continue;
        let response = match command {
            RoomCommand::Join {
                name,
                session,
                response_tx,
            } => {
                let result = self
                    .room
                    .join(&name, session.as_ref())
                    .map(|player_id| RoomEvent::Joined {
                        session: self.session_of(player_id),
                        player_name: self.name_of(player_id),
                        broadcast_rx: self.broadcast_tx.subscribe(),
                    });
                Some((result, response_tx))
            }
            RoomCommand::Disconnect { player_id } => {
                self.room.mark_disconnected(player_id);
                None
            }
            RoomCommand::Leave {
                session,
                response_tx,
            } => {
                let result = self
                    .room
                    .authenticate(&session)
                    .and_then(|player_id| self.room.remove_player(player_id))
                    .map(|removal| {
                        if removal.room_is_empty {
                            flow = Flow::Stop;
                        }
                        RoomEvent::Ok
                    });
                Some((result, response_tx))
            }
            RoomCommand::StartGame {
                session,
                response_tx,
            } => {
                let result = self.start_game(&session).await;
                Some((result, response_tx))
            }
            RoomCommand::SubmitDefinition {
                session,
                text,
                response_tx,
            } => {
                let result = self
                    .room
                    .authenticate(&session)
                    .and_then(|player_id| self.room.submit_definition(player_id, &text));
                let result = match result {
                    Ok(all_submitted) => {
                        if all_submitted {
                            self.trigger_writing_finalization();
                        }
                        Ok(RoomEvent::Ok)
                    }
                    Err(error) => Err(error),
                };
                Some((result, response_tx))
            }
            RoomCommand::Vote {
                session,
                option_id,
                response_tx,
            } => {
                let result = self
                    .room
                    .authenticate(&session)
                    .and_then(|player_id| self.room.vote(player_id, &option_id));
                let result = match result {
                    Ok(all_voted) => {
                        if all_voted {
                            let round = self.room.round_number();
                            if let Err(error) = self.room.try_finalize_voting(round) {
                                log::error!("Voting finalization failed. Error: '{error}'.");
                            }
                        }
                        Ok(RoomEvent::Ok)
                    }
                    Err(error) => Err(error),
                };
                Some((result, response_tx))
            }
            RoomCommand::NextRound {
                session,
                response_tx,
            } => {
                let result = self.next_round(&session).await;
                Some((result, response_tx))
            }
            RoomCommand::PlayAgain {
                session,
                response_tx,
            } => {
                let result = self
                    .room
                    .authenticate(&session)
                    .and_then(|player_id| self.room.play_again(player_id))
                    .map(|_| RoomEvent::Ok);
                Some((result, response_tx))
            }
            RoomCommand::Snapshot {
                viewer,
                response_tx,
            } => {
                let view = RoomView::of(&self.room);
                let snapshot = view.project(viewer.unwrap_or(Uuid::nil()));
                Some((Ok(RoomEvent::Snapshot { snapshot }), response_tx))
            }
            RoomCommand::Subscribe { response_tx } => {
                // The broadcast sent after this command doubles as the
                // subscriber's initial state.
                let broadcast_rx = self.broadcast_tx.subscribe();
                Some((Ok(RoomEvent::Subscribed { broadcast_rx }), response_tx))
            }
            RoomCommand::WritingDeadline { round_number } => {
                if self.room.state() == &RoomFsmState::Writing
                    && self.room.round_number() == round_number
                {
                    self.trigger_writing_finalization();
                }
                None
            }
            RoomCommand::VotingDeadline { round_number } => {
                if let Err(error) = self.room.try_finalize_voting(round_number) {
                    log::error!("Voting finalization failed. Error: '{error}'.");
                }
                None
            }
            RoomCommand::NormalizationComplete {
                round_number,
                result,
            } => {
                self.complete_normalization(round_number, result);
                None
            }
        };

        if let Some((result, response_tx)) = response {
            let event = match result {
                Ok(event) => event,
                Err(error) => RoomEvent::Error { error },
            };
            if let Err(event) = response_tx.send(event) {
                log::error!(
                    "Computed a {event} for a player of room {} but the response channel is closed.",
                    self.room.code()
                );
            }
        }
        let _ = self.send_room_state();
        flow
    }

    async fn start_game(&mut self, session: &Session) -> Result<RoomEvent, Error> {
        let player_id = self.room.authenticate(session)?;
        self.room.ensure_can_start(player_id)?;

        let generated = self
            .generator
            .generate_round(self.room.round_number() + 1, &self.room.used_words())
            .await
            .map_err(|error| Error::Domain(DomainError::GenerationFailed(error.to_string())))?;

        self.room.start_game(player_id, generated)?;
        self.schedule_writing_deadline();
        Ok(RoomEvent::Ok)
    }

    async fn next_round(&mut self, session: &Session) -> Result<RoomEvent, Error> {
        let player_id = self.room.authenticate(session)?;
        match self.room.ensure_can_continue(player_id)? {
            NextRoundPlan::EndGame => {
                self.room.end_game()?;
            }
            NextRoundPlan::StartRound => {
                let generated = self
                    .generator
                    .generate_round(self.room.round_number() + 1, &self.room.used_words())
                    .await
                    .map_err(|error| {
                        Error::Domain(DomainError::GenerationFailed(error.to_string()))
                    })?;
                self.room.next_round(player_id, generated)?;
                self.schedule_writing_deadline();
            }
        }
        Ok(RoomEvent::Ok)
    }

    /// Arms writing finalization once per round and hands the normalization
    /// call to a separate task, so the actor keeps serving commands while
    /// the generator is busy. The outcome comes back as a command and is
    /// fenced against the round it was started for.
    fn trigger_writing_finalization(&mut self) {
        let round_number = self.room.round_number();
        if !self.room.try_begin_writing_finalization(round_number) {
            return;
        }

        let round = self
            .room
            .round()
            .expect("a round exists while finalizing writing");
        let word = round.word.clone();
        let correct_definition = round.correct_definition.clone();
        let inputs = self.room.writing_inputs();
        let generator = Arc::clone(&self.generator);
        let room_tx = self.room_tx.clone();

        tokio::spawn(async move {
            let result = generator
                .normalize_definitions(&word, &correct_definition, inputs)
                .await;
            let _ = room_tx
                .send(RoomCommand::NormalizationComplete {
                    round_number,
                    result,
                })
                .await;
        });
    }

    fn complete_normalization(
        &mut self,
        round_number: u32,
        result: Result<Vec<NormalizedDefinition>, GeneratorError>,
    ) {
        match result {
            Ok(items) => match self.room.apply_normalized_definitions(round_number, items) {
                Ok(true) => self.schedule_voting_deadline(),
                Ok(false) => (),
                Err(error) => {
                    log::error!("Could not install the normalized definitions. Error: '{error}'.");
                }
            },
            Err(generator_error) => {
                // A stale failure must not poison a later round.
                if self.room.state() == &RoomFsmState::Writing
                    && self.room.round_number() == round_number
                {
                    if let Err(error) = self.room.fail_round(&generator_error.to_string()) {
                        log::error!("Could not mark the round as failed. Error: '{error}'.");
                    }
                }
            }
        }
    }

    /// Deadline timers are plain sleeper tasks posting back into the queue.
    /// They are never cancelled: a timer firing for a phase the room already
    /// left is discarded by the round number and phase fencing.
    fn schedule_writing_deadline(&self) {
        let round_number = self.room.round_number();
        let duration = self.room.settings().writing_duration();
        let room_tx = self.room_tx.clone();
        tokio::spawn(async move {
            time::sleep(duration).await;
            let _ = room_tx
                .send(RoomCommand::WritingDeadline { round_number })
                .await;
        });
    }

    fn schedule_voting_deadline(&self) {
        let round_number = self.room.round_number();
        let duration = self.room.settings().voting_duration();
        let room_tx = self.room_tx.clone();
        tokio::spawn(async move {
            time::sleep(duration).await;
            let _ = room_tx
                .send(RoomCommand::VotingDeadline { round_number })
                .await;
        });
    }

    fn name_of(&self, player_id: Uuid) -> String {
        self.room
            .players()
            .iter()
            .find(|player| player.id == player_id)
            .map(|player| player.name.clone())
            .unwrap_or_default()
    }

    fn session_of(&self, player_id: Uuid) -> Session {
        self.room
            .players()
            .iter()
            .find(|player| player.id == player_id)
            .map(|player| player.session())
            .expect("a player that just joined is part of the roster")
    }

    fn send_room_state(&self) -> Result<usize, SendError<RoomWideEvent>> {
        self.broadcast_tx.send(RoomWideEvent::RoomState {
            view: RoomView::of(&self.room),
        })
    }

    async fn stop_room(self) {
        let code = self.room.code();
        if let Err(error) = self.registry.remove_room(code).await {
            log::error!("The registry channel is closed, can't remove the room. RoomCode: '{code}', Error: '{error}'.");
        }
    }
}

#[derive(PartialEq)]
enum Flow {
    Continue,
    Stop,
}

pub(crate) enum RoomCommand {
    Join {
        name: String,
        session: Option<Session>,
        response_tx: OneshotSender<RoomEvent>,
    },
    Disconnect {
        player_id: Uuid,
    },
    Leave {
        session: Session,
        response_tx: OneshotSender<RoomEvent>,
    },
    StartGame {
        session: Session,
        response_tx: OneshotSender<RoomEvent>,
    },
    SubmitDefinition {
        session: Session,
        text: String,
        response_tx: OneshotSender<RoomEvent>,
    },
    Vote {
        session: Session,
        option_id: String,
        response_tx: OneshotSender<RoomEvent>,
    },
    NextRound {
        session: Session,
        response_tx: OneshotSender<RoomEvent>,
    },
    PlayAgain {
        session: Session,
        response_tx: OneshotSender<RoomEvent>,
    },
    Snapshot {
        viewer: Option<Uuid>,
        response_tx: OneshotSender<RoomEvent>,
    },
    Subscribe {
        response_tx: OneshotSender<RoomEvent>,
    },
    WritingDeadline {
        round_number: u32,
    },
    VotingDeadline {
        round_number: u32,
    },
    NormalizationComplete {
        round_number: u32,
        result: Result<Vec<NormalizedDefinition>, GeneratorError>,
    },
}

#[derive(Debug)]
pub(crate) enum RoomEvent {
    Joined {
        session: Session,
        player_name: String,
        broadcast_rx: broadcast::Receiver<RoomWideEvent>,
    },
    Ok,
    Snapshot {
        snapshot: RoomSnapshot,
    },
    Subscribed {
        broadcast_rx: broadcast::Receiver<RoomWideEvent>,
    },
    Error {
        error: Error,
    },
}

impl Display for RoomEvent {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                RoomEvent::Joined { .. } => "RoomEvent::Joined".to_string(),
                RoomEvent::Ok => "RoomEvent::Ok".to_string(),
                RoomEvent::Snapshot { .. } => "RoomEvent::Snapshot".to_string(),
                RoomEvent::Subscribed { .. } => "RoomEvent::Subscribed".to_string(),
                RoomEvent::Error { error } => format!("Error '{error}'"),
            }
        )
    }
}

#[derive(Clone, Debug)]
pub enum RoomWideEvent {
    RoomState { view: RoomView },
}
