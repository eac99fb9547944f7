use tokio::sync::broadcast;
use tokio::sync::mpsc::Sender;
use tokio::sync::oneshot::{self, Receiver as OneshotReceiver, Sender as OneshotSender};
use uuid::Uuid;

use crate::error::Error;
use crate::player::Session;
use crate::room::actor::{RoomCommand, RoomEvent, RoomWideEvent};
use crate::snapshot::RoomSnapshot;

#[derive(Clone, Debug)]
pub struct RoomClient {
    pub(super) room_tx: Sender<RoomCommand>,
}

impl RoomClient {
    /// Joins (or, with a valid session, rejoins) the room, returning the
    /// caller's credentials, the display name the room settled on and a
    /// subscription to the room's state stream.
    pub async fn join(
        &self,
        name: &str,
        session: Option<Session>,
    ) -> Result<(Session, String, RoomWideEventReceiver), Error> {
        let (tx, rx): (OneshotSender<RoomEvent>, OneshotReceiver<RoomEvent>) = oneshot::channel();

        self.room_tx
            .send(RoomCommand::Join {
                name: name.to_string(),
                session,
                response_tx: tx,
            })
            .await
            // Reached when the room still exists in the registry but its
            // actor already stopped, e.g. a rejoin attempt racing the
            // inactivity shutdown.
            .map_err(|error| {
                Error::log_and_create_internal(&format!(
                    "The room is not alive. Can't join the room. Error: '{error}'."
                ))
            })?;

        match rx.await {
            Ok(RoomEvent::Joined {
                session,
                player_name,
                broadcast_rx,
            }) => Ok((session, player_name, RoomWideEventReceiver { broadcast_rx })),
            Ok(RoomEvent::Error { error }) => Err(error),
            _ => Err(Error::log_and_create_internal(
                "Sent a RoomCommand::Join to the room, but the room channel died.",
            )),
        }
    }

    pub async fn disconnect_player(&self, player_id: Uuid) -> Result<(), Error> {
        self.room_tx
            .send(RoomCommand::Disconnect { player_id })
            .await
            .map_err(|error| {
                Error::log_and_create_internal(&format!(
                    "Tried to send RoomCommand::Disconnect but the room actor is not listening. Error: '{error}'."
                ))
            })
    }

    pub async fn leave(&self, session: &Session) -> Result<(), Error> {
        self.round_trip(|response_tx| RoomCommand::Leave {
            session: session.clone(),
            response_tx,
        })
        .await
    }

    pub async fn start_game(&self, session: &Session) -> Result<(), Error> {
        self.round_trip(|response_tx| RoomCommand::StartGame {
            session: session.clone(),
            response_tx,
        })
        .await
    }

    pub async fn submit_definition(&self, session: &Session, text: &str) -> Result<(), Error> {
        self.round_trip(|response_tx| RoomCommand::SubmitDefinition {
            session: session.clone(),
            text: text.to_string(),
            response_tx,
        })
        .await
    }

    pub async fn vote(&self, session: &Session, option_id: &str) -> Result<(), Error> {
        self.round_trip(|response_tx| RoomCommand::Vote {
            session: session.clone(),
            option_id: option_id.to_string(),
            response_tx,
        })
        .await
    }

    pub async fn next_round(&self, session: &Session) -> Result<(), Error> {
        self.round_trip(|response_tx| RoomCommand::NextRound {
            session: session.clone(),
            response_tx,
        })
        .await
    }

    pub async fn play_again(&self, session: &Session) -> Result<(), Error> {
        self.round_trip(|response_tx| RoomCommand::PlayAgain {
            session: session.clone(),
            response_tx,
        })
        .await
    }

    /// One-shot projection of the room for the HTTP snapshot endpoint. An
    /// unknown or absent viewer gets the fully redacted projection.
    pub async fn snapshot(&self, viewer: Option<Uuid>) -> Result<RoomSnapshot, Error> {
        let (tx, rx): (OneshotSender<RoomEvent>, OneshotReceiver<RoomEvent>) = oneshot::channel();

        self.room_tx
            .send(RoomCommand::Snapshot {
                viewer,
                response_tx: tx,
            })
            .await
            .map_err(|error| {
                Error::log_and_create_internal(&format!(
                    "Tried to send RoomCommand::Snapshot but the room actor is not listening. Error: '{error}'."
                ))
            })?;

        match rx.await {
            Ok(RoomEvent::Snapshot { snapshot }) => Ok(snapshot),
            Ok(RoomEvent::Error { error }) => Err(error),
            _ => Err(Error::log_and_create_internal(
                "Sent a RoomCommand::Snapshot to the room, but the room channel died.",
            )),
        }
    }

    /// Subscribes to the room's state stream without joining the roster.
    /// Dropping the returned receiver is the unsubscription.
    pub async fn subscribe(&self) -> Result<RoomWideEventReceiver, Error> {
        let (tx, rx): (OneshotSender<RoomEvent>, OneshotReceiver<RoomEvent>) = oneshot::channel();

        self.room_tx
            .send(RoomCommand::Subscribe { response_tx: tx })
            .await
            .map_err(|error| {
                Error::log_and_create_internal(&format!(
                    "Tried to send RoomCommand::Subscribe but the room actor is not listening. Error: '{error}'."
                ))
            })?;

        match rx.await {
            Ok(RoomEvent::Subscribed { broadcast_rx }) => {
                Ok(RoomWideEventReceiver { broadcast_rx })
            }
            Ok(RoomEvent::Error { error }) => Err(error),
            _ => Err(Error::log_and_create_internal(
                "Sent a RoomCommand::Subscribe to the room, but the room channel died.",
            )),
        }
    }

    async fn round_trip(
        &self,
        command: impl FnOnce(OneshotSender<RoomEvent>) -> RoomCommand,
    ) -> Result<(), Error> {
        let (tx, rx): (OneshotSender<RoomEvent>, OneshotReceiver<RoomEvent>) = oneshot::channel();

        self.room_tx.send(command(tx)).await.map_err(|error| {
            Error::log_and_create_internal(&format!(
                "Tried to send a RoomCommand but the room actor is not listening. Error: '{error}'."
            ))
        })?;

        match rx.await {
            Ok(RoomEvent::Ok) => Ok(()),
            Ok(RoomEvent::Error { error }) => Err(error),
            _ => Err(Error::log_and_create_internal(
                "Sent a RoomCommand to the room, but the room channel died.",
            )),
        }
    }
}

pub struct RoomWideEventReceiver {
    broadcast_rx: broadcast::Receiver<RoomWideEvent>,
}

impl RoomWideEventReceiver {
    pub async fn next(&mut self) -> Result<RoomWideEvent, Error> {
        self.broadcast_rx.recv().await.map_err(|error| {
            Error::log_and_create_internal(&format!(
                "The broadcast channel with the room has been closed. Error: '{error}'."
            ))
        })
    }
}
