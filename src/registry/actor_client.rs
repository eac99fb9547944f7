use tokio::sync::mpsc::Sender;
use tokio::sync::oneshot::error::RecvError;
use tokio::sync::oneshot::{self, Receiver as OneshotReceiver, Sender as OneshotSender};

use crate::error::Error;
use crate::player::Session;
use crate::registry::actor::{RegistryCommand, RegistryResponse};
use crate::room::actor_client::RoomClient;

pub struct RegistryClient {
    pub(super) registry_tx: Sender<RegistryCommand>,
}

impl RegistryClient {
    /// Creates a room with its host player, returning the room code, the
    /// host's credentials and the host's normalized display name.
    pub async fn create_room(&self, host_name: &str) -> Result<(String, Session, String), Error> {
        let (tx, rx): (
            OneshotSender<RegistryResponse>,
            OneshotReceiver<RegistryResponse>,
        ) = oneshot::channel();

        self.send_command(
            RegistryCommand::CreateRoom {
                host_name: host_name.to_string(),
                response_channel: tx,
            },
            "The registry is not alive. Can't create a room",
        )
        .await?;

        match rx.await {
            Ok(RegistryResponse::RoomCreated {
                code,
                host_session,
                host_name,
            }) => Ok((code, host_session, host_name)),
            error => Err(RegistryClient::handle_event_error(error)),
        }
    }

    pub async fn remove_room(&self, code: &str) -> Result<(), Error> {
        self.send_command(
            RegistryCommand::RemoveRoom {
                code: code.to_string(),
            },
            "The registry channel is closed",
        )
        .await
    }

    pub async fn get_room(&self, code: &str) -> Result<RoomClient, Error> {
        let (tx, rx): (
            OneshotSender<RegistryResponse>,
            OneshotReceiver<RegistryResponse>,
        ) = oneshot::channel();

        self.send_command(
            RegistryCommand::GetRoom {
                code: code.to_string(),
                response_channel: tx,
            },
            "The registry channel is closed",
        )
        .await?;

        match rx.await {
            Ok(RegistryResponse::RoomActor { room }) => Ok(room),
            error => Err(RegistryClient::handle_event_error(error)),
        }
    }

    async fn send_command(
        &self,
        command: RegistryCommand,
        error_message: &str,
    ) -> Result<(), Error> {
        self.registry_tx.send(command).await.map_err(|error| {
            Error::log_and_create_internal(&format!("{error_message}. Error: '{error}'."))
        })
    }

    fn handle_event_error(error: Result<RegistryResponse, RecvError>) -> Error {
        match error {
            Ok(RegistryResponse::Error { error }) => error,
            Ok(unexpected_response) => Error::log_and_create_internal(&format!(
                "Received an unexpected RegistryResponse. RegistryResponse: '{unexpected_response}'."
            )),
            _ => Error::log_and_create_internal(
                "Sent a command to the registry actor, but the actor channel died.",
            ),
        }
    }
}
