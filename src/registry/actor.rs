use std::fmt::{Display, Formatter};
use std::sync::Arc;

use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::oneshot::Sender as OneshotSender;

use crate::config::GameSettings;
use crate::error::Error;
use crate::generator::RoundGenerator;
use crate::player::Session;
use crate::registry::actor_client::RegistryClient;
use crate::registry::RoomRegistry;
use crate::room::actor_client::RoomClient;

pub struct RegistryActor {
    registry: RoomRegistry,
    registry_rx: Receiver<RegistryCommand>,
    registry_tx: Sender<RegistryCommand>,
}

impl RegistryActor {
    /// Runs the registry actor in background and returns a client to
    /// communicate with it.
    pub fn spawn(game_settings: GameSettings, generator: Arc<dyn RoundGenerator>) -> RegistryClient {
        let registry = RoomRegistry::new(game_settings, generator);
        let (registry_tx, registry_rx): (Sender<RegistryCommand>, Receiver<RegistryCommand>) =
            mpsc::channel(512);

        tokio::spawn(
            RegistryActor {
                registry,
                registry_rx,
                registry_tx: registry_tx.clone(),
            }
            .start(),
        );

        RegistryClient { registry_tx }
    }

    async fn start(mut self) {
        while let Some(message) = self.registry_rx.recv().await {
            let response = match message {
                RegistryCommand::CreateRoom {
                    host_name,
                    response_channel,
                } => {
                    let result = self
                        .registry
                        .create_room(
                            &host_name,
                            RegistryClient {
                                registry_tx: self.registry_tx.clone(),
                            },
                        )
                        .map(
                            |(code, host_session, host_name)| RegistryResponse::RoomCreated {
                                code,
                                host_session,
                                host_name,
                            },
                        );
                    Some((result, response_channel))
                }
                RegistryCommand::RemoveRoom { code } => {
                    let _ = self.registry.remove_room(&code);
                    None
                }
                RegistryCommand::GetRoom {
                    code,
                    response_channel,
                } => {
                    let result = self
                        .registry
                        .get_room(&code)
                        .map(|room| RegistryResponse::RoomActor { room: room.clone() });
                    Some((result, response_channel))
                }
            };
            if let Some((result, response_tx)) = response {
                let event = match result {
                    Ok(event) => event,
                    Err(error) => RegistryResponse::Error { error },
                };
                if let Err(error) = response_tx.send(event) {
                    log::error!(
                        "Sent a RegistryResponse but the response channel is closed. Error: '{error}'."
                    );
                }
            }
        }
    }
}

#[derive(Debug)]
pub(crate) enum RegistryCommand {
    CreateRoom {
        host_name: String,
        response_channel: OneshotSender<RegistryResponse>,
    },
    RemoveRoom {
        code: String,
    },
    GetRoom {
        code: String,
        response_channel: OneshotSender<RegistryResponse>,
    },
}

#[allow(clippy::enum_variant_names)]
#[derive(Debug)]
pub(crate) enum RegistryResponse {
    RoomCreated {
        code: String,
        host_session: Session,
        host_name: String,
    },
    RoomActor {
        room: RoomClient,
    },
    Error {
        error: Error,
    },
}

impl Display for RegistryResponse {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                RegistryResponse::RoomCreated { code, .. } =>
                    format!("RoomCreated(code: {code})"),
                RegistryResponse::RoomActor { room: _ } => "RoomActor".to_string(),
                RegistryResponse::Error { error } => format!("Error '{error}'"),
            }
        )
    }
}
