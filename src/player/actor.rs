use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use tokio::select;
use tokio::time::error::Elapsed;
use tokio::time::timeout;

use crate::error::Error;
use crate::metrics::CONNECTED_PLAYERS;
use crate::player::Session;
use crate::room::actor::RoomWideEvent;
use crate::room::actor_client::{RoomClient, RoomWideEventReceiver};
use crate::websocket::message::{WsMessageIn, WsMessageOut};
use crate::websocket::{
    close, parse_message, send_error, send_error_and_close, send_message, send_message_string,
};

/// Bridges one websocket connection with the room actor. Lives as long as
/// the connection: an explicit `leave` removes the player from the room,
/// every other way of dropping the connection only marks them disconnected
/// so they can rejoin with their session.
pub struct PlayerActor {
    session: Session,
    player_name: String,
    room_code: String,
    room: RoomClient,
    room_wide_event_receiver: RoomWideEventReceiver,
    websocket: WebSocket,
    ping_timeout: Duration,
}

impl PlayerActor {
    pub async fn create(
        room_code: String,
        name: String,
        session: Option<Session>,
        room: RoomClient,
        mut websocket: WebSocket,
    ) {
        match room.join(&name, session).await {
            Ok((session, player_name, room_wide_event_receiver)) => {
                let joined = WsMessageOut::Joined {
                    room_code: room_code.clone(),
                    player_id: session.player_id,
                    session_token: session.session_token.clone(),
                    player_name: player_name.clone(),
                };
                if let Err(error) = send_message(&mut websocket, &joined).await {
                    log::info!("Could not deliver the join confirmation. Error: '{error}'.");
                    close(websocket).await;
                    return;
                }

                PlayerActor {
                    session,
                    player_name,
                    room_code,
                    room,
                    room_wide_event_receiver,
                    websocket,
                    ping_timeout: Duration::from_millis(2500),
                }
                .start()
                .await
            }
            Err(error) => send_error_and_close(websocket, &error).await,
        }
    }

    async fn start(mut self) {
        CONNECTED_PLAYERS.inc();

        loop {
            select! {
                room_wide_message = self.room_wide_event_receiver.next() => {
                    if let Err(error) = self.receive_room_wide_message(room_wide_message).await {
                        send_error(&mut self.websocket, &error).await;
                        if PlayerActor::should_close_websocket(&error) {
                            break;
                        }
                    }
                },
                websocket_message = timeout(self.ping_timeout, self.websocket.recv()) => {
                    if let Err(error) = self.receive_websocket_message(websocket_message).await {
                        send_error(&mut self.websocket, &error).await;
                        if PlayerActor::should_close_websocket(&error) {
                            break;
                        }
                    }
                },
            }
        }

        let _ = self.room.disconnect_player(self.session.player_id).await;
        close(self.websocket).await;
        CONNECTED_PLAYERS.dec();
    }

    fn should_close_websocket(error: &Error) -> bool {
        match error {
            Error::Internal(_) => true,
            Error::WebsocketClosed(_) => true,
            Error::UnprocessableMessage(_, _) => false,
            Error::Domain(_) => false,
        }
    }

    async fn receive_room_wide_message(
        &mut self,
        room_wide_message: Result<RoomWideEvent, Error>,
    ) -> Result<(), Error> {
        match room_wide_message {
            Ok(RoomWideEvent::RoomState { view }) => {
                let snapshot = view.project(self.session.player_id);
                send_message(&mut self.websocket, &WsMessageOut::RoomState { snapshot }).await
            }
            Err(error) => Err(error),
        }
    }

    async fn receive_websocket_message(
        &mut self,
        websocket_message: Result<Option<Result<Message, axum::Error>>, Elapsed>,
    ) -> Result<(), Error> {
        match websocket_message {
            Ok(Some(Ok(Message::Text(text)))) => match text.as_str() {
                "ping" => send_message_string(&mut self.websocket, "pong").await,
                message => match parse_message(message)? {
                    WsMessageIn::StartGame => self.room.start_game(&self.session).await,
                    WsMessageIn::SubmitDefinition { text } => {
                        self.room.submit_definition(&self.session, &text).await
                    }
                    WsMessageIn::Vote { option_id } => {
                        self.room.vote(&self.session, &option_id).await
                    }
                    WsMessageIn::NextRound => self.room.next_round(&self.session).await,
                    WsMessageIn::PlayAgain => self.room.play_again(&self.session).await,
                    WsMessageIn::Leave => {
                        self.room.leave(&self.session).await?;
                        self.log_connection_lost("the player left the room");
                        Err(Error::WebsocketClosed(
                            "the player left the room".to_string(),
                        ))
                    }
                },
            },
            // browser said "close"
            Ok(Some(Ok(Message::Close(_)))) => {
                self.log_connection_lost("browser sent 'Close' websocket frame");
                Err(Error::WebsocketClosed(
                    "browser sent 'Close' websocket frame".to_string(),
                ))
            }
            // websocket was closed
            Ok(None) => {
                self.log_connection_lost("other end of websocket was closed abruptly");
                Err(Error::WebsocketClosed(
                    "other end of websocket was closed abruptly".to_string(),
                ))
            }
            // timeout without receiving anything from the player
            Err(_) => {
                self.log_connection_lost("connection timed out; missing 'ping' messages");
                Err(Error::WebsocketClosed(
                    "connection timed out; missing 'ping' messages".to_string(),
                ))
            }
            Ok(Some(Err(error))) => Err(Error::UnprocessableMessage(
                "Message cannot be loaded".to_string(),
                error.to_string(),
            )),
            Ok(Some(Ok(_))) => Err(Error::UnprocessableMessage(
                "Unsupported message type".to_string(),
                "Unsupported message type".to_string(),
            )),
        }
    }

    fn log_connection_lost(&self, reason: &str) {
        log::info!(
            "Connection with player {} of room {} lost due to: {}. Stopping player actor.",
            self.player_name,
            self.room_code,
            reason,
        );
    }
}
