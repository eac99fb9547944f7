use axum::extract::ws::{Message, WebSocket};
use tokio::select;
use uuid::Uuid;

use crate::room::actor::RoomWideEvent;
use crate::room::actor_client::{RoomClient, RoomWideEventReceiver};
use crate::websocket::message::WsMessageOut;
use crate::websocket::{close, send_error_and_close, send_message, send_message_string};

/// Read-only bridge between one websocket and a room's state stream.
/// Spectators never appear in the roster: subscribing has no join side
/// effect, and dropping the connection drops the subscription. A spectator
/// may still pass their player id to get the viewer-scoped projection.
pub struct SpectatorActor {
    viewer: Option<Uuid>,
    room_wide_event_receiver: RoomWideEventReceiver,
    websocket: WebSocket,
}

impl SpectatorActor {
    pub async fn create(viewer: Option<Uuid>, room: RoomClient, websocket: WebSocket) {
        match room.subscribe().await {
            Ok(room_wide_event_receiver) => {
                SpectatorActor {
                    viewer,
                    room_wide_event_receiver,
                    websocket,
                }
                .start()
                .await
            }
            Err(error) => send_error_and_close(websocket, &error).await,
        }
    }

    async fn start(mut self) {
        loop {
            select! {
                room_wide_message = self.room_wide_event_receiver.next() => {
                    match room_wide_message {
                        Ok(RoomWideEvent::RoomState { view }) => {
                            let snapshot = view.project(self.viewer.unwrap_or(Uuid::nil()));
                            let message = WsMessageOut::RoomState { snapshot };
                            if send_message(&mut self.websocket, &message).await.is_err() {
                                break;
                            }
                        }
                        // The room actor stopped; nothing left to stream.
                        Err(_) => break,
                    }
                },
                websocket_message = self.websocket.recv() => {
                    match websocket_message {
                        Some(Ok(Message::Text(text))) if text == "ping" => {
                            if send_message_string(&mut self.websocket, "pong").await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Err(_)) => break,
                        Some(Ok(_)) => (),
                    }
                },
            }
        }

        close(self.websocket).await;
    }
}
