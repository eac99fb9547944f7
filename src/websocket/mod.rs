pub mod message;

use axum::extract::ws::{Message, WebSocket};
use serde::Serialize;

use crate::error::domain_error::DomainErrorKind;
use crate::error::Error;

use self::message::{WsMessageIn, WsMessageOut};

pub async fn send_error_and_close(mut websocket: WebSocket, error: &Error) {
    // The websocket is being closed anyway, ignore failures of the last message.
    let _ = send_message(&mut websocket, &error_to_ws_error(error)).await;
    if let Err(error) = websocket.close().await {
        log::error!("Could not close the websocket after sending an error. Error: '{error}'.");
    }
}

pub async fn close(websocket: WebSocket) {
    if let Err(error) = websocket.close().await {
        log::debug!("Could not close the websocket. Error: '{error}'.");
    }
}

pub async fn send_error(websocket: &mut WebSocket, error: &Error) {
    if let Err(error) = send_message(websocket, &error_to_ws_error(error)).await {
        log::debug!("Could not send an error message through the websocket. Error: '{error}'.");
    }
}

pub fn parse_message(message: &str) -> Result<WsMessageIn, Error> {
    serde_json::from_str(message)
        .map_err(|error| Error::UnprocessableMessage(error.to_string(), message.to_string()))
}

pub async fn send_message<T>(websocket: &mut WebSocket, value: &T) -> Result<(), Error>
where
    T: ?Sized + Serialize,
{
    let message = serde_json::to_string(value).map_err(|error| {
        Error::log_and_create_internal(&format!(
            "Could not serialize the message. Error: '{error}'."
        ))
    })?;

    send_message_string(websocket, &message).await
}

pub async fn send_message_string(websocket: &mut WebSocket, message: &str) -> Result<(), Error> {
    websocket
        .send(Message::Text(message.to_string()))
        .await
        .map_err(|error| Error::WebsocketClosed(error.to_string()))
}

pub fn error_to_ws_error(error: &Error) -> WsMessageOut {
    WsMessageOut::Error {
        code: error.code().to_string(),
        title: error_title(error).to_string(),
        detail: error.to_string(),
    }
}

fn error_title(error: &Error) -> &'static str {
    match error {
        Error::Domain(domain_error) => match domain_error.kind() {
            DomainErrorKind::NotFound => "The resource does not exist",
            DomainErrorKind::Unauthorized => "The session credentials are not valid",
            DomainErrorKind::Forbidden => "The player is not allowed to do this",
            DomainErrorKind::InvalidState => "The room is not in a state that allows this",
            DomainErrorKind::InvalidInput => "The request is not valid",
            DomainErrorKind::Exhausted => "No capacity left",
            DomainErrorKind::UpstreamFailure => "An upstream dependency failed",
        },
        Error::Internal(_) => "Internal server error",
        Error::UnprocessableMessage(_, _) => "The message could not be processed",
        Error::WebsocketClosed(_) => "The player websocket is closed",
    }
}
