pub mod domain_error;

use thiserror::Error;

use self::domain_error::DomainError;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Domain(DomainError),
    #[error("Internal error: '{0}'.")]
    Internal(String),
    #[error("Could not interpret the incoming message. Message: '{1}', Error: '{0}'.")]
    UnprocessableMessage(String, String),
    #[error("The websocket with the player is closed. Reason: '{0}'.")]
    WebsocketClosed(String),
}

impl Error {
    /// Stable wire code of the error, exposed as the `code` field of HTTP
    /// and websocket error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Domain(domain_error) => domain_error.kind().as_str(),
            Error::Internal(_) => "INTERNAL_SERVER",
            Error::UnprocessableMessage(_, _) => "UNPROCESSABLE_MESSAGE",
            Error::WebsocketClosed(_) => "WEBSOCKET_CLOSED",
        }
    }

    pub fn log_and_create_internal(message: &str) -> Error {
        log::error!("{message}");
        Error::Internal(message.to_string())
    }
}
