use thiserror::Error;

use crate::room::room_fsm::RoomFsmState;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("The room does not exist. RoomCode: '{0}'.")]
    RoomDoesNotExist(String),
    #[error("The room code is malformed. RoomCode: '{0}'.")]
    MalformedRoomCode(String),
    #[error("Ran out of attempts to generate a unique room code.")]
    RoomCodesExhausted,
    #[error("The session credentials do not match any player of the room.")]
    InvalidSession,
    #[error("A non host player cannot start the game. Name: '{0}'.")]
    NonHostPlayerCannotStartGame(String),
    #[error("A non host player cannot continue the game to the next round. Name: '{0}'.")]
    NonHostPlayerCannotContinueToNextRound(String),
    #[error("A non host player cannot send play again. Name: '{0}'.")]
    NonHostPlayerCannotSendPlayAgain(String),
    #[error("Invalid phase for starting the game. ActualPhase: '{0:?}'.")]
    InvalidPhaseForStartingGame(RoomFsmState),
    #[error("Invalid phase for submitting a definition. ActualPhase: '{0:?}', ExpectedPhase: '{1:?}'.")]
    InvalidPhaseForDefinitionSubmission(RoomFsmState, RoomFsmState),
    #[error("Invalid phase for voting. ActualPhase: '{0:?}', ExpectedPhase: '{1:?}'.")]
    InvalidPhaseForVote(RoomFsmState, RoomFsmState),
    #[error("Invalid phase for continuing to the next round. ActualPhase: '{0:?}', ExpectedPhase: '{1:?}'.")]
    InvalidPhaseForNextRound(RoomFsmState, RoomFsmState),
    #[error("Invalid phase for playing again. ActualPhase: '{0:?}'.")]
    InvalidPhaseForPlayAgain(RoomFsmState),
    #[error("Not enough players to start the game. ActualPlayers: '{0}', MinimumPlayers: '{1}'.")]
    NotEnoughPlayers(usize, usize),
    #[error("The room is full. MaximumPlayers: '{0}'.")]
    RoomFull(usize),
    #[error("The player name cannot be empty.")]
    EmptyPlayerName,
    #[error("The definition cannot be empty.")]
    EmptyDefinition,
    #[error("The vote option does not exist in the current round. OptionId: '{0}'.")]
    UnknownVoteOption(String),
    #[error("The text generation service failed. Reason: '{0}'.")]
    GenerationFailed(String),
}

/// Stable taxonomy code of a [DomainError], used by the HTTP status mapping
/// and the websocket error `code` field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DomainErrorKind {
    NotFound,
    Unauthorized,
    Forbidden,
    InvalidState,
    InvalidInput,
    Exhausted,
    UpstreamFailure,
}

impl DomainError {
    pub fn kind(&self) -> DomainErrorKind {
        match self {
            DomainError::RoomDoesNotExist(_) => DomainErrorKind::NotFound,
            DomainError::InvalidSession => DomainErrorKind::Unauthorized,
            DomainError::NonHostPlayerCannotStartGame(_)
            | DomainError::NonHostPlayerCannotContinueToNextRound(_)
            | DomainError::NonHostPlayerCannotSendPlayAgain(_) => DomainErrorKind::Forbidden,
            DomainError::InvalidPhaseForStartingGame(_)
            | DomainError::InvalidPhaseForDefinitionSubmission(_, _)
            | DomainError::InvalidPhaseForVote(_, _)
            | DomainError::InvalidPhaseForNextRound(_, _)
            | DomainError::InvalidPhaseForPlayAgain(_)
            | DomainError::NotEnoughPlayers(_, _)
            | DomainError::RoomFull(_) => DomainErrorKind::InvalidState,
            DomainError::MalformedRoomCode(_)
            | DomainError::EmptyPlayerName
            | DomainError::EmptyDefinition
            | DomainError::UnknownVoteOption(_) => DomainErrorKind::InvalidInput,
            DomainError::RoomCodesExhausted => DomainErrorKind::Exhausted,
            DomainError::GenerationFailed(_) => DomainErrorKind::UpstreamFailure,
        }
    }
}

impl DomainErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainErrorKind::NotFound => "NOT_FOUND",
            DomainErrorKind::Unauthorized => "UNAUTHORIZED",
            DomainErrorKind::Forbidden => "FORBIDDEN",
            DomainErrorKind::InvalidState => "INVALID_STATE",
            DomainErrorKind::InvalidInput => "INVALID_INPUT",
            DomainErrorKind::Exhausted => "EXHAUSTED",
            DomainErrorKind::UpstreamFailure => "UPSTREAM_FAILURE",
        }
    }
}
