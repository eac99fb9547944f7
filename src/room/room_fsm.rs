use std::fmt;

use rust_fsm::state_machine;

state_machine! {
    derive(Debug, Clone, PartialEq)
    pub RoomFsm(Lobby)

    Lobby => {
        StartGame => Writing,
    },
    Writing => {
        DefinitionsReady => Voting,
        GenerationFailed => Error,
        EndGame => FinalResults,
    },
    Voting => {
        VotesTallied => RoundResults,
        NoMoreRounds => FinalResults,
        EndGame => FinalResults,
    },
    RoundResults => {
        NextRound => Writing,
        EndGame => FinalResults,
    },
    FinalResults => {
        PlayAgain => Lobby,
    },
    Error => {
        PlayAgain => Lobby,
    }
}

impl RoomFsmState {
    /// Wire name of the phase, as exposed in snapshots.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomFsmState::Lobby => "LOBBY",
            RoomFsmState::Writing => "WRITING",
            RoomFsmState::Voting => "VOTING",
            RoomFsmState::RoundResults => "ROUND_RESULTS",
            RoomFsmState::FinalResults => "FINAL_RESULTS",
            RoomFsmState::Error => "ERROR",
        }
    }
}

impl fmt::Display for RoomFsmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
