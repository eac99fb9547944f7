use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::player::Player;
use crate::room::room_fsm::RoomFsmState;
use crate::room::Room;
use crate::round::Round;

/// Owned copy of a room's state, captured inside the room actor. Projection
/// into per-viewer snapshots happens on the receiving side, outside the
/// actor's message loop.
#[derive(Clone, Debug)]
pub struct RoomView {
    pub code: String,
    pub state: RoomFsmState,
    pub host_id: Uuid,
    pub players: Vec<Player>,
    pub round: Option<Round>,
    pub round_number: u32,
    pub total_rounds: u32,
    pub updated_at: u64,
}

impl RoomView {
    pub fn of(room: &Room) -> Self {
        RoomView {
            code: room.code().to_string(),
            state: room.state().clone(),
            host_id: room.host_id(),
            players: room.players().to_vec(),
            round: room.round().cloned(),
            round_number: room.round_number(),
            total_rounds: room.settings().total_rounds,
            updated_at: room.updated_at(),
        }
    }

    /// Projects the view for one player. Everything a client is not supposed
    /// to see yet is redacted here: the options stay empty while definitions
    /// are being written, bluff authorship, the correct option and the score
    /// deltas only appear once the round's results are public.
    pub fn project(&self, viewer: Uuid) -> RoomSnapshot {
        let results_public = matches!(
            self.state,
            RoomFsmState::RoundResults | RoomFsmState::FinalResults
        );
        let options_public = results_public || self.state == RoomFsmState::Voting;

        let round = self.round.as_ref().map(|round| RoundSnapshot {
            word: round.word.clone(),
            phase_started_at: round.phase_started_at,
            phase_ends_at: round.phase_ends_at,
            submitted_count: round.submitted_count(),
            you_submitted: round.has_submitted(viewer),
            options: if options_public {
                round
                    .options()
                    .iter()
                    .map(|option| OptionSnapshot {
                        id: option.id.clone(),
                        text: option.text.clone(),
                        owner_id: if results_public { option.owner } else { None },
                    })
                    .collect()
            } else {
                Vec::new()
            },
            voted_count: round.voted_count(),
            your_vote: round.vote_of(viewer).map(str::to_string),
            correct_option_id: results_public.then(|| round.correct_option_id.clone()),
            score_deltas: results_public.then(|| round.score_deltas().clone()),
            votes: results_public.then(|| {
                round
                    .votes()
                    .iter()
                    .map(|(player_id, option_id)| VoteSnapshot {
                        player_id: *player_id,
                        option_id: option_id.clone(),
                    })
                    .collect()
            }),
            error_message: if self.state == RoomFsmState::Error {
                round.error_message.clone()
            } else {
                None
            },
        });

        RoomSnapshot {
            room_code: self.code.clone(),
            phase: self.state.as_str(),
            round_number: self.round_number,
            total_rounds: self.total_rounds,
            updated_at: self.updated_at,
            players: self
                .players
                .iter()
                .map(|player| PlayerSnapshot {
                    id: player.id,
                    name: player.name.clone(),
                    score: player.score,
                    is_host: player.id == self.host_id,
                    is_connected: player.is_connected,
                })
                .collect(),
            round,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_code: String,
    pub phase: &'static str,
    pub round_number: u32,
    pub total_rounds: u32,
    pub updated_at: u64,
    pub players: Vec<PlayerSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<RoundSnapshot>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: Uuid,
    pub name: String,
    pub score: u32,
    pub is_host: bool,
    pub is_connected: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSnapshot {
    pub word: String,
    pub phase_started_at: u64,
    pub phase_ends_at: Option<u64>,
    pub submitted_count: usize,
    pub you_submitted: bool,
    pub options: Vec<OptionSnapshot>,
    pub voted_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub your_vote: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_option_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_deltas: Option<HashMap<Uuid, u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub votes: Option<Vec<VoteSnapshot>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionSnapshot {
    pub id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Uuid>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteSnapshot {
    pub player_id: Uuid,
    pub option_id: String,
}
