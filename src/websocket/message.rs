use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::snapshot::RoomSnapshot;

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum WsMessageIn {
    StartGame,
    SubmitDefinition {
        text: String,
    },
    Vote {
        #[serde(rename = "optionId")]
        option_id: String,
    },
    NextRound,
    PlayAgain,
    Leave,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum WsMessageOut {
    Joined {
        #[serde(rename = "roomCode")]
        room_code: String,
        #[serde(rename = "playerId")]
        player_id: Uuid,
        #[serde(rename = "sessionToken")]
        session_token: String,
        #[serde(rename = "playerName")]
        player_name: String,
    },
    RoomState {
        snapshot: RoomSnapshot,
    },
    Error {
        code: String,
        title: String,
        detail: String,
    },
}

#[cfg(test)]
mod tests {
    use super::WsMessageIn;

    #[test]
    fn incoming_messages_parse_from_their_wire_shape() {
        assert_eq!(
            serde_json::from_str::<WsMessageIn>(r#"{"type":"startGame"}"#).unwrap(),
            WsMessageIn::StartGame
        );
        assert_eq!(
            serde_json::from_str::<WsMessageIn>(
                r#"{"type":"submitDefinition","text":"a small boat"}"#
            )
            .unwrap(),
            WsMessageIn::SubmitDefinition {
                text: "a small boat".to_string()
            }
        );
        assert_eq!(
            serde_json::from_str::<WsMessageIn>(r#"{"type":"vote","optionId":"correct-1"}"#)
                .unwrap(),
            WsMessageIn::Vote {
                option_id: "correct-1".to_string()
            }
        );
        assert_eq!(
            serde_json::from_str::<WsMessageIn>(r#"{"type":"nextRound"}"#).unwrap(),
            WsMessageIn::NextRound
        );
        assert_eq!(
            serde_json::from_str::<WsMessageIn>(r#"{"type":"playAgain"}"#).unwrap(),
            WsMessageIn::PlayAgain
        );
        assert_eq!(
            serde_json::from_str::<WsMessageIn>(r#"{"type":"leave"}"#).unwrap(),
            WsMessageIn::Leave
        );
    }

    #[test]
    fn unknown_message_types_fail_to_parse() {
        assert!(serde_json::from_str::<WsMessageIn>(r#"{"type":"shout"}"#).is_err());
        assert!(serde_json::from_str::<WsMessageIn>(r#"{"type":"vote"}"#).is_err());
    }
}
