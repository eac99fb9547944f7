use std::collections::HashMap;

use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

use super::test_app::TestApp;

pub struct TestPlayer {
    pub name: String,
    pub player_id: Uuid,
    pub session_token: String,
    tx: SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>,
    rx: SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum ServerMessage {
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
        snapshot: Snapshot,
    },
    Error {
        code: String,
        title: String,
        detail: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub room_code: String,
    pub phase: String,
    pub round_number: u32,
    pub total_rounds: u32,
    pub updated_at: u64,
    pub players: Vec<PlayerDto>,
    pub round: Option<RoundDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDto {
    pub id: Uuid,
    pub name: String,
    pub score: u32,
    pub is_host: bool,
    pub is_connected: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundDto {
    pub word: String,
    pub phase_started_at: u64,
    pub phase_ends_at: Option<u64>,
    pub submitted_count: usize,
    pub you_submitted: bool,
    pub options: Vec<OptionDto>,
    pub voted_count: usize,
    pub your_vote: Option<String>,
    pub correct_option_id: Option<String>,
    pub score_deltas: Option<HashMap<Uuid, u32>>,
    pub votes: Option<Vec<VoteDto>>,
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionDto {
    pub id: String,
    pub text: String,
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteDto {
    pub player_id: Uuid,
    pub option_id: String,
}

impl Snapshot {
    pub fn player(&self, name: &str) -> &PlayerDto {
        self.players
            .iter()
            .find(|player| player.name == name)
            .unwrap_or_else(|| panic!("player {name} is not part of the snapshot"))
    }
}

/// A read-only subscriber on the watch websocket. Unlike [TestPlayer] it
/// never joins the roster and receives room states only.
pub struct TestWatcher {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestWatcher {
    pub async fn open(app: &TestApp, code: &str, viewer: Option<Uuid>) -> TestWatcher {
        let stream = app
            .open_watch_websocket(code, viewer)
            .await
            .expect("Failed to open the watch websocket.");
        TestWatcher { stream }
    }

    pub async fn receive_room_state(&mut self) -> Result<Snapshot, String> {
        match self.stream.next().await {
            Some(Ok(message)) => {
                let parsed: ServerMessage =
                    serde_json::from_str(message.to_text().expect("Message was not text"))
                        .map_err(|error| {
                            format!("Could not parse the message. Error: '{error}'.")
                        })?;
                match parsed {
                    ServerMessage::RoomState { snapshot } => Ok(snapshot),
                    ServerMessage::Error { code, .. } => Err(code),
                    other => Err(format!("expected a room state, got {other:?}")),
                }
            }
            Some(Err(error)) => Err(format!("Websocket returned an error {error}")),
            None => Err("Websocket closed before expected.".to_string()),
        }
    }
}

impl TestPlayer {
    /// Connects a fresh player, consuming the join confirmation and the
    /// state broadcast that the join triggers.
    pub async fn connect(app: &TestApp, code: &str, name: &str) -> (TestPlayer, Snapshot) {
        TestPlayer::open(app, code, name, None).await
    }

    pub async fn connect_with_session(
        app: &TestApp,
        code: &str,
        name: &str,
        player_id: Uuid,
        session_token: &str,
    ) -> TestPlayer {
        let (player, _) = TestPlayer::open(app, code, name, Some((player_id, session_token))).await;
        player
    }

    async fn open(
        app: &TestApp,
        code: &str,
        name: &str,
        session: Option<(Uuid, &str)>,
    ) -> (TestPlayer, Snapshot) {
        let websocket = app
            .open_room_websocket(code, name, session)
            .await
            .expect("Failed to open the websocket.");
        let (tx, rx) = websocket.split();
        let mut player = TestPlayer {
            name: name.to_string(),
            player_id: Uuid::nil(),
            session_token: String::new(),
            tx,
            rx,
        };

        match player.receive_message().await.unwrap() {
            ServerMessage::Joined {
                room_code,
                player_id,
                session_token,
                player_name,
            } => {
                assert_eq!(room_code, code);
                player.name = player_name;
                player.player_id = player_id;
                player.session_token = session_token;
            }
            other => panic!("expected a joined message, got {other:?}"),
        }

        let snapshot = player.receive_room_state().await.unwrap();
        (player, snapshot)
    }

    pub async fn start_game(&mut self) -> Result<Snapshot, String> {
        self.send_json(serde_json::json!({ "type": "startGame" }))
            .await;
        self.receive_room_state().await
    }

    pub async fn submit_definition(&mut self, text: &str) -> Result<Snapshot, String> {
        self.send_json(serde_json::json!({ "type": "submitDefinition", "text": text }))
            .await;
        self.receive_room_state().await
    }

    pub async fn vote(&mut self, option_id: &str) -> Result<Snapshot, String> {
        self.send_json(serde_json::json!({ "type": "vote", "optionId": option_id }))
            .await;
        self.receive_room_state().await
    }

    pub async fn next_round(&mut self) -> Result<Snapshot, String> {
        self.send_json(serde_json::json!({ "type": "nextRound" }))
            .await;
        self.receive_room_state().await
    }

    pub async fn play_again(&mut self) -> Result<Snapshot, String> {
        self.send_json(serde_json::json!({ "type": "playAgain" }))
            .await;
        self.receive_room_state().await
    }

    pub async fn leave(&mut self) {
        self.send_json(serde_json::json!({ "type": "leave" })).await;
    }

    /// Reads messages until the next room state, returning `Err` with the
    /// error code if an error message arrives first.
    pub async fn receive_room_state(&mut self) -> Result<Snapshot, String> {
        match self.receive_message().await? {
            ServerMessage::RoomState { snapshot } => Ok(snapshot),
            ServerMessage::Error { code, title, detail } => {
                assert!(!title.is_empty());
                assert!(!detail.is_empty());
                Err(code)
            }
            other => Err(format!("expected a room state, got {other:?}")),
        }
    }

    async fn receive_message(&mut self) -> Result<ServerMessage, String> {
        match self.rx.next().await {
            Some(Ok(message)) => {
                serde_json::from_str(message.to_text().expect("Message was not text"))
                    .map_err(|error| format!("Could not parse the message. Error: '{error}'."))
            }
            Some(Err(error)) => Err(format!("Websocket returned an error {error}")),
            None => Err("Websocket closed before expected.".to_string()),
        }
    }

    async fn send_json(&mut self, value: serde_json::Value) {
        self.tx
            .send(Message::Text(value.to_string()))
            .await
            .expect("Could not send message");
    }
}
