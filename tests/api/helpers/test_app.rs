use std::net::SocketAddr;
use std::time::Duration;

use fibbery::config::Config;
use serde::Deserialize;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

use super::test_player::TestPlayer;

pub struct TestApp {
    pub base_address: String,
    pub inactivity_timeout: Duration,
    pub total_rounds: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCreatedResponse {
    pub room_code: String,
    pub player_id: Uuid,
    pub session_token: String,
    pub player_name: String,
}

impl TestApp {
    pub async fn spawn_app() -> TestApp {
        // Binding to port 0 triggers an OS scan for an available port, this
        // way tests can run in parallel, each with its own application.
        let random_port_address = SocketAddr::from(([0, 0, 0, 0], 0));
        let listener = TcpListener::bind(random_port_address)
            .await
            .expect("Failed to bind to random port.");
        let address = listener.local_addr().unwrap();
        std::env::set_var("ENVIRONMENT", "dev");
        let config = {
            let mut config = Config::get().expect("Failed to read configuration.");
            config.game.inactivity_timeout_seconds = 1;
            // Two rounds keep the full game tests short.
            config.game.total_rounds = 2;
            config
        };

        let server = fibbery::startup::create_web_server(config.clone(), listener);
        let _ = tokio::spawn(server);

        TestApp {
            base_address: format!("localhost:{}", address.port()),
            inactivity_timeout: config.game.inactivity_timeout(),
            total_rounds: config.game.total_rounds,
        }
    }

    pub async fn create_room(&self, player_name: &str) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("http://{}/room", self.base_address))
            .json(&serde_json::json!({ "playerName": player_name }))
            .send()
            .await
            .expect("Failed to execute the CreateRoom request.")
    }

    pub async fn get_snapshot(&self, code: &str, player_id: Option<Uuid>) -> reqwest::Response {
        let mut url = format!("http://{}/room/{code}/snapshot", self.base_address);
        if let Some(player_id) = player_id {
            url.push_str(&format!("?playerId={player_id}"));
        }
        reqwest::Client::new()
            .get(url)
            .send()
            .await
            .expect("Failed to execute the Snapshot request.")
    }

    pub async fn open_room_websocket(
        &self,
        code: &str,
        name: &str,
        session: Option<(Uuid, &str)>,
    ) -> Result<WebSocketStream<MaybeTlsStream<TcpStream>>, String> {
        let mut url = format!("ws://{}/room/{code}/player/{name}/ws", self.base_address);
        if let Some((player_id, session_token)) = session {
            url.push_str(&format!(
                "?playerId={player_id}&sessionToken={session_token}"
            ));
        }
        tokio_tungstenite::connect_async(url)
            .await
            .map(|websocket_stream| websocket_stream.0)
            .map_err(|error| format!("WebSocket could not be created. Error: '{error}'."))
    }

    pub async fn open_watch_websocket(
        &self,
        code: &str,
        viewer: Option<Uuid>,
    ) -> Result<WebSocketStream<MaybeTlsStream<TcpStream>>, String> {
        let mut url = format!("ws://{}/room/{code}/watch/ws", self.base_address);
        if let Some(player_id) = viewer {
            url.push_str(&format!("?playerId={player_id}"));
        }
        tokio_tungstenite::connect_async(url)
            .await
            .map(|websocket_stream| websocket_stream.0)
            .map_err(|error| format!("WebSocket could not be created. Error: '{error}'."))
    }

    /// Spawns an app, creates a room over HTTP and connects the host over
    /// the websocket.
    pub async fn create_room_with_host(host_name: &str) -> (TestApp, String, TestPlayer) {
        let app = TestApp::spawn_app().await;

        let response = app.create_room(host_name).await;
        assert!(response.status().is_success());
        let created: RoomCreatedResponse = response
            .json()
            .await
            .expect("Failed to parse the RoomCreatedResponse.");
        assert_eq!(created.room_code.len(), 4);
        assert_eq!(created.session_token.len(), 64);

        let host = TestPlayer::connect_with_session(
            &app,
            &created.room_code,
            &created.player_name,
            created.player_id,
            &created.session_token,
        )
        .await;
        let code = created.room_code;
        (app, code, host)
    }
}
