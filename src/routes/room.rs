use std::sync::Arc;

use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::domain_error::DomainErrorKind;
use crate::error::Error;
use crate::player::actor::PlayerActor;
use crate::player::spectator::SpectatorActor;
use crate::player::Session;
use crate::registry::actor_client::RegistryClient;
use crate::registry::normalize_code;
use crate::room::actor_client::RoomClient;
use crate::websocket::{error_to_ws_error, send_error_and_close};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    player_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    room_code: String,
    player_id: Uuid,
    session_token: String,
    player_name: String,
}

pub async fn create(
    State(registry): State<Arc<RegistryClient>>,
    Json(request): Json<CreateRoomRequest>,
) -> Response {
    match registry.create_room(&request.player_name).await {
        Ok((room_code, session, player_name)) => (
            StatusCode::OK,
            Json(CreateRoomResponse {
                room_code,
                player_id: session.player_id,
                session_token: session.session_token,
                player_name,
            }),
        )
            .into_response(),
        Err(error) => error_response(&error),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotParams {
    player_id: Option<Uuid>,
}

pub async fn snapshot(
    State(registry): State<Arc<RegistryClient>>,
    Path(code): Path<String>,
    Query(params): Query<SnapshotParams>,
) -> Response {
    let result = async {
        let (_, room) = get_room(&registry, &code).await?;
        room.snapshot(params.player_id).await
    }
    .await;

    match result {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(error) => error_response(&error),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectParams {
    player_id: Option<Uuid>,
    session_token: Option<String>,
}

pub async fn connect_player_to_websocket(
    State(registry): State<Arc<RegistryClient>>,
    Path((code, name)): Path<(String, String)>,
    Query(params): Query<ConnectParams>,
    websocket_upgrade: WebSocketUpgrade,
) -> Response {
    websocket_upgrade.on_upgrade(move |websocket| async move {
        let session = match (params.player_id, params.session_token) {
            (Some(player_id), Some(session_token)) => Some(Session {
                player_id,
                session_token,
            }),
            _ => None,
        };
        match get_room(&registry, &code).await {
            Ok((code, room)) => PlayerActor::create(code, name, session, room, websocket).await,
            Err(error) => send_error_and_close(websocket, &error).await,
        }
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchParams {
    player_id: Option<Uuid>,
}

pub async fn watch_room_websocket(
    State(registry): State<Arc<RegistryClient>>,
    Path(code): Path<String>,
    Query(params): Query<WatchParams>,
    websocket_upgrade: WebSocketUpgrade,
) -> Response {
    websocket_upgrade.on_upgrade(move |websocket| async move {
        match get_room(&registry, &code).await {
            Ok((_, room)) => SpectatorActor::create(params.player_id, room, websocket).await,
            Err(error) => send_error_and_close(websocket, &error).await,
        }
    })
}

async fn get_room(
    registry: &RegistryClient,
    code: &str,
) -> Result<(String, RoomClient), Error> {
    let code = normalize_code(code)?;
    let room = registry.get_room(&code).await?;
    Ok((code, room))
}

fn error_response(error: &Error) -> Response {
    let status = match error {
        Error::Domain(domain_error) => match domain_error.kind() {
            DomainErrorKind::NotFound => StatusCode::NOT_FOUND,
            DomainErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            DomainErrorKind::Forbidden => StatusCode::FORBIDDEN,
            DomainErrorKind::InvalidState => StatusCode::CONFLICT,
            DomainErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            DomainErrorKind::Exhausted => StatusCode::SERVICE_UNAVAILABLE,
            DomainErrorKind::UpstreamFailure => StatusCode::BAD_GATEWAY,
        },
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(error_to_ws_error(error))).into_response()
}
