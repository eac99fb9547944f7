pub mod actor;
pub mod spectator;

use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngCore;
use uuid::Uuid;

/// The (playerId, sessionToken) pair a caller must present on every
/// mutating operation after joining a room.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub player_id: Uuid,
    pub session_token: String,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub id: Uuid,
    session_token: String,
    pub name: String,
    pub score: u32,
    pub joined_at: u64,
    pub is_connected: bool,
}

impl Player {
    pub fn new(name: &str) -> Self {
        Player {
            id: Uuid::new_v4(),
            session_token: random_session_token(),
            name: name.to_string(),
            score: 0,
            joined_at: now_millis(),
            is_connected: true,
        }
    }

    pub fn session(&self) -> Session {
        Session {
            player_id: self.id,
            session_token: self.session_token.clone(),
        }
    }

    pub fn accepts(&self, session: &Session) -> bool {
        self.id == session.player_id && self.session_token == session.session_token
    }
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the unix epoch")
        .as_millis() as u64
}

fn random_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}
