pub mod actor;
pub mod actor_client;

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;

use crate::config::GameSettings;
use crate::error::domain_error::DomainError;
use crate::error::Error;
use crate::generator::RoundGenerator;
use crate::player::Session;
use crate::registry::actor_client::RegistryClient;
use crate::room::actor::RoomActor;
use crate::room::actor_client::RoomClient;

pub struct RoomRegistry {
    room_channels: HashMap<String, RoomClient>,
    game_settings: GameSettings,
    generator: Arc<dyn RoundGenerator>,
}

impl RoomRegistry {
    const CODE_LENGTH: usize = 4;
    const CODE_ATTEMPTS: usize = 3000;

    pub fn new(game_settings: GameSettings, generator: Arc<dyn RoundGenerator>) -> Self {
        RoomRegistry {
            room_channels: HashMap::default(),
            game_settings,
            generator,
        }
    }

    pub fn create_room(
        &mut self,
        host_name: &str,
        registry: RegistryClient,
    ) -> Result<(String, Session, String), Error> {
        let code = self.create_unique_room_code()?;
        let (client, host_session, host_name) = RoomActor::spawn(
            &code,
            self.game_settings.clone(),
            host_name,
            Arc::clone(&self.generator),
            registry,
        )?;
        self.room_channels.insert(code.clone(), client);
        Ok((code, host_session, host_name))
    }

    pub fn remove_room(&mut self, code: &str) -> Option<RoomClient> {
        self.room_channels.remove(code)
    }

    pub fn get_room(&self, code: &str) -> Result<&RoomClient, Error> {
        match self.room_channels.get(code) {
            Some(room) => Ok(room),
            None => Err(Error::Domain(DomainError::RoomDoesNotExist(
                code.to_string(),
            ))),
        }
    }

    fn create_unique_room_code(&self) -> Result<String, Error> {
        for _ in 0..RoomRegistry::CODE_ATTEMPTS {
            let code: String = (0..RoomRegistry::CODE_LENGTH)
                .map(|_| rand::thread_rng().gen_range('A'..='Z'))
                .collect();
            if !self.room_channels.contains_key(&code) {
                return Ok(code);
            }
        }
        Err(Error::Domain(DomainError::RoomCodesExhausted))
    }
}

/// Uppercases a client-supplied room code and rejects anything that is not
/// exactly four ascii letters.
pub fn normalize_code(code: &str) -> Result<String, Error> {
    let trimmed = code.trim();
    if trimmed.len() == RoomRegistry::CODE_LENGTH
        && trimmed.chars().all(|c| c.is_ascii_alphabetic())
    {
        Ok(trimmed.to_uppercase())
    } else {
        Err(Error::Domain(DomainError::MalformedRoomCode(
            code.to_string(),
        )))
    }
}
