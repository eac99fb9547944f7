pub mod actor;
pub mod actor_client;
pub mod room_fsm;

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::thread_rng;
use rust_fsm::StateMachine;
use uuid::Uuid;

use crate::config::GameSettings;
use crate::error::domain_error::DomainError;
use crate::error::Error;
use crate::generator::{DefinitionInput, GeneratedRound, NormalizedDefinition};
use crate::player::{now_millis, Player, Session};
use crate::room::room_fsm::{RoomFsm, RoomFsmInput, RoomFsmState};
use crate::round::{tally_votes, DefinitionOption, DefinitionSource, Round};

/// What a `nextRound` request should do once validated.
#[derive(Debug, PartialEq)]
pub enum NextRoundPlan {
    StartRound,
    /// The roster fell below the minimum, go straight to the final results.
    EndGame,
}

#[derive(Debug, PartialEq)]
pub struct PlayerRemoval {
    pub room_is_empty: bool,
    pub round_aborted: bool,
}

/// The authoritative per-room aggregate. Owns the players, the active round
/// and the phase machine. Purely synchronous: timers, the external text
/// generator and broadcasting live in [actor::RoomActor].
pub struct Room {
    code: String,
    host_id: Uuid,
    players: Vec<Player>,
    fsm: StateMachine<RoomFsm>,
    settings: GameSettings,
    round: Option<Round>,
    round_number: u32,
    used_words: HashSet<String>,
    finalizing_writing: bool,
    finalizing_voting: bool,
    updated_at: u64,
}

impl Room {
    pub const MAX_DEFINITION_LENGTH: usize = 280;
    pub const MAX_NAME_LENGTH: usize = 32;
    const MAX_NAME_SUFFIX: u32 = 999;

    pub fn new(code: &str, settings: GameSettings, host_name: &str) -> Result<Self, Error> {
        let host_name = Room::normalize_name(host_name);
        if host_name.is_empty() {
            return Err(Error::Domain(DomainError::EmptyPlayerName));
        }

        let host = Player::new(&host_name);
        let host_id = host.id;
        Ok(Room {
            code: code.to_string(),
            host_id,
            players: vec![host],
            fsm: StateMachine::default(),
            settings,
            round: None,
            round_number: 0,
            used_words: HashSet::default(),
            finalizing_writing: false,
            finalizing_voting: false,
            updated_at: now_millis(),
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn state(&self) -> &RoomFsmState {
        self.fsm.state()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn host_id(&self) -> Uuid {
        self.host_id
    }

    pub fn updated_at(&self) -> u64 {
        self.updated_at
    }

    pub fn used_words(&self) -> Vec<String> {
        self.used_words.iter().cloned().collect()
    }

    pub fn host_player(&self) -> &Player {
        self.players
            .iter()
            .find(|player| player.id == self.host_id)
            .expect("the host is always part of a non-empty roster")
    }

    /// Identity guard: every mutating operation resolves the caller through
    /// this check before any state change.
    pub fn authenticate(&self, session: &Session) -> Result<Uuid, Error> {
        self.players
            .iter()
            .find(|player| player.accepts(session))
            .map(|player| player.id)
            .ok_or(Error::Domain(DomainError::InvalidSession))
    }

    pub fn all_players_are_disconnected(&self) -> bool {
        self.players.iter().all(|player| !player.is_connected)
    }

    pub fn join(&mut self, name: &str, session: Option<&Session>) -> Result<Uuid, Error> {
        // A valid existing session means reconnection, allowed in any phase.
        if let Some(session) = session {
            if let Some(player) = self
                .players
                .iter_mut()
                .find(|player| player.accepts(session))
            {
                player.is_connected = true;
                let id = player.id;
                self.touch();
                return Ok(id);
            }
        }

        let name = Room::normalize_name(name);
        if name.is_empty() {
            return Err(Error::Domain(DomainError::EmptyPlayerName));
        }
        if self.players.len() >= self.settings.max_players {
            return Err(Error::Domain(DomainError::RoomFull(
                self.settings.max_players,
            )));
        }

        let name = self.disambiguate_name(&name);
        let player = Player::new(&name);
        let id = player.id;
        self.players.push(player);
        self.touch();
        Ok(id)
    }

    pub fn mark_disconnected(&mut self, player_id: Uuid) {
        if let Some(player) = self
            .players
            .iter_mut()
            .find(|player| player.id == player_id)
        {
            player.is_connected = false;
            self.touch();
        }
    }

    pub fn ensure_can_start(&self, player_id: Uuid) -> Result<(), Error> {
        if !self.is_host(player_id) {
            return Err(Error::Domain(DomainError::NonHostPlayerCannotStartGame(
                self.name_of(player_id),
            )));
        }
        if self.state() != &RoomFsmState::Lobby {
            return Err(Error::Domain(DomainError::InvalidPhaseForStartingGame(
                self.state().clone(),
            )));
        }
        if self.players.len() < self.settings.min_players {
            return Err(Error::Domain(DomainError::NotEnoughPlayers(
                self.players.len(),
                self.settings.min_players,
            )));
        }
        Ok(())
    }

    pub fn start_game(&mut self, player_id: Uuid, generated: GeneratedRound) -> Result<(), Error> {
        self.ensure_can_start(player_id)?;
        self.process_event(&RoomFsmInput::StartGame)?;

        for player in &mut self.players {
            player.score = 0;
        }
        self.round_number = 0;
        self.used_words.clear();
        self.start_round(generated);
        Ok(())
    }

    pub fn ensure_can_continue(&self, player_id: Uuid) -> Result<NextRoundPlan, Error> {
        if !self.is_host(player_id) {
            return Err(Error::Domain(
                DomainError::NonHostPlayerCannotContinueToNextRound(self.name_of(player_id)),
            ));
        }
        if self.state() != &RoomFsmState::RoundResults {
            return Err(Error::Domain(DomainError::InvalidPhaseForNextRound(
                self.state().clone(),
                RoomFsmState::RoundResults,
            )));
        }
        if self.players.len() < self.settings.min_players {
            Ok(NextRoundPlan::EndGame)
        } else {
            Ok(NextRoundPlan::StartRound)
        }
    }

    pub fn next_round(&mut self, player_id: Uuid, generated: GeneratedRound) -> Result<(), Error> {
        match self.ensure_can_continue(player_id)? {
            NextRoundPlan::StartRound => {
                self.process_event(&RoomFsmInput::NextRound)?;
                self.start_round(generated);
                Ok(())
            }
            NextRoundPlan::EndGame => self.end_game(),
        }
    }

    /// Forces the room to the final results, closing the active round.
    pub fn end_game(&mut self) -> Result<(), Error> {
        self.process_event(&RoomFsmInput::EndGame)?;
        if let Some(round) = self.round.as_mut() {
            round.phase_started_at = now_millis();
            round.phase_ends_at = None;
        }
        self.touch();
        Ok(())
    }

    /// Upserts the caller's raw definition. Returns whether every player of
    /// the current roster now has a non-empty submission.
    pub fn submit_definition(&mut self, player_id: Uuid, raw_text: &str) -> Result<bool, Error> {
        if self.state() != &RoomFsmState::Writing {
            return Err(Error::Domain(
                DomainError::InvalidPhaseForDefinitionSubmission(
                    self.state().clone(),
                    RoomFsmState::Writing,
                ),
            ));
        }

        let text: String = raw_text
            .trim()
            .chars()
            .take(Room::MAX_DEFINITION_LENGTH)
            .collect();
        if text.is_empty() {
            return Err(Error::Domain(DomainError::EmptyDefinition));
        }

        let round = self
            .round
            .as_mut()
            .expect("a round exists whenever the phase is WRITING");
        round.upsert_raw_definition(player_id, &text);
        self.touch();

        let round = self.round.as_ref().expect("round still exists");
        Ok(self
            .players
            .iter()
            .all(|player| round.has_submitted(player.id)))
    }

    pub fn writing_inputs(&self) -> Vec<DefinitionInput> {
        let round = self.round.as_ref();
        self.players
            .iter()
            .map(|player| DefinitionInput {
                player_id: player.id,
                name: player.name.clone(),
                raw_text: round
                    .and_then(|round| round.raw_definition(player.id))
                    .map(str::to_string),
            })
            .collect()
    }

    /// Fencing gate for writing finalization. Returns true at most once per
    /// round: the phase must still be WRITING, the round number must match
    /// the one captured when the trigger was armed, and no finalization may
    /// already be in flight. This, not timer cancellation, is what prevents
    /// a double transition when the deadline fires at the same instant the
    /// last submission arrives.
    pub fn try_begin_writing_finalization(&mut self, expected_round: u32) -> bool {
        if self.state() != &RoomFsmState::Writing
            || self.round_number != expected_round
            || self.round.is_none()
            || self.finalizing_writing
        {
            return false;
        }
        self.finalizing_writing = true;
        true
    }

    /// Installs the normalized definitions, builds the shuffled option list
    /// (one bluff per player plus the correct definition) and transitions to
    /// VOTING. No-op when the room moved on while the normalization call was
    /// in flight. Returns whether the transition happened.
    pub fn apply_normalized_definitions(
        &mut self,
        expected_round: u32,
        normalized: Vec<NormalizedDefinition>,
    ) -> Result<bool, Error> {
        if self.state() != &RoomFsmState::Writing || self.round_number != expected_round {
            return Ok(false);
        }
        let Some(round) = self.round.as_mut() else {
            return Ok(false);
        };

        for item in &normalized {
            round.set_display_definition(item.player_id, &item.text, item.is_auto_generated);
        }

        let mut options: Vec<DefinitionOption> = self
            .players
            .iter()
            .map(|player| DefinitionOption {
                id: round.player_option_id(player.id),
                text: round
                    .display_definition(player.id)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("No definition available for {}.", player.name)),
                source: DefinitionSource::Player,
                owner: Some(player.id),
            })
            .collect();
        options.push(DefinitionOption {
            id: round.correct_option_id.clone(),
            text: round.correct_definition.clone(),
            source: DefinitionSource::Correct,
            owner: None,
        });
        options.shuffle(&mut thread_rng());
        round.install_options(options);

        self.process_event(&RoomFsmInput::DefinitionsReady)?;

        let now = now_millis();
        let round = self.round.as_mut().expect("round still exists");
        round.phase_started_at = now;
        round.phase_ends_at = Some(now + self.settings.voting_duration_seconds * 1000);
        self.finalizing_writing = false;
        self.touch();
        Ok(true)
    }

    /// Commits the terminal ERROR phase after an upstream failure during
    /// writing finalization, keeping the message for the snapshots.
    pub fn fail_round(&mut self, message: &str) -> Result<(), Error> {
        self.process_event(&RoomFsmInput::GenerationFailed)?;
        if let Some(round) = self.round.as_mut() {
            round.error_message = Some(message.to_string());
            round.phase_started_at = now_millis();
            round.phase_ends_at = None;
        }
        self.finalizing_writing = false;
        self.touch();
        Ok(())
    }

    /// Records the caller's vote (revoting overwrites). Returns whether
    /// every player of the current roster has voted.
    pub fn vote(&mut self, player_id: Uuid, option_id: &str) -> Result<bool, Error> {
        if self.state() != &RoomFsmState::Voting {
            return Err(Error::Domain(DomainError::InvalidPhaseForVote(
                self.state().clone(),
                RoomFsmState::Voting,
            )));
        }

        let round = self
            .round
            .as_mut()
            .expect("a round exists whenever the phase is VOTING");
        if !round.has_option(option_id) {
            return Err(Error::Domain(DomainError::UnknownVoteOption(
                option_id.to_string(),
            )));
        }

        round.record_vote(player_id, option_id);
        self.touch();

        let round = self.round.as_ref().expect("round still exists");
        Ok(round.voted_count() >= self.players.len())
    }

    /// Tallies the votes and advances past VOTING, fenced exactly like
    /// writing finalization. Returns whether the transition happened.
    pub fn try_finalize_voting(&mut self, expected_round: u32) -> Result<bool, Error> {
        if self.state() != &RoomFsmState::Voting
            || self.round_number != expected_round
            || self.round.is_none()
            || self.finalizing_voting
        {
            return Ok(false);
        }
        self.finalizing_voting = true;

        let round = self.round.as_ref().expect("fenced above");
        let roster: Vec<Uuid> = self.players.iter().map(|player| player.id).collect();
        let deltas = tally_votes(&roster, round.options(), round.votes());

        for player in &mut self.players {
            player.score += deltas.get(&player.id).copied().unwrap_or(0);
        }

        let is_final_round = self.round_number >= self.settings.total_rounds;
        let below_minimum = self.players.len() < self.settings.min_players;
        let input = if is_final_round || below_minimum {
            RoomFsmInput::NoMoreRounds
        } else {
            RoomFsmInput::VotesTallied
        };
        self.process_event(&input)?;

        let round = self.round.as_mut().expect("round still exists");
        round.set_score_deltas(deltas);
        round.phase_started_at = now_millis();
        round.phase_ends_at = None;

        self.finalizing_voting = false;
        self.touch();
        Ok(true)
    }

    pub fn play_again(&mut self, player_id: Uuid) -> Result<(), Error> {
        if !self.is_host(player_id) {
            return Err(Error::Domain(DomainError::NonHostPlayerCannotSendPlayAgain(
                self.name_of(player_id),
            )));
        }
        if !matches!(
            self.state(),
            RoomFsmState::FinalResults | RoomFsmState::Error
        ) {
            return Err(Error::Domain(DomainError::InvalidPhaseForPlayAgain(
                self.state().clone(),
            )));
        }

        self.process_event(&RoomFsmInput::PlayAgain)?;
        for player in &mut self.players {
            player.score = 0;
        }
        self.round = None;
        self.round_number = 0;
        self.used_words.clear();
        self.finalizing_writing = false;
        self.finalizing_voting = false;
        self.touch();
        Ok(())
    }

    /// Removes the player, reassigning the host to the earliest joined
    /// remaining player and aborting the round when the roster drops below
    /// the minimum mid-game.
    pub fn remove_player(&mut self, player_id: Uuid) -> Result<PlayerRemoval, Error> {
        let position = self
            .players
            .iter()
            .position(|player| player.id == player_id)
            .ok_or_else(|| {
                Error::log_and_create_internal(&format!(
                    "Tried to remove a player that is not part of the room. RoomCode: '{}'.",
                    self.code
                ))
            })?;
        self.players.remove(position);

        if self.host_id == player_id {
            if let Some(next_host) = self.players.iter().min_by_key(|player| player.joined_at) {
                self.host_id = next_host.id;
            }
        }

        let round_is_active = matches!(
            self.state(),
            RoomFsmState::Writing | RoomFsmState::Voting | RoomFsmState::RoundResults
        );
        let round_aborted = round_is_active && self.players.len() < self.settings.min_players;
        if round_aborted {
            self.end_game()?;
        }

        self.touch();
        Ok(PlayerRemoval {
            room_is_empty: self.players.is_empty(),
            round_aborted,
        })
    }

    fn start_round(&mut self, generated: GeneratedRound) {
        self.round_number += 1;
        self.used_words.insert(generated.word.to_lowercase());

        let now = now_millis();
        self.round = Some(Round::new(
            self.round_number,
            &generated.word,
            &generated.correct_definition,
            now,
            Some(now + self.settings.writing_duration_seconds * 1000),
        ));
        self.finalizing_writing = false;
        self.finalizing_voting = false;
        self.touch();
    }

    fn is_host(&self, player_id: Uuid) -> bool {
        self.host_id == player_id
    }

    fn name_of(&self, player_id: Uuid) -> String {
        self.players
            .iter()
            .find(|player| player.id == player_id)
            .map(|player| player.name.clone())
            .unwrap_or_default()
    }

    fn normalize_name(name: &str) -> String {
        name.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .take(Room::MAX_NAME_LENGTH)
            .collect()
    }

    /// Display names are unique case-insensitively; collisions get a `#2`,
    /// `#3`, ... suffix, with a timestamp as last resort.
    fn disambiguate_name(&self, name: &str) -> String {
        let taken: HashSet<String> = self
            .players
            .iter()
            .map(|player| player.name.to_lowercase())
            .collect();
        if !taken.contains(&name.to_lowercase()) {
            return name.to_string();
        }

        for suffix in 2..=Room::MAX_NAME_SUFFIX {
            let candidate = format!("{name}#{suffix}");
            if !taken.contains(&candidate.to_lowercase()) {
                return candidate;
            }
        }
        format!("{name}#{}", now_millis())
    }

    fn touch(&mut self) {
        self.updated_at = now_millis();
    }

    fn process_event(&mut self, event: &RoomFsmInput) -> Result<(), Error> {
        match self.fsm.consume(event) {
            Ok(_) => Ok(()),
            Err(error) => Err(Error::log_and_create_internal(&format!(
                "The fsm in state {:?} can't transition with an event {:?}. Error: '{error}'.",
                self.fsm.state(),
                event
            ))),
        }
    }
}
