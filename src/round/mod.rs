use std::collections::HashMap;

use uuid::Uuid;

#[derive(Clone, Debug, PartialEq)]
pub enum DefinitionSource {
    /// A bluff written (or auto-filled) on behalf of a player.
    Player,
    /// The real dictionary definition.
    Correct,
}

#[derive(Clone, Debug)]
pub struct DefinitionOption {
    pub id: String,
    pub text: String,
    pub source: DefinitionSource,
    /// Owning player of a bluff. Kept server side, never serialized to clients.
    pub owner: Option<Uuid>,
}

#[derive(Clone, Debug, Default)]
pub struct Submission {
    pub raw_text: Option<String>,
    pub display_text: Option<String>,
    pub is_auto_generated: bool,
}

#[derive(Clone, Debug)]
pub struct Round {
    pub round_number: u32,
    pub word: String,
    pub correct_definition: String,
    pub correct_option_id: String,
    submissions: HashMap<Uuid, Submission>,
    options: Vec<DefinitionOption>,
    votes: HashMap<Uuid, String>,
    score_deltas: HashMap<Uuid, u32>,
    pub phase_started_at: u64,
    pub phase_ends_at: Option<u64>,
    pub error_message: Option<String>,
}

impl Round {
    pub fn new(
        round_number: u32,
        word: &str,
        correct_definition: &str,
        phase_started_at: u64,
        phase_ends_at: Option<u64>,
    ) -> Self {
        Round {
            round_number,
            word: word.to_string(),
            correct_definition: correct_definition.to_string(),
            correct_option_id: format!("correct-{round_number}"),
            submissions: HashMap::new(),
            options: Vec::new(),
            votes: HashMap::new(),
            score_deltas: HashMap::new(),
            phase_started_at,
            phase_ends_at,
            error_message: None,
        }
    }

    pub fn player_option_id(&self, player_id: Uuid) -> String {
        format!("player-{}-{player_id}", self.round_number)
    }

    pub fn upsert_raw_definition(&mut self, player_id: Uuid, text: &str) {
        let submission = self.submissions.entry(player_id).or_default();
        submission.raw_text = Some(text.to_string());
        submission.is_auto_generated = false;
    }

    pub fn has_submitted(&self, player_id: Uuid) -> bool {
        self.submissions
            .get(&player_id)
            .and_then(|submission| submission.raw_text.as_deref())
            .is_some_and(|text| !text.trim().is_empty())
    }

    pub fn submitted_count(&self) -> usize {
        self.submissions
            .values()
            .filter(|submission| {
                submission
                    .raw_text
                    .as_deref()
                    .is_some_and(|text| !text.trim().is_empty())
            })
            .count()
    }

    pub fn raw_definition(&self, player_id: Uuid) -> Option<&str> {
        self.submissions
            .get(&player_id)
            .and_then(|submission| submission.raw_text.as_deref())
    }

    pub fn set_display_definition(&mut self, player_id: Uuid, text: &str, is_auto_generated: bool) {
        let submission = self.submissions.entry(player_id).or_default();
        submission.display_text = Some(text.to_string());
        submission.is_auto_generated = is_auto_generated;
    }

    pub fn display_definition(&self, player_id: Uuid) -> Option<&str> {
        self.submissions
            .get(&player_id)
            .and_then(|submission| submission.display_text.as_deref())
    }

    pub fn install_options(&mut self, options: Vec<DefinitionOption>) {
        self.options = options;
    }

    pub fn options(&self) -> &[DefinitionOption] {
        &self.options
    }

    pub fn has_option(&self, option_id: &str) -> bool {
        self.options.iter().any(|option| option.id == option_id)
    }

    pub fn record_vote(&mut self, player_id: Uuid, option_id: &str) {
        self.votes.insert(player_id, option_id.to_string());
    }

    pub fn votes(&self) -> &HashMap<Uuid, String> {
        &self.votes
    }

    pub fn voted_count(&self) -> usize {
        self.votes.len()
    }

    pub fn vote_of(&self, player_id: Uuid) -> Option<&str> {
        self.votes.get(&player_id).map(String::as_str)
    }

    pub fn set_score_deltas(&mut self, deltas: HashMap<Uuid, u32>) {
        self.score_deltas = deltas;
    }

    pub fn score_deltas(&self) -> &HashMap<Uuid, u32> {
        &self.score_deltas
    }
}

/// Pure vote tally. A vote for the correct definition awards the voter 2
/// points; a vote for a player-authored bluff awards its author 1 point.
/// Deterministic and independent of the order the votes were cast in.
pub fn tally_votes(
    players: &[Uuid],
    options: &[DefinitionOption],
    votes: &HashMap<Uuid, String>,
) -> HashMap<Uuid, u32> {
    let mut deltas: HashMap<Uuid, u32> = players.iter().map(|id| (*id, 0)).collect();

    for (voter, option_id) in votes {
        let Some(option) = options.iter().find(|option| &option.id == option_id) else {
            continue;
        };

        match option.source {
            DefinitionSource::Correct => {
                if let Some(delta) = deltas.get_mut(voter) {
                    *delta += 2;
                }
            }
            DefinitionSource::Player => {
                if let Some(owner) = option.owner {
                    if let Some(delta) = deltas.get_mut(&owner) {
                        *delta += 1;
                    }
                }
            }
        }
    }

    deltas
}
