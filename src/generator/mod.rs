pub mod builtin;
pub mod gateway;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::config::GeneratorSettings;

#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedRound {
    pub word: String,
    pub correct_definition: String,
}

#[derive(Clone, Debug)]
pub struct DefinitionInput {
    pub player_id: Uuid,
    pub name: String,
    pub raw_text: Option<String>,
}

#[derive(Clone, Debug)]
pub struct NormalizedDefinition {
    pub player_id: Uuid,
    pub text: String,
    pub is_auto_generated: bool,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum GeneratorError {
    #[error("The upstream text generation call failed. Reason: '{0}'.")]
    Upstream(String),
    #[error("The environment variable with the api key is not set. Variable: '{0}'.")]
    MissingApiKey(String),
    #[error("The upstream response could not be parsed. Reason: '{0}'.")]
    MalformedResponse(String),
}

/// External text generation collaborator. Invents a word and its real
/// definition for each round, and normalizes or fills in the definitions the
/// players submitted.
#[async_trait]
pub trait RoundGenerator: Send + Sync {
    /// Produces a fresh word plus its correct definition, avoiding any word
    /// in `excluded_words`.
    async fn generate_round(
        &self,
        round_number: u32,
        excluded_words: &[String],
    ) -> Result<GeneratedRound, GeneratorError>;

    /// Returns exactly one normalized definition per input player,
    /// synthesizing plausible text for players who submitted nothing.
    /// Fails atomically: either every player gets an entry or an error is
    /// returned and no partial result is observable.
    async fn normalize_definitions(
        &self,
        word: &str,
        correct_definition: &str,
        inputs: Vec<DefinitionInput>,
    ) -> Result<Vec<NormalizedDefinition>, GeneratorError>;
}

pub fn from_settings(settings: &GeneratorSettings) -> Arc<dyn RoundGenerator> {
    match settings {
        GeneratorSettings::Builtin => Arc::new(builtin::BuiltinGenerator::new()),
        GeneratorSettings::Gateway {
            api_url,
            model,
            api_key_env,
        } => Arc::new(gateway::GatewayGenerator::new(api_url, model, api_key_env)),
    }
}

/// Trims, collapses inner whitespace and capitalizes the first letter, the
/// same clean-up applied to every definition shown to voters.
pub fn tidy_text(input: &str) -> String {
    let compact = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = compact.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
