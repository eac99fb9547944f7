use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{
    tidy_text, DefinitionInput, GeneratedRound, GeneratorError, NormalizedDefinition,
    RoundGenerator,
};

/// Generator backed by an OpenAI-compatible chat completions gateway.
pub struct GatewayGenerator {
    http: reqwest::Client,
    api_url: String,
    model: String,
    api_key_env: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct GeneratedRoundPayload {
    word: String,
    #[serde(rename = "correctDefinition")]
    correct_definition: String,
}

#[derive(Deserialize)]
struct NormalizedPayload {
    #[serde(rename = "playerId")]
    player_id: Uuid,
    #[serde(rename = "correctedText")]
    corrected_text: String,
    #[serde(rename = "isAutoGenerated")]
    is_auto_generated: bool,
}

impl GatewayGenerator {
    pub fn new(api_url: &str, model: &str, api_key_env: &str) -> Self {
        GatewayGenerator {
            http: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key_env: api_key_env.to_string(),
        }
    }

    fn api_key(&self) -> Result<String, GeneratorError> {
        std::env::var(&self.api_key_env)
            .map_err(|_| GeneratorError::MissingApiKey(self.api_key_env.clone()))
    }

    /// Runs one chat completion in JSON mode. Some providers reject the
    /// `response_format` parameter; on a 400 that names it, the call is
    /// retried once without it.
    async fn complete_json(&self, system: &str, user: &str) -> Result<String, GeneratorError> {
        match self.complete(system, user, true).await {
            Ok(content) => Ok(content),
            Err(GeneratorError::Upstream(reason)) if reason.contains("response_format") => {
                self.complete(system, user, false).await
            }
            Err(error) => Err(error),
        }
    }

    async fn complete(
        &self,
        system: &str,
        user: &str,
        json_mode: bool,
    ) -> Result<String, GeneratorError> {
        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });
        if json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(self.api_key()?)
            .json(&body)
            .send()
            .await
            .map_err(|error| GeneratorError::Upstream(error.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|error| GeneratorError::Upstream(error.to_string()))?;

        if !status.is_success() {
            return Err(GeneratorError::Upstream(format!(
                "gateway returned {status}: {text}"
            )));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|error| GeneratorError::MalformedResponse(error.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                GeneratorError::MalformedResponse("the gateway returned no choices".to_string())
            })
    }
}

#[async_trait]
impl RoundGenerator for GatewayGenerator {
    async fn generate_round(
        &self,
        round_number: u32,
        excluded_words: &[String],
    ) -> Result<GeneratedRound, GeneratorError> {
        let system = "You invent rounds for a bluff-the-definition party game. \
                      Answer with a single JSON object: \
                      {\"word\": string, \"correctDefinition\": string}. \
                      Pick an obscure but real word and keep the definition under 200 characters.";
        let user = format!(
            "Round {round_number}. Do not reuse any of these words: [{}].",
            excluded_words.join(", ")
        );

        let content = self.complete_json(system, &user).await?;
        let payload: GeneratedRoundPayload = serde_json::from_str(&content)
            .map_err(|error| GeneratorError::MalformedResponse(error.to_string()))?;

        let word = tidy_text(&payload.word);
        let correct_definition = tidy_text(&payload.correct_definition);
        if word.is_empty() || correct_definition.is_empty() {
            return Err(GeneratorError::MalformedResponse(
                "the gateway returned an empty word or definition".to_string(),
            ));
        }

        Ok(GeneratedRound {
            word,
            correct_definition,
        })
    }

    async fn normalize_definitions(
        &self,
        word: &str,
        correct_definition: &str,
        inputs: Vec<DefinitionInput>,
    ) -> Result<Vec<NormalizedDefinition>, GeneratorError> {
        let system = "You normalize player definitions for a bluff-the-definition game. \
                      Fix spelling and style so every definition reads like a dictionary entry, \
                      and invent a plausible fake definition for players without text. \
                      Answer with a single JSON object: {\"definitions\": \
                      [{\"playerId\": string, \"correctedText\": string, \"isAutoGenerated\": bool}]} \
                      with exactly one entry per input player.";
        let user = json!({
            "word": word,
            "correctDefinition": correct_definition,
            "players": inputs.iter().map(|input| json!({
                "playerId": input.player_id,
                "name": input.name,
                "rawText": input.raw_text,
            })).collect::<Vec<Value>>(),
        })
        .to_string();

        let content = self.complete_json(system, &user).await?;
        let parsed: Value = serde_json::from_str(&content)
            .map_err(|error| GeneratorError::MalformedResponse(error.to_string()))?;
        let payloads: Vec<NormalizedPayload> =
            serde_json::from_value(parsed["definitions"].clone())
                .map_err(|error| GeneratorError::MalformedResponse(error.to_string()))?;

        // The contract is atomic: every input player must be covered.
        let normalized: Vec<NormalizedDefinition> = inputs
            .iter()
            .map(|input| {
                payloads
                    .iter()
                    .find(|payload| payload.player_id == input.player_id)
                    .map(|payload| NormalizedDefinition {
                        player_id: payload.player_id,
                        text: tidy_text(&payload.corrected_text),
                        is_auto_generated: payload.is_auto_generated,
                    })
                    .ok_or_else(|| {
                        GeneratorError::MalformedResponse(format!(
                            "missing normalized definition for player {}",
                            input.player_id
                        ))
                    })
            })
            .collect::<Result<_, _>>()?;

        Ok(normalized)
    }
}
