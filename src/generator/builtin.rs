use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::thread_rng;

use super::{
    tidy_text, DefinitionInput, GeneratedRound, GeneratorError, NormalizedDefinition,
    RoundGenerator,
};

/// Offline generator backed by an embedded word list. Used by the dev
/// configuration and by the test suites, so that no game ever depends on
/// network availability.
pub struct BuiltinGenerator {
    lexicon: Vec<(&'static str, &'static str)>,
}

const LEXICON: [(&str, &str); 12] = [
    ("petrichor", "The earthy smell produced when rain falls on dry soil"),
    ("widdershins", "In a direction contrary to the sun's course, counterclockwise"),
    ("snollygoster", "A shrewd, unprincipled person, especially a politician"),
    ("mumpsimus", "A habit or notion stubbornly adhered to although shown to be wrong"),
    ("borborygmus", "A rumbling noise made by fluid and gas moving in the intestines"),
    ("zugzwang", "A situation in which any possible move worsens one's position"),
    ("clinquant", "Glittering with gold or tinsel, showy in a false way"),
    ("absquatulate", "To leave abruptly or depart in a hurry"),
    ("nudiustertian", "Relating to the day before yesterday"),
    ("ultracrepidarian", "A person who gives opinions beyond their area of knowledge"),
    ("logomachy", "A dispute about words rather than about substance"),
    ("pandiculation", "The act of stretching and yawning at the same time"),
];

const FILL_IN_TEMPLATES: [&str; 3] = [
    "An old regional term whose exact meaning is disputed by lexicographers",
    "A ceremonial object used in nineteenth century rural festivities",
    "A technical term borrowed from early printing workshops",
];

impl BuiltinGenerator {
    pub fn new() -> Self {
        BuiltinGenerator {
            lexicon: LEXICON.to_vec(),
        }
    }
}

impl Default for BuiltinGenerator {
    fn default() -> Self {
        BuiltinGenerator::new()
    }
}

#[async_trait]
impl RoundGenerator for BuiltinGenerator {
    async fn generate_round(
        &self,
        _round_number: u32,
        excluded_words: &[String],
    ) -> Result<GeneratedRound, GeneratorError> {
        let excluded: Vec<String> = excluded_words
            .iter()
            .map(|word| word.to_lowercase())
            .collect();

        let fresh: Vec<&(&str, &str)> = self
            .lexicon
            .iter()
            .filter(|(word, _)| !excluded.contains(&word.to_lowercase()))
            .collect();

        // Once every word has been played, repeats are better than failing.
        let whole_lexicon: Vec<&(&str, &str)> = self.lexicon.iter().collect();
        let pool = if fresh.is_empty() { &whole_lexicon } else { &fresh };

        let (word, correct_definition) = pool
            .choose(&mut thread_rng())
            .ok_or_else(|| GeneratorError::Upstream("the builtin lexicon is empty".to_string()))?;

        Ok(GeneratedRound {
            word: tidy_text(word),
            correct_definition: tidy_text(correct_definition),
        })
    }

    async fn normalize_definitions(
        &self,
        _word: &str,
        _correct_definition: &str,
        inputs: Vec<DefinitionInput>,
    ) -> Result<Vec<NormalizedDefinition>, GeneratorError> {
        Ok(inputs
            .into_iter()
            .enumerate()
            .map(|(index, input)| {
                match input.raw_text.as_deref().map(tidy_text) {
                    Some(text) if !text.is_empty() => NormalizedDefinition {
                        player_id: input.player_id,
                        text,
                        is_auto_generated: false,
                    },
                    _ => NormalizedDefinition {
                        player_id: input.player_id,
                        text: FILL_IN_TEMPLATES[index % FILL_IN_TEMPLATES.len()].to_string(),
                        is_auto_generated: true,
                    },
                }
            })
            .collect())
    }
}
