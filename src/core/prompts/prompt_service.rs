// Conversation starters: topics, "would you rather" and truth or dare.
//
// The catalog is loaded once at startup (see infra/prompts) and never changes,
// so the service is just a read-only view with random selection on top.

use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// Shape of the prompt file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptCatalog {
    #[serde(default)]
    pub topics: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub would_you_rather: Vec<String>,
    #[serde(default)]
    pub truth_or_dare: TruthOrDarePrompts,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TruthOrDarePrompts {
    #[serde(default)]
    pub truth: Vec<String>,
    #[serde(default)]
    pub dare: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruthOrDare {
    Truth,
    Dare,
}

impl TruthOrDare {
    /// Parse a user-supplied choice. `None` means "pick one for me".
    pub fn parse(choice: &str) -> Result<Option<Self>, PromptError> {
        match choice.trim().to_lowercase().as_str() {
            "" | "random" => Ok(None),
            "truth" => Ok(Some(TruthOrDare::Truth)),
            "dare" => Ok(Some(TruthOrDare::Dare)),
            _ => Err(PromptError::InvalidChoice(choice.to_string())),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TruthOrDare::Truth => "Truth",
            TruthOrDare::Dare => "Dare",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPrompt {
    pub category: String,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruthOrDarePrompt {
    pub kind: TruthOrDare,
    pub prompt: String,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("Category `{requested}` not found. Available categories: {}", .available.join(", "))]
    UnknownCategory {
        requested: String,
        available: Vec<String>,
    },

    #[error("Invalid choice `{0}`! Choose from: `truth`, `dare`, or leave it blank for random.")]
    InvalidChoice(String),

    #[error("No prompts available for {0}")]
    Empty(String),
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct PromptService {
    catalog: PromptCatalog,
}

impl PromptService {
    pub fn new(catalog: PromptCatalog) -> Self {
        Self { catalog }
    }

    /// Category names, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.catalog.topics.keys().cloned().collect()
    }

    pub fn topic(&self, category: Option<&str>) -> Result<TopicPrompt, PromptError> {
        self.topic_with(&mut rand::thread_rng(), category)
    }

    /// Pick a topic from `category`, or from a random category when it is
    /// `None` or `"random"`. Category names match case-insensitively.
    pub fn topic_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        category: Option<&str>,
    ) -> Result<TopicPrompt, PromptError> {
        let requested = category
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty() && c != "random");

        let (name, prompts) = match requested {
            Some(requested) => self
                .catalog
                .topics
                .iter()
                .find(|(name, _)| name.to_lowercase() == requested)
                .ok_or_else(|| PromptError::UnknownCategory {
                    requested,
                    available: self.categories(),
                })?,
            None => self
                .catalog
                .topics
                .iter()
                .filter(|(_, prompts)| !prompts.is_empty())
                .choose(rng)
                .ok_or_else(|| PromptError::Empty("topics".to_string()))?,
        };

        let prompt = prompts
            .choose(rng)
            .ok_or_else(|| PromptError::Empty(format!("topic category `{name}`")))?;

        Ok(TopicPrompt {
            category: name.clone(),
            prompt: prompt.clone(),
        })
    }

    pub fn would_you_rather(&self) -> Result<String, PromptError> {
        self.would_you_rather_with(&mut rand::thread_rng())
    }

    pub fn would_you_rather_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String, PromptError> {
        self.catalog
            .would_you_rather
            .choose(rng)
            .cloned()
            .ok_or_else(|| PromptError::Empty("would you rather".to_string()))
    }

    pub fn truth_or_dare(&self, choice: Option<&str>) -> Result<TruthOrDarePrompt, PromptError> {
        self.truth_or_dare_with(&mut rand::thread_rng(), choice)
    }

    pub fn truth_or_dare_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        choice: Option<&str>,
    ) -> Result<TruthOrDarePrompt, PromptError> {
        let kind = match choice.map(TruthOrDare::parse).transpose()?.flatten() {
            Some(kind) => kind,
            None if rng.gen_bool(0.5) => TruthOrDare::Truth,
            None => TruthOrDare::Dare,
        };

        let pool = match kind {
            TruthOrDare::Truth => &self.catalog.truth_or_dare.truth,
            TruthOrDare::Dare => &self.catalog.truth_or_dare.dare,
        };

        let prompt = pool
            .choose(rng)
            .cloned()
            .ok_or_else(|| PromptError::Empty(kind.label().to_lowercase()))?;

        Ok(TruthOrDarePrompt { kind, prompt })
    }
}

// ============================================================================
// TESTS
// ============================================================================
