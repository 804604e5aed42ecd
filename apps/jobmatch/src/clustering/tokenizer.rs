//! Skill text normalization and the tokenizer registry.
//!
//! Tokenizers are referenced by a versioned name that is written into every
//! vectorizer artifact. Deserializing an artifact resolves that name through
//! [`TokenizerId::resolve`]; an unknown name is a hard error, so a reloaded
//! vectorizer can never tokenize differently from the one that was fitted.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::PipelineError;

/// Lower-cases and trims skill text. Missing text becomes the empty string.
pub fn normalize_skills(text: Option<&str>) -> String {
    text.unwrap_or("").trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TokenizerId {
    /// Split on `,`, trim each piece, drop empty pieces.
    #[default]
    CommaV1,
}

impl TokenizerId {
    const REGISTRY: &'static [(&'static str, TokenizerId)] = &[("comma-v1", TokenizerId::CommaV1)];

    pub fn name(self) -> &'static str {
        match self {
            TokenizerId::CommaV1 => "comma-v1",
        }
    }

    pub fn resolve(name: &str) -> Result<Self, PipelineError> {
        Self::REGISTRY
            .iter()
            .find(|(registered, _)| *registered == name)
            .map(|(_, id)| *id)
            .ok_or_else(|| PipelineError::UnknownTokenizer(name.to_string()))
    }

    /// Splits already-normalized skill text into tokens.
    pub fn tokenize<'a>(self, text: &'a str) -> Vec<&'a str> {
        match self {
            TokenizerId::CommaV1 => text
                .split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .collect(),
        }
    }
}

impl fmt::Display for TokenizerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<String> for TokenizerId {
    type Error = PipelineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::resolve(&value)
    }
}

impl From<TokenizerId> for String {
    fn from(id: TokenizerId) -> Self {
        id.name().to_string()
    }
}
