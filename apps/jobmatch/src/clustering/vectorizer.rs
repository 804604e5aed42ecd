//! Skill Vectorizer maps comma-delimited skill text onto count vectors over
//! a vocabulary learned once at fit time.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::clustering::tokenizer::TokenizerId;
use crate::errors::PipelineError;

/// Per-token occurrence counts, one entry per vocabulary index.
pub type SkillVector = Vec<u32>;

/// Distinct skill tokens in a fixed order. A token's position is its vector index.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    tokens: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Builds a vocabulary from tokens in their final order.
    /// Duplicate tokens would make two coordinates ambiguous and are rejected.
    pub fn from_tokens(tokens: Vec<String>) -> Result<Self, PipelineError> {
        let mut index = HashMap::with_capacity(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            if index.insert(token.clone(), i).is_some() {
                return Err(PipelineError::ArtifactMismatch(format!(
                    "duplicate vocabulary token '{token}'"
                )));
            }
        }
        Ok(Self { tokens, index })
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn index_of(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SkillVectorizer {
    tokenizer: TokenizerId,
    vocabulary: Option<Vocabulary>,
}

impl SkillVectorizer {
    pub fn new(tokenizer: TokenizerId) -> Self {
        Self {
            tokenizer,
            vocabulary: None,
        }
    }

    /// Restores a fitted vectorizer from persisted parts.
    pub fn from_parts(tokenizer: TokenizerId, tokens: Vec<String>) -> Result<Self, PipelineError> {
        Ok(Self {
            tokenizer,
            vocabulary: Some(Vocabulary::from_tokens(tokens)?),
        })
    }

    pub fn tokenizer(&self) -> TokenizerId {
        self.tokenizer
    }

    pub fn vocabulary(&self) -> Option<&Vocabulary> {
        self.vocabulary.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.vocabulary.is_some()
    }

    /// Number of coordinates produced by `transform`.
    pub fn dimension(&self) -> Result<usize, PipelineError> {
        Ok(self.fitted()?.len())
    }

    /// Learns the vocabulary from normalized skill strings. Tokens are stored
    /// in sorted order, which keeps indices stable for a given corpus.
    /// Refitting replaces the previous vocabulary.
    pub fn fit<S: AsRef<str>>(&mut self, corpus: &[S]) -> Result<(), PipelineError> {
        if corpus.is_empty() {
            return Err(PipelineError::EmptyTrainingSet);
        }

        let distinct: BTreeSet<&str> = corpus
            .iter()
            .flat_map(|text| self.tokenizer.tokenize(text.as_ref()))
            .collect();
        let tokens = distinct.into_iter().map(str::to_string).collect();
        let vocabulary = Vocabulary::from_tokens(tokens)?;

        debug!(
            "Fitted vocabulary of {} tokens from {} postings",
            vocabulary.len(),
            corpus.len()
        );
        self.vocabulary = Some(vocabulary);
        Ok(())
    }

    /// Counts vocabulary tokens in one normalized skill string.
    /// Tokens outside the vocabulary contribute nothing.
    pub fn transform(&self, text: &str) -> Result<SkillVector, PipelineError> {
        let vocabulary = self.fitted()?;
        let mut vector = vec![0u32; vocabulary.len()];
        for token in self.tokenizer.tokenize(text) {
            if let Some(i) = vocabulary.index_of(token) {
                vector[i] += 1;
            }
        }
        Ok(vector)
    }

    pub fn transform_many<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<SkillVector>, PipelineError> {
        texts.iter().map(|t| self.transform(t.as_ref())).collect()
    }

    pub fn fit_transform<S: AsRef<str>>(&mut self, corpus: &[S]) -> Result<Vec<SkillVector>, PipelineError> {
        self.fit(corpus)?;
        self.transform_many(corpus)
    }

    fn fitted(&self) -> Result<&Vocabulary, PipelineError> {
        self.vocabulary
            .as_ref()
            .ok_or(PipelineError::NotFitted("SkillVectorizer"))
    }
}
