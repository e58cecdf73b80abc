//! Kill dictionaries: the word lists secret kill words are drawn from.

use crate::facts::KEY_SEPARATOR;
use rand::seq::SliceRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Shortest word accepted into a dictionary.
pub const MIN_WORD_LEN: usize = 4;

/// Source of kill words for a named dictionary.
pub trait KillDictionary: Send + Sync {
    /// Whether `dictionary` can be used to start a game.
    fn is_valid(&self, dictionary: &str) -> bool;

    /// Draws a word from `dictionary`.
    fn pick_word(&self, dictionary: &str, rng: &mut dyn RngCore) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KillWordError {
    #[error("a blank ID is not a valid kill dictionary")]
    MissingDictionary,
    #[error("dictionary name {0:?} must not contain '+'")]
    ReservedSeparator(String),
    #[error("{word} does not meet the minimum char length {}", MIN_WORD_LEN)]
    TooShort { word: String },
    #[error("{word} must be a single word")]
    NotSingleWord { word: String },
}

/// A persisted dictionary entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillWord {
    pub id: String,
    pub dictionary: String,
    pub word: String,
}

impl KillWord {
    pub fn new(dictionary: &str, word: &str) -> Result<Self, KillWordError> {
        if dictionary.is_empty() {
            return Err(KillWordError::MissingDictionary);
        }
        if dictionary.contains(KEY_SEPARATOR) {
            return Err(KillWordError::ReservedSeparator(dictionary.to_string()));
        }
        if word.chars().count() < MIN_WORD_LEN {
            return Err(KillWordError::TooShort {
                word: word.to_string(),
            });
        }
        if word.chars().any(char::is_whitespace) {
            return Err(KillWordError::NotSingleWord {
                word: word.to_string(),
            });
        }
        Ok(Self {
            id: format!("{dictionary}{KEY_SEPARATOR}{word}"),
            dictionary: dictionary.to_string(),
            word: word.to_string(),
        })
    }
}

/// In-memory dictionaries keyed by name. A dictionary is usable once it holds
/// at least one word.
#[derive(Clone, Debug, Default)]
pub struct WordList {
    words: HashMap<String, Vec<String>>,
}

impl WordList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the word was already present.
    pub fn insert(&mut self, entry: KillWord) -> bool {
        let words = self.words.entry(entry.dictionary).or_default();
        if words.contains(&entry.word) {
            return false;
        }
        words.push(entry.word);
        true
    }

    pub fn count(&self, dictionary: &str) -> usize {
        self.words.get(dictionary).map_or(0, Vec::len)
    }
}

impl FromIterator<KillWord> for WordList {
    fn from_iter<I: IntoIterator<Item = KillWord>>(iter: I) -> Self {
        let mut list = WordList::new();
        for entry in iter {
            list.insert(entry);
        }
        list
    }
}

impl KillDictionary for WordList {
    fn is_valid(&self, dictionary: &str) -> bool {
        self.count(dictionary) > 0
    }

    fn pick_word(&self, dictionary: &str, rng: &mut dyn RngCore) -> Option<String> {
        self.words.get(dictionary)?.choose(rng).cloned()
    }
}
