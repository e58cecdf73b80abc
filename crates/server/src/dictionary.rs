use crate::errors::DictionaryError;
use assassin_core::{KillDictionary, KillWord, WordList};
use assassin_store::{collections, decode, encode, DocumentStore, StoreError};
use parking_lot::RwLock;
use rand::RngCore;
use std::sync::Arc;
use tracing::{error, info};

/// Kill dictionaries backed by the `killwords` collection.
///
/// Words are read once at startup and cached; new words are written through
/// to the store before they become pickable.
pub struct StoredDictionary {
    store: Arc<dyn DocumentStore>,
    words: RwLock<WordList>,
}

impl StoredDictionary {
    pub async fn load(store: Arc<dyn DocumentStore>) -> Result<Self, StoreError> {
        let documents = store.read_all(collections::KILLWORDS).await?;
        let entries = documents
            .iter()
            .map(|doc| decode::<KillWord>(doc))
            .collect::<Result<Vec<_>, _>>()?;
        info!(words = entries.len(), "kill words loaded");
        Ok(Self {
            store,
            words: RwLock::new(entries.into_iter().collect()),
        })
    }

    pub async fn add_word(&self, dictionary: &str, word: &str) -> Result<KillWord, DictionaryError> {
        let entry = KillWord::new(dictionary, word)?;
        let bytes = encode(&entry).map_err(DictionaryError::Store)?;

        match self
            .store
            .append(collections::KILLWORDS, &entry.id, &bytes)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_duplicate_key() => {
                return Err(DictionaryError::Duplicate {
                    dictionary: dictionary.to_string(),
                    word: word.to_string(),
                });
            }
            Err(e) => {
                error!(dictionary, word, error = %e, "failed to write kill word");
                return Err(DictionaryError::Store(e));
            }
        }

        self.words.write().insert(entry.clone());
        info!(dictionary, word, "kill word added");
        Ok(entry)
    }

    pub fn count(&self, dictionary: &str) -> usize {
        self.words.read().count(dictionary)
    }
}

impl KillDictionary for StoredDictionary {
    fn is_valid(&self, dictionary: &str) -> bool {
        self.words.read().is_valid(dictionary)
    }

    fn pick_word(&self, dictionary: &str, rng: &mut dyn RngCore) -> Option<String> {
        self.words.read().pick_word(dictionary, rng)
    }
}
