//! Plain-text caller surface over the registries, consumed by the HTTP layer.

use crate::dictionary::StoredDictionary;
use crate::errors::{AddGameError, AddPlayerError, DictionaryError, ReconcileError, StartGameError};
use crate::game_registry::GameRegistry;
use crate::player_registry::PlayerRegistry;
use crate::types::RegistryConfig;
use assassin_core::{identity, PlayerAddedFact};
use assassin_store::DocumentStore;
use chrono::Utc;
use std::fmt::Write;
use std::sync::Arc;
use tracing::warn;

pub struct Handler {
    games: Arc<GameRegistry>,
    dictionary: Arc<StoredDictionary>,
}

impl Handler {
    /// Loads dictionaries and replays the event log. Fails if the log cannot
    /// be trusted.
    pub async fn open(
        store: Arc<dyn DocumentStore>,
        config: RegistryConfig,
    ) -> Result<Self, ReconcileError> {
        let dictionary = Arc::new(
            StoredDictionary::load(store.clone())
                .await
                .map_err(ReconcileError::Dictionary)?,
        );
        let games = GameRegistry::open(
            store,
            Arc::new(PlayerRegistry::new()),
            dictionary.clone(),
            config,
        )
        .await?;
        Ok(Self {
            games: Arc::new(games),
            dictionary,
        })
    }

    pub fn games(&self) -> &Arc<GameRegistry> {
        &self.games
    }

    pub fn dictionary(&self) -> &Arc<StoredDictionary> {
        &self.dictionary
    }

    pub async fn create_game(
        &self,
        game_id: &str,
        creator: &str,
        dictionary: &str,
        passcode: &str,
    ) -> Result<String, AddGameError> {
        self.games
            .add_game(game_id, creator, dictionary, passcode)
            .await?;
        Ok(format!("Game Created\nGame: {game_id}  Creator: {creator}"))
    }

    /// Checks admission before building the fact, so a closed or unknown game
    /// is reported ahead of any validation problem with the participant.
    pub async fn add_player(
        &self,
        game_id: &str,
        participant_id: &str,
        name: &str,
        contact: &str,
    ) -> Result<String, AddPlayerError> {
        if let Err(e) = self.games.can_add_players(game_id).await {
            warn!(game_id, participant_id, reason = %e, "player refused");
            return Err(e.into());
        }
        let fact = PlayerAddedFact::new(game_id, participant_id, name, contact)?;
        self.games.add_player_to_game(game_id, fact).await?;
        Ok(format!("Player {participant_id} added to game {game_id}"))
    }

    pub async fn start_game(&self, game_id: &str, requester: &str) -> Result<String, StartGameError> {
        if !requester.is_empty() {
            identity::validate(requester)?;
        }
        let game = self.games.start_game(game_id, requester).await?;
        Ok(format!(
            "Game {} started with {} players",
            game.id, game.start_players
        ))
    }

    pub async fn game_status(&self, game_id: &str) -> Option<String> {
        self.games
            .get_game(game_id)
            .await
            .map(|game| game.status_report())
    }

    pub async fn games_list(&self) -> String {
        let mut report = format!("Games List\n  timestamp: {}\n\n", Utc::now());
        for game in self.games.list_games().await {
            let _ = writeln!(
                report,
                "{}: {}, {} players",
                game.id, game.status, game.start_players
            );
        }
        report
    }

    pub async fn add_word(&self, dictionary: &str, word: &str) -> Result<String, DictionaryError> {
        self.dictionary.add_word(dictionary, word).await?;
        Ok(format!(
            "Added {word} to dictionary {dictionary} ({} words)",
            self.dictionary.count(dictionary)
        ))
    }
}
