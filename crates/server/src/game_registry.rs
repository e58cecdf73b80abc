//! The game pool: in-memory view of every game, kept in step with the event
//! log.
//!
//! Every mutation holds the pool's write lock across the whole
//! check / append / insert sequence, so memory never runs ahead of the log and
//! two concurrent requests for the same game cannot both succeed.

use crate::errors::{
    AddGameError, AddPlayerError, AdmissionError, DuplicateOrigin, PlayerRegistryError,
    ReconcileError, StartGameError,
};
use crate::player_registry::PlayerRegistry;
use crate::types::RegistryConfig;
use assassin_core::{
    assign_ring, ring_cycle_len, Fact, Game, GameCreatedFact, GameStartedFact, GameStatus,
    KillDictionary, Player, PlayerAddedFact,
};
use assassin_store::{collections, encode, DocumentStore, StoreError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

struct GameEntry {
    game: Game,
    /// Insertion order, used to break ties in creation time.
    seq: u64,
}

pub(crate) struct Pool {
    games: HashMap<String, GameEntry>,
    next_seq: u64,
    rng: StdRng,
}

impl Pool {
    fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            games: HashMap::new(),
            next_seq: 0,
            rng,
        }
    }

    /// Returns false if a game with the same id is already present.
    pub(crate) fn insert(&mut self, game: Game) -> bool {
        if self.games.contains_key(&game.id) {
            return false;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.games.insert(game.id.clone(), GameEntry { game, seq });
        true
    }

    pub(crate) fn get_mut(&mut self, game_id: &str) -> Option<&mut Game> {
        self.games.get_mut(game_id).map(|e| &mut e.game)
    }

    fn admission(&self, game_id: &str) -> Result<&Game, AdmissionError> {
        let entry = self
            .games
            .get(game_id)
            .ok_or_else(|| AdmissionError::NotFound(game_id.to_string()))?;
        if !entry.game.is_accepting_players() {
            return Err(AdmissionError::NotAccepting {
                game_id: game_id.to_string(),
                status: entry.game.status,
            });
        }
        Ok(&entry.game)
    }
}

/// Registry of all games on this server.
pub struct GameRegistry {
    config: RegistryConfig,
    store: Arc<dyn DocumentStore>,
    players: Arc<PlayerRegistry>,
    dictionary: Arc<dyn KillDictionary>,
    pub(crate) pool: RwLock<Pool>,
}

impl GameRegistry {
    /// Creates an empty registry. Use [`GameRegistry::open`] to rebuild from
    /// an existing event log.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        players: Arc<PlayerRegistry>,
        dictionary: Arc<dyn KillDictionary>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            pool: RwLock::new(Pool::new(config.seed)),
            config,
            store,
            players,
            dictionary,
        }
    }

    pub fn players(&self) -> &Arc<PlayerRegistry> {
        &self.players
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub(crate) fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    async fn append_fact(&self, fact: Fact) -> Result<(), StoreError> {
        let bytes = encode(&fact)?;
        self.store
            .append(collections::EVENTS, fact.id(), &bytes)
            .await
    }

    /// Records a new game. The fact is written to the log first; the game only
    /// enters the pool once the write is confirmed.
    pub async fn add_game(
        &self,
        game_id: &str,
        creator: &str,
        dictionary: &str,
        passcode: &str,
    ) -> Result<Game, AddGameError> {
        let fact = GameCreatedFact::new(game_id, creator, dictionary, passcode)?;
        let game = Game::from_fact(&fact, self.config.min_players());

        let mut pool = self.pool.write().await;

        match self.append_fact(fact.into()).await {
            Ok(()) => {}
            Err(e) if e.is_duplicate_key() => {
                warn!(game_id, "game already created");
                return Err(AddGameError::Duplicate(game_id.to_string()));
            }
            Err(e) => {
                error!(game_id, error = %e, "failed to write game created fact");
                return Err(AddGameError::Store(e));
            }
        }

        if !pool.insert(game.clone()) {
            error!(game_id, "game pool out of sync with event log");
            return Err(AddGameError::PoolOutOfSync(game_id.to_string()));
        }

        info!(game_id, creator, "game created");
        Ok(game)
    }

    /// Admits the player described by `fact` to `game_id`.
    pub async fn add_player_to_game(
        &self,
        game_id: &str,
        fact: PlayerAddedFact,
    ) -> Result<Player, AddPlayerError> {
        if fact.game_id != game_id {
            return Err(AddPlayerError::GameMismatch {
                expected: game_id.to_string(),
                found: fact.game_id,
            });
        }

        let mut pool = self.pool.write().await;
        pool.admission(game_id)?;

        let player = Player::from_fact(&fact);
        let participant_id = fact.participant_id.to_string();

        match self.append_fact(fact.into()).await {
            Ok(()) => {}
            Err(e) if e.is_duplicate_key() => {
                warn!(game_id, %participant_id, "player already added");
                return Err(AddPlayerError::Duplicate {
                    game_id: game_id.to_string(),
                    participant_id,
                    origin: DuplicateOrigin::Store,
                });
            }
            Err(e) => {
                error!(game_id, %participant_id, error = %e, "failed to write player added fact");
                return Err(AddPlayerError::Store(e));
            }
        }

        match self.players.add_player(player.clone()).await {
            Ok(()) => {}
            Err(PlayerRegistryError::Duplicate(id)) => {
                error!(game_id, player_id = %id, "player registry out of sync with event log");
                return Err(AddPlayerError::Duplicate {
                    game_id: game_id.to_string(),
                    participant_id,
                    origin: DuplicateOrigin::Registry,
                });
            }
            Err(e) => return Err(AddPlayerError::PoolOutOfSync(e.to_string())),
        }

        let Some(game) = pool.get_mut(game_id) else {
            return Err(AddPlayerError::PoolOutOfSync(format!(
                "game {game_id} vanished while adding {participant_id}"
            )));
        };
        game.start_players += 1;

        info!(game_id, %participant_id, players = game.start_players, "player added");
        Ok(player)
    }

    /// Ok if the game exists and is still taking players.
    pub async fn can_add_players(&self, game_id: &str) -> Result<(), AdmissionError> {
        self.pool.read().await.admission(game_id).map(|_| ())
    }

    pub async fn get_game(&self, game_id: &str) -> Option<Game> {
        self.pool
            .read()
            .await
            .games
            .get(game_id)
            .map(|e| e.game.clone())
    }

    /// All games, oldest first. Games created at the same instant keep the
    /// order they were added in.
    pub async fn list_games(&self) -> Vec<Game> {
        let pool = self.pool.read().await;
        let mut entries: Vec<&GameEntry> = pool.games.values().collect();
        entries.sort_by_key(|e| (e.game.time_created, e.seq));
        entries.into_iter().map(|e| e.game.clone()).collect()
    }

    /// Starts a game on behalf of `requester`, who must be its creator.
    /// Assigns the first ring of targets and moves the game to playing. On any
    /// failure the game is left as it was.
    pub async fn start_game(&self, game_id: &str, requester: &str) -> Result<Game, StartGameError> {
        if game_id.is_empty() || requester.is_empty() {
            return Err(StartGameError::MissingArgument);
        }

        let mut pool = self.pool.write().await;

        let (creator, dictionary, start_players) = {
            let game = pool
                .games
                .get(game_id)
                .map(|e| &e.game)
                .ok_or_else(|| StartGameError::NotFound(game_id.to_string()))?;

            if game.status != GameStatus::Starting {
                return Err(StartGameError::WrongState {
                    game_id: game_id.to_string(),
                    status: game.status,
                });
            }
            if game.creator != *requester {
                warn!(game_id, requester, "non-creator tried to start game");
                return Err(StartGameError::NotCreator {
                    game_id: game_id.to_string(),
                    requester: requester.to_string(),
                });
            }
            if game.start_players < game.min_players {
                return Err(StartGameError::InsufficientPlayers {
                    game_id: game_id.to_string(),
                    required: game.min_players,
                    current: game.start_players,
                });
            }
            if !self.dictionary.is_valid(&game.dictionary) {
                return Err(StartGameError::InvalidDictionary {
                    game_id: game_id.to_string(),
                    dictionary: game.dictionary.clone(),
                });
            }
            (
                game.creator.clone(),
                game.dictionary.clone(),
                game.start_players,
            )
        };

        let players = self.players.players_in_game(game_id).await;
        if players.len() != start_players {
            error!(
                game_id,
                start_players,
                registered = players.len(),
                "player count out of sync"
            );
            return Err(StartGameError::PoolOutOfSync(format!(
                "game {game_id} admitted {start_players} players but {} are registered",
                players.len()
            )));
        }

        let player_ids = players.into_iter().map(|p| p.id).collect();
        let assignments = assign_ring(
            player_ids,
            &dictionary,
            self.dictionary.as_ref(),
            &mut pool.rng,
        )
        .map_err(|e| {
            error!(game_id, error = %e, "dictionary could not supply kill words");
            StartGameError::InvalidDictionary {
                game_id: game_id.to_string(),
                dictionary: dictionary.clone(),
            }
        })?;

        let single_ring = assignments
            .first()
            .and_then(|a| ring_cycle_len(&assignments, &a.player_id))
            == Some(assignments.len());
        if !single_ring {
            error!(game_id, "target assignment did not form a single ring");
            return Err(StartGameError::PoolOutOfSync(format!(
                "game {game_id} targets do not form a single ring"
            )));
        }

        let fact = GameStartedFact::new(game_id, creator, assignments);
        let started_at = fact.time_created;
        let assignments = fact.assignments.clone();

        match self.append_fact(fact.into()).await {
            Ok(()) => {}
            Err(e) if e.is_duplicate_key() => {
                error!(game_id, "event log already holds a start for a starting game");
                return Err(StartGameError::PoolOutOfSync(format!(
                    "game {game_id} already started in the event log"
                )));
            }
            Err(e) => {
                error!(game_id, error = %e, "failed to write game started fact");
                return Err(StartGameError::Store(e));
            }
        }

        self.players
            .apply_assignments(&assignments)
            .await
            .map_err(|e| StartGameError::PoolOutOfSync(e.to_string()))?;

        let game = pool
            .get_mut(game_id)
            .ok_or_else(|| StartGameError::PoolOutOfSync(format!("game {game_id} vanished")))?;
        game.start(started_at)
            .map_err(|e| StartGameError::PoolOutOfSync(e.to_string()))?;

        info!(game_id, players = game.start_players, "game started");
        Ok(game.clone())
    }

    /// Loads already-durable games into an empty pool without writing them to
    /// the log again. A duplicate means the log itself is corrupt.
    pub async fn reconstitute(&self, games: Vec<Game>) -> Result<(), ReconcileError> {
        let mut pool = self.pool.write().await;
        for game in games {
            let game_id = game.id.clone();
            if !pool.insert(game) {
                error!(game_id = %game_id, "duplicate game during reconciliation");
                return Err(ReconcileError::DuplicateGame(game_id));
            }
        }
        Ok(())
    }
}
