use assassin_core::{FactError, GameStatus, IdentityError, KillWordError, LifecycleError};
use assassin_store::StoreError;

/// Which layer caught a duplicate player. A registry-level duplicate after a
/// successful store write means memory and the event log disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateOrigin {
    Store,
    Registry,
}

/// Why a game is not taking new players.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionError {
    #[error("the requested game {0} doesn't exist on this server")]
    NotFound(String),
    #[error("the requested game {game_id} is not accepting players, current status = {status}")]
    NotAccepting { game_id: String, status: GameStatus },
}

/// Error when creating a game.
#[derive(Debug, thiserror::Error)]
pub enum AddGameError {
    #[error(transparent)]
    Validation(#[from] FactError),
    #[error("game {0} already created")]
    Duplicate(String),
    /// The store took the fact but memory already held the game.
    #[error("game pool out of sync with the event log: game {0} already in memory")]
    PoolOutOfSync(String),
    #[error("event log write failed: {0}")]
    Store(#[source] StoreError),
}

/// Error from the player registry itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlayerRegistryError {
    #[error("missing ID for add player")]
    MissingId,
    #[error("duplicate ID on add: {0}")]
    Duplicate(String),
    #[error("missing ID: {0}")]
    NotFound(String),
}

/// Error when admitting a player to a game.
#[derive(Debug, thiserror::Error)]
pub enum AddPlayerError {
    #[error(transparent)]
    Validation(#[from] FactError),
    #[error("fact for game {found} submitted to game {expected}")]
    GameMismatch { expected: String, found: String },
    #[error(transparent)]
    NotAcceptingPlayers(#[from] AdmissionError),
    #[error("player {participant_id} already added to game {game_id}")]
    Duplicate {
        game_id: String,
        participant_id: String,
        origin: DuplicateOrigin,
    },
    #[error("game pool out of sync with the event log: {0}")]
    PoolOutOfSync(String),
    #[error("event log write failed: {0}")]
    Store(#[source] StoreError),
}

/// Error when starting a game.
#[derive(Debug, thiserror::Error)]
pub enum StartGameError {
    #[error("game start requires a non-empty game ID and requester ID")]
    MissingArgument,
    #[error("{0}")]
    InvalidRequester(#[from] IdentityError),
    #[error("the requested game {0} doesn't exist on this server")]
    NotFound(String),
    #[error("game {game_id} cannot be started, current status = {status}")]
    WrongState { game_id: String, status: GameStatus },
    #[error("game {game_id} cannot be started by non-creator {requester}")]
    NotCreator { game_id: String, requester: String },
    #[error("game {game_id} requires {required} players, current count is {current}")]
    InsufficientPlayers {
        game_id: String,
        required: usize,
        current: usize,
    },
    #[error("game {game_id} requires a valid dictionary, {dictionary} doesn't meet the criteria")]
    InvalidDictionary { game_id: String, dictionary: String },
    #[error("game pool out of sync with the event log: {0}")]
    PoolOutOfSync(String),
    #[error("event log write failed: {0}")]
    Store(#[source] StoreError),
}

/// Startup replay failed; the registry must not serve requests.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("could not read the event log: {0}")]
    Store(#[from] StoreError),
    #[error("duplicate game {0} in the event log")]
    DuplicateGame(String),
    #[error("duplicate player {0} in the event log")]
    DuplicatePlayer(String),
    #[error("fact {fact_id} refers to unknown game {game_id}")]
    UnknownGame { fact_id: String, game_id: String },
    #[error("game {game_id} assigns a target to unknown player {player_id}")]
    UnknownPlayer { game_id: String, player_id: String },
    #[error("player {player_id} joined game {game_id} after it left starting")]
    PlayerAfterStart { game_id: String, player_id: String },
    #[error("game {game_id} start assigns {assigned} targets to {admitted} players in more than one ring")]
    BrokenRing {
        game_id: String,
        assigned: usize,
        admitted: usize,
    },
    #[error("could not load kill words from the killwords collection: {0}")]
    Dictionary(#[source] StoreError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Error when adding a word to a kill dictionary.
#[derive(Debug, thiserror::Error)]
pub enum DictionaryError {
    #[error(transparent)]
    Invalid(#[from] KillWordError),
    #[error("{word} is already in dictionary {dictionary}")]
    Duplicate { dictionary: String, word: String },
    #[error("dictionary write failed: {0}")]
    Store(#[source] StoreError),
}
