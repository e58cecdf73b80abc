//! Event-sourced game pool for word assassin: registries, startup
//! reconciliation and the plain-text handler the HTTP binary serves.

pub mod dictionary;
pub mod errors;
pub mod game_registry;
pub mod handler;
pub mod player_registry;
mod reconcile;
pub mod types;

pub use dictionary::StoredDictionary;
pub use errors::{
    AddGameError, AddPlayerError, AdmissionError, DictionaryError, DuplicateOrigin,
    PlayerRegistryError, ReconcileError, StartGameError,
};
pub use game_registry::GameRegistry;
pub use handler::Handler;
pub use player_registry::PlayerRegistry;
pub use types::RegistryConfig;
