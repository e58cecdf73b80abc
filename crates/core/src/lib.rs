//! Domain model for the word assassin game: the facts that make up the event
//! log, the projections derived from them, and target assignment.

pub mod assignment;
pub mod dictionary;
pub mod facts;
pub mod game;
pub mod identity;
pub mod player;

pub use assignment::{assign_ring, ring_cycle_len, AssignmentError};
pub use dictionary::{KillDictionary, KillWord, KillWordError, WordList};
pub use facts::{
    player_key, Fact, FactError, GameCreatedFact, GameStartedFact, PlayerAddedFact,
    TargetAssignment,
};
pub use game::{Game, GameStatus, LifecycleError, MINIMUM_PLAYERS};
pub use identity::{IdentityError, ParticipantId};
pub use player::{Player, PlayerStatus};
