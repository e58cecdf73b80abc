use crate::facts::PlayerAddedFact;
use crate::identity::ParticipantId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerStatus {
    Alive,
    Dead,
}

/// Projection of a participant within one game. `game_id` refers back to the
/// owning game by identity only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub game_id: String,
    pub participant_id: ParticipantId,
    pub time_created: DateTime<Utc>,
    pub name: String,
    pub contact: String,
    pub status: PlayerStatus,
    pub kills: u32,
    pub target: Option<String>,
    pub kill_word: Option<String>,
}

impl Player {
    pub fn from_fact(fact: &PlayerAddedFact) -> Self {
        Self {
            id: fact.id.clone(),
            game_id: fact.game_id.clone(),
            participant_id: fact.participant_id.clone(),
            time_created: fact.time_created,
            name: fact.name.clone(),
            contact: fact.contact.clone(),
            status: PlayerStatus::Alive,
            kills: 0,
            target: None,
            kill_word: None,
        }
    }

    /// Sets the target and the word needed to take it out.
    pub fn set_target(&mut self, target_id: impl Into<String>, kill_word: impl Into<String>) {
        self.target = Some(target_id.into());
        self.kill_word = Some(kill_word.into());
    }
}
