use crate::facts::GameCreatedFact;
use crate::identity::ParticipantId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum number of players needed before a game may start.
pub const MINIMUM_PLAYERS: usize = 5;

/// Lifecycle of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Accepting players.
    Starting,
    /// Targets assigned; no new players.
    Playing,
    Finished,
    Aborted,
}

impl GameStatus {
    pub fn can_transition_to(self, next: GameStatus) -> bool {
        matches!(
            (self, next),
            (GameStatus::Starting, GameStatus::Playing)
                | (GameStatus::Playing, GameStatus::Finished)
                | (GameStatus::Playing, GameStatus::Aborted)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameStatus::Starting => "starting",
            GameStatus::Playing => "playing",
            GameStatus::Finished => "finished",
            GameStatus::Aborted => "aborted",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("game {game_id} cannot move from {from} to {to}")]
pub struct LifecycleError {
    pub game_id: String,
    pub from: GameStatus,
    pub to: GameStatus,
}

/// Projection of a single game, derived from its [`GameCreatedFact`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub time_created: DateTime<Utc>,
    pub creator: ParticipantId,
    pub dictionary: String,
    pub passcode: String,
    pub status: GameStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub min_players: usize,
    /// Players admitted before the start.
    pub start_players: usize,
    /// Players still alive.
    pub remain_players: usize,
}

impl Game {
    pub fn from_fact(fact: &GameCreatedFact, min_players: usize) -> Self {
        Self {
            id: fact.id.clone(),
            time_created: fact.time_created,
            creator: fact.creator.clone(),
            dictionary: fact.dictionary.clone(),
            passcode: fact.passcode.clone(),
            status: GameStatus::Starting,
            start_time: None,
            min_players,
            start_players: 0,
            remain_players: 0,
        }
    }

    pub fn is_accepting_players(&self) -> bool {
        self.status == GameStatus::Starting
    }

    pub fn transition(&mut self, next: GameStatus) -> Result<(), LifecycleError> {
        if !self.status.can_transition_to(next) {
            return Err(LifecycleError {
                game_id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Moves the game into play. Everyone admitted so far is still alive.
    pub fn start(&mut self, at: DateTime<Utc>) -> Result<(), LifecycleError> {
        self.transition(GameStatus::Playing)?;
        self.start_time = Some(at);
        self.remain_players = self.start_players;
        Ok(())
    }

    pub fn status_report(&self) -> String {
        format!(
            "Game Status for {}:\n\n   Status: {}\n   # Players: {}\n",
            self.id, self.status, self.start_players
        )
    }
}
