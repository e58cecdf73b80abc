//! Append-only facts. Each fact carries a deterministic identity derived from
//! its arguments, which doubles as its key in the event log.

use crate::identity::{IdentityError, ParticipantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Joins a game id and a participant id into a player identity.
pub const KEY_SEPARATOR: char = '+';

/// Why a fact could not be constructed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FactError {
    #[error("the request is missing the game ID field")]
    MissingGameId,
    #[error("game ID {0:?} must not contain '+'")]
    ReservedSeparator(String),
    #[error("the request is missing the creator field")]
    MissingCreator,
    #[error("the request is missing the kill dictionary field")]
    MissingDictionary,
    #[error("the request is missing the passcode field")]
    MissingPasscode,
    #[error("the request is missing the participant ID field")]
    MissingParticipant,
    #[error("{0}")]
    Identity(#[from] IdentityError),
}

pub fn player_key(game_id: &str, participant_id: &str) -> String {
    format!("{game_id}{KEY_SEPARATOR}{participant_id}")
}

fn check_game_id(game_id: &str) -> Result<(), FactError> {
    if game_id.is_empty() {
        return Err(FactError::MissingGameId);
    }
    if game_id.contains(KEY_SEPARATOR) {
        return Err(FactError::ReservedSeparator(game_id.to_string()));
    }
    Ok(())
}

/// Recorded once per game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameCreatedFact {
    pub id: String,
    pub time_created: DateTime<Utc>,
    pub creator: ParticipantId,
    pub dictionary: String,
    pub passcode: String,
}

impl GameCreatedFact {
    pub fn new(
        game_id: &str,
        creator: &str,
        dictionary: &str,
        passcode: &str,
    ) -> Result<Self, FactError> {
        check_game_id(game_id)?;
        if creator.is_empty() {
            return Err(FactError::MissingCreator);
        }
        if dictionary.is_empty() {
            return Err(FactError::MissingDictionary);
        }
        if passcode.is_empty() {
            return Err(FactError::MissingPasscode);
        }
        let creator = ParticipantId::parse(creator)?;

        Ok(Self {
            id: game_id.to_string(),
            time_created: Utc::now(),
            creator,
            dictionary: dictionary.to_string(),
            passcode: passcode.to_string(),
        })
    }

    /// Overrides the creation time, e.g. when importing a log.
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.time_created = at;
        self
    }
}

/// Recorded each time a participant joins a game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAddedFact {
    pub id: String,
    pub time_created: DateTime<Utc>,
    pub game_id: String,
    pub participant_id: ParticipantId,
    pub name: String,
    pub contact: String,
}

impl PlayerAddedFact {
    pub fn new(
        game_id: &str,
        participant_id: &str,
        name: &str,
        contact: &str,
    ) -> Result<Self, FactError> {
        check_game_id(game_id)?;
        if participant_id.is_empty() {
            return Err(FactError::MissingParticipant);
        }
        let participant_id = ParticipantId::parse(participant_id)?;

        Ok(Self {
            id: player_key(game_id, participant_id.as_str()),
            time_created: Utc::now(),
            game_id: game_id.to_string(),
            participant_id,
            name: name.to_string(),
            contact: contact.to_string(),
        })
    }
}

/// One edge of the target ring: `player_id` hunts `target_id` with `kill_word`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetAssignment {
    pub player_id: String,
    pub target_id: String,
    pub kill_word: String,
}

/// Recorded when a game moves from starting to playing, with the first round
/// of targets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStartedFact {
    pub id: String,
    pub time_created: DateTime<Utc>,
    pub game_id: String,
    pub started_by: ParticipantId,
    pub assignments: Vec<TargetAssignment>,
}

impl GameStartedFact {
    pub fn new(
        game_id: &str,
        started_by: ParticipantId,
        assignments: Vec<TargetAssignment>,
    ) -> Self {
        Self {
            id: format!("{game_id}{KEY_SEPARATOR}started"),
            time_created: Utc::now(),
            game_id: game_id.to_string(),
            started_by,
            assignments,
        }
    }
}

/// Everything the event log can hold.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum Fact {
    GameCreated(GameCreatedFact),
    PlayerAdded(PlayerAddedFact),
    GameStarted(GameStartedFact),
}

impl Fact {
    pub fn id(&self) -> &str {
        match self {
            Fact::GameCreated(f) => &f.id,
            Fact::PlayerAdded(f) => &f.id,
            Fact::GameStarted(f) => &f.id,
        }
    }

    pub fn time_created(&self) -> DateTime<Utc> {
        match self {
            Fact::GameCreated(f) => f.time_created,
            Fact::PlayerAdded(f) => f.time_created,
            Fact::GameStarted(f) => f.time_created,
        }
    }

    pub fn game_id(&self) -> &str {
        match self {
            Fact::GameCreated(f) => &f.id,
            Fact::PlayerAdded(f) => &f.game_id,
            Fact::GameStarted(f) => &f.game_id,
        }
    }
}

impl From<GameCreatedFact> for Fact {
    fn from(fact: GameCreatedFact) -> Self {
        Fact::GameCreated(fact)
    }
}

impl From<PlayerAddedFact> for Fact {
    fn from(fact: PlayerAddedFact) -> Self {
        Fact::PlayerAdded(fact)
    }
}

impl From<GameStartedFact> for Fact {
    fn from(fact: GameStartedFact) -> Self {
        Fact::GameStarted(fact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_created_keeps_its_arguments() {
        let fact = GameCreatedFact::new("g1", "U1", "websters", "gandalf").unwrap();
        assert_eq!(fact.id, "g1");
        assert_eq!(fact.creator.as_str(), "U1");
        assert_eq!(fact.dictionary, "websters");
        assert_eq!(fact.passcode, "gandalf");
    }

    #[test]
    fn game_created_rejects_missing_fields() {
        let cases = [
            (("", "U1", "d", "p"), FactError::MissingGameId),
            (("g", "", "d", "p"), FactError::MissingCreator),
            (("g", "U1", "", "p"), FactError::MissingDictionary),
            (("g", "U1", "d", ""), FactError::MissingPasscode),
            (("g", "@U1", "d", "p"), FactError::Identity(IdentityError::Malformed)),
            (
                ("a+b", "U1", "d", "p"),
                FactError::ReservedSeparator("a+b".to_string()),
            ),
        ];
        for ((game, creator, dict, pass), expected) in cases {
            assert_eq!(
                GameCreatedFact::new(game, creator, dict, pass).unwrap_err(),
                expected,
                "game={game:?} creator={creator:?}"
            );
        }
    }

    #[test]
    fn player_identity_is_game_plus_participant() {
        let fact = PlayerAddedFact::new("a game", "USlackdude", "a name", "me@email.org").unwrap();
        assert_eq!(fact.id, "a game+USlackdude");
        assert_eq!(fact.game_id, "a game");
        assert_eq!(fact.name, "a name");
        assert_eq!(fact.contact, "me@email.org");
    }

    #[test]
    fn player_added_rejects_bad_input() {
        assert_eq!(
            PlayerAddedFact::new("", "U1", "n", "e").unwrap_err(),
            FactError::MissingGameId
        );
        assert_eq!(
            PlayerAddedFact::new("g", "", "n", "e").unwrap_err(),
            FactError::MissingParticipant
        );
        assert_eq!(
            PlayerAddedFact::new("g", "@dude", "n", "e").unwrap_err(),
            FactError::Identity(IdentityError::Malformed)
        );
        // Name and contact are optional.
        assert!(PlayerAddedFact::new("g", "U1", "", "").is_ok());
    }

    #[test]
    fn identity_reason_is_passed_through_verbatim() {
        let err = GameCreatedFact::new("g", "nope", "d", "p").unwrap_err();
        assert_eq!(err.to_string(), IdentityError::Malformed.to_string());
    }

    #[test]
    fn fact_log_records_are_tagged() {
        let fact: Fact = GameCreatedFact::new("g1", "U1", "d", "p").unwrap().into();
        let json = serde_json::to_value(&fact).unwrap();
        assert_eq!(json["event_type"], "GameCreated");
        assert_eq!(json["id"], "g1");

        let back: Fact = serde_json::from_value(json).unwrap();
        assert_eq!(back, fact);
        assert_eq!(back.game_id(), "g1");
    }

    #[test]
    fn started_fact_identity_cannot_collide_with_games() {
        let fact = GameStartedFact::new("g1", ParticipantId::parse("U1").unwrap(), Vec::new());
        assert_eq!(fact.id, "g1+started");
        assert!(GameCreatedFact::new(&fact.id, "U1", "d", "p").is_err());
    }
}
