use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static PARTICIPANT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[UW][A-Za-z0-9]+$").expect("participant id pattern"));

/// Reason a participant identity was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("a participant ID is required")]
    Empty,
    #[error("a valid participant ID must start with either a 'U' or 'W' and consist of only alphanumerics")]
    Malformed,
}

/// Checks that `id` looks like a chat-workspace member handle.
pub fn validate(id: &str) -> Result<(), IdentityError> {
    if id.is_empty() {
        return Err(IdentityError::Empty);
    }
    if !PARTICIPANT_ID.is_match(id) {
        return Err(IdentityError::Malformed);
    }
    Ok(())
}

/// A validated participant identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn parse(id: impl Into<String>) -> Result<Self, IdentityError> {
        let id = id.into();
        validate(&id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for ParticipantId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}
