//! ID utilities (ULIDs, player ids).

use serde::{Deserialize, Serialize};
use ulid::Ulid;
use uuid::Uuid;

/// Generate a short session ID from the random part of a ULID.
pub fn new_session_id() -> String {
    ulid_tail(10)
}

/// Puzzle run ID, the whole 80-bit random part of a ULID.
pub fn new_run_id() -> String {
    ulid_tail(16)
}

// The first 10 chars of a ULID are the millisecond timestamp; the tail is random.
fn ulid_tail(len: usize) -> String {
    let ulid = Ulid::new().to_string();
    ulid[ulid.len() - len..].to_ascii_lowercase()
}

/// Identity of a player. Issued by the auth collaborator, opaque here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(Uuid);

impl PlayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PlayerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_short_and_distinct() {
        let a = new_session_id();
        let b = new_session_id();
        assert_eq!(a.len(), 10);
        assert_eq!(new_run_id().len(), 16);
        assert_ne!(a, b);
    }

    #[test]
    fn test_player_id_roundtrip() {
        let id = PlayerId::new();
        let parsed: PlayerId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert_eq!(serde_json::to_string(&id).unwrap(), format!("\"{id}\""));
    }
}
