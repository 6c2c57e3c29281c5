//! Per-connection session context.

use blockfall_protocol::RoomCode;

/// The explicit per-connection state machine.
///
/// ```text
/// Unjoined ──(create/join)──→ InLobby ──(start_game)──→ InMatch
///     ↑                          │  ↑──────(game_over)─────┘
///     └──────(leave/disconnect)──┴───────────────────────────
/// ```
///
/// Messages that are not valid from the current phase are silently
/// ignored rather than guessed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Not in any room.
    Unjoined,
    /// Member of a lobby (room exists, match not started).
    InLobby(RoomCode),
    /// Member of a room whose match is in progress.
    InMatch(RoomCode),
}

impl SessionPhase {
    /// The room this connection currently belongs to, if any.
    pub fn room(&self) -> Option<RoomCode> {
        match *self {
            Self::Unjoined => None,
            Self::InLobby(code) | Self::InMatch(code) => Some(code),
        }
    }
}

/// Mutable context for one live transport connection.
///
/// The room's [`Player`](crate::Player) entry is authoritative for name
/// and score; the session only bridges the connection to its membership.
#[derive(Debug, Clone)]
pub struct ConnectionSession {
    /// Where this connection is in the room lifecycle.
    pub phase: SessionPhase,
    /// Last display name supplied. Informational only.
    pub name: String,
}

impl ConnectionSession {
    /// A fresh session for a newly accepted connection.
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Unjoined,
            name: String::new(),
        }
    }
}

impl Default for ConnectionSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockfall_protocol::RoomCode;

    #[test]
    fn test_phase_room_lookup() {
        let code = RoomCode::parse("AB23").unwrap();
        assert_eq!(SessionPhase::Unjoined.room(), None);
        assert_eq!(SessionPhase::InLobby(code).room(), Some(code));
        assert_eq!(SessionPhase::InMatch(code).room(), Some(code));
    }
}
