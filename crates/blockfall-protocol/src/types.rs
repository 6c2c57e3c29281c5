//! Core protocol types for Blockfall's wire format.
//!
//! Every message is a JSON object with a mandatory `type` discriminator.
//! Clients send [`ClientMessage`]s, the relay answers with
//! [`ServerMessage`]s. Board payloads (`grid`) are opaque to the relay:
//! they are carried as raw JSON values and never interpreted.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a connected client.
///
/// A client's identity *is* its connection: the server derives this from
/// the transport connection id, and it is never reused after a disconnect
/// (no reconnection path exists).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Room codes
// ---------------------------------------------------------------------------

/// Length of a room code, in characters.
pub const CODE_LEN: usize = 4;

/// The alphabet room codes are drawn from.
///
/// Visually ambiguous characters are excluded: no digit `0`/`1`, no
/// letters `I`/`O`.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// A four-character room code.
///
/// Codes are case-insensitive on input and always uppercase on output.
/// [`RoomCode::parse`] is the only way to construct one from untrusted
/// text; it upper-cases the input and rejects anything outside
/// [`CODE_ALPHABET`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoomCode([u8; CODE_LEN]);

impl RoomCode {
    /// Parses a code from client input, case-insensitively.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidCode`] if the input is not exactly
    /// four characters from the code alphabet.
    pub fn parse(input: &str) -> Result<Self, ProtocolError> {
        let upper = input.to_ascii_uppercase();
        let bytes = upper.as_bytes();
        if bytes.len() != CODE_LEN {
            return Err(ProtocolError::InvalidCode(input.to_string()));
        }
        let mut raw = [0u8; CODE_LEN];
        for (slot, &b) in raw.iter_mut().zip(bytes) {
            if !CODE_ALPHABET.contains(&b) {
                return Err(ProtocolError::InvalidCode(input.to_string()));
            }
            *slot = b;
        }
        Ok(Self(raw))
    }

    /// Returns the code as an uppercase string slice.
    pub fn as_str(&self) -> &str {
        // Invariant: the bytes come from CODE_ALPHABET, which is ASCII.
        std::str::from_utf8(&self.0).expect("code alphabet is ASCII")
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RoomCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RoomCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        RoomCode::parse(&s).map_err(D::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Roster entries
// ---------------------------------------------------------------------------

/// One entry in a room's player list, in join order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    /// The player's display name.
    pub name: String,
}

/// One entry in a final scoreboard, in membership order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// The player's display name.
    pub name: String,
    /// The player's last reported score.
    pub score: u64,
}

// ---------------------------------------------------------------------------
// ClientMessage — what clients send
// ---------------------------------------------------------------------------

/// Messages that clients send to the relay.
///
/// `#[serde(tag = "type", rename_all = "snake_case")]` produces the
/// internally tagged wire format, e.g.
/// `{"type":"join_room","code":"AB23","name":"Ana"}`. A payload with an
/// unknown `type` tag fails to deserialize; the handler drops it silently.
///
/// `join_room.code` is a plain string, not a [`RoomCode`]: a malformed
/// code must surface as a "room not found" error, not as a dropped
/// message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Create a new room with the sender as host.
    CreateRoom {
        /// Display name; absent or empty falls back to a default.
        #[serde(default)]
        name: Option<String>,
    },

    /// Join an existing lobby by code.
    JoinRoom {
        /// The room code, case-insensitive.
        code: String,
        #[serde(default)]
        name: Option<String>,
    },

    /// Start the match. Only honored when the sender is the host.
    StartGame,

    /// Report the sender's latest board state.
    ///
    /// `grid` and `lines` are relayed verbatim to opponents; the relay
    /// never inspects them.
    Move {
        #[serde(default)]
        score: u64,
        #[serde(default)]
        grid: Option<Value>,
        #[serde(default)]
        lines: Option<u32>,
    },

    /// Report that the sender's board has topped out.
    PlayerLost,

    /// Leave the current room.
    Leave,
}

// ---------------------------------------------------------------------------
// ServerMessage — what the relay sends back
// ---------------------------------------------------------------------------

/// Messages that the relay sends to clients.
///
/// Optional fields (`grid`, `lines`) are omitted from the JSON when
/// absent, matching what clients expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// To the creator: the new room's code and roster.
    RoomCreated {
        code: RoomCode,
        players: Vec<PlayerInfo>,
    },

    /// To the joiner: confirmation with the current roster.
    RoomJoined {
        code: RoomCode,
        players: Vec<PlayerInfo>,
    },

    /// To existing members: someone joined the lobby.
    PlayerJoined {
        name: String,
        players: Vec<PlayerInfo>,
    },

    /// To the sender only: a policy violation (room not found / full /
    /// already started). Never mutates state.
    Error { message: String },

    /// To all members: the match has started.
    ///
    /// `seed` lets every client deterministically generate the same
    /// piece sequence; the relay does not validate determinism.
    GameStart { seed: u32 },

    /// To all *other* members: an opponent's latest board state.
    OpponentUpdate {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        grid: Option<Value>,
        score: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lines: Option<u32>,
    },

    /// To all other members: an opponent topped out.
    OpponentLost { name: String },

    /// To remaining members: someone left, with the refreshed roster.
    PlayerLeft {
        name: String,
        players: Vec<PlayerInfo>,
    },

    /// To all members: the match is over.
    GameOver {
        winner: String,
        scores: Vec<ScoreEntry>,
    },
}

// =========================================================================
// Tests
// =========================================================================
