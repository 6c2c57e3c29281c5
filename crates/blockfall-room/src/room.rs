//! Room and player data model.

use blockfall_protocol::{ClientId, PlayerInfo, RoomCode, ScoreEntry};
use serde_json::Value;

/// Maximum members per room.
pub const MAX_PLAYERS: usize = 4;

/// Fallback display name when a client supplies none.
pub const DEFAULT_NAME: &str = "Player";

/// One member of a room. Exists only inside a room's player list.
#[derive(Debug, Clone)]
pub struct Player {
    /// The owning connection. One player per connection per room.
    pub client: ClientId,
    /// Display name. Not required to be unique within a room.
    pub name: String,
    /// Latest reported score. Reset to 0 when a match starts.
    pub score: u64,
    /// Whether this player reported a top-out this match.
    pub lost: bool,
    /// Last opaque board payload, relayed but never interpreted.
    pub grid: Option<Value>,
}

impl Player {
    fn new(client: ClientId, name: String) -> Self {
        Self {
            client,
            name,
            score: 0,
            lost: false,
            grid: None,
        }
    }
}

/// A named, bounded group of connections sharing one match.
///
/// `players` is kept in join order; that order determines the
/// host-migration successor and the scoreboard order.
#[derive(Debug, Clone)]
pub struct Room {
    code: RoomCode,
    host: ClientId,
    players: Vec<Player>,
    /// `false` = lobby (joinable), `true` = match in progress.
    pub started: bool,
}

impl Room {
    /// Creates a room with the given connection as sole member and host.
    pub(crate) fn new(code: RoomCode, host: ClientId, host_name: String) -> Self {
        Self {
            code,
            host,
            players: vec![Player::new(host, host_name)],
            started: false,
        }
    }

    /// The room's code.
    pub fn code(&self) -> RoomCode {
        self.code
    }

    /// Returns `true` if the given connection is the current host.
    pub fn is_host(&self, client: ClientId) -> bool {
        self.host == client
    }

    /// All members, in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Looks up a member by its connection.
    pub fn player(&self, client: ClientId) -> Option<&Player> {
        self.players.iter().find(|p| p.client == client)
    }

    /// Mutable member lookup.
    pub fn player_mut(&mut self, client: ClientId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.client == client)
    }

    /// Returns `true` if no members remain.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Returns `true` if the room is at [`MAX_PLAYERS`].
    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    /// Appends a new member. The caller checks `started` and capacity.
    pub(crate) fn add_player(&mut self, client: ClientId, name: String) {
        self.players.push(Player::new(client, name));
    }

    /// Removes a member, migrating the host role if the removed member
    /// held it. The new host is the earliest-joined remaining member —
    /// a fixed rule, not an election.
    ///
    /// Returns the removed player, or `None` if the connection was not
    /// a member.
    pub(crate) fn remove_player(&mut self, client: ClientId) -> Option<Player> {
        let idx = self.players.iter().position(|p| p.client == client)?;
        let removed = self.players.remove(idx);
        if self.host == client {
            if let Some(first) = self.players.first() {
                self.host = first.client;
            }
        }
        Some(removed)
    }

    /// Transitions the room into a running match: every member's score
    /// and loss flag are reset and stale grids are cleared.
    pub(crate) fn begin_match(&mut self) {
        self.started = true;
        for p in &mut self.players {
            p.score = 0;
            p.lost = false;
            p.grid = None;
        }
    }

    /// Returns the room to a joinable lobby after a match ends.
    pub(crate) fn end_match(&mut self) {
        self.started = false;
    }

    /// The current player list, in join order.
    pub fn roster(&self) -> Vec<PlayerInfo> {
        self.players
            .iter()
            .map(|p| PlayerInfo { name: p.name.clone() })
            .collect()
    }

    /// Name/score pairs for every member, in membership order.
    pub fn scoreboard(&self) -> Vec<ScoreEntry> {
        self.players
            .iter()
            .map(|p| ScoreEntry {
                name: p.name.clone(),
                score: p.score,
            })
            .collect()
    }
}
