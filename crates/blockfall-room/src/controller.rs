//! The protocol state machine: one inbound event in, a delivery plan out.
//!
//! The controller owns the registry, the per-connection sessions, and
//! the RNG used for codes and seeds. The server layer feeds it one
//! event at a time and executes the returned deliveries, so every
//! mutation here is atomic with respect to other connections' events.

use std::collections::HashMap;

use blockfall_protocol::{ClientId, ClientMessage, RoomCode, ServerMessage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;

use crate::session::{ConnectionSession, SessionPhase};
use crate::{adjudicate, relay, Delivery, RoomError, RoomRegistry, DEFAULT_NAME};

/// The room lifecycle controller.
///
/// Tracks an explicit [`SessionPhase`] per connection and rejects
/// transitions that are not valid from the current phase. Policy
/// violations on `join_room` produce an `error` delivery to the sender;
/// everything else invalid is silently ignored.
pub struct LifecycleController {
    registry: RoomRegistry,
    sessions: HashMap<ClientId, ConnectionSession>,
    rng: StdRng,
}

impl LifecycleController {
    /// Creates a controller seeded from the OS.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Creates a controller with an explicit RNG, for deterministic tests.
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            registry: RoomRegistry::new(),
            sessions: HashMap::new(),
            rng,
        }
    }

    /// Registers a newly accepted connection in the `Unjoined` phase.
    pub fn connect(&mut self, client: ClientId) {
        self.sessions.insert(client, ConnectionSession::new());
        tracing::debug!(%client, "connection registered");
    }

    /// Handles one inbound message, returning the deliveries it caused.
    pub fn handle_message(
        &mut self,
        client: ClientId,
        msg: ClientMessage,
    ) -> Vec<Delivery> {
        let mut out = Vec::new();
        match msg {
            ClientMessage::CreateRoom { name } => {
                self.create_room(client, name, &mut out);
            }
            ClientMessage::JoinRoom { code, name } => {
                self.join_room(client, &code, name, &mut out);
            }
            ClientMessage::StartGame => self.start_game(client, &mut out),
            ClientMessage::Move { score, grid, lines } => {
                self.relay_move(client, score, grid, lines, &mut out);
            }
            ClientMessage::PlayerLost => self.player_lost(client, &mut out),
            ClientMessage::Leave => self.depart(client, &mut out),
        }
        out
    }

    /// Handles a transport close/error: runs the leave procedure and
    /// forgets the session. Safe to call for unknown connections.
    pub fn handle_disconnect(&mut self, client: ClientId) -> Vec<Delivery> {
        let mut out = Vec::new();
        self.depart(client, &mut out);
        self.sessions.remove(&client);
        out
    }

    /// Read access to the registry, for the server's introspection and
    /// for tests.
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    // -----------------------------------------------------------------
    // Message handlers
    // -----------------------------------------------------------------

    fn create_room(
        &mut self,
        client: ClientId,
        name: Option<String>,
        out: &mut Vec<Delivery>,
    ) {
        let Some(session) = self.sessions.get_mut(&client) else {
            return;
        };
        if session.phase != SessionPhase::Unjoined {
            return; // already in a room
        }

        let name = display_name(name);
        session.name = name.clone();

        let room = self.registry.create(&mut self.rng, client, name);
        let code = room.code();
        let players = room.roster();
        session.phase = SessionPhase::InLobby(code);

        tracing::info!(%code, name = %session.name, "room created");
        relay::to_one(client, ServerMessage::RoomCreated { code, players }, out);
    }

    fn join_room(
        &mut self,
        client: ClientId,
        code: &str,
        name: Option<String>,
        out: &mut Vec<Delivery>,
    ) {
        let Some(session) = self.sessions.get_mut(&client) else {
            return;
        };
        if session.phase != SessionPhase::Unjoined {
            return;
        }

        // A malformed code can't name any room.
        let Ok(code) = RoomCode::parse(code) else {
            reject(client, RoomError::NotFound, out);
            return;
        };
        let Some(room) = self.registry.get_mut(code) else {
            reject(client, RoomError::NotFound, out);
            return;
        };
        if room.started {
            reject(client, RoomError::MatchInProgress, out);
            return;
        }
        if room.is_full() {
            reject(client, RoomError::RoomFull, out);
            return;
        }

        let name = display_name(name);
        session.name = name.clone();
        session.phase = SessionPhase::InLobby(code);
        room.add_player(client, name.clone());

        let players = room.roster();
        tracing::info!(%code, %name, "player joined");

        relay::to_one(
            client,
            ServerMessage::RoomJoined {
                code,
                players: players.clone(),
            },
            out,
        );
        relay::to_others(room, ServerMessage::PlayerJoined { name, players }, client, out);
    }

    fn start_game(&mut self, client: ClientId, out: &mut Vec<Delivery>) {
        let Some(session) = self.sessions.get(&client) else {
            return;
        };
        let SessionPhase::InLobby(code) = session.phase else {
            return;
        };
        let Some(room) = self.registry.get_mut(code) else {
            return;
        };
        if !room.is_host(client) {
            return;
        }

        room.begin_match();
        let seed: u32 = self.rng.random_range(0..1_000_000);
        relay::to_all(room, ServerMessage::GameStart { seed }, out);
        let members: Vec<ClientId> = room.players().iter().map(|p| p.client).collect();

        tracing::info!(%code, players = members.len(), "match started");

        for member in members {
            if let Some(s) = self.sessions.get_mut(&member) {
                s.phase = SessionPhase::InMatch(code);
            }
        }
    }

    fn relay_move(
        &mut self,
        client: ClientId,
        score: u64,
        grid: Option<Value>,
        lines: Option<u32>,
        out: &mut Vec<Delivery>,
    ) {
        let Some(session) = self.sessions.get(&client) else {
            return;
        };
        // Board relay is a match-only operation: lobby moves are dropped.
        let SessionPhase::InMatch(code) = session.phase else {
            return;
        };
        let Some(room) = self.registry.get_mut(code) else {
            return;
        };
        if !room.started {
            return;
        }
        let Some(player) = room.player_mut(client) else {
            return;
        };

        player.score = score;
        player.grid = grid.clone();
        let name = player.name.clone();

        relay::to_others(
            room,
            ServerMessage::OpponentUpdate {
                name,
                grid,
                score,
                lines,
            },
            client,
            out,
        );
    }

    fn player_lost(&mut self, client: ClientId, out: &mut Vec<Delivery>) {
        let Some(session) = self.sessions.get(&client) else {
            return;
        };
        let Some(code) = session.phase.room() else {
            return;
        };
        let Some(room) = self.registry.get_mut(code) else {
            return;
        };
        let Some(player) = room.player_mut(client) else {
            return;
        };

        player.lost = true;
        let name = player.name.clone();
        tracing::info!(%code, %name, "player lost");

        relay::to_others(room, ServerMessage::OpponentLost { name }, client, out);
        self.finish_if_decided(code, out);
    }

    // -----------------------------------------------------------------
    // Leave / disconnect procedure
    // -----------------------------------------------------------------

    /// Removes the client from its current room, migrating the host and
    /// tearing the room down when it empties. No-op for clients without
    /// a current room, so a duplicate `leave` is harmless.
    fn depart(&mut self, client: ClientId, out: &mut Vec<Delivery>) {
        let Some(session) = self.sessions.get_mut(&client) else {
            return;
        };
        let Some(code) = session.phase.room() else {
            return;
        };
        session.phase = SessionPhase::Unjoined;

        let Some(room) = self.registry.get_mut(code) else {
            return;
        };
        let Some(removed) = room.remove_player(client) else {
            return;
        };
        tracing::info!(%code, name = %removed.name, "player left");

        if room.is_empty() {
            self.registry.remove(code);
            tracing::info!(%code, "room deleted");
            return;
        }

        let was_started = room.started;
        let players = room.roster();
        relay::to_all(
            room,
            ServerMessage::PlayerLeft {
                name: removed.name,
                players,
            },
            out,
        );

        // A leaver counts as eliminated by absence: their `lost` flag is
        // never set, removal from the membership is what excludes them.
        if was_started {
            self.finish_if_decided(code, out);
        }
    }

    // -----------------------------------------------------------------
    // Arbitration
    // -----------------------------------------------------------------

    fn finish_if_decided(&mut self, code: RoomCode, out: &mut Vec<Delivery>) {
        let Some(room) = self.registry.get_mut(code) else {
            return;
        };
        let Some(verdict) = adjudicate(room) else {
            return;
        };

        tracing::info!(%code, winner = %verdict.winner, "match over");
        relay::to_all(
            room,
            ServerMessage::GameOver {
                winner: verdict.winner,
                scores: verdict.scores,
            },
            out,
        );
        room.end_match();

        // The room is a joinable lobby again for whoever remains.
        let members: Vec<ClientId> = room.players().iter().map(|p| p.client).collect();
        for member in members {
            if let Some(s) = self.sessions.get_mut(&member) {
                s.phase = SessionPhase::InLobby(code);
            }
        }
    }
}

impl Default for LifecycleController {
    fn default() -> Self {
        Self::new()
    }
}

/// Sends a policy-violation error to the offending sender only.
fn reject(client: ClientId, err: RoomError, out: &mut Vec<Delivery>) {
    relay::to_one(
        client,
        ServerMessage::Error {
            message: err.to_string(),
        },
        out,
    );
}

/// Falls back to [`DEFAULT_NAME`] for absent or blank names.
fn display_name(name: Option<String>) -> String {
    match name {
        Some(n) if !n.trim().is_empty() => n,
        _ => DEFAULT_NAME.to_string(),
    }
}
