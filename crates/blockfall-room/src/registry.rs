//! Room registry: the owned table of all live rooms.

use std::collections::HashMap;

use blockfall_protocol::{ClientId, RoomCode};
use rand::Rng;

use crate::code::generate_code;
use crate::Room;

/// Owns the mapping from room code to [`Room`].
///
/// This is plain mutable state with no interior locking: the controller
/// owns one instance and the server layer serializes access around it.
/// An empty room must never remain registered — [`remove`](Self::remove)
/// is called the instant the last member leaves.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, Room>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
        }
    }

    /// Creates a room with a freshly drawn code and the given connection
    /// as sole member and host.
    ///
    /// Codes are regenerated until unused, so a collision can never
    /// overwrite a live room. With a 32^4 code space the loop settles on
    /// the first draw in practice.
    pub fn create<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        host: ClientId,
        host_name: String,
    ) -> &Room {
        let code = loop {
            let candidate = generate_code(rng);
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        self.rooms.insert(code, Room::new(code, host, host_name));
        // Invariant: just inserted under this code.
        self.rooms.get(&code).expect("just inserted")
    }

    /// Looks up a room by code.
    pub fn get(&self, code: RoomCode) -> Option<&Room> {
        self.rooms.get(&code)
    }

    /// Mutable room lookup.
    pub fn get_mut(&mut self, code: RoomCode) -> Option<&mut Room> {
        self.rooms.get_mut(&code)
    }

    /// Removes a room. Idempotent: removing an unknown code is a no-op.
    pub fn remove(&mut self, code: RoomCode) {
        self.rooms.remove(&code);
    }

    /// Number of live rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Returns `true` if no rooms are registered.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
