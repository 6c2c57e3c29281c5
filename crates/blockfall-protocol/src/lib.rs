//! Wire protocol for Blockfall.
//!
//! This crate defines the "language" that clients and the relay speak:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`RoomCode`],
//!   [`ClientId`]) — the message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! The protocol layer sits between transport (raw bytes) and the room
//! core (membership and lifecycle). It doesn't know about connections
//! or rooms — it only knows how to serialize and deserialize messages.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientId, ClientMessage, PlayerInfo, RoomCode, ScoreEntry,
    ServerMessage, CODE_ALPHABET, CODE_LEN,
};
