//! Room lifecycle management for Blockfall.
//!
//! This crate is the coordination core of the relay: it owns every room,
//! tracks which connection is in which room, and turns each inbound
//! client event into a plan of outbound deliveries. It is purely
//! synchronous — the async server layer feeds it one event at a time,
//! which preserves the original's run-to-completion atomicity.
//!
//! # Key types
//!
//! - [`LifecycleController`] — the protocol state machine; one instance
//!   serves the whole process
//! - [`RoomRegistry`] — owned table of rooms, keyed by [`RoomCode`]
//! - [`Room`] / [`Player`] — membership and per-player match state
//! - [`SessionPhase`] — explicit per-connection state
//!   (`Unjoined → InLobby → InMatch`)
//! - [`Delivery`] — one resolved outbound message, produced by fan-out
//! - [`adjudicate`] — the game-over arbitrator
//!
//! [`RoomCode`]: blockfall_protocol::RoomCode

mod arbiter;
mod code;
mod controller;
mod error;
mod registry;
mod relay;
mod room;
mod session;

pub use arbiter::{adjudicate, Verdict};
pub use code::generate_code;
pub use controller::LifecycleController;
pub use error::RoomError;
pub use registry::RoomRegistry;
pub use relay::Delivery;
pub use room::{Player, Room, DEFAULT_NAME, MAX_PLAYERS};
pub use session::{ConnectionSession, SessionPhase};
