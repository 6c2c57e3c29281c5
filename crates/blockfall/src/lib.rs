//! # Blockfall
//!
//! Real-time relay server for a shared falling-block puzzle game: one
//! browser client hosts a room, others join by a short code, and during
//! a match every client's board state is fanned out to its opponents.
//!
//! This crate ties the layers together: transport → protocol → room
//! core. All game coordination lives in `blockfall-room`; this crate
//! only moves bytes and serializes events.

mod error;
mod handler;
mod relay;
mod server;

pub use error::BlockfallError;
pub use server::{BlockfallServer, BlockfallServerBuilder};
