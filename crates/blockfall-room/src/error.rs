//! Error types for the room layer.

/// Policy violations reported back to the offending sender.
///
/// These are the only conditions that produce an `error` message on the
/// wire; everything else invalid is silently ignored. The `Display`
/// strings are the exact texts clients show, so they are part of the
/// protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// No room is registered under the given code.
    #[error("room not found")]
    NotFound,

    /// The room's match has already started; the lobby is closed.
    #[error("match already in progress")]
    MatchInProgress,

    /// The room already has the maximum number of members.
    #[error("room full")]
    RoomFull,
}
