//! Unified error type for the Blockfall server.

use blockfall_protocol::ProtocolError;
use blockfall_transport::TransportError;

/// Top-level error that wraps the layer-specific errors.
///
/// Room-layer policy violations never surface here: they travel to the
/// offending client as `error` messages and are not Rust errors.
#[derive(Debug, thiserror::Error)]
pub enum BlockfallError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let top: BlockfallError = err.into();
        assert!(matches!(top, BlockfallError::Transport(_)));
        assert!(top.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidCode("??".into());
        let top: BlockfallError = err.into();
        assert!(matches!(top, BlockfallError::Protocol(_)));
    }
}
