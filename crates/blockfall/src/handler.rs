//! Per-connection handler: bridges one WebSocket to the room core.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler. The flow is:
//!   1. Derive the [`ClientId`] from the connection id
//!   2. Register an outbound channel and spawn a writer task
//!   3. Loop: decode inbound messages → controller → execute deliveries
//!   4. On close/error: run the disconnect procedure and unregister
//!
//! Locking the controller for the duration of one event is what makes
//! each event's mutations atomic with respect to every other connection.

use std::sync::Arc;

use blockfall_protocol::{ClientId, ClientMessage, Codec};
use blockfall_transport::{Connection, WebSocketConnection};

use crate::server::ServerState;
use crate::BlockfallError;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), BlockfallError> {
    let client = ClientId(conn.id().into_inner());
    let conn = Arc::new(conn);
    tracing::debug!(%client, "handling new connection");

    let mut outbound = state.relay.lock().await.register(client);
    state.controller.lock().await.connect(client);

    // Writer task: drains the outbound channel onto the socket. Ends
    // when the channel closes (unregister) or the socket breaks.
    let writer_conn = Arc::clone(&conn);
    let codec = state.codec;
    tokio::spawn(async move {
        while let Some(msg) = outbound.recv().await {
            let bytes = match codec.encode(&msg) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::debug!(error = %e, "failed to encode outbound message");
                    continue;
                }
            };
            if writer_conn.send(&bytes).await.is_err() {
                // Fire-and-forget: a broken socket just stops receiving.
                break;
            }
        }
    });

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%client, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%client, error = %e, "recv error");
                break;
            }
        };

        // Malformed input is ignored with no response.
        let msg: ClientMessage = match state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(%client, error = %e, "dropping malformed message");
                continue;
            }
        };

        dispatch(&state, client, msg).await;
    }

    // Transport close/error drives the same leave procedure as an
    // explicit `leave` message, then the session is forgotten.
    finalize_disconnect(&state, client).await;

    Ok(())
}

/// Handles one event and executes its delivery plan as a single critical
/// section.
///
/// The controller guard is held until every delivery has been queued:
/// receivers observe broadcasts in exactly the order the controller
/// handled the events that caused them. Releasing the guard between
/// planning and queuing would let two concurrently handled events queue
/// their plans in the opposite order.
pub(crate) async fn dispatch(
    state: &ServerState,
    client: ClientId,
    msg: ClientMessage,
) {
    let mut controller = state.controller.lock().await;
    let deliveries = controller.handle_message(client, msg);
    state.relay.lock().await.deliver(deliveries);
}

/// Disconnect counterpart of [`dispatch`]: same critical section, plus
/// unregistering the leaver's outbound channel.
pub(crate) async fn finalize_disconnect(state: &ServerState, client: ClientId) {
    let mut controller = state.controller.lock().await;
    let deliveries = controller.handle_disconnect(client);
    let mut relay = state.relay.lock().await;
    relay.unregister(client);
    relay.deliver(deliveries);
}
