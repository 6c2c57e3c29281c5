//! Broadcast fan-out planning.
//!
//! The controller never touches a socket. Each handled event yields a
//! list of [`Delivery`] values — one per recipient — which the server
//! layer executes fire-and-forget. Recipients are resolved against the
//! room's membership *at mutation time*, so a broadcast emitted after a
//! removal reaches exactly the remaining members.

use blockfall_protocol::{ClientId, ServerMessage};

use crate::Room;

/// One resolved outbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    /// The receiving connection.
    pub to: ClientId,
    /// The message to send.
    pub msg: ServerMessage,
}

/// Queues a message for a single connection.
pub(crate) fn to_one(client: ClientId, msg: ServerMessage, out: &mut Vec<Delivery>) {
    out.push(Delivery { to: client, msg });
}

/// Full broadcast: queues the message for every current member.
pub(crate) fn to_all(room: &Room, msg: ServerMessage, out: &mut Vec<Delivery>) {
    for p in room.players() {
        out.push(Delivery {
            to: p.client,
            msg: msg.clone(),
        });
    }
}

/// Exclusive broadcast: queues the message for every member except one.
pub(crate) fn to_others(
    room: &Room,
    msg: ServerMessage,
    exclude: ClientId,
    out: &mut Vec<Delivery>,
) {
    for p in room.players() {
        if p.client != exclude {
            out.push(Delivery {
                to: p.client,
                msg: msg.clone(),
            });
        }
    }
}
