use net::Packet;

use crate::{SessionId, SessionManager, SessionState, SharedSessions};

impl SessionManager {
    /// Deliver to every Playing session except `from`. Returns the number
    /// of sessions the packet was queued for.
    pub fn broadcast_playing(&self, from: SessionId, packet: &Packet) -> usize {
        let mut delivered = 0;
        for session in self.playing_sessions() {
            if session.session_id == from {
                continue;
            }
            if session.send(packet.clone()) {
                delivered += 1;
            } else {
                tracing::debug!(
                    session_id = ?session.session_id,
                    "Broadcast: session write channel closed"
                );
            }
        }
        delivered
    }

    /// Deliver to the listed sessions that are Playing, except `from`.
    /// A failed recipient is skipped.
    pub fn broadcast_to<I>(&self, recipients: I, from: SessionId, packet: &Packet) -> usize
    where
        I: IntoIterator<Item = SessionId>,
    {
        let mut delivered = 0;
        for id in recipients {
            if id == from {
                continue;
            }
            let Some(session) = self.get(id) else {
                continue;
            };
            if session.state != SessionState::Playing {
                continue;
            }
            if session.send(packet.clone()) {
                delivered += 1;
            } else {
                tracing::debug!(session_id = ?id, "Broadcast: session write channel closed");
            }
        }
        delivered
    }
}

/// Cloneable handle for broadcasting through the shared registry.
///
/// Each call holds the registry read lock for the whole enumeration, so a
/// concurrent register/deregister is seen either entirely or not at all.
#[derive(Clone)]
pub struct BroadcastRouter {
    sessions: SharedSessions,
}

impl BroadcastRouter {
    pub fn new(sessions: SharedSessions) -> Self {
        Self { sessions }
    }

    pub fn sessions(&self) -> &SharedSessions {
        &self.sessions
    }

    pub async fn broadcast_playing(&self, from: SessionId, packet: Packet) -> usize {
        self.sessions.read().await.broadcast_playing(from, &packet)
    }

    /// Deliver to the sessions whose characters occupy a room. The caller
    /// passes the room's occupant session ids while it still holds the
    /// world lock that guards the room.
    pub async fn broadcast_room<I>(&self, occupants: I, from: SessionId, packet: Packet) -> usize
    where
        I: IntoIterator<Item = SessionId>,
    {
        self.sessions
            .read()
            .await
            .broadcast_to(occupants, from, &packet)
    }
}
