use tokio::sync::mpsc;

use crate::protocol::Packet;

/// One packet queued for a session's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub packet: Packet,
    /// When true, the writer shuts the connection down after delivering
    /// this packet. Later packets are dropped.
    pub close: bool,
}

impl Outbound {
    pub fn new(packet: Packet) -> Self {
        Self {
            packet,
            close: false,
        }
    }

    /// Create a final packet that will close the connection after delivery.
    pub fn with_close(packet: Packet) -> Self {
        Self {
            packet,
            close: true,
        }
    }
}

impl From<Packet> for Outbound {
    fn from(packet: Packet) -> Self {
        Self::new(packet)
    }
}

/// Per-session write channel (workers and broadcasts -> writer task).
pub type OutboundTx = mpsc::UnboundedSender<Outbound>;
pub type OutboundRx = mpsc::UnboundedReceiver<Outbound>;

pub fn outbound_channel() -> (OutboundTx, OutboundRx) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn outbound_roundtrip() {
        let (tx, mut rx) = outbound_channel();

        tx.send(Packet::text("Hello!").into()).unwrap();
        tx.send(Outbound::with_close(Packet::disconnect("Goodbye!")))
            .unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.packet.message, "Hello!");
        assert!(!first.close);

        let last = rx.recv().await.unwrap();
        assert!(last.close);
        assert!(last.packet.is_disconnect());
    }

    #[tokio::test]
    async fn send_after_receiver_dropped_fails() {
        let (tx, rx) = outbound_channel();
        drop(rx);
        assert!(tx.send(Packet::text("lost").into()).is_err());
    }
}
