//! Single-room chat: broadcast fan-out over a persisted append-only log.
//!
//! A message is durable once its row is stored; broadcast delivery is
//! fire-and-forget and independent of who is connected.

use tokio::sync::broadcast;

use crate::services::dto::MessageDto;

const ROOM_CAPACITY: usize = 256;

/// The common room's broadcast channel. Lagging subscribers drop old
/// messages rather than back-pressuring the sender.
pub struct ChatRoom {
    tx: broadcast::Sender<MessageDto>,
}

impl ChatRoom {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(ROOM_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MessageDto> {
        self.tx.subscribe()
    }

    /// Fan a stored message out to current subscribers. Nobody listening
    /// is fine; the message is already durable.
    pub fn publish(&self, message: MessageDto) {
        let _ = self.tx.send(message);
    }
}

impl Default for ChatRoom {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn message(text: &str) -> MessageDto {
        MessageDto {
            message_id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            sender_name: "sender".into(),
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_every_subscriber() {
        let room = ChatRoom::new();
        let mut a = room.subscribe();
        let mut b = room.subscribe();

        room.publish(message("hello"));

        assert_eq!(a.recv().await.unwrap().text, "hello");
        assert_eq!(b.recv().await.unwrap().text, "hello");
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_fine() {
        let room = ChatRoom::new();
        room.publish(message("into the void"));

        // A later subscriber only sees what is sent after subscribing.
        let mut rx = room.subscribe();
        room.publish(message("second"));
        assert_eq!(rx.recv().await.unwrap().text, "second");
    }
}
