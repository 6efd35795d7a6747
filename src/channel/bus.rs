use tokio::sync::broadcast;

use crate::channel::ChannelMessage;

/// Best-effort broadcast bus between the control deck and the player hosts.
///
/// Messages travel in their wire form (`serde_json::Value`), so receivers
/// type-check every payload on the way in and silently drop what does not
/// parse, same as a window message handler would. Delivery is unordered with
/// respect to other senders and entirely unacknowledged: if nobody is
/// listening, or a listener lagged past the buffer, the message is simply
/// never observed.
#[derive(Clone)]
pub struct Channel {
    tx: broadcast::Sender<serde_json::Value>,
}

impl Channel {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Broadcast a message. No receivers is not an error.
    pub fn publish(&self, msg: &ChannelMessage) {
        match serde_json::to_value(msg) {
            Ok(value) => {
                log::debug!("publish {:?}", msg);
                let _ = self.tx.send(value);
            }
            Err(e) => log::error!("Failed to encode channel message: {}", e),
        }
    }

    /// Publish a raw wire value, bypassing the typed contract. Only tests use
    /// this to inject malformed traffic.
    #[cfg(test)]
    pub fn publish_raw(&self, value: serde_json::Value) {
        let _ = self.tx.send(value);
    }

    /// Scoped subscription for one slot. Dropping it unsubscribes; nothing
    /// global is registered anywhere.
    pub fn subscribe_slot(&self, index: usize) -> Subscription {
        Subscription {
            filter: SlotFilter::Only(index),
            rx: self.tx.subscribe(),
        }
    }

    /// Subscription receiving traffic for every slot. The control deck uses
    /// this and routes internally by index.
    pub fn subscribe_all(&self) -> Subscription {
        Subscription {
            filter: SlotFilter::Any,
            rx: self.tx.subscribe(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum SlotFilter {
    Any,
    Only(usize),
}

impl SlotFilter {
    fn accepts(&self, index: usize) -> bool {
        match self {
            SlotFilter::Any => true,
            SlotFilter::Only(own) => *own == index,
        }
    }
}

pub struct Subscription {
    filter: SlotFilter,
    rx: broadcast::Receiver<serde_json::Value>,
}

impl Subscription {
    /// Wait for the next message that survives parsing and the index filter.
    /// Returns None once the channel itself is gone.
    pub async fn recv(&mut self) -> Option<ChannelMessage> {
        loop {
            match self.rx.recv().await {
                Ok(value) => {
                    if let Some(msg) = self.accept(value) {
                        return Some(msg);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Best-effort bus: lost messages are never observed.
                    log::debug!("Subscription lagged, {} messages lost", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Drain whatever is immediately available. Used by tests and by polling
    /// call sites that cannot await.
    pub fn try_recv(&mut self) -> Option<ChannelMessage> {
        loop {
            match self.rx.try_recv() {
                Ok(value) => {
                    if let Some(msg) = self.accept(value) {
                        return Some(msg);
                    }
                }
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    log::debug!("Subscription lagged, {} messages lost", skipped);
                }
                Err(_) => return None,
            }
        }
    }

    fn accept(&self, value: serde_json::Value) -> Option<ChannelMessage> {
        let msg = match serde_json::from_value::<ChannelMessage>(value) {
            Ok(msg) => msg,
            Err(e) => {
                // Malformed traffic is ignored, not an error.
                log::debug!("Dropping malformed channel payload: {}", e);
                return None;
            }
        };
        self.filter.accepts(msg.index()).then_some(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_index_routing() {
        let channel = Channel::new(16);
        let mut slot0 = channel.subscribe_slot(0);
        let mut slot1 = channel.subscribe_slot(1);

        channel.publish(&ChannelMessage::Play { index: 1 });

        // Slot 0 discards the foreign-index message, slot 1 sees it.
        assert_eq!(slot0.try_recv(), None);
        assert_eq!(slot1.try_recv(), Some(ChannelMessage::Play { index: 1 }));
    }

    #[test]
    fn test_subscribe_all_sees_everything() {
        let channel = Channel::new(16);
        let mut all = channel.subscribe_all();

        channel.publish(&ChannelMessage::Ended { index: 4 });
        channel.publish(&ChannelMessage::TimeUpdate {
            index: 2,
            current_time: 1.0,
        });

        assert_eq!(all.try_recv(), Some(ChannelMessage::Ended { index: 4 }));
        assert!(matches!(
            all.try_recv(),
            Some(ChannelMessage::TimeUpdate { index: 2, .. })
        ));
    }

    #[test]
    fn test_malformed_payloads_dropped() {
        let channel = Channel::new(16);
        let mut sub = channel.subscribe_slot(0);

        channel.publish_raw(json!({"type": "VIDEO_SPEED", "index": 0, "speed": "fast"}));
        channel.publish_raw(json!("not even an object"));
        channel.publish(&ChannelMessage::Pause { index: 0 });

        // Only the well-formed message comes through.
        assert_eq!(sub.try_recv(), Some(ChannelMessage::Pause { index: 0 }));
        assert_eq!(sub.try_recv(), None);
    }

    #[test]
    fn test_publish_without_receivers_is_fine() {
        let channel = Channel::new(4);
        channel.publish(&ChannelMessage::Play { index: 0 });
    }

    #[tokio::test]
    async fn test_async_recv_delivers_in_order() {
        let channel = Channel::new(16);
        let mut sub = channel.subscribe_slot(7);

        channel.publish(&ChannelMessage::Play { index: 7 });
        channel.publish(&ChannelMessage::Seek { index: 7, time: 3.0 });

        assert_eq!(sub.recv().await, Some(ChannelMessage::Play { index: 7 }));
        assert_eq!(
            sub.recv().await,
            Some(ChannelMessage::Seek { index: 7, time: 3.0 })
        );
    }
}
