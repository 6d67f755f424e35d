//! Event fan-out.
//!
//! The bus is owned by the orchestrator's coordination context, which is the only publisher.
//! Each subscriber gets its own unbounded queue, so a slow subscriber never loses events and
//! never slows down the publisher or other subscribers. Events reach every subscriber in
//! publish order; no history is replayed to late subscribers.
//!
//! ```text
//! actor ─► Bus::publish ─┬─► Subscription (UI)
//!                        ├─► Subscription (Journal listener)
//!                        └─► Subscription (OutputFollow)
//! ```

use jobctl_model::JobEvent;
use tokio::sync::mpsc;

#[derive(Default)]
pub struct Bus {
    next_id: u64,
    subscribers: Vec<(u64, mpsc::UnboundedSender<JobEvent>)>,
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.next_id += 1;
        self.subscribers.push((self.next_id, tx));
        Subscription {
            id: self.next_id,
            rx,
        }
    }

    /// Deliver `event` to every live subscriber; dropped subscriptions are pruned here.
    pub fn publish(&mut self, event: JobEvent) {
        self.subscribers
            .retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Live event stream. Dropping it detaches from the bus.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<JobEvent>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Next event; `None` once the orchestrator has stopped.
    pub async fn recv(&mut self) -> Option<JobEvent> {
        self.rx.recv().await
    }

    /// Next already-delivered event, without waiting.
    pub fn try_recv(&mut self) -> Option<JobEvent> {
        self.rx.try_recv().ok()
    }
}
