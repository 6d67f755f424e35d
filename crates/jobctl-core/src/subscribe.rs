use std::sync::Arc;

use async_trait::async_trait;
use jobctl_model::JobEvent;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

use crate::bus::Subscription;

/// Push-style event observer.
///
/// Each subscriber attached through the orchestrator builder runs on its own worker task and
/// receives every event in publish order. A panic inside `on_event` is logged and the worker
/// moves on to the next event.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    async fn on_event(&self, event: &JobEvent);

    fn name(&self) -> &'static str;
}

pub(crate) fn spawn_listener(
    subscriber: Arc<dyn Subscribe>,
    mut subscription: Subscription,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        trace!(target: "jobctl.core.subscribe", subscriber = subscriber.name(), "listener started");

        while let Some(event) = subscription.recv().await {
            let sub = Arc::clone(&subscriber);
            let delivery = tokio::spawn(async move { sub.on_event(&event).await });

            if let Err(e) = delivery.await
                && e.is_panic()
            {
                warn!(
                    target: "jobctl.core.subscribe",
                    subscriber = subscriber.name(),
                    "subscriber panicked while processing an event"
                );
            }
        }

        trace!(target: "jobctl.core.subscribe", subscriber = subscriber.name(), "listener stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Bus;
    use jobctl_model::{EventKind, JobId, JobState};
    use std::sync::Mutex;
    use std::time::SystemTime;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &JobEvent) {
            if event.seq == 2 {
                panic!("boom");
            }
            self.seen.lock().unwrap().push(event.seq);
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    #[tokio::test]
    async fn listener_survives_a_panicking_delivery() {
        let mut bus = Bus::new();
        let recorder = Arc::new(Recorder::default());
        let worker = spawn_listener(recorder.clone(), bus.subscribe());

        for seq in 1..=3 {
            bus.publish(JobEvent {
                job: JobId::from("j"),
                seq,
                at: SystemTime::now(),
                kind: EventKind::StateChanged {
                    state: JobState::Queued,
                },
            });
        }
        drop(bus);
        worker.await.unwrap();

        assert_eq!(*recorder.seen.lock().unwrap(), [1, 3]);
    }
}
