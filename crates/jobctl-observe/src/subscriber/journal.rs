use async_trait::async_trait;
use jobctl_core::Subscribe;
use jobctl_model::JobEvent;

use crate::subscriber::view::log_event;

/// Subscriber that writes every job event to the `tracing` log.
#[derive(Debug, Default)]
pub struct Journal;

impl Journal {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for Journal {
    async fn on_event(&self, event: &JobEvent) {
        log_event(event);
    }

    fn name(&self) -> &'static str {
        "journal"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscriber::capture::Captured;
    use jobctl_model::{EventKind, ExitResult, JobId, JobState};
    use std::time::SystemTime;

    #[tokio::test]
    async fn writes_events_to_the_log() {
        let out = Captured::default();
        let _guard = tracing::subscriber::set_default(out.subscriber());

        let journal = Journal::new();
        assert_eq!(journal.name(), "journal");
        journal
            .on_event(&JobEvent {
                job: JobId::from("job-7"),
                seq: 4,
                at: SystemTime::now(),
                kind: EventKind::Terminated {
                    state: JobState::Cancelled,
                    exit: Some(ExitResult::signaled(15, true)),
                    failure: None,
                },
            })
            .await;

        let text = out.text();
        assert!(text.contains("WARN"));
        assert!(text.contains("job cancelled"));
        assert!(text.contains("job-7"));
        assert!(text.contains("signal 15"));
    }
}
