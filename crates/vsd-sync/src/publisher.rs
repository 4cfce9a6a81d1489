//! Status publication fan-out

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;
use vsd_core::VehicleStatus;

/// One published snapshot of the status cache.
///
/// Always carries all three flags, whatever their last known-good
/// values are, even when the producing cycle only updated a subset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusPublication {
    pub lock_engaged: bool,
    pub voice_prompt_enabled: bool,
    pub active_schedule_exists: bool,
    pub stamp: DateTime<Utc>,
}

impl StatusPublication {
    /// Stamp the given cache contents with the current UTC time.
    pub fn now(status: VehicleStatus) -> Self {
        Self {
            lock_engaged: status.lock_engaged,
            voice_prompt_enabled: status.voice_prompt_enabled,
            active_schedule_exists: status.active_schedule_exists,
            stamp: Utc::now(),
        }
    }
}

/// Downstream consumer of status publications.
///
/// The coordinator calls this exactly once per completed fetch cycle,
/// never on a submit cycle alone and never on a gated cycle.
pub trait StatusSink: Send {
    fn publish(&mut self, publication: StatusPublication);
}

/// Fan-out sink backed by a `tokio::sync::broadcast` channel.
///
/// Also keeps the most recent publication in a shared slot so request
/// handlers can answer "what is the status now" without subscribing.
pub struct BroadcastSink {
    tx: broadcast::Sender<StatusPublication>,
    latest: Arc<RwLock<Option<StatusPublication>>>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            latest: Arc::new(RwLock::new(None)),
        }
    }

    /// New receiver for the publication stream.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusPublication> {
        self.tx.subscribe()
    }

    /// Shared handle on the most recent publication.
    pub fn latest(&self) -> Arc<RwLock<Option<StatusPublication>>> {
        self.latest.clone()
    }
}

impl StatusSink for BroadcastSink {
    fn publish(&mut self, publication: StatusPublication) {
        *self.latest.write() = Some(publication.clone());
        // A send error only means nobody is subscribed right now.
        if self.tx.send(publication).is_err() {
            debug!("status published with no active subscribers");
        }
    }
}

/// Sink that records every publication, for tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub published: Vec<StatusPublication>,
}

impl StatusSink for RecordingSink {
    fn publish(&mut self, publication: StatusPublication) {
        self.published.push(publication);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_sink_updates_latest_and_subscribers() {
        let mut sink = BroadcastSink::new(4);
        let mut rx = sink.subscribe();
        let latest = sink.latest();

        let publication = StatusPublication::now(VehicleStatus {
            lock_engaged: true,
            ..Default::default()
        });
        sink.publish(publication.clone());

        assert_eq!(rx.try_recv().unwrap(), publication);
        assert_eq!(latest.read().as_ref(), Some(&publication));
    }

    #[test]
    fn publish_without_subscribers_is_not_an_error() {
        let mut sink = BroadcastSink::new(4);
        sink.publish(StatusPublication::now(VehicleStatus::default()));
        assert!(sink.latest().read().is_some());
    }
}
