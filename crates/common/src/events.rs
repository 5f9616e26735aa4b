//! Secret-free event stream.
//!
//! The core pushes structured events (auth attempts, API calls, item
//! results, job progress) into an [`EventSink`]; logging and diagnostics
//! consumers subscribe independently. Delivery is fire-and-forget over a
//! bounded broadcast channel: a slow or absent consumer lags and loses the
//! oldest events, it never blocks or fails the operation that emitted them.
//!
//! Events carry no secret material by construction: there is no field that
//! could hold a client secret or access token.

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use dirsync_domain::constants::EVENT_BUFFER_CAPACITY;
use dirsync_domain::ItemResult;

/// One observable event emitted by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApiEvent {
    /// A token request was made (success or failure); never the token itself.
    AuthAttempt {
        /// Environment the request targeted
        environment_id: String,
        /// Client id used (not secret)
        client_id: String,
        /// Whether a token was granted
        success: bool,
    },
    /// One outbound HTTP call completed (or failed in transport).
    ApiCall {
        /// HTTP method
        method: String,
        /// Request path without query string
        path: String,
        /// Response status, absent on transport failure
        status: Option<u16>,
        /// Wall-clock duration of the attempt
        duration_ms: u64,
    },
    /// One bulk item reached a terminal state.
    Item {
        /// Owning job
        job_id: Uuid,
        /// The recorded outcome
        result: ItemResult,
    },
    /// Bulk job progress after an item completed.
    JobProgress {
        /// Owning job
        job_id: Uuid,
        /// Items in a terminal state so far
        completed: usize,
        /// Items submitted
        total: usize,
    },
}

/// Bounded, drop-oldest fan-out for [`ApiEvent`]s.
///
/// Cloning is cheap; all clones feed the same subscribers.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: broadcast::Sender<ApiEvent>,
}

impl EventSink {
    /// Create a sink with the given buffer capacity (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Emit an event. Never blocks; if no subscriber is listening or a
    /// subscriber's buffer is full, the event (or the subscriber's oldest
    /// buffered event) is dropped.
    pub fn emit(&self, event: ApiEvent) {
        let _ = self.tx.send(event);
    }

    /// Subscribe to the event stream from this point onward.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ApiEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventSink {
    fn default() -> Self {
        Self::new(EVENT_BUFFER_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;

    fn call_event(path: &str) -> ApiEvent {
        ApiEvent::ApiCall {
            method: "GET".into(),
            path: path.into(),
            status: Some(200),
            duration_ms: 12,
        }
    }

    #[tokio::test]
    async fn emit_without_subscribers_is_a_no_op() {
        let sink = EventSink::new(4);
        sink.emit(call_event("/users"));
        assert_eq!(sink.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn subscribers_receive_events_in_order() {
        let sink = EventSink::new(8);
        let mut rx = sink.subscribe();
        sink.emit(call_event("/a"));
        sink.emit(call_event("/b"));

        assert!(matches!(rx.try_recv(), Ok(ApiEvent::ApiCall { ref path, .. }) if path == "/a"));
        assert!(matches!(rx.try_recv(), Ok(ApiEvent::ApiCall { ref path, .. }) if path == "/b"));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn overflow_drops_oldest_not_newest() {
        let sink = EventSink::new(2);
        let mut rx = sink.subscribe();
        for i in 0..5 {
            sink.emit(call_event(&format!("/{i}")));
        }

        // The lagging receiver is told how much it missed, then resumes at
        // the oldest retained event.
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Lagged(3))));
        assert!(matches!(rx.try_recv(), Ok(ApiEvent::ApiCall { ref path, .. }) if path == "/3"));
        assert!(matches!(rx.try_recv(), Ok(ApiEvent::ApiCall { ref path, .. }) if path == "/4"));
    }

    #[test]
    fn serialized_events_are_tagged() {
        let event = ApiEvent::AuthAttempt {
            environment_id: "env".into(),
            client_id: "client".into(),
            success: true,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"auth_attempt\""));
    }
}
