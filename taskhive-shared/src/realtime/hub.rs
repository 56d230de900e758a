/// Per-project broadcast hub
///
/// This module provides the in-process fan-out used to push task events to
/// connected clients. Each project gets its own `tokio::sync::broadcast`
/// channel, created lazily on first subscribe and dropped again once the
/// last receiver disconnects.
///
/// Delivery is best-effort: events are not persisted or replayed, and a
/// subscriber that falls more than one channel capacity behind loses the
/// oldest events (`RecvError::Lagged` on its receiver). Ordering holds
/// within one publisher on one channel because mutation handlers publish
/// synchronously before responding.
///
/// # Example
///
/// ```
/// use taskhive_shared::realtime::hub::ProjectHub;
/// use taskhive_shared::realtime::events::TaskEvent;
/// use uuid::Uuid;
///
/// # async fn example() {
/// let hub = ProjectHub::default();
/// let project_id = Uuid::new_v4();
///
/// let mut rx = hub.subscribe(project_id).await;
/// let delivered = hub
///     .publish(project_id, TaskEvent::deleted(project_id, Uuid::new_v4()))
///     .await;
/// assert_eq!(delivered, 1);
/// # }
/// ```
use std::collections::HashMap;

use tokio::sync::broadcast;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::events::TaskEvent;

/// Events buffered per channel before slow subscribers start lagging
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Registry of per-project broadcast channels
///
/// Shared across connection handlers behind an `Arc`. Subscribing creates
/// the project channel on demand; publishing to a project nobody watches
/// is a no-op.
pub struct ProjectHub {
    capacity: usize,
    channels: RwLock<HashMap<Uuid, broadcast::Sender<TaskEvent>>>,
}

impl Default for ProjectHub {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl ProjectHub {
    /// Creates a hub whose channels buffer `capacity` events
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribes to a project's event channel, creating it if needed
    ///
    /// The returned receiver stops getting events when dropped. Callers
    /// should `prune` the project after dropping their receiver so idle
    /// channels do not accumulate.
    pub async fn subscribe(&self, project_id: Uuid) -> broadcast::Receiver<TaskEvent> {
        let mut channels = self.channels.write().await;
        match channels.get(&project_id) {
            Some(tx) => tx.subscribe(),
            None => {
                let (tx, rx) = broadcast::channel(self.capacity);
                channels.insert(project_id, tx);
                tracing::debug!(project_id = %project_id, "Opened project broadcast channel");
                rx
            }
        }
    }

    /// Publishes an event to a project's subscribers
    ///
    /// # Returns
    ///
    /// Number of subscribers the event was delivered to (0 if the project
    /// has no channel or no receivers)
    pub async fn publish(&self, project_id: Uuid, event: TaskEvent) -> usize {
        let channels = self.channels.read().await;

        let Some(tx) = channels.get(&project_id) else {
            tracing::debug!(
                project_id = %project_id,
                event = event.event_type.as_str(),
                "No channel for project, event dropped"
            );
            return 0;
        };

        match tx.send(event) {
            Ok(subscriber_count) => {
                tracing::debug!(
                    project_id = %project_id,
                    subscribers = subscriber_count,
                    "Published task event"
                );
                subscriber_count
            }
            Err(e) => {
                // All receivers gone, nothing to deliver
                tracing::debug!(
                    project_id = %project_id,
                    event = e.0.event_type.as_str(),
                    "No subscribers for project, event dropped"
                );
                0
            }
        }
    }

    /// Removes the project's channel if no receivers remain
    ///
    /// Called by connection handlers after dropping a receiver (leave or
    /// disconnect). A channel with live receivers is left untouched.
    pub async fn prune(&self, project_id: Uuid) {
        let mut channels = self.channels.write().await;
        if let Some(tx) = channels.get(&project_id) {
            if tx.receiver_count() == 0 {
                channels.remove(&project_id);
                tracing::debug!(project_id = %project_id, "Closed idle project broadcast channel");
            }
        }
    }

    /// Number of live receivers on a project's channel
    pub async fn subscriber_count(&self, project_id: Uuid) -> usize {
        let channels = self.channels.read().await;
        channels
            .get(&project_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Number of open project channels
    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::events::TaskEventKind;

    #[tokio::test]
    async fn test_publish_delivers_to_subscriber() {
        let hub = ProjectHub::default();
        let project_id = Uuid::new_v4();
        let task_id = Uuid::new_v4();

        let mut rx = hub.subscribe(project_id).await;

        let delivered = hub
            .publish(project_id, TaskEvent::deleted(project_id, task_id))
            .await;
        assert_eq!(delivered, 1);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type, TaskEventKind::Deleted);
        assert_eq!(event.payload["id"], task_id.to_string());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_returns_zero() {
        let hub = ProjectHub::default();
        let project_id = Uuid::new_v4();

        let delivered = hub
            .publish(project_id, TaskEvent::deleted(project_id, Uuid::new_v4()))
            .await;
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_publish_is_scoped_to_project() {
        let hub = ProjectHub::default();
        let watched = Uuid::new_v4();
        let other = Uuid::new_v4();

        let mut rx = hub.subscribe(watched).await;

        let delivered = hub
            .publish(other, TaskEvent::deleted(other, Uuid::new_v4()))
            .await;
        assert_eq!(delivered, 0);

        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_multiple_subscribers_each_receive() {
        let hub = ProjectHub::default();
        let project_id = Uuid::new_v4();

        let mut rx1 = hub.subscribe(project_id).await;
        let mut rx2 = hub.subscribe(project_id).await;

        let delivered = hub
            .publish(project_id, TaskEvent::deleted(project_id, Uuid::new_v4()))
            .await;
        assert_eq!(delivered, 2);

        assert!(rx1.recv().await.is_ok());
        assert!(rx2.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_subscribe_reuses_project_channel() {
        let hub = ProjectHub::default();
        let project_id = Uuid::new_v4();

        let _rx1 = hub.subscribe(project_id).await;
        let _rx2 = hub.subscribe(project_id).await;

        assert_eq!(hub.channel_count().await, 1);
        assert_eq!(hub.subscriber_count(project_id).await, 2);
    }

    #[tokio::test]
    async fn test_prune_removes_idle_channel_only() {
        let hub = ProjectHub::default();
        let project_id = Uuid::new_v4();

        let rx = hub.subscribe(project_id).await;

        // Live receiver, prune leaves the channel alone
        hub.prune(project_id).await;
        assert_eq!(hub.channel_count().await, 1);

        drop(rx);
        hub.prune(project_id).await;
        assert_eq!(hub.channel_count().await, 0);
    }

    #[tokio::test]
    async fn test_events_arrive_in_publish_order() {
        let hub = ProjectHub::default();
        let project_id = Uuid::new_v4();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        let mut rx = hub.subscribe(project_id).await;

        hub.publish(project_id, TaskEvent::deleted(project_id, first))
            .await;
        hub.publish(project_id, TaskEvent::deleted(project_id, second))
            .await;

        assert_eq!(rx.recv().await.unwrap().payload["id"], first.to_string());
        assert_eq!(rx.recv().await.unwrap().payload["id"], second.to_string());
    }
}
