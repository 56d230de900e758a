/// Realtime fan-out of task changes
///
/// This module provides the pieces behind the WebSocket task feed:
/// - Event types and payload shapes (`events`)
/// - The per-project broadcast hub (`hub`)
///
/// Mutation handlers publish to the hub synchronously after a successful
/// write; connection handlers subscribe per project and forward frames.
///
/// # Example
///
/// ```
/// use taskhive_shared::realtime::{ProjectHub, TaskEvent};
/// use uuid::Uuid;
///
/// # async fn example() {
/// let hub = ProjectHub::default();
/// let project_id = Uuid::new_v4();
///
/// let mut rx = hub.subscribe(project_id).await;
/// hub.publish(project_id, TaskEvent::deleted(project_id, Uuid::new_v4()))
///     .await;
/// let frame = rx.recv().await.unwrap();
/// println!("got {}", frame.event_type.as_str());
/// # }
/// ```

pub mod events;
pub mod hub;

// Re-export common types
pub use events::{TaskEvent, TaskEventKind};
pub use hub::{ProjectHub, DEFAULT_CHANNEL_CAPACITY};
