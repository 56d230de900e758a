/// Realtime task feed endpoint
///
/// One socket per client; the client joins and leaves project channels over
/// the socket itself. Task mutations published to the hub are forwarded as
/// JSON frames in the shape
/// `{ "event_type": "task.updated", "project_id": <uuid>, "payload": ... }`.
///
/// The session token rides a query parameter because browser WebSocket
/// clients cannot set request headers. It is validated before the upgrade
/// completes, so unauthenticated connections are refused with 401 instead
/// of being upgraded and then dropped.
///
/// # Endpoint
///
/// - `GET /ws/tasks?token=<session token>` - Upgrade to the task feed
///
/// # Client frames
///
/// ```json
/// { "action": "join", "project_id": "7b6a3cbe-55a3-4a2c-9d5d-6f9ad65ba3a1" }
/// { "action": "leave", "project_id": "7b6a3cbe-55a3-4a2c-9d5d-6f9ad65ba3a1" }
/// ```
///
/// A join is re-authorized against the project's member list. Refusals and
/// malformed frames produce `{ "error": ..., "message": ... }` frames; the
/// connection stays open either way.
use crate::{app::AppState, error::ApiError};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use std::collections::HashMap;
use taskhive_shared::auth::{access, middleware::AuthContext, session::validate_session};
use taskhive_shared::realtime::TaskEvent;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Outbound frames queued per connection before the socket applies backpressure
const OUTBOUND_QUEUE: usize = 64;

/// Query parameters for the upgrade request
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    /// Session token, normally carried in the Authorization header
    pub token: Option<String>,
}

/// Subscription action requested by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedAction {
    Join,
    Leave,
}

/// One inbound client frame
#[derive(Debug, Deserialize)]
pub struct ClientFrame {
    pub action: FeedAction,
    pub project_id: Uuid,
}

/// Task feed upgrade handler
///
/// # Errors
///
/// - `401 Unauthorized`: Missing, invalid, or expired session token
pub async fn tasks_feed(
    ws: WebSocketUpgrade,
    Query(query): Query<FeedQuery>,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let token = query
        .token
        .ok_or_else(|| ApiError::Unauthorized("Missing session token".to_string()))?;

    let claims = validate_session(&token, &state.session)?;
    let auth = AuthContext::from_claims(&claims);

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, auth)))
}

/// Drives one connection: client frames in, hub events out
async fn handle_socket(socket: WebSocket, state: AppState, auth: AuthContext) {
    let (mut sender, mut receiver) = socket.split();

    // Forwarders for every joined project funnel into one outbound queue
    let (out_tx, mut out_rx) = mpsc::channel::<String>(OUTBOUND_QUEUE);
    let mut joined: HashMap<Uuid, JoinHandle<()>> = HashMap::new();

    tracing::debug!(user_id = %auth.user_id, "Realtime feed connected");

    loop {
        tokio::select! {
            outbound = out_rx.recv() => {
                // The sender side never fully closes while this loop runs
                let Some(text) = outbound else { break };
                if sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            inbound = receiver.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        handle_frame(&state, &auth, &mut joined, &out_tx, &text).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    // Axum answers pings itself; binary frames are not part
                    // of the protocol
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(user_id = %auth.user_id, "WebSocket error: {}", e);
                        break;
                    }
                }
            }
        }
    }

    for (project_id, handle) in joined.drain() {
        handle.abort();
        state.hub.prune(project_id).await;
    }

    tracing::debug!(user_id = %auth.user_id, "Realtime feed disconnected");
}

/// Applies one client frame to the connection's subscription set
async fn handle_frame(
    state: &AppState,
    auth: &AuthContext,
    joined: &mut HashMap<Uuid, JoinHandle<()>>,
    out_tx: &mpsc::Sender<String>,
    text: &str,
) {
    let frame: ClientFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(_) => {
            let _ = out_tx
                .send(error_frame("bad_frame", "Expected a join or leave frame"))
                .await;
            return;
        }
    };

    match frame.action {
        FeedAction::Join => {
            // Re-joining an already joined project is a no-op
            if joined.contains_key(&frame.project_id) {
                return;
            }

            match access::authorize_access(&state.db, frame.project_id, auth.user_id).await {
                Ok(true) => {
                    let events = state.hub.subscribe(frame.project_id).await;
                    let forwarder = tokio::spawn(forward_events(events, out_tx.clone()));
                    joined.insert(frame.project_id, forwarder);

                    tracing::debug!(
                        user_id = %auth.user_id,
                        project_id = %frame.project_id,
                        "Joined project feed"
                    );
                }
                Ok(false) => {
                    let _ = out_tx
                        .send(error_frame("forbidden", "No access to this project"))
                        .await;
                }
                Err(e) => {
                    tracing::error!("Feed authorization check failed: {}", e);
                    let _ = out_tx
                        .send(error_frame("internal_error", "Could not join project"))
                        .await;
                }
            }
        }
        FeedAction::Leave => {
            if let Some(forwarder) = joined.remove(&frame.project_id) {
                forwarder.abort();
                state.hub.prune(frame.project_id).await;

                tracing::debug!(
                    user_id = %auth.user_id,
                    project_id = %frame.project_id,
                    "Left project feed"
                );
            }
        }
    }
}

/// Copies one project's events onto the connection's outbound queue
async fn forward_events(mut events: broadcast::Receiver<TaskEvent>, out: mpsc::Sender<String>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                let Ok(text) = serde_json::to_string(&event) else {
                    continue;
                };
                if out.send(text).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Feed subscriber lagged, oldest events dropped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn error_frame(code: &str, message: &str) -> String {
    serde_json::json!({ "error": code, "message": message }).to_string()
}
