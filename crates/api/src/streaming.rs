//! WebSocket streaming API.
//!
//! Fans outage lifecycle events out to connected subscribers. Clients
//! connect a named channel and then receive every event published on it.

use async_trait::async_trait;
use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use gridwatch_common::AppResult;
use gridwatch_core::{OutageEventPublisher, OutageProjection};
use gridwatch_db::entities::outage_report::OutageStatus;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::middleware::AppState;

/// The channel subscribers connect to for outage events.
pub const OUTAGES_CHANNEL: &str = "outages";

/// Streaming query parameters.
#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Access token, optional for read-only subscribers.
    pub token: Option<String>,
}

/// Outage lifecycle events carried on the broadcast channel.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutageStreamEvent {
    Created(OutageProjection),
    StatusChanged {
        id: String,
        status: OutageStatus,
        #[serde(rename = "resolvedAt")]
        resolved_at: Option<DateTime<Utc>>,
    },
    Deleted {
        id: String,
    },
}

impl OutageStreamEvent {
    const fn topic(&self) -> &'static str {
        match self {
            Self::Created(_) => "outage-created",
            Self::StatusChanged { .. } => "outage-status-changed",
            Self::Deleted { .. } => "outage-deleted",
        }
    }
}

/// Client-to-server message.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Connect to a channel.
    Connect { channel: String, id: String },
    /// Disconnect from a channel.
    Disconnect { id: String },
}

/// Server-to-client message.
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "body", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Channel connected.
    Connected { id: String },
    /// Channel event.
    Channel {
        id: String,
        #[serde(rename = "type")]
        event_type: String,
        body: serde_json::Value,
    },
}

/// Shared state for streaming.
#[derive(Clone)]
pub struct StreamingState {
    outage_tx: Arc<broadcast::Sender<OutageStreamEvent>>,
}

impl StreamingState {
    #[must_use]
    pub fn new() -> Self {
        let (outage_tx, _) = broadcast::channel(1000);
        Self {
            outage_tx: Arc::new(outage_tx),
        }
    }

    /// Publish an event to every live subscriber. A send with no receivers
    /// is not an error.
    pub fn publish(&self, event: OutageStreamEvent) {
        let _ = self.outage_tx.send(event);
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<OutageStreamEvent> {
        self.outage_tx.subscribe()
    }
}

impl Default for StreamingState {
    fn default() -> Self {
        Self::new()
    }
}

/// Event publisher backed by the WebSocket broadcast channel.
#[derive(Clone)]
pub struct StreamingPublisher {
    streaming: StreamingState,
}

impl StreamingPublisher {
    #[must_use]
    pub const fn new(streaming: StreamingState) -> Self {
        Self { streaming }
    }
}

#[async_trait]
impl OutageEventPublisher for StreamingPublisher {
    async fn publish_created(&self, projection: OutageProjection) -> AppResult<()> {
        self.streaming.publish(OutageStreamEvent::Created(projection));
        Ok(())
    }

    async fn publish_status_changed(
        &self,
        id: &str,
        status: OutageStatus,
        resolved_at: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        self.streaming.publish(OutageStreamEvent::StatusChanged {
            id: id.to_string(),
            status,
            resolved_at,
        });
        Ok(())
    }

    async fn publish_deleted(&self, id: &str) -> AppResult<()> {
        self.streaming
            .publish(OutageStreamEvent::Deleted { id: id.to_string() });
        Ok(())
    }
}

/// WebSocket handler for streaming.
pub async fn streaming_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<StreamQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    info!("New streaming connection");

    ws.on_upgrade(move |socket| handle_socket(socket, query, state))
}

async fn handle_socket(socket: WebSocket, query: StreamQuery, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let user = if let Some(token) = &query.token {
        match state.user_repo.find_by_token(token).await {
            Ok(user) => user,
            Err(e) => {
                warn!("Streaming auth failed: {}", e);
                None
            }
        }
    } else {
        None
    };
    let user_id = user.map(|u| u.id);

    info!(user_id = ?user_id, "Streaming connection established");

    let mut outage_rx = state.streaming.subscribe();

    // Connection IDs the client has bound to the outages channel.
    let mut connected_channels: HashMap<String, String> = HashMap::new();

    loop {
        tokio::select! {
            Some(msg) = receiver.next() => {
                match msg {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                if let Some(response) = handle_client_message(
                                    client_msg,
                                    &mut connected_channels,
                                ) {
                                    let json = serde_json::to_string(&response).unwrap_or_default();
                                    if sender.send(Message::Text(json.into())).await.is_err() {
                                        break;
                                    }
                                }
                            }
                            Err(e) => {
                                warn!("Failed to parse client message: {}", e);
                            }
                        }
                    }
                    Ok(Message::Close(_)) => {
                        info!("Client closed connection");
                        break;
                    }
                    Ok(Message::Ping(data)) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("WebSocket error: {}", e);
                        break;
                    }
                }
            }

            Ok(event) = outage_rx.recv() => {
                let subscribed: Vec<String> = connected_channels
                    .iter()
                    .filter(|(_, channel)| *channel == OUTAGES_CHANNEL)
                    .map(|(conn_id, _)| conn_id.clone())
                    .collect();
                for conn_id in subscribed {
                    let msg = event_to_server_message(&conn_id, &event);
                    let json = serde_json::to_string(&msg).unwrap_or_default();
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        return;
                    }
                }
            }
        }
    }

    info!("Streaming connection closed");
}

fn handle_client_message(
    msg: ClientMessage,
    connected_channels: &mut HashMap<String, String>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Connect { channel, id } => {
            if channel != OUTAGES_CHANNEL {
                warn!("Unknown channel: {}", channel);
                return None;
            }

            connected_channels.insert(id.clone(), channel);
            info!(id = %id, "Channel connected");

            Some(ServerMessage::Connected { id })
        }
        ClientMessage::Disconnect { id } => {
            connected_channels.remove(&id);
            info!(id = %id, "Channel disconnected");
            None
        }
    }
}

fn event_to_server_message(conn_id: &str, event: &OutageStreamEvent) -> ServerMessage {
    ServerMessage::Channel {
        id: conn_id.to_string(),
        event_type: event.topic().to_string(),
        body: serde_json::to_value(event).unwrap_or_default(),
    }
}
