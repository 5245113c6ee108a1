//! WebSocket endpoint for room participants.
//!
//! Connection lifecycle:
//! 1. Parse room, user and participant kind from the request
//! 2. Upgrade to WebSocket and register the connection
//! 3. Replay the room's latest stateful events
//! 4. Forward outbound events and dispatch inbound messages until disconnect
//! 5. Unregister

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::application::live::{DispatchOutcome, InboundMessage, LiveSession, MessageDispatcher};
use crate::application::RoomStateReader;
use crate::domain::foundation::{ConnectionId, DomainError, RoomId, UserId};
use crate::domain::room::ParticipantType;
use crate::ports::{ConnectionRegistry, TransportConnection, TransportError};

use super::messages::ErrorFrame;
use super::sender::{CachedEventProvider, TransportSender};

/// Default number of frames queued per connection before sends fail with
/// backpressure.
pub const DEFAULT_OUTBOUND_BUFFER: usize = 256;

/// State shared by every live connection.
#[derive(Clone)]
pub struct LiveState {
    pub registry: Arc<dyn ConnectionRegistry>,
    pub dispatcher: Arc<MessageDispatcher>,
    pub state_reader: Arc<RoomStateReader>,
    pub sender: TransportSender,
    pub outbound_buffer: usize,
}

impl LiveState {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        dispatcher: Arc<MessageDispatcher>,
        state_reader: Arc<RoomStateReader>,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            state_reader,
            sender: TransportSender::new(),
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
        }
    }

    pub fn with_outbound_buffer(mut self, frames: usize) -> Self {
        self.outbound_buffer = frames.max(1);
        self
    }
}

/// Query string of the upgrade request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveQuery {
    pub user_id: UserId,
    pub participant_type: ParticipantType,
}

/// A socket's outbound side as seen by the rest of the server.
///
/// Sends never wait on the network: frames go into a bounded queue drained
/// by the socket's writer task.
pub struct WsConnection {
    id: ConnectionId,
    outbound: mpsc::Sender<Arc<str>>,
}

impl WsConnection {
    pub fn new(outbound: mpsc::Sender<Arc<str>>) -> Self {
        Self {
            id: ConnectionId::new(),
            outbound,
        }
    }
}

#[async_trait]
impl TransportConnection for WsConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    async fn send_text(&self, text: Arc<str>) -> Result<(), TransportError> {
        self.outbound.try_send(text).map_err(|e| match e {
            TrySendError::Full(_) => TransportError::Backpressure,
            TrySendError::Closed(_) => TransportError::Closed,
        })
    }
}

/// Route: `GET /rooms/:room_id/live?userId=...&participantType=expert`
pub async fn live_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<RoomId>,
    Query(query): Query<LiveQuery>,
    State(state): State<LiveState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, room_id, query, state))
}

async fn handle_socket(socket: WebSocket, room_id: RoomId, query: LiveQuery, state: LiveState) {
    let (mut sink, mut stream) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Arc<str>>(state.outbound_buffer);
    let connection = Arc::new(WsConnection::new(outbound_tx));

    let session = LiveSession {
        room_id,
        user_id: query.user_id,
        participant_type: query.participant_type,
        connection_id: connection.id(),
    };

    state.registry.register(
        room_id,
        query.user_id,
        query.participant_type,
        connection.clone(),
    );

    match state.state_reader.latest_state(room_id).await {
        Ok(events) => {
            for event in events {
                let provider = CachedEventProvider::new(event);
                if let Err(e) = state.sender.send(&provider, connection.as_ref()).await {
                    tracing::debug!(
                        connection_id = %session.connection_id,
                        error = %e,
                        "Failed to replay room state"
                    );
                    break;
                }
            }
        }
        Err(e) => {
            tracing::warn!(room_id = %room_id, error = %e, "Failed to load room state");
        }
    }

    let mut send_task = {
        let connection_id = session.connection_id;
        tokio::spawn(async move {
            while let Some(text) = outbound_rx.recv().await {
                if let Err(e) = sink.send(Message::Text(text.to_string())).await {
                    tracing::debug!(
                        connection_id = %connection_id,
                        "Send error, closing connection: {}",
                        e
                    );
                    break;
                }
            }
        })
    };

    let mut recv_task = {
        let dispatcher = state.dispatcher.clone();
        let connection = connection.clone();
        tokio::spawn(async move {
            while let Some(result) = stream.next().await {
                match result {
                    Ok(Message::Text(text)) => {
                        handle_text(&dispatcher, &session, &text, connection.as_ref()).await;
                    }
                    Ok(Message::Binary(_)) => {
                        tracing::warn!(
                            connection_id = %session.connection_id,
                            "Received unsupported binary message"
                        );
                    }
                    Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                    Ok(Message::Close(_)) => {
                        tracing::debug!(
                            connection_id = %session.connection_id,
                            "Client sent close frame"
                        );
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(
                            connection_id = %session.connection_id,
                            "Receive error: {}",
                            e
                        );
                        break;
                    }
                }
            }
        })
    };

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.registry.unregister(connection.id());
}

async fn handle_text(
    dispatcher: &MessageDispatcher,
    session: &LiveSession,
    text: &str,
    connection: &dyn TransportConnection,
) {
    let message = match serde_json::from_str::<InboundMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!(
                connection_id = %session.connection_id,
                error = %e,
                "Ignoring malformed inbound message"
            );
            return;
        }
    };

    match dispatcher.dispatch(session, message).await {
        Ok(DispatchOutcome::Handled) | Ok(DispatchOutcome::Ignored) => {}
        Err(e) => {
            tracing::debug!(
                room_id = %session.room_id,
                connection_id = %session.connection_id,
                error = %e,
                "Inbound message rejected"
            );
            if let Err(send_err) = send_error_frame(connection, &e).await {
                tracing::debug!(
                    connection_id = %session.connection_id,
                    error = %send_err,
                    "Failed to send error frame"
                );
            }
        }
    }
}

async fn send_error_frame(
    connection: &dyn TransportConnection,
    err: &DomainError,
) -> Result<(), TransportError> {
    let frame = ErrorFrame::new(err.code.to_string(), err.message.clone());
    let text =
        serde_json::to_string(&frame).map_err(|e| TransportError::Serialization(e.to_string()))?;
    connection.send_text(Arc::from(text)).await
}

/// Router for the live endpoint.
///
/// # Example
///
/// ```ignore
/// let app = Router::new()
///     .merge(live_router())
///     .with_state(live_state);
/// ```
pub fn live_router() -> Router<LiveState> {
    Router::new().route("/rooms/:room_id/live", get(live_handler))
}
