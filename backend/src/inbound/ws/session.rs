//! Per-connection WebSocket handler.
//!
//! One task per socket multiplexes three sources: the heartbeat timer,
//! client frames, and events routed to this client by the [`GridRouter`].
//! The public contract pings every 5s and drops a connection after 10s
//! without client traffic; tests shorten both intervals.

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::time;
use tracing::{debug, warn};

use crate::domain::events::RealtimeEvent;
use crate::inbound::ws::messages::{ClientCommand, ClientEnvelope, ServerFrame};
use crate::outbound::realtime::{ClientId, EventReceiver, GridRouter};

/// Time between heartbeats to the client (5s in production, shorter in tests).
#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Max idle time before disconnecting the client (10s in production, shorter in tests).
#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

/// Drive one connection until it closes, then release its router entry.
pub(super) async fn handle_ws_session(
    router: Arc<GridRouter>,
    client: ClientId,
    events: EventReceiver,
    session: Session,
    stream: MessageStream,
) {
    debug!(%client, "WebSocket client connected");
    WsSession::new(router.clone(), client)
        .run(session, stream, events)
        .await;
    router.disconnect(client);
    debug!(%client, "WebSocket client disconnected");
}

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    InvalidPayload,
    Network(Closed),
    Evicted,
}

enum CloseAction {
    None,
    Close(Option<CloseReason>),
}

struct WsSession {
    router: Arc<GridRouter>,
    client: ClientId,
}

impl WsSession {
    fn new(router: Arc<GridRouter>, client: ClientId) -> Self {
        Self { router, client }
    }

    async fn run(&self, mut session: Session, mut stream: MessageStream, mut events: EventReceiver) {
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    self.handle_heartbeat_tick(&mut session, &last_heartbeat).await
                }
                message = stream.recv() => {
                    self.handle_stream_message(&mut session, &mut last_heartbeat, message)
                        .await
                }
                event = events.recv() => {
                    self.forward_event(&mut session, event).await
                }
            };

            if let Err(error) = result {
                self.log_shutdown_reason(&error);
                let close_action = self.close_action_for(&error);
                self.close_session_if_needed(session, close_action).await;
                return;
            }
        }
    }

    async fn handle_heartbeat_tick(
        &self,
        session: &mut Session,
        last_heartbeat: &Instant,
    ) -> Result<(), SessionError> {
        if Instant::now().duration_since(*last_heartbeat) > CLIENT_TIMEOUT {
            return Err(SessionError::HeartbeatTimeout);
        }

        session.ping(b"").await.map_err(SessionError::Network)
    }

    async fn handle_stream_message(
        &self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionError> {
        let Some(message) = message else {
            return Err(SessionError::StreamClosed);
        };

        match message {
            Ok(message) => self.handle_message(session, last_heartbeat, message).await,
            Err(error) => Err(SessionError::Protocol(error)),
        }
    }

    async fn handle_message(
        &self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Message,
    ) -> Result<(), SessionError> {
        match message {
            Message::Ping(payload) => {
                *last_heartbeat = Instant::now();
                session
                    .pong(&payload)
                    .await
                    .map_err(SessionError::Network)?;
                Ok(())
            }
            Message::Text(text) => {
                *last_heartbeat = Instant::now();
                self.handle_text_message(session, text.as_ref()).await
            }
            Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => {
                *last_heartbeat = Instant::now();
                Ok(())
            }
            Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
        }
    }

    async fn handle_text_message(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<(), SessionError> {
        let envelope = match serde_json::from_str::<ClientEnvelope>(text) {
            Ok(envelope) => envelope,
            Err(error) => {
                warn!(client = %self.client, error = %error, "Rejected malformed WebSocket payload");
                return Err(SessionError::InvalidPayload);
            }
        };

        match ClientCommand::try_from(envelope) {
            Ok(command) => {
                self.apply_command(command);
                Ok(())
            }
            Err(error) => self
                .send_frame(session, &ServerFrame::Error(error))
                .await
                .map_err(SessionError::Network),
        }
    }

    fn apply_command(&self, command: ClientCommand) {
        match command {
            ClientCommand::JoinLocation { position, radius } => {
                let joined = self.router.subscribe(self.client, position);
                debug!(
                    client = %self.client,
                    cell = %position.cell(),
                    radius_metres = radius.metres(),
                    joined,
                    "joined location"
                );
            }
            ClientCommand::LeaveLocation(position) => {
                let left = self.router.unsubscribe(self.client, position);
                debug!(client = %self.client, cell = %position.cell(), left, "left location");
            }
            ClientCommand::UpdateLocation(position) => {
                let moved = self.router.update_location(self.client, position);
                debug!(client = %self.client, cell = %position.cell(), moved, "updated location");
            }
        }
    }

    async fn forward_event(
        &self,
        session: &mut Session,
        event: Option<Arc<RealtimeEvent>>,
    ) -> Result<(), SessionError> {
        let Some(event) = event else {
            return Err(SessionError::Evicted);
        };
        self.send_frame(session, &ServerFrame::from(event.as_ref()))
            .await
            .map_err(SessionError::Network)
    }

    async fn send_frame(&self, session: &mut Session, frame: &ServerFrame) -> Result<(), Closed> {
        match serde_json::to_string(frame) {
            Ok(body) => session.text(body).await,
            Err(error) => {
                // Debug builds fail fast on schema drift; release logs and keeps the socket.
                if cfg!(debug_assertions) {
                    panic!("outbound frames must serialise: {error}");
                } else {
                    warn!(error = %error, "Failed to serialise WebSocket frame");
                }
                Ok(())
            }
        }
    }

    fn log_shutdown_reason(&self, error: &SessionError) {
        let client = self.client;
        match error {
            SessionError::HeartbeatTimeout => {
                warn!(%client, "WebSocket heartbeat timeout; closing connection");
            }
            SessionError::Protocol(error) => {
                warn!(%client, error = %error, "WebSocket protocol error");
            }
            SessionError::Network(error) => {
                warn!(%client, error = %error, "WebSocket send failed; closing connection");
            }
            SessionError::Evicted => {
                warn!(%client, "Client dropped by the event router");
            }
            SessionError::InvalidPayload
            | SessionError::ClientClosed(_)
            | SessionError::StreamClosed => {}
        }
    }

    fn close_action_for(&self, error: &SessionError) -> CloseAction {
        match error {
            SessionError::HeartbeatTimeout => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Normal,
                description: Some("heartbeat timeout".to_owned()),
            })),
            SessionError::Protocol(_) => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Protocol,
                description: Some("protocol error".to_owned()),
            })),
            SessionError::InvalidPayload => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Policy,
                description: Some("invalid payload".to_owned()),
            })),
            SessionError::Evicted => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Away,
                description: Some("server shutting down".to_owned()),
            })),
            SessionError::ClientClosed(reason) => CloseAction::Close(reason.clone()),
            SessionError::StreamClosed | SessionError::Network(_) => CloseAction::None,
        }
    }

    async fn close_session_if_needed(&self, session: Session, close_action: CloseAction) {
        if let CloseAction::Close(reason) = close_action {
            if let Err(error) = session.close(reason).await {
                warn!(error = %error, "Failed to close WebSocket session");
            }
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
