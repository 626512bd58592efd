//! Connection handlers for the Banter server.
//!
//! This module handles the connection lifecycle and event processing. Each
//! WebSocket connection runs one task that drains its outbound queue and
//! decodes inbound events; all routing happens under the shared registry
//! mutex, so registry mutations serialize exactly as the routing semantics
//! require.

use crate::config::Config;
use crate::metrics::{self, ConnectionMetricsGuard};
use anyhow::Result;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use banter_core::{router, ClientHandle, ConnectionState, Registry};
use banter_protocol::{codec, ClientEvent};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Shared server state.
pub struct AppState {
    /// The single room registry, serialized behind one mutex.
    pub registry: Mutex<Registry>,
    /// Server configuration.
    pub config: Config,
}

impl AppState {
    /// Create new app state.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            registry: Mutex::new(Registry::new()),
            config,
        }
    }
}

/// Run the HTTP/WebSocket server.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(config: Config) -> Result<()> {
    let state = Arc::new(AppState::new(config.clone()));

    // Start metrics server if enabled
    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            error!("Failed to start metrics server: {}", e);
        }
    }

    // Build router
    let app = Router::new()
        .route(&config.transport.websocket_path, get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state);

    // Bind and serve
    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;

    info!("Banter server listening on {}", addr);
    info!(
        "WebSocket endpoint: ws://{}{}",
        addr, config.transport.websocket_path
    );

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check handler.
async fn health_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// WebSocket upgrade handler.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Handle a WebSocket connection from accept to disconnect.
async fn handle_websocket(socket: WebSocket, state: Arc<AppState>) {
    // Record connection metrics
    let _metrics_guard = ConnectionMetricsGuard::new();

    debug!("WebSocket connected");

    // Send capability registered under the nickname on join; the paired
    // receiver is drained onto the socket below.
    let (handle, mut outbox) = ClientHandle::new();

    // Split the WebSocket
    let (mut sender, mut receiver) = socket.split();

    let mut conn_state = ConnectionState::Anonymous;

    // Event processing loop
    loop {
        tokio::select! {
            biased;

            // Drain events queued for this connection
            Some(event) = outbox.recv() => {
                match codec::encode(&event) {
                    Ok(text) => {
                        metrics::record_event(text.len(), "outbound");
                        if sender.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to encode outbound event");
                    }
                }
            }

            // Receive from WebSocket
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let start = Instant::now();
                        metrics::record_event(text.len(), "inbound");

                        handle_text(&text, &mut conn_state, &handle, &state).await;

                        metrics::record_latency(start.elapsed().as_secs_f64());
                    }
                    Some(Ok(Message::Binary(_))) => {
                        warn!("Ignoring binary message on text protocol");
                        metrics::record_error("protocol");
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        // Ignore pongs
                    }
                    Some(Ok(Message::Close(_))) => {
                        debug!("Received close frame");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket error");
                        metrics::record_error("websocket");
                        break;
                    }
                    None => {
                        debug!("WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    // Cleanup: named connections announce their departure
    let final_state = std::mem::replace(&mut conn_state, ConnectionState::Closed);
    if let ConnectionState::Named(nickname) = final_state {
        let deliveries = {
            let mut registry = state.registry.lock().await;
            let deliveries = router::handle_disconnect(&mut registry, &nickname);
            metrics::set_active_participants(registry.count());
            deliveries
        };
        router::dispatch(deliveries);
        debug!(nickname = %nickname, "WebSocket disconnected");
    } else {
        debug!("WebSocket disconnected before joining");
    }
}

/// Decode and route one inbound text event.
///
/// Every failure here is isolated to this connection and this event: the
/// event is dropped, counted, and the loop continues.
async fn handle_text(
    text: &str,
    conn_state: &mut ConnectionState,
    handle: &ClientHandle,
    state: &Arc<AppState>,
) {
    let event = match codec::decode_limited(text, state.config.limits.max_event_size) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "Dropping undecodable event");
            metrics::record_error("protocol");
            return;
        }
    };

    match event {
        ClientEvent::AddUser(participant) => {
            if let ConnectionState::Named(nickname) = conn_state {
                warn!(nickname = %nickname, "Dropping addUser from named connection");
                metrics::record_error("routing");
                return;
            }

            let nickname = participant.nickname.clone();
            let outcome = {
                let mut registry = state.registry.lock().await;
                let outcome = router::handle_add_user(&mut registry, participant, handle);
                if outcome.accepted {
                    metrics::set_active_participants(registry.count());
                }
                outcome
            };

            metrics::record_join(outcome.accepted);
            if outcome.accepted {
                *conn_state = ConnectionState::Named(nickname);
            }
            router::dispatch(outcome.deliveries);
        }

        ClientEvent::AddMessage(message) => {
            let result = {
                let registry = state.registry.lock().await;
                router::handle_add_message(&registry, message)
            };

            match result {
                Ok(deliveries) => {
                    router::dispatch(deliveries);
                }
                Err(e) => {
                    warn!(error = %e, "Dropping unroutable message");
                    metrics::record_error("routing");
                }
            }
        }
    }
}
