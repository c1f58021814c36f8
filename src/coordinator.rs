//! Coordinator — one socket, many topics.
//!
//! DESIGN
//! ======
//! The coordinator owns exactly one transport connection at a time plus the
//! subscription registry. Callers interact through three operations:
//! - `connect` opens (or replaces) the connection
//! - `subscribe` binds a handler to a topic, before or after connect
//! - `send` encodes and fire-and-forgets an outbound envelope
//!
//! Inbound traffic arrives through the transport's event sink, gets decoded
//! by the envelope codec, and is dispatched by the registry. Every failure
//! mode on this path degrades to drop-and-log; nothing raises to the caller.
//!
//! LIFECYCLE
//! =========
//! `Disconnected` → `connect` → `Connecting` → transport `Opened` →
//! `Connected` → transport `Closed` → `Disconnected`. The cycle is
//! reentrant: `connect` may be called again after a disconnect, replacing
//! the connection while the registry (and thus all subscriptions) survives.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use envelopes::{Payload, decode_envelope, encode_envelope};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::registry::Registry;
use crate::transport::{Connection, EventSink, Transport, TransportEvent};
use crate::ws::{self, WsTransport};

// =============================================================================
// STATUS
// =============================================================================

/// Connection status of the coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

// =============================================================================
// COORDINATOR
// =============================================================================

/// Client-side message router over a single socket connection.
///
/// `Coordinator` is a cheap-clone handle over shared state; construct one
/// at startup and pass clones to whoever needs the connection. There is no
/// implicit global instance.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Box<dyn Transport>,
    registry: Mutex<Registry>,
    link: Mutex<Link>,
}

/// The current (or most recent) connection and its lifecycle position.
struct Link {
    status: ConnectionStatus,
    connection: Option<Box<dyn Connection>>,
    /// Bumped on every `connect` so events from a replaced connection can
    /// be told apart from its successor's.
    generation: u64,
}

/// Lock that survives a panicking user handler instead of wedging the router.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Coordinator {
    /// Coordinator backed by the tokio-tungstenite websocket transport.
    #[must_use]
    pub fn new() -> Self {
        Self::with_transport(Box::new(WsTransport))
    }

    /// Coordinator backed by a caller-supplied transport.
    #[must_use]
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                registry: Mutex::new(Registry::new()),
                link: Mutex::new(Link {
                    status: ConnectionStatus::Disconnected,
                    connection: None,
                    generation: 0,
                }),
            }),
        }
    }

    /// Open a connection to `url`, replacing any prior connection.
    ///
    /// A URL that does not parse as a websocket target is a logged no-op:
    /// no connection attempt is made and the current state is untouched.
    pub fn connect(&self, url: &str) {
        if !ws::valid_ws_url(url) {
            warn!(%url, "connect: invalid url, ignoring");
            return;
        }

        // Status flips before `open`: the sink is live the moment the
        // transport has it, and a fast handshake must not see its
        // `Connected` overwritten by a late `Connecting`.
        let generation = {
            let mut link = lock(&self.inner.link);
            link.generation += 1;
            link.status = ConnectionStatus::Connecting;
            link.generation
        };

        let sink: Arc<dyn EventSink> = Arc::new(ConnectionSink {
            coordinator: Arc::downgrade(&self.inner),
            generation,
        });
        let connection = self.inner.transport.open(url, sink);

        let mut link = lock(&self.inner.link);
        if link.generation != generation {
            // A connect racing after ours already superseded this one.
            connection.close();
            return;
        }
        if let Some(previous) = link.connection.replace(connection) {
            previous.close();
        }
        info!(%url, generation, "connecting");
    }

    /// Bind `handler` to inbound messages carrying `identifier`.
    ///
    /// Independent of connection state: subscriptions live in the registry
    /// and survive disconnects. With `override_existing`, the first
    /// existing binding for `identifier` is replaced in place; otherwise
    /// the binding is appended, duplicates included.
    pub fn subscribe<F>(&self, identifier: &str, override_existing: bool, handler: F)
    where
        F: Fn(&Payload) + Send + Sync + 'static,
    {
        lock(&self.inner.registry).register(identifier, Arc::new(handler), override_existing);
    }

    /// Encode `content` for `route` and write it to the transport.
    ///
    /// Fire-and-forget: encoding failure or a missing connection drops the
    /// message with a diagnostic, and a queued write's outcome is owned by
    /// the transport. Nothing is buffered for later delivery.
    pub fn send(&self, content: Value, route: &str) {
        let text = match encode_envelope(&content, route) {
            Ok(text) => text,
            Err(e) => {
                warn!(%route, error = %e, "send: encode failed, dropping");
                return;
            }
        };

        debug!(%route, len = text.len(), "sending message");
        let link = lock(&self.inner.link);
        match link.connection.as_ref() {
            Some(connection) => connection.write(text),
            None => warn!(%route, "send: no connection, dropping"),
        }
    }

    /// Begin an orderly shutdown of the current connection, if any.
    ///
    /// The `Disconnected` state is entered when the transport reports the
    /// close, not here.
    pub fn disconnect(&self) {
        let mut link = lock(&self.inner.link);
        if let Some(connection) = link.connection.take() {
            info!("disconnect requested");
            connection.close();
        }
    }

    /// Current lifecycle position.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        lock(&self.inner.link).status
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// EVENT HANDLING
// =============================================================================

/// Per-connection sink: tags every event with the generation it belongs to.
struct ConnectionSink {
    coordinator: Weak<Inner>,
    generation: u64,
}

impl EventSink for ConnectionSink {
    fn on_event(&self, event: TransportEvent) {
        if let Some(inner) = self.coordinator.upgrade() {
            inner.handle_event(self.generation, event);
        }
    }
}

impl Inner {
    fn handle_event(&self, generation: u64, event: TransportEvent) {
        if lock(&self.link).generation != generation {
            debug!(generation, "event from superseded connection, ignoring");
            return;
        }

        match event {
            TransportEvent::Opened => {
                lock(&self.link).status = ConnectionStatus::Connected;
                info!(generation, "transport opened");
            }
            TransportEvent::Closed { code, reason, clean } => {
                lock(&self.link).status = ConnectionStatus::Disconnected;
                info!(code = ?code, reason = %reason, clean, "transport closed");
            }
            TransportEvent::Error(message) => {
                warn!(%message, "transport error");
            }
            TransportEvent::Text(text) => self.route_text(&text),
            TransportEvent::Binary(bytes) => {
                debug!(len = bytes.len(), "binary frame ignored");
            }
        }
    }

    /// Decode one inbound text frame and dispatch it, or drop it with a
    /// diagnostic. Unroutable traffic is never an error for the caller.
    fn route_text(&self, text: &str) {
        debug!(len = text.len(), "received text frame");
        let envelope = match decode_envelope(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "dropping unroutable frame");
                return;
            }
        };

        // Snapshot the matching handlers and release the registry lock
        // before invoking them: a handler may re-enter the coordinator,
        // e.g. to subscribe to further topics.
        let handlers = lock(&self.registry).matching(&envelope.identifier);
        if handlers.is_empty() {
            info!(identifier = %envelope.identifier, "no subscriptions for message");
            return;
        }
        for handler in &handlers {
            handler(&envelope.payload);
        }
        debug!(
            identifier = %envelope.identifier,
            delivered = handlers.len(),
            "dispatched inbound envelope"
        );
    }
}

#[cfg(test)]
#[path = "coordinator_test.rs"]
mod tests;
