//! Transport capability contract.
//!
//! The coordinator owns routing and dispatch; everything physical — opening
//! a socket, framing, TLS — lives behind these traits. The shipped backend
//! is [`crate::ws::WsTransport`]; tests inject fakes through the same seam.

use std::sync::Arc;

/// Lifecycle and traffic events surfaced by a transport connection.
#[derive(Clone, Debug)]
pub enum TransportEvent {
    /// The connection handshake completed.
    Opened,
    /// The connection ended. `clean` is true for an orderly close handshake.
    Closed {
        code: Option<u16>,
        reason: String,
        clean: bool,
    },
    /// A transport-level failure. A `Closed` event may follow.
    Error(String),
    /// A complete text frame arrived.
    Text(String),
    /// A complete binary frame arrived.
    Binary(Vec<u8>),
}

/// Receives every event a connection produces.
///
/// Delivery may run on a different execution context than caller code, so
/// implementations must serialize access to their own state.
pub trait EventSink: Send + Sync {
    fn on_event(&self, event: TransportEvent);
}

/// One open (or opening) connection.
///
/// Both operations are synchronous and fire-and-forget: outcomes surface
/// only through the connection's events.
pub trait Connection: Send + Sync {
    /// Queue a text frame for delivery.
    fn write(&self, text: String);

    /// Begin an orderly shutdown.
    fn close(&self);
}

/// Opens connections bound to an event sink.
pub trait Transport: Send + Sync {
    /// Open a connection to `url`, delivering its events to `sink`.
    ///
    /// The connection is handed back immediately; the handshake completes
    /// in the background and reports through `sink`.
    fn open(&self, url: &str, sink: Arc<dyn EventSink>) -> Box<dyn Connection>;
}
