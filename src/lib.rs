//! socketbus — topic-routed publish/subscribe over one socket connection.
//!
//! ARCHITECTURE
//! ============
//! One [`Coordinator`] owns one transport connection and a registry of
//! (identifier → handler) subscriptions. Outbound messages are wrapped in a
//! `{"data": ..., "route": "..."}` envelope and written fire-and-forget;
//! inbound text frames are decoded into `{"identifier": ..., "data": ...}`
//! envelopes and dispatched to every matching subscription, in order.
//!
//! The physical socket lives behind the [`Transport`] trait; the shipped
//! backend is [`WsTransport`] over tokio-tungstenite. The wire codec lives
//! in the sibling `envelopes` crate.
//!
//! Failure policy: nothing on the routing path raises to the caller. Bad
//! URLs, unparseable inbound text, unroutable envelope shapes, and sends
//! without a connection all degrade to a logged drop.

pub mod coordinator;
pub mod registry;
pub mod transport;
pub mod ws;

pub use coordinator::{ConnectionStatus, Coordinator};
pub use envelopes::{
    CodecError, InboundEnvelope, OutboundEnvelope, Payload, decode_envelope, encode_envelope,
};
pub use registry::{Handler, Registry};
pub use transport::{Connection, EventSink, Transport, TransportEvent};
pub use ws::WsTransport;
