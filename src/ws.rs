//! Websocket transport backend over tokio-tungstenite.
//!
//! Each opened connection runs one tokio task that owns the socket: a
//! `select!` loop forwards queued writes from an unbounded command channel
//! and turns inbound frames into [`TransportEvent`]s for the sink. Callers
//! never block; a write is a channel push and its outcome surfaces only as
//! events.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tracing::debug;

use crate::transport::{Connection, EventSink, Transport, TransportEvent};

/// Check that `url` is a plausible websocket target before dialing.
///
/// Requires a `ws://` or `wss://` scheme and a string that parses as a
/// client handshake request.
#[must_use]
pub fn valid_ws_url(url: &str) -> bool {
    if !url.starts_with("ws://") && !url.starts_with("wss://") {
        return false;
    }
    url.into_client_request().is_ok()
}

/// Transport backend that dials websocket URLs on the tokio runtime.
#[derive(Clone, Copy, Debug, Default)]
pub struct WsTransport;

impl Transport for WsTransport {
    fn open(&self, url: &str, sink: Arc<dyn EventSink>) -> Box<dyn Connection> {
        let (commands, command_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_connection(url.to_owned(), sink, command_rx));
        Box::new(WsConnection { commands })
    }
}

enum Command {
    Write(String),
    Close,
}

/// Handle side of one websocket connection task.
struct WsConnection {
    commands: mpsc::UnboundedSender<Command>,
}

impl Connection for WsConnection {
    fn write(&self, text: String) {
        if self.commands.send(Command::Write(text)).is_err() {
            debug!("ws: connection task gone, dropping write");
        }
    }

    fn close(&self) {
        let _ = self.commands.send(Command::Close);
    }
}

/// Own the socket for one connection's lifetime.
async fn run_connection(
    url: String,
    sink: Arc<dyn EventSink>,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    let (stream, _) = match connect_async(url.as_str()).await {
        Ok(pair) => pair,
        Err(e) => {
            sink.on_event(TransportEvent::Error(e.to_string()));
            sink.on_event(TransportEvent::Closed {
                code: None,
                reason: e.to_string(),
                clean: false,
            });
            return;
        }
    };

    sink.on_event(TransportEvent::Opened);
    let (mut writer, mut reader) = stream.split();
    let mut closing = false;

    loop {
        tokio::select! {
            command = commands.recv(), if !closing => {
                match command {
                    Some(Command::Write(text)) => {
                        if let Err(e) = writer.send(Message::Text(text.into())).await {
                            sink.on_event(TransportEvent::Error(e.to_string()));
                        }
                    }
                    // A dropped handle closes like an explicit close.
                    Some(Command::Close) | None => {
                        let _ = writer.send(Message::Close(None)).await;
                        closing = true;
                    }
                }
            }
            message = reader.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        sink.on_event(TransportEvent::Text(text.as_str().to_owned()));
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        sink.on_event(TransportEvent::Binary(bytes.to_vec()));
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = match frame {
                            Some(frame) => {
                                (Some(u16::from(frame.code)), frame.reason.as_str().to_owned())
                            }
                            None => (None, String::new()),
                        };
                        sink.on_event(TransportEvent::Closed { code, reason, clean: true });
                        return;
                    }
                    // Ping/pong keepalive is answered by tungstenite itself.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        sink.on_event(TransportEvent::Error(e.to_string()));
                        sink.on_event(TransportEvent::Closed {
                            code: None,
                            reason: e.to_string(),
                            clean: false,
                        });
                        return;
                    }
                    None => {
                        sink.on_event(TransportEvent::Closed {
                            code: None,
                            reason: String::new(),
                            clean: false,
                        });
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
