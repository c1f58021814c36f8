//! Subscription registry — ordered identifier → handler bindings.
//!
//! All state, no I/O. The registry preserves insertion order so that an
//! override can replace a handler in place without reordering, and so that
//! duplicate subscriptions (append without override) fire in the order they
//! were created.

use std::sync::Arc;

use envelopes::Payload;
use tracing::{debug, info};

/// Callback invoked with the payload of each matching inbound message.
pub type Handler = Arc<dyn Fn(&Payload) + Send + Sync>;

struct Subscription {
    identifier: String,
    handler: Handler,
}

/// Ordered collection of topic subscriptions.
#[derive(Default)]
pub struct Registry {
    subscriptions: Vec<Subscription>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self { subscriptions: Vec::new() }
    }

    /// Bind `handler` to `identifier`.
    ///
    /// With `override_existing`, the first existing entry for `identifier`
    /// is replaced in place, keeping its position. Otherwise the binding is
    /// appended unconditionally — duplicates are deliberate pass-through of
    /// caller intent, not deduplicated.
    pub fn register(&mut self, identifier: &str, handler: Handler, override_existing: bool) {
        if override_existing {
            let existing = self
                .subscriptions
                .iter_mut()
                .find(|s| s.identifier == identifier);
            if let Some(subscription) = existing {
                subscription.handler = handler;
                debug!(%identifier, "subscription replaced");
                return;
            }
        }

        self.subscriptions
            .push(Subscription { identifier: identifier.to_owned(), handler });
        debug!(%identifier, "subscribed");
    }

    /// Clone the handlers bound to `identifier`, in registration order.
    ///
    /// A caller that keeps the registry behind a lock can snapshot the
    /// matches, release the lock, and then invoke them, so a handler may
    /// re-enter the registry (e.g. subscribe from inside dispatch).
    #[must_use]
    pub fn matching(&self, identifier: &str) -> Vec<Handler> {
        self.subscriptions
            .iter()
            .filter(|s| s.identifier == identifier)
            .map(|s| Arc::clone(&s.handler))
            .collect()
    }

    /// Invoke every handler bound to `identifier`, in registration order.
    ///
    /// Zero matches is a normal, observable outcome: it emits one
    /// diagnostic event and nothing else. Returns the number of handlers
    /// invoked.
    #[must_use]
    pub fn dispatch(&self, identifier: &str, payload: &Payload) -> usize {
        let handlers = self.matching(identifier);
        for handler in &handlers {
            handler(payload);
        }

        if handlers.is_empty() {
            info!(%identifier, "no subscriptions for message");
        }
        handlers.len()
    }

    /// Number of registered bindings, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
