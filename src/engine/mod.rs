//! Pluggable DNS-SD engine backends.
//!
//! The engine is the callback/channel-driven protocol layer this crate
//! wraps. [`MdnsEngine`] drives a real mdns-sd daemon; [`SimEngine`] is a
//! deterministic in-memory engine for tests and examples. Both deliver
//! events through a [`BrowseSubscription`], the bridge between the
//! engine's notification thread and the stream-consumption context.

pub mod mdns;
pub mod sim;

pub use mdns::MdnsEngine;
pub use sim::SimEngine;

use tokio::sync::mpsc;

use crate::advertise::ServiceRegistration;
use crate::error::Result;
use crate::service::{ResolvedEndpoint, ServiceHandle};

/// A raw event produced by an engine browse.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// An instance of the browsed type appeared.
    Found(ServiceHandle),
    /// An instance of the browsed type went away.
    Removed(ServiceHandle),
    /// An instance finished address resolution.
    Resolved {
        /// The instance that resolved.
        handle: ServiceHandle,
        /// Its connectable address.
        endpoint: ResolvedEndpoint,
    },
}

/// An active browse on an engine.
///
/// Events are pulled with [`recv`](BrowseSubscription::recv); dropping
/// the subscription cancels the underlying browse, so no event is ever
/// delivered after cancellation.
pub struct BrowseSubscription {
    events: mpsc::UnboundedReceiver<EngineEvent>,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl BrowseSubscription {
    /// Wrap an event receiver with a cancel hook invoked on drop.
    pub fn new(
        events: mpsc::UnboundedReceiver<EngineEvent>,
        cancel: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            events,
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Receive the next event. Returns `None` once the engine has shut
    /// the browse down and all pending events were drained.
    pub async fn recv(&mut self) -> Option<EngineEvent> {
        self.events.recv().await
    }
}

impl Drop for BrowseSubscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// A DNS-SD protocol backend.
///
/// Implementors own the platform notification mechanism (daemon thread,
/// socket loop) and marshal its callbacks into [`BrowseSubscription`]s.
/// Browses of the same type must not interfere: cancelling one
/// subscription leaves the others running.
pub trait ServiceEngine: Send + Sync + 'static {
    /// Human-readable name for logging (e.g. "mdns", "sim").
    fn name(&self) -> &'static str;

    /// Start browsing for instances of `service_type` in `domain`
    /// (empty domain meaning the default).
    fn browse(&self, service_type: &str, domain: &str) -> Result<BrowseSubscription>;

    /// Advertise a service on the network. Returns the handle identifying
    /// the advertised instance.
    fn register(&self, registration: &ServiceRegistration) -> Result<ServiceHandle>;

    /// Withdraw a previously advertised service.
    fn unregister(&self, handle: &ServiceHandle) -> Result<()>;

    /// Shut the engine down. Active browse streams end; in-flight
    /// resolutions fail.
    fn shutdown(&self) -> Result<()>;
}
