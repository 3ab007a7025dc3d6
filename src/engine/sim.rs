//! Deterministic in-memory engine for tests and examples.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::trace;

use crate::advertise::ServiceRegistration;
use crate::error::{Error, Result};
use crate::service::{self, ResolvedEndpoint, ServiceHandle};

use super::{BrowseSubscription, EngineEvent, ServiceEngine};

/// An engine that never touches the network.
///
/// Tests drive it directly: [`announce`](SimEngine::announce),
/// [`remove`](SimEngine::remove) and
/// [`publish_resolution`](SimEngine::publish_resolution) push events to
/// every matching subscription, exactly as a daemon callback would.
#[derive(Clone, Default)]
pub struct SimEngine {
    state: Arc<Mutex<SimState>>,
}

#[derive(Default)]
struct SimState {
    next_id: u64,
    browsers: HashMap<u64, SimBrowser>,
    registered: Vec<ServiceHandle>,
    browse_failure: Option<String>,
}

struct SimBrowser {
    service_type: String,
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl SimEngine {
    /// Create an idle engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `browse` call fail with an engine error.
    pub fn fail_next_browse(&self, reason: &str) {
        self.state.lock().unwrap().browse_failure = Some(reason.to_string());
    }

    /// Announce a service instance to all matching subscriptions.
    pub fn announce(&self, handle: &ServiceHandle) {
        self.broadcast(handle.service_type(), EngineEvent::Found(handle.clone()));
    }

    /// Remove a service instance from all matching subscriptions.
    pub fn remove(&self, handle: &ServiceHandle) {
        self.broadcast(handle.service_type(), EngineEvent::Removed(handle.clone()));
    }

    /// Publish a completed resolution to all matching subscriptions.
    pub fn publish_resolution(&self, handle: &ServiceHandle, endpoint: &ResolvedEndpoint) {
        self.broadcast(
            handle.service_type(),
            EngineEvent::Resolved {
                handle: handle.clone(),
                endpoint: endpoint.clone(),
            },
        );
    }

    /// Number of live browse subscriptions.
    pub fn active_browses(&self) -> usize {
        self.state.lock().unwrap().browsers.len()
    }

    /// Handles of currently advertised services.
    pub fn registered(&self) -> Vec<ServiceHandle> {
        self.state.lock().unwrap().registered.clone()
    }

    fn broadcast(&self, service_type: &str, event: EngineEvent) {
        let canonical = match service::canonical_service_type(service_type) {
            Ok(ty) => ty,
            Err(_) => return,
        };
        let mut state = self.state.lock().unwrap();
        state.browsers.retain(|id, browser| {
            if browser.service_type != canonical {
                return true;
            }
            let delivered = browser.tx.send(event.clone()).is_ok();
            if !delivered {
                trace!(id, "dropping dead sim subscription");
            }
            delivered
        });
    }
}

impl ServiceEngine for SimEngine {
    fn name(&self) -> &'static str {
        "sim"
    }

    fn browse(&self, service_type: &str, domain: &str) -> Result<BrowseSubscription> {
        let ty = service::canonical_service_type(service_type)?;
        service::canonical_domain(domain)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut state = self.state.lock().unwrap();
            if let Some(reason) = state.browse_failure.take() {
                return Err(Error::Daemon(reason));
            }
            let id = state.next_id;
            state.next_id += 1;
            state.browsers.insert(
                id,
                SimBrowser {
                    service_type: ty,
                    tx,
                },
            );
            id
        };

        let state = Arc::clone(&self.state);
        Ok(BrowseSubscription::new(rx, move || {
            state.lock().unwrap().browsers.remove(&id);
        }))
    }

    fn register(&self, registration: &ServiceRegistration) -> Result<ServiceHandle> {
        let ty = service::canonical_service_type(registration.service_type())?;
        let handle = ServiceHandle::new(registration.name(), ty, "local");
        self.state.lock().unwrap().registered.push(handle.clone());
        Ok(handle)
    }

    fn unregister(&self, handle: &ServiceHandle) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let before = state.registered.len();
        state.registered.retain(|h| h != handle);
        if state.registered.len() == before {
            return Err(Error::daemon(format!("not registered: {handle}")));
        }
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.browsers.clear();
        state.registered.clear();
        Ok(())
    }
}
