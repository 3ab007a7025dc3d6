//! Service advertisement: registration payloads and the lifetime guard.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use tracing::debug;

use crate::engine::ServiceEngine;
use crate::service::ServiceHandle;

/// Description of a service to advertise.
#[derive(Debug, Clone)]
pub struct ServiceRegistration {
    name: String,
    service_type: String,
    port: u16,
    ip: Option<IpAddr>,
    txt: HashMap<String, String>,
}

impl ServiceRegistration {
    /// Describe a service instance of `service_type` listening on `port`.
    pub fn new(name: impl Into<String>, service_type: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            service_type: service_type.into(),
            port,
            ip: None,
            txt: HashMap::new(),
        }
    }

    /// Pin the advertised address records to a specific IP. When not
    /// set, all machine addresses are advertised (auto-detect).
    pub fn ip(mut self, ip: IpAddr) -> Self {
        self.ip = Some(ip);
        self
    }

    /// Attach a TXT record property.
    pub fn txt(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.txt.insert(key.into(), value.into());
        self
    }

    /// The instance name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The service type.
    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    /// The advertised port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The pinned IP, if any.
    pub fn pinned_ip(&self) -> Option<IpAddr> {
        self.ip
    }

    /// TXT record properties.
    pub fn properties(&self) -> &HashMap<String, String> {
        &self.txt
    }
}

/// Keeps a service advertised for as long as it is held.
///
/// Dropping the guard withdraws the advertisement; a failed withdrawal
/// is logged and otherwise ignored.
pub struct Advertisement {
    engine: Arc<dyn ServiceEngine>,
    handle: ServiceHandle,
}

impl Advertisement {
    pub(crate) fn new(engine: Arc<dyn ServiceEngine>, handle: ServiceHandle) -> Self {
        Self { engine, handle }
    }

    /// The handle identifying the advertised instance.
    pub fn handle(&self) -> &ServiceHandle {
        &self.handle
    }
}

impl std::fmt::Debug for Advertisement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Advertisement")
            .field("engine", &self.engine.name())
            .field("handle", &self.handle)
            .finish()
    }
}

impl Drop for Advertisement {
    fn drop(&mut self) {
        if let Err(e) = self.engine.unregister(&self.handle) {
            debug!(service = %self.handle, error = %e, "failed to unregister on drop");
        }
    }
}
