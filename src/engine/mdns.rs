//! Production engine backed by the mdns-sd daemon.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

use mdns_sd::{ResolvedService, ServiceDaemon, ServiceEvent as MdnsEvent, ServiceInfo};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::advertise::ServiceRegistration;
use crate::error::{Error, Result};
use crate::service::{self, ResolvedEndpoint, ServiceHandle};

use super::{BrowseSubscription, EngineEvent, ServiceEngine};

/// DNS-SD engine over an [`mdns_sd::ServiceDaemon`].
///
/// The daemon delivers events on its own notification thread; each
/// subscription gets a dedicated forwarder thread bridging those events
/// into the async side, so a slow daemon channel never blocks a tokio
/// worker. Browses are reference-counted per type: `stop_browse` is only
/// issued once the last subscriber of a type is gone.
pub struct MdnsEngine {
    daemon: Arc<ServiceDaemon>,
    browses: Arc<Mutex<HashMap<String, usize>>>,
}

impl MdnsEngine {
    /// Start a new daemon.
    pub fn new() -> Result<Self> {
        let daemon = ServiceDaemon::new().map_err(|e| Error::Daemon(e.to_string()))?;
        Ok(Self {
            daemon: Arc::new(daemon),
            browses: Arc::new(Mutex::new(HashMap::new())),
        })
    }
}

impl ServiceEngine for MdnsEngine {
    fn name(&self) -> &'static str {
        "mdns"
    }

    fn browse(&self, service_type: &str, domain: &str) -> Result<BrowseSubscription> {
        let ty = service::canonical_service_type(service_type)?;
        let domain = service::canonical_domain(domain)?;
        let browse_type = format!("{ty}.{domain}.");

        {
            let mut browses = self.browses.lock().unwrap();
            *browses.entry(browse_type.clone()).or_insert(0) += 1;
        }

        let receiver = match self.daemon.browse(&browse_type) {
            Ok(receiver) => receiver,
            Err(e) => {
                release_browse(&self.daemon, &self.browses, &browse_type);
                return Err(Error::Daemon(e.to_string()));
            }
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let spawned = std::thread::Builder::new()
            .name(format!("dnssd-browse-{ty}"))
            .spawn(move || forward_events(receiver, tx));
        if let Err(e) = spawned {
            release_browse(&self.daemon, &self.browses, &browse_type);
            return Err(Error::Io(e));
        }

        trace!(browse_type = %browse_type, "browse subscription started");

        let daemon = Arc::clone(&self.daemon);
        let browses = Arc::clone(&self.browses);
        Ok(BrowseSubscription::new(rx, move || {
            release_browse(&daemon, &browses, &browse_type)
        }))
    }

    fn register(&self, registration: &ServiceRegistration) -> Result<ServiceHandle> {
        let ty = service::canonical_service_type(registration.service_type())?;
        let ty_domain = format!("{ty}.local.");

        let hostname = hostname::get()
            .unwrap_or_else(|_| "localhost".into())
            .to_string_lossy()
            .to_string();
        let host = format!("{hostname}.local.");

        let properties: Vec<(&str, &str)> = registration
            .properties()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let ip = registration
            .pinned_ip()
            .map(|ip| ip.to_string())
            .unwrap_or_default();

        let info = ServiceInfo::new(
            &ty_domain,
            registration.name(),
            &host,
            ip.as_str(),
            registration.port(),
            &properties[..],
        )
        .map_err(|e| Error::Daemon(e.to_string()))?;

        // Only auto-detect addresses when no explicit IP was pinned.
        let info = if registration.pinned_ip().is_none() {
            info.enable_addr_auto()
        } else {
            info
        };

        debug!(fullname = %info.get_fullname(), "registering service");
        self.daemon
            .register(info)
            .map_err(|e| Error::Daemon(e.to_string()))?;

        Ok(ServiceHandle::new(registration.name(), ty, "local"))
    }

    fn unregister(&self, handle: &ServiceHandle) -> Result<()> {
        debug!(service = %handle, "unregistering service");
        self.daemon
            .unregister(&handle.fullname())
            .map(|_| ())
            .map_err(|e| Error::Daemon(e.to_string()))
    }

    fn shutdown(&self) -> Result<()> {
        self.daemon
            .shutdown()
            .map(|_| ())
            .map_err(|e| Error::Daemon(e.to_string()))
    }
}

impl Drop for MdnsEngine {
    fn drop(&mut self) {
        let _ = self.daemon.shutdown();
    }
}

/// Drop one reference to a browse type, stopping the daemon browse when
/// the last subscriber is gone.
fn release_browse(
    daemon: &ServiceDaemon,
    browses: &Mutex<HashMap<String, usize>>,
    browse_type: &str,
) {
    let stop = {
        let mut browses = browses.lock().unwrap();
        match browses.get_mut(browse_type) {
            Some(n) if *n > 1 => {
                *n -= 1;
                false
            }
            Some(_) => {
                browses.remove(browse_type);
                true
            }
            None => false,
        }
    };
    if stop {
        if let Err(e) = daemon.stop_browse(browse_type) {
            debug!(browse_type, error = %e, "stop_browse failed");
        }
    }
}

/// Forwarder loop: convert daemon events and push them to the
/// subscription until the browse stops or the subscriber goes away.
fn forward_events(
    receiver: mdns_sd::Receiver<MdnsEvent>,
    tx: mpsc::UnboundedSender<EngineEvent>,
) {
    while let Ok(event) = receiver.recv() {
        let event = match event {
            MdnsEvent::ServiceFound(_ty, fullname) => {
                match service::split_fullname(&fullname) {
                    Some(handle) => EngineEvent::Found(handle),
                    None => {
                        trace!(fullname, "ignoring malformed instance name");
                        continue;
                    }
                }
            }
            MdnsEvent::ServiceResolved(resolved) => match resolved_to_event(&resolved) {
                Some(event) => event,
                None => continue,
            },
            MdnsEvent::ServiceRemoved(_ty, fullname) => {
                match service::split_fullname(&fullname) {
                    Some(handle) => EngineEvent::Removed(handle),
                    None => continue,
                }
            }
            MdnsEvent::SearchStopped(_) => break,
            _ => continue,
        };
        if tx.send(event).is_err() {
            break;
        }
    }
    trace!("browse forwarder stopped");
}

/// Convert an mdns-sd resolution into an engine event. This is the one
/// place this conversion happens.
fn resolved_to_event(resolved: &ResolvedService) -> Option<EngineEvent> {
    let fullname = resolved.get_fullname();
    let handle = match service::split_fullname(fullname) {
        Some(handle) => handle,
        None => {
            warn!(fullname, "resolved service with malformed instance name");
            return None;
        }
    };

    let addresses: Vec<IpAddr> = resolved
        .get_addresses()
        .iter()
        .map(|a| a.to_ip_addr())
        .collect();

    let txt: HashMap<String, String> = resolved
        .get_properties()
        .iter()
        .map(|p| (p.key().to_string(), p.val_str().to_string()))
        .collect();

    let endpoint = ResolvedEndpoint::new(
        resolved.get_hostname(),
        addresses,
        resolved.get_port(),
        txt,
    );
    Some(EngineEvent::Resolved { handle, endpoint })
}
