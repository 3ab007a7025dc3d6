//! Service identities and resolved endpoints.

use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::error::{Error, Result};

/// Identifies a discovered (not yet resolved) service instance.
///
/// Created from browse events; pass it to
/// [`Discovery::resolve`](crate::Discovery::resolve) to obtain a
/// connectable address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceHandle {
    name: String,
    service_type: String,
    domain: String,
}

impl ServiceHandle {
    /// Create a handle from its parts.
    pub fn new(
        name: impl Into<String>,
        service_type: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            service_type: service_type.into(),
            domain: domain.into(),
        }
    }

    /// The instance name, e.g. `My Printer`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The service type, e.g. `_http._tcp`.
    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    /// The domain the service was discovered in, e.g. `local`.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The full DNS-SD instance name, e.g. `My Printer._http._tcp.local.`.
    pub fn fullname(&self) -> String {
        format!("{}.{}.{}.", self.name, self.service_type, self.domain)
    }
}

impl fmt::Display for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.", self.name, self.service_type, self.domain)
    }
}

/// A change observed by a browse stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceEvent {
    /// A service instance appeared on the network.
    Added(ServiceHandle),
    /// A previously discovered instance went away.
    Removed(ServiceHandle),
}

impl ServiceEvent {
    /// The handle this event refers to.
    pub fn handle(&self) -> &ServiceHandle {
        match self {
            ServiceEvent::Added(handle) | ServiceEvent::Removed(handle) => handle,
        }
    }
}

/// The connectable address of a resolved service. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    host: String,
    addresses: Vec<IpAddr>,
    port: u16,
    txt: HashMap<String, String>,
}

impl ResolvedEndpoint {
    /// Create an endpoint from its parts.
    pub fn new(
        host: impl Into<String>,
        addresses: Vec<IpAddr>,
        port: u16,
        txt: HashMap<String, String>,
    ) -> Self {
        Self {
            host: host.into(),
            addresses,
            port,
            txt,
        }
    }

    /// The advertised host name, e.g. `printer.local.`.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// All addresses the service advertised.
    pub fn addresses(&self) -> &[IpAddr] {
        &self.addresses
    }

    /// The advertised port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// TXT record properties attached to the service.
    pub fn txt(&self) -> &HashMap<String, String> {
        &self.txt
    }

    /// A connectable address, preferring the first IPv4 address and
    /// falling back to the first address of any family.
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.addresses
            .iter()
            .find(|a| a.is_ipv4())
            .or_else(|| self.addresses.first())
            .map(|ip| SocketAddr::new(*ip, self.port))
    }
}

/// Canonicalize a service type string.
///
/// Accepts `_http._tcp` with an optional trailing dot; rejects anything
/// that is not a two-label `_name._tcp|_udp` type.
pub(crate) fn canonical_service_type(service_type: &str) -> Result<String> {
    let invalid = || Error::InvalidServiceType(service_type.to_string());

    let trimmed = service_type.trim_end_matches('.');
    let mut labels = trimmed.split('.');
    let (name, proto) = match (labels.next(), labels.next(), labels.next()) {
        (Some(name), Some(proto), None) => (name, proto),
        _ => return Err(invalid()),
    };

    if !name.starts_with('_') || name.len() < 2 || name.contains(char::is_whitespace) {
        return Err(invalid());
    }
    if proto != "_tcp" && proto != "_udp" {
        return Err(invalid());
    }

    Ok(format!("{name}.{proto}"))
}

/// Canonicalize a browse domain. Empty means the default domain.
pub(crate) fn canonical_domain(domain: &str) -> Result<String> {
    let trimmed = domain.trim_end_matches('.');
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("local") {
        Ok("local".to_string())
    } else {
        Err(Error::UnsupportedDomain(domain.to_string()))
    }
}

/// Split a full instance name into a handle.
///
/// `My Server._http._tcp.local.` -> (`My Server`, `_http._tcp`, `local`).
/// Returns `None` for names that do not follow the DNS-SD shape.
pub(crate) fn split_fullname(fullname: &str) -> Option<ServiceHandle> {
    let type_start = fullname.find("._")?;
    let name = &fullname[..type_start];
    if name.is_empty() {
        return None;
    }

    let rest = fullname[type_start + 1..].trim_end_matches('.');
    let domain_start = rest.rfind('.')?;
    let (service_type, domain) = rest.split_at(domain_start);
    let domain = &domain[1..];
    if domain.is_empty() || service_type.is_empty() {
        return None;
    }

    Some(ServiceHandle::new(name, service_type, domain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_service_type() {
        assert_eq!(canonical_service_type("_http._tcp").unwrap(), "_http._tcp");
        assert_eq!(
            canonical_service_type("_osc._udp.").unwrap(),
            "_osc._udp"
        );

        for bad in ["http._tcp", "_http", "_http._quic", "_ht tp._tcp", "", "_._tcp._extra"] {
            assert!(
                canonical_service_type(bad).is_err(),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_canonical_domain() {
        assert_eq!(canonical_domain("").unwrap(), "local");
        assert_eq!(canonical_domain("local").unwrap(), "local");
        assert_eq!(canonical_domain("local.").unwrap(), "local");
        assert_eq!(canonical_domain("LOCAL").unwrap(), "local");
        assert!(canonical_domain("example.com").is_err());
    }

    #[test]
    fn test_split_fullname() {
        let handle = split_fullname("My Server._http._tcp.local.").unwrap();
        assert_eq!(handle.name(), "My Server");
        assert_eq!(handle.service_type(), "_http._tcp");
        assert_eq!(handle.domain(), "local");
        assert_eq!(handle.fullname(), "My Server._http._tcp.local.");

        let dotted = split_fullname("A.B._http._tcp.local.").unwrap();
        assert_eq!(dotted.name(), "A.B");
        assert_eq!(dotted.service_type(), "_http._tcp");

        assert!(split_fullname("no-type-here").is_none());
    }

    #[test]
    fn test_socket_addr_prefers_ipv4() {
        let endpoint = ResolvedEndpoint::new(
            "box.local.",
            vec!["fe80::1".parse().unwrap(), "192.168.1.7".parse().unwrap()],
            8080,
            HashMap::new(),
        );
        assert_eq!(
            endpoint.socket_addr().unwrap(),
            "192.168.1.7:8080".parse().unwrap()
        );

        let v6_only = ResolvedEndpoint::new(
            "box.local.",
            vec!["fe80::1".parse().unwrap()],
            8080,
            HashMap::new(),
        );
        assert!(v6_only.socket_addr().unwrap().is_ipv6());

        let none = ResolvedEndpoint::new("box.local.", vec![], 8080, HashMap::new());
        assert!(none.socket_addr().is_none());
    }
}
