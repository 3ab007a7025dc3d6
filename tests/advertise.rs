use std::net::IpAddr;
use std::sync::Arc;

use dnssd_stream::{
    Discovery, Error, ServiceRegistration, SimEngine, DISCOVERY_ERROR_DOMAIN,
};

fn sim_discovery() -> (Discovery, SimEngine) {
    let engine = SimEngine::new();
    (Discovery::with_engine(Arc::new(engine.clone())), engine)
}

#[test]
fn test_advertise_and_drop_unregisters() {
    let (discovery, engine) = sim_discovery();

    let registration = ServiceRegistration::new("My App", "_http._tcp", 8080)
        .txt("version", "1.0");
    let advertisement = discovery.advertise(registration).unwrap();

    assert_eq!(
        advertisement.handle().fullname(),
        "My App._http._tcp.local."
    );
    assert_eq!(engine.registered(), vec![advertisement.handle().clone()]);

    drop(advertisement);
    assert!(
        engine.registered().is_empty(),
        "dropping the guard must unregister"
    );
}

#[test]
fn test_advertise_normalizes_service_type() {
    let (discovery, _engine) = sim_discovery();

    let advertisement = discovery
        .advertise(ServiceRegistration::new("Dotted", "_osc._udp.", 9000))
        .unwrap();
    assert_eq!(advertisement.handle().service_type(), "_osc._udp");
}

#[test]
fn test_advertise_invalid_type_fails() {
    let (discovery, engine) = sim_discovery();

    let err = discovery
        .advertise(ServiceRegistration::new("Broken", "http", 80))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidServiceType(_)));
    assert_eq!(err.domain(), DISCOVERY_ERROR_DOMAIN);
    assert!(engine.registered().is_empty());
}

#[test]
fn test_registration_builder() {
    let ip: IpAddr = "10.0.0.5".parse().unwrap();
    let registration = ServiceRegistration::new("Pinned", "_http._tcp", 443)
        .ip(ip)
        .txt("path", "/api")
        .txt("tls", "1");

    assert_eq!(registration.name(), "Pinned");
    assert_eq!(registration.service_type(), "_http._tcp");
    assert_eq!(registration.port(), 443);
    assert_eq!(registration.pinned_ip(), Some(ip));
    assert_eq!(registration.properties().len(), 2);
    assert_eq!(
        registration.properties().get("path").map(String::as_str),
        Some("/api")
    );
}
