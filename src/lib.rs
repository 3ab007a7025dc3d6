//! Reactive stream wrapper over DNS-SD (Bonjour/mDNS) service discovery.
//!
//! Browsing becomes an async [`Stream`](futures_util::Stream) of
//! add/remove events, resolution a one-shot cancellable future with a
//! bounded timeout, and advertisement a guard object. The protocol
//! engine (mdns-sd) sits behind the [`ServiceEngine`] seam, so the
//! stream semantics are testable with the deterministic
//! [`SimEngine`](engine::SimEngine).
//!
//! Cancellation is dropping: dropping a browse stream, a resolve future
//! or an [`Advertisement`] releases the underlying engine resources, and
//! nothing is delivered afterwards.

#![deny(missing_docs)]

pub mod advertise;
pub mod browser;
pub mod engine;
pub mod error;
pub mod service;

mod resolver;

// Re-export key types
pub use advertise::{Advertisement, ServiceRegistration};
pub use browser::{Discovery, ServiceEvents};
pub use engine::{MdnsEngine, ServiceEngine, SimEngine};
pub use error::{Error, Result, DISCOVERY_ERROR_DOMAIN, SYSTEM_ERROR_DOMAIN};
pub use service::{ResolvedEndpoint, ServiceEvent, ServiceHandle};
