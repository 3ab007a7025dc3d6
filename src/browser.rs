//! Browsing: the [`Discovery`] entry point and its event stream.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::Stream;
use tracing::debug;

use crate::advertise::{Advertisement, ServiceRegistration};
use crate::engine::{EngineEvent, MdnsEngine, ServiceEngine};
use crate::error::Result;
use crate::resolver;
use crate::service::{ResolvedEndpoint, ServiceEvent, ServiceHandle};

/// Entry point for browsing, resolving and advertising services.
///
/// Cheap to clone; clones share the underlying engine.
///
/// ```no_run
/// use std::time::Duration;
/// use futures_util::StreamExt;
/// use dnssd_stream::{Discovery, ServiceEvent};
///
/// # async fn example() -> dnssd_stream::Result<()> {
/// let discovery = Discovery::new()?;
/// let mut services = discovery.browse("_http._tcp", "");
/// while let Some(event) = services.next().await {
///     match event? {
///         ServiceEvent::Added(handle) => {
///             let endpoint = discovery.resolve(&handle, Duration::from_secs(5)).await?;
///             println!("{handle} -> {:?}", endpoint.socket_addr());
///         }
///         ServiceEvent::Removed(handle) => println!("gone: {handle}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Discovery {
    engine: Arc<dyn ServiceEngine>,
}

impl Discovery {
    /// Create a discovery client over a fresh mdns-sd engine.
    pub fn new() -> Result<Self> {
        Ok(Self::with_engine(Arc::new(MdnsEngine::new()?)))
    }

    /// Create a discovery client over a custom engine.
    pub fn with_engine(engine: Arc<dyn ServiceEngine>) -> Self {
        Self { engine }
    }

    /// Browse for services of `service_type` in `domain` (empty domain
    /// meaning the default, `local`).
    ///
    /// The returned stream is lazy: the underlying browse starts on the
    /// first poll. It is infinite until the engine shuts down, and each
    /// call produces an independent, restartable stream. A browse that
    /// cannot start yields a single `Err` item and ends. Dropping the
    /// stream cancels the browse; no event is delivered afterwards.
    pub fn browse(&self, service_type: &str, domain: &str) -> ServiceEvents {
        ServiceEvents::new(
            Arc::clone(&self.engine),
            self.engine.name(),
            service_type,
            domain,
        )
    }

    /// Resolve a discovered service to a connectable endpoint, waiting at
    /// most `timeout`.
    ///
    /// Emits exactly one [`ResolvedEndpoint`] or one timeout-classified
    /// error at or after the bound, never before. Dropping the returned
    /// future cancels the resolution and releases all engine resources
    /// without emitting anything.
    pub async fn resolve(
        &self,
        handle: &ServiceHandle,
        timeout: Duration,
    ) -> Result<ResolvedEndpoint> {
        resolver::resolve(self.engine.as_ref(), handle, timeout).await
    }

    /// Advertise a service on the local network until the returned guard
    /// is dropped.
    pub fn advertise(&self, registration: ServiceRegistration) -> Result<Advertisement> {
        let handle = self.engine.register(&registration)?;
        debug!(service = %handle, engine = self.engine.name(), "advertising service");
        Ok(Advertisement::new(Arc::clone(&self.engine), handle))
    }

    /// Shut the engine down. Active browse streams end and in-flight
    /// resolutions fail; prefer dropping individual streams to cancel
    /// single operations.
    pub fn shutdown(&self) -> Result<()> {
        self.engine.shutdown()
    }
}

/// Stream of [`ServiceEvent`]s produced by [`Discovery::browse`].
pub struct ServiceEvents {
    inner: Pin<Box<dyn Stream<Item = Result<ServiceEvent>> + Send>>,
}

impl ServiceEvents {
    fn new(
        engine: Arc<dyn ServiceEngine>,
        engine_name: &'static str,
        service_type: &str,
        domain: &str,
    ) -> Self {
        let service_type = service_type.to_string();
        let domain = domain.to_string();
        let inner: Pin<Box<dyn Stream<Item = Result<ServiceEvent>> + Send>> =
            Box::pin(async_stream::try_stream! {
                debug!(
                    service_type = %service_type,
                    domain = %domain,
                    engine = engine_name,
                    "starting browse"
                );
                let mut subscription = engine.browse(&service_type, &domain)?;
                while let Some(event) = subscription.recv().await {
                    match event {
                        EngineEvent::Found(handle) => yield ServiceEvent::Added(handle),
                        EngineEvent::Removed(handle) => yield ServiceEvent::Removed(handle),
                        // Resolutions belong to the resolver, not the browser.
                        EngineEvent::Resolved { .. } => continue,
                    }
                }
                debug!(service_type = %service_type, "browse ended");
            });
        Self { inner }
    }
}

impl Stream for ServiceEvents {
    type Item = Result<ServiceEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().inner.as_mut().poll_next(cx)
    }
}
