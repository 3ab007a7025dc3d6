//! One-shot resolution of a discovered service with a bounded timeout.

use std::time::Duration;

use tokio::time;
use tracing::{debug, trace};

use crate::engine::{EngineEvent, ServiceEngine};
use crate::error::{Error, Result};
use crate::service::{ResolvedEndpoint, ServiceHandle};

/// Race engine resolution of `handle` against a timer; first to fire
/// wins, the loser's effect is suppressed.
///
/// The engine exposes resolution as browse events, so this browses the
/// handle's type and takes the first resolution matching its instance
/// name. Dropping the future drops the subscription, which stops the
/// underlying browse.
pub(crate) async fn resolve(
    engine: &dyn ServiceEngine,
    handle: &ServiceHandle,
    timeout: Duration,
) -> Result<ResolvedEndpoint> {
    let mut subscription = engine.browse(handle.service_type(), handle.domain())?;
    let deadline = time::Instant::now() + timeout;

    loop {
        tokio::select! {
            event = subscription.recv() => match event {
                Some(EngineEvent::Resolved { handle: resolved, endpoint })
                    if resolved.name() == handle.name() =>
                {
                    debug!(service = %handle, host = endpoint.host(), "resolved");
                    return Ok(endpoint);
                }
                Some(other) => {
                    trace!(service = %handle, event = ?other, "ignoring while resolving");
                }
                None => {
                    return Err(Error::daemon("engine stopped before resolution completed"));
                }
            },
            _ = time::sleep_until(deadline) => {
                debug!(service = %handle, ?timeout, "resolution timed out");
                return Err(Error::ResolveTimeout(timeout));
            }
        }
    }
}
