//! Best-effort device position with a fixed fallback.

use anyhow::Result;
use async_trait::async_trait;

use crate::geo::Coordinate;

/// Something that may know where the user is.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Last known position; `Ok(None)` when there is no fix yet.
    async fn last_known(&self) -> Result<Option<Coordinate>>;
}

/// A provider with a position fixed up front (CLI flags, tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation(pub Option<Coordinate>);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn last_known(&self) -> Result<Option<Coordinate>> {
        match self.0 {
            Some(c) if !c.is_valid() => anyhow::bail!("Invalid coordinate {c}"),
            other => Ok(other),
        }
    }
}

/// The provider's position, or `fallback` when it has none or fails.
pub async fn resolve_position(provider: &dyn LocationProvider, fallback: Coordinate) -> Coordinate {
    match provider.last_known().await {
        Ok(Some(position)) => position,
        Ok(None) => {
            tracing::debug!(%fallback, "no location fix, using default position");
            fallback
        }
        Err(e) => {
            tracing::warn!(error = %e, %fallback, "location unavailable, using default position");
            fallback
        }
    }
}
