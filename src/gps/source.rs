use futures::stream::{self, BoxStream, StreamExt};

use super::GpsSample;
use crate::error::{PanelError, PanelResult};

/// One event from the platform position watch
#[derive(Debug, Clone, PartialEq)]
pub enum PositionEvent {
    Fix(GpsSample),
    Error(String),
}

/// Platform positioning capability
///
/// `watch` starts a continuous subscription; dropping the returned stream
/// releases it.
pub trait PositionSource: Send + Sync {
    fn watch(&self) -> PanelResult<BoxStream<'static, PositionEvent>>;

    /// Source name for logging
    fn name(&self) -> &str;
}

/// A device with no positioning hardware
pub struct NoPositionSource;

impl PositionSource for NoPositionSource {
    fn watch(&self) -> PanelResult<BoxStream<'static, PositionEvent>> {
        Err(PanelError::DeviceCapabilityUnavailable(
            "GPS not available".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// A stationary position, e.g. a panel mounted at a known survey point.
/// Emits one fix per watch and then stays open.
pub struct FixedPositionSource {
    latitude: f64,
    longitude: f64,
    accuracy_m: f64,
}

impl FixedPositionSource {
    pub fn new(latitude: f64, longitude: f64, accuracy_m: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m,
        }
    }

    /// Parse `LAT,LON,ACC` (accuracy optional, defaults to 5 m)
    pub fn parse(input: &str) -> anyhow::Result<Self> {
        let parts: Vec<f64> = input
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid position '{}': {}", input, e))?;

        match parts.as_slice() {
            [lat, lon] => Ok(Self::new(*lat, *lon, 5.0)),
            [lat, lon, acc] => Ok(Self::new(*lat, *lon, *acc)),
            _ => anyhow::bail!("Expected LAT,LON[,ACC], got '{}'", input),
        }
    }
}

impl PositionSource for FixedPositionSource {
    fn watch(&self) -> PanelResult<BoxStream<'static, PositionEvent>> {
        let (lat, lon, acc) = (self.latitude, self.longitude, self.accuracy_m);

        Ok(stream::once(async move { PositionEvent::Fix(GpsSample::new(lat, lon, acc)) })
            .chain(stream::pending())
            .boxed())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}
