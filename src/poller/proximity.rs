use std::sync::Arc;

use async_trait::async_trait;

use super::{Alert, Result, TickStrategy};
use crate::{subscription::StopTarget, transit::TransitGateway};

/// Alerts when the nearest approaching bus is fewer than `threshold` stops
/// before the target stop.
pub struct ProximityCheck {
    gateway: Arc<dyn TransitGateway>,
    target: StopTarget,
    // Position of the target stop along the route, resolved at subscribe time.
    stop_sequence: u32,
    threshold: u32,
}

impl ProximityCheck {
    /// Creates a check for `target`, which sits at `stop_sequence` on its
    /// route.
    pub fn new(
        gateway: Arc<dyn TransitGateway>,
        target: StopTarget,
        stop_sequence: u32,
        threshold: u32,
    ) -> Self {
        Self { gateway, target, stop_sequence, threshold }
    }
}

#[async_trait]
impl TickStrategy for ProximityCheck {
    async fn check(&self) -> Result<Option<Alert>> {
        let target = &self.target;
        let buses =
            self.gateway.find_nearby_buses(&target.city, &target.route, target.direction).await?;

        match stops_away(self.stop_sequence, buses.iter().map(|bus| bus.stop_sequence)) {
            Some(stops) if stops < self.threshold => Ok(Some(Alert::StopsAway { stops })),
            Some(stops) => {
                tracing::debug!("Nearest bus for {target} is {stops} stops away");
                Ok(None)
            }
            None => {
                tracing::debug!("No bus approaching {target}");
                Ok(None)
            }
        }
    }
}

/// Stops between `target` and the closest bus that has not passed it yet.
/// Sequence numbers grow toward the target, so the closest bus has the
/// largest sequence below it.
pub fn stops_away(target: u32, bus_sequences: impl IntoIterator<Item = u32>) -> Option<u32> {
    bus_sequences.into_iter().filter(|&seq| seq < target).max().map(|nearest| target - nearest)
}
