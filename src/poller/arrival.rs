use std::sync::Arc;

use async_trait::async_trait;

use super::{Alert, Result, TickStrategy};
use crate::{subscription::StopTarget, transit::TransitGateway};

/// Alerts with the estimated arrival time at the target stop.
pub struct ArrivalCheck {
    gateway: Arc<dyn TransitGateway>,
    target: StopTarget,
}

impl ArrivalCheck {
    /// Creates a check for `target`.
    pub fn new(gateway: Arc<dyn TransitGateway>, target: StopTarget) -> Self {
        Self { gateway, target }
    }
}

#[async_trait]
impl TickStrategy for ArrivalCheck {
    async fn check(&self) -> Result<Option<Alert>> {
        let target = &self.target;
        let estimate = self
            .gateway
            .find_arrival_estimate(&target.city, &target.route, target.direction, &target.station)
            .await?;

        match estimate.valid_estimate() {
            Some(seconds) => Ok(Some(classify_arrival(seconds))),
            None => {
                tracing::debug!("No estimate for {target} (stop status {})", estimate.stop_status);
                Ok(None)
            }
        }
    }
}

/// Under a minute is "now"; anything else is reported in whole minutes, near
/// or far alike.
pub fn classify_arrival(estimate_seconds: i64) -> Alert {
    let minutes = estimate_seconds.div_euclid(60);
    if minutes < 1 { Alert::ArrivingNow } else { Alert::ArrivingIn { minutes } }
}
