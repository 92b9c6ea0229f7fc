mod arrival;
mod proximity;
#[cfg(test)]
mod tests;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub use self::{
    arrival::{ArrivalCheck, classify_arrival},
    proximity::{ProximityCheck, stops_away},
};
use crate::{messaging::MessagingService, subscription::Subscription, transit::TransitError};

/// Why a tick could not decide whether to alert.
#[derive(Debug, Error)]
pub enum PollerError {
    /// The transit query failed.
    #[error("Failed to query transit data: {0}")]
    Transit(#[from] TransitError),
}

type Result<T> = std::result::Result<T, PollerError>;

/// What a tick found worth telling the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    /// Estimated arrival is under a minute.
    ArrivingNow,
    /// Estimated arrival in whole minutes.
    ArrivingIn {
        /// Whole minutes, rounded down.
        minutes: i64,
    },
    /// The nearest approaching bus is this many stops before the target.
    StopsAway {
        /// Stops between the bus and the target.
        stops: u32,
    },
}

/// Query and classification step of one subscription tick.
#[automock]
#[async_trait]
pub trait TickStrategy: Send + Sync {
    /// Returns `Ok(None)` when there is nothing to report this tick.
    async fn check(&self) -> Result<Option<Alert>>;
}

/// A subscription bound to its tick strategy and the chat it notifies.
pub struct RecurringSubscription {
    subscription: Subscription,
    strategy: Arc<dyn TickStrategy>,
    messaging_service: Arc<dyn MessagingService>,
}

impl RecurringSubscription {
    /// Binds `subscription` to the strategy that checks it.
    pub fn new(
        subscription: Subscription,
        strategy: Arc<dyn TickStrategy>,
        messaging_service: Arc<dyn MessagingService>,
    ) -> Self {
        Self { subscription, strategy, messaging_service }
    }

    /// The subscription this job reports on.
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// Runs one check. Failures are logged and the tick is skipped.
    pub async fn tick(&self) {
        let key = &self.subscription.key;
        let chat_id = self.subscription.chat_id();

        match self.strategy.check().await {
            Ok(Some(alert)) => {
                tracing::debug!("Sending {alert:?} for {key} to chat {chat_id}");
                if let Err(e) =
                    self.messaging_service.send_alert_msg(chat_id, &self.subscription, alert).await
                {
                    tracing::error!("Failed to send alert for {key} to chat {chat_id}: {e:?}");
                }
            }
            Ok(None) => tracing::debug!("Bus still far away for {key}"),
            Err(e) => tracing::warn!("Skipping tick for {key}: {e}"),
        }
    }

    /// Ticks every `period`, starting one period from now, until `cancel`
    /// fires. A tick that already started runs to completion.
    pub async fn run(self, period: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => self.tick().await,
            }
        }

        tracing::debug!("Stopped polling for {}", self.subscription.key);
    }
}
