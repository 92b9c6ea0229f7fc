mod entity;
mod registry;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use mockall::automock;
use teloxide::types::ChatId;
use thiserror::Error;

pub use self::{
    entity::{PollKind, StopTarget, Subscription, SubscriptionKey, UnsubscribeScope},
    registry::SubscriptionRegistry,
};
use crate::{
    messaging::MessagingService,
    poller::{ArrivalCheck, ProximityCheck, RecurringSubscription, TickStrategy},
    transit::{TransitError, TransitGateway},
};

/// Why a subscription could not be created.
#[derive(Debug, Error)]
pub enum SubscriptionError {
    /// The city, route, direction and station matched nothing.
    #[error(
        "Bus Error: Station/Route not found. Make sure the direction you are using is correct"
    )]
    NotFound,
    /// The transit API could not be queried.
    #[error("Bus Error: transit service unavailable, try again later")]
    Unavailable(#[source] TransitError),
    /// The registry no longer accepts tasks.
    #[error("The bot is shutting down, try again later")]
    Closed,
}

impl From<TransitError> for SubscriptionError {
    fn from(error: TransitError) -> Self {
        match error {
            TransitError::NotFound => SubscriptionError::NotFound,
            other => SubscriptionError::Unavailable(other),
        }
    }
}

type Result<T> = std::result::Result<T, SubscriptionError>;

/// Creates, cancels and lists a chat's subscriptions.
#[automock]
#[async_trait]
pub trait SubscriptionService: Send + Sync {
    /// Validates `target` against the transit API and schedules a recurring
    /// check for it.
    async fn subscribe(
        &self,
        chat_id: ChatId,
        kind: PollKind,
        target: StopTarget,
    ) -> Result<Subscription>;

    /// Cancels the chat's subscriptions. Returns how many were cancelled.
    async fn unsubscribe_all(&self, chat_id: ChatId) -> usize;

    /// The chat's live subscriptions.
    async fn list_subscriptions(&self, chat_id: ChatId) -> Vec<SubscriptionKey>;
}

/// `SubscriptionService` that validates against the transit API and schedules
/// tasks in a [`SubscriptionRegistry`].
pub struct DefaultSubscriptionService {
    gateway: Arc<dyn TransitGateway>,
    messaging_service: Arc<dyn MessagingService>,
    registry: Arc<SubscriptionRegistry>,
    // Time between two ticks of one subscription.
    poll_interval: Duration,
    // Proximity alerts fire below this many stops.
    approach_threshold: u32,
}

impl DefaultSubscriptionService {
    /// Creates a new `DefaultSubscriptionService` instance.
    pub fn new(
        gateway: Arc<dyn TransitGateway>,
        messaging_service: Arc<dyn MessagingService>,
        registry: Arc<SubscriptionRegistry>,
        poll_interval: Duration,
        approach_threshold: u32,
    ) -> Self {
        Self { gateway, messaging_service, registry, poll_interval, approach_threshold }
    }

    async fn build_strategy(
        &self,
        kind: PollKind,
        target: &StopTarget,
    ) -> Result<Arc<dyn TickStrategy>> {
        match kind {
            PollKind::Arrival => {
                self.gateway
                    .find_arrival_estimate(
                        &target.city,
                        &target.route,
                        target.direction,
                        &target.station,
                    )
                    .await?;
                Ok(Arc::new(ArrivalCheck::new(self.gateway.clone(), target.clone())))
            }
            PollKind::Proximity => {
                let stop_sequence = self
                    .gateway
                    .find_stop_sequence(
                        &target.city,
                        &target.route,
                        target.direction,
                        &target.station,
                    )
                    .await?;
                tracing::debug!("Stop {} is number {stop_sequence} on route", target.station);
                Ok(Arc::new(ProximityCheck::new(
                    self.gateway.clone(),
                    target.clone(),
                    stop_sequence,
                    self.approach_threshold,
                )))
            }
        }
    }
}

#[async_trait]
impl SubscriptionService for DefaultSubscriptionService {
    async fn subscribe(
        &self,
        chat_id: ChatId,
        kind: PollKind,
        target: StopTarget,
    ) -> Result<Subscription> {
        let strategy = self.build_strategy(kind, &target).await?;

        let terminus = match self
            .gateway
            .find_route_terminus(&target.city, &target.route, target.direction)
            .await
        {
            Ok(terminus) => Some(terminus),
            Err(e) => {
                tracing::warn!("Could not resolve terminus for {target}: {e}");
                None
            }
        };

        let subscription = Subscription { key: SubscriptionKey::new(chat_id, kind, target), terminus };
        let job = RecurringSubscription::new(
            subscription.clone(),
            strategy,
            self.messaging_service.clone(),
        );
        self.registry.create(job, self.poll_interval).await?;

        Ok(subscription)
    }

    async fn unsubscribe_all(&self, chat_id: ChatId) -> usize {
        self.registry.cancel_all_for(chat_id).await
    }

    async fn list_subscriptions(&self, chat_id: ChatId) -> Vec<SubscriptionKey> {
        self.registry.list_for(chat_id).await
    }
}
