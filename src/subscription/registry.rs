use std::{collections::HashMap, time::Duration};

use teloxide::types::ChatId;
use tokio::{sync::Mutex, task::JoinHandle, time::Instant};
use tokio_util::sync::CancellationToken;

use super::{SubscriptionError, SubscriptionKey, UnsubscribeScope};
use crate::poller::RecurringSubscription;

struct ScheduledTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct RegistryState {
    // Set by `shutdown`; no task is scheduled afterwards.
    closed: bool,
    tasks: HashMap<ChatId, HashMap<SubscriptionKey, ScheduledTask>>,
}

impl RegistryState {
    fn drain(&mut self) -> Vec<ScheduledTask> {
        self.tasks.drain().flat_map(|(_, chat_tasks)| chat_tasks.into_values()).collect()
    }
}

/// Live recurring tasks, grouped by the chat that owns them.
pub struct SubscriptionRegistry {
    scope: UnsubscribeScope,
    state: Mutex<RegistryState>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry whose bulk cancellation follows `scope`.
    pub fn new(scope: UnsubscribeScope) -> Self {
        Self { scope, state: Mutex::new(RegistryState::default()) }
    }

    /// Schedules `job` every `period` from now on. A live task with the same
    /// key is cancelled and replaced; returns whether that happened. Fails
    /// once the registry has been shut down.
    pub async fn create(
        &self,
        job: RecurringSubscription,
        period: Duration,
    ) -> Result<bool, SubscriptionError> {
        let key = job.subscription().key.clone();
        let mut state = self.state.lock().await;
        if state.closed {
            tracing::warn!("Rejected subscription {key} for chat {}: shutting down", key.chat_id);
            return Err(SubscriptionError::Closed);
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(job.run(period, cancel.clone()));
        let previous = state
            .tasks
            .entry(key.chat_id)
            .or_default()
            .insert(key.clone(), ScheduledTask { cancel, handle });

        match previous {
            Some(old) => {
                old.cancel.cancel();
                tracing::info!("Replaced subscription {key} for chat {}", key.chat_id);
                Ok(true)
            }
            None => {
                tracing::info!("Scheduled subscription {key} for chat {}", key.chat_id);
                Ok(false)
            }
        }
    }

    /// Cancels the task registered under `key`. Returns false if there is none.
    pub async fn cancel_by_name(&self, key: &SubscriptionKey) -> bool {
        let mut state = self.state.lock().await;
        let Some(chat_tasks) = state.tasks.get_mut(&key.chat_id) else {
            return false;
        };

        let removed = chat_tasks.remove(key);
        if chat_tasks.is_empty() {
            state.tasks.remove(&key.chat_id);
        }

        match removed {
            Some(task) => {
                task.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancels the caller's tasks, or every task when the registry is
    /// configured with [`UnsubscribeScope::Global`]. Returns how many were
    /// cancelled.
    pub async fn cancel_all_for(&self, chat_id: ChatId) -> usize {
        let mut state = self.state.lock().await;
        let removed: Vec<ScheduledTask> = match self.scope {
            UnsubscribeScope::Chat => {
                state.tasks.remove(&chat_id).map(|m| m.into_values().collect()).unwrap_or_default()
            }
            UnsubscribeScope::Global => state.drain(),
        };

        for task in &removed {
            task.cancel.cancel();
        }

        tracing::info!("Cancelled {} subscription(s) on request of chat {chat_id}", removed.len());
        removed.len()
    }

    /// Keys of the chat's live subscriptions, in a stable order.
    pub async fn list_for(&self, chat_id: ChatId) -> Vec<SubscriptionKey> {
        let state = self.state.lock().await;
        let mut keys: Vec<SubscriptionKey> =
            state.tasks.get(&chat_id).map(|m| m.keys().cloned().collect()).unwrap_or_default();
        keys.sort_by_cached_key(|key| key.to_string());
        keys
    }

    /// Number of live tasks across all chats.
    pub async fn task_count(&self) -> usize {
        self.state.lock().await.tasks.values().map(HashMap::len).sum()
    }

    /// Closes the registry, cancels everything and gives in-flight ticks
    /// `grace` to finish. Tasks still running after that are aborted.
    pub async fn shutdown(&self, grace: Duration) -> usize {
        let drained = {
            let mut state = self.state.lock().await;
            state.closed = true;
            state.drain()
        };

        for task in &drained {
            task.cancel.cancel();
        }

        let count = drained.len();
        let deadline = Instant::now() + grace;
        for task in drained {
            let abort = task.handle.abort_handle();
            match tokio::time::timeout_at(deadline, task.handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!("Subscription task ended abnormally: {e}"),
                Err(_) => {
                    tracing::warn!("Subscription task still busy after {grace:?}, aborting");
                    abort.abort();
                }
            }
        }

        count
    }
}
