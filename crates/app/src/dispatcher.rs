//! Actuation dispatcher: fire-and-forget delivery of [`ActuationIntent`]s.
//!
//! Callers (the schedule tick, threshold counter-actuation) hand intents over
//! and return immediately. Each intent runs on its own task, with at most
//! `max_concurrent` gateway calls in flight and every call bounded by a
//! timeout. Failures are logged and dropped; nothing is retried.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use hearth_domain::actuation::{ActuationIntent, Command};
use hearth_domain::error::{DispatchError, HearthError};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::ports::{ActuationGateway, PasscodeStore};

/// Anything that accepts intents without waiting for them to complete.
pub trait ActuationSink: Send + Sync {
    /// Queue `intent` for delivery.
    fn submit(&self, intent: ActuationIntent);

    /// Queue every intent of `intents`.
    fn submit_all(&self, intents: impl IntoIterator<Item = ActuationIntent>) {
        for intent in intents {
            self.submit(intent);
        }
    }
}

/// Limits applied to outbound actuation calls.
#[derive(Debug, Clone, Copy)]
pub struct DispatchOptions {
    pub max_concurrent: usize,
    pub timeout: Duration,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            max_concurrent: 8,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Spawns one task per intent onto a shared [`JoinSet`].
///
/// Must be used from within a Tokio runtime. Cloning is cheap and clones
/// share the same concurrency budget and task set.
pub struct ActuationDispatcher<G, P> {
    gateway: Arc<G>,
    passcodes: Arc<P>,
    permits: Arc<Semaphore>,
    timeout: Duration,
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl<G, P> Clone for ActuationDispatcher<G, P> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            passcodes: Arc::clone(&self.passcodes),
            permits: Arc::clone(&self.permits),
            timeout: self.timeout,
            tasks: Arc::clone(&self.tasks),
        }
    }
}

impl<G: ActuationGateway, P: PasscodeStore> ActuationDispatcher<G, P> {
    /// Create a dispatcher delivering through `gateway` and `passcodes`.
    pub fn new(gateway: G, passcodes: P, options: DispatchOptions) -> Self {
        Self {
            gateway: Arc::new(gateway),
            passcodes: Arc::new(passcodes),
            permits: Arc::new(Semaphore::new(options.max_concurrent.max(1))),
            timeout: options.timeout,
            tasks: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    /// Wait for every dispatch submitted so far to finish.
    pub async fn drain(&self) {
        let mut tasks = {
            let mut guard = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *guard)
        };
        while let Some(result) = tasks.join_next().await {
            if let Err(err) = result {
                tracing::warn!(error = %err, "actuation task aborted");
            }
        }
    }

    /// Number of dispatches not yet reaped.
    pub fn in_flight(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<G: ActuationGateway, P: PasscodeStore> ActuationSink for ActuationDispatcher<G, P> {
    fn submit(&self, intent: ActuationIntent) {
        let gateway = Arc::clone(&self.gateway);
        let passcodes = Arc::clone(&self.passcodes);
        let permits = Arc::clone(&self.permits);
        let timeout = self.timeout;

        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        // reap finished dispatches so the set does not grow unbounded
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            let outcome = tokio::time::timeout(
                timeout,
                execute(gateway.as_ref(), passcodes.as_ref(), &intent),
            )
            .await;
            match outcome {
                Ok(Ok(())) => tracing::debug!(%intent, "actuation delivered"),
                Ok(Err(err)) => tracing::warn!(%intent, error = %err, "actuation failed"),
                Err(_) => {
                    let err = DispatchError::Timeout(
                        u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    );
                    tracing::warn!(%intent, error = %err, "actuation failed");
                }
            }
        });
    }
}

async fn execute<G: ActuationGateway, P: PasscodeStore>(
    gateway: &G,
    passcodes: &P,
    intent: &ActuationIntent,
) -> Result<(), HearthError> {
    match &intent.command {
        Command::SetValue(value) => gateway.set_value(&intent.device, value).await,
        Command::ResetPasscode => passcodes.set(intent.device.id, "").await,
    }
}
