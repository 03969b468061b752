//! Provider dispatcher: drains the outbound channel with a fixed number of
//! workers, routes by `paymentProvider`, and records the hand-off.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::{OutboundReceiver, ProviderClient, ProviderError};
use crate::payment::{PaymentError, PaymentEvent, PaymentInstruction, PaymentProvider, PaymentStatus};
use crate::shutdown::ShutdownSignal;
use crate::store::{InstructionStore, UpdateOutcome};

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] PaymentError),
}

pub struct ProviderDispatcher {
    receiver: OutboundReceiver,
    clients: HashMap<PaymentProvider, Arc<dyn ProviderClient>>,
    store: Arc<dyn InstructionStore>,
    shutdown: ShutdownSignal,
}

impl ProviderDispatcher {
    pub fn new(
        receiver: OutboundReceiver,
        store: Arc<dyn InstructionStore>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            receiver,
            clients: HashMap::new(),
            store,
            shutdown,
        }
    }

    pub fn with_client(mut self, provider: PaymentProvider, client: Arc<dyn ProviderClient>) -> Self {
        self.clients.insert(provider, client);
        self
    }

    pub fn spawn(self: Arc<Self>, workers: usize) -> Vec<JoinHandle<()>> {
        (0..workers.max(1))
            .map(|worker| {
                let dispatcher = self.clone();
                tokio::spawn(async move { dispatcher.run_worker(worker).await })
            })
            .collect()
    }

    async fn run_worker(&self, worker: usize) {
        debug!(worker, "Provider dispatch worker started");
        loop {
            let next = tokio::select! {
                _ = self.shutdown.wait() => None,
                next = self.receiver.recv() => next,
            };
            let Some(instruction) = next else { break };

            let id = instruction.id;
            let provider = instruction.payment_provider;
            if let Err(e) = self.dispatch(&instruction).await {
                // stays Received; replay picks it up
                error!(payment_id = %id, provider = %provider, error = %e, "Provider hand-off failed");
            }
        }
        info!(worker, "Provider dispatch worker stopped");
    }

    /// Submit one instruction and record `SubmittedForProcessing`
    pub async fn dispatch(&self, instruction: &PaymentInstruction) -> Result<UpdateOutcome, DispatchError> {
        let provider = instruction.payment_provider;
        let client = self
            .clients
            .get(&provider)
            .ok_or_else(|| ProviderError::Unrouted(provider.to_string()))?;

        let reference = client.submit(instruction).await?;
        let outcome = self
            .store
            .update_payment(
                instruction.id,
                PaymentStatus::SubmittedForProcessing,
                PaymentEvent::submitted(reference.clone()),
            )
            .await?;

        match outcome {
            UpdateOutcome::Applied { version } => {
                info!(payment_id = %instruction.id, provider = %provider, reference = %reference, version, "Submitted to provider")
            }
            UpdateOutcome::Skipped { status } => {
                // provider callback overtook the hand-off
                debug!(payment_id = %instruction.id, status = %status, "Submission not recorded")
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::types::fixtures::incoming;
    use crate::provider::outbound_channel;
    use crate::store::InMemoryInstructionStore;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ProviderClient for CountingClient {
        async fn submit(&self, instruction: &PaymentInstruction) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("ref-{}", instruction.id))
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 6, 30).unwrap()
    }

    #[tokio::test]
    async fn test_workers_submit_and_record_hand_off() {
        let store = Arc::new(InMemoryInstructionStore::new());
        let client = Arc::new(CountingClient::default());
        let (tx, rx) = outbound_channel(8);
        let shutdown = ShutdownSignal::new();
        let dispatcher = Arc::new(
            ProviderDispatcher::new(rx, store.clone(), shutdown.clone())
                .with_client(PaymentProvider::CrossBorder, client.clone()),
        );
        let handles = dispatcher.spawn(2);

        let mut ids = Vec::new();
        for amount in ["1", "2", "3"] {
            let instruction =
                PaymentInstruction::received(incoming("1", amount, "EUR", day()), PaymentProvider::CrossBorder);
            store.store(&instruction).await.unwrap();
            ids.push(instruction.id);
            tx.send(instruction).await.unwrap();
        }

        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while client.calls.load(Ordering::SeqCst) < 3 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        // allow the last update to land
        tokio::time::sleep(Duration::from_millis(20)).await;

        for id in ids {
            let stored = store.get(id).await.unwrap();
            assert_eq!(stored.status, PaymentStatus::SubmittedForProcessing);
            assert_eq!(stored.version, 2);
        }

        shutdown.trigger();
        for handle in handles {
            tokio::time::timeout(Duration::from_secs(1), handle)
                .await
                .unwrap()
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_unrouted_provider_leaves_instruction_received() {
        let store = Arc::new(InMemoryInstructionStore::new());
        let (_tx, rx) = outbound_channel(1);
        let dispatcher = ProviderDispatcher::new(rx, store.clone(), ShutdownSignal::new());

        let instruction =
            PaymentInstruction::received(incoming("1", "1", "ISK", day()), PaymentProvider::Domestic);
        store.store(&instruction).await.unwrap();

        let err = dispatcher.dispatch(&instruction).await.unwrap_err();
        assert!(matches!(err, DispatchError::Provider(ProviderError::Unrouted(_))));
        assert_eq!(store.get(instruction.id).await.unwrap().status, PaymentStatus::Received);
    }

    #[tokio::test]
    async fn test_late_hand_off_after_terminal_is_skipped() {
        let store = Arc::new(InMemoryInstructionStore::new());
        let (_tx, rx) = outbound_channel(1);
        let dispatcher = ProviderDispatcher::new(rx, store.clone(), ShutdownSignal::new())
            .with_client(PaymentProvider::CrossBorder, Arc::new(CountingClient::default()));

        let instruction =
            PaymentInstruction::received(incoming("1", "1", "EUR", day()), PaymentProvider::CrossBorder);
        store.store(&instruction).await.unwrap();
        store
            .update_payment(instruction.id, PaymentStatus::Successful, PaymentEvent::processing_succeeded())
            .await
            .unwrap();

        let outcome = dispatcher.dispatch(&instruction).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::Skipped { status: PaymentStatus::Successful });
    }
}
