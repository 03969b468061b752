use std::collections::HashMap;
use std::sync::Arc;

use crate::health::HealthHandle;
use crate::queue::MessageQueue;
use crate::replay::ReplayService;
use crate::reporting::ReportingQuery;
use crate::store::InstructionStore;
use crate::usecase::MakePayment;

/// Shared gateway state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn InstructionStore>,
    pub reporting: ReportingQuery,
    pub make_payment: Arc<MakePayment>,
    pub replay: Arc<ReplayService>,
    /// Dead-letter queues inspectable through the internal endpoint, by name
    pub dead_letter_queues: HashMap<String, Arc<dyn MessageQueue>>,
    pub health: HealthHandle,
}

impl AppState {
    pub fn new(
        store: Arc<dyn InstructionStore>,
        make_payment: Arc<MakePayment>,
        replay: Arc<ReplayService>,
        health: HealthHandle,
    ) -> Self {
        Self {
            reporting: ReportingQuery::new(store.clone()),
            store,
            make_payment,
            replay,
            dead_letter_queues: HashMap::new(),
            health,
        }
    }

    pub fn with_dead_letter_queue(mut self, queue: Arc<dyn MessageQueue>) -> Self {
        self.dead_letter_queues
            .insert(queue.name().to_string(), queue);
        self
    }
}
