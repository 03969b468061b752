//! Shared fixtures for the black-box tests: UFX builders, a scripted funding
//! API and an in-memory wiring of the whole ingestion path.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use settlements_processor::feature_flags::StaticFeatureFlags;
use settlements_processor::funding::{BalanceGate, FundingApi, FundingError};
use settlements_processor::health::{HealthSweeper, QueueHealth, StoreHealth};
use settlements_processor::listener::{FileListener, IngestionPipeline, ListenerConfig};
use settlements_processor::payment::{
    Account, Currency, IncomingInstruction, Merchant, Metadata, Payment,
};
use settlements_processor::provider::{OutboundReceiver, outbound_channel};
use settlements_processor::queue::{InMemoryQueue, MessageQueue};
use settlements_processor::replay::ReplayService;
use settlements_processor::shutdown::ShutdownSignal;
use settlements_processor::storage::{InMemoryObjectStore, ObjectStore};
use settlements_processor::store::{InMemoryInstructionStore, InstructionStore};
use settlements_processor::usecase::MakePayment;

pub const S1_FILE: &str = "OIC_Documents_SAXO_BORGUN_20210630_1";
pub const VALID_IBAN: &str = "IS140159260076545510730339";

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 6, 30).unwrap()
}

// ----------------------------------------------------------------------------
// UFX
// ----------------------------------------------------------------------------

pub fn ufx_doc(mid: &str, currency: &str, amount: &str, parms: &[(&str, &str)]) -> String {
    ufx_doc_on(mid, currency, amount, "2021-06-30", parms)
}

pub fn ufx_doc_on(
    mid: &str,
    currency: &str,
    amount: &str,
    phase_date: &str,
    parms: &[(&str, &str)],
) -> String {
    let parms: String = parms
        .iter()
        .map(|(code, value)| format!("<Parm><ParmCode>{code}</ParmCode><Value>{value}</Value></Parm>"))
        .collect();
    format!(
        r#"
    <Doc>
        <Originator><ContractNumber>{mid}</ContractNumber></Originator>
        <ContractFor><Client><ClientInfo><RegNumber>4000000000</RegNumber></ClientInfo></Client></ContractFor>
        <Transaction><Extra><AddData>{parms}</AddData></Extra></Transaction>
        <Billing><PhaseDate>{phase_date}</PhaseDate><Currency>{currency}</Currency><Amount>{amount}</Amount></Billing>
    </Doc>"#
    )
}

pub fn ufx_file(sender: &str, docs: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<DocFile>
    <FileHeader><Sender>{sender}</Sender><FileDate>2021-06-30</FileDate></FileHeader>
    <DocList>{}</DocList>
    <FileTrailer><CheckSum>{}</CheckSum></FileTrailer>
</DocFile>"#,
        docs.concat(),
        docs.len()
    )
}

pub fn envelope(key: &str) -> String {
    serde_json::json!({ "Records": [ { "s3": { "object": { "key": key } } } ] }).to_string()
}

// ----------------------------------------------------------------------------
// Instructions
// ----------------------------------------------------------------------------

pub fn incoming(mid: &str, amount: &str, iso_code: &str) -> IncomingInstruction {
    IncomingInstruction {
        merchant: Merchant {
            contract_number: mid.to_string(),
            reg_number: "4000000000".to_string(),
            name: "Merchant ApS".to_string(),
            account: Account {
                account_number: VALID_IBAN.to_string(),
                swift: "SAXODKKK".to_string(),
                ..Default::default()
            },
            ..Default::default()
        },
        payment: Payment {
            sender: "SAXO".to_string(),
            amount: amount.to_string(),
            currency: Currency {
                iso_code: iso_code.to_string(),
                iso_number: String::new(),
            },
            execution_date: day(),
        },
        metadata: Metadata {
            source: "api".to_string(),
            sender: "SAXO".to_string(),
            ..Default::default()
        },
        payment_correlation_id: String::new(),
    }
}

// ----------------------------------------------------------------------------
// Funding API
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundingMode {
    Sufficient,
    Insufficient,
    Unavailable,
}

/// Scripted funding API that records every question it is asked
pub struct MockFunding {
    mode: Mutex<FundingMode>,
    calls: Mutex<Vec<(String, Decimal, bool)>>,
}

impl MockFunding {
    pub fn new(mode: FundingMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_mode(&self, mode: FundingMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn calls(&self) -> Vec<(String, Decimal, bool)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FundingApi for MockFunding {
    async fn has_balance(
        &self,
        currency: &str,
        amount: Decimal,
        high_risk: bool,
    ) -> Result<bool, FundingError> {
        self.calls
            .lock()
            .unwrap()
            .push((currency.to_string(), amount, high_risk));
        match *self.mode.lock().unwrap() {
            FundingMode::Sufficient => Ok(true),
            FundingMode::Insufficient => Ok(false),
            FundingMode::Unavailable => Err(FundingError::Unavailable("connection refused".into())),
        }
    }
}

// ----------------------------------------------------------------------------
// Harness
// ----------------------------------------------------------------------------

/// Everything between the notification queue and the provider channel, in memory
pub struct Harness {
    pub store: Arc<InMemoryInstructionStore>,
    pub notifications: Arc<InMemoryQueue>,
    pub dead_letters: Arc<InMemoryQueue>,
    pub objects: Arc<InMemoryObjectStore>,
    pub funding: Arc<MockFunding>,
    pub make_payment: Arc<MakePayment>,
    pub pipeline: Arc<IngestionPipeline>,
    pub replay: Arc<ReplayService>,
    pub flags: Arc<StaticFeatureFlags>,
    pub shutdown: ShutdownSignal,
    /// Provider side of the outbound channel; nothing drains it unless a test does
    pub outbound: OutboundReceiver,
}

impl Harness {
    pub fn new(mode: FundingMode) -> Self {
        let store = Arc::new(InMemoryInstructionStore::new());
        let funding = Arc::new(MockFunding::new(mode));
        let objects = Arc::new(InMemoryObjectStore::new());
        let (tx, outbound) = outbound_channel(1024);
        let make_payment = Arc::new(MakePayment::new(store.clone(), tx));
        let pipeline = Arc::new(IngestionPipeline::new(
            BalanceGate::new(funding.clone()),
            make_payment.clone(),
        ));
        let replay = Arc::new(ReplayService::new(objects.clone(), pipeline.clone()));
        Self {
            store,
            notifications: Arc::new(InMemoryQueue::new("ufx-notifications")),
            dead_letters: Arc::new(InMemoryQueue::new("ufx-notifications-dlq")),
            objects,
            funding,
            make_payment,
            pipeline,
            replay,
            flags: Arc::new(StaticFeatureFlags::new(true)),
            shutdown: ShutdownSignal::new(),
            outbound,
        }
    }

    pub fn listener(&self, config: ListenerConfig) -> FileListener {
        FileListener::new(
            self.notifications.clone(),
            self.dead_letters.clone(),
            self.objects.clone(),
            self.pipeline.clone(),
            self.flags.clone(),
            config,
            self.shutdown.clone(),
        )
    }

    pub fn sweeper(&self) -> HealthSweeper {
        HealthSweeper::new(
            std::time::Duration::from_millis(50),
            std::time::Duration::from_millis(100),
        )
        .register(Arc::new(StoreHealth(self.store.clone())))
        .register(Arc::new(QueueHealth(self.notifications.clone())))
        .register(Arc::new(QueueHealth(self.dead_letters.clone())))
    }

    pub async fn put_file(&self, key: &str, xml: &str) {
        self.objects.put(key, xml.as_bytes()).await.unwrap();
    }

    pub async fn notify(&self, key: &str) -> String {
        self.notifications.send(&envelope(key)).await.unwrap()
    }

    /// Instructions handed to the provider channel so far
    pub async fn drain_outbound(&self) -> Vec<settlements_processor::PaymentInstruction> {
        let mut out = Vec::new();
        while let Ok(Some(instruction)) = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            self.outbound.recv(),
        )
        .await
        {
            out.push(instruction);
        }
        out
    }

    pub fn store_dyn(&self) -> Arc<dyn InstructionStore> {
        self.store.clone()
    }
}
