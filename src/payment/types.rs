//! Payment Core Types
//!
//! `IncomingInstruction` is the normalized, immutable input produced by the UFX
//! decoder or submitted over HTTP. `PaymentInstruction` is the durable aggregate
//! that embeds it together with the append-only event log.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::status::PaymentStatus;

/// Payment instruction identifier (UUID v4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(uuid::Uuid);

impl PaymentId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn inner(&self) -> uuid::Uuid {
        self.0
    }
}

impl Default for PaymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<uuid::Uuid> for PaymentId {
    fn from(id: uuid::Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PaymentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(uuid::Uuid::parse_str(s.trim())?))
    }
}

// ============================================================================
// Incoming instruction
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub country: String,
    pub city: String,
    pub line1: String,
    pub line2: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Account {
    pub account_number: String,
    pub swift: String,
    pub country: String,
    pub swift_reference_number: String,
    pub bank_country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Merchant {
    /// MID: merchant business key within a day
    pub contract_number: String,
    /// Kennitala for Icelandic merchants
    pub reg_number: String,
    pub name: String,
    pub email: String,
    pub address: Address,
    pub account: Account,
    pub high_risk: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Currency {
    pub iso_code: String,
    pub iso_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(default)]
    pub sender: String,
    /// Decimal string, parsed only when summing
    pub amount: String,
    pub currency: Currency,
    #[serde(with = "execution_date")]
    pub execution_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Metadata {
    pub source: String,
    pub file_type: String,
    pub filename: String,
    pub sender: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingInstruction {
    pub merchant: Merchant,
    pub payment: Payment,
    #[serde(default)]
    pub metadata: Metadata,
    /// Empty when absent; the store assigns one
    #[serde(default)]
    pub payment_correlation_id: String,
}

impl IncomingInstruction {
    pub fn duplicate_key(&self) -> DuplicateKey {
        DuplicateKey {
            contract_number: self.merchant.contract_number.clone(),
            account_number: self.merchant.account.account_number.clone(),
            amount: self.payment.amount.trim().to_string(),
            iso_code: self.payment.currency.iso_code.clone(),
            execution_date: self.payment.execution_date,
        }
    }

    /// Currency report key: `EUR` or `EUR_HR` for high-risk merchants
    pub fn currency_report_key(&self) -> String {
        if self.merchant.high_risk {
            format!("{}_HR", self.payment.currency.iso_code)
        } else {
            self.payment.currency.iso_code.clone()
        }
    }
}

/// Business key used for duplicate detection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DuplicateKey {
    pub contract_number: String,
    pub account_number: String,
    pub amount: String,
    pub iso_code: String,
    /// Compared by calendar day
    pub execution_date: NaiveDate,
}

impl fmt::Display for DuplicateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}|{}",
            self.contract_number,
            self.account_number,
            self.amount,
            self.iso_code,
            self.execution_date.format("%Y-%m-%d")
        )
    }
}

// ============================================================================
// Provider routing
// ============================================================================

/// Downstream route for an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentProvider {
    /// Icelandic domestic clearing (ISK from an Icelandic sender)
    Domestic,
    /// Default cross-border route
    CrossBorder,
}

impl PaymentProvider {
    pub fn select(sender: &str, iso_code: &str) -> Self {
        if super::sender::is_icelandic_sender(sender) && super::currency::is_domestic(iso_code) {
            PaymentProvider::Domestic
        } else {
            PaymentProvider::CrossBorder
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentProvider::Domestic => "Domestic",
            PaymentProvider::CrossBorder => "CrossBorder",
        }
    }
}

impl fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Event log
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    Received,
    ValidationFailed,
    SubmittedForProcessing,
    ProcessingSucceeded,
    ProcessingFailed,
    ProcessingRejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reason {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl Reason {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<Reason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<Reason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_reference: Option<String>,
}

/// Append-only log entry. `id` is the dedup key for idempotent updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub created_on: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<EventDetails>,
}

impl PaymentEvent {
    pub fn new(event_type: EventType, details: Option<EventDetails>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type,
            created_on: Utc::now(),
            details,
        }
    }

    /// Replace the generated id with a caller-supplied dedup key
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn received() -> Self {
        Self::new(EventType::Received, None)
    }

    pub fn validation_failed(reason: Reason) -> Self {
        Self::new(
            EventType::ValidationFailed,
            Some(EventDetails {
                rejection_reason: Some(reason),
                ..Default::default()
            }),
        )
    }

    pub fn submitted(provider_reference: impl Into<String>) -> Self {
        Self::new(
            EventType::SubmittedForProcessing,
            Some(EventDetails {
                provider_reference: Some(provider_reference.into()),
                ..Default::default()
            }),
        )
    }

    pub fn processing_succeeded() -> Self {
        Self::new(EventType::ProcessingSucceeded, None)
    }

    pub fn processing_failed(reason: Option<Reason>) -> Self {
        Self::new(
            EventType::ProcessingFailed,
            Some(EventDetails {
                failure_reason: reason,
                ..Default::default()
            }),
        )
    }

    pub fn processing_rejected(reason: Option<Reason>) -> Self {
        Self::new(
            EventType::ProcessingRejected,
            Some(EventDetails {
                rejection_reason: reason,
                ..Default::default()
            }),
        )
    }

    /// Coarse failure tag: rejection code followed by failure code, empty when neither is set
    pub fn failure_reason_code(&self) -> String {
        let Some(details) = &self.details else {
            return String::new();
        };
        let mut code = String::new();
        if let Some(reason) = &details.rejection_reason {
            code.push_str(&reason.code);
        }
        if let Some(reason) = &details.failure_reason {
            code.push_str(&reason.code);
        }
        code
    }
}

// ============================================================================
// Aggregate
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInstruction {
    pub id: PaymentId,
    /// Incremented on every mutation
    pub version: i32,
    pub status: PaymentStatus,
    pub payment_provider: PaymentProvider,
    pub incoming_instruction: IncomingInstruction,
    pub events: Vec<PaymentEvent>,
    pub created_on: DateTime<Utc>,
}

impl PaymentInstruction {
    /// Fresh instruction in `Received`
    pub fn received(incoming: IncomingInstruction, provider: PaymentProvider) -> Self {
        let event = PaymentEvent::received();
        Self {
            id: PaymentId::new(),
            version: 1,
            status: PaymentStatus::Received,
            payment_provider: provider,
            incoming_instruction: incoming,
            created_on: event.created_on,
            events: vec![event],
        }
    }

    /// Fresh instruction that failed synchronous validation
    pub fn rejected(incoming: IncomingInstruction, provider: PaymentProvider, reason: Reason) -> Self {
        let event = PaymentEvent::validation_failed(reason);
        Self {
            id: PaymentId::new(),
            version: 1,
            status: PaymentStatus::Rejected,
            payment_provider: provider,
            incoming_instruction: incoming,
            created_on: event.created_on,
            events: vec![event],
        }
    }

    pub fn duplicate_key(&self) -> DuplicateKey {
        self.incoming_instruction.duplicate_key()
    }

    pub fn has_event(&self, event_id: &str) -> bool {
        self.events.iter().any(|e| e.id == event_id)
    }

    /// Append `event` and move to `status`. Returns false (and changes nothing)
    /// when the event was already applied or the transition is not allowed.
    pub fn apply(&mut self, status: PaymentStatus, event: PaymentEvent) -> bool {
        if self.has_event(&event.id) || !self.status.can_transition_to(status) {
            return false;
        }
        self.events.push(event);
        self.status = status;
        self.version += 1;
        true
    }

    /// Failure tag computed from the most recent event
    pub fn domain_failure_reason_code(&self) -> String {
        self.events
            .last()
            .map(PaymentEvent::failure_reason_code)
            .unwrap_or_default()
    }

    pub fn execution_date(&self) -> NaiveDate {
        self.incoming_instruction.payment.execution_date
    }
}

/// `executionDate` is day precision. Accepts `YYYY-MM-DD` or an RFC 3339
/// timestamp (normalized to its UTC calendar day); always writes `YYYY-MM-DD`.
pub mod execution_date {
    use chrono::{DateTime, NaiveDate, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn parse(raw: &str) -> Result<NaiveDate, String> {
        let raw = raw.trim();
        if let Ok(date) = NaiveDate::parse_from_str(raw, FORMAT) {
            return Ok(date);
        }
        DateTime::parse_from_rfc3339(raw)
            .map(|ts| ts.with_timezone(&Utc).date_naive())
            .map_err(|_| format!("invalid executionDate: {:?}", raw))
    }

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}
