//! Payment Instruction Domain
//!
//! Value types shared by every component: the normalized input, the durable
//! aggregate with its append-only event log, the status machine and the
//! error taxonomy.
//!
//! # Invariants
//!
//! 1. `version` starts at 1 and grows by exactly one per applied update
//! 2. `status` is a function of the last state-changing event
//! 3. At most one instruction per duplicate key is outside Failed/Rejected
//! 4. Events are never reordered or mutated

pub mod currency;
pub mod error;
pub mod sender;
pub mod status;
pub mod types;

pub use error::PaymentError;
pub use status::PaymentStatus;
pub use types::{
    Account, Address, Currency, DuplicateKey, EventDetails, EventType, IncomingInstruction,
    Merchant, Metadata, Payment, PaymentEvent, PaymentId, PaymentInstruction, PaymentProvider,
    Reason,
};
