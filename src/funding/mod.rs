//! Funding account balance checks
//!
//! Before a batch is dispatched, the listener asks whether the funding
//! account of each non-domestic currency covers the batch's aggregate debit.

pub mod error;
pub mod gate;
pub mod http;

pub use error::FundingError;
pub use gate::BalanceGate;
pub use http::HttpFundingApi;

use async_trait::async_trait;
use rust_decimal::Decimal;

#[async_trait]
pub trait FundingApi: Send + Sync {
    async fn has_balance(
        &self,
        currency: &str,
        amount: Decimal,
        high_risk: bool,
    ) -> Result<bool, FundingError>;
}
