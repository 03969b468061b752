use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use super::{FundingApi, FundingError};

/// Forwards sufficiency questions to the funding API. No caching: every
/// batch sees the balance as of its own check.
#[derive(Clone)]
pub struct BalanceGate {
    api: Arc<dyn FundingApi>,
}

impl BalanceGate {
    pub fn new(api: Arc<dyn FundingApi>) -> Self {
        Self { api }
    }

    pub async fn has_balance(
        &self,
        currency: &str,
        amount: Decimal,
        high_risk: bool,
    ) -> Result<bool, FundingError> {
        let has_balance = self.api.has_balance(currency, amount, high_risk).await?;
        debug!(currency, %amount, high_risk, has_balance, "Balance checked");
        Ok(has_balance)
    }
}
