//! Black-box HTTP client for the settlements API, used by end-to-end checks.

use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::payment::{IncomingInstruction, PaymentId, PaymentInstruction, PaymentStatus};
use crate::store::{CurrencyReport, Report};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_POLL_DEADLINE: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Payment {id} not {expected} within {waited:?} (last seen: {last:?})")]
    Timeout {
        id: PaymentId,
        expected: PaymentStatus,
        last: Option<PaymentStatus>,
        waited: Duration,
    },
}

#[derive(Deserialize)]
struct CreatedResponse {
    id: PaymentId,
}

pub struct SettlementsClient {
    base_url: String,
    client: reqwest::Client,
    poll_interval: Duration,
    poll_deadline: Duration,
}

impl SettlementsClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_deadline: DEFAULT_POLL_DEADLINE,
        })
    }

    pub fn with_polling(mut self, interval: Duration, deadline: Duration) -> Self {
        self.poll_interval = interval;
        self.poll_deadline = deadline;
        self
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    pub async fn create_payment(&self, instruction: &IncomingInstruction) -> Result<PaymentId, ClientError> {
        let response = self
            .client
            .post(format!("{}/payments", self.base_url))
            .json(instruction)
            .send()
            .await?;
        let created: CreatedResponse = Self::read(response).await?;
        Ok(created.id)
    }

    pub async fn get_payment(&self, id: PaymentId) -> Result<PaymentInstruction, ClientError> {
        let response = self
            .client
            .get(format!("{}/payments/{}", self.base_url, id))
            .send()
            .await?;
        Self::read(response).await
    }

    pub async fn report(&self, day: NaiveDate) -> Result<Report, ClientError> {
        let response = self
            .client
            .get(format!("{}/payments/report/{}", self.base_url, day.format("%Y-%m-%d")))
            .send()
            .await?;
        Self::read(response).await
    }

    pub async fn currency_report(&self, day: NaiveDate) -> Result<CurrencyReport, ClientError> {
        let response = self
            .client
            .get(format!(
                "{}/payments/currencies-report/{}",
                self.base_url,
                day.format("%Y-%m-%d")
            ))
            .send()
            .await?;
        Self::read(response).await
    }

    pub async fn is_healthy(&self) -> Result<bool, ClientError> {
        let response = self
            .client
            .get(format!("{}/health_check", self.base_url))
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    /// Poll until the payment reaches `expected`. Deadline expiry is an error.
    pub async fn wait_until_payment_is_in_state(
        &self,
        id: PaymentId,
        expected: PaymentStatus,
    ) -> Result<PaymentInstruction, ClientError> {
        let started = tokio::time::Instant::now();
        let deadline = started + self.poll_deadline;
        let mut last = None;
        loop {
            match self.get_payment(id).await {
                Ok(instruction) if instruction.status == expected => return Ok(instruction),
                Ok(instruction) => last = Some(instruction.status),
                // not visible yet
                Err(ClientError::Status { status: 404, .. }) => {}
                Err(e) => return Err(e),
            }
            debug!(payment_id = %id, expected = %expected, last = ?last, "Waiting for payment state");

            if tokio::time::Instant::now() + self.poll_interval > deadline {
                return Err(ClientError::Timeout {
                    id,
                    expected,
                    last,
                    waited: started.elapsed(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
