//! HTTP provider client: `POST {endpoint}/payments`, answer `{"reference": "..."}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ProviderClient, ProviderError};
use crate::payment::{IncomingInstruction, PaymentId, PaymentInstruction, PaymentProvider};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest<'a> {
    payment_instruction_id: PaymentId,
    payment_provider: PaymentProvider,
    incoming_instruction: &'a IncomingInstruction,
}

#[derive(Deserialize)]
struct SubmitResponse {
    reference: String,
}

pub struct HttpProviderClient {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpProviderClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
    async fn submit(&self, instruction: &PaymentInstruction) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(format!("{}/payments", self.endpoint))
            .json(&SubmitRequest {
                payment_instruction_id: instruction.id,
                payment_provider: instruction.payment_provider,
                incoming_instruction: &instruction.incoming_instruction,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: SubmitResponse = response.json().await?;
        Ok(parsed.reference)
    }
}
