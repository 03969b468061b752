//! HTTP funding API client.
//!
//! `GET {endpoint}/balance/{currency}?amount=<decimal>&highRisk=<bool>`
//! answers `{"hasBalance": true|false}`. Connection failures, timeouts and
//! 503 map to `FundingError::Unavailable`.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{FundingApi, FundingError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceResponse {
    has_balance: bool,
}

pub struct HttpFundingApi {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpFundingApi {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, FundingError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl FundingApi for HttpFundingApi {
    async fn has_balance(
        &self,
        currency: &str,
        amount: Decimal,
        high_risk: bool,
    ) -> Result<bool, FundingError> {
        let url = format!("{}/balance/{}", self.endpoint, currency);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("amount", amount.to_string()),
                ("highRisk", high_risk.to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    FundingError::Unavailable(e.to_string())
                } else {
                    FundingError::Http(e)
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return Err(FundingError::Unavailable(format!("{} answered 503", url)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FundingError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: BalanceResponse = response.json().await?;
        Ok(parsed.has_balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::collections::HashMap;
    use std::str::FromStr;

    async fn balance(
        Path(currency): Path<String>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Result<Json<serde_json::Value>, StatusCode> {
        match currency.as_str() {
            "GBP" => return Err(StatusCode::SERVICE_UNAVAILABLE),
            "SEK" => return Err(StatusCode::INTERNAL_SERVER_ERROR),
            _ => {}
        }
        let amount = Decimal::from_str(&params["amount"]).map_err(|_| StatusCode::BAD_REQUEST)?;
        let high_risk = params["highRisk"] == "true";
        // high-risk accounts hold less
        let limit = if high_risk { Decimal::from(100) } else { Decimal::from(1000) };
        Ok(Json(serde_json::json!({ "hasBalance": amount <= limit })))
    }

    async fn serve() -> String {
        let app = Router::new().route("/balance/{currency}", get(balance));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_has_balance_over_http() {
        let api = HttpFundingApi::new(serve().await, Duration::from_secs(2)).unwrap();

        assert!(api.has_balance("EUR", Decimal::from(500), false).await.unwrap());
        assert!(!api.has_balance("EUR", Decimal::from(500), true).await.unwrap());
        assert!(!api.has_balance("USD", Decimal::from(5000), false).await.unwrap());

        let err = api.has_balance("GBP", Decimal::ONE, false).await.unwrap_err();
        assert!(matches!(err, FundingError::Unavailable(_)));
        let err = api.has_balance("SEK", Decimal::ONE, false).await.unwrap_err();
        assert!(matches!(err, FundingError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        let api = HttpFundingApi::new("http://127.0.0.1:1", Duration::from_millis(500)).unwrap();
        let err = api.has_balance("EUR", Decimal::ONE, false).await.unwrap_err();
        assert!(matches!(err, FundingError::Unavailable(_)), "{err:?}");
    }
}
