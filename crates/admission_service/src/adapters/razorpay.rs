use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use admission_core::models::PaymentOrder;

use crate::config::RazorpaySettings;
use crate::ports::{PaymentProvider, ProviderError};

/// Orders API client, authenticated with the key id and secret.
#[derive(Clone)]
pub struct RazorpayClient {
    http: Client,
    api_base: String,
    key_id: String,
    secret: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

impl RazorpayClient {
    pub fn new(settings: &RazorpaySettings) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| ProviderError(e.to_string()))?;
        Ok(Self {
            http,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            key_id: settings.key_id.clone(),
            secret: settings.secret.clone(),
        })
    }

    async fn decode(response: Response) -> Result<PaymentOrder, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<PaymentOrder>()
                .await
                .map_err(|e| ProviderError(format!("unreadable order: {e}")));
        }
        let text = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| format!("{}: {}", b.error.code, b.error.description))
            .unwrap_or(text);
        Err(ProviderError(format!("provider returned {status}: {detail}")))
    }
}

#[async_trait]
impl PaymentProvider for RazorpayClient {
    fn backend_tag(&self) -> &'static str {
        "razorpay"
    }

    async fn create_order(&self, amount_minor: i64, currency: &str, receipt: &str) -> Result<PaymentOrder, ProviderError> {
        debug!(amount_minor, currency, receipt, "creating order");
        let response = self
            .http
            .post(format!("{}/orders", self.api_base))
            .basic_auth(&self.key_id, Some(&self.secret))
            .json(&json!({
                "amount": amount_minor,
                "currency": currency,
                "receipt": receipt,
            }))
            .send()
            .await
            .map_err(|e| ProviderError(e.to_string()))?;
        Self::decode(response).await
    }

    async fn fetch_order(&self, order_id: &str) -> Result<PaymentOrder, ProviderError> {
        let response = self
            .http
            .get(format!("{}/orders/{}", self.api_base, order_id))
            .basic_auth(&self.key_id, Some(&self.secret))
            .send()
            .await
            .map_err(|e| ProviderError(e.to_string()))?;
        Self::decode(response).await
    }
}
