//! Telegram Bot API delivery channel.
//!
//! Maps HTTP results onto the pipeline's typed outcomes: 429 becomes a
//! rate-limit signal carrying Telegram's own retry_after, transport errors
//! are transient, anything else non-success is permanent for this message.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use newsroom_pipeline::{DeliveryChannel, DeliveryOutcome};

const SEND_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RETRY_AFTER_SECS: u64 = 30;

pub struct TelegramChannel {
    api_base: String,
    http: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(bot_token: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(SEND_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            api_base: format!("https://api.telegram.org/bot{bot_token}"),
            http,
        })
    }

    fn retry_after(body: &serde_json::Value) -> Duration {
        body.pointer("/parameters/retry_after")
            .and_then(|v| v.as_u64())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_RETRY_AFTER_SECS))
    }
}

#[async_trait]
impl DeliveryChannel for TelegramChannel {
    async fn deliver(&self, target: &str, text: &str) -> DeliveryOutcome {
        let payload = json!({
            "chat_id": target,
            "text": text,
            "disable_web_page_preview": true,
        });

        let resp = match self
            .http
            .post(format!("{}/sendMessage", self.api_base))
            .json(&payload)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => return DeliveryOutcome::Transient(e.to_string()),
        };

        let status = resp.status();
        if status.is_success() {
            return DeliveryOutcome::Delivered;
        }

        let body: serde_json::Value = resp.json().await.unwrap_or_default();
        if status.as_u16() == 429 {
            return DeliveryOutcome::RateLimited {
                retry_after: Self::retry_after(&body),
            };
        }

        let description = body
            .get("description")
            .and_then(|d| d.as_str())
            .unwrap_or("no description");
        warn!(status = %status, description, "Telegram send rejected");
        DeliveryOutcome::Permanent(format!("{status}: {description}"))
    }
}
