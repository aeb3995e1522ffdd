//! Outbound notification collaborator.

use std::time::Duration;

use async_trait::async_trait;
use fr_core::config::TelegramSettings;
use fr_core::error::{RelayError, RelayResult};
use serde::Serialize;
use tracing::debug;

const TELEGRAM_API: &str = "https://api.telegram.org";
const SEND_TIMEOUT: Duration = Duration::from_secs(15);

/// Delivers one formatted message. A failed delivery is an `Err`; callers
/// log it and move on, there is no retry.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> RelayResult<()>;
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_thread_id: Option<i64>,
}

/// Telegram Bot API `sendMessage` in HTML parse mode.
pub struct TelegramNotifier {
    http: reqwest::Client,
    url: String,
    chat_id: String,
    thread_id: Option<i64>,
}

impl TelegramNotifier {
    pub fn new(settings: &TelegramSettings) -> RelayResult<Self> {
        Self::with_base_url(settings, TELEGRAM_API)
    }

    /// Same as [`new`](Self::new) against another Bot API host.
    pub fn with_base_url(settings: &TelegramSettings, base_url: &str) -> RelayResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| RelayError::Notify(format!("building http client: {e}")))?;
        Ok(Self {
            http,
            url: format!("{}/bot{}/sendMessage", base_url.trim_end_matches('/'), settings.bot_token),
            chat_id: settings.chat_id.clone(),
            thread_id: settings.thread_id,
        })
    }

    fn payload<'a>(&'a self, text: &'a str) -> SendMessage<'a> {
        SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
            message_thread_id: self.thread_id,
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> RelayResult<()> {
        let resp = self
            .http
            .post(&self.url)
            .json(&self.payload(text))
            .send()
            .await
            // reqwest errors can embed the URL, which carries the bot token
            .map_err(|e| RelayError::Notify(format!("sendMessage: {}", e.without_url())))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RelayError::Notify(format!("sendMessage {status}: {body}")));
        }
        debug!("[telegram] delivered {} bytes", text.len());
        Ok(())
    }
}
