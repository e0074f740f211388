//! Telegram messaging channel
//!
//! Polls `getUpdates` without long-poll waiting so the daemon tick stays
//! short, and replies with `sendMessage`. A member's address is their
//! Telegram user id; in a private chat that is also the chat id.
//!
//! The update id is the message id exposed to the orchestrator. Passing
//! `offset = cursor + 1` confirms everything up to the cursor to Telegram,
//! so updates are only dropped server side after the daemon persisted them
//! as handled.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use sdk::collaborators::MessageChannel;
use sdk::errors::EngineError;
use sdk::types::IncomingMessage;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error, warn};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Telegram rejects longer texts
const MAX_MESSAGE_CHARS: usize = 4096;

#[derive(Clone)]
pub struct TelegramChannel {
    api_base: String,
    token: String,
    client: Client,
}

impl std::fmt::Debug for TelegramChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramChannel")
            .field("api_base", &self.api_base)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Deserialize, Debug)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Deserialize, Debug)]
struct Message {
    date: i64,
    text: Option<String>,
    from: Option<User>,
}

#[derive(Deserialize, Debug)]
struct User {
    id: i64,
}

#[derive(Deserialize, Debug)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl TelegramChannel {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, EngineError> {
        let mut query = vec![("timeout", "0".to_string())];
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }

        let response = self
            .client
            .get(self.method_url("getUpdates"))
            .query(&query)
            .send()
            .await
            .map_err(|e| EngineError::Transport(format!("getUpdates failed: {}", e.without_url())))?
            .json::<ApiResponse<Vec<Update>>>()
            .await
            .map_err(|e| EngineError::Transport(format!("Invalid getUpdates response: {}", e.without_url())))?;

        if !response.ok {
            return Err(EngineError::Transport(format!(
                "Telegram API returned ok=false: {}",
                response.description.unwrap_or_default()
            )));
        }

        Ok(response.result.unwrap_or_default())
    }

    async fn send_chunk(&self, chat_id: &str, text: &str) -> Result<(), EngineError> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await
            .map_err(|e| EngineError::Transport(format!("sendMessage failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Transport(format!(
                "sendMessage returned {}: {}",
                status, body
            )));
        }
        Ok(())
    }
}

/// Split text into pieces Telegram accepts, preferring line breaks
pub fn split_message(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for line in text.split_inclusive('\n') {
        let line_chars = line.chars().count();
        if current_chars + line_chars > MAX_MESSAGE_CHARS && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        if line_chars > MAX_MESSAGE_CHARS {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(MAX_MESSAGE_CHARS) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }
        current.push_str(line);
        current_chars += line_chars;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl MessageChannel for TelegramChannel {
    async fn poll_new(&self, cursor: Option<i64>) -> Result<Vec<IncomingMessage>, EngineError> {
        let updates = self.get_updates(cursor.map(|id| id + 1)).await?;

        let mut messages = Vec::with_capacity(updates.len());
        for update in updates {
            if cursor.is_some_and(|c| update.update_id <= c) {
                continue;
            }
            let Some(message) = update.message else {
                debug!(update_id = update.update_id, "Skipping non-message update");
                continue;
            };
            let (Some(text), Some(from)) = (message.text, message.from) else {
                debug!(update_id = update.update_id, "Skipping message without text or sender");
                continue;
            };

            messages.push(IncomingMessage {
                id: update.update_id,
                sender: from.id.to_string(),
                text,
                received_at: DateTime::<Utc>::from_timestamp(message.date, 0)
                    .unwrap_or_else(Utc::now),
            });
        }

        messages.sort_by_key(|message| message.id);
        Ok(messages)
    }

    async fn send(&self, recipient: &str, text: &str) -> bool {
        if text.trim().is_empty() {
            warn!(recipient, "Refusing to send empty message");
            return false;
        }

        for chunk in split_message(text) {
            if let Err(e) = self.send_chunk(recipient, &chunk).await {
                error!(recipient, "Failed to send Telegram message: {}", e);
                return false;
            }
        }
        true
    }
}
