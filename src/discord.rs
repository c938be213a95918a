use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use tracing::debug;

use crate::render::Announcement;

const DISCORD_API_BASE: &str = "https://discord.com/api/v10/";

/// Channel types that accept plain messages: guild text, DM, group DM,
/// announcement, and the thread variants.
const TEXT_CAPABLE_TYPES: &[u8] = &[0, 1, 3, 5, 10, 11, 12];

/// The slice of a channel object the bot cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
}

impl ChannelInfo {
    pub fn is_text_capable(&self) -> bool {
        TEXT_CAPABLE_TYPES.contains(&self.kind)
    }
}

#[derive(Clone)]
pub struct DiscordClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl fmt::Debug for DiscordClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Write side of the bot: resolve the destination and post into it.
#[async_trait]
pub trait ChannelSink: Send + Sync {
    async fn resolve_channel(&self, channel_id: &str) -> Result<ChannelInfo>;

    async fn send_announcement(
        &self,
        channel_id: &str,
        announcement: &Announcement,
    ) -> Result<()>;
}

impl DiscordClient {
    pub fn new(token: String) -> Self {
        let base_url = Url::parse(DISCORD_API_BASE).expect("valid default Discord URL");
        Self::with_base_url(token, base_url)
    }

    pub fn with_base_url(token: String, base_url: Url) -> Self {
        let http = Client::builder()
            .user_agent("release-watchbot/0.1")
            .no_proxy()
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url,
            token,
        }
    }

    pub fn build_channel_request(&self, channel_id: &str) -> Result<reqwest::Request> {
        let endpoint = self
            .base_url
            .join(&format!("channels/{}", channel_id))
            .context("invalid Discord base URL")?;
        self.http
            .get(endpoint)
            .header("Authorization", format!("Bot {}", self.token))
            .build()
            .context("failed to build Discord channel request")
    }

    pub fn build_send_request(&self, channel_id: &str, body: &Value) -> Result<reqwest::Request> {
        let endpoint = self
            .base_url
            .join(&format!("channels/{}/messages", channel_id))
            .context("invalid Discord base URL")?;
        self.http
            .post(endpoint)
            .header("Authorization", format!("Bot {}", self.token))
            .header("Content-Type", "application/json")
            .json(body)
            .build()
            .context("failed to build Discord message request")
    }

    async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response> {
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach Discord")?;

        if res.status() == StatusCode::TOO_MANY_REQUESTS {
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("received 429 from Discord: {}", body));
        }
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("discord error {}: {}", status, body));
        }
        Ok(res)
    }
}

#[async_trait]
impl ChannelSink for DiscordClient {
    async fn resolve_channel(&self, channel_id: &str) -> Result<ChannelInfo> {
        let request = self.build_channel_request(channel_id)?;
        debug!(url=%request.url(), "resolving channel");
        let res = self.execute(request).await?;
        res.json().await.context("invalid Discord channel response")
    }

    async fn send_announcement(
        &self,
        channel_id: &str,
        announcement: &Announcement,
    ) -> Result<()> {
        let body = build_message_request(announcement);
        let request = self.build_send_request(channel_id, &body)?;
        debug!(url=%request.url(), payload=%body, "sending announcement");
        self.execute(request).await?;
        Ok(())
    }
}

/// Message payload: one content line plus one rich embed.
pub fn build_message_request(announcement: &Announcement) -> Value {
    json!({
        "content": announcement.content,
        "embeds": [
            {
                "title": announcement.title,
                "url": announcement.url,
                "description": announcement.description,
                "color": announcement.color,
            }
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RELEASE_COLOR;

    fn sample_announcement() -> Announcement {
        Announcement {
            content: "New release of acme/widget published!".into(),
            title: "v1.2.0".into(),
            url: "https://github.com/acme/widget/releases/tag/v1.2.0".into(),
            description: "notes".into(),
            color: RELEASE_COLOR,
        }
    }

    #[test]
    fn build_message_request_includes_embed_fields() {
        let body = build_message_request(&sample_announcement());
        assert_eq!(body["content"], "New release of acme/widget published!");
        assert_eq!(body["embeds"][0]["title"], "v1.2.0");
        assert_eq!(
            body["embeds"][0]["url"],
            "https://github.com/acme/widget/releases/tag/v1.2.0"
        );
        assert_eq!(body["embeds"][0]["description"], "notes");
        assert_eq!(body["embeds"][0]["color"], RELEASE_COLOR);
    }

    #[test]
    fn build_send_request_sets_headers() {
        let client = DiscordClient::new("token".into());
        let body = build_message_request(&sample_announcement());
        let request = client.build_send_request("123", &body).unwrap();
        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().path(), "/api/v10/channels/123/messages");
        assert_eq!(
            request
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .unwrap(),
            "Bot token"
        );
    }

    #[test]
    fn build_channel_request_targets_channel() {
        let client = DiscordClient::new("token".into());
        let request = client.build_channel_request("123").unwrap();
        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.url().path(), "/api/v10/channels/123");
    }

    #[test]
    fn text_capability_by_channel_type() {
        let text = ChannelInfo {
            id: "1".into(),
            kind: 0,
        };
        let voice = ChannelInfo {
            id: "2".into(),
            kind: 2,
        };
        let announcement = ChannelInfo {
            id: "3".into(),
            kind: 5,
        };
        assert!(text.is_text_capable());
        assert!(!voice.is_text_capable());
        assert!(announcement.is_text_capable());
    }

    #[test]
    fn channel_info_deserializes_type_field() {
        let info: ChannelInfo = serde_json::from_str(r#"{"id":"42","type":5}"#).unwrap();
        assert_eq!(info.id, "42");
        assert_eq!(info.kind, 5);
    }
}
