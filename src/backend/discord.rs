//! Discord REST backend.
//!
//! Each blob becomes a message with a single attachment in a text channel.
//! The locator is the message's web link:
//!
//! ```text
//! https://discord.com/channels/{guild_id}/{channel_id}/{message_id}
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, RETRY_AFTER};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tokio::sync::Mutex;
use url::Url;

use super::{Attachment, BackendError, LocatorBackend};
use crate::config::DiscordConfig;

/// Host used in message links.
const LINK_HOST: &str = "discord.com";

/// Guild segment Discord uses for channels outside a guild.
const DIRECT_GUILD: &str = "@me";

/// User agent sent with every API call.
const USER_AGENT: &str = concat!("DiscordBot (dspace, ", env!("CARGO_PKG_VERSION"), ")");

/// Longest response body kept in error messages.
const MAX_ERROR_BODY: usize = 512;

/// Parsed message link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscordLocator {
    /// Guild id, or `@me` for direct channels.
    pub guild_id: String,
    /// Channel id.
    pub channel_id: String,
    /// Message id.
    pub message_id: String,
}

impl fmt::Display for DiscordLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "https://{LINK_HOST}/channels/{}/{}/{}",
            self.guild_id, self.channel_id, self.message_id
        )
    }
}

impl FromStr for DiscordLocator {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BackendError::InvalidLocator(s.to_string());

        let url = Url::parse(s).map_err(|_| invalid())?;
        if url.host_str() != Some(LINK_HOST) {
            return Err(invalid());
        }

        let segments: Vec<&str> = url.path_segments().ok_or_else(invalid)?.collect();
        let [kind, guild_id, channel_id, message_id] = segments.as_slice() else {
            return Err(invalid());
        };

        let is_snowflake = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if *kind != "channels"
            || !(is_snowflake(*guild_id) || *guild_id == DIRECT_GUILD)
            || !is_snowflake(*channel_id)
            || !is_snowflake(*message_id)
        {
            return Err(invalid());
        }

        Ok(Self {
            guild_id: guild_id.to_string(),
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
        })
    }
}

/// The bot account behind the token.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUser {
    /// User id.
    pub id: String,
    /// Username.
    pub username: String,
}

#[derive(Debug, Deserialize)]
struct Channel {
    guild_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Message {
    id: String,
    channel_id: String,
    #[serde(default)]
    attachments: Vec<MessageAttachment>,
}

#[derive(Debug, Deserialize)]
struct MessageAttachment {
    filename: String,
    url: String,
}

/// Backend that stores blobs as Discord message attachments.
pub struct DiscordBackend {
    client: Client,
    api_base: String,
    token: String,
    /// Guild id per channel id, filled on first send to a channel.
    guilds: Mutex<HashMap<String, String>>,
}

impl DiscordBackend {
    /// Create a backend from configuration.
    pub fn new(config: &DiscordConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            api_base: format!(
                "{}/v{}",
                config.api_base.trim_end_matches('/'),
                config.api_version
            ),
            token: config.token.clone(),
            guilds: Mutex::new(HashMap::new()),
        })
    }

    /// Establish the session, retrying until the token is accepted.
    ///
    /// The delay is multiplied by `coefficient` before every wait and never
    /// capped. This is the session policy; chunk transfers use the bounded
    /// fixed-delay retry in the transfer engine instead.
    pub async fn login(&self, initial_backoff: Duration, coefficient: f64) -> CurrentUser {
        let mut backoff = initial_backoff;
        loop {
            tracing::info!("Attempting to log in...");
            match self.current_user().await {
                Ok(user) => {
                    tracing::info!(user = %user.username, "Logged in successfully");
                    return user;
                }
                Err(e) => {
                    backoff = backoff.mul_f64(coefficient);
                    tracing::error!(error = %e, retry_in = ?backoff, "Could not log in");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    /// Fetch the bot account behind the token.
    pub async fn current_user(&self) -> Result<CurrentUser, BackendError> {
        let response = self
            .client
            .get(format!("{}/users/@me", self.api_base))
            .header(AUTHORIZATION, self.auth_header())
            .send()
            .await?;

        Self::json(response).await
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    async fn guild_id(&self, channel_id: &str) -> Result<String, BackendError> {
        if let Some(guild) = self.guilds.lock().await.get(channel_id) {
            return Ok(guild.clone());
        }

        let response = self
            .client
            .get(format!("{}/channels/{channel_id}", self.api_base))
            .header(AUTHORIZATION, self.auth_header())
            .send()
            .await?;
        let channel: Channel = Self::json(response).await?;
        let guild = channel
            .guild_id
            .unwrap_or_else(|| DIRECT_GUILD.to_string());

        self.guilds
            .lock()
            .await
            .insert(channel_id.to_string(), guild.clone());
        Ok(guild)
    }

    async fn message(&self, locator: &DiscordLocator) -> Result<Message, BackendError> {
        let response = self
            .client
            .get(format!(
                "{}/channels/{}/messages/{}",
                self.api_base, locator.channel_id, locator.message_id
            ))
            .header(AUTHORIZATION, self.auth_header())
            .send()
            .await?;

        Self::json(response).await
    }

    /// Turn non-success statuses into errors.
    async fn check(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .map(Duration::from_secs_f64);
            return Err(BackendError::RateLimited { retry_after });
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }

        Err(BackendError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        let response = Self::check(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode(e.to_string()))
    }
}

#[async_trait]
impl LocatorBackend for DiscordBackend {
    fn name(&self) -> &str {
        "discord"
    }

    async fn send(
        &self,
        destination: &str,
        data: Bytes,
        name: &str,
    ) -> Result<String, BackendError> {
        let guild_id = self.guild_id(destination).await?;

        let payload = serde_json::json!({
            "attachments": [{ "id": 0, "filename": name }]
        });
        let length = data.len() as u64;
        let part = Part::stream_with_length(data, length).file_name(name.to_string());
        let form = Form::new()
            .text("payload_json", payload.to_string())
            .part("files[0]", part);

        let response = self
            .client
            .post(format!("{}/channels/{destination}/messages", self.api_base))
            .header(AUTHORIZATION, self.auth_header())
            .multipart(form)
            .send()
            .await?;
        let message: Message = Self::json(response).await?;

        let locator = DiscordLocator {
            guild_id,
            channel_id: message.channel_id,
            message_id: message.id,
        };
        Ok(locator.to_string())
    }

    async fn fetch(&self, locator: &str) -> Result<Attachment, BackendError> {
        let parsed: DiscordLocator = locator.parse()?;
        let message = self.message(&parsed).await?;

        let attachment = message
            .attachments
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::MissingAttachment(locator.to_string()))?;

        let response = self.client.get(&attachment.url).send().await?;
        let data = Self::check(response).await?.bytes().await?;

        Ok(Attachment {
            name: attachment.filename,
            data,
        })
    }
}
