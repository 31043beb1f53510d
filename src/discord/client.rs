use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use super::commands::ApplicationCommand;
use super::truncate;
use crate::error::DiscordError;

/// Delivers the final answer for an interaction that was acknowledged earlier.
#[async_trait]
pub trait InteractionResponder: Send + Sync {
    async fn edit_original(&self, interaction_token: &str, content: &str) -> Result<(), DiscordError>;
}

/// Chat platform REST client, built once at startup and shared.
pub struct DiscordClient {
    client: reqwest::Client,
    api_base: String,
    application_id: String,
    bot_token: String,
}

impl DiscordClient {
    pub fn new(client: reqwest::Client, api_base: &str, application_id: String, bot_token: String) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            application_id,
            bot_token,
        }
    }

    /// Overwrite the bot's commands in `guild`, or globally when `None`.
    pub async fn register_commands(
        &self,
        guild: Option<&str>,
        commands: &[ApplicationCommand],
    ) -> Result<(), DiscordError> {
        let url = match guild {
            Some(guild) => format!(
                "{}/applications/{}/guilds/{}/commands",
                self.api_base, self.application_id, guild
            ),
            None => format!("{}/applications/{}/commands", self.api_base, self.application_id),
        };

        let res = self
            .client
            .put(url)
            .header("Authorization", format!("Bot {}", self.bot_token))
            .json(commands)
            .send()
            .await?;
        check(res).await?;

        for command in commands {
            info!(command = command.name, guild = guild.unwrap_or("global"), "registered command");
        }
        Ok(())
    }
}

#[async_trait]
impl InteractionResponder for DiscordClient {
    async fn edit_original(&self, interaction_token: &str, content: &str) -> Result<(), DiscordError> {
        let url = format!(
            "{}/webhooks/{}/{}/messages/@original",
            self.api_base, self.application_id, interaction_token
        );
        let res = self
            .client
            .patch(url)
            .json(&json!({ "content": truncate(content.to_string()) }))
            .send()
            .await?;
        check(res).await?;
        debug!("edited original interaction response");
        Ok(())
    }
}

async fn check(res: reqwest::Response) -> Result<reqwest::Response, DiscordError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    Err(DiscordError::Status {
        status: status.as_u16(),
        body,
    })
}
