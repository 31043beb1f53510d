//! Minimal slice of the chat platform's interaction model: just enough to
//! receive the `story` slash command over HTTP and answer it.

use serde::{Deserialize, Serialize};

pub mod client;
pub mod commands;
pub mod verify;

pub use client::{DiscordClient, InteractionResponder};
pub use commands::{parse_story, story_command};
pub use verify::{SIGNATURE_HEADER, SignatureVerifier, TIMESTAMP_HEADER};

// interaction types
pub const PING: u8 = 1;
pub const APPLICATION_COMMAND: u8 = 2;

// response types
pub const PONG: u8 = 1;
pub const CHANNEL_MESSAGE_WITH_SOURCE: u8 = 4;

// option types
pub const OPTION_STRING: u8 = 3;
pub const OPTION_INTEGER: u8 = 4;

// hard cap on message content length
pub const MAX_CONTENT_LEN: usize = 2000;

#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub token: String,
    pub data: Option<CommandData>,
    // set for guild invocations
    pub member: Option<Member>,
    // set for direct messages
    pub user: Option<User>,
}

impl Interaction {
    pub fn invoker(&self) -> Option<&User> {
        self.member.as_ref().map(|m| &m.user).or(self.user.as_ref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandData {
    pub name: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self {
            kind: PONG,
            data: None,
        }
    }

    pub fn message(content: impl Into<String>) -> Self {
        Self {
            kind: CHANNEL_MESSAGE_WITH_SOURCE,
            data: Some(ResponseData {
                content: truncate(content.into()),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResponseData {
    pub content: String,
}

/// Cut `content` to the platform's message limit on a char boundary.
pub fn truncate(mut content: String) -> String {
    if content.chars().count() > MAX_CONTENT_LEN {
        let cut = content
            .char_indices()
            .nth(MAX_CONTENT_LEN)
            .map(|(i, _)| i)
            .unwrap_or(content.len());
        content.truncate(cut);
    }
    content
}
