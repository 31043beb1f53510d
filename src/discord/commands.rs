use serde::Serialize;

use super::{APPLICATION_COMMAND, Interaction, OPTION_INTEGER, OPTION_STRING};
use crate::dispatch::StoryRequest;
use crate::error::CommandError;

pub const STORY: &str = "story";

// Slash command definition as registered with the platform
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationCommand {
    pub name: &'static str,
    pub description: &'static str,
    pub options: Vec<OptionDefinition>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionDefinition {
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<i64>,
}

pub fn story_command() -> ApplicationCommand {
    ApplicationCommand {
        name: STORY,
        description: "I generate a story based on your given prompt",
        options: vec![
            OptionDefinition {
                kind: OPTION_STRING,
                name: "prompt",
                description: "Enter the words you want your story to start with.",
                required: true,
                min_value: None,
            },
            OptionDefinition {
                kind: OPTION_INTEGER,
                name: "words",
                description: "Number of words to generate. Default is 100",
                required: false,
                min_value: Some(1),
            },
        ],
    }
}

/// Pull a [`StoryRequest`] out of a `story` command interaction.
///
/// Options are matched by name, not position.
pub fn parse_story(interaction: &Interaction) -> Result<StoryRequest, CommandError> {
    if interaction.kind != APPLICATION_COMMAND {
        return Err(CommandError::MissingData);
    }
    let data = interaction.data.as_ref().ok_or(CommandError::MissingData)?;
    if data.name != STORY {
        return Err(CommandError::UnknownCommand(data.name.clone()));
    }
    let user = interaction.invoker().ok_or(CommandError::MissingUser)?;

    let option = |name: &str| data.options.iter().find(|o| o.name == name).and_then(|o| o.value.as_ref());

    let prompt = option("prompt")
        .ok_or(CommandError::MissingOption("prompt"))?
        .as_str()
        .ok_or(CommandError::InvalidOption("prompt"))?
        .to_string();

    let words = match option("words") {
        None => None,
        Some(v) => Some(v.as_i64().ok_or(CommandError::InvalidOption("words"))?),
    };

    Ok(StoryRequest {
        user_id: user.id.clone(),
        username: user.username.clone(),
        prompt,
        words,
    })
}
