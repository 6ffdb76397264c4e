use inflections::Inflect;
use serenity::builder::{CreateActionRow, CreateAllowedMentions, CreateEmbed};

use super::error::GiveawayError;

pub struct Response {
    pub content: Option<String>,
    pub embeds: Option<Vec<CreateEmbed>>,
    pub allowed_mentions: Option<CreateAllowedMentions>,
    pub components: Option<Vec<CreateActionRow>>,
    pub ephemeral: bool,
}

#[derive(Debug)]
pub enum ResponseError {
    Serenity(serenity::Error),
    Execution(&'static str, Option<String>),
    Giveaway(GiveawayError),
    Redis(redis::RedisError),
}

pub type ResponseResult = Result<(), ResponseError>;

impl From<GiveawayError> for ResponseError {
    fn from(value: GiveawayError) -> Self {
        ResponseError::Giveaway(value)
    }
}

impl From<serenity::Error> for ResponseError {
    fn from(value: serenity::Error) -> Self {
        ResponseError::Serenity(value)
    }
}

impl ResponseError {
    /// Title and hint shown to the user who triggered the failure.
    fn describe(&self) -> (String, Option<String>) {
        match self {
            ResponseError::Execution(title, hint) => ((*title).to_string(), hint.clone()),
            ResponseError::Giveaway(GiveawayError::NotFound { kind, .. }) => (
                format!("This {} could not be found", kind.to_lowercase()),
                Some("Use the giveaway number shown on the giveaway message".to_string()),
            ),
            ResponseError::Giveaway(GiveawayError::InvalidState(reason)) => (
                "This cannot be done right now".to_string(),
                Some(reason.to_sentence_case()),
            ),
            ResponseError::Giveaway(GiveawayError::NotAWinner { .. }) => (
                "You did not win this giveaway".to_string(),
                Some("Only winners can accept a prize".to_string()),
            ),
            ResponseError::Giveaway(_) | ResponseError::Redis(_) | ResponseError::Serenity(_) => (
                "Something went wrong".to_string(),
                Some("Please notify the developer of this issue".to_string()),
            ),
        }
    }

    pub fn to_response(&self) -> Response {
        let (title, hint) = self.describe();
        let mut embed = CreateEmbed::new().title(title).color(0xf04747);
        if let Some(hint) = hint {
            embed = embed.description(hint);
        }
        Response::new().embed(embed).ephemeral(true)
    }
}

impl Response {
    pub fn new() -> Self {
        Response {
            content: None,
            embeds: None,
            allowed_mentions: None,
            components: None,
            ephemeral: false,
        }
    }

    pub fn content(mut self, content: String) -> Self {
        self.content = Some(content);
        self
    }

    pub fn embed(mut self, embed: CreateEmbed) -> Self {
        self.embeds = Some(vec![embed]);
        self
    }

    pub fn components(mut self, components: Vec<CreateActionRow>) -> Self {
        self.components = Some(components);
        self
    }

    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }
}
