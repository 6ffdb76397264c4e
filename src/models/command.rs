use std::sync::atomic::AtomicBool;

use serenity::{
    all::{CommandInteraction, ComponentInteraction, Message, PartialGuild},
    builder::CreateCommand,
    prelude::Context as IncomingContext,
};

use super::{
    handler::Handler,
    permissions::Permission,
    response::{Response, ResponseError, ResponseResult},
};

pub struct CommandContext {
    pub ctx: IncomingContext,
    pub has_responsed: AtomicBool,
    pub user_permissions: Vec<Permission>,
    pub guild: PartialGuild,
}

impl CommandContext {
    pub fn guild_id(&self) -> i64 {
        self.guild.id.get() as i64
    }

    /// Refuses the command when the invoking user lacks `permission`.
    pub fn require(&self, permission: Permission) -> ResponseResult {
        if self.user_permissions.contains(&permission) {
            return Ok(());
        }
        Err(ResponseError::Execution(
            "You do not have permission to do this!",
            Some(format!("You are missing the `{permission}` permission. If you believe this is a mistake, please contact your server administrators.")),
        ))
    }
}

pub struct FailedCommandContext {
    pub ctx: IncomingContext,
}

/// A button press on one of the giveaway messages.
pub struct InteractionContext {
    pub ctx: IncomingContext,
    pub interaction: ComponentInteraction,
    pub has_responsed: AtomicBool,
}

impl InteractionContext {
    pub fn new(ctx: IncomingContext, interaction: ComponentInteraction) -> Self {
        InteractionContext {
            ctx,
            interaction,
            has_responsed: AtomicBool::new(false),
        }
    }

    pub fn user_id(&self) -> i64 {
        self.interaction.user.id.get() as i64
    }
}

#[async_trait::async_trait]
pub trait CommandContextReply {
    async fn reply_get_message(
        &self,
        cmd: &CommandInteraction,
        response: Response,
    ) -> Result<Message, ResponseError>;

    async fn reply(&self, cmd: &CommandInteraction, response: Response) -> ResponseResult;

    async fn error_message(&self, cmd: &CommandInteraction, error: ResponseError) -> ResponseResult {
        self.reply(cmd, error.to_response()).await
    }
}

#[async_trait::async_trait]
pub trait InteractionContextReply {
    async fn reply(&self, response: Response) -> ResponseResult;

    async fn error_message(&self, error: ResponseError) -> ResponseResult {
        self.reply(error.to_response()).await
    }
}

#[async_trait::async_trait]
pub trait Command: Send + Sync {
    fn name(&self) -> &'static str;
    fn register(&self) -> CreateCommand;
    async fn router(
        &self,
        handler: &Handler,
        ctx: &CommandContext,
        cmd: &CommandInteraction,
    ) -> ResponseResult;
}
