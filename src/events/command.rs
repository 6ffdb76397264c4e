use std::sync::atomic::AtomicBool;

use serenity::{
    all::{CommandInteraction, PartialGuild},
    prelude::Context as IncomingContext,
};
use strum::IntoEnumIterator;
use tracing::{debug, error};

use crate::{
    commands::get_command_list,
    database::postgres::permissions::{get_role_permissions, get_user_permissions},
    models::{
        command::{CommandContext, CommandContextReply, FailedCommandContext},
        handler::Handler,
        permissions::Permission,
        response::Response,
    },
};

impl Handler {
    async fn resolve_permissions(
        &self,
        guild: &PartialGuild,
        command: &CommandInteraction,
    ) -> Vec<Permission> {
        let is_administrator = command
            .member
            .as_ref()
            .and_then(|member| member.permissions)
            .is_some_and(|permissions| permissions.administrator());
        if guild.owner_id == command.user.id || is_administrator {
            return Permission::iter().collect();
        }

        let guild_id = guild.id.get() as i64;
        let mut user_permissions = get_user_permissions(
            &self.main_database,
            guild_id,
            command.user.id.get() as i64,
        )
        .await;

        let roles = command
            .member
            .as_ref()
            .map(|member| member.roles.clone())
            .unwrap_or_default();
        for role in roles {
            for role_permission in
                get_role_permissions(&self.main_database, guild_id, role.get() as i64).await
            {
                if !user_permissions.contains(&role_permission) {
                    user_permissions.push(role_permission);
                }
            }
        }

        user_permissions
    }

    pub async fn on_command(&self, ctx: IncomingContext, command: CommandInteraction) {
        let start = std::time::Instant::now();

        let Some(guild_id) = command.guild_id else {
            let fail_context = FailedCommandContext { ctx };
            if let Err(err) = fail_context
                .reply(
                    &command,
                    Response::new().content("Giveaways can only be run inside servers".to_string()),
                )
                .await
            {
                error!("Failed to reply to command: {:?}", err);
            }
            return;
        };

        let cached_guild = guild_id
            .to_guild_cached(&ctx.cache)
            .map(|guild| PartialGuild::from(guild.clone()));
        let guild = match cached_guild {
            Some(guild) => guild,
            None => match guild_id.to_partial_guild(&ctx.http).await {
                Ok(guild) => guild,
                Err(err) => {
                    error!("Could not obtain guild {}: {:?}", guild_id, err);
                    let fail_context = FailedCommandContext { ctx };
                    if let Err(err) = fail_context
                        .reply(
                            &command,
                            Response::new().content("Could not obtain the server".to_string()),
                        )
                        .await
                    {
                        error!("Failed to reply to command: {:?}", err);
                    }
                    return;
                }
            },
        };

        debug!("Took {:?} to get guild ID and guild", start.elapsed());

        let user_permissions = self.resolve_permissions(&guild, &command).await;
        let command_context = CommandContext {
            ctx,
            has_responsed: AtomicBool::new(false),
            user_permissions,
            guild,
        };

        debug!("Context generated in {:?}", start.elapsed());

        for existing_command in get_command_list() {
            if existing_command.name() != command.data.name {
                continue;
            }
            if let Err(err) = existing_command
                .router(self, &command_context, &command)
                .await
            {
                error!("Failed to handle command: {:?}", err);
                if let Err(err) = command_context.error_message(&command, err).await {
                    error!("Failed to reply to command: {:?}", err);
                }
            }
        }

        debug!("Took {:?} to handle a command", start.elapsed());
    }
}
