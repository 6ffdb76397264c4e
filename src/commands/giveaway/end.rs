use serenity::{all::CommandInteraction, builder::CreateEmbed};

use crate::{
    common::options::Options,
    models::{
        command::{CommandContext, CommandContextReply},
        handler::Handler,
        response::{Response, ResponseError, ResponseResult},
    },
};

use super::{find_giveaway, lock_giveaway};

pub async fn end(
    handler: &Handler,
    ctx: &CommandContext,
    cmd: &CommandInteraction,
    options: &Options<'_>,
) -> ResponseResult {
    let giveaway = find_giveaway(handler, ctx, options).await?;

    let lock = lock_giveaway(handler, &giveaway).await?;
    let ended = handler.engine.end_giveaway(giveaway.id).await;
    lock.release(&handler.redis_database).await;

    if !ended? {
        return Err(ResponseError::Execution(
            "This giveaway has already ended",
            Some(format!(
                "Use `/giveaway roll id:{}` to draw its winners",
                giveaway.guild_relative_id
            )),
        ));
    }

    ctx.reply(
        cmd,
        Response::new()
            .embed(
                CreateEmbed::new()
                    .title("Successfully ended giveaway")
                    .description(format!(
                        "Entries to giveaway #{} are closed. Draw winners with `/giveaway roll id:{}`.",
                        giveaway.guild_relative_id, giveaway.guild_relative_id
                    )),
            )
            .ephemeral(true),
    )
    .await
}
