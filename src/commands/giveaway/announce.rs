use serenity::{all::CommandInteraction, builder::CreateEmbed};

use crate::{
    common::options::Options,
    models::{
        command::{CommandContext, CommandContextReply},
        handler::Handler,
        response::{Response, ResponseResult},
    },
};

use super::{find_giveaway, lock_giveaway};

pub async fn announce(
    handler: &Handler,
    ctx: &CommandContext,
    cmd: &CommandInteraction,
    options: &Options<'_>,
) -> ResponseResult {
    let giveaway = find_giveaway(handler, ctx, options).await?;

    let lock = lock_giveaway(handler, &giveaway).await?;
    let announcement = handler.engine.announce(giveaway.id).await;
    lock.release(&handler.redis_database).await;
    let announcement = announcement?;

    let mut description = format!(
        "Messaged {} winners of giveaway #{}.",
        announcement.dms_sent, giveaway.guild_relative_id
    );
    if announcement.dms_failed > 0 {
        description.push_str(&format!(
            " {} winners could not be messaged, they may have direct messages turned off.",
            announcement.dms_failed
        ));
    }
    if announcement.winner_message_id.is_none() {
        description.push_str(" The winners message could not be posted in the giveaway channel.");
    }

    ctx.reply(
        cmd,
        Response::new()
            .embed(
                CreateEmbed::new()
                    .title("Winners announced")
                    .description(description),
            )
            .ephemeral(true),
    )
    .await
}
