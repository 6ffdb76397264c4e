use serenity::{all::CommandInteraction, builder::CreateEmbed};
use tracing::{info, warn};

use crate::{
    common::options::Options,
    models::{
        command::{CommandContext, CommandContextReply},
        handler::Handler,
        response::{Response, ResponseResult},
    },
};

use super::{find_giveaway, lock_giveaway};

pub async fn delete(
    handler: &Handler,
    ctx: &CommandContext,
    cmd: &CommandInteraction,
    options: &Options<'_>,
) -> ResponseResult {
    let giveaway = find_giveaway(handler, ctx, options).await?;
    let lock = lock_giveaway(handler, &giveaway).await?;

    for message_id in [giveaway.announcement_message_id, giveaway.winner_message_id]
        .into_iter()
        .flatten()
    {
        if let Err(err) = handler
            .engine
            .messenger()
            .send_or_edit_or_delete_message(giveaway.channel_id, Some(message_id), None)
            .await
        {
            warn!(
                "Could not delete message {} of giveaway {}. Failed with error: {:?}",
                message_id, giveaway.id, err
            );
        }
    }

    let deleted = handler.engine.store().delete_giveaway(giveaway.id).await;
    lock.release(&handler.redis_database).await;
    deleted?;
    info!("Deleted giveaway {}", giveaway.id);

    ctx.reply(
        cmd,
        Response::new()
            .embed(CreateEmbed::new().title(format!(
                "Giveaway #{} was deleted",
                giveaway.guild_relative_id
            )))
            .ephemeral(true),
    )
    .await
}
