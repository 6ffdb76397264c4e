use serenity::{all::CommandInteraction, builder::CreateEmbed};
use tracing::info;

use crate::{
    common::options::Options,
    models::{
        command::{CommandContext, CommandContextReply},
        giveaway::NewPrize,
        handler::Handler,
        response::{Response, ResponseError, ResponseResult},
    },
};

use super::{find_giveaway, new::refresh_entry_message};

pub async fn prize(
    handler: &Handler,
    ctx: &CommandContext,
    cmd: &CommandInteraction,
    options: &Options<'_>,
) -> ResponseResult {
    let giveaway = find_giveaway(handler, ctx, options).await?;

    let Some(name) = options.get_string("name") else {
        return Err(ResponseError::Execution(
            "Could not get the prize name",
            Some("Please notify the developer of this issue".to_string()),
        ));
    };
    let Ok(quantity) = i32::try_from(options.get_integer("quantity").unwrap_or(1)) else {
        return Err(ResponseError::Execution(
            "Too many prizes",
            Some("Please pick a smaller quantity".to_string()),
        ));
    };

    let prize = handler
        .engine
        .store()
        .add_prize(NewPrize {
            giveaway_id: giveaway.id,
            name,
            quantity: quantity.max(1),
            additional_info: options.get_string("info"),
        })
        .await?;
    info!(
        "Added prize {} ({} x{}) to giveaway {}",
        prize.id, prize.name, prize.quantity, giveaway.id
    );

    refresh_entry_message(handler, &ctx.ctx.http, giveaway.id).await?;

    ctx.reply(
        cmd,
        Response::new()
            .embed(
                CreateEmbed::new()
                    .title("Prize added")
                    .description(format!(
                        "{} x{} was added to giveaway #{}",
                        prize.name, prize.quantity, giveaway.guild_relative_id
                    ))
                    .color(0x00ff00),
            )
            .ephemeral(true),
    )
    .await
}
