use serenity::{all::CommandInteraction, builder::CreateEmbed};

use crate::{
    common::options::Options,
    engine::claim::ClaimOutcome,
    models::{
        command::{CommandContext, CommandContextReply},
        handler::Handler,
        response::{Response, ResponseResult},
    },
};

use super::find_giveaway;

pub async fn accept(
    handler: &Handler,
    ctx: &CommandContext,
    cmd: &CommandInteraction,
    options: &Options<'_>,
) -> ResponseResult {
    let giveaway = find_giveaway(handler, ctx, options).await?;

    let description = match handler
        .engine
        .accept_prize(cmd.user.id.get() as i64, giveaway.id)
        .await?
    {
        ClaimOutcome::Accepted(rows) => {
            let units = rows.iter().map(|winner| winner.quantity_won).sum::<i32>();
            format!(
                "You accepted {units} prize{} from giveaway #{}. The host will be in touch.",
                if units == 1 { "" } else { "s" },
                giveaway.guild_relative_id
            )
        }
        ClaimOutcome::AlreadyAccepted => format!(
            "You already accepted your prize from giveaway #{}.",
            giveaway.guild_relative_id
        ),
    };

    ctx.reply(
        cmd,
        Response::new()
            .embed(
                CreateEmbed::new()
                    .title("Prize accepted")
                    .description(description)
                    .color(0x00ff00),
            )
            .ephemeral(true),
    )
    .await
}
