use serenity::all::CommandInteraction;

use crate::{
    common::options::Options,
    models::{
        command::{CommandContext, CommandContextReply},
        handler::Handler,
        response::{Response, ResponseError, ResponseResult},
    },
};

use super::{find_giveaway, lock_giveaway, roll::outcome_embed};

pub async fn reroll(
    handler: &Handler,
    ctx: &CommandContext,
    cmd: &CommandInteraction,
    options: &Options<'_>,
) -> ResponseResult {
    let giveaway = find_giveaway(handler, ctx, options).await?;
    if !giveaway.ended {
        return Err(ResponseError::Execution(
            "This giveaway is still running",
            Some(format!(
                "End it first with `/giveaway end id:{}`",
                giveaway.guild_relative_id
            )),
        ));
    }

    let replace_all = match options.get_string("mode").as_deref() {
        Some("all") => true,
        Some("unclaimed") | None => false,
        Some(_) => {
            return Err(ResponseError::Execution(
                "Invalid reroll mode",
                Some("Pick either `unclaimed` or `all`".to_string()),
            ))
        }
    };
    if replace_all && !options.get_boolean("confirm").unwrap_or(false) {
        return Err(ResponseError::Execution(
            "Rerolling everyone cannot be undone",
            Some("This also replaces winners who already accepted. Run it again with `confirm:true` to go ahead.".to_string()),
        ));
    }

    let lock = lock_giveaway(handler, &giveaway).await?;
    let outcome = if replace_all {
        handler.engine.reroll_all(giveaway.id).await
    } else {
        handler.engine.reroll_unclaimed(giveaway.id).await
    };
    lock.release(&handler.redis_database).await;
    let outcome = outcome?;

    let title = if replace_all {
        "Every winner was rerolled"
    } else {
        "Unclaimed prizes were rerolled"
    };
    ctx.reply(
        cmd,
        Response::new()
            .embed(outcome_embed(title, &giveaway, &outcome))
            .ephemeral(true),
    )
    .await
}
