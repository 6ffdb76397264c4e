use serenity::{all::CommandInteraction, builder::CreateEmbed};

use crate::{
    common::options::Options,
    engine::selection::{RollOutcome, RollParams},
    models::{
        command::{CommandContext, CommandContextReply},
        giveaway::Giveaway,
        handler::Handler,
        response::{Response, ResponseError, ResponseResult},
    },
};

use super::{find_giveaway, lock_giveaway};

/// Tells the host who was drawn and whether fewer winners than asked for
/// could be drawn.
pub fn outcome_embed(title: &str, giveaway: &Giveaway, outcome: &RollOutcome) -> CreateEmbed {
    let mut winners: Vec<String> = vec![];
    for winner in &outcome.winners {
        let mention = format!("<@{}>", winner.user_id);
        if !winners.contains(&mention) {
            winners.push(mention);
        }
    }

    let mut description = if winners.is_empty() {
        "No eligible entrants, so no winners were drawn.".to_string()
    } else {
        format!(
            "Drew {} of {} winners from {} eligible entrants: {}",
            outcome.drawn,
            outcome.requested,
            outcome.eligible_entrants,
            winners.join(", ")
        )
    };
    if outcome.clamped_by_prizes {
        description.push_str("\nThere are fewer prizes left than winners, so fewer winners were drawn.");
    }
    description.push_str(&format!(
        "\nAnnounce them with `/giveaway announce id:{}`.",
        giveaway.guild_relative_id
    ));

    CreateEmbed::new()
        .title(title)
        .description(description)
        .color(0x4752c4)
}

pub async fn roll(
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

    let params = RollParams {
        ignore_requirements: options.get_boolean("ignore_requirements").unwrap_or(false),
        ..RollParams::new(giveaway.id)
    };

    let lock = lock_giveaway(handler, &giveaway).await?;
    let outcome = handler.engine.roll_and_sign(params).await;
    lock.release(&handler.redis_database).await;
    let outcome = outcome?;

    ctx.reply(
        cmd,
        Response::new()
            .embed(outcome_embed("Winners drawn", &giveaway, &outcome))
            .ephemeral(true),
    )
    .await
}
