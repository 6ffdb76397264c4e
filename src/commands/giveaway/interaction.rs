use serenity::{all::RoleId, builder::CreateEmbed};
use time::OffsetDateTime;
use tracing::info;

use crate::{
    common::custom_id::ComponentAction,
    models::{
        command::{InteractionContext, InteractionContextReply},
        error::GiveawayError,
        giveaway::Giveaway,
        handler::Handler,
        response::{Response, ResponseError, ResponseResult},
    },
};

use super::new::refresh_entry_message;

async fn enter(handler: &Handler, ctx: &InteractionContext, giveaway: &Giveaway) -> ResponseResult {
    if giveaway.entries_locked {
        return Err(ResponseError::Execution(
            "This giveaway has ended",
            Some("Entries are closed".to_string()),
        ));
    }

    if let Some(member) = &ctx.interaction.member {
        let missing = giveaway
            .required_roles
            .iter()
            .filter_map(|role_id| u64::try_from(*role_id).ok().filter(|id| *id > 0))
            .any(|role_id| !member.roles.contains(&RoleId::new(role_id)));
        if missing {
            return Err(ResponseError::Execution(
                "You do not have permission to enter this giveaway",
                Some("You are missing a role this giveaway requires".to_string()),
            ));
        }
    }

    if !handler
        .engine
        .store()
        .add_entry(giveaway.id, ctx.user_id())
        .await?
    {
        return Err(ResponseError::Execution(
            "You've already entered this giveaway",
            None,
        ));
    }

    ctx.reply(
        Response::new()
            .embed(
                CreateEmbed::new()
                    .title("You're in the running!")
                    .description("You've entered this giveaway. Good luck!")
                    .color(0x00ff00),
            )
            .ephemeral(true),
    )
    .await?;

    refresh_entry_message(handler, &ctx.ctx.http, giveaway.id).await?;
    Ok(())
}

async fn extend(
    handler: &Handler,
    ctx: &InteractionContext,
    giveaway: &Giveaway,
    offset_ms: i64,
) -> ResponseResult {
    if giveaway.host_id != ctx.user_id() {
        return Err(ResponseError::Execution(
            "Only the host can change the end date",
            None,
        ));
    }

    let now = OffsetDateTime::now_utc();
    let new_end_date = giveaway
        .end_date
        .unwrap_or(now)
        .checked_add(time::Duration::milliseconds(offset_ms));
    let Some(new_end_date) = new_end_date.filter(|end_date| *end_date > now) else {
        return Err(ResponseError::Execution(
            "The end date cannot be moved into the past",
            Some(format!(
                "Use `/giveaway end id:{}` to end it now",
                giveaway.guild_relative_id
            )),
        ));
    };

    if !handler
        .engine
        .store()
        .extend_end_date(giveaway.id, new_end_date)
        .await?
    {
        return Err(ResponseError::Giveaway(GiveawayError::InvalidState(
            "the giveaway has already ended",
        )));
    }
    info!(
        "Moved end date of giveaway {} to {}",
        giveaway.id, new_end_date
    );

    ctx.reply(
        Response::new()
            .embed(CreateEmbed::new().title("End date changed").description(format!(
                "Giveaway #{} now ends <t:{}:F>",
                giveaway.guild_relative_id,
                new_end_date.unix_timestamp()
            )))
            .ephemeral(true),
    )
    .await?;

    refresh_entry_message(handler, &ctx.ctx.http, giveaway.id).await?;
    Ok(())
}

pub async fn handle(handler: &Handler, ctx: &InteractionContext, action: ComponentAction) -> ResponseResult {
    let Some(giveaway) = handler
        .engine
        .store()
        .get_giveaway(action.giveaway_id())
        .await?
    else {
        return Err(ResponseError::Giveaway(GiveawayError::giveaway_not_found(
            action.giveaway_id(),
        )));
    };

    match action {
        ComponentAction::Enter { .. } => enter(handler, ctx, &giveaway).await,
        ComponentAction::Extend { offset_ms, .. } => extend(handler, ctx, &giveaway, offset_ms).await,
    }
}
