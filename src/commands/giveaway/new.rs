use std::{collections::HashSet, str::FromStr};

use serenity::{
    all::{ButtonStyle, ChannelId, CommandInteraction, Http, MessageId},
    builder::{CreateActionRow, CreateButton, CreateEmbed, CreateMessage, EditMessage},
};
use time::OffsetDateTime;
use tracing::{error, info, warn};

use crate::{
    common::{custom_id::ComponentAction, discord::snowflake, duration::Duration, options::Options},
    models::{
        command::{CommandContext, CommandContextReply},
        error::GiveawayResult,
        giveaway::{EndAutomation, Giveaway, NewGiveaway, NewPrize, Prize},
        handler::Handler,
        response::{Response, ResponseError, ResponseResult},
    },
};

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;

pub fn entry_embed(giveaway: &Giveaway, prizes: &[Prize]) -> CreateEmbed {
    let mut description = match &giveaway.description {
        Some(description) => format!("{description}\n\n"),
        None => String::new(),
    };
    description.push_str(&format!(
        "Winners: {}\nEntries: {}",
        giveaway.winner_quantity,
        giveaway.entries.len()
    ));
    if let Some(end_date) = giveaway.end_date {
        description.push_str(&format!(
            "\n\nGiveaway ends <t:{}:R>",
            end_date.unix_timestamp()
        ));
    }

    let mut embed = CreateEmbed::new()
        .title(format!("{} (#{})", giveaway.title, giveaway.guild_relative_id))
        .description(description)
        .color(0xfdca4c);

    if !prizes.is_empty() {
        let prize_list = prizes
            .iter()
            .map(|prize| format!("{} x{}", prize.name, prize.quantity))
            .collect::<Vec<_>>()
            .join("\n");
        embed = embed.field("Prizes", prize_list, false);
    }

    let mut requirements = giveaway
        .required_roles
        .iter()
        .map(|role_id| format!("<@&{role_id}>"))
        .collect::<Vec<_>>();
    if let Some(minimum_account_age) = giveaway.minimum_account_age {
        requirements.push(format!(
            "Account at least {} days old",
            minimum_account_age.whole_days()
        ));
    }
    if !requirements.is_empty() {
        embed = embed.field("Requirements", requirements.join("\n"), false);
    }

    embed
}

pub fn entry_components(giveaway: &Giveaway) -> Vec<CreateActionRow> {
    vec![CreateActionRow::Buttons(vec![CreateButton::new(
        ComponentAction::Enter {
            giveaway_id: giveaway.id,
        }
        .custom_id(),
    )
    .label("Enter")
    .style(ButtonStyle::Primary)])]
}

/// Redraws the entry message with the current entry count and prizes. Does
/// nothing once entries have closed.
pub async fn refresh_entry_message(handler: &Handler, http: &Http, giveaway_id: i64) -> GiveawayResult<()> {
    let store = handler.engine.store();
    let Some(giveaway) = store.get_giveaway(giveaway_id).await? else {
        return Ok(());
    };
    let (Some(message_id), false) = (giveaway.announcement_message_id, giveaway.entries_locked) else {
        return Ok(());
    };
    let (Ok(channel_id), Ok(message_id)) = (snowflake(giveaway.channel_id), snowflake(message_id)) else {
        return Ok(());
    };
    let prizes = store.get_prizes(giveaway.id).await?;

    if let Err(err) = ChannelId::new(channel_id)
        .edit_message(
            http,
            MessageId::new(message_id),
            EditMessage::new()
                .embed(entry_embed(&giveaway, &prizes))
                .components(entry_components(&giveaway)),
        )
        .await
    {
        warn!(
            "Could not update entry message for giveaway {}. Failed with error: {:?}",
            giveaway.id, err
        );
    }
    Ok(())
}

fn extend_components(giveaway: &Giveaway) -> Vec<CreateActionRow> {
    let button = |offset_ms: i64, label: &str| {
        CreateButton::new(
            ComponentAction::Extend {
                giveaway_id: giveaway.id,
                offset_ms,
            }
            .custom_id(),
        )
        .label(label)
        .style(ButtonStyle::Secondary)
    };

    vec![CreateActionRow::Buttons(vec![
        button(-HOUR_MS, "-1 hour"),
        button(HOUR_MS, "+1 hour"),
        button(DAY_MS, "+1 day"),
    ])]
}

pub async fn new(
    handler: &Handler,
    ctx: &CommandContext,
    cmd: &CommandInteraction,
    options: &Options<'_>,
) -> ResponseResult {
    let (Some(title), Some(duration_string)) =
        (options.get_string("title"), options.get_string("duration"))
    else {
        return Err(ResponseError::Execution(
            "Could not get the giveaway title or duration",
            Some("Please notify the developer of this issue".to_string()),
        ));
    };

    let now = OffsetDateTime::now_utc();
    let end_date = match Duration::parse(&duration_string) {
        Some(duration) if !duration.is_zero() => duration.to_timestamp(now),
        _ => None,
    };
    let Some(end_date) = end_date else {
        return Err(ResponseError::Execution(
            "Invalid duration",
            Some("Use a duration such as `30m`, `1d` or `1w2d`".to_string()),
        ));
    };

    let minimum_account_age = match options.get_string("account_age") {
        Some(account_age) => match Duration::parse(&account_age) {
            Some(duration) => Some(duration.to_time_duration()),
            None => {
                return Err(ResponseError::Execution(
                    "Invalid account age",
                    Some("Use a duration such as `7d` or `3mo`".to_string()),
                ))
            }
        },
        None => None,
    };

    let Ok(winner_quantity) = i32::try_from(options.get_integer("winners").unwrap_or(1)) else {
        return Err(ResponseError::Execution(
            "Too many winners",
            Some("Please pick a smaller number of winners".to_string()),
        ));
    };

    let end_automation = options
        .get_string("automation")
        .and_then(|automation| EndAutomation::from_str(&automation).ok())
        .unwrap_or(EndAutomation::Announce);

    let required_roles = options
        .get_role("role")
        .map(|role| role.id.get() as i64)
        .into_iter()
        .collect::<HashSet<_>>();

    let store = handler.engine.store();
    let mut giveaway = store
        .create_giveaway(NewGiveaway {
            guild_id: ctx.guild_id(),
            host_id: cmd.user.id.get() as i64,
            channel_id: cmd.channel_id.get() as i64,
            title,
            description: options.get_string("description"),
            winner_quantity: winner_quantity.max(1),
            required_roles,
            minimum_account_age,
            end_date: Some(end_date),
            end_automation,
        })
        .await?;

    let mut prizes = vec![];
    if let Some(name) = options.get_string("prize") {
        prizes.push(
            store
                .add_prize(NewPrize {
                    giveaway_id: giveaway.id,
                    name,
                    quantity: giveaway.winner_quantity,
                    additional_info: None,
                })
                .await?,
        );
    }

    match cmd
        .channel_id
        .send_message(
            &ctx.ctx.http,
            CreateMessage::new()
                .embed(entry_embed(&giveaway, &prizes))
                .components(entry_components(&giveaway)),
        )
        .await
    {
        Ok(message) => {
            let message_id = Some(message.id.get() as i64);
            store
                .set_announcement_message(giveaway.id, message_id)
                .await?;
            giveaway.announcement_message_id = message_id;
        }
        Err(err) => {
            error!(
                "Could not send entry message for giveaway {}. Failed with error: {:?}",
                giveaway.id, err
            );
            store.delete_giveaway(giveaway.id).await?;
            return Err(ResponseError::Serenity(err));
        }
    }

    info!(
        "Created giveaway {} (#{} in guild {}) ending at {}",
        giveaway.id, giveaway.guild_relative_id, giveaway.guild_id, end_date
    );

    let mut summary = format!(
        "Giveaway #{} ends <t:{}:F>. At the end it will: {}.",
        giveaway.guild_relative_id,
        end_date.unix_timestamp(),
        giveaway.end_automation.describe()
    );
    if prizes.is_empty() {
        summary.push_str(&format!(
            "\nAdd prizes with `/giveaway prize id:{}` before winners are drawn.",
            giveaway.guild_relative_id
        ));
    }

    ctx.reply(
        cmd,
        Response::new()
            .embed(
                CreateEmbed::new()
                    .title("Giveaway created")
                    .description(summary)
                    .color(0x00ff00),
            )
            .components(extend_components(&giveaway))
            .ephemeral(true),
    )
    .await
}
