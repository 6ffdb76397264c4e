use serenity::{
    all::{CommandInteraction, CommandOptionType},
    builder::{CreateCommand, CreateCommandOption},
};

use crate::{
    common::options::Options,
    database::lock::GiveawayLock,
    models::{
        command::{Command, CommandContext},
        error::GiveawayError,
        giveaway::Giveaway,
        handler::Handler,
        permissions::Permission,
        response::{ResponseError, ResponseResult},
    },
};

pub mod accept;
pub mod announce;
pub mod delete;
pub mod end;
pub mod interaction;
pub mod new;
pub mod prize;
pub mod reroll;
pub mod roll;

pub struct GiveawayCommand;

fn id_option(description: &str) -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::Integer, "id", description)
        .min_int_value(1)
        .required(true)
}

/// Looks up the giveaway named by the `id` option, which is the number shown
/// on the giveaway message rather than the database id.
pub async fn find_giveaway(
    handler: &Handler,
    ctx: &CommandContext,
    options: &Options<'_>,
) -> Result<Giveaway, ResponseError> {
    let Some(guild_relative_id) = options.get_integer("id") else {
        return Err(ResponseError::Execution(
            "Could not get giveaway ID",
            Some("Please notify the developer of this issue".to_string()),
        ));
    };

    handler
        .engine
        .store()
        .get_giveaway_by_relative_id(ctx.guild_id(), guild_relative_id)
        .await?
        .ok_or(ResponseError::Giveaway(GiveawayError::NotFound {
            kind: "Giveaway",
            id: guild_relative_id,
        }))
}

/// Takes the per-giveaway action lock, refusing while another host action on
/// the same giveaway is still running.
pub async fn lock_giveaway(handler: &Handler, giveaway: &Giveaway) -> Result<GiveawayLock, ResponseError> {
    match GiveawayLock::acquire(&handler.redis_database, giveaway.id).await? {
        Some(lock) => Ok(lock),
        None => Err(ResponseError::Execution(
            "Another action is running on this giveaway",
            Some("Please try again in a few seconds".to_string()),
        )),
    }
}

#[async_trait::async_trait]
impl Command for GiveawayCommand {
    fn name(&self) -> &'static str {
        "giveaway"
    }

    fn register(&self) -> CreateCommand {
        CreateCommand::new("giveaway")
            .description("Giveaway commands")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "new",
                    "Start a new giveaway",
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        "title",
                        "What the giveaway is for",
                    )
                    .required(true),
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        "duration",
                        "How long entries stay open, for example 1d12h",
                    )
                    .required(true),
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::Integer,
                        "winners",
                        "The number of winners for the giveaway (default: 1)",
                    )
                    .min_int_value(1)
                    .required(false),
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        "automation",
                        "What happens on its own at the end date (default: announce)",
                    )
                    .add_string_choice("Nothing, just tell me", "none")
                    .add_string_choice("Close entries", "end")
                    .add_string_choice("Close entries and draw winners", "roll")
                    .add_string_choice("Close entries, draw and announce winners", "announce")
                    .required(false),
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        "prize",
                        "A first prize, one unit per winner",
                    )
                    .required(false),
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::Role,
                        "role",
                        "The role to require to win the giveaway",
                    )
                    .required(false),
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        "account_age",
                        "Minimum Discord account age to win, for example 30d",
                    )
                    .required(false),
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        "description",
                        "The description for the giveaway",
                    )
                    .required(false),
                ),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "prize",
                    "Add a prize to a giveaway",
                )
                .add_sub_option(id_option("The giveaway to add the prize to"))
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        "name",
                        "The name of the prize",
                    )
                    .required(true),
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::Integer,
                        "quantity",
                        "How many units of this prize there are (default: 1)",
                    )
                    .min_int_value(1)
                    .required(false),
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        "info",
                        "Extra information sent to the winners of this prize",
                    )
                    .required(false),
                ),
            )
            .add_option(
                CreateCommandOption::new(CommandOptionType::SubCommand, "end", "End a giveaway")
                    .add_sub_option(id_option("The giveaway to end")),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "roll",
                    "Draw the winners of an ended giveaway",
                )
                .add_sub_option(id_option("The giveaway to draw winners for"))
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::Boolean,
                        "ignore_requirements",
                        "Let every entrant win, regardless of roles and account age",
                    )
                    .required(false),
                ),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "reroll",
                    "Reroll a giveaway",
                )
                .add_sub_option(id_option("The giveaway to reroll"))
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        "mode",
                        "Which winners to replace (default: unclaimed)",
                    )
                    .add_string_choice("Winners who have not accepted yet", "unclaimed")
                    .add_string_choice("Every winner, including accepted ones", "all")
                    .required(false),
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::Boolean,
                        "confirm",
                        "Required to replace accepted winners",
                    )
                    .required(false),
                ),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "announce",
                    "Announce the winners of a giveaway",
                )
                .add_sub_option(id_option("The giveaway to announce")),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "accept",
                    "Accept a prize you won",
                )
                .add_sub_option(id_option("The giveaway you won")),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "delete",
                    "Delete a giveaway",
                )
                .add_sub_option(id_option("The giveaway to delete")),
            )
            .dm_permission(false)
    }

    async fn router(
        &self,
        handler: &Handler,
        ctx: &CommandContext,
        cmd: &CommandInteraction,
    ) -> ResponseResult {
        let options = Options {
            options: cmd.data.options(),
        };

        let permission = match options.subcommand() {
            Some("new") => Some(Permission::GiveawayCreate),
            Some("prize") => Some(Permission::GiveawayEdit),
            Some("end") => Some(Permission::GiveawayEnd),
            Some("roll") => Some(Permission::GiveawayRoll),
            Some("reroll") => Some(Permission::GiveawayReroll),
            Some("announce") => Some(Permission::GiveawayAnnounce),
            Some("delete") => Some(Permission::GiveawayDelete),
            _ => None,
        };
        if let Some(permission) = permission {
            ctx.require(permission)?;
        }

        match options.subcommand() {
            Some("new") => new::new(handler, ctx, cmd, &options).await,
            Some("prize") => prize::prize(handler, ctx, cmd, &options).await,
            Some("end") => end::end(handler, ctx, cmd, &options).await,
            Some("roll") => roll::roll(handler, ctx, cmd, &options).await,
            Some("reroll") => reroll::reroll(handler, ctx, cmd, &options).await,
            Some("announce") => announce::announce(handler, ctx, cmd, &options).await,
            Some("accept") => accept::accept(handler, ctx, cmd, &options).await,
            Some("delete") => delete::delete(handler, ctx, cmd, &options).await,
            _ => Err(ResponseError::Execution(
                "Invalid command",
                Some("You must specify a subcommand to use this command!".to_string()),
            )),
        }
    }
}
