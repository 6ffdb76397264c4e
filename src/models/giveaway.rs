use std::{collections::HashSet, str::FromStr};

use time::{OffsetDateTime, PrimitiveDateTime};

use super::error::GiveawayError;

/// How much a giveaway does on its own once its end date passes. Each level
/// performs everything the previous one does.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum EndAutomation {
    None,
    End,
    Roll,
    Announce,
}

/// Which host notification has gone out. Only ever moves forward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum HostNotified {
    None,
    BeforeEnd,
    OnEnd,
}

#[derive(Debug, Clone)]
pub struct Giveaway {
    pub id: i64,
    pub guild_id: i64,
    pub guild_relative_id: i64,
    pub host_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub winner_quantity: i32,
    pub entries: HashSet<i64>,
    pub required_roles: HashSet<i64>,
    pub minimum_account_age: Option<time::Duration>,
    pub end_date: Option<OffsetDateTime>,
    pub ended: bool,
    pub entries_locked: bool,
    pub end_automation: EndAutomation,
    pub host_notified: HostNotified,
    pub channel_id: i64,
    pub announcement_message_id: Option<i64>,
    pub winner_message_id: Option<i64>,
}

impl Giveaway {
    pub fn is_past_end(&self, now: OffsetDateTime) -> bool {
        self.end_date.is_some_and(|end_date| end_date <= now)
    }

    /// Whether the giveaway ends before `horizon` but has not yet ended at `now`.
    pub fn is_ending_before(&self, now: OffsetDateTime, horizon: OffsetDateTime) -> bool {
        self.end_date
            .is_some_and(|end_date| end_date > now && end_date <= horizon)
    }
}

#[derive(sqlx::FromRow)]
pub struct DatabaseGiveaway {
    pub id: i64,
    pub guild_id: i64,
    pub guild_relative_id: i64,
    pub host_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub winner_quantity: i32,
    pub entries: Vec<i64>,
    pub required_roles: Vec<i64>,
    pub minimum_account_age: Option<i64>,
    pub end_date: Option<PrimitiveDateTime>,
    pub ended: bool,
    pub entries_locked: bool,
    pub end_automation: String,
    pub host_notified: String,
    pub channel_id: i64,
    pub announcement_message_id: Option<i64>,
    pub winner_message_id: Option<i64>,
}

impl TryFrom<DatabaseGiveaway> for Giveaway {
    type Error = GiveawayError;

    fn try_from(value: DatabaseGiveaway) -> Result<Self, Self::Error> {
        let end_automation = EndAutomation::from_str(&value.end_automation).map_err(|_| {
            GiveawayError::Corrupt(format!(
                "giveaway {} has unknown end automation {}",
                value.id, value.end_automation
            ))
        })?;
        let host_notified = HostNotified::from_str(&value.host_notified).map_err(|_| {
            GiveawayError::Corrupt(format!(
                "giveaway {} has unknown host notification state {}",
                value.id, value.host_notified
            ))
        })?;

        Ok(Giveaway {
            id: value.id,
            guild_id: value.guild_id,
            guild_relative_id: value.guild_relative_id,
            host_id: value.host_id,
            title: value.title,
            description: value.description,
            winner_quantity: value.winner_quantity,
            entries: value.entries.into_iter().collect(),
            required_roles: value.required_roles.into_iter().collect(),
            minimum_account_age: value.minimum_account_age.map(time::Duration::seconds),
            end_date: value.end_date.map(PrimitiveDateTime::assume_utc),
            ended: value.ended,
            entries_locked: value.entries_locked,
            end_automation,
            host_notified,
            channel_id: value.channel_id,
            announcement_message_id: value.announcement_message_id,
            winner_message_id: value.winner_message_id,
        })
    }
}

/// Everything the host supplies when creating a giveaway.
#[derive(Debug, Clone)]
pub struct NewGiveaway {
    pub guild_id: i64,
    pub host_id: i64,
    pub channel_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub winner_quantity: i32,
    pub required_roles: HashSet<i64>,
    pub minimum_account_age: Option<time::Duration>,
    pub end_date: Option<OffsetDateTime>,
    pub end_automation: EndAutomation,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Prize {
    pub id: i64,
    pub giveaway_id: i64,
    pub name: String,
    pub quantity: i32,
    pub additional_info: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPrize {
    pub giveaway_id: i64,
    pub name: String,
    pub quantity: i32,
    pub additional_info: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Winner {
    pub id: i64,
    pub user_id: i64,
    pub giveaway_id: i64,
    pub prize_id: i64,
    pub quantity_won: i32,
    pub accepted: bool,
    pub created_at: OffsetDateTime,
}

impl From<DatabaseWinner> for Winner {
    fn from(value: DatabaseWinner) -> Self {
        Winner {
            id: value.id,
            user_id: value.user_id,
            giveaway_id: value.giveaway_id,
            prize_id: value.prize_id,
            quantity_won: value.quantity_won,
            accepted: value.accepted,
            created_at: value.created_at.assume_utc(),
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct DatabaseWinner {
    pub id: i64,
    pub user_id: i64,
    pub giveaway_id: i64,
    pub prize_id: i64,
    pub quantity_won: i32,
    pub accepted: bool,
    pub created_at: PrimitiveDateTime,
}

/// One (user, prize) pairing produced by a roll, before it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub user_id: i64,
    pub prize_id: i64,
    pub quantity_won: i32,
}

/// Which existing winner rows a roll replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceScope {
    Unaccepted,
    All,
}

pub fn to_primitive(value: OffsetDateTime) -> PrimitiveDateTime {
    let utc = value.to_offset(time::UtcOffset::UTC);
    PrimitiveDateTime::new(utc.date(), utc.time())
}
