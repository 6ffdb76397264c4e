use time::OffsetDateTime;

use crate::models::{
    error::GiveawayResult,
    giveaway::{Allocation, Giveaway, NewGiveaway, NewPrize, Prize, ReplaceScope, Winner},
};

#[cfg(test)]
pub mod memory;
pub mod postgres;
pub mod lock;

/// Persistence used by the giveaway engine. Every state transition on
/// `ended` and `host_notified` is a compare-and-set: the returned `bool` says
/// whether this caller's write took effect.
#[async_trait::async_trait]
pub trait GiveawayStore: Send + Sync {
    async fn create_giveaway(&self, giveaway: NewGiveaway) -> GiveawayResult<Giveaway>;

    async fn add_prize(&self, prize: NewPrize) -> GiveawayResult<Prize>;

    /// Adds an entrant unless entries are locked. `false` when nothing changed.
    async fn add_entry(&self, giveaway_id: i64, user_id: i64) -> GiveawayResult<bool>;

    async fn get_giveaway(&self, id: i64) -> GiveawayResult<Option<Giveaway>>;

    async fn get_giveaway_by_relative_id(
        &self,
        guild_id: i64,
        guild_relative_id: i64,
    ) -> GiveawayResult<Option<Giveaway>>;

    /// Giveaways not yet ended whose end date is at or before `now`, or at or
    /// before `notify_before` with no host notification sent yet.
    async fn due_giveaways(
        &self,
        now: OffsetDateTime,
        notify_before: OffsetDateTime,
    ) -> GiveawayResult<Vec<Giveaway>>;

    /// `host_notified: None -> BeforeEnd`.
    async fn mark_host_notified(&self, giveaway_id: i64) -> GiveawayResult<bool>;

    /// `host_notified -> OnEnd` for giveaways that do not end automatically.
    async fn mark_deadline_notified(&self, giveaway_id: i64) -> GiveawayResult<bool>;

    /// `ended: false -> true`, locking entries and recording the on-end notice.
    async fn mark_ended(&self, giveaway_id: i64) -> GiveawayResult<bool>;

    /// Moves the end date of a giveaway that has not ended yet. `host_notified`
    /// is left as it is, so a host already warned is not warned again.
    async fn extend_end_date(
        &self,
        giveaway_id: i64,
        end_date: OffsetDateTime,
    ) -> GiveawayResult<bool>;

    /// Prizes in the order they are handed out.
    async fn get_prizes(&self, giveaway_id: i64) -> GiveawayResult<Vec<Prize>>;

    async fn get_winners(&self, giveaway_id: i64) -> GiveawayResult<Vec<Winner>>;

    /// Deletes the winner rows named by `scope` and writes `allocations` as one
    /// unit. Allocations for an existing (user, prize) pair add to its quantity.
    async fn write_roll(
        &self,
        giveaway_id: i64,
        scope: ReplaceScope,
        allocations: &[Allocation],
    ) -> GiveawayResult<Vec<Winner>>;

    /// Sets `accepted` on every winner row of the user. Returns the rows that
    /// flipped.
    async fn accept_winners(&self, giveaway_id: i64, user_id: i64)
        -> GiveawayResult<Vec<Winner>>;

    async fn set_announcement_message(
        &self,
        giveaway_id: i64,
        message_id: Option<i64>,
    ) -> GiveawayResult<()>;

    async fn set_winner_message(
        &self,
        giveaway_id: i64,
        message_id: Option<i64>,
    ) -> GiveawayResult<()>;

    /// Removes the giveaway along with its entries, prizes and winners.
    async fn delete_giveaway(&self, giveaway_id: i64) -> GiveawayResult<bool>;
}
