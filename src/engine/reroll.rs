use crate::models::error::GiveawayResult;

use super::{
    selection::{RollOutcome, RollParams},
    GiveawayEngine,
};

impl GiveawayEngine {
    /// Redraws every prize unit nobody has accepted yet. Accepted winners are
    /// left exactly as they are.
    pub async fn reroll_unclaimed(&self, giveaway_id: i64) -> GiveawayResult<RollOutcome> {
        self.roll_and_sign(RollParams {
            giveaway_id,
            ignore_requirements: false,
            override_claimed: false,
        })
        .await
    }

    /// Drops every winner, accepted or not, and redraws all prizes. Cannot be
    /// undone, so hosts confirm before this is called.
    pub async fn reroll_all(&self, giveaway_id: i64) -> GiveawayResult<RollOutcome> {
        self.roll_and_sign(RollParams {
            giveaway_id,
            ignore_requirements: false,
            override_claimed: true,
        })
        .await
    }
}
