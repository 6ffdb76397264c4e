use tracing::info;

use crate::models::{
    error::{GiveawayError, GiveawayResult},
    giveaway::Winner,
};

use super::GiveawayEngine;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// These rows were accepted by this call.
    Accepted(Vec<Winner>),
    /// Every row was already accepted; nothing was written.
    AlreadyAccepted,
}

impl GiveawayEngine {
    /// Records that a winner wants their prize. Calling it again is harmless.
    pub async fn accept_prize(&self, user_id: i64, giveaway_id: i64) -> GiveawayResult<ClaimOutcome> {
        let rows = self
            .store
            .get_winners(giveaway_id)
            .await?
            .into_iter()
            .filter(|winner| winner.user_id == user_id)
            .collect::<Vec<_>>();

        if rows.is_empty() {
            return Err(GiveawayError::NotAWinner {
                user_id,
                giveaway_id,
            });
        }
        if rows.iter().all(|winner| winner.accepted) {
            return Ok(ClaimOutcome::AlreadyAccepted);
        }

        let accepted = self.store.accept_winners(giveaway_id, user_id).await?;
        info!(
            "User {} accepted {} prize rows in giveaway {}",
            user_id,
            accepted.len(),
            giveaway_id
        );

        if accepted.is_empty() {
            // Another click got there first.
            return Ok(ClaimOutcome::AlreadyAccepted);
        }
        Ok(ClaimOutcome::Accepted(accepted))
    }
}
