use std::collections::BTreeMap;

use ordinal::Ordinal;
use tracing::{error, info, warn};

use crate::models::{
    error::{GiveawayError, GiveawayResult},
    giveaway::{Giveaway, Prize, Winner},
};

use super::{selection::RollOutcome, GiveawayEngine};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Announcement {
    pub winner_message_id: Option<i64>,
    pub dms_sent: usize,
    pub dms_failed: usize,
}

fn mention(user_id: i64) -> String {
    format!("<@{user_id}>")
}

fn span(duration: time::Duration) -> String {
    let seconds = u64::try_from(duration.whole_seconds()).unwrap_or(0);
    pretty_duration::pretty_duration(&std::time::Duration::from_secs(seconds), None)
}

pub fn render_winners(giveaway: &Giveaway, prizes: &[Prize], winners: &[Winner]) -> String {
    if winners.is_empty() {
        return format!(
            "**{}** has ended, but no one won the giveaway.",
            giveaway.title
        );
    }

    let mut lines = vec![format!(
        "**{}** has ended, congratulations to the winners!",
        giveaway.title
    )];
    for (index, prize) in prizes.iter().enumerate() {
        let mut holders: BTreeMap<i64, i32> = BTreeMap::new();
        for winner in winners.iter().filter(|winner| winner.prize_id == prize.id) {
            *holders.entry(winner.user_id).or_default() += winner.quantity_won;
        }
        if holders.is_empty() {
            continue;
        }

        let names = holders
            .iter()
            .map(|(user_id, quantity)| match quantity {
                1 => mention(*user_id),
                _ => format!("{} (x{quantity})", mention(*user_id)),
            })
            .collect::<Vec<_>>();
        lines.push(format!(
            "{}{} prize, {}: {}",
            index + 1,
            Ordinal(index + 1).suffix(),
            prize.name,
            names.join(", ")
        ));
    }
    lines.push(format!(
        "Winners, claim your prize with `/giveaway accept id:{}`.",
        giveaway.guild_relative_id
    ));
    lines.join("\n")
}

pub fn render_winner_dm(giveaway: &Giveaway, prizes: &[Prize], winnings: &[&Winner]) -> String {
    let won = winnings
        .iter()
        .filter_map(|winner| {
            prizes
                .iter()
                .find(|prize| prize.id == winner.prize_id)
                .map(|prize| match &prize.additional_info {
                    Some(info) => format!("- {} x{} ({info})", prize.name, winner.quantity_won),
                    None => format!("- {} x{}", prize.name, winner.quantity_won),
                })
        })
        .collect::<Vec<_>>();

    format!(
        "You won in **{}** (giveaway #{})!\n{}\nClaim your prize with `/giveaway accept id:{}` in the server.",
        giveaway.title,
        giveaway.guild_relative_id,
        won.join("\n"),
        giveaway.guild_relative_id
    )
}

pub fn render_ending_soon(giveaway: &Giveaway, now: time::OffsetDateTime) -> String {
    let remaining = giveaway
        .end_date
        .map_or(time::Duration::ZERO, |end_date| end_date - now);
    format!(
        "Your giveaway **{}** (#{}) ends in {}. Automation is set to {}: {}.",
        giveaway.title,
        giveaway.guild_relative_id,
        span(remaining),
        giveaway.end_automation.label(),
        giveaway.end_automation.describe()
    )
}

pub fn render_ended_notice(giveaway: &Giveaway, outcome: Option<&RollOutcome>) -> String {
    let mut content = format!(
        "Your giveaway **{}** (#{}) has ended and entries are closed.",
        giveaway.title, giveaway.guild_relative_id
    );
    if let Some(outcome) = outcome {
        content.push_str(&format!(
            " {} of {} winners were drawn from {} eligible entrants.",
            outcome.drawn, outcome.requested, outcome.eligible_entrants
        ));
        if outcome.clamped_by_prizes {
            content.push_str(" There were fewer prizes than winners, so fewer winners were drawn.");
        }
    }
    content
}

pub fn render_deadline_notice(giveaway: &Giveaway) -> String {
    format!(
        "Your giveaway **{}** (#{}) has reached its end date. Nothing was done automatically, use `/giveaway end` when you are ready.",
        giveaway.title, giveaway.guild_relative_id
    )
}

pub fn render_closed(giveaway: &Giveaway) -> String {
    format!(
        "**{}** has ended. Entries are closed.",
        giveaway.title
    )
}

impl GiveawayEngine {
    /// Sends a DM and swallows delivery failures.
    pub(super) async fn deliver_dm(&self, user_id: i64, content: &str) -> bool {
        match self.messenger.send_dm(user_id, content).await {
            Ok(()) => true,
            Err(err) if err.is_delivery() => {
                warn!(
                    "Could not send message to user {}. Failed with error: {:?}",
                    user_id, err
                );
                false
            }
            Err(err) => {
                error!(
                    "Unexpected failure messaging user {}. Failed with error: {:?}",
                    user_id, err
                );
                false
            }
        }
    }

    /// Posts (or updates) the winners message and DMs every winner.
    pub(super) async fn dispatch_announcement(
        &self,
        giveaway: &Giveaway,
        prizes: &[Prize],
        winners: &[Winner],
    ) -> GiveawayResult<Announcement> {
        let content = render_winners(giveaway, prizes, winners);
        let winner_message_id = match self
            .messenger
            .send_or_edit_or_delete_message(
                giveaway.channel_id,
                giveaway.winner_message_id,
                Some(&content),
            )
            .await
        {
            Ok(message_id) => message_id,
            Err(err) => {
                warn!(
                    "Could not post winners message for giveaway {}. Failed with error: {:?}",
                    giveaway.id, err
                );
                giveaway.winner_message_id
            }
        };
        if winner_message_id != giveaway.winner_message_id {
            self.store
                .set_winner_message(giveaway.id, winner_message_id)
                .await?;
        }

        let mut by_user: BTreeMap<i64, Vec<&Winner>> = BTreeMap::new();
        for winner in winners {
            by_user.entry(winner.user_id).or_default().push(winner);
        }

        let mut announcement = Announcement {
            winner_message_id,
            ..Announcement::default()
        };
        for (user_id, winnings) in by_user {
            let content = render_winner_dm(giveaway, prizes, &winnings);
            if self.deliver_dm(user_id, &content).await {
                announcement.dms_sent += 1;
            } else {
                announcement.dms_failed += 1;
            }
        }

        info!(
            "Announced {} winners for giveaway {} ({} messages failed)",
            announcement.dms_sent + announcement.dms_failed,
            giveaway.id,
            announcement.dms_failed
        );
        Ok(announcement)
    }

    /// Announces the current winners of a giveaway on request of the host.
    pub async fn announce(&self, giveaway_id: i64) -> GiveawayResult<Announcement> {
        let giveaway = self
            .store
            .get_giveaway(giveaway_id)
            .await?
            .ok_or(GiveawayError::giveaway_not_found(giveaway_id))?;
        if !giveaway.ended {
            return Err(GiveawayError::InvalidState(
                "winners can only be announced after the giveaway has ended",
            ));
        }

        let prizes = self.store.get_prizes(giveaway_id).await?;
        let winners = self.store.get_winners(giveaway_id).await?;
        self.dispatch_announcement(&giveaway, &prizes, &winners).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        database::memory::MemoryGiveawayStore,
        engine::testing::{test_engine, ChannelCall},
        models::giveaway::EndAutomation,
    };

    #[test]
    fn winners_are_listed_per_prize_with_ordinals() {
        let store = MemoryGiveawayStore::new();
        let giveaway = store.seed(3, &[1, 2, 3], &[2, 1], None, EndAutomation::None);
        let prizes = vec![
            Prize {
                id: 10,
                giveaway_id: giveaway.id,
                name: "Steam key".to_string(),
                quantity: 2,
                additional_info: None,
            },
            Prize {
                id: 20,
                giveaway_id: giveaway.id,
                name: "Mug".to_string(),
                quantity: 1,
                additional_info: None,
            },
        ];
        let winner = |user_id, prize_id, quantity_won| Winner {
            id: user_id,
            user_id,
            giveaway_id: giveaway.id,
            prize_id,
            quantity_won,
            accepted: false,
            created_at: time::OffsetDateTime::now_utc(),
        };

        let content = render_winners(&giveaway, &prizes, &[winner(1, 10, 2), winner(3, 20, 1)]);

        assert!(content.contains("1st prize, Steam key: <@1> (x2)"));
        assert!(content.contains("2nd prize, Mug: <@3>"));
    }

    #[tokio::test]
    async fn announcing_requires_an_ended_giveaway() {
        let store = Arc::new(MemoryGiveawayStore::new());
        let giveaway = store.seed(1, &[1], &[1], None, EndAutomation::None);
        let (engine, _) = test_engine(store);

        let result = engine.announce(giveaway.id).await;

        assert!(matches!(result, Err(GiveawayError::InvalidState(_))));
    }

    #[tokio::test]
    async fn announcement_posts_once_and_then_edits() {
        let store = Arc::new(MemoryGiveawayStore::new());
        let giveaway = store.seed(2, &[1, 2, 3], &[2], None, EndAutomation::None);
        let (engine, messenger) = test_engine(store.clone());
        engine.end_giveaway(giveaway.id).await.unwrap();
        engine
            .roll_and_sign(crate::engine::selection::RollParams::new(giveaway.id))
            .await
            .unwrap();

        let first = engine.announce(giveaway.id).await.unwrap();
        let second = engine.announce(giveaway.id).await.unwrap();

        assert_eq!(first.dms_sent, 2);
        assert!(first.winner_message_id.is_some());
        assert_eq!(first.winner_message_id, second.winner_message_id);
        assert_eq!(
            store.giveaway(giveaway.id).unwrap().winner_message_id,
            first.winner_message_id
        );
        let sent = messenger
            .channel_calls()
            .into_iter()
            .filter(|call| matches!(call, ChannelCall::Sent { .. }))
            .count();
        assert_eq!(sent, 1);
    }

    #[tokio::test]
    async fn failed_deliveries_do_not_fail_the_announcement() {
        let store = Arc::new(MemoryGiveawayStore::new());
        let giveaway = store.seed(1, &[1], &[1], None, EndAutomation::None);
        let (engine, messenger) = test_engine(store.clone());
        engine.end_giveaway(giveaway.id).await.unwrap();
        engine
            .roll_and_sign(crate::engine::selection::RollParams::new(giveaway.id))
            .await
            .unwrap();
        messenger.set_failing(true);

        let announcement = engine.announce(giveaway.id).await.unwrap();

        assert_eq!(announcement.dms_failed, 1);
        assert_eq!(announcement.winner_message_id, None);
    }
}
