use std::collections::{HashMap, HashSet};

use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::models::{
    error::{GiveawayError, GiveawayResult},
    giveaway::{Allocation, Giveaway, Prize, ReplaceScope, Winner},
};

use super::{eligibility::filter_eligible, GiveawayEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollParams {
    pub giveaway_id: i64,
    /// Draw from every entrant, skipping the role and account age checks.
    pub ignore_requirements: bool,
    /// Throw away every existing winner, accepted or not, and roll all prizes.
    pub override_claimed: bool,
}

impl RollParams {
    pub fn new(giveaway_id: i64) -> Self {
        RollParams {
            giveaway_id,
            ignore_requirements: false,
            override_claimed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollOutcome {
    /// Winner rows written by this roll.
    pub winners: Vec<Winner>,
    /// Winner slots the giveaway asked for in this roll.
    pub requested: usize,
    /// Winners actually drawn.
    pub drawn: usize,
    /// Fewer prize units than requested winners; hosts should be told.
    pub clamped_by_prizes: bool,
    pub eligible_entrants: usize,
}

/// Units of one prize still to be handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrizeStock {
    pub prize_id: i64,
    pub remaining: i32,
}

/// Prize units a roll may hand out, in declared order. Without
/// `override_claimed` units already accepted by a winner are held back.
pub fn remaining_stock(prizes: &[Prize], winners: &[Winner], override_claimed: bool) -> Vec<PrizeStock> {
    let mut claimed: HashMap<i64, i32> = HashMap::new();
    if !override_claimed {
        for winner in winners.iter().filter(|winner| winner.accepted) {
            *claimed.entry(winner.prize_id).or_default() += winner.quantity_won;
        }
    }

    prizes
        .iter()
        .map(|prize| PrizeStock {
            prize_id: prize.id,
            remaining: (prize.quantity - claimed.get(&prize.id).copied().unwrap_or(0)).max(0),
        })
        .filter(|stock| stock.remaining > 0)
        .collect()
}

/// Signs one unit of the current prize to each drawn winner, moving to the
/// next prize once the current one runs out. Repeated (user, prize) pairs
/// are merged.
pub fn allocate(chosen: &[i64], stock: &mut [PrizeStock]) -> Vec<Allocation> {
    let mut allocations: Vec<Allocation> = vec![];
    let mut index_of: HashMap<(i64, i64), usize> = HashMap::new();
    let mut current = 0;

    for user_id in chosen {
        while current < stock.len() && stock[current].remaining <= 0 {
            current += 1;
        }
        let Some(prize) = stock.get_mut(current) else {
            break;
        };
        prize.remaining -= 1;

        match index_of.get(&(*user_id, prize.prize_id)) {
            Some(index) => allocations[*index].quantity_won += 1,
            None => {
                index_of.insert((*user_id, prize.prize_id), allocations.len());
                allocations.push(Allocation {
                    user_id: *user_id,
                    prize_id: prize.prize_id,
                    quantity_won: 1,
                });
            }
        }
    }

    allocations
}

impl GiveawayEngine {
    pub(super) async fn eligible_entrants(&self, giveaway: &Giveaway) -> GiveawayResult<HashSet<i64>> {
        if giveaway.entries.is_empty() {
            return Ok(HashSet::new());
        }

        let user_ids = giveaway.entries.iter().copied().collect::<Vec<_>>();
        let roster = self.members.members(giveaway.guild_id, &user_ids).await?;

        Ok(filter_eligible(
            &giveaway.entries,
            &roster,
            &giveaway.required_roles,
            giveaway.minimum_account_age,
            OffsetDateTime::now_utc(),
        ))
    }

    /// Draws winners for a giveaway and writes them. When no one is eligible
    /// the rows this roll would replace are still cleared, and no new rows
    /// are written.
    pub async fn roll_and_sign(&self, params: RollParams) -> GiveawayResult<RollOutcome> {
        let start = std::time::Instant::now();
        let giveaway = self
            .store
            .get_giveaway(params.giveaway_id)
            .await?
            .ok_or(GiveawayError::giveaway_not_found(params.giveaway_id))?;

        let prizes = self.store.get_prizes(giveaway.id).await?;
        if prizes.is_empty() {
            return Err(GiveawayError::InvalidState("the giveaway has no prizes"));
        }

        let existing = self.store.get_winners(giveaway.id).await?;
        let mut stock = remaining_stock(&prizes, &existing, params.override_claimed);
        let supply = stock
            .iter()
            .map(|prize| usize::try_from(prize.remaining).unwrap_or(0))
            .sum::<usize>();

        let accepted_users = if params.override_claimed {
            HashSet::new()
        } else {
            existing
                .iter()
                .filter(|winner| winner.accepted)
                .map(|winner| winner.user_id)
                .collect::<HashSet<_>>()
        };
        let requested = usize::try_from(giveaway.winner_quantity)
            .unwrap_or(0)
            .saturating_sub(accepted_users.len());

        let eligible = if params.ignore_requirements {
            giveaway.entries.clone()
        } else {
            self.eligible_entrants(&giveaway).await?
        };
        let mut bucket = eligible
            .into_iter()
            .filter(|user_id| !accepted_users.contains(user_id))
            .collect::<Vec<_>>();
        bucket.sort_unstable();

        let eligible_entrants = bucket.len();
        let effective = requested.min(supply).min(eligible_entrants);
        let clamped_by_prizes = supply < requested;

        debug!(
            "Giveaway {} roll: {} requested, {} prize units, {} eligible",
            giveaway.id, requested, supply, eligible_entrants
        );

        let scope = if params.override_claimed {
            ReplaceScope::All
        } else {
            ReplaceScope::Unaccepted
        };

        if eligible_entrants == 0 {
            let stale = existing
                .iter()
                .filter(|winner| params.override_claimed || !winner.accepted)
                .count();
            if stale > 0 {
                self.store.write_roll(giveaway.id, scope, &[]).await?;
            }
            info!(
                "Giveaway {} has no eligible entrants, nothing was rolled and {} old winners were cleared",
                giveaway.id, stale
            );
            return Ok(RollOutcome {
                winners: vec![],
                requested,
                drawn: 0,
                clamped_by_prizes,
                eligible_entrants,
            });
        }

        let chosen = self.sample(bucket, effective);
        if chosen.len() < effective {
            warn!(
                "Giveaway {} only drew {} of {} winners",
                giveaway.id,
                chosen.len(),
                effective
            );
        }

        let allocations = allocate(&chosen, &mut stock);
        let winners = self
            .store
            .write_roll(giveaway.id, scope, &allocations)
            .await?;

        info!(
            "Rolled {} winners for giveaway {} in {:?}",
            chosen.len(),
            giveaway.id,
            start.elapsed()
        );

        Ok(RollOutcome {
            winners,
            requested,
            drawn: chosen.len(),
            clamped_by_prizes,
            eligible_entrants,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, sync::Arc};

    use super::*;
    use crate::{
        database::memory::MemoryGiveawayStore,
        engine::testing::{engine_with_members, test_engine, StaticMembers},
        models::giveaway::EndAutomation,
    };

    fn quantity_by_prize(winners: &[Winner]) -> HashMap<i64, i32> {
        let mut totals = HashMap::new();
        for winner in winners {
            *totals.entry(winner.prize_id).or_default() += winner.quantity_won;
        }
        totals
    }

    #[test]
    fn allocation_consumes_prizes_in_order() {
        let mut stock = vec![
            PrizeStock {
                prize_id: 10,
                remaining: 2,
            },
            PrizeStock {
                prize_id: 20,
                remaining: 1,
            },
        ];

        let allocations = allocate(&[1, 2, 3], &mut stock);

        assert_eq!(
            allocations,
            vec![
                Allocation {
                    user_id: 1,
                    prize_id: 10,
                    quantity_won: 1
                },
                Allocation {
                    user_id: 2,
                    prize_id: 10,
                    quantity_won: 1
                },
                Allocation {
                    user_id: 3,
                    prize_id: 20,
                    quantity_won: 1
                },
            ]
        );
        assert!(stock.iter().all(|prize| prize.remaining == 0));
    }

    #[test]
    fn allocation_merges_repeated_pairs() {
        let mut stock = vec![PrizeStock {
            prize_id: 10,
            remaining: 3,
        }];

        let allocations = allocate(&[1, 1], &mut stock);

        assert_eq!(
            allocations,
            vec![Allocation {
                user_id: 1,
                prize_id: 10,
                quantity_won: 2
            }]
        );
    }

    #[test]
    fn allocation_stops_when_stock_runs_out() {
        let mut stock = vec![PrizeStock {
            prize_id: 10,
            remaining: 1,
        }];

        let allocations = allocate(&[1, 2, 3], &mut stock);

        assert_eq!(allocations.len(), 1);
    }

    #[test]
    fn accepted_units_are_held_back_from_stock() {
        let prizes = vec![Prize {
            id: 10,
            giveaway_id: 1,
            name: "Key".to_string(),
            quantity: 3,
            additional_info: None,
        }];
        let winners = vec![
            Winner {
                id: 1,
                user_id: 5,
                giveaway_id: 1,
                prize_id: 10,
                quantity_won: 2,
                accepted: true,
                created_at: OffsetDateTime::now_utc(),
            },
            Winner {
                id: 2,
                user_id: 6,
                giveaway_id: 1,
                prize_id: 10,
                quantity_won: 1,
                accepted: false,
                created_at: OffsetDateTime::now_utc(),
            },
        ];

        assert_eq!(
            remaining_stock(&prizes, &winners, false),
            vec![PrizeStock {
                prize_id: 10,
                remaining: 1
            }]
        );
        assert_eq!(
            remaining_stock(&prizes, &winners, true),
            vec![PrizeStock {
                prize_id: 10,
                remaining: 3
            }]
        );
    }

    #[tokio::test]
    async fn three_winners_split_over_two_prizes() {
        let store = Arc::new(MemoryGiveawayStore::new());
        let giveaway = store.seed(3, &[1, 2, 3, 4, 5], &[2, 1], None, EndAutomation::None);
        let (engine, _) = test_engine(store.clone());

        let outcome = engine
            .roll_and_sign(RollParams::new(giveaway.id))
            .await
            .unwrap();

        assert_eq!(outcome.drawn, 3);
        let users = outcome
            .winners
            .iter()
            .map(|winner| winner.user_id)
            .collect::<HashSet<_>>();
        assert_eq!(users.len(), 3);

        let prizes = engine.store().get_prizes(giveaway.id).await.unwrap();
        let totals = quantity_by_prize(&store.winners(giveaway.id));
        assert_eq!(totals.get(&prizes[0].id), Some(&2));
        assert_eq!(totals.get(&prizes[1].id), Some(&1));
    }

    #[tokio::test]
    async fn winner_count_is_clamped_by_prize_supply() {
        let store = Arc::new(MemoryGiveawayStore::new());
        let entries = (1..=10).collect::<Vec<_>>();
        let giveaway = store.seed(5, &entries, &[2], None, EndAutomation::None);
        let (engine, _) = test_engine(store.clone());

        let outcome = engine
            .roll_and_sign(RollParams::new(giveaway.id))
            .await
            .unwrap();

        assert_eq!(outcome.drawn, 2);
        assert!(outcome.clamped_by_prizes);
        assert_eq!(store.winners(giveaway.id).len(), 2);
    }

    #[tokio::test]
    async fn winner_count_is_clamped_by_entrants() {
        let store = Arc::new(MemoryGiveawayStore::new());
        let giveaway = store.seed(4, &[1, 2], &[10], None, EndAutomation::None);
        let (engine, _) = test_engine(store.clone());

        let outcome = engine
            .roll_and_sign(RollParams::new(giveaway.id))
            .await
            .unwrap();

        assert_eq!(outcome.drawn, 2);
        assert!(!outcome.clamped_by_prizes);
    }

    #[tokio::test]
    async fn no_eligible_entrants_writes_nothing() {
        let store = Arc::new(MemoryGiveawayStore::new());
        let giveaway = store.seed(3, &[], &[3], None, EndAutomation::None);
        let (engine, _) = test_engine(store.clone());
        let writes_before = store.write_count();

        let outcome = engine
            .roll_and_sign(RollParams::new(giveaway.id))
            .await
            .unwrap();

        assert_eq!(outcome.drawn, 0);
        assert!(outcome.winners.is_empty());
        assert!(store.winners(giveaway.id).is_empty());
        assert_eq!(store.write_count(), writes_before);
    }

    #[tokio::test]
    async fn giveaway_without_prizes_is_rejected_before_any_write() {
        let store = Arc::new(MemoryGiveawayStore::new());
        let giveaway = store.seed(1, &[1, 2], &[], None, EndAutomation::None);
        let (engine, _) = test_engine(store.clone());
        let writes_before = store.write_count();

        let result = engine.roll_and_sign(RollParams::new(giveaway.id)).await;

        assert!(matches!(result, Err(GiveawayError::InvalidState(_))));
        assert_eq!(store.write_count(), writes_before);
    }

    #[tokio::test]
    async fn missing_giveaway_is_not_found() {
        let store = Arc::new(MemoryGiveawayStore::new());
        let (engine, _) = test_engine(store);

        let result = engine.roll_and_sign(RollParams::new(404)).await;

        assert!(matches!(
            result,
            Err(GiveawayError::NotFound { id: 404, .. })
        ));
    }

    #[tokio::test]
    async fn requirements_filter_the_bucket_unless_ignored() {
        let store = Arc::new(MemoryGiveawayStore::new());
        let giveaway = store.seed(3, &[1, 2, 3], &[3], None, EndAutomation::None);
        store.update_giveaway(giveaway.id, |giveaway| {
            giveaway.required_roles = [77].into_iter().collect();
        });
        let members = StaticMembers::with_roles(&[(1, &[77]), (2, &[]), (3, &[])]);
        let (engine, _) = engine_with_members(store.clone(), members);

        let gated = engine
            .roll_and_sign(RollParams::new(giveaway.id))
            .await
            .unwrap();
        assert_eq!(gated.drawn, 1);
        assert_eq!(gated.winners[0].user_id, 1);

        let ungated = engine
            .roll_and_sign(RollParams {
                ignore_requirements: true,
                override_claimed: true,
                ..RollParams::new(giveaway.id)
            })
            .await
            .unwrap();
        assert_eq!(ungated.drawn, 3);
    }

    #[tokio::test]
    async fn accepted_winners_keep_their_prizes_on_a_new_roll() {
        let store = Arc::new(MemoryGiveawayStore::new());
        let giveaway = store.seed(2, &[1, 2, 3, 4, 5, 6], &[2], None, EndAutomation::None);
        let (engine, _) = test_engine(store.clone());

        let first = engine
            .roll_and_sign(RollParams::new(giveaway.id))
            .await
            .unwrap();
        let keeper = first.winners[0].clone();
        store.force_accept(giveaway.id, keeper.user_id);

        let second = engine
            .roll_and_sign(RollParams::new(giveaway.id))
            .await
            .unwrap();

        assert_eq!(second.requested, 1);
        assert_eq!(second.drawn, 1);
        assert_ne!(second.winners[0].user_id, keeper.user_id);

        let winners = store.winners(giveaway.id);
        assert_eq!(winners.len(), 2);
        assert!(winners
            .iter()
            .any(|winner| winner.id == keeper.id && winner.accepted));
    }

    #[tokio::test]
    async fn seeded_engines_draw_the_same_winners() {
        let entries = (1..=20).collect::<Vec<_>>();
        let mut draws = vec![];
        for _ in 0..2 {
            let store = Arc::new(MemoryGiveawayStore::new());
            let giveaway = store.seed(4, &entries, &[4], None, EndAutomation::None);
            let (engine, _) = test_engine(store.clone());
            let outcome = engine
                .roll_and_sign(RollParams::new(giveaway.id))
                .await
                .unwrap();
            draws.push(
                outcome
                    .winners
                    .iter()
                    .map(|winner| winner.user_id)
                    .collect::<Vec<_>>(),
            );
        }

        assert_eq!(draws[0], draws[1]);
    }
}
