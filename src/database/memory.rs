use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex, MutexGuard,
    },
};

use time::OffsetDateTime;

use crate::{
    database::GiveawayStore,
    models::{
        error::{GiveawayError, GiveawayResult},
        giveaway::{
            Allocation, EndAutomation, Giveaway, HostNotified, NewGiveaway, NewPrize, Prize,
            ReplaceScope, Winner,
        },
    },
};

#[derive(Default)]
struct State {
    next_id: i64,
    giveaways: HashMap<i64, Giveaway>,
    prizes: Vec<Prize>,
    winners: Vec<Winner>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process store with the same compare-and-set semantics as Postgres.
/// Counts every write it is asked to perform.
#[derive(Default)]
pub struct MemoryGiveawayStore {
    state: Mutex<State>,
    writes: AtomicUsize,
    failing: Mutex<HashSet<i64>>,
}

impl MemoryGiveawayStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes every write touching `giveaway_id` fail with a persistence error.
    pub fn fail_writes_for(&self, giveaway_id: i64) {
        self.failing
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(giveaway_id);
    }

    fn write(&self, giveaway_id: i64) -> GiveawayResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failing
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if failing.contains(&giveaway_id) {
            return Err(GiveawayError::Persistence(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    pub fn giveaway(&self, id: i64) -> Option<Giveaway> {
        self.state().giveaways.get(&id).cloned()
    }

    pub fn winners(&self, giveaway_id: i64) -> Vec<Winner> {
        self.state()
            .winners
            .iter()
            .filter(|winner| winner.giveaway_id == giveaway_id)
            .cloned()
            .collect()
    }

    /// Seeds a giveaway together with its entrants and prizes.
    pub fn seed(
        &self,
        winner_quantity: i32,
        entries: &[i64],
        prize_quantities: &[i32],
        end_date: Option<OffsetDateTime>,
        end_automation: EndAutomation,
    ) -> Giveaway {
        let mut state = self.state();
        let id = state.next_id();
        let giveaway = Giveaway {
            id,
            guild_id: 1,
            guild_relative_id: id,
            host_id: 99,
            title: format!("Giveaway {id}"),
            description: None,
            winner_quantity,
            entries: entries.iter().copied().collect(),
            required_roles: HashSet::new(),
            minimum_account_age: None,
            end_date,
            ended: false,
            entries_locked: false,
            end_automation,
            host_notified: HostNotified::None,
            channel_id: 500,
            announcement_message_id: Some(600 + id),
            winner_message_id: None,
        };
        state.giveaways.insert(id, giveaway.clone());

        for (index, quantity) in prize_quantities.iter().enumerate() {
            let prize_id = state.next_id();
            state.prizes.push(Prize {
                id: prize_id,
                giveaway_id: id,
                name: format!("Prize {}", index + 1),
                quantity: *quantity,
                additional_info: None,
            });
        }

        giveaway
    }

    /// Marks an existing winner row accepted without going through the engine.
    pub fn force_accept(&self, giveaway_id: i64, user_id: i64) {
        for winner in &mut self.state().winners {
            if winner.giveaway_id == giveaway_id && winner.user_id == user_id {
                winner.accepted = true;
            }
        }
    }

    pub fn update_giveaway(&self, id: i64, update: impl FnOnce(&mut Giveaway)) {
        if let Some(giveaway) = self.state().giveaways.get_mut(&id) {
            update(giveaway);
        }
    }
}

#[async_trait::async_trait]
impl GiveawayStore for MemoryGiveawayStore {
    async fn create_giveaway(&self, giveaway: NewGiveaway) -> GiveawayResult<Giveaway> {
        self.write(0)?;
        let mut state = self.state();
        let id = state.next_id();
        let guild_relative_id = state
            .giveaways
            .values()
            .filter(|existing| existing.guild_id == giveaway.guild_id)
            .map(|existing| existing.guild_relative_id)
            .max()
            .unwrap_or(0)
            + 1;
        let created = Giveaway {
            id,
            guild_id: giveaway.guild_id,
            guild_relative_id,
            host_id: giveaway.host_id,
            title: giveaway.title,
            description: giveaway.description,
            winner_quantity: giveaway.winner_quantity,
            entries: HashSet::new(),
            required_roles: giveaway.required_roles,
            minimum_account_age: giveaway.minimum_account_age,
            end_date: giveaway.end_date,
            ended: false,
            entries_locked: false,
            end_automation: giveaway.end_automation,
            host_notified: HostNotified::None,
            channel_id: giveaway.channel_id,
            announcement_message_id: None,
            winner_message_id: None,
        };
        state.giveaways.insert(id, created.clone());
        Ok(created)
    }

    async fn add_prize(&self, prize: NewPrize) -> GiveawayResult<Prize> {
        self.write(prize.giveaway_id)?;
        let mut state = self.state();
        match state.giveaways.get(&prize.giveaway_id) {
            Some(giveaway) if !giveaway.ended => {}
            _ => {
                return Err(GiveawayError::InvalidState(
                    "prizes can only be added to a giveaway that has not ended",
                ))
            }
        }
        let id = state.next_id();
        let created = Prize {
            id,
            giveaway_id: prize.giveaway_id,
            name: prize.name,
            quantity: prize.quantity,
            additional_info: prize.additional_info,
        };
        state.prizes.push(created.clone());
        Ok(created)
    }

    async fn add_entry(&self, giveaway_id: i64, user_id: i64) -> GiveawayResult<bool> {
        self.write(giveaway_id)?;
        let mut state = self.state();
        match state.giveaways.get_mut(&giveaway_id) {
            Some(giveaway) if !giveaway.entries_locked => Ok(giveaway.entries.insert(user_id)),
            _ => Ok(false),
        }
    }

    async fn get_giveaway(&self, id: i64) -> GiveawayResult<Option<Giveaway>> {
        Ok(self.state().giveaways.get(&id).cloned())
    }

    async fn get_giveaway_by_relative_id(
        &self,
        guild_id: i64,
        guild_relative_id: i64,
    ) -> GiveawayResult<Option<Giveaway>> {
        Ok(self
            .state()
            .giveaways
            .values()
            .find(|giveaway| {
                giveaway.guild_id == guild_id && giveaway.guild_relative_id == guild_relative_id
            })
            .cloned())
    }

    async fn due_giveaways(
        &self,
        now: OffsetDateTime,
        notify_before: OffsetDateTime,
    ) -> GiveawayResult<Vec<Giveaway>> {
        let mut due = self
            .state()
            .giveaways
            .values()
            .filter(|giveaway| !giveaway.ended && giveaway.host_notified != HostNotified::OnEnd)
            .filter(|giveaway| match giveaway.end_date {
                Some(end_date) => {
                    end_date <= now
                        || (end_date <= notify_before
                            && giveaway.host_notified == HostNotified::None)
                }
                None => false,
            })
            .cloned()
            .collect::<Vec<_>>();
        due.sort_by_key(|giveaway| (giveaway.end_date, giveaway.id));
        Ok(due)
    }

    async fn mark_host_notified(&self, giveaway_id: i64) -> GiveawayResult<bool> {
        self.write(giveaway_id)?;
        let mut state = self.state();
        match state.giveaways.get_mut(&giveaway_id) {
            Some(giveaway) if !giveaway.ended && giveaway.host_notified == HostNotified::None => {
                giveaway.host_notified = HostNotified::BeforeEnd;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_deadline_notified(&self, giveaway_id: i64) -> GiveawayResult<bool> {
        self.write(giveaway_id)?;
        let mut state = self.state();
        match state.giveaways.get_mut(&giveaway_id) {
            Some(giveaway) if !giveaway.ended && giveaway.host_notified != HostNotified::OnEnd => {
                giveaway.host_notified = HostNotified::OnEnd;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_ended(&self, giveaway_id: i64) -> GiveawayResult<bool> {
        self.write(giveaway_id)?;
        let mut state = self.state();
        match state.giveaways.get_mut(&giveaway_id) {
            Some(giveaway) if !giveaway.ended => {
                giveaway.ended = true;
                giveaway.entries_locked = true;
                giveaway.host_notified = HostNotified::OnEnd;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn extend_end_date(
        &self,
        giveaway_id: i64,
        end_date: OffsetDateTime,
    ) -> GiveawayResult<bool> {
        self.write(giveaway_id)?;
        let mut state = self.state();
        match state.giveaways.get_mut(&giveaway_id) {
            Some(giveaway) if !giveaway.ended => {
                giveaway.end_date = Some(end_date);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_prizes(&self, giveaway_id: i64) -> GiveawayResult<Vec<Prize>> {
        let mut prizes = self
            .state()
            .prizes
            .iter()
            .filter(|prize| prize.giveaway_id == giveaway_id)
            .cloned()
            .collect::<Vec<_>>();
        prizes.sort_by_key(|prize| prize.id);
        Ok(prizes)
    }

    async fn get_winners(&self, giveaway_id: i64) -> GiveawayResult<Vec<Winner>> {
        Ok(self.winners(giveaway_id))
    }

    async fn write_roll(
        &self,
        giveaway_id: i64,
        scope: ReplaceScope,
        allocations: &[Allocation],
    ) -> GiveawayResult<Vec<Winner>> {
        self.write(giveaway_id)?;
        let mut state = self.state();
        state.winners.retain(|winner| {
            winner.giveaway_id != giveaway_id
                || match scope {
                    ReplaceScope::Unaccepted => winner.accepted,
                    ReplaceScope::All => false,
                }
        });

        let mut written = Vec::with_capacity(allocations.len());
        for allocation in allocations {
            let existing = state.winners.iter_mut().find(|winner| {
                winner.user_id == allocation.user_id && winner.prize_id == allocation.prize_id
            });
            if let Some(winner) = existing {
                winner.quantity_won += allocation.quantity_won;
                written.push(winner.clone());
                continue;
            }

            let id = state.next_id();
            let winner = Winner {
                id,
                user_id: allocation.user_id,
                giveaway_id,
                prize_id: allocation.prize_id,
                quantity_won: allocation.quantity_won,
                accepted: false,
                created_at: OffsetDateTime::now_utc(),
            };
            state.winners.push(winner.clone());
            written.push(winner);
        }

        Ok(written)
    }

    async fn accept_winners(
        &self,
        giveaway_id: i64,
        user_id: i64,
    ) -> GiveawayResult<Vec<Winner>> {
        self.write(giveaway_id)?;
        let mut accepted = vec![];
        for winner in &mut self.state().winners {
            if winner.giveaway_id == giveaway_id && winner.user_id == user_id && !winner.accepted
            {
                winner.accepted = true;
                accepted.push(winner.clone());
            }
        }
        Ok(accepted)
    }

    async fn set_announcement_message(
        &self,
        giveaway_id: i64,
        message_id: Option<i64>,
    ) -> GiveawayResult<()> {
        self.write(giveaway_id)?;
        if let Some(giveaway) = self.state().giveaways.get_mut(&giveaway_id) {
            giveaway.announcement_message_id = message_id;
        }
        Ok(())
    }

    async fn set_winner_message(
        &self,
        giveaway_id: i64,
        message_id: Option<i64>,
    ) -> GiveawayResult<()> {
        self.write(giveaway_id)?;
        if let Some(giveaway) = self.state().giveaways.get_mut(&giveaway_id) {
            giveaway.winner_message_id = message_id;
        }
        Ok(())
    }

    async fn delete_giveaway(&self, giveaway_id: i64) -> GiveawayResult<bool> {
        self.write(giveaway_id)?;
        let mut state = self.state();
        let removed = state.giveaways.remove(&giveaway_id).is_some();
        state.prizes.retain(|prize| prize.giveaway_id != giveaway_id);
        state
            .winners
            .retain(|winner| winner.giveaway_id != giveaway_id);
        Ok(removed)
    }
}
