use std::sync::{Arc, Mutex, PoisonError};

use rand::{rngs::StdRng, SeedableRng};

use crate::{database::GiveawayStore, models::error::GiveawayResult};

use self::eligibility::MemberProfile;

pub mod announce;
pub mod automation;
pub mod claim;
pub mod eligibility;
pub mod reroll;
pub mod sampling;
pub mod scheduler;
pub mod selection;
#[cfg(test)]
pub mod testing;

/// Outgoing chat messages. Every call is best effort: a failure comes back as
/// `GiveawayError::Delivery` and callers drop it.
#[async_trait::async_trait]
pub trait Messenger: Send + Sync {
    async fn send_dm(&self, user_id: i64, content: &str) -> GiveawayResult<()>;

    /// Sends a new message when `message_id` is `None`, edits it when both are
    /// given, deletes it when `content` is `None`. Returns the id of the message
    /// that now exists, if any.
    async fn send_or_edit_or_delete_message(
        &self,
        channel_id: i64,
        message_id: Option<i64>,
        content: Option<&str>,
    ) -> GiveawayResult<Option<i64>>;
}

/// The guild roster as seen by the eligibility filter.
#[async_trait::async_trait]
pub trait MemberDirectory: Send + Sync {
    /// Profiles of the given users that are still members of the guild.
    async fn members(&self, guild_id: i64, user_ids: &[i64]) -> GiveawayResult<Vec<MemberProfile>>;
}

/// Owns the collaborators of the giveaway lifecycle and exposes its operations:
/// scheduler ticks, rolls, rerolls, claims, manual ends and announcements.
pub struct GiveawayEngine {
    store: Arc<dyn GiveawayStore>,
    messenger: Arc<dyn Messenger>,
    members: Arc<dyn MemberDirectory>,
    rng: Mutex<StdRng>,
}

impl GiveawayEngine {
    pub fn new(
        store: Arc<dyn GiveawayStore>,
        messenger: Arc<dyn Messenger>,
        members: Arc<dyn MemberDirectory>,
    ) -> Self {
        Self::with_rng(store, messenger, members, StdRng::from_entropy())
    }

    /// Same as [`GiveawayEngine::new`] but with reproducible draws.
    pub fn with_seed(
        store: Arc<dyn GiveawayStore>,
        messenger: Arc<dyn Messenger>,
        members: Arc<dyn MemberDirectory>,
        seed: u64,
    ) -> Self {
        Self::with_rng(store, messenger, members, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        store: Arc<dyn GiveawayStore>,
        messenger: Arc<dyn Messenger>,
        members: Arc<dyn MemberDirectory>,
        rng: StdRng,
    ) -> Self {
        GiveawayEngine {
            store,
            messenger,
            members,
            rng: Mutex::new(rng),
        }
    }

    pub fn store(&self) -> &dyn GiveawayStore {
        self.store.as_ref()
    }

    pub fn messenger(&self) -> &dyn Messenger {
        self.messenger.as_ref()
    }

    fn sample<T>(&self, bucket: Vec<T>, count: usize) -> Vec<T> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        sampling::sample_without_replacement(bucket, count, &mut *rng)
    }
}
