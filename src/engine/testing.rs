use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicI64, Ordering},
        Arc, Mutex,
    },
};

use time::OffsetDateTime;

use crate::{
    database::memory::MemoryGiveawayStore,
    models::error::{GiveawayError, GiveawayResult},
};

use super::{eligibility::MemberProfile, GiveawayEngine, MemberDirectory, Messenger};

pub const TEST_SEED: u64 = 0x5eed;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelCall {
    Sent { channel_id: i64, content: String },
    Edited { channel_id: i64, message_id: i64, content: String },
    Deleted { channel_id: i64, message_id: i64 },
}

/// Messenger that remembers everything and can be told to fail.
#[derive(Default)]
pub struct RecordingMessenger {
    dms: Mutex<Vec<(i64, String)>>,
    channel_calls: Mutex<Vec<ChannelCall>>,
    failing: AtomicBool,
    next_message_id: AtomicI64,
}

impl RecordingMessenger {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn dms(&self) -> Vec<(i64, String)> {
        self.dms.lock().unwrap().clone()
    }

    pub fn dms_to(&self, user_id: i64) -> Vec<String> {
        self.dms()
            .into_iter()
            .filter(|(recipient, _)| *recipient == user_id)
            .map(|(_, content)| content)
            .collect()
    }

    pub fn channel_calls(&self) -> Vec<ChannelCall> {
        self.channel_calls.lock().unwrap().clone()
    }

    fn fail_if_asked(&self) -> GiveawayResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(GiveawayError::Delivery("messaging is down".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Messenger for RecordingMessenger {
    async fn send_dm(&self, user_id: i64, content: &str) -> GiveawayResult<()> {
        self.fail_if_asked()?;
        self.dms.lock().unwrap().push((user_id, content.to_string()));
        Ok(())
    }

    async fn send_or_edit_or_delete_message(
        &self,
        channel_id: i64,
        message_id: Option<i64>,
        content: Option<&str>,
    ) -> GiveawayResult<Option<i64>> {
        self.fail_if_asked()?;
        let mut calls = self.channel_calls.lock().unwrap();
        match (message_id, content) {
            (None, Some(content)) => {
                let message_id = 9000 + self.next_message_id.fetch_add(1, Ordering::SeqCst);
                calls.push(ChannelCall::Sent {
                    channel_id,
                    content: content.to_string(),
                });
                Ok(Some(message_id))
            }
            (Some(message_id), Some(content)) => {
                calls.push(ChannelCall::Edited {
                    channel_id,
                    message_id,
                    content: content.to_string(),
                });
                Ok(Some(message_id))
            }
            (Some(message_id), None) => {
                calls.push(ChannelCall::Deleted {
                    channel_id,
                    message_id,
                });
                Ok(None)
            }
            (None, None) => Ok(None),
        }
    }
}

/// Roster fake. Without explicit profiles every requested user is a member
/// with no roles and a year-old account.
#[derive(Default)]
pub struct StaticMembers {
    profiles: Option<HashMap<i64, MemberProfile>>,
}

impl StaticMembers {
    pub fn everyone() -> Self {
        StaticMembers::default()
    }

    pub fn with_roles(members: &[(i64, &[i64])]) -> Self {
        let created = OffsetDateTime::now_utc() - time::Duration::days(365);
        StaticMembers {
            profiles: Some(
                members
                    .iter()
                    .map(|(user_id, roles)| {
                        (
                            *user_id,
                            MemberProfile {
                                user_id: *user_id,
                                role_ids: roles.iter().copied().collect(),
                                account_created_at: created,
                            },
                        )
                    })
                    .collect(),
            ),
        }
    }
}

#[async_trait::async_trait]
impl MemberDirectory for StaticMembers {
    async fn members(&self, _guild_id: i64, user_ids: &[i64]) -> GiveawayResult<Vec<MemberProfile>> {
        let created = OffsetDateTime::now_utc() - time::Duration::days(365);
        Ok(user_ids
            .iter()
            .filter_map(|user_id| match &self.profiles {
                Some(profiles) => profiles.get(user_id).cloned(),
                None => Some(MemberProfile {
                    user_id: *user_id,
                    role_ids: Default::default(),
                    account_created_at: created,
                }),
            })
            .collect())
    }
}

pub fn engine_with_members(
    store: Arc<MemoryGiveawayStore>,
    members: StaticMembers,
) -> (GiveawayEngine, Arc<RecordingMessenger>) {
    let messenger = Arc::new(RecordingMessenger::default());
    let engine = GiveawayEngine::with_seed(store, messenger.clone(), Arc::new(members), TEST_SEED);
    (engine, messenger)
}

pub fn test_engine(store: Arc<MemoryGiveawayStore>) -> (GiveawayEngine, Arc<RecordingMessenger>) {
    engine_with_members(store, StaticMembers::everyone())
}
