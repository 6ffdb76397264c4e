use std::{collections::HashSet, sync::Arc};

use serenity::{
    all::{ChannelId, GuildId, Http, MessageId, UserId},
    builder::{CreateMessage, EditMessage},
};
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::{
    engine::{eligibility::MemberProfile, MemberDirectory, Messenger},
    models::error::{GiveawayError, GiveawayResult},
};

const MEMBER_PAGE_SIZE: u64 = 1000;

/// Discord ids are stored as `BIGINT`; anything that is not a positive
/// snowflake cannot be addressed.
pub fn snowflake(id: i64) -> GiveawayResult<u64> {
    match u64::try_from(id) {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(GiveawayError::Delivery(format!("{id} is not a Discord id"))),
    }
}

pub struct SerenityMessenger {
    pub http: Arc<Http>,
}

#[async_trait::async_trait]
impl Messenger for SerenityMessenger {
    async fn send_dm(&self, user_id: i64, content: &str) -> GiveawayResult<()> {
        let user = UserId::new(snowflake(user_id)?);
        let channel = user.create_dm_channel(&*self.http).await?;
        channel
            .send_message(&*self.http, CreateMessage::new().content(content))
            .await?;
        Ok(())
    }

    async fn send_or_edit_or_delete_message(
        &self,
        channel_id: i64,
        message_id: Option<i64>,
        content: Option<&str>,
    ) -> GiveawayResult<Option<i64>> {
        let channel = ChannelId::new(snowflake(channel_id)?);

        match (message_id, content) {
            (Some(message_id), None) => {
                channel
                    .delete_message(&*self.http, MessageId::new(snowflake(message_id)?))
                    .await?;
                Ok(None)
            }
            (Some(message_id), Some(content)) => {
                let edit = EditMessage::new()
                    .content(content)
                    .embeds(vec![])
                    .components(vec![]);
                match channel
                    .edit_message(&*self.http, MessageId::new(snowflake(message_id)?), edit)
                    .await
                {
                    Ok(message) => Ok(Some(message.id.get() as i64)),
                    Err(err) => {
                        warn!(
                            "Could not edit message {} in channel {}, sending a new one. Failed with error: {:?}",
                            message_id, channel_id, err
                        );
                        let message = channel
                            .send_message(&*self.http, CreateMessage::new().content(content))
                            .await?;
                        Ok(Some(message.id.get() as i64))
                    }
                }
            }
            (None, Some(content)) => {
                let message = channel
                    .send_message(&*self.http, CreateMessage::new().content(content))
                    .await?;
                Ok(Some(message.id.get() as i64))
            }
            (None, None) => Ok(None),
        }
    }
}

pub struct SerenityMembers {
    pub http: Arc<Http>,
}

#[async_trait::async_trait]
impl MemberDirectory for SerenityMembers {
    async fn members(&self, guild_id: i64, user_ids: &[i64]) -> GiveawayResult<Vec<MemberProfile>> {
        let start = std::time::Instant::now();
        let guild = GuildId::new(snowflake(guild_id)?);
        let wanted = user_ids.iter().copied().collect::<HashSet<_>>();

        let mut profiles = Vec::with_capacity(wanted.len());
        let mut after: Option<UserId> = None;
        loop {
            let page = guild
                .members(&*self.http, Some(MEMBER_PAGE_SIZE), after)
                .await?;
            let Some(last) = page.last() else {
                break;
            };
            after = Some(last.user.id);
            let full_page = page.len() as u64 == MEMBER_PAGE_SIZE;

            for member in page {
                let user_id = member.user.id.get() as i64;
                if !wanted.contains(&user_id) {
                    continue;
                }
                let account_created_at =
                    OffsetDateTime::from_unix_timestamp(member.user.id.created_at().unix_timestamp())
                        .map_err(|err| GiveawayError::Corrupt(err.to_string()))?;
                profiles.push(MemberProfile {
                    user_id,
                    role_ids: member.roles.iter().map(|role| role.get() as i64).collect(),
                    account_created_at,
                });
            }

            if !full_page || profiles.len() == wanted.len() {
                break;
            }
        }

        debug!(
            "Resolved {} of {} entrants in guild {} in {:?}",
            profiles.len(),
            wanted.len(),
            guild_id,
            start.elapsed()
        );
        Ok(profiles)
    }
}
