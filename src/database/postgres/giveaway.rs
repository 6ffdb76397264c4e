use time::OffsetDateTime;
use tracing::debug;

use crate::{
    database::GiveawayStore,
    models::{
        error::{GiveawayError, GiveawayResult},
        giveaway::{
            to_primitive, Allocation, DatabaseGiveaway, DatabaseWinner, Giveaway, NewGiveaway,
            NewPrize, Prize, ReplaceScope, Winner,
        },
    },
};

fn select_giveaways(filter: &str) -> String {
    format!(
        "SELECT g.id, g.guild_id, g.guild_relative_id, g.host_id, g.title, g.description, \
         g.winner_quantity, g.required_roles, g.minimum_account_age, g.end_date, g.ended, \
         g.entries_locked, g.end_automation, g.host_notified, g.channel_id, \
         g.announcement_message_id, g.winner_message_id, \
         ARRAY(SELECT e.user_id FROM giveaway_entries e WHERE e.giveaway_id = g.id) AS entries \
         FROM giveaways g WHERE {filter}"
    )
}

const WINNER_COLUMNS: &str =
    "id, user_id, giveaway_id, prize_id, quantity_won, accepted, created_at";

#[derive(Clone)]
pub struct PostgresGiveawayStore {
    pool: sqlx::PgPool,
}

impl PostgresGiveawayStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        PostgresGiveawayStore { pool }
    }
}

#[async_trait::async_trait]
impl GiveawayStore for PostgresGiveawayStore {
    async fn create_giveaway(&self, giveaway: NewGiveaway) -> GiveawayResult<Giveaway> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO giveaways (guild_id, guild_relative_id, host_id, title, description, \
             winner_quantity, required_roles, minimum_account_age, end_date, end_automation, channel_id) \
             VALUES ($1, (SELECT COALESCE(MAX(guild_relative_id), 0) + 1 FROM giveaways WHERE guild_id = $1), \
             $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING id",
        )
        .bind(giveaway.guild_id)
        .bind(giveaway.host_id)
        .bind(&giveaway.title)
        .bind(&giveaway.description)
        .bind(giveaway.winner_quantity)
        .bind(giveaway.required_roles.iter().copied().collect::<Vec<i64>>())
        .bind(
            giveaway
                .minimum_account_age
                .map(|age| age.whole_seconds()),
        )
        .bind(giveaway.end_date.map(to_primitive))
        .bind(giveaway.end_automation.to_string())
        .bind(giveaway.channel_id)
        .fetch_one(&self.pool)
        .await?;

        debug!(
            "Created giveaway {} in guild {}",
            id, giveaway.guild_id
        );

        self.get_giveaway(id)
            .await?
            .ok_or(GiveawayError::giveaway_not_found(id))
    }

    async fn add_prize(&self, prize: NewPrize) -> GiveawayResult<Prize> {
        let prize = sqlx::query_as::<_, Prize>(
            "INSERT INTO giveaway_prizes (giveaway_id, name, quantity, additional_info) \
             SELECT id, $2, $3, $4 FROM giveaways WHERE id = $1 AND ended = false \
             RETURNING id, giveaway_id, name, quantity, additional_info",
        )
        .bind(prize.giveaway_id)
        .bind(&prize.name)
        .bind(prize.quantity)
        .bind(&prize.additional_info)
        .fetch_optional(&self.pool)
        .await?;

        prize.ok_or(GiveawayError::InvalidState(
            "prizes can only be added to a giveaway that has not ended",
        ))
    }

    async fn add_entry(&self, giveaway_id: i64, user_id: i64) -> GiveawayResult<bool> {
        let result = sqlx::query(
            "INSERT INTO giveaway_entries (giveaway_id, user_id) \
             SELECT id, $2 FROM giveaways WHERE id = $1 AND entries_locked = false \
             ON CONFLICT DO NOTHING",
        )
        .bind(giveaway_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn get_giveaway(&self, id: i64) -> GiveawayResult<Option<Giveaway>> {
        let row = sqlx::query_as::<_, DatabaseGiveaway>(&select_giveaways("g.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Giveaway::try_from).transpose()
    }

    async fn get_giveaway_by_relative_id(
        &self,
        guild_id: i64,
        guild_relative_id: i64,
    ) -> GiveawayResult<Option<Giveaway>> {
        let row = sqlx::query_as::<_, DatabaseGiveaway>(&select_giveaways(
            "g.guild_id = $1 AND g.guild_relative_id = $2",
        ))
        .bind(guild_id)
        .bind(guild_relative_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Giveaway::try_from).transpose()
    }

    async fn due_giveaways(
        &self,
        now: OffsetDateTime,
        notify_before: OffsetDateTime,
    ) -> GiveawayResult<Vec<Giveaway>> {
        let rows = sqlx::query_as::<_, DatabaseGiveaway>(&format!(
            "{} ORDER BY g.end_date",
            select_giveaways(
                "g.ended = false AND g.host_notified <> 'on_end' AND g.end_date IS NOT NULL \
                 AND (g.end_date <= $1 OR (g.end_date <= $2 AND g.host_notified = 'none'))",
            )
        ))
        .bind(to_primitive(now))
        .bind(to_primitive(notify_before))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Giveaway::try_from).collect()
    }

    async fn mark_host_notified(&self, giveaway_id: i64) -> GiveawayResult<bool> {
        let result = sqlx::query(
            "UPDATE giveaways SET host_notified = 'before_end' \
             WHERE id = $1 AND ended = false AND host_notified = 'none'",
        )
        .bind(giveaway_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_deadline_notified(&self, giveaway_id: i64) -> GiveawayResult<bool> {
        let result = sqlx::query(
            "UPDATE giveaways SET host_notified = 'on_end' \
             WHERE id = $1 AND ended = false AND host_notified <> 'on_end'",
        )
        .bind(giveaway_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_ended(&self, giveaway_id: i64) -> GiveawayResult<bool> {
        let result = sqlx::query(
            "UPDATE giveaways SET ended = true, entries_locked = true, host_notified = 'on_end' \
             WHERE id = $1 AND ended = false",
        )
        .bind(giveaway_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn extend_end_date(
        &self,
        giveaway_id: i64,
        end_date: OffsetDateTime,
    ) -> GiveawayResult<bool> {
        let result =
            sqlx::query("UPDATE giveaways SET end_date = $2 WHERE id = $1 AND ended = false")
                .bind(giveaway_id)
                .bind(to_primitive(end_date))
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn get_prizes(&self, giveaway_id: i64) -> GiveawayResult<Vec<Prize>> {
        let prizes = sqlx::query_as::<_, Prize>(
            "SELECT id, giveaway_id, name, quantity, additional_info FROM giveaway_prizes \
             WHERE giveaway_id = $1 ORDER BY id",
        )
        .bind(giveaway_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(prizes)
    }

    async fn get_winners(&self, giveaway_id: i64) -> GiveawayResult<Vec<Winner>> {
        let winners = sqlx::query_as::<_, DatabaseWinner>(&format!(
            "SELECT {WINNER_COLUMNS} FROM giveaway_winners WHERE giveaway_id = $1 \
             ORDER BY created_at, id"
        ))
        .bind(giveaway_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(winners.into_iter().map(Winner::from).collect())
    }

    async fn write_roll(
        &self,
        giveaway_id: i64,
        scope: ReplaceScope,
        allocations: &[Allocation],
    ) -> GiveawayResult<Vec<Winner>> {
        let mut transaction = self.pool.begin().await?;

        let deleted = match scope {
            ReplaceScope::Unaccepted => {
                sqlx::query(
                    "DELETE FROM giveaway_winners WHERE giveaway_id = $1 AND accepted = false",
                )
                .bind(giveaway_id)
                .execute(&mut *transaction)
                .await?
            }
            ReplaceScope::All => {
                sqlx::query("DELETE FROM giveaway_winners WHERE giveaway_id = $1")
                    .bind(giveaway_id)
                    .execute(&mut *transaction)
                    .await?
            }
        };

        let created_at = to_primitive(OffsetDateTime::now_utc());
        let mut written = Vec::with_capacity(allocations.len());
        for allocation in allocations {
            let row = sqlx::query_as::<_, DatabaseWinner>(&format!(
                "INSERT INTO giveaway_winners (user_id, giveaway_id, prize_id, quantity_won, accepted, created_at) \
                 VALUES ($1, $2, $3, $4, false, $5) \
                 ON CONFLICT (user_id, prize_id) \
                 DO UPDATE SET quantity_won = giveaway_winners.quantity_won + EXCLUDED.quantity_won \
                 RETURNING {WINNER_COLUMNS}"
            ))
            .bind(allocation.user_id)
            .bind(giveaway_id)
            .bind(allocation.prize_id)
            .bind(allocation.quantity_won)
            .bind(created_at)
            .fetch_one(&mut *transaction)
            .await?;
            written.push(Winner::from(row));
        }

        transaction.commit().await?;

        debug!(
            "Replaced {} winner rows with {} for giveaway {}",
            deleted.rows_affected(),
            written.len(),
            giveaway_id
        );
        Ok(written)
    }

    async fn accept_winners(
        &self,
        giveaway_id: i64,
        user_id: i64,
    ) -> GiveawayResult<Vec<Winner>> {
        let rows = sqlx::query_as::<_, DatabaseWinner>(&format!(
            "UPDATE giveaway_winners SET accepted = true \
             WHERE giveaway_id = $1 AND user_id = $2 AND accepted = false \
             RETURNING {WINNER_COLUMNS}"
        ))
        .bind(giveaway_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Winner::from).collect())
    }

    async fn set_announcement_message(
        &self,
        giveaway_id: i64,
        message_id: Option<i64>,
    ) -> GiveawayResult<()> {
        sqlx::query("UPDATE giveaways SET announcement_message_id = $2 WHERE id = $1")
            .bind(giveaway_id)
            .bind(message_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn set_winner_message(
        &self,
        giveaway_id: i64,
        message_id: Option<i64>,
    ) -> GiveawayResult<()> {
        sqlx::query("UPDATE giveaways SET winner_message_id = $2 WHERE id = $1")
            .bind(giveaway_id)
            .bind(message_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_giveaway(&self, giveaway_id: i64) -> GiveawayResult<bool> {
        let result = sqlx::query("DELETE FROM giveaways WHERE id = $1")
            .bind(giveaway_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
