use tracing::{debug, error};

use crate::models::response::ResponseError;

const LOCK_SECONDS: u64 = 30;

/// Short-lived Redis lock that keeps two host actions (rolls, rerolls, ends)
/// from running on the same giveaway at once.
pub struct GiveawayLock {
    key: String,
    token: String,
}

impl GiveawayLock {
    fn key(giveaway_id: i64) -> String {
        format!("giveaway:lock:{giveaway_id}")
    }

    /// Returns `None` when another action already holds the lock.
    pub async fn acquire(
        redis: &redis::Client,
        giveaway_id: i64,
    ) -> Result<Option<GiveawayLock>, ResponseError> {
        let start = std::time::Instant::now();

        let mut connection = match redis.get_multiplexed_async_connection().await {
            Ok(connection) => connection,
            Err(err) => {
                error!("Failed to get Redis connection: {:?}", err);
                return Err(ResponseError::Redis(err));
            }
        };

        let lock = GiveawayLock {
            key: Self::key(giveaway_id),
            token: format!("{:016x}", rand::random::<u64>()),
        };

        let acquired: Option<String> = match redis::cmd("SET")
            .arg(&lock.key)
            .arg(&lock.token)
            .arg("NX")
            .arg("EX")
            .arg(LOCK_SECONDS)
            .query_async(&mut connection)
            .await
        {
            Ok(res) => res,
            Err(err) => {
                error!("Failed to set giveaway lock in Redis: {:?}", err);
                return Err(ResponseError::Redis(err));
            }
        };

        debug!(
            "Tried giveaway lock {} in {:?}, acquired: {}",
            lock.key,
            start.elapsed(),
            acquired.is_some()
        );

        Ok(acquired.map(|_| lock))
    }

    /// Deletes the key only if it still carries this lock's token, so an
    /// expired lock taken over by someone else is left alone.
    pub async fn release(self, redis: &redis::Client) {
        let mut connection = match redis.get_multiplexed_async_connection().await {
            Ok(connection) => connection,
            Err(err) => {
                error!("Failed to get Redis connection: {:?}", err);
                return;
            }
        };

        let script = redis::Script::new(
            "if redis.call('GET', KEYS[1]) == ARGV[1] then return redis.call('DEL', KEYS[1]) else return 0 end",
        );
        let released: Result<i64, redis::RedisError> = script
            .key(&self.key)
            .arg(&self.token)
            .invoke_async(&mut connection)
            .await;

        if let Err(err) = released {
            error!(
                "Failed to release giveaway lock {} in Redis: {:?}",
                self.key, err
            );
        }
    }
}
