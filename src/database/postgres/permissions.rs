use std::str::FromStr;

use tracing::{error, warn};

use crate::models::permissions::Permission;

#[derive(sqlx::FromRow)]
struct PermissionRecord {
    permission: String,
}

fn parse_records(records: Vec<PermissionRecord>) -> Vec<Permission> {
    records
        .into_iter()
        .filter_map(|record| match Permission::from_str(&record.permission) {
            Ok(permission) => Some(permission),
            Err(_) => {
                warn!("Ignoring unknown permission {}", record.permission);
                None
            }
        })
        .collect()
}

pub async fn get_user_permissions(
    pool: &sqlx::PgPool,
    guild_id: i64,
    user_id: i64,
) -> Vec<Permission> {
    match sqlx::query_as::<_, PermissionRecord>(
        "SELECT permission FROM users WHERE guild_id = $1 AND id = $2",
    )
    .bind(guild_id)
    .bind(user_id)
    .fetch_all(pool)
    .await
    {
        Ok(records) => parse_records(records),
        Err(err) => {
            error!(
                "Attempted to query main database for guild {guild_id} permissions of user {user_id}, failed with error: {err}",
            );
            vec![]
        }
    }
}

pub async fn get_role_permissions(
    pool: &sqlx::PgPool,
    guild_id: i64,
    role_id: i64,
) -> Vec<Permission> {
    match sqlx::query_as::<_, PermissionRecord>(
        "SELECT permission FROM roles WHERE guild_id = $1 AND id = $2",
    )
    .bind(guild_id)
    .bind(role_id)
    .fetch_all(pool)
    .await
    {
        Ok(records) => parse_records(records),
        Err(err) => {
            error!(
                "Attempted to query main database for guild {guild_id} permissions of role {role_id}, failed with error: {err}",
            );
            vec![]
        }
    }
}
