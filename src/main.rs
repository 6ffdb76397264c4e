#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::unreadable_literal)]

use std::{env, sync::Arc};

use serenity::{all::Http, prelude::GatewayIntents, Client};
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};

use crate::{
    common::discord::{SerenityMembers, SerenityMessenger},
    database::postgres::giveaway::PostgresGiveawayStore,
    engine::{scheduler::Scheduler, GiveawayEngine},
    models::config::SchedulerConfig,
};

mod commands;
mod common;
mod database;
mod engine;
mod events;
mod models;

#[tokio::main]
async fn main() {
    let log_level = match env::var("DEBUG").unwrap_or(false.to_string()).as_str() {
        "true" => tracing::Level::DEBUG,
        _ => tracing::Level::INFO,
    };
    tracing_subscriber::fmt().with_max_level(log_level).init();

    info!("Getting environment variables");
    let (Ok(discord_token), Ok(main_db_password), Ok(redis_db_password)) = (
        env::var("DISCORD_TOKEN"),
        env::var("DB_PASSWORD"),
        env::var("REDIS_PASSWORD"),
    ) else {
        error!("DISCORD_TOKEN, DB_PASSWORD and REDIS_PASSWORD must all be set");
        return;
    };
    let main_db_username = env::var("DB_USER").unwrap_or("postgres".to_string());
    let main_db_host = env::var("DB_HOST").unwrap_or("localhost".to_string());
    let main_db_port = env::var("DB_PORT").unwrap_or("5432".to_string());
    let main_db_name = env::var("DB_NAME").unwrap_or("postgres".to_string());
    let redis_db_host = env::var("REDIS_HOST").unwrap_or("redis".to_string());
    let redis_db_port = env::var("REDIS_PORT").unwrap_or("6379".to_string());
    let scheduler_config = SchedulerConfig::from_env();

    // Main database connection
    let connection_url = format!(
        "postgres://{main_db_username}:{main_db_password}@{main_db_host}:{main_db_port}/{main_db_name}"
    );
    info!("Establishing connection to main database");
    let main_database = match PgPoolOptions::new().connect(&connection_url).await {
        Ok(pool) => pool,
        Err(err) => {
            error!("Could not connect to main database: {}", err);
            return;
        }
    };
    info!("Running outstanding migrations");
    if let Err(err) = sqlx::migrate!().run(&main_database).await {
        error!("Could not run migrations: {}", err);
        return;
    }
    info!("Connected to main database");

    // Redis database connection
    let redis_connection_url =
        format!("redis://:{redis_db_password}@{redis_db_host}:{redis_db_port}/");
    info!("Establishing connection to Redis database");
    let redis_database = match redis::Client::open(redis_connection_url) {
        Ok(client) => client,
        Err(err) => {
            error!("Could not open Redis client: {}", err);
            return;
        }
    };
    info!("Connected to Redis database");

    // Giveaway engine, shared by commands and the scheduler
    let http = Arc::new(Http::new(&discord_token));
    let engine = Arc::new(GiveawayEngine::new(
        Arc::new(PostgresGiveawayStore::new(main_database.clone())),
        Arc::new(SerenityMessenger { http: http.clone() }),
        Arc::new(SerenityMembers { http }),
    ));
    let scheduler = Arc::new(Scheduler::new(scheduler_config));

    // Discord client connection
    let handler = models::handler::Handler {
        main_database,
        redis_database,
        engine,
        scheduler: scheduler.clone(),
    };
    let intents = GatewayIntents::non_privileged() | GatewayIntents::GUILD_MEMBERS;
    let mut client = match Client::builder(&discord_token, intents)
        .event_handler(handler)
        .await
    {
        Ok(client) => client,
        Err(err) => {
            error!("Could not build Discord client: {}", err);
            return;
        }
    };

    if let Err(err) = client.start_autosharded().await {
        error!(
            "Attempted to start Discord client, but failed with error: {}",
            err
        );
    }

    if scheduler.is_running().await {
        scheduler.stop().await;
    }
}
