use std::sync::Arc;

use crate::engine::{scheduler::Scheduler, GiveawayEngine};

#[derive(Clone)]
pub struct Handler {
    pub main_database: sqlx::PgPool,
    pub redis_database: redis::Client,
    pub engine: Arc<GiveawayEngine>,
    pub scheduler: Arc<Scheduler>,
}
