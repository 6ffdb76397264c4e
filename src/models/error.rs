use thiserror::Error;

#[derive(Debug, Error)]
pub enum GiveawayError {
    #[error("{kind} {id} could not be found")]
    NotFound { kind: &'static str, id: i64 },

    #[error("Invalid giveaway state: {0}")]
    InvalidState(&'static str),

    #[error("User {user_id} did not win anything in giveaway {giveaway_id}")]
    NotAWinner { user_id: i64, giveaway_id: i64 },

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Database error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("Stored data could not be decoded: {0}")]
    Corrupt(String),
}

impl GiveawayError {
    pub fn giveaway_not_found(id: i64) -> Self {
        GiveawayError::NotFound {
            kind: "Giveaway",
            id,
        }
    }

    /// Delivery failures are always swallowed at the call site.
    pub fn is_delivery(&self) -> bool {
        matches!(self, GiveawayError::Delivery(_))
    }
}

impl From<serenity::Error> for GiveawayError {
    fn from(value: serenity::Error) -> Self {
        GiveawayError::Delivery(value.to_string())
    }
}

pub type GiveawayResult<T> = Result<T, GiveawayError>;
