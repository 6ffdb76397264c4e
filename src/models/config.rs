use std::env;

use tracing::warn;

use crate::common::duration::Duration;

const DEFAULT_POLL_SECONDS: u64 = 30;
const DEFAULT_NOTIFY_BUFFER: &str = "10m";
const MAX_NOTIFY_BUFFER_DAYS: i64 = 30;

/// Deployment parameters of the end-of-giveaway scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub poll_interval: std::time::Duration,
    /// How long before the end date the host gets the "ending soon" notice.
    pub notify_buffer: time::Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            poll_interval: std::time::Duration::from_secs(DEFAULT_POLL_SECONDS),
            notify_buffer: time::Duration::minutes(10),
        }
    }
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        let poll_seconds = match env::var("GIVEAWAY_POLL_SECONDS") {
            Ok(value) => match value.parse::<u64>() {
                Ok(seconds) if seconds > 0 => seconds,
                _ => {
                    warn!(
                        "GIVEAWAY_POLL_SECONDS is not a positive integer ({}), using {}",
                        value, DEFAULT_POLL_SECONDS
                    );
                    DEFAULT_POLL_SECONDS
                }
            },
            Err(_) => DEFAULT_POLL_SECONDS,
        };

        let buffer_string =
            env::var("GIVEAWAY_NOTIFY_BUFFER").unwrap_or(DEFAULT_NOTIFY_BUFFER.to_string());

        SchedulerConfig {
            poll_interval: std::time::Duration::from_secs(poll_seconds),
            notify_buffer: parse_notify_buffer(&buffer_string),
        }
    }
}

/// Parses a notify buffer, falling back to the default when it cannot be
/// parsed and capping it at `MAX_NOTIFY_BUFFER_DAYS`.
fn parse_notify_buffer(value: &str) -> time::Duration {
    let Some(duration) = Duration::parse(value) else {
        warn!(
            "GIVEAWAY_NOTIFY_BUFFER could not be parsed ({}), using {}",
            value, DEFAULT_NOTIFY_BUFFER
        );
        return SchedulerConfig::default().notify_buffer;
    };

    let maximum = time::Duration::days(MAX_NOTIFY_BUFFER_DAYS);
    let buffer = duration.to_time_duration();
    if buffer > maximum {
        warn!(
            "GIVEAWAY_NOTIFY_BUFFER is longer than {} days ({}), capping it",
            MAX_NOTIFY_BUFFER_DAYS, value
        );
        return maximum;
    }
    buffer
}
