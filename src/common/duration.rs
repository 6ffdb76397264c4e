use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 365 * DAY;

/// A human written span such as `1d12h` or `30m`, as typed into command options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Duration {
    pub years: i64,
    pub months: i64,
    pub weeks: i64,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Duration {
    /// Parses every `<number><unit>` pair it finds. Returns `None` when the
    /// string has no recognisable pair at all.
    pub fn parse(string: &str) -> Option<Duration> {
        debug!("Parsing duration: {}", string);

        lazy_static! {
            static ref DURATION_REGEX: Regex = Regex::new(r"(\d+)\s*(mo|y|w|d|h|m|s)").unwrap();
        }

        let lowered = string.to_lowercase();
        let mut duration = Duration::default();
        let mut matched = false;

        for capture in DURATION_REGEX.captures_iter(&lowered) {
            let (Some(value), Some(unit)) = (capture.get(1), capture.get(2)) else {
                continue;
            };
            let Ok(value) = value.as_str().parse::<i64>() else {
                return None;
            };

            match unit.as_str() {
                "y" => duration.years = value,
                "mo" => duration.months = value,
                "w" => duration.weeks = value,
                "d" => duration.days = value,
                "h" => duration.hours = value,
                "m" => duration.minutes = value,
                "s" => duration.seconds = value,
                _ => continue,
            }
            matched = true;
        }

        debug!("Parsed duration: {:?}", duration);
        matched.then_some(duration)
    }

    pub fn total_seconds(&self) -> i64 {
        self.seconds
            .saturating_add(self.minutes.saturating_mul(MINUTE))
            .saturating_add(self.hours.saturating_mul(HOUR))
            .saturating_add(self.days.saturating_mul(DAY))
            .saturating_add(self.weeks.saturating_mul(WEEK))
            .saturating_add(self.months.saturating_mul(MONTH))
            .saturating_add(self.years.saturating_mul(YEAR))
    }

    pub fn to_time_duration(&self) -> time::Duration {
        time::Duration::seconds(self.total_seconds())
    }

    pub fn is_zero(&self) -> bool {
        self.total_seconds() == 0
    }

    pub fn to_timestamp(&self, from: time::OffsetDateTime) -> Option<time::OffsetDateTime> {
        from.checked_add(self.to_time_duration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_spans() {
        let duration = Duration::parse("1d 12h 30m").unwrap();
        assert_eq!(duration.days, 1);
        assert_eq!(duration.hours, 12);
        assert_eq!(duration.minutes, 30);
        assert_eq!(duration.total_seconds(), DAY + 12 * HOUR + 30 * MINUTE);
    }

    #[test]
    fn months_are_not_mistaken_for_minutes() {
        let duration = Duration::parse("2mo").unwrap();
        assert_eq!(duration.months, 2);
        assert_eq!(duration.minutes, 0);
    }

    #[test]
    fn rejects_text_without_units() {
        assert!(Duration::parse("soon").is_none());
        assert!(Duration::parse("").is_none());
    }

    #[test]
    fn zero_span_is_zero() {
        assert!(Duration::parse("0s").unwrap().is_zero());
    }

    #[test]
    fn timestamp_is_offset_from_given_instant() {
        let from = time::OffsetDateTime::from_unix_timestamp(1_000_000).unwrap();
        let end = Duration::parse("10m").unwrap().to_timestamp(from).unwrap();
        assert_eq!(end.unix_timestamp(), 1_000_600);
    }
}
