//! Run schedules: cron expressions or fixed intervals.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta, Utc};
use croner::Cron;
use thiserror::Error;

const EVERY_PREFIX: &str = "@every ";

/// When scheduled runs fire.
///
/// Accepts a five-field cron expression (`0 */6 * * *`), a cron nickname
/// (`@daily`), `@every <duration>` or a bare duration (`6h`). Cron
/// expressions are evaluated in local time.
#[derive(Clone)]
pub enum Schedule {
    /// Fixed delay between the end of one run and the start of the next.
    Every(Duration),
    /// Cron expression.
    Cron { expression: String, cron: Arc<Cron> },
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("schedule is empty")]
    Empty,

    #[error("schedule interval must be greater than zero")]
    ZeroInterval,

    #[error("invalid interval '{input}': {source}")]
    Interval {
        input: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error("invalid cron expression '{input}': {message}")]
    Cron { input: String, message: String },
}

impl Schedule {
    /// Next fire time strictly after `now`, if any.
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Schedule::Every(every) => TimeDelta::from_std(*every)
                .ok()
                .and_then(|delta| now.checked_add_signed(delta)),
            Schedule::Cron { cron, .. } => cron
                .find_next_occurrence(&now.with_timezone(&Local), false)
                .ok()
                .map(|next| next.with_timezone(&Utc)),
        }
    }

    /// Check whether the schedule can never fire.
    pub fn is_zero_interval(&self) -> bool {
        matches!(self, Schedule::Every(every) if every.is_zero())
    }
}

impl FromStr for Schedule {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err(ScheduleError::Empty);
        }

        if let Some(every) = input.strip_prefix(EVERY_PREFIX) {
            return parse_interval(every.trim());
        }

        if looks_like_cron(input) {
            let cron = Cron::new(input)
                .parse()
                .map_err(|e| ScheduleError::Cron {
                    input: input.to_string(),
                    message: e.to_string(),
                })?;
            return Ok(Schedule::Cron {
                expression: input.to_string(),
                cron: Arc::new(cron),
            });
        }

        parse_interval(input)
    }
}

fn looks_like_cron(input: &str) -> bool {
    input.starts_with('@') || input.split_whitespace().count() >= 5
}

fn parse_interval(input: &str) -> Result<Schedule, ScheduleError> {
    let every = humantime::parse_duration(input).map_err(|source| ScheduleError::Interval {
        input: input.to_string(),
        source,
    })?;
    if every.is_zero() {
        return Err(ScheduleError::ZeroInterval);
    }
    Ok(Schedule::Every(every))
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::Every(every) => write!(f, "every {}", humantime::format_duration(*every)),
            Schedule::Cron { expression, .. } => f.write_str(expression),
        }
    }
}

impl fmt::Debug for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::Every(every) => f.debug_tuple("Every").field(every).finish(),
            Schedule::Cron { expression, .. } => f.debug_tuple("Cron").field(expression).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_cron_expression() {
        let schedule: Schedule = "0 */6 * * *".parse().unwrap();
        assert!(matches!(schedule, Schedule::Cron { .. }));
        assert_eq!(schedule.to_string(), "0 */6 * * *");

        let next = schedule.next_after(now()).unwrap();
        assert!(next > now());
        assert!(next - now() <= TimeDelta::hours(6));

        let local = next.with_timezone(&Local);
        assert_eq!(local.minute(), 0);
        assert_eq!(local.hour() % 6, 0);
    }

    #[test]
    fn test_cron_nickname() {
        let schedule: Schedule = "@hourly".parse().unwrap();
        let next = schedule.next_after(now()).unwrap();
        assert!(next - now() <= TimeDelta::hours(1));
    }

    #[test]
    fn test_invalid_cron_rejected() {
        let err = "0 */6 * * * * * *".parse::<Schedule>().unwrap_err();
        assert!(matches!(err, ScheduleError::Cron { .. }));
        assert!("61 * * * *".parse::<Schedule>().is_err());
    }

    #[test]
    fn test_intervals() {
        let schedule: Schedule = "6h".parse().unwrap();
        assert!(matches!(schedule, Schedule::Every(d) if d == Duration::from_secs(6 * 3600)));
        assert_eq!(
            schedule.next_after(now()),
            Some(now() + TimeDelta::hours(6))
        );

        let schedule: Schedule = "@every 1h30m".parse().unwrap();
        assert!(matches!(schedule, Schedule::Every(d) if d == Duration::from_secs(5400)));
    }

    #[test]
    fn test_zero_and_empty_rejected() {
        assert!(matches!(
            "0s".parse::<Schedule>(),
            Err(ScheduleError::ZeroInterval)
        ));
        assert!(matches!("  ".parse::<Schedule>(), Err(ScheduleError::Empty)));
        assert!(matches!(
            "soon".parse::<Schedule>(),
            Err(ScheduleError::Interval { .. })
        ));
        assert!(Schedule::Every(Duration::ZERO).is_zero_interval());
    }
}
