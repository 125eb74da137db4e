//! Commit schedule generation.
//!
//! A schedule is the ordered list of timestamps the history writer turns
//! into commits. Days are walked oldest first; a day either contributes
//! nothing (weekday off, holiday, random skip) or between one and five
//! commits at random working-hour times.

use std::collections::HashSet;
use std::fmt;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Weekday};
use rand::Rng;

use crate::holidays::HolidaySelector;

/// Earliest and latest hour a generated commit can land on.
pub const WORK_HOURS: std::ops::RangeInclusive<u32> = 4..=18;

/// Upper bound on commits generated for a single day.
pub const MAX_COMMITS_PER_DAY: u32 = 5;

/// Immutable inputs to [`generate`].
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    days: u32,
    days_off: HashSet<Weekday>,
    off_fraction: f64,
    holiday_country: HolidaySelector,
}

impl ScheduleConfig {
    /// Build a config, rejecting a negative or non-finite `off_fraction`.
    ///
    /// Fractions of 1 or more are allowed; they just skip every day.
    pub fn new(
        days: u32,
        days_off: HashSet<Weekday>,
        off_fraction: f64,
    ) -> Result<Self, ConfigError> {
        if !off_fraction.is_finite() || off_fraction < 0.0 {
            return Err(ConfigError::InvalidOffFraction(off_fraction));
        }
        Ok(Self {
            days,
            days_off,
            off_fraction,
            holiday_country: HolidaySelector::default(),
        })
    }

    /// Whose public holidays to leave out of the schedule.
    pub fn with_holiday_country(mut self, selector: HolidaySelector) -> Self {
        self.holiday_country = selector;
        self
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn is_day_off(&self, weekday: Weekday) -> bool {
        self.days_off.contains(&weekday)
    }

    pub fn holiday_country(&self) -> &HolidaySelector {
        &self.holiday_country
    }

    /// First and last calendar day covered when run on `today`.
    ///
    /// Returns `None` for an empty window.
    pub fn window(&self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        if self.days == 0 {
            return None;
        }
        let first = today.checked_sub_days(Days::new(u64::from(self.days)))?;
        let last = today.pred_opt()?;
        Some((first, last))
    }
}

/// A single scheduled commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommitTimestamp(NaiveDateTime);

impl CommitTimestamp {
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self(date.and_time(time))
    }

    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    pub fn time(&self) -> NaiveTime {
        self.0.time()
    }

    pub fn as_datetime(&self) -> NaiveDateTime {
        self.0
    }
}

impl fmt::Display for CommitTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(crate::git::GIT_DATE_FORMAT))
    }
}

/// Produce the commit timestamps for the window ending the day before `today`.
///
/// The result is chronologically non-decreasing: days are visited oldest
/// first and each day's times are sorted before being appended.
pub fn generate<R: Rng + ?Sized>(
    config: &ScheduleConfig,
    holidays: &HashSet<NaiveDate>,
    today: NaiveDate,
    rng: &mut R,
) -> Vec<CommitTimestamp> {
    let mut timestamps = Vec::new();

    for offset in (1..=u64::from(config.days)).rev() {
        let Some(day) = today.checked_sub_days(Days::new(offset)) else {
            continue;
        };

        if config.is_day_off(day.weekday()) || holidays.contains(&day) {
            continue;
        }

        let draw: u32 = rng.random_range(1..=100);
        if f64::from(draw) <= config.off_fraction * 100.0 {
            continue;
        }

        let count = rng.random_range(1..=MAX_COMMITS_PER_DAY);
        let mut times: Vec<NaiveTime> = (0..count).map(|_| random_time(rng)).collect();
        times.sort_unstable();
        timestamps.extend(times.into_iter().map(|t| CommitTimestamp::new(day, t)));
    }

    timestamps
}

/// A uniformly random time within [`WORK_HOURS`], down to the microsecond.
fn random_time<R: Rng + ?Sized>(rng: &mut R) -> NaiveTime {
    let hour = rng.random_range(WORK_HOURS);
    let minute = rng.random_range(0..60);
    let second = rng.random_range(0..60);
    let micro = rng.random_range(0..1_000_000);
    debug_assert!(WORK_HOURS.contains(&hour));
    // Below 19:00:00, so adding to midnight never wraps.
    let since_midnight = TimeDelta::seconds(i64::from(hour * 3600 + minute * 60 + second))
        + TimeDelta::microseconds(micro);
    NaiveTime::default() + since_midnight
}

/// Parse a weekday the way users type it: any case, full or abbreviated.
pub fn parse_weekday(name: &str) -> Result<Weekday, ConfigError> {
    name.trim()
        .parse::<Weekday>()
        .map_err(|_| ConfigError::UnknownWeekday(name.to_string()))
}

/// Errors building a [`ScheduleConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("off fraction must be a non-negative number, got {0}")]
    InvalidOffFraction(f64),

    #[error("unknown weekday '{0}'")]
    UnknownWeekday(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::BTreeMap;

    fn today() -> NaiveDate {
        // A Wednesday.
        NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()
    }

    fn per_day(timestamps: &[CommitTimestamp]) -> BTreeMap<NaiveDate, usize> {
        let mut map = BTreeMap::new();
        for ts in timestamps {
            *map.entry(ts.date()).or_insert(0) += 1;
        }
        map
    }

    #[test]
    fn zero_days_is_empty() {
        let config = ScheduleConfig::new(0, HashSet::new(), 0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generate(&config, &HashSet::new(), today(), &mut rng).is_empty());
        assert_eq!(config.window(today()), None);
    }

    #[test]
    fn every_day_scheduled_without_exclusions() {
        let config = ScheduleConfig::new(5, HashSet::new(), 0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let timestamps = generate(&config, &HashSet::new(), today(), &mut rng);

        let days = per_day(&timestamps);
        let expected: Vec<NaiveDate> = (1..=5)
            .rev()
            .map(|n| today().checked_sub_days(Days::new(n)).unwrap())
            .collect();
        assert_eq!(days.keys().copied().collect::<Vec<_>>(), expected);
        assert!(days.values().all(|n| (1..=5).contains(n)));
    }

    #[test]
    fn weekends_are_skipped() {
        let weekend = HashSet::from([Weekday::Sat, Weekday::Sun]);
        let config = ScheduleConfig::new(7, weekend, 0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let days = per_day(&generate(&config, &HashSet::new(), today(), &mut rng));

        assert_eq!(days.len(), 5);
        assert!(
            days.keys()
                .all(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        );
    }

    #[test]
    fn full_off_fraction_skips_everything() {
        let config = ScheduleConfig::new(60, HashSet::new(), 1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        assert!(generate(&config, &HashSet::new(), today(), &mut rng).is_empty());
    }

    #[test]
    fn holidays_are_skipped() {
        let holiday = today().pred_opt().unwrap();
        let config = ScheduleConfig::new(3, HashSet::new(), 0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let days = per_day(&generate(&config, &HashSet::from([holiday]), today(), &mut rng));
        assert_eq!(days.len(), 2);
        assert!(!days.contains_key(&holiday));
    }

    #[test]
    fn rejects_bad_off_fraction() {
        assert!(matches!(
            ScheduleConfig::new(1, HashSet::new(), -0.1),
            Err(ConfigError::InvalidOffFraction(_))
        ));
        assert!(ScheduleConfig::new(1, HashSet::new(), f64::NAN).is_err());
        assert!(ScheduleConfig::new(1, HashSet::new(), 2.0).is_ok());
    }

    #[test]
    fn weekday_names_are_case_insensitive() {
        assert_eq!(parse_weekday("saturday").unwrap(), Weekday::Sat);
        assert_eq!(parse_weekday("SUNDAY").unwrap(), Weekday::Sun);
        assert_eq!(parse_weekday("Mon").unwrap(), Weekday::Mon);
        assert!(parse_weekday("Caturday").is_err());
    }

    #[test]
    fn window_spans_days_before_today() {
        let config = ScheduleConfig::new(10, HashSet::new(), 0.0).unwrap();
        let (first, last) = config.window(today()).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 5, 5).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 5, 14).unwrap());
    }

    #[test]
    fn random_times_stay_in_working_hours() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut hours = HashSet::new();
        for _ in 0..5_000 {
            let time = random_time(&mut rng);
            assert!(WORK_HOURS.contains(&time.hour()), "{time}");
            hours.insert(time.hour());
        }
        assert_eq!(hours.len(), WORK_HOURS.count());
    }

    #[test]
    fn holiday_country_travels_with_config() {
        let config = ScheduleConfig::new(3, HashSet::new(), 0.0).unwrap();
        assert_eq!(config.holiday_country(), &HolidaySelector::default());

        let config = config.with_holiday_country(HolidaySelector::World);
        assert_eq!(config.holiday_country(), &HolidaySelector::World);
        assert_eq!(config.days(), 3);
    }

    fn weekday_strategy() -> impl Strategy<Value = Weekday> {
        (0u8..7).prop_map(|n| Weekday::try_from(n).unwrap())
    }

    proptest! {
        #[test]
        fn generated_schedule_respects_rules(
            seed in any::<u64>(),
            days in 0u32..120,
            days_off in proptest::collection::hash_set(weekday_strategy(), 0..4),
            off_fraction in 0.0f64..1.0,
            holiday_offsets in proptest::collection::hash_set(1u64..120, 0..10),
        ) {
            let holidays: HashSet<NaiveDate> = holiday_offsets
                .iter()
                .map(|n| today().checked_sub_days(Days::new(*n)).unwrap())
                .collect();
            let config = ScheduleConfig::new(days, days_off.clone(), off_fraction).unwrap();
            let mut rng = StdRng::seed_from_u64(seed);
            let timestamps = generate(&config, &holidays, today(), &mut rng);

            let counts = per_day(&timestamps);
            prop_assert!(counts.len() <= days as usize);
            prop_assert!(counts.values().all(|n| (1..=5).contains(n)));

            let earliest = today().checked_sub_days(Days::new(u64::from(days))).unwrap();
            for ts in &timestamps {
                prop_assert!(ts.date() >= earliest && ts.date() < today());
                prop_assert!(WORK_HOURS.contains(&ts.time().hour()));
                prop_assert!(!days_off.contains(&ts.date().weekday()));
                prop_assert!(!holidays.contains(&ts.date()));
            }
            prop_assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}
