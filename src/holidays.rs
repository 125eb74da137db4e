//! Public holiday lookup.
//!
//! The schedule only needs membership tests, so holidays are resolved up
//! front into a flat set of dates. Lookups fail open: a country we cannot
//! answer for contributes no holidays rather than aborting the run.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Answers "which dates are public holidays in this country and year".
pub trait HolidayOracle {
    /// Country codes this oracle can answer for.
    fn countries(&self) -> Vec<&'static str>;

    fn holidays(&self, country: &str, year: i32) -> Result<HashSet<NaiveDate>, LookupError>;
}

/// Which holidays to exclude from the schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HolidaySelector {
    /// Union of every country the oracle knows.
    World,
    /// A single country code, stored upper-case.
    Country(String),
}

impl Default for HolidaySelector {
    fn default() -> Self {
        Self::Country("US".to_string())
    }
}

impl FromStr for HolidaySelector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SelectorError);
        }
        if s.eq_ignore_ascii_case("world") {
            Ok(Self::World)
        } else {
            Ok(Self::Country(s.to_ascii_uppercase()))
        }
    }
}

/// Collect the holidays selected by `selector` for every year in `years`.
///
/// A failed country lookup is logged and treated as "no holidays".
pub fn resolve(
    oracle: &dyn HolidayOracle,
    selector: &HolidaySelector,
    years: impl IntoIterator<Item = i32> + Clone,
) -> HashSet<NaiveDate> {
    match selector {
        HolidaySelector::Country(code) => match country_holidays(oracle, code, years) {
            Ok(dates) => dates,
            Err(e) => {
                tracing::warn!("holiday lookup failed, not skipping any holidays: {e}");
                HashSet::new()
            }
        },
        HolidaySelector::World => {
            let mut all = HashSet::new();
            for code in oracle.countries() {
                match country_holidays(oracle, code, years.clone()) {
                    Ok(dates) => all.extend(dates),
                    Err(e) => tracing::debug!("skipping {code}: {e}"),
                }
            }
            all
        }
    }
}

fn country_holidays(
    oracle: &dyn HolidayOracle,
    code: &str,
    years: impl IntoIterator<Item = i32>,
) -> Result<HashSet<NaiveDate>, LookupError> {
    let mut dates = HashSet::new();
    for year in years {
        dates.extend(oracle.holidays(code, year)?);
    }
    Ok(dates)
}

// =============================================================================
// Built-in calendar
// =============================================================================

/// How a holiday's date is derived for a given year.
#[derive(Debug, Clone, Copy)]
enum Rule {
    /// Same month and day every year.
    Fixed(u32, u32),
    /// Fixed date, moved to Friday/Monday when it falls on a weekend.
    Observed(u32, u32),
    /// Fixed date, moved to the following Monday when it falls on a weekend.
    MondayIfWeekend(u32, u32),
    /// The n-th given weekday of a month.
    Nth(u32, Weekday, u8),
    /// The last given weekday of a month.
    Last(u32, Weekday),
    /// The last Monday strictly before the given day of the month.
    MondayBefore(u32, u32),
    /// Days relative to Easter Sunday.
    Easter(i64),
}

const US: &[Rule] = &[
    Rule::Observed(1, 1),
    Rule::Nth(1, Weekday::Mon, 3),
    Rule::Nth(2, Weekday::Mon, 3),
    Rule::Last(5, Weekday::Mon),
    Rule::Observed(6, 19),
    Rule::Observed(7, 4),
    Rule::Nth(9, Weekday::Mon, 1),
    Rule::Nth(10, Weekday::Mon, 2),
    Rule::Observed(11, 11),
    Rule::Nth(11, Weekday::Thu, 4),
    Rule::Observed(12, 25),
];

const CA: &[Rule] = &[
    Rule::Fixed(1, 1),
    Rule::Easter(-2),
    Rule::MondayBefore(5, 25),
    Rule::Fixed(7, 1),
    Rule::Nth(9, Weekday::Mon, 1),
    Rule::Nth(10, Weekday::Mon, 2),
    Rule::Fixed(12, 25),
    Rule::Fixed(12, 26),
];

const GB: &[Rule] = &[
    Rule::MondayIfWeekend(1, 1),
    Rule::Easter(-2),
    Rule::Easter(1),
    Rule::Nth(5, Weekday::Mon, 1),
    Rule::Last(5, Weekday::Mon),
    Rule::Last(8, Weekday::Mon),
    Rule::Fixed(12, 25),
    Rule::Fixed(12, 26),
];

const DE: &[Rule] = &[
    Rule::Fixed(1, 1),
    Rule::Easter(-2),
    Rule::Easter(1),
    Rule::Fixed(5, 1),
    Rule::Easter(39),
    Rule::Easter(50),
    Rule::Fixed(10, 3),
    Rule::Fixed(12, 25),
    Rule::Fixed(12, 26),
];

const FR: &[Rule] = &[
    Rule::Fixed(1, 1),
    Rule::Easter(1),
    Rule::Fixed(5, 1),
    Rule::Fixed(5, 8),
    Rule::Easter(39),
    Rule::Easter(50),
    Rule::Fixed(7, 14),
    Rule::Fixed(8, 15),
    Rule::Fixed(11, 1),
    Rule::Fixed(11, 11),
    Rule::Fixed(12, 25),
];

const IN: &[Rule] = &[Rule::Fixed(1, 26), Rule::Fixed(8, 15), Rule::Fixed(10, 2)];

const CALENDARS: &[(&str, &[Rule])] = &[
    ("CA", CA),
    ("DE", DE),
    ("FR", FR),
    ("GB", GB),
    ("IN", IN),
    ("US", US),
];

/// Rule-based national holidays for a handful of countries.
#[derive(Debug, Default, Clone, Copy)]
pub struct Calendar;

impl Calendar {
    pub fn new() -> Self {
        Self
    }
}

impl HolidayOracle for Calendar {
    fn countries(&self) -> Vec<&'static str> {
        CALENDARS.iter().map(|(code, _)| *code).collect()
    }

    fn holidays(&self, country: &str, year: i32) -> Result<HashSet<NaiveDate>, LookupError> {
        let code = country.to_ascii_uppercase();
        let code = if code == "UK" { "GB".to_string() } else { code };
        let (_, rules) = CALENDARS
            .iter()
            .find(|(c, _)| *c == code)
            .ok_or_else(|| LookupError::UnsupportedCountry(country.to_string()))?;

        let mut dates = HashSet::new();
        for rule in *rules {
            let date = rule
                .date_in(year)
                .ok_or(LookupError::OutOfRange { year })?;
            dates.insert(date);
            if let Some(observed) = rule.observed_in(date) {
                dates.insert(observed);
            }
        }
        Ok(dates)
    }
}

impl Rule {
    fn date_in(self, year: i32) -> Option<NaiveDate> {
        match self {
            Rule::Fixed(m, d) | Rule::Observed(m, d) | Rule::MondayIfWeekend(m, d) => {
                NaiveDate::from_ymd_opt(year, m, d)
            }
            Rule::Nth(m, wd, n) => NaiveDate::from_weekday_of_month_opt(year, m, wd, n),
            Rule::Last(m, wd) => last_weekday(year, m, wd),
            Rule::MondayBefore(m, d) => {
                let mut date = NaiveDate::from_ymd_opt(year, m, d)?.pred_opt()?;
                while date.weekday() != Weekday::Mon {
                    date = date.pred_opt()?;
                }
                Some(date)
            }
            Rule::Easter(offset) => {
                let easter = easter_sunday(year)?;
                if offset >= 0 {
                    easter.checked_add_days(Days::new(offset.unsigned_abs()))
                } else {
                    easter.checked_sub_days(Days::new(offset.unsigned_abs()))
                }
            }
        }
    }

    /// The substitute day off when a fixed holiday lands on a weekend.
    fn observed_in(self, date: NaiveDate) -> Option<NaiveDate> {
        match (self, date.weekday()) {
            (Rule::Observed(..), Weekday::Sat) => date.pred_opt(),
            (Rule::Observed(..), Weekday::Sun) => date.succ_opt(),
            (Rule::MondayIfWeekend(..), Weekday::Sat) => date.checked_add_days(Days::new(2)),
            (Rule::MondayIfWeekend(..), Weekday::Sun) => date.succ_opt(),
            _ => None,
        }
    }
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let mut date = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;
    while date.weekday() != weekday {
        date = date.pred_opt()?;
    }
    Some(date)
}

/// Western Easter Sunday (anonymous Gregorian computus).
fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, u32::try_from(month).ok()?, u32::try_from(day).ok()?)
}

/// Errors from a holiday lookup.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("no holiday calendar for country '{0}'")]
    UnsupportedCountry(String),

    #[error("cannot compute holidays for year {year}")]
    OutOfRange { year: i32 },
}

/// A blank holiday country was given.
#[derive(Debug, thiserror::Error)]
#[error("holiday country must be a country code or 'world'")]
pub struct SelectorError;

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn easter_dates() {
        assert_eq!(easter_sunday(2019), Some(ymd(2019, 4, 21)));
        assert_eq!(easter_sunday(2024), Some(ymd(2024, 3, 31)));
        assert_eq!(easter_sunday(2025), Some(ymd(2025, 4, 20)));
    }

    #[test]
    fn us_holidays_2024() {
        let us = Calendar.holidays("us", 2024).unwrap();
        for date in [
            ymd(2024, 1, 1),
            ymd(2024, 1, 15),
            ymd(2024, 2, 19),
            ymd(2024, 5, 27),
            ymd(2024, 7, 4),
            ymd(2024, 9, 2),
            ymd(2024, 11, 28),
            ymd(2024, 12, 25),
        ] {
            assert!(us.contains(&date), "missing {date}");
        }
        assert!(!us.contains(&ymd(2024, 7, 5)));
    }

    #[test]
    fn weekend_holidays_are_observed() {
        // July 4th 2026 is a Saturday.
        let us = Calendar.holidays("US", 2026).unwrap();
        assert!(us.contains(&ymd(2026, 7, 4)));
        assert!(us.contains(&ymd(2026, 7, 3)));

        // New Year 2022 is a Saturday; England observes the Monday.
        let gb = Calendar.holidays("UK", 2022).unwrap();
        assert!(gb.contains(&ymd(2022, 1, 3)));
    }

    #[test]
    fn easter_relative_holidays() {
        let de = Calendar.holidays("DE", 2024).unwrap();
        assert!(de.contains(&ymd(2024, 3, 29)));
        assert!(de.contains(&ymd(2024, 4, 1)));
        assert!(de.contains(&ymd(2024, 5, 9)));
        assert!(de.contains(&ymd(2024, 5, 20)));
    }

    #[test]
    fn victoria_day() {
        let ca = Calendar.holidays("CA", 2024).unwrap();
        assert!(ca.contains(&ymd(2024, 5, 20)));
    }

    #[test]
    fn unknown_country_fails_lookup_but_resolves_empty() {
        assert!(matches!(
            Calendar.holidays("XX", 2024),
            Err(LookupError::UnsupportedCountry(_))
        ));
        let selector: HolidaySelector = "xx".parse().unwrap();
        assert!(resolve(&Calendar, &selector, [2024]).is_empty());
    }

    #[test]
    fn world_unions_every_country() {
        let world = resolve(&Calendar, &HolidaySelector::World, [2024]);
        assert!(world.contains(&ymd(2024, 7, 4)));
        assert!(world.contains(&ymd(2024, 7, 14)));
        assert!(world.contains(&ymd(2024, 1, 26)));
    }

    #[test]
    fn resolve_covers_every_year() {
        let selector = HolidaySelector::Country("FR".into());
        let dates = resolve(&Calendar, &selector, 2023..=2024);
        assert!(dates.contains(&ymd(2023, 12, 25)));
        assert!(dates.contains(&ymd(2024, 1, 1)));
    }

    #[test]
    fn selector_parsing() {
        assert_eq!("World".parse::<HolidaySelector>().unwrap(), HolidaySelector::World);
        assert_eq!(
            "in".parse::<HolidaySelector>().unwrap(),
            HolidaySelector::Country("IN".into())
        );
        assert!("  ".parse::<HolidaySelector>().is_err());
    }
}
