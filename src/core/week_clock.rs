//! ISO-8601 week arithmetic: week counts per year, Monday of a week,
//! rollover of out-of-range week numbers and week-to-week navigation.

use crate::domain::model::WeekKey;
use crate::utils::error::{MarktError, Result};
use chrono::{Datelike, Days, NaiveDate, Weekday};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

impl Direction {
    fn delta(self) -> i64 {
        match self {
            Direction::Previous => -1,
            Direction::Next => 1,
        }
    }
}

/// 52 or 53. December 28 always falls into the last ISO week of its year,
/// so its week number is the week count. Years chrono cannot represent
/// count as 52.
pub fn iso_weeks_in_year(year: i32) -> u32 {
    NaiveDate::from_ymd_opt(year, 12, 28).map_or(52, |date| date.iso_week().week())
}

pub fn monday_of(year: i32, week: u32) -> Result<NaiveDate> {
    if week < 1 || week > iso_weeks_in_year(year) {
        return Err(MarktError::InvalidWeek {
            year,
            week: week as i64,
        });
    }
    NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).ok_or(MarktError::InvalidWeek {
        year,
        week: week as i64,
    })
}

/// Rolls a possibly out-of-range week into a neighbouring year.
///
/// `week < 1` moves to the last week of the previous year, `week > max`
/// moves to week 1 of the next year. The loop runs until the pair is stable;
/// with these rules that is at most one step.
pub fn normalize(year: i32, week: i64) -> WeekKey {
    let mut year = year;
    let mut week = week;

    loop {
        if week < 1 {
            year = year.saturating_sub(1);
            week = iso_weeks_in_year(year) as i64;
        } else if week > iso_weeks_in_year(year) as i64 {
            year = year.saturating_add(1);
            week = 1;
        } else {
            break;
        }
    }

    match WeekKey::new(year, week as u32) {
        Ok(key) => key,
        // only reachable at the edge of chrono's date range
        Err(_) => WeekKey::containing(if year < 0 { NaiveDate::MIN } else { NaiveDate::MAX }),
    }
}

pub fn adjacent(key: WeekKey, direction: Direction) -> WeekKey {
    normalize(key.year(), key.week() as i64 + direction.delta())
}

pub fn weekdays_of(key: WeekKey) -> Result<[NaiveDate; 7]> {
    let monday = monday_of(key.year(), key.week())?;
    let mut days = [monday; 7];
    for (offset, day) in days.iter_mut().enumerate().skip(1) {
        *day = monday
            .checked_add_days(Days::new(offset as u64))
            .ok_or(MarktError::InvalidWeek {
                year: key.year(),
                week: key.week() as i64,
            })?;
    }
    Ok(days)
}

pub fn current_week(today: NaiveDate) -> WeekKey {
    WeekKey::containing(today)
}

/// Resolves the week a page should show. Missing parts default to the
/// current week, out-of-range weeks roll over into the neighbouring year.
pub fn resolve_display(year: Option<i32>, week: Option<i64>, current: WeekKey) -> WeekKey {
    normalize(
        year.unwrap_or(current.year()),
        week.unwrap_or(current.week() as i64),
    )
}
