//! Business-day calendar arithmetic
//!
//! A business day is Monday through Friday; exchange holidays are not
//! modelled.

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Whether `date` falls on a weekday
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// First business day strictly after `date`
pub fn next_business_day(date: NaiveDate) -> Option<NaiveDate> {
    let mut current = date.checked_add_days(Days::new(1))?;
    while !is_business_day(current) {
        current = current.checked_add_days(Days::new(1))?;
    }
    Some(current)
}

/// The `count` consecutive business days following `last`.
///
/// Stops early only if the calendar overflows.
pub fn business_days_after(last: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(count);
    let mut current = last;
    for _ in 0..count {
        match next_business_day(current) {
            Some(next) => {
                dates.push(next);
                current = next;
            }
            None => break,
        }
    }
    dates
}

/// Business days in `[start, end)`
pub fn business_days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d < end)
        .filter(|d| is_business_day(*d))
        .collect()
}
