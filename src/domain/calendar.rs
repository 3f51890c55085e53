//! 日期與星期的雙向對應。
//!
//! 選擇節次時，操作員可以改日期或改星期；兩者必須一致。

use crate::domain::model::Weekday;
use chrono::{Datelike, Days, NaiveDate};

/// `reference` 當天或之後最近的 `day`；同一天則回傳 `reference` 本身。
/// 超出 chrono 可表示的日期範圍時回傳 `None`。
pub fn date_from_day(day: Weekday, reference: NaiveDate) -> Option<NaiveDate> {
    let target = day.num_days_from_monday();
    let current = reference.weekday().num_days_from_monday();
    let offset = (target + 7 - current) % 7;
    reference.checked_add_days(Days::new(u64::from(offset)))
}

pub fn day_from_date(date: NaiveDate) -> Option<Weekday> {
    Weekday::from_chrono(date.weekday())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_same_weekday_returns_reference() {
        assert_eq!(date_from_day(Weekday::Monday, d(2024, 3, 4)), Some(d(2024, 3, 4)));
    }

    #[test]
    fn test_next_occurrence_in_same_week() {
        assert_eq!(date_from_day(Weekday::Friday, d(2024, 3, 4)), Some(d(2024, 3, 8)));
    }

    #[test]
    fn test_wraps_into_next_week() {
        // 星期六 -> 下週一
        assert_eq!(date_from_day(Weekday::Monday, d(2024, 3, 9)), Some(d(2024, 3, 11)));
        // 星期日 -> 隔天
        assert_eq!(date_from_day(Weekday::Monday, d(2024, 3, 10)), Some(d(2024, 3, 11)));
    }

    #[test]
    fn test_crosses_month_and_year() {
        assert_eq!(date_from_day(Weekday::Tuesday, d(2024, 12, 31)), Some(d(2024, 12, 31)));
        assert_eq!(date_from_day(Weekday::Monday, d(2024, 12, 31)), Some(d(2025, 1, 6)));
    }

    #[test]
    fn test_no_date_past_the_calendar_end() {
        let last = NaiveDate::MAX;
        for day in Weekday::ALL {
            let expected = (day_from_date(last) == Some(day)).then_some(last);
            assert_eq!(date_from_day(day, last), expected);
        }
    }

    #[test]
    fn test_sunday_has_no_weekday() {
        assert_eq!(day_from_date(d(2024, 3, 10)), None);
    }

    #[test]
    fn test_round_trip_for_every_day_and_reference() {
        let start = d(2024, 2, 25);
        for offset in 0..21u64 {
            let reference = start.checked_add_days(Days::new(offset)).unwrap();
            for day in Weekday::ALL {
                let date = date_from_day(day, reference).unwrap();
                assert_eq!(day_from_date(date), Some(day));
                assert!(date >= reference);
                assert!((date - reference).num_days() < 7);
            }
        }
    }
}
