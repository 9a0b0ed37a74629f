// File: ./src/model/dates.rs
//! Wire date formats shared by the parser and serializer, plus the
//! natural-language date phrases accepted by query clauses.
use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";
pub const TIME_FORMAT: &str = "%H:%M";

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Last millisecond of `date`. Never leaves `date`, so it is defined up to
/// `NaiveDate::MAX`.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
        .map_or_else(|| start_of_day(date), |last| date.and_time(last))
}

/// A timestamp without an explicit time of day is stored at midnight, so
/// midnight is what marks it as date-only.
pub fn is_midnight(dt: &NaiveDateTime) -> bool {
    dt.hour() == 0 && dt.minute() == 0
}

/// Formats a start timestamp: date-only at midnight, date-time otherwise.
pub fn format_timestamp(dt: &NaiveDateTime) -> String {
    if is_midnight(dt) {
        dt.format(DATE_FORMAT).to_string()
    } else {
        dt.format(DATE_TIME_FORMAT).to_string()
    }
}

/// Formats a stop timestamp relative to its start. A stop on the same
/// calendar day only needs its time.
pub fn format_stop(start: &NaiveDateTime, stop: &NaiveDateTime) -> String {
    if start.date() == stop.date() {
        stop.format(TIME_FORMAT).to_string()
    } else {
        format_timestamp(stop)
    }
}

enum DatePart {
    Day(NaiveDate),
    Instant(NaiveDateTime),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

/// Resolves phrases such as "today", "next friday", "in 3 days",
/// "September 12, 2021 at 3pm" or "week of 2021-09-06" relative to `now`.
/// Phrases without a time of day resolve to midnight.
pub fn parse_natural_date(input: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let lower = input.trim().to_lowercase();
    let words = split_words(&lower);
    if words.is_empty() {
        return None;
    }

    if let [single] = words.as_slice() {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&single.to_uppercase(), DATE_TIME_FORMAT) {
            return Some(dt);
        }
        if *single == "now" {
            return Some(now);
        }
    }

    let (date_words, time) = split_time_suffix(&words);
    let part = if date_words.is_empty() {
        // A bare time refers to today.
        time.map(|_| DatePart::Day(now.date()))?
    } else {
        parse_date_words(date_words, now)?
    };

    match (part, time) {
        (DatePart::Day(day), Some(t)) => Some(day.and_time(t)),
        (DatePart::Day(day), None) => Some(start_of_day(day)),
        (DatePart::Instant(dt), None) => Some(dt),
        (DatePart::Instant(_), Some(_)) => None,
    }
}

pub(crate) fn split_words(lower: &str) -> Vec<&str> {
    lower
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|w| !w.is_empty())
        .collect()
}

fn split_time_suffix<'a, 'b>(words: &'b [&'a str]) -> (&'b [&'a str], Option<NaiveTime>) {
    let n = words.len();

    // "3 pm" / "at 3 pm"
    if n >= 2 && matches!(words[n - 1], "am" | "pm") {
        let joined = format!("{}{}", words[n - 2], words[n - 1]);
        if let Some(t) = parse_time_string(&joined) {
            let rest = &words[..n - 2];
            return match rest.last() {
                Some(&"at") => (&rest[..rest.len() - 1], Some(t)),
                _ => (rest, Some(t)),
            };
        }
    }

    if let Some(t) = words.last().and_then(|w| parse_time_string(w)) {
        let rest = &words[..n - 1];
        return match rest.last() {
            Some(&"at") => (&rest[..rest.len() - 1], Some(t)),
            _ => (rest, Some(t)),
        };
    }

    (words, None)
}

fn parse_date_words(words: &[&str], now: NaiveDateTime) -> Option<DatePart> {
    let today = now.date();
    match words {
        ["today"] | ["tonight"] => Some(DatePart::Day(today)),
        ["tomorrow"] => today.succ_opt().map(DatePart::Day),
        ["yesterday"] => today.pred_opt().map(DatePart::Day),
        ["week", "of", date] => {
            // "week of" names the following week.
            let anchor = NaiveDate::parse_from_str(date, DATE_FORMAT).ok()?;
            anchor.checked_add_signed(Duration::weeks(1)).map(DatePart::Day)
        }
        ["next", what] => match parse_weekday(what) {
            Some(target) => Some(DatePart::Day(next_weekday(today, target))),
            None => shift(now, 1, parse_unit(what)?),
        },
        ["last", what] => match parse_weekday(what) {
            Some(target) => Some(DatePart::Day(previous_weekday(today, target))),
            None => shift(now, -1, parse_unit(what)?),
        },
        ["this", day] => {
            let target = parse_weekday(day)?;
            let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
            Some(DatePart::Day(
                monday + Duration::days(target.num_days_from_monday() as i64),
            ))
        }
        ["in", amount, unit] => shift(now, parse_amount(amount)?, parse_unit(unit)?),
        [amount, unit, "ago"] => shift(now, -parse_amount(amount)?, parse_unit(unit)?),
        [amount, unit, "from", "now"] | [amount, unit, "later"] => {
            shift(now, parse_amount(amount)?, parse_unit(unit)?)
        }
        [day] if parse_weekday(day).is_some() => {
            let target = parse_weekday(day)?;
            Some(DatePart::Day(upcoming_weekday(today, target)))
        }
        _ => parse_calendar_date(words, Some(today.year())).map(DatePart::Day),
    }
}

/// Parses an explicit calendar date: `2021-09-12`, `september 12 2021`,
/// `12 sep 2021`, or, when `default_year` is given, `sep 12`.
pub fn parse_calendar_date(words: &[&str], default_year: Option<i32>) -> Option<NaiveDate> {
    match words {
        [iso] => NaiveDate::parse_from_str(iso, DATE_FORMAT).ok(),
        [first, second] => {
            let year = default_year?;
            month_and_day(first, second).and_then(|(m, d)| NaiveDate::from_ymd_opt(year, m, d))
        }
        [first, second, year] => {
            let year = parse_year(year)?;
            month_and_day(first, second).and_then(|(m, d)| NaiveDate::from_ymd_opt(year, m, d))
        }
        _ => None,
    }
}

fn month_and_day(first: &str, second: &str) -> Option<(u32, u32)> {
    if let (Some(m), Some(d)) = (parse_month(first), parse_day_of_month(second)) {
        return Some((m, d));
    }
    if let (Some(d), Some(m)) = (parse_day_of_month(first), parse_month(second)) {
        return Some((m, d));
    }
    None
}

fn parse_year(s: &str) -> Option<i32> {
    if s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

fn parse_day_of_month(s: &str) -> Option<u32> {
    let digits = s
        .strip_suffix("st")
        .or_else(|| s.strip_suffix("nd"))
        .or_else(|| s.strip_suffix("rd"))
        .or_else(|| s.strip_suffix("th"))
        .unwrap_or(s);
    let day = digits.parse::<u32>().ok()?;
    (1..=31).contains(&day).then_some(day)
}

pub fn parse_month(s: &str) -> Option<u32> {
    match s.to_lowercase().as_str() {
        "jan" | "january" => Some(1),
        "feb" | "february" => Some(2),
        "mar" | "march" => Some(3),
        "apr" | "april" => Some(4),
        "may" => Some(5),
        "jun" | "june" => Some(6),
        "jul" | "july" => Some(7),
        "aug" | "august" => Some(8),
        "sep" | "sept" | "september" => Some(9),
        "oct" | "october" => Some(10),
        "nov" | "november" => Some(11),
        "dec" | "december" => Some(12),
        _ => None,
    }
}

pub fn parse_weekday(s: &str) -> Option<Weekday> {
    match s.to_lowercase().as_str() {
        "mo" | "mon" | "monday" => Some(Weekday::Mon),
        "tu" | "tue" | "tues" | "tuesday" => Some(Weekday::Tue),
        "we" | "wed" | "wednesday" => Some(Weekday::Wed),
        "th" | "thu" | "thur" | "thurs" | "thursday" => Some(Weekday::Thu),
        "fr" | "fri" | "friday" => Some(Weekday::Fri),
        "sa" | "sat" | "saturday" => Some(Weekday::Sat),
        "su" | "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

fn parse_unit(s: &str) -> Option<Unit> {
    match s {
        "minute" | "minutes" | "min" | "mins" => Some(Unit::Minute),
        "hour" | "hours" => Some(Unit::Hour),
        "day" | "days" => Some(Unit::Day),
        "week" | "weeks" => Some(Unit::Week),
        "month" | "months" => Some(Unit::Month),
        "year" | "years" => Some(Unit::Year),
        _ => None,
    }
}

fn parse_amount(s: &str) -> Option<i64> {
    match s {
        "a" | "an" => Some(1),
        _ => parse_english_number(s).map(i64::from),
    }
}

pub(crate) fn parse_english_number(s: &str) -> Option<u32> {
    match s.to_lowercase().as_str() {
        "one" | "1" => Some(1),
        "two" | "2" => Some(2),
        "three" | "3" => Some(3),
        "four" | "4" => Some(4),
        "five" | "5" => Some(5),
        "six" | "6" => Some(6),
        "seven" | "7" => Some(7),
        "eight" | "8" => Some(8),
        "nine" | "9" => Some(9),
        "ten" | "10" => Some(10),
        "eleven" | "11" => Some(11),
        "twelve" | "12" => Some(12),
        _ => s.parse::<u32>().ok(),
    }
}

fn shift(now: NaiveDateTime, amount: i64, unit: Unit) -> Option<DatePart> {
    let today = now.date();
    match unit {
        Unit::Minute => now
            .checked_add_signed(Duration::minutes(amount))
            .map(DatePart::Instant),
        Unit::Hour => now
            .checked_add_signed(Duration::hours(amount))
            .map(DatePart::Instant),
        Unit::Day => today
            .checked_add_signed(Duration::days(amount))
            .map(DatePart::Day),
        Unit::Week => today
            .checked_add_signed(Duration::weeks(amount))
            .map(DatePart::Day),
        Unit::Month => add_months(today, amount).map(DatePart::Day),
        Unit::Year => add_months(today, amount.checked_mul(12)?).map(DatePart::Day),
    }
}

fn add_months(date: NaiveDate, amount: i64) -> Option<NaiveDate> {
    let months = Months::new(u32::try_from(amount.unsigned_abs()).ok()?);
    if amount >= 0 {
        date.checked_add_months(months)
    } else {
        date.checked_sub_months(months)
    }
}

pub(crate) fn parse_time_string(s: &str) -> Option<NaiveTime> {
    let lower = s.to_lowercase();

    match lower.as_str() {
        "noon" => return NaiveTime::from_hms_opt(12, 0, 0),
        "midnight" => return Some(NaiveTime::MIN),
        _ => {}
    }

    // Helper for 12h
    let parse_12h = |s: &str, is_pm: bool| -> Option<NaiveTime> {
        let (h, m) = if let Some((h_str, m_str)) = s.split_once(':') {
            (h_str.parse::<u32>().ok()?, m_str.parse::<u32>().ok()?)
        } else {
            (s.parse::<u32>().ok()?, 0)
        };
        if !(1..=12).contains(&h) || m > 59 {
            return None;
        }
        let h_24 = if h == 12 {
            if is_pm { 12 } else { 0 }
        } else if is_pm {
            h + 12
        } else {
            h
        };
        NaiveTime::from_hms_opt(h_24, m, 0)
    };

    if let Some(stripped) = lower.strip_suffix("am") {
        return parse_12h(stripped, false);
    }
    if let Some(stripped) = lower.strip_suffix("pm") {
        return parse_12h(stripped, true);
    }

    if let Some((h_str, m_str)) = lower.split_once(':') {
        let h = h_str.parse::<u32>().ok()?;
        let m = m_str.parse::<u32>().ok()?;
        return NaiveTime::from_hms_opt(h, m, 0);
    }

    None
}

/// The first `target` on or after `from`.
fn upcoming_weekday(from: NaiveDate, target: Weekday) -> NaiveDate {
    let ahead = (7 + target.num_days_from_monday() - from.weekday().num_days_from_monday()) % 7;
    from + Duration::days(ahead as i64)
}

fn next_weekday(from: NaiveDate, target: Weekday) -> NaiveDate {
    let mut d = from + Duration::days(1);
    while d.weekday() != target {
        d += Duration::days(1);
    }
    d
}

fn previous_weekday(from: NaiveDate, target: Weekday) -> NaiveDate {
    let mut d = from - Duration::days(1);
    while d.weekday() != target {
        d -= Duration::days(1);
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        // Wednesday
        NaiveDate::from_ymd_opt(2021, 9, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        start_of_day(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn resolve(input: &str) -> NaiveDateTime {
        parse_natural_date(input, now()).unwrap_or_else(|| panic!("failed to parse '{}'", input))
    }

    #[test]
    fn test_relative_days() {
        assert_eq!(resolve("today"), day(2021, 9, 15));
        assert_eq!(resolve("now"), now());
        assert_eq!(resolve("Tomorrow"), day(2021, 9, 16));
        assert_eq!(resolve("yesterday"), day(2021, 9, 14));
        assert_eq!(resolve("in 3 days"), day(2021, 9, 18));
        assert_eq!(resolve("2 weeks ago"), day(2021, 9, 1));
        assert_eq!(resolve("a month from now"), day(2021, 10, 15));
    }

    #[test]
    fn test_weekdays() {
        assert_eq!(resolve("friday"), day(2021, 9, 17));
        // Today counts as the upcoming Wednesday, "next" skips it.
        assert_eq!(resolve("wednesday"), day(2021, 9, 15));
        assert_eq!(resolve("next wednesday"), day(2021, 9, 22));
        assert_eq!(resolve("last monday"), day(2021, 9, 13));
        assert_eq!(resolve("this sunday"), day(2021, 9, 19));
    }

    #[test]
    fn test_calendar_dates_and_times() {
        assert_eq!(resolve("2021-01-01"), day(2021, 1, 1));
        assert_eq!(resolve("September 12, 2021"), day(2021, 9, 12));
        assert_eq!(resolve("12th oct"), day(2021, 10, 12));

        assert_eq!(resolve("tomorrow at 3pm"), day(2021, 9, 16) + Duration::hours(15));
        assert_eq!(
            resolve("2021-09-12T08:15"),
            day(2021, 9, 12) + Duration::minutes(8 * 60 + 15)
        );

        assert_eq!(resolve("noon"), day(2021, 9, 15) + Duration::hours(12));
    }

    #[test]
    fn test_week_of_resolves_to_following_week() {
        assert_eq!(resolve("week of 2021-09-06"), day(2021, 9, 13));
    }

    #[test]
    fn test_rejects_gibberish() {
        assert!(parse_natural_date("", now()).is_none());
        assert!(parse_natural_date("blursday", now()).is_none());
        assert!(parse_natural_date("in two fortnights", now()).is_none());
        assert!(parse_natural_date("2021-02-30", now()).is_none());
    }

    #[test]
    fn test_end_of_day_stays_in_range() {
        let last = end_of_day(NaiveDate::MAX);
        assert_eq!(last.date(), NaiveDate::MAX);
        assert_eq!((last.hour(), last.minute(), last.second()), (23, 59, 59));
        assert_eq!(
            end_of_day(NaiveDate::from_ymd_opt(2021, 9, 12).unwrap()),
            day(2021, 9, 13) - Duration::milliseconds(1)
        );
    }

    #[test]
    fn test_stop_formatting() {
        let start = day(2021, 9, 12) + Duration::hours(9);
        assert_eq!(format_stop(&start, &(start + Duration::hours(2))), "11:00");
        assert_eq!(format_stop(&start, &day(2021, 9, 14)), "2021-09-14");
        assert_eq!(format_timestamp(&start), "2021-09-12T09:00");
        assert_eq!(format_timestamp(&day(2021, 9, 12)), "2021-09-12");
    }
}
