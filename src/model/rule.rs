// File: ./src/model/rule.rs
//! Human-readable recurrence phrases ("every 2 weeks on monday, friday")
//! and their RFC 5545 RRULE form.
use crate::model::dates::{parse_calendar_date, parse_english_number, parse_weekday, split_words};
use chrono::{NaiveDate, Weekday};
use std::fmt;
use std::iter::Peekable;

const WORKDAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    fn unit(self) -> &'static str {
        match self {
            Frequency::Daily => "day",
            Frequency::Weekly => "week",
            Frequency::Monthly => "month",
            Frequency::Yearly => "year",
        }
    }

    fn from_unit(word: &str) -> Option<Self> {
        match word {
            "day" | "days" => Some(Frequency::Daily),
            "week" | "weeks" => Some(Frequency::Weekly),
            "month" | "months" => Some(Frequency::Monthly),
            "year" | "years" => Some(Frequency::Yearly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrenceEnd {
    Count(u32),
    /// Inclusive last day.
    Until(NaiveDate),
}

/// A parsed recurrence phrase. Weekdays are kept in Monday-first order and
/// month days ascending with `-1` ("last") at the end, so two phrases that
/// mean the same thing compare equal and render the same canonical text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    frequency: Frequency,
    interval: u32,
    weekdays: Vec<Weekday>,
    month_days: Vec<i8>,
    end: Option<RecurrenceEnd>,
}

impl RecurrenceRule {
    pub fn every(frequency: Frequency, interval: u32) -> Self {
        Self {
            frequency,
            interval: interval.max(1),
            weekdays: Vec::new(),
            month_days: Vec::new(),
            end: None,
        }
    }

    pub fn weekdays(&self) -> &[Weekday] {
        &self.weekdays
    }

    pub fn month_days(&self) -> &[i8] {
        &self.month_days
    }

    pub fn end(&self) -> Option<RecurrenceEnd> {
        self.end
    }

    /// Parses phrases like `every day`, `weekly`, `every other month`,
    /// `every monday and thursday`, `every month on the 1st, last`,
    /// `every 3 days for 4 times` or `every week until 2021-12-31`.
    pub fn parse(text: &str) -> Option<Self> {
        let lower = text.trim().to_lowercase();
        let all_words = split_words(&lower);
        let mut words = all_words
            .iter()
            .copied()
            .filter(|w| *w != "and")
            .peekable();

        let mut rule = match words.next()? {
            "daily" => Self::every(Frequency::Daily, 1),
            "weekly" => Self::every(Frequency::Weekly, 1),
            "monthly" => Self::every(Frequency::Monthly, 1),
            "yearly" | "annually" => Self::every(Frequency::Yearly, 1),
            "every" => Self::parse_every(&mut words)?,
            _ => return None,
        };

        while let Some(word) = words.next() {
            match word {
                "on" => rule.parse_on(&mut words)?,
                "for" if rule.end.is_none() => {
                    let count = parse_english_number(words.next()?)?;
                    if count == 0 || !matches!(words.next()?, "time" | "times") {
                        return None;
                    }
                    rule.end = Some(RecurrenceEnd::Count(count));
                }
                "until" if rule.end.is_none() => {
                    let rest: Vec<&str> = words.by_ref().collect();
                    rule.end = Some(RecurrenceEnd::Until(parse_calendar_date(&rest, None)?));
                }
                _ => return None,
            }
        }

        rule.normalize();
        Some(rule)
    }

    fn parse_every<'a>(words: &mut Peekable<impl Iterator<Item = &'a str>>) -> Option<Self> {
        let mut interval = 1;
        let mut word = words.next()?;
        if word == "other" {
            interval = 2;
            word = words.next()?;
        } else if let Some(n) = parse_english_number(word) {
            interval = n;
            word = words.next()?;
        }
        if interval == 0 {
            return None;
        }

        if let Some(frequency) = Frequency::from_unit(word) {
            return Some(Self::every(frequency, interval));
        }

        // "every monday and friday" is shorthand for a weekly rule.
        let mut rule = Self::every(Frequency::Weekly, interval);
        rule.weekdays = weekday_word(word)?;
        rule.weekdays.extend(take_weekdays(words));
        Some(rule)
    }

    fn parse_on<'a>(&mut self, words: &mut Peekable<impl Iterator<Item = &'a str>>) -> Option<()> {
        if words.peek() == Some(&"the") {
            if self.frequency != Frequency::Monthly {
                return None;
            }
            while let Some(&word) = words.peek() {
                if word == "the" {
                    words.next();
                    continue;
                }
                match parse_month_day(word) {
                    Some(day) => {
                        words.next();
                        self.month_days.push(day);
                    }
                    None => break,
                }
            }
            return (!self.month_days.is_empty()).then_some(());
        }

        if self.frequency != Frequency::Weekly {
            return None;
        }
        let days = take_weekdays(words);
        if days.is_empty() {
            return None;
        }
        self.weekdays.extend(days);
        Some(())
    }

    fn normalize(&mut self) {
        self.weekdays.sort_by_key(|d| d.num_days_from_monday());
        self.weekdays.dedup();
        self.month_days.sort_by_key(|d| (*d < 0, *d));
        self.month_days.dedup();
    }

    fn is_every_workday(&self) -> bool {
        self.frequency == Frequency::Weekly
            && self.interval == 1
            && self.weekdays == WORKDAYS
            && self.month_days.is_empty()
    }

    /// The RRULE body (without the `RRULE:` prefix). UNTIL is widened to the
    /// end of its day so the last day is included.
    pub fn to_rrule(&self) -> String {
        let mut parts = vec![format!("FREQ={}", self.frequency)];
        if self.interval > 1 {
            parts.push(format!("INTERVAL={}", self.interval));
        }
        if !self.weekdays.is_empty() {
            let codes: Vec<&str> = self.weekdays.iter().map(|d| weekday_code(*d)).collect();
            parts.push(format!("BYDAY={}", codes.join(",")));
        }
        if !self.month_days.is_empty() {
            let days: Vec<String> = self.month_days.iter().map(|d| d.to_string()).collect();
            parts.push(format!("BYMONTHDAY={}", days.join(",")));
        }
        match self.end {
            Some(RecurrenceEnd::Count(n)) => parts.push(format!("COUNT={}", n)),
            Some(RecurrenceEnd::Until(date)) => {
                parts.push(format!("UNTIL={}T235959Z", date.format("%Y%m%d")))
            }
            None => {}
        }
        parts.join(";")
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_every_workday() {
            f.write_str("every weekday")?;
        } else {
            if self.interval == 1 {
                write!(f, "every {}", self.frequency.unit())?;
            } else {
                write!(f, "every {} {}s", self.interval, self.frequency.unit())?;
            }
            if !self.weekdays.is_empty() {
                let names: Vec<&str> = self.weekdays.iter().map(|d| weekday_name(*d)).collect();
                write!(f, " on {}", names.join(", "))?;
            }
            if !self.month_days.is_empty() {
                let days: Vec<String> = self.month_days.iter().map(|d| ordinal(*d)).collect();
                write!(f, " on the {}", days.join(", "))?;
            }
        }
        match self.end {
            Some(RecurrenceEnd::Count(1)) => f.write_str(" for 1 time"),
            Some(RecurrenceEnd::Count(n)) => write!(f, " for {} times", n),
            Some(RecurrenceEnd::Until(date)) => write!(f, " until {}", date.format("%B %-d, %Y")),
            None => Ok(()),
        }
    }
}

/// A single weekday name, its plural, or "weekday(s)" for Monday to Friday.
fn weekday_word(word: &str) -> Option<Vec<Weekday>> {
    if matches!(word, "weekday" | "weekdays") {
        return Some(WORKDAYS.to_vec());
    }
    parse_weekday(word)
        .or_else(|| word.strip_suffix('s').and_then(parse_weekday))
        .map(|d| vec![d])
}

fn take_weekdays<'a>(words: &mut Peekable<impl Iterator<Item = &'a str>>) -> Vec<Weekday> {
    let mut days = Vec::new();
    while let Some(found) = words.peek().and_then(|w| weekday_word(w)) {
        words.next();
        days.extend(found);
    }
    days
}

fn parse_month_day(word: &str) -> Option<i8> {
    match word {
        "last" => Some(-1),
        "first" => Some(1),
        "second" => Some(2),
        "third" => Some(3),
        "fourth" => Some(4),
        "fifth" => Some(5),
        _ => {
            let digits = word.trim_end_matches(|c: char| c.is_ascii_alphabetic());
            let suffix = &word[digits.len()..];
            if !matches!(suffix, "" | "st" | "nd" | "rd" | "th") {
                return None;
            }
            let day = digits.parse::<i8>().ok()?;
            (1..=31).contains(&day).then_some(day)
        }
    }
}

fn ordinal(day: i8) -> String {
    if day < 0 {
        return "last".to_string();
    }
    let suffix = match (day % 10, day % 100) {
        (1, n) if n != 11 => "st",
        (2, n) if n != 12 => "nd",
        (3, n) if n != 13 => "rd",
        _ => "th",
    };
    format!("{}{}", day, suffix)
}

fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
