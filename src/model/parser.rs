// File: ./src/model/parser.rs
use crate::model::dates::{DATE_FORMAT, DATE_TIME_FORMAT, TIME_FORMAT, start_of_day};
use crate::model::item::{Schedule, Task, TaskLocation};
use crate::model::recurrence::Recurrence;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Passes over the end of a task body after the first one. Each pass peels
/// at most one marker per kind, so a body ending in more than seven markers
/// of one kind keeps the rest in its description.
pub const MAX_STRIP_RETRIES: usize = 6;

const DATE_RANGE: &str = r"\{?(?P<start>\d{4}-\d{2}-\d{2}(?:T(?P<start_time>\d{2}:\d{2}))?)(?:--(?:(?P<stop_datetime>\d{4}-\d{2}-\d{2}T\d{2}:\d{2})|(?P<stop_date>\d{4}-\d{2}-\d{2})|(?P<stop_time>\d{2}:\d{2})))?\}?$";

static TASK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<indent>[\s\t]*)[-*] +\[(?P<status>.)\] *(?P<body>.*)").unwrap()
});
static DUE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("!{}", DATE_RANGE)).unwrap());
static SCHEDULED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("@{}", DATE_RANGE)).unwrap());
static DONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"✅ ?(?P<date>\d{4}-\d{2}-\d{2})$").unwrap());
static RECURRENCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+(?P<rule>[a-zA-Z0-9, !]+)$").unwrap());
static BLOCK_LINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" (?P<link>\^[a-zA-Z0-9-]+)$").unwrap());

/// Values collected while peeling markers off the end of a task body.
#[derive(Debug, Default)]
struct Extracted {
    schedule: Schedule,
    done_date: Option<NaiveDate>,
    recurrence_text: Option<String>,
}

/// Trailing markers, in the order each pass tries them.
#[derive(Debug, Clone, Copy)]
enum StripRule {
    DoneDate,
    ScheduledRange,
    DueRange,
    Recurrence,
}

const STRIP_ORDER: [StripRule; 4] = [
    StripRule::DoneDate,
    StripRule::ScheduledRange,
    StripRule::DueRange,
    StripRule::Recurrence,
];

impl StripRule {
    fn regex(self) -> &'static Regex {
        match self {
            StripRule::DoneDate => &*DONE_REGEX,
            StripRule::ScheduledRange => &*SCHEDULED_REGEX,
            StripRule::DueRange => &*DUE_REGEX,
            StripRule::Recurrence => &*RECURRENCE_REGEX,
        }
    }

    /// Removes this marker from the end of `text` and records its value.
    /// A marker whose date does not exist on the calendar is left in place.
    fn apply(self, text: &str, found: &mut Extracted) -> Option<String> {
        let caps = self.regex().captures(text)?;
        let whole = caps.get(0)?;
        match self {
            StripRule::DoneDate => {
                let date = NaiveDate::parse_from_str(&caps["date"], DATE_FORMAT).ok()?;
                found.done_date = Some(date);
            }
            StripRule::ScheduledRange => {
                let (start, stop) = parse_range(&caps)?;
                found.schedule.scheduled_start = Some(start);
                found.schedule.scheduled_stop = stop;
            }
            StripRule::DueRange => {
                let (start, stop) = parse_range(&caps)?;
                found.schedule.due_start = Some(start);
                found.schedule.due_stop = stop;
            }
            StripRule::Recurrence => {
                found.recurrence_text = Some(caps["rule"].trim().to_string());
            }
        }
        Some(text[..whole.start()].trim().to_string())
    }
}

fn parse_range(caps: &Captures) -> Option<(NaiveDateTime, Option<NaiveDateTime>)> {
    let start_text = caps.name("start")?.as_str();
    let start = if caps.name("start_time").is_some() {
        NaiveDateTime::parse_from_str(start_text, DATE_TIME_FORMAT).ok()?
    } else {
        start_of_day(NaiveDate::parse_from_str(start_text, DATE_FORMAT).ok()?)
    };

    let stop = if let Some(m) = caps.name("stop_datetime") {
        Some(NaiveDateTime::parse_from_str(m.as_str(), DATE_TIME_FORMAT).ok()?)
    } else if let Some(m) = caps.name("stop_date") {
        Some(start_of_day(NaiveDate::parse_from_str(m.as_str(), DATE_FORMAT).ok()?))
    } else if let Some(m) = caps.name("stop_time") {
        // A bare time shares the start's day.
        Some(start.date().and_time(NaiveTime::parse_from_str(m.as_str(), TIME_FORMAT).ok()?))
    } else {
        None
    };

    Some((start, stop))
}

/// Parses one Markdown line into a task.
///
/// Markers are only recognised at the end of the body: the block link first,
/// then done date, scheduled range, due range and recurrence in repeated
/// passes until nothing changes. Marker-like text earlier in the line stays
/// part of the description.
pub fn parse_task_line(line: &str, location: &TaskLocation, global_filter: &str) -> Option<Task> {
    let caps = TASK_REGEX.captures(line)?;
    let indentation = caps.name("indent").map_or("", |m| m.as_str());
    let status_character = caps.name("status")?.as_str().chars().next()?;
    let body = caps.name("body").map_or("", |m| m.as_str()).trim();

    if !body.contains(global_filter) {
        return None;
    }

    let mut description = body.to_string();
    let mut block_link = None;
    if let Some(link) = BLOCK_LINK_REGEX.captures(&description) {
        let start = link.get(0).map_or(description.len(), |m| m.start());
        block_link = Some(link["link"].to_string());
        description = description[..start].trim().to_string();
    }

    let mut found = Extracted::default();
    for _ in 0..=MAX_STRIP_RETRIES {
        let mut changed = false;
        for rule in STRIP_ORDER {
            if let Some(rest) = rule.apply(&description, &mut found) {
                description = rest;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let recurrence = found.recurrence_text.as_deref().and_then(|text| {
        let recurrence = Recurrence::from_text(text, found.schedule);
        if recurrence.is_none() {
            log::debug!("Dropping unrecognised recurrence '{}' in {}", text, location.path);
        }
        recurrence
    });

    Some(
        Task::builder()
            .status_character(status_character)
            .description(description)
            .indentation(indentation)
            .location(location.clone())
            .schedule(found.schedule)
            .done_date(found.done_date)
            .recurrence(recurrence)
            .block_link(block_link)
            .build(),
    )
}
