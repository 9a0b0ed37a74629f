// Logic for checking if tasks match line-based queries.
//
// A query is one clause per line, all of which must hold:
//
//   done | not done | no due date | no scheduled date | exclude sub-items
//   (due|scheduled|any|done) [before|after|on] <date phrase>
//   (path|description|heading) (includes|does not include) <text>
//   limit [to] <n> [tasks]
//
// Date values are resolved once, when the query is parsed. A query built on
// an earlier day is stale and should be re-parsed so relative phrases like
// "today" move forward.

use crate::model::dates::{self, end_of_day, is_midnight, start_of_day};
use crate::model::item::Task;
use chrono::{Local, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;
use strum::{Display, EnumString};
use thiserror::Error;

static DATE_CLAUSE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<field>due|scheduled|any|done)(?:\s+(?P<relation>before|after|on))?\s+(?P<value>.+)$")
        .unwrap()
});
static TEXT_CLAUSE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<field>path|description|heading)\s+(?P<op>includes|does\s+not\s+include)\s+(?P<value>.+)$")
        .unwrap()
});
static LIMIT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^limit\s+(?:to\s+)?(?P<count>\d+)(?:\s+tasks?)?$").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid query clause: {line}")]
    InvalidClause { line: String },
    #[error("invalid {field} date in query: {text}")]
    InvalidDate { field: DateField, text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DateField {
    Due,
    Scheduled,
    Any,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Relation {
    Before,
    After,
    On,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TextField {
    Path,
    Description,
    Heading,
}

/// A resolved date test against a task timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateComparison {
    Before(NaiveDateTime),
    After(NaiveDateTime),
    SameDay(NaiveDate),
    Exactly(NaiveDateTime),
}

impl DateComparison {
    /// With `widen`, a date-only value covers its whole day: "after" starts
    /// past the end of it and "on" accepts any time within it.
    pub fn new(relation: Relation, value: NaiveDateTime, widen: bool) -> Self {
        let whole_day = widen && is_midnight(&value);
        match relation {
            Relation::Before => Self::Before(value),
            Relation::After if whole_day => Self::After(end_of_day(value.date())),
            Relation::After => Self::After(value),
            Relation::On if whole_day => Self::SameDay(value.date()),
            Relation::On => Self::Exactly(value),
        }
    }

    pub fn holds(&self, value: NaiveDateTime) -> bool {
        match self {
            Self::Before(limit) => value < *limit,
            Self::After(limit) => value > *limit,
            Self::SameDay(day) => value.date() == *day,
            Self::Exactly(at) => value == *at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Done,
    NotDone,
    NoDueDate,
    NoScheduledDate,
    ExcludeSubItems,
    Date {
        field: DateField,
        comparison: DateComparison,
    },
    Text {
        field: TextField,
        includes: bool,
        needle: String,
    },
}

impl Filter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Filter::Done => task.status().is_done(),
            Filter::NotDone => !task.status().is_done(),
            Filter::NoDueDate => task.due_start().is_none(),
            Filter::NoScheduledDate => task.scheduled_start().is_none(),
            Filter::ExcludeSubItems => !task.is_sub_item(),
            Filter::Date { field, comparison } => {
                let test = |value: Option<NaiveDateTime>| value.is_some_and(|v| comparison.holds(v));
                match field {
                    DateField::Due => test(task.due_start()),
                    DateField::Scheduled => test(task.scheduled_start()),
                    DateField::Any => test(task.due_start()) || test(task.scheduled_start()),
                    DateField::Done => test(task.done_date().map(start_of_day)),
                }
            }
            Filter::Text {
                field,
                includes,
                needle,
            } => {
                let found = match field {
                    TextField::Path => task.path().contains(needle.as_str()),
                    TextField::Description => contains_ignore_case(task.description(), needle),
                    TextField::Heading => task
                        .preceding_header()
                        .is_some_and(|header| contains_ignore_case(header, needle)),
                };
                found == *includes
            }
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

enum Clause {
    Filter(Filter),
    Limit(usize),
}

fn parse_clause(line: &str, now: NaiveDateTime) -> Result<Clause, QueryError> {
    let invalid = || QueryError::InvalidClause {
        line: line.to_string(),
    };

    let normalized = line
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let literal = match normalized.as_str() {
        "done" => Some(Filter::Done),
        "not done" => Some(Filter::NotDone),
        "no due date" => Some(Filter::NoDueDate),
        "no scheduled date" => Some(Filter::NoScheduledDate),
        "exclude sub-items" => Some(Filter::ExcludeSubItems),
        _ => None,
    };
    if let Some(filter) = literal {
        return Ok(Clause::Filter(filter));
    }

    if let Some(caps) = DATE_CLAUSE_REGEX.captures(line) {
        let field: DateField = caps["field"].parse().map_err(|_| invalid())?;
        let relation = match caps.name("relation") {
            Some(m) => m.as_str().parse::<Relation>().map_err(|_| invalid())?,
            None => Relation::On,
        };
        let text = caps["value"].trim();
        let value = dates::parse_natural_date(text, now).ok_or_else(|| QueryError::InvalidDate {
            field,
            text: text.to_string(),
        })?;
        // Done dates carry no time, so they are compared as given.
        let comparison = DateComparison::new(relation, value, field != DateField::Done);
        return Ok(Clause::Filter(Filter::Date { field, comparison }));
    }

    if let Some(caps) = TEXT_CLAUSE_REGEX.captures(line) {
        let field: TextField = caps["field"].parse().map_err(|_| invalid())?;
        let includes = caps["op"].eq_ignore_ascii_case("includes");
        return Ok(Clause::Filter(Filter::Text {
            field,
            includes,
            needle: caps["value"].trim().to_string(),
        }));
    }

    if let Some(caps) = LIMIT_REGEX.captures(line) {
        let count = caps["count"].parse::<usize>().map_err(|_| invalid())?;
        return Ok(Clause::Limit(count));
    }

    Err(invalid())
}

/// A parsed query. Parsing never fails outright: the first bad clause is
/// kept as `error` and leaves the query without filters or limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    source: String,
    built_on: NaiveDate,
    filters: Vec<Filter>,
    limit: Option<usize>,
    error: Option<QueryError>,
}

impl Query {
    pub fn parse(source: &str) -> Self {
        Self::parse_at(source, Local::now().naive_local())
    }

    /// Parses with relative dates resolved against `now`.
    pub fn parse_at(source: &str, now: NaiveDateTime) -> Self {
        let mut query = Self {
            source: source.to_string(),
            built_on: now.date(),
            filters: Vec::new(),
            limit: None,
            error: None,
        };

        for line in source.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match parse_clause(line, now) {
                Ok(Clause::Filter(filter)) => query.filters.push(filter),
                // The last limit wins.
                Ok(Clause::Limit(count)) => query.limit = Some(count),
                Err(error) => {
                    log::debug!("Query rejected: {}", error);
                    query.filters.clear();
                    query.limit = None;
                    query.error = Some(error);
                    break;
                }
            }
        }

        query
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn error(&self) -> Option<&QueryError> {
        self.error.as_ref()
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.filters.iter().all(|f| f.matches(task))
    }

    /// Filter, then sort by status, date and path, then cut to the limit.
    pub fn apply(&self, tasks: Vec<Task>) -> Result<Vec<Task>, QueryError> {
        self.apply_by(tasks, |task| task)
    }

    /// Like `apply` for values that carry a task, such as scanned document lines.
    pub fn apply_by<T>(
        &self,
        items: Vec<T>,
        task_of: impl Fn(&T) -> &Task,
    ) -> Result<Vec<T>, QueryError> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        let mut matching: Vec<T> = items
            .into_iter()
            .filter(|item| self.matches(task_of(item)))
            .collect();
        matching.sort_by(|a, b| task_of(a).compare_by_status_date_path(task_of(b)));
        if let Some(limit) = self.limit {
            matching.truncate(limit);
        }
        Ok(matching)
    }

    /// Whether relative dates were resolved on a day other than `today`.
    pub fn is_stale(&self, today: NaiveDate) -> bool {
        self.built_on != today
    }

    /// The same source re-parsed against `now`.
    pub fn refreshed(&self, now: NaiveDateTime) -> Self {
        Self::parse_at(&self.source, now)
    }
}
