// File: ./src/model/item.rs
use crate::model::parser;
use crate::model::recurrence::Recurrence;
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, strum::Display)]
pub enum TaskStatus {
    Todo,
    Done,
}

impl TaskStatus {
    /// A blank checkbox is open; any other mark counts as done.
    pub fn from_character(c: char) -> Self {
        if c == ' ' { Self::Todo } else { Self::Done }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn default_character(&self) -> char {
        match self {
            Self::Todo => ' ',
            Self::Done => 'x',
        }
    }
}

/// Where a task was found: the note, the section it belongs to and the
/// closest heading above it.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
pub struct TaskLocation {
    pub path: String,
    pub section_start: usize,
    pub section_index: usize,
    pub preceding_header: Option<String>,
}

impl TaskLocation {
    pub fn in_file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

// --- DATES ---

/// Scheduled and due ranges. A stop is only meaningful with its start.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize)]
pub struct Schedule {
    pub scheduled_start: Option<NaiveDateTime>,
    pub scheduled_stop: Option<NaiveDateTime>,
    pub due_start: Option<NaiveDateTime>,
    pub due_stop: Option<NaiveDateTime>,
}

impl Schedule {
    /// Recurrences are anchored on the due date, falling back to the scheduled date.
    pub fn reference_date(&self) -> Option<NaiveDateTime> {
        self.due_start.or(self.scheduled_start)
    }

    /// Earliest of the due and scheduled starts.
    pub fn nearest(&self) -> Option<NaiveDateTime> {
        match (self.due_start, self.scheduled_start) {
            (Some(due), Some(scheduled)) => Some(due.min(scheduled)),
            (due, scheduled) => due.or(scheduled),
        }
    }

    fn normalized(mut self) -> Self {
        if self.scheduled_start.is_none() {
            self.scheduled_stop = None;
        }
        if self.due_start.is_none() {
            self.due_stop = None;
        }
        self
    }
}

// --- TASK ---

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Task {
    status: TaskStatus,
    status_character: char,
    description: String,
    indentation: String,
    location: TaskLocation,
    #[serde(flatten)]
    schedule: Schedule,
    done_date: Option<NaiveDate>,
    recurrence: Option<Recurrence>,
    block_link: Option<String>,
}

impl Task {
    pub fn builder() -> TaskBuilder {
        TaskBuilder::new()
    }

    pub fn to_builder(&self) -> TaskBuilder {
        TaskBuilder {
            status_character: self.status_character,
            description: self.description.clone(),
            indentation: self.indentation.clone(),
            location: self.location.clone(),
            schedule: self.schedule,
            done_date: self.done_date,
            recurrence: self.recurrence.clone(),
            block_link: self.block_link.clone(),
        }
    }

    /// Parses a single Markdown line. Returns `None` for anything that is not
    /// a checkbox list item containing `global_filter`.
    pub fn from_line(line: &str, location: &TaskLocation, global_filter: &str) -> Option<Self> {
        parser::parse_task_line(line, location, global_filter)
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn status_character(&self) -> char {
        self.status_character
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn indentation(&self) -> &str {
        &self.indentation
    }

    pub fn location(&self) -> &TaskLocation {
        &self.location
    }

    pub fn path(&self) -> &str {
        &self.location.path
    }

    pub fn preceding_header(&self) -> Option<&str> {
        self.location.preceding_header.as_deref()
    }

    pub fn scheduled_start(&self) -> Option<NaiveDateTime> {
        self.schedule.scheduled_start
    }

    pub fn scheduled_stop(&self) -> Option<NaiveDateTime> {
        self.schedule.scheduled_stop
    }

    pub fn due_start(&self) -> Option<NaiveDateTime> {
        self.schedule.due_start
    }

    pub fn due_stop(&self) -> Option<NaiveDateTime> {
        self.schedule.due_stop
    }

    pub fn done_date(&self) -> Option<NaiveDate> {
        self.done_date
    }

    pub fn recurrence(&self) -> Option<&Recurrence> {
        self.recurrence.as_ref()
    }

    /// The block reference including its caret, e.g. `^my-precious`.
    pub fn block_link(&self) -> Option<&str> {
        self.block_link.as_deref()
    }

    pub fn is_sub_item(&self) -> bool {
        !self.indentation.is_empty()
    }

    /// Toggles against the local calendar date.
    pub fn toggle(&self) -> Vec<Task> {
        self.toggle_on(Local::now().date_naive())
    }

    /// Flips the status. Completing a recurring task that still has a next
    /// occurrence yields `[next, toggled]`; everything else yields `[toggled]`.
    pub fn toggle_on(&self, today: NaiveDate) -> Vec<Task> {
        let new_status = match self.status {
            TaskStatus::Todo => TaskStatus::Done,
            TaskStatus::Done => TaskStatus::Todo,
        };

        let mut tasks = Vec::with_capacity(2);

        if new_status.is_done()
            && let Some(recurrence) = &self.recurrence
            && let Some(next) = recurrence.next_after(today)
        {
            log::debug!(
                "Recurring '{}' from {:?} to {:?}",
                self.description,
                recurrence.reference_date(),
                next.reference_date()
            );
            let next_task = self
                .to_builder()
                .status(TaskStatus::Todo)
                .schedule(next)
                .done_date(None)
                .recurrence(Some(recurrence.with_schedule(next)))
                .block_link(None)
                .build();
            tasks.push(next_task);
        }

        let toggled = self
            .to_builder()
            .status(new_status)
            .done_date(new_status.is_done().then_some(today))
            .build();
        tasks.push(toggled);

        tasks
    }

    /// Open tasks first, then by nearest date (undated last), then by path.
    pub fn compare_by_status_date_path(&self, other: &Self) -> Ordering {
        self.status
            .is_done()
            .cmp(&other.status.is_done())
            .then_with(|| match (self.schedule.nearest(), other.schedule.nearest()) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .then_with(|| self.location.path.cmp(&other.location.path))
    }

    /// Stable sort; ties keep their input order.
    pub fn sort_by_status_date_path(mut tasks: Vec<Task>) -> Vec<Task> {
        tasks.sort_by(Task::compare_by_status_date_path);
        tasks
    }
}

/// Builds tasks while keeping their invariants: a stop never outlives its
/// start and only done tasks carry a done date.
#[derive(Debug, Clone)]
pub struct TaskBuilder {
    status_character: char,
    description: String,
    indentation: String,
    location: TaskLocation,
    schedule: Schedule,
    done_date: Option<NaiveDate>,
    recurrence: Option<Recurrence>,
    block_link: Option<String>,
}

impl Default for TaskBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskBuilder {
    pub fn new() -> Self {
        Self {
            status_character: ' ',
            description: String::new(),
            indentation: String::new(),
            location: TaskLocation::default(),
            schedule: Schedule::default(),
            done_date: None,
            recurrence: None,
            block_link: None,
        }
    }

    pub fn status_character(mut self, c: char) -> Self {
        self.status_character = c;
        self
    }

    /// Resets the checkbox mark to the canonical one for `status`.
    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status_character = status.default_character();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn indentation(mut self, indentation: impl Into<String>) -> Self {
        self.indentation = indentation.into();
        self
    }

    pub fn location(mut self, location: TaskLocation) -> Self {
        self.location = location;
        self
    }

    pub fn schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn scheduled(mut self, start: Option<NaiveDateTime>, stop: Option<NaiveDateTime>) -> Self {
        self.schedule.scheduled_start = start;
        self.schedule.scheduled_stop = stop;
        self
    }

    pub fn due(mut self, start: Option<NaiveDateTime>, stop: Option<NaiveDateTime>) -> Self {
        self.schedule.due_start = start;
        self.schedule.due_stop = stop;
        self
    }

    pub fn done_date(mut self, date: Option<NaiveDate>) -> Self {
        self.done_date = date;
        self
    }

    pub fn recurrence(mut self, recurrence: Option<Recurrence>) -> Self {
        self.recurrence = recurrence;
        self
    }

    pub fn block_link(mut self, block_link: Option<String>) -> Self {
        self.block_link = block_link;
        self
    }

    pub fn build(self) -> Task {
        let status = TaskStatus::from_character(self.status_character);
        Task {
            status,
            status_character: self.status_character,
            description: self.description,
            indentation: self.indentation,
            location: self.location,
            schedule: self.schedule.normalized(),
            done_date: self.done_date.filter(|_| status.is_done()),
            recurrence: self.recurrence,
            block_link: self.block_link,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::dates::start_of_day;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_status_follows_character() {
        assert_eq!(TaskStatus::from_character(' '), TaskStatus::Todo);
        assert_eq!(TaskStatus::from_character('x'), TaskStatus::Done);
        assert_eq!(TaskStatus::from_character('-'), TaskStatus::Done);

        let task = Task::builder().status_character('/').build();
        assert_eq!(task.status(), TaskStatus::Done);
        assert_eq!(task.status_character(), '/');
    }

    #[test]
    fn test_builder_enforces_invariants() {
        let stop = start_of_day(date(2021, 9, 12));
        let task = Task::builder()
            .scheduled(None, Some(stop))
            .due(None, Some(stop))
            .done_date(Some(date(2021, 9, 1)))
            .build();
        assert_eq!(task.scheduled_stop(), None);
        assert_eq!(task.due_stop(), None);
        assert_eq!(task.done_date(), None);
    }

    #[test]
    fn test_toggle_plain_task_round_trip() {
        let today = date(2021, 9, 12);
        let open = Task::builder().description("water plants").build();

        let done = open.toggle_on(today);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].status(), TaskStatus::Done);
        assert_eq!(done[0].status_character(), 'x');
        assert_eq!(done[0].done_date(), Some(today));

        let reopened = done[0].toggle_on(today);
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened[0].status_character(), ' ');
        assert_eq!(reopened[0].done_date(), None);
    }

    #[test]
    fn test_nearest_date_prefers_earlier() {
        let early = start_of_day(date(2021, 1, 1));
        let late = start_of_day(date(2021, 2, 1));
        let schedule = Schedule {
            scheduled_start: Some(late),
            due_start: Some(early),
            ..Schedule::default()
        };
        assert_eq!(schedule.nearest(), Some(early));
        assert_eq!(schedule.reference_date(), Some(early));
        assert!(Schedule::default().nearest().is_none());
    }
}
