// Tests for reading checkbox lines into tasks.
use chrono::{NaiveDate, NaiveDateTime};
use mdtasks::model::{Task, TaskLocation, TaskStatus};

fn location() -> TaskLocation {
    TaskLocation {
        path: "daily/2021-09-12.md".to_string(),
        section_start: 3,
        section_index: 2,
        preceding_header: Some("Errands".to_string()),
    }
}

fn parse(line: &str) -> Option<Task> {
    Task::from_line(line, &location(), "")
}

fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

#[test]
fn test_done_task_with_due_and_done_dates() {
    let task = parse("- [x] this is a done task !2021-09-12 ✅ 2021-06-20").unwrap();
    assert_eq!(task.status(), TaskStatus::Done);
    assert_eq!(task.description(), "this is a done task");
    assert_eq!(task.due_start(), Some(midnight(2021, 9, 12)));
    assert_eq!(task.done_date(), NaiveDate::from_ymd_opt(2021, 6, 20));
}

#[test]
fn test_done_marker_inside_description_is_kept() {
    let task = parse("- [x] this is a ✅ done task !2021-09-12 ✅ 2021-06-20").unwrap();
    assert_eq!(task.description(), "this is a ✅ done task");
    assert_eq!(task.done_date(), NaiveDate::from_ymd_opt(2021, 6, 20));
}

#[test]
fn test_block_link_with_trailing_spaces() {
    let task = parse("- [ ] this is a task with a block link ^my-precious   ").unwrap();
    assert_eq!(task.description(), "this is a task with a block link");
    assert_eq!(task.block_link(), Some("^my-precious"));
}

#[test]
fn test_location_and_indentation_are_kept() {
    let task = parse("\t  * [ ] nested item").unwrap();
    assert_eq!(task.indentation(), "\t  ");
    assert!(task.is_sub_item());
    assert_eq!(task.location(), &location());
    assert_eq!(task.preceding_header(), Some("Errands"));
}

#[test]
fn test_global_filter() {
    let loc = location();
    assert!(Task::from_line("- [ ] buy milk", &loc, "#task").is_none());

    let task = Task::from_line("- [ ] #task buy milk", &loc, "#task").unwrap();
    assert_eq!(task.description(), "#task buy milk");
}

#[test]
fn test_any_status_character_counts_as_done() {
    let task = parse("- [-] cancelled").unwrap();
    assert_eq!(task.status(), TaskStatus::Done);
    assert_eq!(task.status_character(), '-');
}

#[test]
fn test_markers_only_count_at_the_end() {
    let task = parse("- [ ] move !2021-09-12 to friday").unwrap();
    assert_eq!(task.description(), "move !2021-09-12 to friday");
    assert!(task.due_start().is_none());
}

#[test]
fn test_date_time_and_ranges() {
    let task = parse("- [ ] dentist @2021-09-12T14:30 !2021-09-14--2021-09-15").unwrap();
    assert_eq!(
        task.scheduled_start(),
        Some(midnight(2021, 9, 12) + chrono::Duration::minutes(14 * 60 + 30))
    );
    assert_eq!(task.scheduled_stop(), None);
    assert_eq!(task.due_start(), Some(midnight(2021, 9, 14)));
    assert_eq!(task.due_stop(), Some(midnight(2021, 9, 15)));
}

#[test]
fn test_recurrence_is_read_with_dates() {
    let task = parse("- [ ] pay rent +monthly !2021-09-01").unwrap();
    let recurrence = task.recurrence().unwrap();
    assert_eq!(recurrence.to_text(), "every month");
    assert_eq!(recurrence.reference_date(), Some(midnight(2021, 9, 1)));
    assert_eq!(task.description(), "pay rent");
}

#[test]
fn test_empty_description() {
    let task = parse("- [ ] ").unwrap();
    assert_eq!(task.description(), "");
    assert_eq!(task.status(), TaskStatus::Todo);
}
