// Tests for task sorting logic.
use mdtasks::model::{Task, TaskLocation};
use std::cmp::Ordering;

fn task_at(path: &str, line: &str) -> Task {
    Task::from_line(line, &TaskLocation::in_file(path), "").unwrap()
}

fn task(line: &str) -> Task {
    task_at("notes.md", line)
}

fn order(tasks: Vec<Task>) -> Vec<String> {
    Task::sort_by_status_date_path(tasks)
        .iter()
        .map(|t| t.description().to_string())
        .collect()
}

#[test]
fn test_dated_before_undated() {
    let tasks = vec![
        task("- [ ] no date"),
        task("- [ ] future scheduled @2030-01-01"),
        task("- [ ] past due !2020-01-01"),
    ];
    assert_eq!(order(tasks), vec!["past due", "future scheduled", "no date"]);
}

#[test]
fn test_status_trumps_dates() {
    let done = task("- [x] done early !2000-01-01");
    let open = task("- [ ] open late !2099-01-01");
    assert_eq!(open.compare_by_status_date_path(&done), Ordering::Less);
    assert_eq!(order(vec![done, open]), vec!["open late", "done early"]);
}

#[test]
fn test_nearest_of_due_and_scheduled() {
    let tasks = vec![
        task("- [ ] due soon !2021-09-02"),
        task("- [ ] scheduled first @2021-09-01 !2021-09-30"),
    ];
    assert_eq!(order(tasks), vec!["scheduled first", "due soon"]);
}

#[test]
fn test_path_breaks_ties() {
    let tasks = vec![
        task_at("b.md", "- [ ] in b !2021-09-01"),
        task_at("a.md", "- [ ] in a !2021-09-01"),
    ];
    assert_eq!(order(tasks), vec!["in a", "in b"]);
}

#[test]
fn test_sort_is_stable() {
    let tasks = vec![task("- [ ] first"), task("- [ ] second"), task("- [ ] third")];
    assert_eq!(order(tasks), vec!["first", "second", "third"]);
}
