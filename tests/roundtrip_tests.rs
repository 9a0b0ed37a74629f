// Serializing a parsed task and reading it back must give the same task.
use mdtasks::model::{Task, TaskDisplay, TaskLocation};

const CANONICAL_LINES: &[&str] = &[
    "- [ ] plain",
    "- [x] done thing !2021-09-12 ✅ 2021-09-12",
    "  - [ ] nested @2021-09-12T09:00--10:30 !2021-09-14",
    "- [ ] chores +every week on Monday, Friday @2021-09-10 ^chores",
    "- [/] in progress +every 2 days for 3 times !2021-09-12T18:00--2021-09-13T02:00",
    "- [ ] big one +every month on the 1st, last until December 31, 2021 !2021-09-01",
    "\t- [ ] shift !2021-09-12--2021-09-14",
];

fn location() -> TaskLocation {
    TaskLocation {
        path: "projects/house.md".to_string(),
        section_start: 4,
        section_index: 1,
        preceding_header: Some("Garden".to_string()),
    }
}

#[test]
fn test_canonical_lines_are_stable() {
    for line in CANONICAL_LINES {
        let task = Task::from_line(line, &location(), "").unwrap();
        assert_eq!(&task.to_file_line(), line);
    }
}

#[test]
fn test_reparse_gives_equal_task() {
    for line in CANONICAL_LINES {
        let task = Task::from_line(line, &location(), "").unwrap();
        let again = Task::from_line(&task.to_file_line(), &location(), "").unwrap();
        assert_eq!(again, task, "{}", line);
    }
}

#[test]
fn test_loose_input_is_normalized() {
    let cases = [
        ("* [ ] star bullet", "- [ ] star bullet"),
        ("-   [ ]    spaced   ", "- [ ] spaced"),
        ("- [ ] braces !{2021-09-12}", "- [ ] braces !2021-09-12"),
        ("- [ ] midnight !2021-09-12T00:00", "- [ ] midnight !2021-09-12"),
        ("- [x] tight ✅2021-09-12", "- [x] tight ✅ 2021-09-12"),
        ("- [ ] rule +Every Other Week", "- [ ] rule +every 2 weeks"),
        (
            "- [ ] same-day stop @2021-09-12T10:00--2021-09-12T11:00",
            "- [ ] same-day stop @2021-09-12T10:00--11:00",
        ),
    ];
    for (input, expected) in cases {
        let task = Task::from_line(input, &location(), "").unwrap();
        assert_eq!(task.to_file_line(), expected, "{}", input);
    }
}

#[test]
fn test_round_trip_after_toggle() {
    let task = Task::from_line(
        "- [ ] review +every week @2021-09-10T09:00--10:00 !2021-09-12 ^weekly",
        &location(),
        "",
    )
    .unwrap();
    let today = chrono::NaiveDate::from_ymd_opt(2021, 9, 12).unwrap();
    for produced in task.toggle_on(today) {
        let reread = Task::from_line(&produced.to_file_line(), &location(), "").unwrap();
        assert_eq!(reread, produced);
    }
}
