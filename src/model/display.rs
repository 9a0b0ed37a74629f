// File: ./src/model/display.rs
use crate::config::Settings;
use crate::model::dates::{DATE_FORMAT, format_stop, format_timestamp};
use crate::model::item::Task;
use chrono::NaiveDateTime;

pub trait TaskDisplay {
    /// Task text without the list prefix, markers in canonical order.
    fn to_text(&self) -> String;
    /// The full Markdown line, ready to be written back to a note.
    fn to_file_line(&self) -> String;
    /// Description as shown in rendered lists.
    fn display_text(&self, settings: &Settings) -> String;
}

impl TaskDisplay for Task {
    fn to_text(&self) -> String {
        let mut text = self.description().to_string();

        if let Some(recurrence) = self.recurrence() {
            text.push_str(" +");
            text.push_str(&recurrence.to_text());
        }
        push_range(&mut text, '@', self.scheduled_start(), self.scheduled_stop());
        push_range(&mut text, '!', self.due_start(), self.due_stop());
        if let Some(done) = self.done_date() {
            text.push_str(&format!(" ✅ {}", done.format(DATE_FORMAT)));
        }
        if let Some(link) = self.block_link() {
            text.push(' ');
            text.push_str(link);
        }

        text
    }

    fn to_file_line(&self) -> String {
        format!(
            "{}- [{}] {}",
            self.indentation(),
            self.status_character(),
            self.to_text()
        )
    }

    fn display_text(&self, settings: &Settings) -> String {
        if settings.remove_global_filter && !settings.global_filter.is_empty() {
            self.description()
                .replacen(&settings.global_filter, "", 1)
                .trim()
                .to_string()
        } else {
            self.description().to_string()
        }
    }
}

fn push_range(
    text: &mut String,
    marker: char,
    start: Option<NaiveDateTime>,
    stop: Option<NaiveDateTime>,
) {
    let Some(start) = start else {
        return;
    };
    text.push(' ');
    text.push(marker);
    text.push_str(&format_timestamp(&start));
    if let Some(stop) = stop {
        text.push_str("--");
        text.push_str(&format_stop(&start, &stop));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::TaskLocation;

    fn line(text: &str) -> Task {
        Task::from_line(text, &TaskLocation::in_file("a.md"), "").unwrap()
    }

    #[test]
    fn test_canonical_marker_order() {
        let task = line("- [x] pay rent ✅ 2021-09-02 !2021-09-01 @2021-08-30 +monthly");
        assert_eq!(
            task.to_text(),
            "pay rent +every month @2021-08-30 !2021-09-01 ✅ 2021-09-02"
        );
    }

    #[test]
    fn test_stop_rendering() {
        let task = line("- [ ] call @2021-09-12T09:00--2021-09-12T10:00");
        assert_eq!(task.to_text(), "call @2021-09-12T09:00--10:00");

        let task = line("- [ ] holiday !2021-09-12--2021-09-19");
        assert_eq!(task.to_text(), "holiday !2021-09-12--2021-09-19");
    }

    #[test]
    fn test_file_line_keeps_indent_and_mark() {
        let task = line("    * [/] half way there ^abc");
        assert_eq!(task.to_file_line(), "    - [/] half way there ^abc");
    }

    #[test]
    fn test_display_text_strips_global_filter() {
        let task = Task::from_line("- [ ] #task buy milk", &TaskLocation::default(), "#task").unwrap();
        let mut settings = Settings {
            global_filter: "#task".to_string(),
            remove_global_filter: false,
        };
        assert_eq!(task.display_text(&settings), "#task buy milk");
        settings.remove_global_filter = true;
        assert_eq!(task.display_text(&settings), "buy milk");
    }
}
