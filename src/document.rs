// File: ./src/document.rs
// Finds tasks in whole Markdown notes and splices toggled tasks back into the text.
use crate::model::{Task, TaskDisplay, TaskLocation};
use anyhow::{Result, bail};
use serde::Serialize;

/// A task together with its zero-based line number in the note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentTask {
    pub line: usize,
    pub task: Task,
}

/// Text of an ATX heading (`#` to `######` followed by a space).
fn heading_text(line: &str) -> Option<&str> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &line[level..];
    if rest.is_empty() {
        return Some("");
    }
    rest.starts_with(' ').then(|| rest.trim())
}

/// Every task in `text`, in document order. Sections start at each heading;
/// `section_index` counts tasks within the current section.
pub fn scan_document(path: &str, text: &str, global_filter: &str) -> Vec<DocumentTask> {
    let mut tasks = Vec::new();
    let mut section_start = 0;
    let mut section_index = 0;
    let mut heading: Option<String> = None;

    for (line_number, line) in text.lines().enumerate() {
        if let Some(title) = heading_text(line) {
            section_start = line_number;
            section_index = 0;
            heading = Some(title.to_string());
            continue;
        }

        let location = TaskLocation {
            path: path.to_string(),
            section_start,
            section_index,
            preceding_header: heading.clone(),
        };
        if let Some(task) = Task::from_line(line, &location, global_filter) {
            tasks.push(DocumentTask {
                line: line_number,
                task,
            });
            section_index += 1;
        }
    }

    log::debug!("Found {} tasks in {}", tasks.len(), path);
    tasks
}

/// Replaces the line holding `original` with the file lines of `replacements`.
///
/// The note is scanned again first and the task on that line must still be
/// the same one, so edits made since the original scan are not overwritten.
pub fn replace_task_line(
    text: &str,
    original: &DocumentTask,
    replacements: &[Task],
    global_filter: &str,
) -> Result<String> {
    let current = scan_document(original.task.path(), text, global_filter)
        .into_iter()
        .find(|found| found.line == original.line);

    match current {
        None => bail!(
            "No task on line {} of {}",
            original.line + 1,
            original.task.path()
        ),
        Some(found) if found.task != original.task => bail!(
            "Task on line {} of {} changed since it was read",
            original.line + 1,
            original.task.path()
        ),
        Some(_) => {}
    }

    let mut lines: Vec<String> = Vec::new();
    for (line_number, line) in text.lines().enumerate() {
        if line_number == original.line {
            lines.extend(replacements.iter().map(|t| t.to_file_line()));
        } else {
            lines.push(line.to_string());
        }
    }

    let mut result = lines.join("\n");
    if text.ends_with('\n') {
        result.push('\n');
    }
    Ok(result)
}
