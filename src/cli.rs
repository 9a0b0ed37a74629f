// File: ./src/cli.rs
//! Shared command-line interface logic: argument parsing, help and the
//! `query`, `toggle` and `parse` commands.
use crate::config::Settings;
use crate::document::{DocumentTask, replace_task_line, scan_document};
use crate::model::{Query, Task, TaskDisplay, TaskLocation};
use anyhow::{Context, Result, bail};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Query {
        /// Query text file, or `-` for stdin.
        query_file: String,
        files: Vec<PathBuf>,
    },
    Toggle {
        file: PathBuf,
        /// One-based, as shown by editors.
        line: usize,
    },
    Parse {
        line: String,
    },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    pub json: bool,
    pub config: Option<PathBuf>,
    pub verbosity: u8,
}

/// Parses arguments, excluding the binary name.
pub fn parse_args(args: &[String]) -> Result<Invocation> {
    let mut json = false;
    let mut config = None;
    let mut verbosity = 0;
    let mut positional: Vec<String> = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" | "help" if positional.is_empty() => {
                return Ok(Invocation {
                    command: Command::Help,
                    json,
                    config,
                    verbosity,
                });
            }
            "--json" => json = true,
            "-v" => verbosity += 1,
            "-vv" => verbosity += 2,
            "--config" => {
                let path = iter.next().context("--config needs a path")?;
                config = Some(PathBuf::from(path));
            }
            _ => positional.push(arg.clone()),
        }
    }

    let Some((name, rest)) = positional.split_first() else {
        return Ok(Invocation {
            command: Command::Help,
            json,
            config,
            verbosity,
        });
    };

    let command = match name.as_str() {
        "query" => match rest {
            [query_file, files @ ..] if !files.is_empty() => Command::Query {
                query_file: query_file.clone(),
                files: files.iter().map(PathBuf::from).collect(),
            },
            _ => bail!("usage: query <query-file|-> <note.md>..."),
        },
        "toggle" => match rest {
            [file, line] => {
                let line: usize = line
                    .parse()
                    .with_context(|| format!("'{}' is not a line number", line))?;
                if line == 0 {
                    bail!("Line numbers start at 1");
                }
                Command::Toggle {
                    file: PathBuf::from(file),
                    line,
                }
            }
            _ => bail!("usage: toggle <note.md> <line>"),
        },
        "parse" => {
            if rest.is_empty() {
                bail!("usage: parse <markdown line>");
            }
            Command::Parse {
                line: rest.join(" "),
            }
        }
        other => bail!("Unknown command '{}'. Try --help.", other),
    };

    Ok(Invocation {
        command,
        json,
        config,
        verbosity,
    })
}

pub fn print_help(binary_name: &str) {
    println!(
        "mdtasks v{} - Checkbox tasks, recurrence and queries for Markdown notes",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    {} query <query-file|-> <note.md>...", binary_name);
    println!("    {} toggle <note.md> <line>", binary_name);
    println!("    {} parse <markdown line>", binary_name);
    println!("    {} --help", binary_name);
    println!();
    println!("Nothing is written to disk: toggle prints the updated note.");
    println!();
    println!("OPTIONS:");
    println!("    --json                Print query results as JSON.");
    println!("    --config <path>       Use a different config.toml.");
    println!("    -v, -vv               More log output on stderr.");
    println!("    -h, --help            Show this help message.");
    println!();
    println!("QUERY CLAUSES (one per line):");
    println!("    done | not done | no due date | no scheduled date | exclude sub-items");
    println!("    due|scheduled|any|done [before|after|on] <date>");
    println!("    path|description|heading includes|does not include <text>");
    println!("    limit [to] <n> [tasks]");
    println!();
    println!("TASK SYNTAX:");
    println!("    - [ ] description +every week @2021-09-10 !2021-09-12 ✅ 2021-09-11 ^block-id");
    println!("    +rule             Recurrence (+every day, +weekly, +every month on the 1st)");
    println!("    @date[--stop]     Scheduled date or range");
    println!("    !date[--stop]     Due date or range");
    println!("    ✅ date           Completion date");
}

/// Executes a non-help command, writing its output to `out`.
pub fn run(invocation: &Invocation, settings: &Settings, out: &mut impl Write) -> Result<()> {
    match &invocation.command {
        Command::Help => Ok(()),
        Command::Parse { line } => {
            let task = Task::from_line(line, &TaskLocation::default(), &settings.global_filter)
                .context("Not a task line")?;
            writeln!(out, "{}", serde_json::to_string_pretty(&task)?)?;
            Ok(())
        }
        Command::Query { query_file, files } => {
            let query = Query::parse(&read_query(query_file)?);
            let mut found = Vec::new();
            for file in files {
                found.extend(read_tasks(file, settings)?);
            }
            let results = query
                .apply_by(found, |found| &found.task)
                .context("Tasks query")?;
            log::info!("Query matched {} tasks", results.len());

            if invocation.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&results)?)?;
            } else {
                for found in &results {
                    writeln!(
                        out,
                        "{}:{}: {}",
                        found.task.path(),
                        found.line + 1,
                        render_line(&found.task, settings)
                    )?;
                }
            }
            Ok(())
        }
        Command::Toggle { file, line } => {
            let text = fs::read_to_string(file)
                .with_context(|| format!("Failed to read '{}'", file.display()))?;
            let path = file.to_string_lossy();
            let target = scan_document(&path, &text, &settings.global_filter)
                .into_iter()
                .find(|found| found.line + 1 == *line)
                .with_context(|| format!("No task on line {} of {}", line, path))?;

            let toggled = target.task.toggle();
            let updated = replace_task_line(&text, &target, &toggled, &settings.global_filter)?;
            log::info!("Toggled line {} of {} into {} tasks", line, path, toggled.len());
            write!(out, "{}", updated)?;
            Ok(())
        }
    }
}

fn read_query(source: &str) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read query from stdin")?;
        return Ok(text);
    }
    fs::read_to_string(source).with_context(|| format!("Failed to read query file '{}'", source))
}

fn read_tasks(file: &Path, settings: &Settings) -> Result<Vec<DocumentTask>> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read '{}'", file.display()))?;
    Ok(scan_document(
        &file.to_string_lossy(),
        &text,
        &settings.global_filter,
    ))
}

/// The task's file line with its description as rendered for lists.
fn render_line(task: &Task, settings: &Settings) -> String {
    task.to_builder()
        .description(task.display_text(settings))
        .indentation("")
        .build()
        .to_file_line()
}
