//! Plain-text todo file parsing and rendering.
//!
//! Format, one task per line:
//!
//! ```text
//! # comment
//! - [ ] Buy milk !3 (4721)
//! - [ ]   Call dentist
//!   - [ ] bring insurance card
//! - [x] Ship the package @done(2026-08-20)
//! ```
//!
//! `!N` is the local priority (0 most urgent .. 4), the trailing `(NNNN)`
//! parenthetical is the correlation marker, `@done(YYYY-MM-DD)` records the
//! completion day, and two-space-indented entries are subtasks of the
//! preceding top-level task. Any other non-blank, non-comment line is
//! malformed and aborts the load.

use std::path::Path;

use chrono::{NaiveDate, NaiveTime, Utc};

use crate::error::{Error, Result};
use crate::task::{Source, Task, TaskSet};

/// Load and parse the todo file at `path`.
pub fn load(path: &Path) -> Result<TaskSet> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    parse(&text)
}

/// Parse todo file text into current and completed task lists.
pub fn parse(text: &str) -> Result<TaskSet> {
    let mut set = TaskSet::default();
    // (completed?, index) of the last top-level task, for subtask attachment.
    let mut last_top: Option<(bool, usize)> = None;

    for (index, raw_line) in text.lines().enumerate() {
        let line_no = index + 1;
        if raw_line.trim().is_empty() || raw_line.trim_start().starts_with('#') {
            continue;
        }

        let indented = raw_line.starts_with("  ") || raw_line.starts_with('\t');
        let (completed, task) = parse_task_line(raw_line.trim(), line_no)?;

        if indented {
            let Some((parent_completed, parent_index)) = last_top else {
                return Err(Error::MalformedTodoLine {
                    line: line_no,
                    reason: "subtask without a parent task".to_string(),
                });
            };
            let parent = if parent_completed {
                &mut set.completed[parent_index]
            } else {
                &mut set.current[parent_index]
            };
            let mut subtask = task;
            subtask.parent_content = Some(parent.content.clone());
            parent.subtasks.push(subtask);
            continue;
        }

        if completed {
            set.completed.push(task);
            last_top = Some((true, set.completed.len() - 1));
        } else {
            set.current.push(task);
            last_top = Some((false, set.current.len() - 1));
        }
    }

    Ok(set)
}

fn parse_task_line(line: &str, line_no: usize) -> Result<(bool, Task)> {
    let (completed, rest) = if let Some(rest) = line.strip_prefix("- [ ]") {
        (false, rest)
    } else if let Some(rest) = line.strip_prefix("- [x]").or_else(|| line.strip_prefix("- [X]")) {
        (true, rest)
    } else {
        return Err(Error::MalformedTodoLine {
            line: line_no,
            reason: format!("expected `- [ ]` or `- [x]` checkbox, got {line:?}"),
        });
    };

    let mut priority: Option<u8> = None;
    let mut completed_at = None;
    let mut words: Vec<&str> = Vec::new();

    for word in rest.split_whitespace() {
        if let Some(level) = parse_priority_token(word) {
            priority = Some(level);
            continue;
        }
        if let Some(day) = parse_done_tag(word) {
            completed_at = Some(
                day.and_time(NaiveTime::MIN)
                    .and_local_timezone(Utc)
                    .single()
                    .unwrap_or_else(Utc::now),
            );
            continue;
        }
        words.push(word);
    }

    let content = words.join(" ");
    if content.is_empty() {
        return Err(Error::MalformedTodoLine {
            line: line_no,
            reason: "task has no content".to_string(),
        });
    }

    let mut task = Task::new(content).with_source(Source::Local);
    task.priority = priority;
    task.completed_at = completed_at;
    Ok((completed, task))
}

fn parse_priority_token(word: &str) -> Option<u8> {
    let digits = word.strip_prefix('!')?;
    if digits.len() != 1 {
        return None;
    }
    let level = digits.parse::<u8>().ok()?;
    (level <= 4).then_some(level)
}

fn parse_done_tag(word: &str) -> Option<NaiveDate> {
    let inner = word.strip_prefix("@done(")?.strip_suffix(')')?;
    NaiveDate::parse_from_str(inner, "%Y-%m-%d").ok()
}

/// Render a task set back to todo file text.
pub fn render(set: &TaskSet) -> String {
    let mut lines = Vec::new();
    for task in &set.current {
        lines.push(render_task(task, false));
        for subtask in &task.subtasks {
            lines.push(format!("  {}", render_task(subtask, false)));
        }
    }
    for task in &set.completed {
        lines.push(render_task(task, true));
        for subtask in &task.subtasks {
            lines.push(format!("  {}", render_task(subtask, true)));
        }
    }
    let mut text = lines.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    text
}

fn render_task(task: &Task, completed: bool) -> String {
    let checkbox = if completed { "- [x]" } else { "- [ ]" };
    let mut line = format!("{checkbox} {}", task.content);
    if let Some(priority) = task.priority {
        line.push_str(&format!(" !{priority}"));
    }
    if completed {
        if let Some(at) = task.completed_at {
            line.push_str(&format!(" @done({})", at.date_naive().format("%Y-%m-%d")));
        }
    }
    line
}
