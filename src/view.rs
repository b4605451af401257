// View collaborator: everything the store tells the presentation layer

use crate::error::TaskError;
use crate::task::Task;
use colored::Colorize;
use std::io::Write;
use tracing::warn;

/// Presentation layer fed by [`crate::TaskStore`]
///
/// `render` is called once after hydration and again after every mutation
/// that changed the task list.
pub trait View {
    /// Redraw with the filtered task list and the number of open tasks
    fn render(&mut self, visible: &[&Task], remaining: usize);

    /// A task went from open to completed
    fn task_completed(&mut self, _task: &Task) {}

    /// Loading or saving the task list failed; the session goes on in memory
    fn persist_failed(&mut self, _error: &TaskError) {}
}

/// Headless view
impl View for () {
    fn render(&mut self, _visible: &[&Task], _remaining: usize) {}
}

/// "1 task remaining", "3 tasks remaining"
pub fn remaining_summary(remaining: usize) -> String {
    format!("{} task{} remaining", remaining, if remaining == 1 { "" } else { "s" })
}

/// Holds back renders until [`LatestSnapshot::flush`], keeping only the last
///
/// One-shot front-ends use this to print a single list per invocation instead
/// of one per store operation. Completion and failure notices pass straight
/// through.
pub struct LatestSnapshot<V: View> {
    inner: V,
    pending: Option<(Vec<Task>, usize)>,
}

impl<V: View> LatestSnapshot<V> {
    pub fn new(inner: V) -> Self {
        Self { inner, pending: None }
    }

    /// Render the most recent snapshot, if any arrived since the last flush
    pub fn flush(&mut self) {
        if let Some((tasks, remaining)) = self.pending.take() {
            let visible: Vec<&Task> = tasks.iter().collect();
            self.inner.render(&visible, remaining);
        }
    }

    pub fn into_inner(self) -> V {
        self.inner
    }
}

impl<V: View> View for LatestSnapshot<V> {
    fn render(&mut self, visible: &[&Task], remaining: usize) {
        self.pending = Some((visible.iter().map(|t| (*t).clone()).collect(), remaining));
    }

    fn task_completed(&mut self, task: &Task) {
        self.inner.task_completed(task);
    }

    fn persist_failed(&mut self, error: &TaskError) {
        self.inner.persist_failed(error);
    }
}

/// Line-oriented terminal view
pub struct TerminalView<W: Write> {
    out: W,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_lines(&mut self, lines: &[String]) {
        for line in lines {
            if let Err(e) = writeln!(self.out, "{}", line) {
                warn!(error = ?e, "Failed to write to terminal");
                return;
            }
        }
    }
}

impl<W: Write> View for TerminalView<W> {
    fn render(&mut self, visible: &[&Task], remaining: usize) {
        let mut lines = Vec::with_capacity(visible.len() + 1);

        if visible.is_empty() {
            lines.push("No tasks yet. Add a task to get started!".dimmed().to_string());
        }

        for task in visible {
            let line = if task.completed {
                format!(
                    "{} {}  {}",
                    "[x]".green(),
                    task.id.as_str().dimmed(),
                    task.text.dimmed().strikethrough()
                )
            } else {
                format!("[ ] {}  {}", task.id.as_str().dimmed(), task.text)
            };
            lines.push(line);
        }

        lines.push(remaining_summary(remaining).bold().to_string());
        self.write_lines(&lines);
    }

    fn task_completed(&mut self, task: &Task) {
        self.write_lines(&[format!("{} {}", "Completed!".green().bold(), task.text)]);
    }

    fn persist_failed(&mut self, error: &TaskError) {
        self.write_lines(&[format!("{} {}", "warning:".yellow().bold(), error)]);
    }
}
