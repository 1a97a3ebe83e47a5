//! Output formatting module for rustible-tags
//!
//! Provides colored human output and pretty-printed JSON output.

use colored::Colorize;
use is_terminal::IsTerminal;
use rustible_tags::playbook::Section;
use rustible_tags::selection::{PlaySelection, TaskSelection};
use rustible_tags::tags::{format_tags, TagSet};
use serde::Serialize;
use std::io::{self, Write};

/// Selection status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Task runs
    Selected,
    /// Task is skipped by the tag filter
    Skipped,
}

impl TaskStatus {
    /// Status of a selection
    pub fn of(task: &TaskSelection) -> Self {
        if task.selected {
            TaskStatus::Selected
        } else {
            TaskStatus::Skipped
        }
    }

    /// Get the colored string representation
    pub fn colored_string(&self) -> String {
        match self {
            TaskStatus::Selected => "run".green().to_string(),
            TaskStatus::Skipped => "skip".cyan().to_string(),
        }
    }

    /// Get the plain string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Selected => "run",
            TaskStatus::Skipped => "skip",
        }
    }
}

/// Output formatter for different output modes
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
    /// JSON output mode
    json_mode: bool,
    /// Verbosity level
    verbosity: u8,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, json_mode: bool, verbosity: u8) -> Self {
        // Respect NO_COLOR and never color piped output
        let use_color =
            use_color && std::env::var("NO_COLOR").is_err() && io::stdout().is_terminal();

        Self {
            use_color,
            json_mode,
            verbosity,
        }
    }

    /// Whether colors are enabled
    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Whether JSON output is requested
    pub fn is_json(&self) -> bool {
        self.json_mode
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        if self.json_mode {
            return;
        }

        if self.use_color {
            println!("\n{}", title.cyan().bold());
            println!("{}", "-".repeat(title.len()).cyan());
        } else {
            println!("\n{}", title);
            println!("{}", "-".repeat(title.len()));
        }
    }

    /// Print a play header
    pub fn play_header(&self, play: &PlaySelection) {
        if self.json_mode {
            return;
        }

        let header = format!("PLAY [{}]", play.name);
        let stars = "*".repeat(80_usize.saturating_sub(header.len() + 1));

        if self.use_color {
            println!(
                "\n{} {}",
                header.bright_white().bold(),
                stars.bright_black()
            );
        } else {
            println!("\n{} {}", header, stars);
        }
        if !play.tags.is_empty() {
            println!("  PLAY TAGS: [{}]", self.tags(&play.tags));
        }
    }

    /// Print one task line
    pub fn task(&self, task: &TaskSelection, show_status: bool) {
        if self.json_mode {
            return;
        }

        let mut line = String::from("  ");
        if show_status {
            let status = TaskStatus::of(task);
            let status = if self.use_color {
                status.colored_string()
            } else {
                status.as_str().to_string()
            };
            line.push_str(&format!("[{:<4}] ", status));
        }
        for block in &task.blocks {
            line.push_str(block);
            line.push_str(" : ");
        }
        line.push_str(&task.name);
        if task.section == Section::Handlers {
            line.push_str(" [handler]");
        }
        if self.verbosity >= 1 {
            if let Some(action) = &task.action {
                line.push_str(&format!(" ({})", action));
            }
        }
        line.push_str(&format!("\tTAGS: [{}]", self.tags(&task.tags)));
        println!("{}", line);
    }

    fn tags(&self, tags: &TagSet) -> String {
        let text = format_tags(tags);
        if self.use_color {
            text.yellow().to_string()
        } else {
            text
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.json_mode {
            let err = serde_json::json!({
                "type": "error",
                "message": message
            });
            eprintln!("{}", err);
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "ERROR:".red().bold(), message);
        } else {
            eprintln!("ERROR: {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.json_mode {
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "WARNING:".yellow().bold(), message);
        } else {
            eprintln!("WARNING: {}", message);
        }
    }

    /// Print an info message (respects verbosity)
    pub fn info(&self, message: &str) {
        if self.verbosity < 1 || self.json_mode {
            return;
        }

        if self.use_color {
            println!("{} {}", "INFO:".blue(), message);
        } else {
            println!("INFO: {}", message);
        }
    }

    /// Print a plain line of human output
    pub fn plain(&self, message: &str) {
        if !self.json_mode {
            println!("{}", message);
        }
    }

    /// Print pre-rendered diff text
    pub fn diff(&self, text: &str) {
        if !self.json_mode {
            print!("{}", text);
        }
    }

    /// Print a value as pretty JSON
    pub fn json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        let text = serde_json::to_string_pretty(value)?;
        println!("{}", text);
        Ok(())
    }

    /// Flush stdout
    pub fn flush(&self) {
        let _ = io::stdout().flush();
    }
}
