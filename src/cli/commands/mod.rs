//! Subcommands module for the rustible-tags CLI
//!
//! This module contains all the subcommand implementations.

pub mod check;
pub mod list_tags;
pub mod list_tasks;

use crate::cli::output::OutputFormatter;
use anyhow::{Context, Result};
use rustible_tags::config::Config;
use rustible_tags::diagnostics::Diagnostics;
use rustible_tags::result::{render_diff, ResultOptions, TaskResult};
use rustible_tags::tags::{format_tags, MiniJinjaTemplater, TagFilter, TemplateVars};
use rustible_tags::vars::{VarDict, VarOptions};
use std::path::Path;

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration
    pub config: Config,
    /// Output formatter
    pub output: OutputFormatter,
    /// Tag filter from the command line, or the configured defaults
    pub filter: TagFilter,
    /// Extra variables
    pub extra_vars: TemplateVars,
    /// Verbosity level
    pub verbosity: u8,
    /// Diff mode
    pub diff_mode: bool,
    /// Decide tasks on inherited tags
    pub inherit: bool,
    /// Template engine for dynamic tags
    pub templater: MiniJinjaTemplater,
    /// Warnings collected while running the command
    pub diagnostics: Diagnostics,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &crate::cli::Cli, config: Config) -> Result<Self> {
        let verbosity = cli.verbosity().max(config.output.verbosity);
        let output = OutputFormatter::new(
            !cli.no_color && config.output.color,
            cli.is_json(),
            verbosity,
        );

        let configured = config.tag_filter();
        let tags: &[String] = if cli.tags.is_empty() {
            &config.tags.run
        } else {
            &cli.tags
        };
        let skip_tags: &[String] = if cli.skip_tags.is_empty() {
            &config.tags.skip
        } else {
            &cli.skip_tags
        };
        let filter = TagFilter::from_cli_values(tags, skip_tags);

        let mut diagnostics = Diagnostics::new();
        if configured != filter && configured.is_active() {
            diagnostics.warn("command line tag filters replace the configured ones");
        }

        Ok(Self {
            extra_vars: parse_extra_vars(&cli.extra_vars)?,
            diff_mode: cli.diff_mode || config.output.diff,
            inherit: config.tags.inherit && !cli.no_inherit,
            templater: MiniJinjaTemplater::new(),
            config,
            output,
            filter,
            verbosity,
            diagnostics,
        })
    }

    /// Result options for the current invocation
    pub fn result_options(&self) -> ResultOptions {
        ResultOptions::new()
            .with_verbosity(self.verbosity)
            .with_diff_mode(self.diff_mode)
    }

    /// Track the effective filters, diffed against the configured defaults.
    ///
    /// The result reports `changed` when the command line replaced them.
    pub fn filter_vars(&self) -> Result<VarDict> {
        let configured = self.config.tag_filter();
        let mut vars = VarDict::new();
        let options = VarOptions::new().diff(true);

        vars.set_with(
            "only_tags",
            format_tags(configured.only_tags()),
            options.clone(),
        )?;
        vars.set("only_tags", format_tags(self.filter.only_tags()))?;
        vars.set_with("skip_tags", format_tags(configured.skip_tags()), options)?;
        vars.set("skip_tags", format_tags(self.filter.skip_tags()))?;
        Ok(vars)
    }

    /// Print the result of a command: JSON as a whole, or the filter diff and
    /// collected warnings for human output
    pub fn finish(&mut self, vars: &VarDict, msg: &str) -> Result<()> {
        let options = self.result_options().with_msg(msg);
        let result = TaskResult::from_vars(vars, &options, &mut self.diagnostics);

        if self.output.is_json() {
            return self.output.json(&result);
        }

        if let Some(diff) = &result.diff {
            self.output.diff(&render_diff(diff, self.output.use_color()));
        }
        for warning in &result.warnings {
            self.output.warning(warning);
        }
        self.output.flush();
        Ok(())
    }
}

/// Parse extra variables into template variables
pub fn parse_extra_vars(values: &[String]) -> Result<TemplateVars> {
    let mut vars = TemplateVars::new();

    for var in values {
        if let Some(file_path) = var.strip_prefix('@') {
            vars.extend(load_vars_file(Path::new(file_path))?);
        } else if let Some((key, value)) = var.split_once('=') {
            // Parse key=value, keeping the raw text when it is not YAML
            let parsed_value: serde_yaml::Value = serde_yaml::from_str(value)
                .unwrap_or_else(|_| serde_yaml::Value::String(value.to_string()));
            vars.insert(key.to_string(), serde_json::to_value(parsed_value)?);
        } else {
            anyhow::bail!("Invalid extra variable '{}': expected key=value or @file", var);
        }
    }

    Ok(vars)
}

fn load_vars_file(path: &Path) -> Result<TemplateVars> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read vars file: {}", path.display()))?;
    let vars: TemplateVars = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse vars file: {}", path.display()))?;
    Ok(vars)
}
