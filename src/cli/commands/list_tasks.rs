//! List-tasks command
//!
//! Shows, play by play, the tasks the current tag filters select.

use super::CommandContext;
use anyhow::Result;
use clap::Parser;
use rustible_tags::playbook::Playbook;
use rustible_tags::selection::{select_tasks, PlaySelection};
use rustible_tags::tags::{is_special_tag, Tag, TagSet};
use rustible_tags::vars::VarOptions;
use std::path::PathBuf;
use tracing::info;

/// Arguments for the list-tasks command
#[derive(Parser, Debug, Clone)]
pub struct ListTasksArgs {
    /// Path to the playbook file
    #[arg(required = true)]
    pub playbook: PathBuf,

    /// Also list the tasks the filters skip
    #[arg(long)]
    pub show_skipped: bool,
}

impl ListTasksArgs {
    /// Execute the list-tasks command
    pub fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let playbook = Playbook::from_file(&self.playbook)?;
        let plays = select_tasks(
            &playbook,
            &ctx.filter,
            &ctx.templater,
            &ctx.extra_vars,
            ctx.inherit,
        )?;

        for tag in unknown_tags(ctx.filter.only_tags(), &plays) {
            ctx.diagnostics
                .warn(format!("tag '{}' is not used by any play or task", tag));
        }

        ctx.output
            .section(&format!("playbook: {}", self.playbook.display()));
        for play in &plays {
            ctx.output.play_header(play);
            for task in &play.tasks {
                if task.selected || self.show_skipped {
                    ctx.output.task(task, self.show_skipped);
                }
            }
        }

        let selected: usize = plays.iter().map(|p| p.selected().count()).sum();
        let skipped: usize = plays.iter().map(|p| p.skipped().count()).sum();
        info!(selected, skipped, "listed tasks");
        ctx.output
            .info(&format!("{} tasks selected, {} skipped", selected, skipped));

        let mut vars = ctx.filter_vars()?;
        vars.set("plays", serde_json::to_value(&plays)?)?;
        vars.set("selected", selected)?;
        vars.set("skipped", skipped)?;
        vars.set_with("inherit", ctx.inherit, VarOptions::new().verbosity(1))?;

        let msg = format!("{} of {} tasks selected", selected, selected + skipped);
        ctx.finish(&vars, &msg)?;
        Ok(0)
    }
}

/// Requested tags that no play or task carries
fn unknown_tags<'a>(only_tags: &'a TagSet, plays: &[PlaySelection]) -> Vec<&'a Tag> {
    let mut known = TagSet::new();
    for play in plays {
        known.extend(play.tags.iter().cloned());
        for task in &play.tasks {
            known.extend(task.tags.iter().cloned());
        }
    }

    only_tags
        .iter()
        .filter(|tag| !is_special_tag(tag) && !known.contains(*tag))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustible_tags::tags::tag_set;

    #[test]
    fn test_list_tasks_args_parsing() {
        let args = ListTasksArgs::try_parse_from(["list-tasks", "site.yml", "--show-skipped"])
            .unwrap();
        assert_eq!(args.playbook, PathBuf::from("site.yml"));
        assert!(args.show_skipped);
    }

    #[test]
    fn test_unknown_tags_ignore_special() {
        let plays = vec![PlaySelection {
            name: "p".to_string(),
            tags: tag_set(["web"]),
            tasks: Vec::new(),
        }];
        let only = tag_set(["web", "db", "always", "tagged"]);
        let unknown = unknown_tags(&only, &plays);
        assert_eq!(unknown, vec![&Tag::from("db")]);
    }
}
