//! List-tags command
//!
//! Shows every tag declared in a playbook with the tasks carrying it.

use super::CommandContext;
use anyhow::Result;
use clap::Parser;
use rustible_tags::playbook::Playbook;
use rustible_tags::selection::collect_tags;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Arguments for the list-tags command
#[derive(Parser, Debug, Clone)]
pub struct ListTagsArgs {
    /// Path to the playbook file
    #[arg(required = true)]
    pub playbook: PathBuf,
}

impl ListTagsArgs {
    /// Execute the list-tags command
    pub fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let playbook = Playbook::from_file(&self.playbook)?;
        let collector = collect_tags(&playbook);

        ctx.output
            .section(&format!("playbook: {}", self.playbook.display()));
        ctx.output.plain(collector.format_display().trim_end());

        let tags: Vec<String> = collector.all_tags().iter().map(|t| t.to_string()).collect();
        let tag_tasks: BTreeMap<String, Vec<String>> = collector
            .tag_tasks
            .iter()
            .map(|(tag, tasks)| (tag.to_string(), tasks.clone()))
            .collect();

        let mut vars = ctx.filter_vars()?;
        vars.set("tags", serde_json::to_value(&tags)?)?;
        vars.set("tag_tasks", serde_json::to_value(&tag_tasks)?)?;

        ctx.finish(&vars, &format!("{} tags found", tags.len()))?;
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_tags_args_parsing() {
        let args = ListTagsArgs::try_parse_from(["list-tags", "site.yml"]).unwrap();
        assert_eq!(args.playbook, PathBuf::from("site.yml"));
        assert!(ListTagsArgs::try_parse_from(["list-tags"]).is_err());
    }
}
