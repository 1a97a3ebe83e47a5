//! Check command
//!
//! Decides whether a unit carrying the given tags runs under the current
//! filters. The answer is printed; the exit status is 0 either way.

use super::CommandContext;
use anyhow::Result;
use clap::Parser;
use rustible_tags::tags::{format_tags, parse_tag_values};

/// Arguments for the check command
#[derive(Parser, Debug, Clone)]
pub struct CheckArgs {
    /// Tags of the unit (comma separated values allowed); none means untagged
    #[arg(value_name = "TAG")]
    pub unit_tags: Vec<String>,
}

impl CheckArgs {
    /// Execute the check command
    pub fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let own_tags = parse_tag_values(&self.unit_tags);
        let run = ctx.filter.should_run(Some(&own_tags));

        ctx.output.plain(if run { "run" } else { "skip" });
        ctx.output.info(&format!(
            "tags [{}] against --tags [{}] --skip-tags [{}]",
            format_tags(&own_tags),
            format_tags(ctx.filter.only_tags()),
            format_tags(ctx.filter.skip_tags())
        ));

        let mut vars = ctx.filter_vars()?;
        vars.set("tags", format_tags(&own_tags))?;
        vars.set("run", run)?;

        ctx.finish(&vars, if run { "run" } else { "skip" })?;
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_args_parsing() {
        let args = CheckArgs::try_parse_from(["check", "web,db", "api"]).unwrap();
        assert_eq!(args.unit_tags, vec!["web,db", "api"]);

        let args = CheckArgs::try_parse_from(["check"]).unwrap();
        assert!(args.unit_tags.is_empty());
    }
}
