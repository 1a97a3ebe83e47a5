//! Task selection over a playbook.
//!
//! Walks every play with a [`TagChain`] and decides, for each task, whether
//! it runs under a [`TagFilter`]. Handlers are listed with their tags but
//! never filtered; they run when notified.

use crate::error::Result;
use crate::playbook::{Block, Play, Playbook, Section, Task, TaskNode};
use crate::tags::{
    flatten_tags, ScopeKind, TagChain, TagCollector, TagFilter, TagSet, TagTemplater,
    TemplateVars,
};
use serde::Serialize;
use tracing::{debug, instrument};

/// Variables never passed to tag templates
const EXCLUDED_VARS: &[&str] = &["tags", "when"];

/// Selection outcome of one task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSelection {
    /// Task name
    pub name: String,
    /// Module the task invokes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Section of the play
    pub section: Section,
    /// Names of the enclosing blocks, outermost first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<String>,
    /// Tags the decision was made on
    pub tags: TagSet,
    /// Whether the task runs
    pub selected: bool,
}

/// Selection outcome of one play
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaySelection {
    /// Play name
    pub name: String,
    /// Resolved play tags
    pub tags: TagSet,
    /// Tasks in execution order
    pub tasks: Vec<TaskSelection>,
}

impl PlaySelection {
    /// Tasks that run
    pub fn selected(&self) -> impl Iterator<Item = &TaskSelection> {
        self.tasks.iter().filter(|t| t.selected)
    }

    /// Tasks that are skipped
    pub fn skipped(&self) -> impl Iterator<Item = &TaskSelection> {
        self.tasks.iter().filter(|t| !t.selected)
    }
}

/// Walks a playbook and evaluates the tags of every task.
pub struct TaskSelector<'a> {
    filter: &'a TagFilter,
    templater: &'a dyn TagTemplater,
    extra_vars: &'a TemplateVars,
    inherit: bool,
}

impl<'a> TaskSelector<'a> {
    /// Create a selector.
    ///
    /// With `inherit` set, a task is decided on the union of its own tags and
    /// those of its play and blocks; otherwise only its own tags count.
    pub fn new(
        filter: &'a TagFilter,
        templater: &'a dyn TagTemplater,
        extra_vars: &'a TemplateVars,
        inherit: bool,
    ) -> Self {
        Self {
            filter,
            templater,
            extra_vars,
            inherit,
        }
    }

    /// Evaluate every task of the playbook
    #[instrument(skip_all, fields(plays = playbook.plays.len(), inherit = self.inherit))]
    pub fn select(&self, playbook: &Playbook) -> Result<Vec<PlaySelection>> {
        playbook.plays.iter().map(|play| self.select_play(play)).collect()
    }

    fn select_play(&self, play: &Play) -> Result<PlaySelection> {
        let mut walk = Walk {
            chain: TagChain::new(),
            vars: vec![&play.vars],
            blocks: Vec::new(),
            tasks: Vec::new(),
        };
        walk.chain
            .push_scope(ScopeKind::Play, play.name.as_str(), play.tags.clone());

        for section in Section::ALL {
            for node in play.section(section) {
                self.select_node(&mut walk, node, section)?;
            }
        }

        let tags = walk
            .chain
            .current()
            .map(|scope| scope.tag_set())
            .unwrap_or_default();
        debug!(
            play = %play.name,
            tasks = walk.tasks.len(),
            selected = walk.tasks.iter().filter(|t| t.selected).count(),
            "selected play tasks"
        );

        Ok(PlaySelection {
            name: play.name.clone(),
            tags,
            tasks: walk.tasks,
        })
    }

    fn select_node<'p>(
        &self,
        walk: &mut Walk<'p>,
        node: &'p TaskNode,
        section: Section,
    ) -> Result<()> {
        match node {
            TaskNode::Task(task) => self.select_task(walk, task, section),
            TaskNode::Block(block) => self.select_block(walk, block, section),
        }
    }

    fn select_block<'p>(
        &self,
        walk: &mut Walk<'p>,
        block: &'p Block,
        section: Section,
    ) -> Result<()> {
        walk.chain
            .push_scope(ScopeKind::Block, block.name.as_str(), block.tags.clone());
        walk.vars.push(&block.vars);
        walk.blocks.push(block.name.clone());

        let result = block
            .children()
            .try_for_each(|child| self.select_node(walk, child, section));

        walk.blocks.pop();
        walk.vars.pop();
        walk.chain.pop();
        result
    }

    fn select_task<'p>(&self, walk: &mut Walk<'p>, task: &'p Task, section: Section) -> Result<()> {
        walk.chain
            .push_scope(ScopeKind::Task, task.name.as_str(), task.tags.clone());
        walk.vars.push(&task.vars);

        let vars = template_vars(&walk.vars, self.extra_vars);
        let decision = if section == Section::Handlers {
            walk.chain.resolve_all(self.templater, &vars).map(|_| true)
        } else if self.inherit {
            walk.chain
                .evaluate_inherited(self.filter, self.templater, &vars)
        } else {
            walk.chain.evaluate(self.filter, self.templater, &vars)
        };

        let tags = if self.inherit {
            walk.chain.inherited_tags()
        } else {
            walk.chain.current_tags()
        };

        walk.vars.pop();
        walk.chain.pop();

        walk.tasks.push(TaskSelection {
            name: task.name.clone(),
            action: task.action.clone(),
            section,
            blocks: walk.blocks.clone(),
            tags,
            selected: decision?,
        });
        Ok(())
    }
}

/// State of the walk through one play
struct Walk<'p> {
    chain: TagChain,
    vars: Vec<&'p TemplateVars>,
    blocks: Vec<String>,
    tasks: Vec<TaskSelection>,
}

/// Layer scope variables outermost first, then extra vars, dropping the
/// names reserved for task keywords.
fn template_vars(scopes: &[&TemplateVars], extra_vars: &TemplateVars) -> TemplateVars {
    let mut vars = TemplateVars::new();
    for scope in scopes.iter().copied().chain(std::iter::once(extra_vars)) {
        for (name, value) in scope {
            vars.insert(name.clone(), value.clone());
        }
    }
    for name in EXCLUDED_VARS {
        vars.shift_remove(*name);
    }
    vars
}

/// Evaluate every task of a playbook against a filter
pub fn select_tasks(
    playbook: &Playbook,
    filter: &TagFilter,
    templater: &dyn TagTemplater,
    extra_vars: &TemplateVars,
    inherit: bool,
) -> Result<Vec<PlaySelection>> {
    TaskSelector::new(filter, templater, extra_vars, inherit).select(playbook)
}

/// Collect the declared tags of every play, block and task, unresolved.
///
/// Tags of plays and blocks are attributed to every task they enclose.
pub fn collect_tags(playbook: &Playbook) -> TagCollector {
    fn visit(collector: &mut TagCollector, nodes: &[TaskNode], inherited: &TagSet) {
        for node in nodes {
            match node {
                TaskNode::Task(task) => {
                    let mut tags = flatten_tags(&task.tags);
                    tags.extend(inherited.iter().cloned());
                    collector.add_tags(&tags, Some(&task.name));
                }
                TaskNode::Block(block) => {
                    let mut tags = flatten_tags(&block.tags);
                    tags.extend(inherited.iter().cloned());
                    collector.add_tags(&tags, None);
                    for part in [&block.block, &block.rescue, &block.always] {
                        visit(collector, part, &tags);
                    }
                }
            }
        }
    }

    let mut collector = TagCollector::new();
    for play in &playbook.plays {
        let play_tags = flatten_tags(&play.tags);
        collector.add_tags(&play_tags, None);
        for section in Section::ALL {
            visit(&mut collector, play.section(section), &play_tags);
        }
    }
    collector
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::tags::{tag_set, MiniJinjaTemplater, NoopTemplater, Tag};
    use serde_json::json;

    const PLAYBOOK: &str = r#"
- name: Site
  tags: [site]
  vars:
    role_tag: web
  tasks:
    - name: Install
      command: /bin/true
      tags: [install]
    - name: Configure
      command: /bin/true
      tags: "{{ role_tag }}"
    - name: Plain
      command: /bin/true
    - name: Grouped
      block:
        - name: Inside
          command: /bin/true
      tags: [grouped]
  handlers:
    - name: Restart
      command: /bin/true
      tags: [restart]
"#;

    fn playbook() -> Playbook {
        Playbook::parse_str(PLAYBOOK).unwrap()
    }

    fn selected_names(plays: &[PlaySelection]) -> Vec<&str> {
        plays
            .iter()
            .flat_map(|p| p.selected())
            .map(|t| t.name.as_str())
            .collect()
    }

    #[test]
    fn test_no_filter_selects_everything() {
        let plays = select_tasks(
            &playbook(),
            &TagFilter::new(),
            &MiniJinjaTemplater::new(),
            &TemplateVars::new(),
            false,
        )
        .unwrap();
        assert_eq!(plays[0].tasks.len(), 5);
        assert_eq!(plays[0].skipped().count(), 0);
    }

    #[test]
    fn test_only_tags_without_inheritance() {
        let filter = TagFilter::new().with_tags(["web"]);
        let plays = select_tasks(
            &playbook(),
            &filter,
            &MiniJinjaTemplater::new(),
            &TemplateVars::new(),
            false,
        )
        .unwrap();
        assert_eq!(selected_names(&plays), vec!["Configure", "Restart"]);
        assert_eq!(plays[0].tasks[1].tags, tag_set(["web"]));
    }

    #[test]
    fn test_inherited_block_tags() {
        let filter = TagFilter::new().with_tags(["grouped"]);
        let plays = select_tasks(
            &playbook(),
            &filter,
            &MiniJinjaTemplater::new(),
            &TemplateVars::new(),
            true,
        )
        .unwrap();
        assert_eq!(selected_names(&plays), vec!["Inside", "Restart"]);

        let inside = &plays[0].tasks[3];
        assert_eq!(inside.blocks, vec!["Grouped".to_string()]);
        assert_eq!(inside.tags, tag_set(["grouped", "site"]));
    }

    #[test]
    fn test_inherited_play_tags_select_all_tasks() {
        let filter = TagFilter::new().with_tags(["site"]);
        let plays = select_tasks(
            &playbook(),
            &filter,
            &MiniJinjaTemplater::new(),
            &TemplateVars::new(),
            true,
        )
        .unwrap();
        assert_eq!(plays[0].skipped().count(), 0);
    }

    #[test]
    fn test_extra_vars_override_play_vars() {
        let mut extra = TemplateVars::new();
        extra.insert("role_tag".into(), json!("db"));
        let filter = TagFilter::new().with_tags(["db"]);
        let plays = select_tasks(
            &playbook(),
            &filter,
            &MiniJinjaTemplater::new(),
            &extra,
            false,
        )
        .unwrap();
        assert_eq!(selected_names(&plays), vec!["Configure", "Restart"]);
    }

    #[test]
    fn test_skip_untagged() {
        let filter = TagFilter::new().with_skip_tags(["untagged"]);
        let plays = select_tasks(
            &playbook(),
            &filter,
            &NoopTemplater,
            &TemplateVars::new(),
            false,
        )
        .unwrap();
        let skipped: Vec<_> = plays[0].skipped().map(|t| t.name.as_str()).collect();
        assert_eq!(skipped, vec!["Plain", "Inside"]);
    }

    #[test]
    fn test_template_vars_layering() {
        let play = TemplateVars::from([("a".to_string(), json!(1)), ("b".to_string(), json!(1))]);
        let task = TemplateVars::from([
            ("b".to_string(), json!(2)),
            ("tags".to_string(), json!(["x"])),
            ("when".to_string(), json!("yes")),
        ]);
        let extra = TemplateVars::from([("a".to_string(), json!(3))]);

        let vars = template_vars(&[&play, &task], &extra);
        assert_eq!(vars["a"], json!(3));
        assert_eq!(vars["b"], json!(2));
        assert!(!vars.contains_key("tags"));
        assert!(!vars.contains_key("when"));
    }

    #[test]
    fn test_undefined_template_fails() {
        let playbook = Playbook::parse_str(
            "- tasks:\n    - name: t\n      command: x\n      tags: '{{ missing }}'\n",
        )
        .unwrap();
        let err = select_tasks(
            &playbook,
            &TagFilter::new(),
            &MiniJinjaTemplater::new(),
            &TemplateVars::new(),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, Error::TemplateRender { .. }));
    }

    #[test]
    fn test_collect_tags() {
        let collector = collect_tags(&playbook());
        let tags: Vec<String> = collector.all_tags().iter().map(|t| t.to_string()).collect();
        assert_eq!(
            tags,
            vec!["grouped", "install", "restart", "site", "{{ role_tag }}"]
        );
        assert_eq!(
            collector.tasks_for_tag(&Tag::from("site")).map(Vec::len),
            Some(5)
        );
    }
}
