//! Playbook structure as far as tag selection needs it.
//!
//! Only the parts that matter for deciding what runs are kept: plays,
//! blocks and tasks with their names, tags and variables. Module arguments
//! are not interpreted; the module a task invokes is detected from its keys.

use crate::error::{Error, Result};
use crate::tags::{load_tags, TagEntry, TemplateVars};
use serde_yaml::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Keys of a task that are not the module invocation
const TASK_KEYWORDS: &[&str] = &[
    "name",
    "tags",
    "when",
    "vars",
    "register",
    "notify",
    "listen",
    "become",
    "become_user",
    "become_method",
    "loop",
    "loop_control",
    "with_items",
    "with_dict",
    "with_fileglob",
    "delegate_to",
    "delegate_facts",
    "run_once",
    "ignore_errors",
    "ignore_unreachable",
    "changed_when",
    "failed_when",
    "no_log",
    "environment",
    "args",
    "until",
    "retries",
    "delay",
    "check_mode",
    "diff",
    "any_errors_fatal",
    "timeout",
    "throttle",
    "collections",
    "module_defaults",
    "debugger",
    "block",
    "rescue",
    "always",
];

/// Section of a play a task belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// `pre_tasks`
    PreTasks,
    /// `tasks`
    Tasks,
    /// `post_tasks`
    PostTasks,
    /// `handlers`
    Handlers,
}

impl Section {
    /// All sections in execution order
    pub const ALL: [Section; 4] = [
        Section::PreTasks,
        Section::Tasks,
        Section::PostTasks,
        Section::Handlers,
    ];

    /// YAML key of the section
    pub fn key(&self) -> &'static str {
        match self {
            Section::PreTasks => "pre_tasks",
            Section::Tasks => "tasks",
            Section::PostTasks => "post_tasks",
            Section::Handlers => "handlers",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A task
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// Task name, or the module name when unnamed
    pub name: String,
    /// Module the task invokes
    pub action: Option<String>,
    /// Declared tags
    pub tags: Vec<TagEntry>,
    /// Task vars
    pub vars: TemplateVars,
}

/// A block with its rescue and always sections
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Block name
    pub name: String,
    /// Declared tags
    pub tags: Vec<TagEntry>,
    /// Block vars
    pub vars: TemplateVars,
    /// Main tasks
    pub block: Vec<TaskNode>,
    /// Tasks run on failure
    pub rescue: Vec<TaskNode>,
    /// Tasks always run
    pub always: Vec<TaskNode>,
}

impl Block {
    /// All nested nodes: block, rescue, then always
    pub fn children(&self) -> impl Iterator<Item = &TaskNode> {
        self.block
            .iter()
            .chain(self.rescue.iter())
            .chain(self.always.iter())
    }
}

/// Entry of a task list
#[derive(Debug, Clone, PartialEq)]
pub enum TaskNode {
    /// A single task
    Task(Task),
    /// A block of tasks
    Block(Block),
}

/// A play
#[derive(Debug, Clone, PartialEq)]
pub struct Play {
    /// Play name
    pub name: String,
    /// Host pattern
    pub hosts: Option<String>,
    /// Declared tags
    pub tags: Vec<TagEntry>,
    /// Play vars
    pub vars: TemplateVars,
    /// `pre_tasks`
    pub pre_tasks: Vec<TaskNode>,
    /// `tasks`
    pub tasks: Vec<TaskNode>,
    /// `post_tasks`
    pub post_tasks: Vec<TaskNode>,
    /// `handlers`
    pub handlers: Vec<TaskNode>,
}

impl Play {
    /// Nodes of a section
    pub fn section(&self, section: Section) -> &[TaskNode] {
        match section {
            Section::PreTasks => &self.pre_tasks,
            Section::Tasks => &self.tasks,
            Section::PostTasks => &self.post_tasks,
            Section::Handlers => &self.handlers,
        }
    }
}

/// A parsed playbook
#[derive(Debug, Clone, PartialEq)]
pub struct Playbook {
    /// Source file, when loaded from disk
    pub path: Option<PathBuf>,
    /// Plays in order
    pub plays: Vec<Play>,
}

impl Playbook {
    /// Load a playbook file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::playbook_parse(path, "failed to read file", Some(Box::new(e)))
        })?;
        let value: Value = serde_yaml::from_str(&content).map_err(|e| {
            Error::playbook_parse(path, e.to_string(), Some(Box::new(e)))
        })?;

        let mut playbook = Self::from_value(&value)?;
        playbook.path = Some(path.to_path_buf());
        debug!(path = %path.display(), plays = playbook.plays.len(), "loaded playbook");
        Ok(playbook)
    }

    /// Parse a playbook from YAML text
    pub fn parse_str(content: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(content)?;
        Self::from_value(&value)
    }

    /// Build a playbook from a YAML document
    pub fn from_value(value: &Value) -> Result<Self> {
        let plays = match value {
            Value::Sequence(plays) => plays,
            Value::Null => {
                return Ok(Self {
                    path: None,
                    plays: Vec::new(),
                })
            }
            _ => {
                return Err(Error::PlaybookValidation(
                    "a playbook must be a list of plays".to_string(),
                ))
            }
        };

        let plays = plays
            .iter()
            .enumerate()
            .map(|(idx, play)| parse_play(play, idx))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { path: None, plays })
    }

    /// Number of tasks, counting tasks nested in blocks
    pub fn task_count(&self) -> usize {
        fn count(nodes: &[TaskNode]) -> usize {
            nodes
                .iter()
                .map(|node| match node {
                    TaskNode::Task(_) => 1,
                    TaskNode::Block(block) => {
                        count(&block.block) + count(&block.rescue) + count(&block.always)
                    }
                })
                .sum()
        }

        self.plays
            .iter()
            .flat_map(|play| Section::ALL.iter().map(move |s| count(play.section(*s))))
            .sum()
    }
}

fn parse_play(value: &Value, idx: usize) -> Result<Play> {
    let map = value.as_mapping().ok_or_else(|| {
        Error::PlaybookValidation(format!("play #{} must be a mapping", idx + 1))
    })?;
    let get = |key: &str| map.get(key).unwrap_or(&Value::Null);

    let name = get("name")
        .as_str()
        .map(String::from)
        .unwrap_or_else(|| format!("Play #{}", idx + 1));

    Ok(Play {
        hosts: get("hosts").as_str().map(String::from),
        tags: load_tags(get("tags"), &name)?,
        vars: parse_vars(get("vars"), &name)?,
        pre_tasks: parse_nodes(get("pre_tasks"), &name)?,
        tasks: parse_nodes(get("tasks"), &name)?,
        post_tasks: parse_nodes(get("post_tasks"), &name)?,
        handlers: parse_nodes(get("handlers"), &name)?,
        name,
    })
}

fn parse_nodes(value: &Value, parent: &str) -> Result<Vec<TaskNode>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items.iter().map(|item| parse_node(item, parent)).collect(),
        _ => Err(Error::PlaybookValidation(format!(
            "task list in '{}' must be a list",
            parent
        ))),
    }
}

fn parse_node(value: &Value, parent: &str) -> Result<TaskNode> {
    let map = value.as_mapping().ok_or_else(|| {
        Error::PlaybookValidation(format!("task in '{}' must be a mapping", parent))
    })?;
    let get = |key: &str| map.get(key).unwrap_or(&Value::Null);
    let explicit_name = get("name").as_str().map(String::from);

    if map.contains_key("block") {
        let name = explicit_name.unwrap_or_else(|| "block".to_string());
        return Ok(TaskNode::Block(Block {
            tags: load_tags(get("tags"), &name)?,
            vars: parse_vars(get("vars"), &name)?,
            block: parse_nodes(get("block"), &name)?,
            rescue: parse_nodes(get("rescue"), &name)?,
            always: parse_nodes(get("always"), &name)?,
            name,
        }));
    }

    let action = map
        .keys()
        .filter_map(Value::as_str)
        .find(|key| !TASK_KEYWORDS.contains(key))
        .map(String::from);
    let name = explicit_name
        .or_else(|| action.clone())
        .unwrap_or_else(|| "Unnamed task".to_string());

    Ok(TaskNode::Task(Task {
        tags: load_tags(get("tags"), &name)?,
        vars: parse_vars(get("vars"), &name)?,
        action,
        name,
    }))
}

fn parse_vars(value: &Value, context: &str) -> Result<TemplateVars> {
    match value {
        Value::Null => Ok(TemplateVars::new()),
        Value::Mapping(_) => match serde_json::to_value(value)? {
            serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
            _ => Err(Error::PlaybookValidation(format!(
                "vars of '{}' must be a mapping",
                context
            ))),
        },
        _ => Err(Error::PlaybookValidation(format!(
            "vars of '{}' must be a mapping",
            context
        ))),
    }
}
