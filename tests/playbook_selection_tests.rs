//! Playbook task selection tests
//!
//! Runs whole playbooks through the selector with different filters and
//! inheritance settings.

use pretty_assertions::assert_eq;
use rustible_tags::playbook::{Playbook, Section};
use rustible_tags::selection::{collect_tags, select_tasks, PlaySelection};
use rustible_tags::tags::{tag_set, MiniJinjaTemplater, Tag, TagFilter, TemplateVars};
use rustible_tags::Error;
use serde_json::json;
use std::io::Write;

const DEPLOY: &str = r#"
- name: Deploy
  hosts: app
  tags: [deploy]
  vars:
    env_tag: staging
  pre_tasks:
    - name: Gather
      setup:
      tags: [always]
  tasks:
    - name: Install packages
      package:
        name: app
      tags: [install]
    - name: Migrate database
      command: migrate
      tags: ["{{ env_tag }}", db]
    - name: Debug dump
      debug:
        var: result
      tags: [never, debug]
    - name: Services
      block:
        - name: Start app
          service:
            name: app
          tags: [service]
      rescue:
        - name: Report failure
          debug:
            msg: failed
      tags: [runtime]
  post_tasks:
    - name: Notify
      command: notify
  handlers:
    - name: Restart app
      service:
        name: app
      tags: [service]
"#;

fn deploy() -> Playbook {
    Playbook::parse_str(DEPLOY).unwrap()
}

fn run(filter: &TagFilter, inherit: bool) -> Vec<PlaySelection> {
    select_tasks(
        &deploy(),
        filter,
        &MiniJinjaTemplater::new(),
        &TemplateVars::new(),
        inherit,
    )
    .unwrap()
}

fn selected(plays: &[PlaySelection]) -> Vec<&str> {
    plays
        .iter()
        .flat_map(PlaySelection::selected)
        .map(|t| t.name.as_str())
        .collect()
}

#[test]
fn test_execution_order_and_sections() {
    let plays = run(&TagFilter::new(), true);
    assert_eq!(plays.len(), 1);

    let order: Vec<_> = plays[0]
        .tasks
        .iter()
        .map(|t| (t.name.as_str(), t.section))
        .collect();
    assert_eq!(
        order,
        vec![
            ("Gather", Section::PreTasks),
            ("Install packages", Section::Tasks),
            ("Migrate database", Section::Tasks),
            ("Debug dump", Section::Tasks),
            ("Start app", Section::Tasks),
            ("Report failure", Section::Tasks),
            ("Notify", Section::PostTasks),
            ("Restart app", Section::Handlers),
        ]
    );
    assert_eq!(plays[0].skipped().count(), 0);
}

#[test]
fn test_own_tags_only() {
    let filter = TagFilter::new().with_tags(["db"]);
    let plays = run(&filter, false);
    assert_eq!(
        selected(&plays),
        vec!["Gather", "Migrate database", "Restart app"]
    );
}

#[test]
fn test_inherited_block_tags() {
    let filter = TagFilter::new().with_tags(["runtime"]);
    let plays = run(&filter, true);
    assert_eq!(
        selected(&plays),
        vec!["Gather", "Start app", "Report failure", "Restart app"]
    );

    let start = plays[0].tasks.iter().find(|t| t.name == "Start app").unwrap();
    assert_eq!(start.blocks, vec!["Services".to_string()]);
    assert_eq!(start.tags, tag_set(["deploy", "runtime", "service"]));
}

#[test]
fn test_all_keeps_never_out() {
    let filter = TagFilter::new().with_tags(["all"]);
    let plays = run(&filter, true);

    let skipped: Vec<_> = plays[0].skipped().map(|t| t.name.as_str()).collect();
    assert_eq!(skipped, vec!["Debug dump"]);
}

#[test]
fn test_inherited_play_tag_matches_never_task() {
    // an inherited tag is an explicit match, so never does not block it
    let filter = TagFilter::new().with_tags(["deploy"]);
    let plays = run(&filter, true);
    assert_eq!(plays[0].skipped().count(), 0);
}

#[test]
fn test_never_task_runs_when_requested_by_name() {
    let filter = TagFilter::new().with_tags(["debug"]);
    let plays = run(&filter, false);
    assert_eq!(selected(&plays), vec!["Gather", "Debug dump", "Restart app"]);
}

#[test]
fn test_skip_always_and_templated_tag() {
    let filter = TagFilter::new().with_skip_tags(["always", "staging"]);
    let plays = run(&filter, false);
    assert_eq!(
        selected(&plays),
        vec![
            "Install packages",
            "Debug dump",
            "Start app",
            "Report failure",
            "Notify",
            "Restart app",
        ]
    );
}

#[test]
fn test_extra_vars_drive_templated_tags() {
    let mut extra = TemplateVars::new();
    extra.insert("env_tag".into(), json!("production"));

    let filter = TagFilter::new().with_tags(["production"]);
    let plays = select_tasks(
        &deploy(),
        &filter,
        &MiniJinjaTemplater::new(),
        &extra,
        false,
    )
    .unwrap();

    let migrate = plays[0]
        .tasks
        .iter()
        .find(|t| t.name == "Migrate database")
        .unwrap();
    assert!(migrate.selected);
    assert_eq!(migrate.tags, tag_set(["production", "db"]));
}

#[test]
fn test_task_vars_override_play_vars() {
    let yaml = r#"
- name: Vars
  vars:
    component: api
  tasks:
    - name: Uses task var
      command: /bin/true
      vars:
        component: worker
      tags: "{{ component }}"
    - name: Uses play var
      command: /bin/true
      tags: "{{ component }}"
"#;
    let playbook = Playbook::parse_str(yaml).unwrap();
    let filter = TagFilter::new().with_tags(["worker"]);
    let plays = select_tasks(
        &playbook,
        &filter,
        &MiniJinjaTemplater::new(),
        &TemplateVars::new(),
        false,
    )
    .unwrap();

    assert_eq!(selected(&plays), vec!["Uses task var"]);
    assert_eq!(plays[0].tasks[1].tags, tag_set(["api"]));
}

#[test]
fn test_undefined_variable_in_tags_fails() {
    let yaml = r#"
- name: Broken
  tasks:
    - name: Missing var
      command: /bin/true
      tags: "{{ nowhere }}"
"#;
    let playbook = Playbook::parse_str(yaml).unwrap();
    let err = select_tasks(
        &playbook,
        &TagFilter::new(),
        &MiniJinjaTemplater::new(),
        &TemplateVars::new(),
        false,
    )
    .unwrap_err();
    assert!(matches!(err, Error::TemplateRender { .. }));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_integer_tags_from_yaml() {
    let yaml = r#"
- name: Numbers
  tasks:
    - name: Step one
      command: /bin/true
      tags: [1]
    - name: Step two
      command: /bin/true
      tags: [2]
"#;
    let playbook = Playbook::parse_str(yaml).unwrap();
    let filter = TagFilter::new().with_tags([Tag::Int(2)]);
    let plays = select_tasks(
        &playbook,
        &filter,
        &MiniJinjaTemplater::new(),
        &TemplateVars::new(),
        true,
    )
    .unwrap();
    assert_eq!(selected(&plays), vec!["Step two"]);
}

#[test]
fn test_collect_tags_attributes_enclosing_tags() {
    let collector = collect_tags(&deploy());

    let deploy_tasks = collector.tasks_for_tag(&Tag::from("deploy")).unwrap();
    assert_eq!(deploy_tasks.len(), 8);

    let runtime_tasks = collector.tasks_for_tag(&Tag::from("runtime")).unwrap();
    assert_eq!(
        runtime_tasks,
        &vec!["Start app".to_string(), "Report failure".to_string()]
    );

    // templated tags are listed as declared
    assert!(collector.tags.contains(&Tag::from("{{ env_tag }}")));
}

#[test]
fn test_playbook_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(DEPLOY.as_bytes()).unwrap();

    let playbook = Playbook::from_file(file.path()).unwrap();
    assert_eq!(playbook.plays[0].name, "Deploy");
    assert_eq!(playbook.task_count(), 8);
}

#[test]
fn test_invalid_tags_declaration_in_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"- name: Bad\n  tasks:\n    - name: t\n      command: x\n      tags: {a: b}\n")
        .unwrap();

    let err = Playbook::from_file(file.path()).unwrap_err();
    assert_eq!(err.exit_code(), 4);
}
