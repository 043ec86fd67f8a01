//! The `quizgrade sections` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use quizgrade_tracker::config::load_config_from;
use quizgrade_tracker::create_tracker;

pub async fn execute(project: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let tracker_config = config
        .tracker
        .as_ref()
        .context("no tracker configured; add a [tracker] table to quizgrade.toml")?;
    let tracker = create_tracker(tracker_config)?;
    let project = project
        .or_else(|| config.project_gid.clone())
        .context("no project given; pass --project or set project_gid in quizgrade.toml")?;

    let sections = tracker
        .list_sections(&project)
        .await
        .with_context(|| format!("failed to list sections of project {project}"))?;

    if sections.is_empty() {
        println!("Project {project} has no sections.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Section", "GID", ""]);
    for section in &sections {
        let marker = if section.name == config.default_section {
            "default"
        } else {
            ""
        };
        table.add_row(vec![
            Cell::new(&section.name),
            Cell::new(&section.gid),
            Cell::new(marker),
        ]);
    }
    println!("{table}");

    Ok(())
}
