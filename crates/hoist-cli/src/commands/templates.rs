use std::path::Path;

use anyhow::Context;
use hoist_tools::RealExecutor;

/// List the templates available in a template repository.
pub async fn templates_list(template_repo: &str) -> anyhow::Result<()> {
    let executor = RealExecutor;

    let scratch = tempfile::tempdir().context("failed to create scratch directory")?;
    let clone_dir = scratch.path().join("template-repo");
    super::clone_template_repo(&executor, template_repo, &clone_dir).await?;

    let templates_dir = clone_dir.join("templates");
    let names = super::list_template_names(&templates_dir);
    if names.is_empty() {
        anyhow::bail!("no templates found in {template_repo}");
    }

    for name in &names {
        match description(&templates_dir.join(name)) {
            Some(desc) => println!("{name:24} {desc}"),
            None => println!("{name}"),
        }
    }
    Ok(())
}

/// First heading line of the template's README, when it has one.
fn description(template_dir: &Path) -> Option<String> {
    let readme = std::fs::read_to_string(template_dir.join("README.md")).ok()?;
    readme
        .lines()
        .map(|line| line.trim_start_matches('#').trim())
        .find(|line| !line.is_empty())
        .map(str::to_owned)
}
