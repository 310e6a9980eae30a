use std::path::Path;

use anyhow::Context;
use hoist_core::ProjectConfig;
use hoist_tools::{RealExecutor, ToolExecutor};

pub struct InitArgs {
    pub name: String,
    pub template: String,
    pub template_repo: String,
    pub registry: Option<String>,
    pub namespace: Option<String>,
}

/// Scaffold a new app from a template repository.
pub async fn init(args: InitArgs) -> anyhow::Result<()> {
    let project_dir = Path::new(&args.name);
    if project_dir.exists() {
        anyhow::bail!(
            "directory '{}' already exists — delete it before initializing a new app",
            args.name
        );
    }

    let executor = RealExecutor;

    let scratch = tempfile::tempdir().context("failed to create scratch directory")?;
    let clone_dir = scratch.path().join("template-repo");
    super::clone_template_repo(&executor, &args.template_repo, &clone_dir).await?;

    let templates_dir = clone_dir.join("templates");
    let template_dir = templates_dir.join(&args.template);
    if !template_dir.is_dir() {
        let available = super::list_template_names(&templates_dir);
        anyhow::bail!(
            "template '{}' not found in {} — available: {}",
            args.template,
            args.template_repo,
            if available.is_empty() {
                "(none)".to_owned()
            } else {
                available.join(", ")
            }
        );
    }

    super::copy_tree(&template_dir, project_dir)?;

    // Registry: explicit flag wins, otherwise the active gcloud project
    let (registry, gce_project) = match args.registry {
        Some(registry) => (Some(registry), None),
        None => (None, Some(gcloud_project(&executor).await?)),
    };

    let config = ProjectConfig {
        name: args.name.clone(),
        namespace: args.namespace.unwrap_or_else(|| args.name.clone()),
        registry,
        gce_project,
    };
    config.save(project_dir)?;

    // Advisory at init time: missing CRDs are warnings, not failures
    super::crd_gate(project_dir, false).await?;

    git_init(&executor, project_dir).await?;

    println!(
        "Created app '{}' targeting namespace '{}'",
        config.name, config.namespace
    );
    println!();
    println!("  cd {}", args.name);
    println!("  hoist build            # build the container image");
    println!("  hoist deploy           # push and deploy to the cluster");

    Ok(())
}

/// Active gcloud project, used when no `--registry` was given.
async fn gcloud_project<E: ToolExecutor>(executor: &E) -> anyhow::Result<String> {
    let output = executor
        .exec(
            "gcloud",
            &[
                "config".to_owned(),
                "get-value".to_owned(),
                "project".to_owned(),
            ],
        )
        .await
        .context("no --registry given and gcloud is not usable — pass --registry")?;

    let project = output.trim();
    if project.is_empty() || project == "(unset)" {
        anyhow::bail!(
            "no --registry given and no active gcloud project — \
             pass --registry or run `gcloud config set project <id>`"
        );
    }
    Ok(project.to_owned())
}

/// Turn the scaffolded app into a git repository with an initial commit.
async fn git_init<E: ToolExecutor>(executor: &E, project_dir: &Path) -> anyhow::Result<()> {
    let dir = project_dir
        .to_str()
        .context("project path is not valid UTF-8")?;

    let runs: &[&[&str]] = &[
        &["-C", dir, "init"],
        &["-C", dir, "add", "."],
        // scaffold commit is authored by the tool, not the user's
        // global identity (which may not exist yet)
        &[
            "-C",
            dir,
            "-c",
            "user.email=hoist@localhost",
            "-c",
            "user.name=hoist",
            "commit",
            "-m",
            "Initial scaffold",
        ],
    ];

    for args in runs {
        let args: Vec<String> = args.iter().map(|s| (*s).to_owned()).collect();
        executor
            .exec("git", &args)
            .await
            .context("failed to initialize git repository in the new app")?;
    }
    Ok(())
}
