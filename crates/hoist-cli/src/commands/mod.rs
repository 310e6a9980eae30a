mod build;
mod deploy;
mod init;
mod templates;
mod undeploy;

use std::path::{Path, PathBuf};

use anyhow::Context;
use hoist_core::ProjectConfig;
use hoist_manifest::CrdRequirements;
use hoist_tools::{ApiServerCrds, CrdCheck, ToolExecutor, missing_crds};

pub use build::build;
pub use deploy::{DeployArgs, deploy};
pub use init::{InitArgs, init};
pub use templates::templates_list;
pub use undeploy::undeploy;

/// Template repository cloned by `init` and `templates list` when no
/// `--template-repo` is given.
pub(crate) const DEFAULT_TEMPLATE_REPO: &str = "https://github.com/hoist-dev/hoist-templates.git";

/// Directory of manifest templates inside an app, relative to its root.
pub(crate) const TEMPLATES_DIR: &str = "k8s-templates";

/// Directory the rendered manifests land in; regenerated every deploy.
pub(crate) const RENDERED_DIR: &str = "k8s";

pub(crate) fn load_config(project_dir: &Path) -> anyhow::Result<ProjectConfig> {
    ProjectConfig::load(project_dir).map_err(|e| match e {
        hoist_core::Error::ConfigLoad { .. } => anyhow::anyhow!(
            "hoist.json not found — run this from an app directory, or scaffold one with `hoist init`"
        ),
        other => other.into(),
    })
}

/// Check the app's required CRDs against the cluster.
///
/// Missing CRDs are printed either way; they only fail the command when
/// `enforce` is set (deploys). A failed cluster query downgrades to a
/// warning — it never counts as "nothing missing".
pub(crate) async fn crd_gate(project_dir: &Path, enforce: bool) -> anyhow::Result<()> {
    let Some(requirements) = CrdRequirements::load(project_dir)? else {
        return Ok(());
    };
    if requirements.is_empty() {
        return Ok(());
    }

    match missing_crds(&ApiServerCrds, &requirements.required).await {
        CrdCheck::Satisfied => Ok(()),
        CrdCheck::Missing(missing) => {
            for crd in &missing {
                eprintln!(
                    "Missing custom resource definition '{crd}' — ask your cluster operator to install it"
                );
            }
            if enforce {
                anyhow::bail!(
                    "{} required custom resource definition(s) not installed",
                    missing.len()
                );
            }
            Ok(())
        }
        CrdCheck::QueryFailed(e) => {
            eprintln!("Warning: could not verify custom resource definitions ({e}); continuing");
            Ok(())
        }
    }
}

/// Shallow-clone the template repository into `dest`.
pub(crate) async fn clone_template_repo<E: ToolExecutor>(
    executor: &E,
    repo: &str,
    dest: &Path,
) -> anyhow::Result<()> {
    let dest = dest
        .to_str()
        .context("clone destination is not valid UTF-8")?;
    executor
        .exec(
            "git",
            &[
                "clone".to_owned(),
                "--depth".to_owned(),
                "1".to_owned(),
                repo.to_owned(),
                dest.to_owned(),
            ],
        )
        .await
        .with_context(|| format!("failed to clone template repository {repo}"))?;
    Ok(())
}

/// Names of the template directories in a cloned template repository.
pub(crate) fn list_template_names(templates_dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(templates_dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();
    names
}

/// Copy a template tree into a new project directory.
pub(crate) fn copy_tree(src: &Path, dst: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dst)
        .with_context(|| format!("failed to create {}", dst.display()))?;
    for entry in std::fs::read_dir(src)
        .with_context(|| format!("failed to read {}", src.display()))?
    {
        let entry = entry?;
        if entry.file_name() == ".git" {
            continue;
        }
        let from = entry.path();
        let to = dst.join(entry.file_name());
        if from.is_dir() {
            copy_tree(&from, &to)?;
        } else {
            std::fs::copy(&from, &to)
                .with_context(|| format!("failed to copy {}", from.display()))?;
        }
    }
    Ok(())
}

pub(crate) fn project_dir() -> PathBuf {
    PathBuf::from(".")
}
