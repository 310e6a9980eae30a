use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use hoist_core::{BuildRecord, ProjectConfig, PushRecord};
use hoist_manifest::Substitutions;
use hoist_manifest::patch::{patch_for_debug, select_debug_target};
use hoist_manifest::render::{render, template_files};
use hoist_tools::executor::ToolExecutor;
use hoist_tools::{DockerClient, KubectlClient, PushTarget, RealExecutor};
use uuid::Uuid;

pub struct DeployArgs {
    pub no_push: bool,
    pub interactive: bool,
    pub connection_attempts: u32,
    pub kube_spec: Option<String>,
}

/// Everything the render/apply steps need, resolved up front.
struct DeploySession {
    config: ProjectConfig,
    remote_container: String,
    run_id: String,
}

/// Execute the full deploy pipeline.
pub async fn deploy(args: DeployArgs) -> anyhow::Result<()> {
    let project_dir = super::project_dir();
    let config = super::load_config(&project_dir)?;

    if !BuildRecord::exists(&project_dir) {
        anyhow::bail!("no build found — run `hoist build` first");
    }
    let build = BuildRecord::load(&project_dir)?;

    // Missing CRDs are a hard gate for deploys
    super::crd_gate(&project_dir, true).await?;

    let docker = DockerClient::new();
    let kubectl = KubectlClient::new();

    let remote_container = if args.no_push {
        println!("Skipping image push");
        match PushRecord::load(&project_dir) {
            Ok(record) => record.last_remote_container,
            Err(hoist_core::Error::StateMissing { .. }) => anyhow::bail!(
                "no previous push to reuse — run `hoist deploy` without --no-push first"
            ),
            Err(e) => return Err(e.into()),
        }
    } else {
        push_image(&project_dir, &config, &docker, &build.last_container).await?
    };

    let session = DeploySession {
        config,
        remote_container,
        run_id: Uuid::new_v4().to_string(),
    };
    tracing::debug!(run_id = %session.run_id, "rendering manifests");

    kubectl.ensure_namespace(&session.config.namespace).await?;

    render_manifests(
        &project_dir,
        &session,
        args.interactive,
        args.kube_spec.as_deref(),
    )?;

    println!("Deploying {}", session.remote_container);
    kubectl
        .apply(&session.config.namespace, &project_dir.join(super::RENDERED_DIR))
        .await?;

    println!();
    println!("Inspect created objects by running:");
    println!("$ kubectl get --namespace={} all", session.config.namespace);
    println!();

    if args.interactive {
        attach_debug_shell(&kubectl, &session.config.namespace, args.connection_attempts).await?;
    }

    Ok(())
}

/// Tag and push the last built image, recording the push on success.
///
/// The push runs concurrently with a progress display fed by the last
/// recorded push duration. A failed push surfaces the tool's stderr and
/// leaves the previous push record untouched.
async fn push_image<E: ToolExecutor>(
    project_dir: &Path,
    config: &ProjectConfig,
    docker: &DockerClient<E>,
    container: &str,
) -> anyhow::Result<String> {
    let remote = config.remote_image(container)?;
    docker.tag(container, &remote).await?;

    let target = if config.uses_gcloud() {
        PushTarget::Gcloud
    } else {
        PushTarget::Registry
    };
    let estimate = PushRecord::load(project_dir)
        .ok()
        .map(|r| r.last_push_duration);

    let started = Instant::now();
    let result =
        crate::progress::duration_progress("Pushing", estimate, docker.push(&remote, target)).await;
    if let Err(err) = result {
        if let Some(stderr) = err.stderr() {
            eprintln!("{stderr}");
        }
        return Err(err.into());
    }

    let record = PushRecord {
        last_remote_container: remote.clone(),
        last_push_duration: started.elapsed().as_secs_f64(),
    };
    record.save(project_dir)?;

    println!("Pushed to {remote}");
    Ok(remote)
}

/// Render every template into a freshly regenerated output directory.
///
/// One run id is shared by all templates of the invocation. For
/// interactive deploys exactly one template gets the debug patch: the
/// only one there is, or the one named by `kube_spec`.
fn render_manifests(
    project_dir: &Path,
    session: &DeploySession,
    interactive: bool,
    kube_spec: Option<&str>,
) -> anyhow::Result<()> {
    let templates_dir = project_dir.join(super::TEMPLATES_DIR);
    let out_dir = project_dir.join(super::RENDERED_DIR);

    let files = template_files(&templates_dir)?;
    if files.is_empty() {
        anyhow::bail!(
            "no manifest templates under {}/ — nothing to deploy",
            super::TEMPLATES_DIR
        );
    }

    let debug_target = if interactive {
        let target = select_debug_target(&files, kube_spec).ok_or_else(|| {
            anyhow::anyhow!(
                "cannot pick a template to debug in namespace '{}' — \
                 pass the template file name, e.g. `hoist deploy -i {}`",
                session.config.namespace,
                files[0].display(),
            )
        })?;
        Some(target.clone())
    } else {
        None
    };

    // Stale manifests from a previous deploy must not survive
    if out_dir.exists() {
        std::fs::remove_dir_all(&out_dir)
            .with_context(|| format!("failed to clear {}", out_dir.display()))?;
    }
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let vars = Substitutions {
        image: session.remote_container.clone(),
        app: session.config.name.clone(),
        run: session.run_id.clone(),
    };

    for file in &files {
        let source = templates_dir.join(file);
        let template = std::fs::read_to_string(&source)
            .with_context(|| format!("failed to read template {}", source.display()))?;

        let mut rendered = render(&template, &vars)
            .with_context(|| format!("failed to render {}", file.display()))?;
        if debug_target.as_deref() == Some(file.as_path()) {
            rendered = patch_for_debug(&rendered)
                .with_context(|| format!("failed to patch {} for debugging", file.display()))?;
        }

        let dest = out_dir.join(file);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&dest, rendered)
            .with_context(|| format!("failed to write {}", dest.display()))?;
    }

    Ok(())
}

/// Wait for the pod the apply just started, then open a shell on it.
async fn attach_debug_shell(
    kubectl: &KubectlClient<RealExecutor>,
    namespace: &str,
    connection_attempts: u32,
) -> anyhow::Result<()> {
    let pod = kubectl.latest_pod(namespace).await?;
    println!("Connecting to {pod}...");
    kubectl
        .wait_until_running(namespace, &pod, connection_attempts)
        .await?;
    kubectl.attach(namespace, &pod).await?;
    Ok(())
}
