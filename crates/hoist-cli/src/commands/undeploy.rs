use hoist_tools::KubectlClient;

/// Delete everything the last deploy applied to the cluster.
pub async fn undeploy() -> anyhow::Result<()> {
    let project_dir = super::project_dir();
    let config = super::load_config(&project_dir)?;

    let rendered = project_dir.join(super::RENDERED_DIR);
    if !rendered.is_dir() {
        anyhow::bail!(
            "nothing to undeploy — no rendered manifests under {}/",
            super::RENDERED_DIR
        );
    }

    let kubectl = KubectlClient::new();
    kubectl.delete(&config.namespace, &rendered).await?;

    println!(
        "Undeployed '{}' from namespace '{}'",
        config.name, config.namespace
    );
    Ok(())
}
