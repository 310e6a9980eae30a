use std::time::Instant;

use hoist_core::BuildRecord;
use hoist_tools::DockerClient;
use uuid::Uuid;

/// Build the app into a locally tagged container image and record it.
pub async fn build() -> anyhow::Result<()> {
    let project_dir = super::project_dir();
    let config = super::load_config(&project_dir)?;

    let tag = Uuid::new_v4().simple().to_string();
    let container = format!("{}:{}", config.name, &tag[..12]);

    println!("Building {container}");
    let docker = DockerClient::new();
    let started = Instant::now();
    docker.build(&container).await?;

    let record = BuildRecord {
        last_container: container.clone(),
        last_build_duration: started.elapsed().as_secs_f64(),
    };
    record.save(&project_dir)?;

    println!("Built {container} in {:.1}s", record.last_build_duration);
    Ok(())
}
