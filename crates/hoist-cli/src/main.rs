mod commands;
mod progress;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "hoist",
    about = "Scaffold, build and deploy containerized ML jobs to Kubernetes"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a new app from a template
    Init {
        /// App name; lowercased, container registries require it
        name: String,
        /// Template to start from
        #[arg(long, default_value = "hello-world")]
        template: String,
        /// Git URL (or local path) of the template repository
        #[arg(long, default_value = commands::DEFAULT_TEMPLATE_REPO)]
        template_repo: String,
        /// Container registry to push to; when omitted, the active
        /// gcloud project is used instead
        #[arg(long)]
        registry: Option<String>,
        /// Kubernetes namespace to deploy into; defaults to the app name
        #[arg(long)]
        namespace: Option<String>,
    },
    /// Build the app into a locally tagged container image
    Build,
    /// Push the last built image and apply the rendered manifests
    Deploy {
        /// Deploy using the image from the last push
        #[arg(long)]
        no_push: bool,
        /// Rewrite the container command to an indefinite sleep, then
        /// drop into a shell on the pod. Adds a debug=true label for
        /// easy discovery later. With more than one template, pass the
        /// file to deploy interactively as KUBE_SPEC
        #[arg(long, short = 'i')]
        interactive: bool,
        /// Number of retries to connect to a pod interactively;
        /// waits 1 second between retries
        #[arg(long, default_value_t = 5)]
        connection_attempts: u32,
        /// Template file to patch for an interactive deploy; only used
        /// with --interactive
        kube_spec: Option<String>,
    },
    /// Delete everything the last deploy applied
    Undeploy,
    /// Inspect available templates
    #[command(alias = "template")]
    Templates {
        #[command(subcommand)]
        action: TemplatesAction,
    },
}

#[derive(Subcommand)]
enum TemplatesAction {
    /// List the templates in the template repository
    List {
        /// Git URL (or local path) of the template repository
        #[arg(long, default_value = commands::DEFAULT_TEMPLATE_REPO)]
        template_repo: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            name,
            template,
            template_repo,
            registry,
            namespace,
        } => {
            commands::init(commands::InitArgs {
                // container registries require lowercase repository names
                name: name.to_lowercase(),
                template,
                template_repo,
                registry,
                namespace,
            })
            .await?
        }
        Commands::Build => commands::build().await?,
        Commands::Deploy {
            no_push,
            interactive,
            connection_attempts,
            kube_spec,
        } => {
            commands::deploy(commands::DeployArgs {
                no_push,
                interactive,
                connection_attempts,
                kube_spec,
            })
            .await?
        }
        Commands::Undeploy => commands::undeploy().await?,
        Commands::Templates { action } => match action {
            TemplatesAction::List { template_repo } => {
                commands::templates_list(&template_repo).await?
            }
        },
    }

    Ok(())
}
