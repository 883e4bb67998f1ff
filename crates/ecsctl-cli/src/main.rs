//! ecsctl: deploy ECS task definitions and services from YAML specs.
//!
//! ```text
//! ecsctl task-definition register task.yaml -e prod.env -c prod -w
//! ecsctl service create-or-update service.yaml -j tf-output.json --wait
//! ecsctl secrets dump secrets.yaml --filter /prod/ -v env=prod
//! ```
//!
//! Exit codes: 0 success, 1 error, 2 invalid request or spec, 3 rollout
//! failed, 4 rollout timed out.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use ecsctl_client::Clients;
use ecsctl_core::EcsctlConfig;

mod commands;
mod exit;
mod progress;

use commands::{Context, SpecVars, WaitArgs};

#[derive(Parser)]
#[command(
    name = "ecsctl",
    about = "Deploy ECS task definitions and services from YAML specs",
    version,
    propagate_version = true
)]
struct Cli {
    /// Validate and log requests instead of sending them
    #[arg(long, global = true)]
    dry_run: bool,

    /// Path to ecsctl.toml (default: ./ecsctl.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Register task definitions and roll them out
    TaskDefinition {
        #[command(subcommand)]
        action: TaskDefinitionAction,
    },
    /// Create and update services
    Service {
        #[command(subcommand)]
        action: ServiceAction,
    },
    /// Store and dump SSM SecureString parameters
    Secrets {
        #[command(subcommand)]
        action: SecretsAction,
    },
}

#[derive(Subcommand)]
enum TaskDefinitionAction {
    /// Register a task definition from a spec file.
    ///
    /// With -c, every service in that cluster running the same family is
    /// updated to the new revision.
    Register {
        spec_file: PathBuf,
        #[command(flatten)]
        vars: SpecVars,
        /// Update all services using this task family in the cluster
        #[arg(short = 'c', long = "update-services-in-cluster", value_name = "CLUSTER")]
        clusters: Vec<String>,
        #[command(flatten)]
        wait: WaitArgs,
    },
}

#[derive(Subcommand)]
enum ServiceAction {
    /// Create a service
    Create {
        spec_file: PathBuf,
        #[command(flatten)]
        vars: SpecVars,
    },
    /// Update an existing service
    Update {
        spec_file: PathBuf,
        #[command(flatten)]
        vars: SpecVars,
        #[command(flatten)]
        wait: WaitArgs,
    },
    /// Create the service if it does not exist, update it otherwise
    CreateOrUpdate {
        spec_file: PathBuf,
        #[command(flatten)]
        vars: SpecVars,
        #[command(flatten)]
        wait: WaitArgs,
    },
    /// Register a task definition and point the service at it
    Deploy {
        task_spec_file: PathBuf,
        service_spec_file: PathBuf,
        #[command(flatten)]
        vars: SpecVars,
        #[command(flatten)]
        wait: WaitArgs,
    },
}

#[derive(Subcommand)]
enum SecretsAction {
    /// Store each `name: value` pair as a SecureString parameter
    Store {
        spec_file: PathBuf,
        #[command(flatten)]
        vars: SpecVars,
    },
    /// Write parameters to a spec file that `secrets store` can read back
    Dump {
        target_file: PathBuf,
        #[command(flatten)]
        vars: SpecVars,
        /// Only dump parameters whose name matches this regex at its start
        #[arg(long)]
        filter: Option<String>,
    },
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ecsctl=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = EcsctlConfig::discover(cli.config.as_deref())?;
    debug!(?config, "configuration loaded");
    let ctx = Context {
        clients: Clients::connect(&config.aws, cli.dry_run).await,
        config,
    };

    match cli.command {
        Commands::TaskDefinition { action } => match action {
            TaskDefinitionAction::Register {
                spec_file,
                vars,
                clusters,
                wait,
            } => commands::task_definition::register(&ctx, &spec_file, &vars, &clusters, &wait).await,
        },
        Commands::Service { action } => match action {
            ServiceAction::Create { spec_file, vars } => {
                commands::service::create(&ctx, &spec_file, &vars).await
            }
            ServiceAction::Update {
                spec_file,
                vars,
                wait,
            } => commands::service::update(&ctx, &spec_file, &vars, &wait).await,
            ServiceAction::CreateOrUpdate {
                spec_file,
                vars,
                wait,
            } => commands::service::create_or_update(&ctx, &spec_file, &vars, &wait).await,
            ServiceAction::Deploy {
                task_spec_file,
                service_spec_file,
                vars,
                wait,
            } => {
                commands::service::deploy(&ctx, &task_spec_file, &service_spec_file, &vars, &wait)
                    .await
            }
        },
        Commands::Secrets { action } => match action {
            SecretsAction::Store { spec_file, vars } => {
                commands::secrets::store(&ctx, &spec_file, &vars).await
            }
            SecretsAction::Dump {
                target_file,
                vars,
                filter,
            } => commands::secrets::dump(&ctx, &target_file, &vars, filter.as_deref()).await,
        },
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            exit::to_exit_code(&err)
        }
    }
}
