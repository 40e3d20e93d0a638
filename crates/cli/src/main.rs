use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dataverse::{
    Authenticator, ClientCredentials, ClientCredentialsAuthenticator, DataverseClient,
    StaticTokenAuthenticator,
};
use events::{Event, EventBus};
use orchestrator::{cancel_pair, validate_entity_name, PipelineError, RibbonPipeline};
use ribbon_core::{OrgConfig, SolutionRef};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CONFIG_FILE: &str = "ribbon-export.toml";
const DEFAULT_TOKEN_ENV: &str = "DATAVERSE_TOKEN";
const DEFAULT_SECRET_ENV: &str = "DATAVERSE_CLIENT_SECRET";

#[derive(Parser)]
#[command(name = "ribbon-export")]
#[command(about = "Export a Dataverse entity and inspect its command bar ribbon", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Entity logical name, exported when no subcommand is given
    entity: Option<String>,

    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Overrides `organization.output_dir`
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter configuration file
    Init,
    /// Create, export and inspect a solution holding the entity
    Export { entity: String },
    /// Fetch and parse the ribbon only; nothing is created remotely
    Preview { entity: String },
    /// Delete the solution an earlier export created for the entity
    Cleanup { entity: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct CliConfig {
    organization: OrgConfig,
    #[serde(default)]
    auth: AuthConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
enum AuthConfig {
    /// Bearer token read from an environment variable
    Token {
        #[serde(default = "default_token_env")]
        token_env: String,
    },
    ClientCredentials {
        tenant_id: String,
        client_id: String,
        #[serde(default = "default_secret_env")]
        client_secret_env: String,
    },
}

fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

fn default_secret_env() -> String {
    DEFAULT_SECRET_ENV.to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::Token {
            token_env: default_token_env(),
        }
    }
}

impl CliConfig {
    fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_context(|| {
            format!(
                "Configuration not found at {} (run 'ribbon-export init')",
                path.display()
            )
        })?;
        Self::parse(&content).with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    fn parse(content: &str) -> Result<Self> {
        let config: CliConfig = toml::from_str(content)?;
        config.organization.validate()?;
        Ok(config)
    }

    fn authenticator(&self) -> Result<Arc<dyn Authenticator>> {
        match &self.auth {
            AuthConfig::Token { token_env } => {
                Ok(Arc::new(StaticTokenAuthenticator::from_env(token_env)?))
            }
            AuthConfig::ClientCredentials {
                tenant_id,
                client_id,
                client_secret_env,
            } => {
                let client_secret = std::env::var(client_secret_env)
                    .with_context(|| format!("{} not set", client_secret_env))?;
                Ok(Arc::new(ClientCredentialsAuthenticator::new(ClientCredentials {
                    tenant_id: tenant_id.clone(),
                    client_id: client_id.clone(),
                    client_secret,
                    resource: self.organization.organization_url.clone(),
                })
                .with_timeout(self.organization.request_timeout())))
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Init) => init_config(&cli.config).await,
        Some(Commands::Export { ref entity }) => export(&cli, entity).await,
        Some(Commands::Preview { ref entity }) => preview(&cli, entity).await,
        Some(Commands::Cleanup { ref entity }) => cleanup(&cli, entity).await,
        None => match cli.entity.as_deref() {
            Some(entity) => export(&cli, entity).await,
            None => bail!("No entity given. Try 'ribbon-export export <entity>'"),
        },
    }
}

async fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        println!("Configuration already exists at {}", path.display());
        return Ok(());
    }

    let config = CliConfig {
        organization: OrgConfig::new("https://contoso.crm.dynamics.com", "contoso"),
        auth: AuthConfig::default(),
    };
    tokio::fs::write(path, toml::to_string_pretty(&config)?).await?;

    println!("Wrote {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Set organization_url and publisher_unique_name");
    println!("  2. export {}=<bearer token>", DEFAULT_TOKEN_ENV);
    println!("  3. ribbon-export export account");

    Ok(())
}

fn load_pipeline(cli: &Cli) -> Result<RibbonPipeline> {
    let mut config = CliConfig::load(&cli.config)?;
    if let Some(ref dir) = cli.output_dir {
        config.organization.output_dir = dir.clone();
    }

    let client = DataverseClient::from_config(&config.organization, config.authenticator()?);
    Ok(RibbonPipeline::new(Arc::new(client), config.organization))
}

async fn export(cli: &Cli, entity: &str) -> Result<()> {
    let pipeline = load_pipeline(cli)?;
    let bus = EventBus::new();
    let progress = spawn_progress(&bus);
    let pipeline = pipeline.with_event_bus(bus);

    let (handle, signal) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling");
            handle.cancel();
        }
    });

    let outcome = pipeline.run_with_report(entity, &signal).await;
    // Closes the bus so the printer finishes even if the run never started
    drop(pipeline);
    let _ = progress.await;
    let report = outcome.map_err(describe)?;

    eprintln!();
    eprintln!("Package:     {}", report.package.file_path.display());
    eprintln!("Ribbon XML:  {}", report.ribbon_file.display());
    eprintln!(
        "Ribbon:      {} tabs, {} groups, {} controls, {} commands",
        report.document.tabs.len(),
        report.document.group_count(),
        report.document.control_count(),
        report.document.command_definitions.len()
    );

    print_json(&report, cli.pretty)
}

async fn preview(cli: &Cli, entity: &str) -> Result<()> {
    let pipeline = load_pipeline(cli)?;
    let (handle, signal) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });

    let document = pipeline.preview(entity, &signal).await.map_err(describe)?;
    print_json(&document, cli.pretty)
}

async fn cleanup(cli: &Cli, entity: &str) -> Result<()> {
    let config = CliConfig::load(&cli.config)?;
    let client = DataverseClient::from_config(&config.organization, config.authenticator()?);
    let solution = cleanup_solution_name(&config.organization.solution_prefix, entity)?;

    client
        .delete_solution(&solution)
        .await
        .with_context(|| format!("Failed to delete solution {}", solution))?;

    println!("Deleted solution {}", solution);
    Ok(())
}

/// Name of the solution `export` created for `entity`.
fn cleanup_solution_name(prefix: &str, entity: &str) -> Result<String> {
    let entity = validate_entity_name(entity).map_err(describe)?;
    Ok(SolutionRef::unique_name_for(prefix, entity))
}

fn describe(err: PipelineError) -> anyhow::Error {
    let kind = err.kind();
    anyhow::Error::new(err).context(format!("ribbon export failed ({})", kind))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}

/// Print one line per step to stderr until the run concludes.
fn spawn_progress(bus: &EventBus) -> tokio::task::JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        while let Ok(envelope) = rx.recv().await {
            let event = envelope.event;
            match &event {
                Event::StepStarted { step, index, .. } => eprintln!("[{}/8] {}", index, step),
                Event::StepFailed { step, error, .. } => eprintln!("      {} failed: {}", step, error),
                Event::RunCancelled { step, .. } => eprintln!("      cancelled during {}", step),
                _ => {}
            }
            if event.is_terminal() {
                break;
            }
        }
    })
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
}
