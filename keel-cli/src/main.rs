use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;

use keel_core::Value;
use keel_remote_state::{RemoteStateRequest, RemoteStateResolver, RemoteStateResult};
use keel_state::BackendRegistry;

#[derive(Parser)]
#[command(name = "keel")]
#[command(about = "Read outputs from remote infrastructure state", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the outputs of a state stored in a backend
    RemoteState {
        /// Backend type (e.g., local, s3, inmem)
        #[arg(long)]
        backend: String,

        /// Backend configuration as a JSON object
        #[arg(long, conflicts_with = "config_file")]
        config: Option<String>,

        /// Path to a JSON file holding the backend configuration
        #[arg(long)]
        config_file: Option<PathBuf>,

        /// Workspace to read
        #[arg(long)]
        workspace: Option<String>,

        /// Deprecated, use --workspace
        #[arg(long)]
        environment: Option<String>,

        /// Fallback output values as a JSON object
        #[arg(long)]
        defaults: Option<String>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the available backend types
    Backends,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let registry = Arc::new(BackendRegistry::with_builtin());

    let result = match cli.command {
        Commands::RemoteState {
            backend,
            config,
            config_file,
            workspace,
            environment,
            defaults,
            json,
        } => {
            let request = build_request(
                backend,
                config.as_deref(),
                config_file.as_deref(),
                workspace,
                environment,
                defaults.as_deref(),
            );
            match request {
                Ok(request) => run_remote_state(registry, &request, json).await,
                Err(e) => Err(e),
            }
        }
        Commands::Backends => run_backends(&registry),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn build_request(
    backend: String,
    config: Option<&str>,
    config_file: Option<&Path>,
    workspace: Option<String>,
    environment: Option<String>,
    defaults: Option<&str>,
) -> Result<RemoteStateRequest, String> {
    let config = match (config, config_file) {
        (Some(text), _) => parse_json_arg("--config", text)?,
        (None, Some(path)) => {
            log::debug!("Reading backend configuration from {}", path.display());
            let content = fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
            parse_json_arg(&path.display().to_string(), &content)?
        }
        (None, None) => Value::Null,
    };

    let mut request = RemoteStateRequest::new(backend, config);
    request.workspace = workspace;
    request.environment = environment;

    if let Some(text) = defaults {
        match parse_json_arg("--defaults", text)? {
            Value::Map(map) => request.defaults = Some(map),
            other => {
                return Err(format!(
                    "--defaults must be a JSON object, got {}",
                    other.type_name()
                ));
            }
        }
    }

    Ok(request)
}

fn parse_json_arg(source: &str, text: &str) -> Result<Value, String> {
    serde_json::from_str::<serde_json::Value>(text)
        .map(Value::from)
        .map_err(|e| format!("Invalid JSON in {}: {}", source, e))
}

async fn run_remote_state(
    registry: Arc<BackendRegistry>,
    request: &RemoteStateRequest,
    json: bool,
) -> Result<(), String> {
    let resolver = RemoteStateResolver::new(registry);
    let result = resolver
        .resolve(request)
        .await
        .map_err(|e| e.to_string())?;

    if json {
        let content = serde_json::to_string_pretty(&result.to_value().to_json())
            .map_err(|e| format!("Failed to serialize result: {}", e))?;
        println!("{}", content);
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "✓ {} outputs read from {} backend.",
            result.outputs.len(),
            result.backend_type
        )
        .green()
        .bold()
    );
    for line in format_outputs(&result) {
        println!("  {}", line);
    }

    Ok(())
}

/// `name = value` lines, sorted by name, values rendered as JSON
fn format_outputs(result: &RemoteStateResult) -> Vec<String> {
    let sorted: BTreeMap<&String, &Value> = result.outputs.iter().collect();
    sorted
        .into_iter()
        .map(|(name, value)| format!("{} = {}", name.cyan(), value.to_json()))
        .collect()
}

fn run_backends(registry: &BackendRegistry) -> Result<(), String> {
    for name in registry.backend_types() {
        println!("  • {}", name);
    }
    Ok(())
}
