use std::path::PathBuf;

use builtin_model_gateway::gateway::http::{DEFAULT_MOUNT_PREFIX, mounted_router};
use builtin_model_gateway::gateway::observability::init_tracing;
#[cfg(feature = "otel")]
use builtin_model_gateway::gateway::otel::{OtelGuard, init_tracing_with_otel};
use builtin_model_gateway::{BuiltinModelConfig, BuiltinModelGateway, Env, GatewayHttpState};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "builtin-model-gateway",
    about = "Serve the builtin model list behind an access-key check"
)]
struct Cli {
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1:8000")]
    listen: String,
    /// Path prefix the routes are mounted under.
    #[arg(long, default_value = DEFAULT_MOUNT_PREFIX)]
    prefix: String,
    /// `.env` file consulted before the process environment.
    #[arg(long)]
    dotenv: Option<PathBuf>,
    /// TOML config file; replaces the environment as the settings source.
    #[arg(long, conflicts_with = "dotenv")]
    config: Option<PathBuf>,
    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
    /// Export spans over OTLP (requires the `otel` feature).
    #[arg(long)]
    otel: bool,
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    otel_endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let _otel_guard = attach_tracing(cli.otel, cli.otel_endpoint.as_deref(), cli.json_logs)?;

    let config = match (&cli.config, &cli.dotenv) {
        (Some(path), _) => BuiltinModelConfig::from_toml_file(path)?,
        (None, Some(path)) => BuiltinModelConfig::from_env(&Env::load_dotenv(path)?),
        (None, None) => BuiltinModelConfig::from_env(&Env::from_process()),
    };
    if !config.enabled {
        tracing::warn!("builtin models are disabled; all keyed routes will answer 503");
    }
    if config.access_keys.is_empty() {
        tracing::warn!("no builtin model access keys configured");
    }
    if config.api_key.is_none() {
        tracing::warn!("no builtin model API key configured; /models will answer 500");
    }
    tracing::info!(config = ?config, "loaded builtin model config");

    let gateway = BuiltinModelGateway::new(config)?;
    let app = mounted_router(&cli.prefix, GatewayHttpState::new(gateway));

    let listener = tokio::net::TcpListener::bind(&cli.listen).await?;
    tracing::info!(listen = %cli.listen, prefix = %cli.prefix, "builtin-model-gateway listening");
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(feature = "otel")]
fn attach_tracing(
    otel_enabled: bool,
    endpoint: Option<&str>,
    json_logs: bool,
) -> Result<Option<OtelGuard>, Box<dyn std::error::Error>> {
    if !otel_enabled {
        init_tracing(json_logs)?;
        return Ok(None);
    }
    Ok(Some(init_tracing_with_otel(endpoint, json_logs)?))
}

#[cfg(not(feature = "otel"))]
fn attach_tracing(
    otel_enabled: bool,
    _endpoint: Option<&str>,
    json_logs: bool,
) -> Result<Option<()>, Box<dyn std::error::Error>> {
    if otel_enabled {
        return Err("otel requires `--features otel`".into());
    }
    init_tracing(json_logs)?;
    Ok(None)
}
