use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use five_s_audit::{
    Assessment, Submission,
    config::{Config, RuntimeConfig},
    http, pipeline_from_config,
};

#[derive(Parser, Debug)]
#[command(name = "five-s-audit", about = "5S workplace audits from photographs", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve POST /analyze-5s over HTTP
    Serve {
        /// Override the configured bind address
        #[arg(long)]
        bind: Option<std::net::SocketAddr>,
    },
    /// Audit local image files and print the result as JSON
    Analyze {
        #[arg(long, short, default_value = "")]
        workspace: String,
        /// Print a persist-ready record (id, timestamp, image paths) instead of the bare result
        #[arg(long)]
        record: bool,
        #[arg(required = true, num_args = 1..=4)]
        images: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Subscriber first, so config load and validation warnings are not lost.
    // Logs go to stderr so `analyze` output stays clean JSON.
    Config::load_dotenv();
    let log_level = RuntimeConfig::load_from_env().log_level;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("five_s_audit=info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = Config::load()?;

    info!("🚀 Starting five-s-audit");
    info!("🧠 Model: {}", config.capability.model);

    let pipeline = Arc::new(pipeline_from_config(&config)?);

    match cli.command {
        Command::Serve { bind } => {
            http::start_http_server(pipeline, bind.unwrap_or(config.server.bind)).await?;
        }
        Command::Analyze {
            workspace,
            record,
            images,
        } => {
            let mut encoded = Vec::with_capacity(images.len());
            for path in &images {
                let bytes = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("Failed to read image {}", path.display()))?;
                encoded.push(BASE64.encode(bytes));
            }

            let submission = Submission {
                images: encoded,
                workspace_name: workspace.clone(),
            };
            let result = match pipeline.run(&submission).await {
                Ok(result) => result,
                Err(err) => {
                    eprintln!("{}", serde_json::to_string_pretty(&err.to_body())?);
                    std::process::exit(1);
                }
            };

            let output = if record {
                let refs = images.iter().map(|p| p.display().to_string()).collect();
                serde_json::to_string_pretty(&Assessment::from_result(result, workspace, refs))?
            } else {
                serde_json::to_string_pretty(&result)?
            };
            println!("{output}");
        }
    }

    Ok(())
}
