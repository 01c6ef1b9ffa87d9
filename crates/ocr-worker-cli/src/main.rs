//! ocr-worker command-line interface.
//!
//! ```bash
//! # Run the HTTP worker
//! ocr-worker serve -H 0.0.0.0 -p 8080
//!
//! # Process a local PDF and print the extraction envelope
//! ocr-worker extract datasheet.pdf
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ocr_worker::{Pipeline, WorkerConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ocr-worker")]
#[command(version, about = "PDF extraction worker: text blocks, tables and a quality score", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP worker
    Serve {
        /// Address to bind
        #[arg(short = 'H', long, env = "HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value_t = 8080)]
        port: u16,

        /// Path to an ocr-worker.toml file (discovered from the working directory when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Run the pipeline on a local PDF and print the JSON envelope
    Extract {
        /// PDF to process
        path: PathBuf,

        /// Path to an ocr-worker.toml file (discovered from the working directory when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print compact JSON instead of pretty-printed output
        #[arg(long)]
        compact: bool,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<WorkerConfig> {
    WorkerConfig::load(path).with_context(|| match path {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Failed to load configuration".to_string(),
    })
}

async fn extract(path: &Path, config: WorkerConfig, compact: bool) -> Result<()> {
    let pdf = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let pipeline = Pipeline::new(config).context("Failed to initialise the extraction pipeline")?;
    let result = pipeline
        .process_or_degrade(&pdf)
        .await
        .with_context(|| format!("Failed to process {}", path.display()))?;

    let json = if compact {
        serde_json::to_string(&result)?
    } else {
        serde_json::to_string_pretty(&result)?
    };
    println!("{}", json);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port, config } => {
            let config = load_config(config.as_deref())?;
            ocr_worker::api::serve(&host, port, config)
                .await
                .context("ocr-worker server failed")?;
        }
        Commands::Extract { path, config, compact } => {
            let config = load_config(config.as_deref())?;
            extract(&path, config, compact).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_flags() {
        let cli = Cli::try_parse_from(["ocr-worker", "serve", "-H", "127.0.0.1", "-p", "9000"]).unwrap();
        match cli.command {
            Commands::Serve { host, port, config } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 9000);
                assert!(config.is_none());
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_extract_requires_path() {
        assert!(Cli::try_parse_from(["ocr-worker", "extract"]).is_err());

        let cli = Cli::try_parse_from(["ocr-worker", "extract", "doc.pdf", "--compact"]).unwrap();
        match cli.command {
            Commands::Extract { path, compact, .. } => {
                assert_eq!(path, PathBuf::from("doc.pdf"));
                assert!(compact);
            }
            _ => panic!("expected extract"),
        }
    }

    #[test]
    fn test_load_config_reports_missing_file() {
        let err = load_config(Some(Path::new("/nonexistent/ocr-worker.toml"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/ocr-worker.toml"));
    }
}
