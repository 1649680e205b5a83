//! fgaschema command-line tool
//!
//! Validates authorization models written in the modeling DSL, the same way
//! a model write would.
//!
//! # Usage
//!
//! ```bash
//! # Validate one or more model files
//! fgaschema validate model.fga other.fga
//!
//! # With config file
//! fgaschema --config config.yaml validate model.fga
//!
//! # With environment variables only
//! FGASCHEMA_MODELS__DETAILED_ERRORS=false fgaschema validate model.fga
//! ```
//!
//! One JSON object is printed per file. The exit status is non-zero when
//! any file is rejected.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};

use fgaschema_domain::parse;
use fgaschema_server::errors::ErrorCode;
use fgaschema_server::observability::{init_logging, LoggingConfig};
use fgaschema_server::{ServerConfig, WriteAuthorizationModelRequest, WriteModelHandler};
use fgaschema_storage::{MemoryModelStore, ModelStore};

const CLI_STORE_ID: &str = "cli";

/// fgaschema - authorization model validator
#[derive(Parser, Debug)]
#[command(name = "fgaschema")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate model files written in the modeling DSL
    Validate {
        /// Model files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    authorization_model_id: Option<String>,
}

impl FileReport {
    fn rejected(file: String, code: ErrorCode, kind: Option<String>, message: String) -> Self {
        Self {
            file,
            accepted: false,
            code: Some(code),
            kind,
            message: Some(message),
            authorization_model_id: None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    // Load configuration
    let config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::from_env()?,
    };

    init_logging(LoggingConfig::from(&config.logging));
    info!(version = env!("CARGO_PKG_VERSION"), "Starting fgaschema");

    let storage = MemoryModelStore::new_shared();
    storage.create_store(CLI_STORE_ID, "command line").await?;
    let handler = WriteModelHandler::with_settings(storage, &config.models);

    let Command::Validate { files } = args.command;
    let mut all_accepted = true;
    for path in files {
        let report = validate_file(&handler, &path).await?;
        all_accepted &= report.accepted;
        println!("{}", serde_json::to_string(&report)?);
    }

    Ok(if all_accepted {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn validate_file(
    handler: &WriteModelHandler<MemoryModelStore>,
    path: &Path,
) -> anyhow::Result<FileReport> {
    let file = path.display().to_string();
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read model file {file}"))?;

    let model = match parse(&source) {
        Ok(model) => model,
        Err(err) => {
            debug!(file = %file, error = %err, "model file failed to parse");
            return Ok(FileReport::rejected(
                file,
                ErrorCode::ValidationError,
                Some("ParseError".to_string()),
                err.to_string(),
            ));
        }
    };

    let request = WriteAuthorizationModelRequest::new(CLI_STORE_ID, model);
    Ok(match handler.write_authorization_model(request).await {
        Ok(response) => FileReport {
            file,
            accepted: true,
            code: None,
            kind: None,
            message: None,
            authorization_model_id: Some(response.authorization_model_id),
        },
        Err(err) => FileReport::rejected(
            file,
            err.code,
            err.kind.map(|kind| kind.to_string()),
            err.message,
        ),
    })
}
