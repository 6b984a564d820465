//! Advisora Rust - command-line entry point

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use advisora_rust::{
    application::{ApplicationError, Dispatcher},
    infrastructure::{
        fetch::HttpFetcher,
        repositories::{FileRecordRepository, RecordRepository},
    },
    Config, init_tracing,
};

/// Vulnerability metadata extraction from vendor advisory pages
#[derive(Parser, Debug)]
#[command(name = "advisora", version, about)]
struct Cli {
    /// Name of the vendor (e.g. ibm, redhat)
    #[arg(long)]
    vendor: String,

    /// Name of the product (e.g. mq, websphere)
    #[arg(long)]
    product: String,

    /// Product base versions, paired positionally with --fix-version
    #[arg(long = "base-version", required = true, num_args = 1..)]
    base_version: Vec<String>,

    /// Fix versions to target, paired positionally with --base-version
    #[arg(long = "fix-version", required = true, num_args = 1..)]
    fix_version: Vec<String>,

    /// Directory to write records to, in addition to stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|_| {
        eprintln!("Failed to load configuration, using defaults");
        Config::default()
    });

    if let Err(e) = init_tracing(&config.logging) {
        eprintln!("Failed to initialize tracing: {}", e);
    }
    tracing::debug!(
        build_date = option_env!("VERGEN_BUILD_DATE").unwrap_or("unknown"),
        git_sha = option_env!("VERGEN_GIT_SHA").unwrap_or("unknown"),
        "starting"
    );

    if let Err(e) = config.registry.validate() {
        eprintln!("[!] Configuration Error: {}", e);
        return ExitCode::FAILURE;
    }

    if cli.base_version.len() != cli.fix_version.len() {
        eprintln!("[!] --base-version and --fix-version must be paired one to one");
        return ExitCode::FAILURE;
    }

    let fetcher = Arc::new(HttpFetcher::new(config.http.timeout_seconds));
    let dispatcher = Dispatcher::new(Arc::new(config), fetcher);
    let repository = cli.output.as_ref().map(FileRecordRepository::new);

    for (base_version, fix_version) in cli.base_version.iter().zip(cli.fix_version.iter()) {
        let outcome = run_pipeline(
            &dispatcher,
            repository.as_ref(),
            &cli.vendor,
            &cli.product,
            base_version,
            fix_version,
        )
        .await;

        match outcome {
            Ok(()) => {}
            Err(ApplicationError::Configuration(e)) => {
                eprintln!("[!] Configuration Error: {}", e);
                return ExitCode::FAILURE;
            }
            Err(e) => {
                eprintln!("[!] Extraction failed: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

async fn run_pipeline(
    dispatcher: &Dispatcher,
    repository: Option<&FileRecordRepository>,
    vendor: &str,
    product: &str,
    base_version: &str,
    fix_version: &str,
) -> Result<(), ApplicationError> {
    let orchestrator = dispatcher.resolve(vendor, product, base_version)?;

    match orchestrator.process(product, base_version, fix_version).await? {
        Some(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            if let Some(repository) = repository {
                let name = format!("{}_{}_{}", vendor, product, fix_version)
                    .replace([' ', '/'], "-");
                let path = repository.save(&record, &name)?;
                tracing::info!(path = %path.display(), "record written");
            }
        }
        None => {
            tracing::info!(product, fix_version, "no advisories found for fix version");
        }
    }

    Ok(())
}
