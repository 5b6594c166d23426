//! ambient-id
//!
//! Prints an OIDC token for AUDIENCE detected from the current CI/CD or cloud
//! environment. Exits with status 1 if no credential is available or if a
//! recognized environment fails to produce one.

use std::process::ExitCode;
use std::time::Duration;

use ambient_id::{AmbientDetector, DetectConfig};
use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ambient-id", version, about = "Detect an ambient OIDC token")]
struct Cli {
    /// Audience to request the token for
    audience: String,

    /// Timeout in seconds for each network request or agent invocation
    #[arg(long, env = "AMBIENT_ID_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Log detection steps to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli).await {
        Ok(Some(token)) => {
            println!("{}", token);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!(
                "No ambient OIDC credential found for audience '{}'",
                cli.audience
            );
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<Option<String>> {
    let config = DetectConfig::default().with_timeout(Duration::from_secs(cli.timeout));
    let credential = AmbientDetector::with_config(config)
        .detect(&cli.audience)
        .await
        .with_context(|| format!("failed to detect credential for '{}'", cli.audience))?;

    Ok(credential.map(|credential| {
        tracing::info!("Using ambient credential from {}", credential.provider());
        credential.into_inner()
    }))
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("ambient_id=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
