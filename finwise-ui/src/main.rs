use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tracing::debug;

use finwise_core::default_registry;
use finwise_http::HttpCalculationApi;
use finwise_ui::{SubmitOutcome, UiConfig, app, logging};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Personal finance calculators backed by the FinWise calculation service.
///
/// Forms are filled with `field=value` arguments; untouched fields keep
/// their defaults. Amounts may use thousands separators (`300,000`).
#[derive(Debug, Parser)]
#[command(name = "finwise", version)]
struct Cli {
    /// Settings file. Defaults to `finwise.toml` when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Calculation service origin, overriding the config file.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Log filter, e.g. `debug` or `finwise_ui=trace`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Append logs to this file as well as stderr.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every calculator with its API route.
    List,

    /// Print the instant estimate for a form.
    Preview {
        /// Calculator key, e.g. `repayment` or `/mortgage/repayment`.
        calculator: String,
        #[arg(value_name = "FIELD=VALUE")]
        fields: Vec<String>,
    },

    /// Submit a form to the service and print the result.
    Calc {
        calculator: String,
        #[arg(value_name = "FIELD=VALUE")]
        fields: Vec<String>,
    },

    /// Edit a form line by line with live previews.
    Interactive { calculator: String },
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = UiConfig::load_or_default(cli.config.as_deref())
        .context("failed to load configuration")?
        .with_overrides(cli.api_url, cli.log_level, cli.log_file)
        .context("invalid command-line override")?;
    logging::init_logging(&config.log).context("failed to initialise logging")?;
    debug!(?config, "configuration resolved");

    let api = HttpCalculationApi::new(config.api.clone());
    let debounce = config.debounce();
    let finwise = app::bootstrap(default_registry(), Arc::new(api), config);

    match cli.command {
        Command::List => {
            print!("{}", finwise.catalog());
        }
        Command::Preview { calculator, fields } => {
            println!("{}", finwise.preview(&calculator, &fields)?);
        }
        Command::Calc { calculator, fields } => {
            let (outcome, panel) = finwise.calculate(&calculator, &fields).await?;
            print!("{panel}");
            if matches!(outcome, SubmitOutcome::Failed(_)) {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Interactive { calculator } => {
            let session = finwise.session(&calculator)?;
            let stdin = BufReader::new(tokio::io::stdin());
            let stdout = Arc::new(Mutex::new(std::io::stdout()));
            app::run_interactive(session, debounce, stdin, stdout)
                .await
                .context("interactive session failed")?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
