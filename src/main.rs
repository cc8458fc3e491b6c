//! form-smoke - browser smoke test for a single web form
//!
//! Main entry point for the CLI application.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use form_smoke::{AgentBrowser, Config, SmokeRunner};
use tracing_subscriber::EnvFilter;

/// Smoke test a web form and write an xlsx report
#[derive(Parser, Debug)]
#[command(name = "form-smoke")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// URL under test (overrides config and deploy-config.json)
    #[arg(long, short = 'u', env = "FORM_SMOKE_URL")]
    url: Option<String>,

    /// Config file (defaults to the user config directory)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Report path
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Screenshot directory
    #[arg(long)]
    screenshots: Option<PathBuf>,

    /// Text typed into the detected input
    #[arg(long)]
    input_text: Option<String>,

    /// Run in headed browser mode (visible window)
    #[arg(long)]
    headed: bool,

    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn init_tracing(debug: bool) {
    let default = if debug { "form_smoke=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = Config::load(args.config.as_deref())?;

    // Apply CLI overrides
    if let Some(ref url) = args.url {
        config.target.url = Some(url.clone());
    }

    if let Some(ref output) = args.output {
        config.output.report_path = output.clone();
    }

    if let Some(ref dir) = args.screenshots {
        config.output.screenshot_dir = dir.clone();
    }

    if let Some(ref text) = args.input_text {
        config.checks.input_text = text.clone();
    }

    if args.headed {
        config.browser.headed = true;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_tracing(args.debug);

    let config = build_config(&args)?;

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(ExitCode::SUCCESS);
    }

    config.validate()?;

    let driver = AgentBrowser::new(config.browser.session_name.clone());
    let outcome = SmokeRunner::new(config, driver)?.run().await?;

    Ok(ExitCode::from(outcome.exit_code()))
}
