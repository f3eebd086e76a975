use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod config;
mod driver;
mod walkthrough;

use cli::RootArgs;
use driver::ArangoClient;
use walkthrough::RunOptions;

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_tracing(args.verbose);

    let file = config::load_config_file(args.config.as_deref())?;
    let settings = config::resolve_settings(&args.overrides(), file.as_ref(), config::process_env)?;

    let client = ArangoClient::connect(&settings.client)
        .with_context(|| format!("connect to {}", settings.client.endpoint))?;
    let options = RunOptions {
        batch_size: settings.batch_size,
        cleanup: args.cleanup,
    };
    let outcome = walkthrough::run(&client, &options);
    client.shutdown();
    let report = match outcome {
        Ok(report) => report,
        Err(aborted) => {
            if args.json {
                println!("{}", aborted.report.to_json()?);
            }
            return Err(aborted.error);
        }
    };

    if args.json {
        println!("{}", report.to_json()?);
    } else {
        println!("{}", report.summary_line());
    }
    Ok(())
}

/// Logs go to stderr so stdout stays a clean transcript.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "arango_walkthrough=debug"
    } else {
        "arango_walkthrough=error"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
