// src/main.rs

use std::process;

use anyhow::{Context, Result};
use tracing::error;

use ras_runner::{
    adapters::{
        cli::clap_adapter::ClapArguments,
        command::script::ScriptModelRunner,
        config_loader::yaml::Yaml,
        filesystem::RealFileSystem,
        logging::{init_logging, LogSink},
        progress::{BarProgressReporter, LogProgressReporter},
        s3::S3ObjectStore,
    },
    domain::{errors::RunnerError, payload::PayloadLocation},
    ports::{
        application::{ArgumentParser, RunArguments},
        config_loader::ConfigLoader,
        progress::ProgressReporter,
    },
    services::runner::Runner,
};

#[tokio::main]
async fn main() {
    let args = ClapArguments::parse_arguments();

    let sink = LogSink::new();
    if let Err(err) = init_logging(args.log_level, sink.clone()) {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }

    let code = match run(args, &sink).await {
        Ok(()) => 0,
        Err(err) => {
            error!("{err:#}");
            1
        }
    };

    // Flush and close the run log before exiting
    drop(sink.detach());
    process::exit(code);
}

async fn run(args: RunArguments, sink: &LogSink) -> Result<()> {
    let fs = RealFileSystem;
    let settings = Yaml::new(&fs)
        .load_settings(args.config_path.as_deref(), &args.overrides)
        .context("loading settings")?;

    let location =
        PayloadLocation::parse(&args.payload).map_err(|e| RunnerError::Parse(e.to_string()))?;

    let store = S3ObjectStore::connect(&settings)
        .await
        .context("connecting to object store")?;
    let model_runner = ScriptModelRunner::new();

    let reporter: Box<dyn ProgressReporter> = if args.progress_bar || console::user_attended() {
        Box::new(BarProgressReporter::new(console::colors_enabled()))
    } else {
        Box::new(LogProgressReporter)
    };

    Runner::new(&settings, &store, &fs, &model_runner, reporter.as_ref())
        .with_log_sink(sink.clone())
        .run(&location)
        .await?;

    Ok(())
}
