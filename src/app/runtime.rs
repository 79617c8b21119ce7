use std::fs;
use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use csv_downloader_core::{DownloadEngine, EngineError, SummarySink};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ProcessExit;
use crate::app::{config_runtime, exit_handler, input_processor, progress_manager, terminal};
use crate::app_config;

pub(crate) async fn run_downloader() -> Result<ProcessExit> {
    let (args, cli_sources) = config_runtime::parse_cli_with_sources();

    let default_level = config_runtime::resolve_default_log_level(&args);
    let force_cli_log_level = config_runtime::should_force_cli_log_level(&cli_sources);
    terminal::init_tracing(
        default_level,
        force_cli_log_level,
        terminal::is_no_color_requested(&args),
    );
    debug!(?args, "CLI arguments parsed");

    let loaded = app_config::load_default_file_config()?;
    if let (Some(path), Some(_)) = (&loaded.path, &loaded.config) {
        debug!(path = %path.display(), "Loaded config file");
    }
    let args = config_runtime::apply_config_defaults(args, &cli_sources, loaded.config.as_ref());

    let delimiter = config_runtime::resolve_delimiter(args.delimiter)?;
    let options = config_runtime::build_batch_options(&args);
    let engine = DownloadEngine::new(options)?;

    let urls = input_processor::process_input(&args.input, delimiter)?;
    if urls.is_empty() {
        return Err(EngineError::EmptyBatch)
            .with_context(|| format!("Nothing to download from '{}'", args.input.display()));
    }
    info!(urls = urls.len(), "Parsed input");

    if !args.output_dir.exists() {
        fs::create_dir_all(&args.output_dir).with_context(|| {
            format!(
                "Failed to create output directory '{}'",
                args.output_dir.display()
            )
        })?;
        info!(dir = %args.output_dir.display(), "Created output directory");
    }

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping downloads");
            interrupt.cancel();
        }
    });

    let use_progress_bar = terminal::should_use_progress_bar(
        io::stderr().is_terminal(),
        args.quiet,
        args.json,
        terminal::is_dumb_terminal(),
    );
    let progress = progress_manager::ProgressBarSink::new(use_progress_bar, urls.len());

    let summary = engine
        .run(&urls, &args.output_dir, &progress, &cancel)
        .await?;
    progress.finish();

    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        bytes = summary.bytes_written,
        "Download complete"
    );

    let sink: &dyn SummarySink = if args.json {
        &progress_manager::JsonSummarySink
    } else {
        &progress_manager::TextSummarySink
    };
    sink.on_summary(&summary);

    Ok(exit_handler::exit_outcome_for_summary(&summary))
}
