use anyhow::{Result, bail};
use clap::{ArgMatches, CommandFactory, FromArgMatches, parser::ValueSource};
use csv_downloader_core::BatchOptions;

use crate::app_config::FileConfig;
use crate::cli::Args;

/// Which options were given explicitly on the command line.
///
/// Explicit values win over the config file; defaults do not.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CliValueSources {
    pub(crate) output_dir: bool,
    pub(crate) concurrency: bool,
    pub(crate) retry_count: bool,
    pub(crate) timeout_secs: bool,
    pub(crate) rate_limit: bool,
    pub(crate) proxy_url: bool,
    pub(crate) verbose: bool,
    pub(crate) quiet: bool,
}

pub(crate) fn parse_cli_with_sources() -> (Args, CliValueSources) {
    let command = Args::command();
    let matches = command.get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());
    let sources = sources_from_matches(&matches);
    (args, sources)
}

fn sources_from_matches(matches: &ArgMatches) -> CliValueSources {
    CliValueSources {
        output_dir: is_commandline_value(matches, "output_dir"),
        concurrency: is_commandline_value(matches, "concurrency"),
        retry_count: is_commandline_value(matches, "retry_count"),
        timeout_secs: is_commandline_value(matches, "timeout_secs"),
        rate_limit: is_commandline_value(matches, "rate_limit"),
        proxy_url: is_commandline_value(matches, "proxy_url"),
        verbose: is_commandline_value(matches, "verbose"),
        quiet: is_commandline_value(matches, "quiet"),
    }
}

fn is_commandline_value(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// Fills options the user did not pass from the config file.
pub(crate) fn apply_config_defaults(
    mut args: Args,
    cli_sources: &CliValueSources,
    file_config: Option<&FileConfig>,
) -> Args {
    let Some(file_config) = file_config else {
        return args;
    };

    if !cli_sources.output_dir
        && let Some(output_dir) = &file_config.output_dir
    {
        args.output_dir = output_dir.clone();
    }

    if !cli_sources.concurrency
        && let Some(concurrency) = file_config.concurrency
    {
        args.concurrency = concurrency;
    }

    if !cli_sources.retry_count
        && let Some(retry_count) = file_config.retry_count
    {
        args.retry_count = retry_count;
    }

    if !cli_sources.timeout_secs
        && let Some(timeout_secs) = file_config.timeout_secs
    {
        args.timeout_secs = timeout_secs;
    }

    if !cli_sources.rate_limit
        && let Some(rate) = file_config.rate_limit_per_sec
    {
        args.rate_limit = rate;
    }

    if !cli_sources.proxy_url
        && args.proxy_url.is_none()
        && let Some(proxy_url) = &file_config.proxy_url
    {
        args.proxy_url = Some(proxy_url.clone());
    }

    args
}

/// Builds the engine options from the effective arguments.
pub(crate) fn build_batch_options(args: &Args) -> BatchOptions {
    BatchOptions {
        retry_count: u32::from(args.retry_count),
        timeout_secs: args.timeout_secs,
        rate_limit_per_sec: args.rate_limit,
        proxy_url: args.proxy_url.clone(),
        concurrency: usize::from(args.concurrency),
    }
}

/// Converts the `--delimiter` character into the byte the CSV reader wants.
pub(crate) fn resolve_delimiter(delimiter: char) -> Result<u8> {
    match u8::try_from(delimiter) {
        Ok(byte) if byte.is_ascii() && !matches!(byte, b'"' | b'\n' | b'\r') => Ok(byte),
        _ => bail!(
            "Invalid delimiter {delimiter:?}.\n  Suggestion: Use a single ASCII character such as ',' ';' or a tab"
        ),
    }
}

pub(crate) fn resolve_default_log_level(args: &Args) -> &'static str {
    if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

pub(crate) fn should_force_cli_log_level(cli_sources: &CliValueSources) -> bool {
    cli_sources.verbose || cli_sources.quiet
}
