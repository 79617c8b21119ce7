//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use csv_downloader_core::DEFAULT_TIMEOUT_SECS;

/// Download every HTTP(S) link found in a CSV file.
///
/// Every cell of every row is scanned; each unique URL is fetched once and
/// saved into the output directory under a safe, collision-free name.
#[derive(Parser, Debug)]
#[command(name = "csv-downloader")]
#[command(author, version, about)]
pub struct Args {
    /// CSV file to scan for URLs ("-" reads standard input)
    pub input: PathBuf,

    /// Directory to save downloads into (created if missing)
    #[arg(short = 'o', long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Concurrent downloads (0 or 1 = sequential, max 100)
    #[arg(short = 'c', long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub concurrency: u8,

    /// Attempts per URL including the first (0-10, 0 behaves like 1)
    #[arg(short = 'r', long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub retry_count: u8,

    /// Connect and read timeout in seconds (1-3600)
    #[arg(short = 't', long = "timeout", default_value_t = DEFAULT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout_secs: u64,

    /// Maximum requests per second across all workers (0 = unlimited)
    #[arg(short = 'l', long, default_value_t = 0.0)]
    pub rate_limit: f64,

    /// HTTP(S) proxy for every request, e.g. http://proxy:3128
    #[arg(long = "proxy")]
    pub proxy_url: Option<String>,

    /// Field delimiter of the input file
    #[arg(short = 'd', long, default_value_t = ',')]
    pub delimiter: char,

    /// Print the final summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored log output
    #[arg(long)]
    pub no_color: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["csv-downloader", "links.csv"]).unwrap();
        assert_eq!(args.input, PathBuf::from("links.csv"));
        assert_eq!(args.output_dir, PathBuf::from("."));
        assert_eq!(args.concurrency, 1);
        assert_eq!(args.retry_count, 5);
        assert_eq!(args.timeout_secs, 30);
        assert!(args.rate_limit.abs() < f64::EPSILON);
        assert!(args.proxy_url.is_none());
        assert_eq!(args.delimiter, ',');
        assert!(!args.json);
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
    }

    #[test]
    fn test_cli_input_is_required() {
        let err = Args::try_parse_from(["csv-downloader"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["csv-downloader", "-vv", "a.csv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["csv-downloader", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Args::try_parse_from(["csv-downloader", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_all_options() {
        let args = Args::try_parse_from([
            "csv-downloader",
            "-",
            "-o",
            "out",
            "-c",
            "8",
            "-r",
            "2",
            "-t",
            "10",
            "-l",
            "2.5",
            "--proxy",
            "http://proxy:3128",
            "-d",
            ";",
            "--json",
        ])
        .unwrap();
        assert_eq!(args.input, PathBuf::from("-"));
        assert_eq!(args.output_dir, PathBuf::from("out"));
        assert_eq!(args.concurrency, 8);
        assert_eq!(args.retry_count, 2);
        assert_eq!(args.timeout_secs, 10);
        assert!((args.rate_limit - 2.5).abs() < f64::EPSILON);
        assert_eq!(args.proxy_url.as_deref(), Some("http://proxy:3128"));
        assert_eq!(args.delimiter, ';');
        assert!(args.json);
    }

    #[test]
    fn test_cli_concurrency_range() {
        assert!(Args::try_parse_from(["csv-downloader", "-c", "0", "a.csv"]).is_ok());
        assert!(Args::try_parse_from(["csv-downloader", "-c", "100", "a.csv"]).is_ok());
        let err = Args::try_parse_from(["csv-downloader", "-c", "101", "a.csv"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_retry_and_timeout_ranges() {
        assert!(Args::try_parse_from(["csv-downloader", "-r", "11", "a.csv"]).is_err());
        assert!(Args::try_parse_from(["csv-downloader", "-t", "0", "a.csv"]).is_err());
        assert!(Args::try_parse_from(["csv-downloader", "-t", "3601", "a.csv"]).is_err());
    }
}
