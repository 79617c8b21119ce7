//! CLI entry point for the csv-downloader tool.

use std::process::ExitCode;

mod app;
mod app_config;
mod cli;

/// Process exit outcome of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Every URL downloaded.
    Success,
    /// Some URLs downloaded, some failed.
    Partial,
    /// Nothing downloaded, or the batch could not start.
    Failure,
    /// Interrupted with Ctrl-C.
    Cancelled,
}

impl ProcessExit {
    fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Partial => 1,
            Self::Failure => 2,
            Self::Cancelled => 130,
        }
    }
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        ExitCode::from(exit.code())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match app::runtime::run_downloader().await {
        Ok(exit) => exit.into(),
        Err(error) => {
            eprintln!("Error: {error:#}");
            ProcessExit::Failure.into()
        }
    }
}
