//! Main entry point for the apkinfo CLI application.
//!
//! Reads the APK named on the command line (or in `apk_path`) and prints its
//! identity fields as `KEY=value` lines for the next pipeline step.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::io::Write;
use std::process::ExitCode;

use apkinfo::cli::pipeline_outputs;
use apkinfo::{Cli, InfoExtractor};

/// Exit status when the APK path names a directory.
const EXIT_IS_DIRECTORY: u8 = 3;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .format_timestamp(None)
        .parse_default_env()
        .init();

    let path = cli.apk_path();
    if path.as_os_str().is_empty() {
        bail!("no APK path given");
    }
    let path = std::path::absolute(&path)
        .with_context(|| format!("failed to expand path {}", path.display()))?;
    log::info!("APK path: {}", path.display());

    if !path.exists() {
        bail!("APK path {} does not exist", path.display());
    }
    if path.is_dir() {
        log::error!("{} is a directory, not an APK", path.display());
        return Ok(ExitCode::from(EXIT_IS_DIRECTORY));
    }

    let info = InfoExtractor::new(cli.options())
        .extract(&path)
        .with_context(|| format!("failed to read APK info from {}", path.display()))?;

    let mut stdout = std::io::stdout().lock();
    for (key, value) in pipeline_outputs(&info) {
        writeln!(stdout, "{key}={value}")?;
        log::info!("{key} value: {value}");
    }

    Ok(ExitCode::SUCCESS)
}
