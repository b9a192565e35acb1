use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use crate::extract::{ApkInfo, ExtractOptions};
use crate::zip::DEFAULT_MAX_ENTRY_SIZE;

#[derive(Parser, Debug)]
#[command(name = "apkinfo")]
#[command(version)]
#[command(about = "Print package name, app name and version of an Android APK", long_about = None)]
#[command(after_help = "Output:\n  \
  ANDROID_APP_PACKAGE_NAME=com.example.app\n  \
  ANDROID_APP_NAME=Example\n  \
  ANDROID_APP_VERSION_NAME=1.2.3\n  \
  ANDROID_APP_VERSION_CODE=45\n\n\
Exit status is 3 when APK names a directory, 1 on any other failure.")]
pub struct Cli {
    /// APK file to inspect
    #[arg(value_name = "APK", env = "apk_path")]
    pub apk: String,

    /// Refuse archive entries that inflate past this many bytes
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_ENTRY_SIZE)]
    pub max_entry_size: u64,

    /// Log more (-v info, -vv debug); RUST_LOG overrides
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// The APK path with surrounding whitespace removed.
    pub fn apk_path(&self) -> PathBuf {
        PathBuf::from(self.apk.trim())
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    }

    pub fn options(&self) -> ExtractOptions {
        ExtractOptions {
            max_entry_size: self.max_entry_size,
        }
    }
}

/// The values handed to later pipeline steps, as (variable, value) pairs.
pub fn pipeline_outputs(info: &ApkInfo) -> [(&'static str, &str); 4] {
    [
        ("ANDROID_APP_PACKAGE_NAME", info.package_name.as_str()),
        ("ANDROID_APP_NAME", info.app_name.as_str()),
        ("ANDROID_APP_VERSION_NAME", info.version_name.as_str()),
        ("ANDROID_APP_VERSION_CODE", info.version_code.as_str()),
    ]
}
