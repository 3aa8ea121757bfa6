use clap::Parser;
use std::path::PathBuf;

use crate::core::occupancy::FillMode;
use crate::report::GridLabel;

// Build version with target info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Clock:  16.67 ms virtual frame\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Action schedule calculator and headless playback
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Project JSON to load - optional, starts on an empty project otherwise
    #[arg(value_name = "PROJECT")]
    pub project: Option<PathBuf>,

    /// Load the built-in demo project instead of a file
    #[arg(short = 'd', long = "demo", conflicts_with = "project")]
    pub demo: bool,

    /// Cell fill mode (overrides settings)
    #[arg(short = 'm', long = "fill-mode", value_name = "gradual|instant")]
    pub fill_mode: Option<FillMode>,

    /// Row label in occupancy grids (overrides settings)
    #[arg(long = "label", value_name = "module|stage|action")]
    pub label: Option<GridLabel>,

    /// Playback speed multiplier, clamped to 0.1..4 (overrides settings)
    #[arg(short = 's', long = "speed", value_name = "S")]
    pub speed: Option<f64>,

    /// Wrap to the start when playback reaches the end
    #[arg(short = 'o', long = "loop")]
    pub loop_playback: bool,

    /// Print occupancy at this time in ms (can be specified multiple times)
    #[arg(long = "at", value_name = "MS")]
    pub at: Vec<f64>,

    /// Run the playback clock headlessly until it stops
    #[arg(short = 'p', long = "play")]
    pub play: bool,

    /// Stop headless playback after N frames
    #[arg(long = "max-ticks", value_name = "N")]
    pub max_ticks: Option<u64>,

    /// Write the project as JSON after loading
    #[arg(long = "save", value_name = "PATH")]
    pub save: Option<PathBuf>,

    /// Store the effective fill mode, speed, loop and label as defaults
    #[arg(long = "save-settings")]
    pub save_settings: bool,

    /// Enable debug logging to file (default: actiongrid.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}
