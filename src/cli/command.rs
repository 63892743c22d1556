use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};

pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_DESCRIBE"),
    ")\nmediacodec library ",
    env!("MEDIACODEC_VERSION"),
    "\nbuilt ",
    env!("BUILD_TIMESTAMP"),
);

#[derive(Debug, ClapParser)]
#[command(
    name         = env!("CARGO_PKG_NAME"),
    version      = env!("CARGO_PKG_VERSION"),
    long_version = LONG_VERSION,
    author       = env!("CARGO_PKG_AUTHORS"),
    about        = "Tools for probing and driving Android NDK MediaCodec sessions",
    long_about   = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Treat input errors as fatal instead of skipping the access unit.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check which codec entry points the platform library exports.
    Probe(ProbeArgs),

    /// Decode an Annex-B H.264/H.265 stream through a hardware codec.
    Decode(DecodeArgs),
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Codec library to load.
    #[arg(long, value_name = "PATH", default_value = mediacodec::ndk::LIBRARY_NAME)]
    pub library: PathBuf,

    /// Print the declared entry points without loading any library.
    #[arg(long)]
    pub list: bool,
}

#[derive(Debug, Args)]
pub struct DecodeArgs {
    /// Input Annex-B elementary stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Codec component name, e.g. c2.android.avc.decoder.
    #[arg(long, value_name = "NAME")]
    pub codec: Option<String>,

    /// Stream mime type (video/avc or video/hevc).
    #[arg(long, value_name = "MIME")]
    pub mime: Option<String>,

    /// Picture width.
    #[arg(long, value_name = "W")]
    pub width: Option<i32>,

    /// Picture height.
    #[arg(long, value_name = "H")]
    pub height: Option<i32>,

    /// Rotation in degrees.
    #[arg(long, value_name = "DEG")]
    pub rotation: Option<i32>,

    /// YAML session profile; command-line options override it.
    #[arg(long, value_name = "FILE")]
    pub profile: Option<PathBuf>,

    /// Output path for decoded pictures and the report.
    #[arg(long, value_name = "PATH")]
    pub output_path: Option<PathBuf>,

    /// Frame rate used to derive presentation timestamps.
    #[arg(long, value_name = "N")]
    pub fps: Option<f64>,

    /// Wait per dequeue call, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Disable progress estimation
    #[arg(long)]
    pub no_estimate_progress: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}
