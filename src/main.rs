use anyhow::Result;
use clap::Parser as ClapParser;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;

use cli::command::{Cli, Commands, LogFormat};
use cli::decode::cmd_decode;
use cli::probe::cmd_probe;

mod annexb;
mod cli;
mod input;
mod profile;
pub(crate) mod timestamp;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let base_level = cli.loglevel.to_level_filter();

    let multi = MultiProgress::new();

    let mut env_builder = env_logger::Builder::from_default_env();
    env_builder.filter_level(base_level);
    match cli.log_format {
        LogFormat::Plain => {
            env_builder.format_timestamp_millis();
        }
        LogFormat::Json => {
            env_builder.format(|buf, record| {
                use std::io::Write;
                writeln!(buf, "{}", json_record(&buf.timestamp_millis().to_string(), record))
            });
        }
    }

    let pb = if cli.progress {
        let logger = env_builder.build();
        LogWrapper::new(multi.clone(), logger).try_init()?;
        Some(&multi)
    } else {
        env_builder.try_init()?;
        None
    };

    match cli.command {
        Commands::Probe(ref args) => cmd_probe(args, &cli, pb)?,
        Commands::Decode(ref args) => cmd_decode(args, &cli, pb)?,
    }

    Ok(())
}

/// One log record as a single-line JSON object.
fn json_record(ts: &str, record: &log::Record) -> serde_json::Value {
    serde_json::json!({
        "ts": ts,
        "lvl": record.level().as_str(),
        "target": record.target(),
        "msg": record.args().to_string(),
    })
}

#[test]
fn json_log_escapes_control_characters() -> Result<()> {
    let line = json_record(
        "2026-01-01T00:00:00.000Z",
        &log::Record::builder()
            .args(format_args!("codec \u{1b}[31mred\n"))
            .level(log::Level::Warn)
            .target("mediacodec")
            .build(),
    )
    .to_string();

    assert!(!line.contains('\n'));
    assert!(line.contains(r"\u001b"));
    let parsed: serde_json::Value = serde_json::from_str(&line)?;
    assert_eq!(parsed["msg"], "codec \u{1b}[31mred\n");
    assert_eq!(parsed["lvl"], "WARN");
    Ok(())
}
