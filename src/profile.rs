use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use mediacodec::SessionConfig;

use crate::cli::command::DecodeArgs;

pub const DEFAULT_FPS: f64 = 30.0;
pub const DEFAULT_TIMEOUT_MS: u64 = 10;

/// A value in the `format:` map of a profile.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ProfileValue {
    Int(i32),
    Str(String),
}

/// Session settings read from a YAML file. Command-line options win.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionProfile {
    #[serde(default)]
    pub codec: Option<String>,
    #[serde(default)]
    pub mime: Option<String>,
    #[serde(default)]
    pub width: Option<i32>,
    #[serde(default)]
    pub height: Option<i32>,
    #[serde(default)]
    pub rotation: Option<i32>,
    #[serde(default)]
    pub fps: Option<f64>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Extra format entries, applied after the standard keys.
    #[serde(default)]
    pub format: BTreeMap<String, ProfileValue>,
}

impl SessionProfile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read profile {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid profile {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(text)?)
    }
}

/// Everything `decode` needs after merging the profile and the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeSettings {
    pub session: SessionConfig,
    pub fps: f64,
    pub timeout: Duration,
}

impl DecodeSettings {
    pub fn resolve(args: &DecodeArgs, profile: SessionProfile) -> Result<Self> {
        let Some(codec) = args.codec.clone().or(profile.codec) else {
            bail!("No codec given: pass --codec or set `codec` in the profile");
        };
        let Some(mime) = args.mime.clone().or(profile.mime) else {
            bail!("No mime type given: pass --mime or set `mime` in the profile");
        };
        let (Some(width), Some(height)) = (
            args.width.or(profile.width),
            args.height.or(profile.height),
        ) else {
            bail!("No picture size given: pass --width and --height or set them in the profile");
        };
        if width <= 0 || height <= 0 {
            bail!("Picture size must be positive, got {width}x{height}");
        }

        let fps = args.fps.or(profile.fps).unwrap_or(DEFAULT_FPS);
        if !(fps.is_finite() && fps > 0.0) {
            bail!("Frame rate must be positive, got {fps}");
        }
        let timeout_ms = args
            .timeout_ms
            .or(profile.timeout_ms)
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        let mut session = SessionConfig::new(codec, mime, width, height)
            .with_rotation(args.rotation.or(profile.rotation).unwrap_or(0));
        for (key, value) in profile.format {
            session = match value {
                ProfileValue::Int(v) => session.with_i32(key, v),
                ProfileValue::Str(s) => session.with_string(key, s),
            };
        }

        Ok(Self {
            session,
            fps,
            timeout: Duration::from_millis(timeout_ms),
        })
    }

    /// Presentation time of the `frame`-th picture.
    pub fn pts_us(&self, frame: u64) -> i64 {
        (frame as f64 * 1_000_000.0 / self.fps).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::command::Cli;
    use clap::Parser;
    use mediacodec::FormatValue;

    fn decode_args(argv: &[&str]) -> DecodeArgs {
        let cli = Cli::parse_from(
            ["mediacodecd", "decode", "in.264"]
                .iter()
                .chain(argv)
                .copied(),
        );
        match cli.command {
            crate::cli::command::Commands::Decode(args) => args,
            _ => unreachable!(),
        }
    }

    const PROFILE: &str = "
codec: c2.qti.avc.decoder
mime: video/avc
width: 1920
height: 1080
fps: 25
format:
  max-input-size: 1048576
  language: und
";

    #[test]
    fn profile_fills_what_the_command_line_omits() -> Result<()> {
        let profile = SessionProfile::parse(PROFILE)?;
        let settings = DecodeSettings::resolve(&decode_args(&["--width", "1280"]), profile)?;

        assert_eq!(settings.session.codec_name, "c2.qti.avc.decoder");
        assert_eq!(settings.session.width, 1280);
        assert_eq!(settings.session.height, 1080);
        assert_eq!(settings.fps, 25.0);
        assert_eq!(settings.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
        assert_eq!(
            settings.session.extra,
            [
                ("language".to_string(), FormatValue::Str("und".into())),
                ("max-input-size".to_string(), FormatValue::Int(1_048_576)),
            ]
        );
        assert_eq!(settings.pts_us(1), 40_000);
        Ok(())
    }

    #[test]
    fn missing_codec_is_an_error() {
        let args = decode_args(&["--mime", "video/avc", "--width", "64", "--height", "64"]);
        let err = DecodeSettings::resolve(&args, SessionProfile::default()).unwrap_err();
        assert!(err.to_string().contains("--codec"));
    }

    #[test]
    fn unknown_profile_keys_are_rejected() {
        assert!(SessionProfile::parse("codec: x\nbitrate: 5\n").is_err());
    }

    #[test]
    fn default_rate_timestamps() -> Result<()> {
        let args = decode_args(&[
            "--codec", "c2.android.avc.decoder", "--mime", "video/avc", "--width", "320",
            "--height", "240",
        ]);
        let settings = DecodeSettings::resolve(&args, SessionProfile::default())?;
        assert_eq!(settings.pts_us(0), 0);
        assert_eq!(settings.pts_us(1), 33_333);
        assert_eq!(settings.pts_us(30), 1_000_000);
        Ok(())
    }
}
