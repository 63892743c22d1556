use std::ffi::OsString;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use mediacodec::OutputFormat;

pub fn create_path_with_suffix(base_path: &Path, suffix: &str) -> PathBuf {
    let mut name = base_path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("output"));
    name.push(".");
    name.push(suffix);
    base_path.with_file_name(name)
}

pub fn create_path_with_extension(base_path: &Path, expected_ext: &str) -> PathBuf {
    match base_path.extension() {
        Some(existing_ext) if existing_ext == expected_ext => base_path.to_path_buf(),
        Some(_) => create_path_with_suffix(base_path, expected_ext),
        None => base_path.with_extension(expected_ext),
    }
}

/// Where decoded pictures and the report go, derived from `--output-path`
/// or, failing that, from the input path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub pictures: PathBuf,
    pub report: PathBuf,
}

impl OutputPaths {
    pub fn new(output_path: Option<&Path>, input: &Path) -> Self {
        let base = match output_path {
            Some(path) => path.to_path_buf(),
            None if crate::input::is_pipe(input) => PathBuf::from("output"),
            None => input.with_extension(""),
        };
        let stem = match base.extension() {
            Some(ext) if ext == "yuv" => base.with_extension(""),
            _ => base,
        };

        Self {
            pictures: create_path_with_extension(&stem, "yuv"),
            report: create_path_with_suffix(&stem, "report.yaml"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatRecord {
    /// Pictures received before this format took effect.
    pub after_frames: u64,
    pub width: i32,
    pub height: i32,
    pub stride: i32,
    pub slice_height: i32,
    pub color_format: i32,
    /// Left, top, right, bottom (inclusive).
    pub crop: [i32; 4],
}

impl FormatRecord {
    pub fn new(after_frames: u64, format: &OutputFormat) -> Self {
        Self {
            after_frames,
            width: format.width,
            height: format.height,
            stride: format.stride,
            slice_height: format.slice_height,
            color_format: format.pixel_format,
            crop: [
                format.crop_left,
                format.crop_top,
                format.crop_right,
                format.crop_bottom,
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodeReport {
    pub codec: String,
    pub mime: String,
    pub width: i32,
    pub height: i32,
    pub access_units: u64,
    pub skipped_access_units: u64,
    pub frames: u64,
    pub bytes: u64,
    pub end_of_stream: bool,
    pub formats: Vec<FormatRecord>,
}

impl DecodeReport {
    pub fn write(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Cannot create report {}", path.display()))?;
        serde_yaml_ng::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_the_input_name() {
        let paths = OutputPaths::new(None, Path::new("clips/test.264"));
        assert_eq!(paths.pictures, PathBuf::from("clips/test.yuv"));
        assert_eq!(paths.report, PathBuf::from("clips/test.report.yaml"));

        let paths = OutputPaths::new(None, Path::new("-"));
        assert_eq!(paths.pictures, PathBuf::from("output.yuv"));

        let paths = OutputPaths::new(Some(Path::new("out/frames.yuv")), Path::new("-"));
        assert_eq!(paths.pictures, PathBuf::from("out/frames.yuv"));
        assert_eq!(paths.report, PathBuf::from("out/frames.report.yaml"));

        let paths = OutputPaths::new(Some(Path::new("out/run.v1")), Path::new("-"));
        assert_eq!(paths.pictures, PathBuf::from("out/run.v1.yuv"));
    }

    #[test]
    fn report_serializes_format_history() -> Result<()> {
        let format = OutputFormat {
            width: 1920,
            height: 1088,
            stride: 1920,
            slice_height: 1088,
            pixel_format: 21,
            crop_left: 0,
            crop_top: 0,
            crop_right: 1919,
            crop_bottom: 1079,
        };
        let report = DecodeReport {
            codec: "c2.android.avc.decoder".into(),
            mime: "video/avc".into(),
            width: 1920,
            height: 1080,
            access_units: 3,
            skipped_access_units: 0,
            frames: 2,
            bytes: 6_266_880,
            end_of_stream: true,
            formats: vec![FormatRecord::new(0, &format)],
        };

        let yaml = serde_yaml_ng::to_string(&report)?;
        assert!(yaml.contains("codec: c2.android.avc.decoder"));
        assert!(yaml.contains("frames: 2"));
        assert!(yaml.contains("color_format: 21"));
        Ok(())
    }
}
