use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use indicatif::ProgressBar;

use mediacodec::{OutputFormat, SessionConfig};

use super::output::{DecodeReport, FormatRecord};
use crate::timestamp::time_str;

/// Collects decoder output: picture bytes go to a file, formats to the report.
pub struct DecodeHandler {
    pictures_path: PathBuf,
    writer: Option<BufWriter<File>>,
    pub frames: u64,
    pub bytes: u64,
    pub end_of_stream: bool,
    last_pts_us: Option<i64>,
    formats: Vec<FormatRecord>,
}

impl DecodeHandler {
    pub fn new(pictures_path: PathBuf) -> Self {
        Self {
            pictures_path,
            writer: None,
            frames: 0,
            bytes: 0,
            end_of_stream: false,
            last_pts_us: None,
            formats: Vec::new(),
        }
    }

    pub fn handle_format(&mut self, format: &OutputFormat, pb: &Option<ProgressBar>) {
        log::info!(
            "Output format: {}x{} (visible {}x{}), stride {}, slice height {}, color format {}",
            format.width,
            format.height,
            format.visible_width(),
            format.visible_height(),
            format.stride,
            format.slice_height,
            format.pixel_format
        );
        if let Some(pb) = pb {
            pb.set_message(format!("{}x{}", format.width, format.height));
        }
        self.formats.push(FormatRecord::new(self.frames, format));
    }

    /// Records one output buffer; `payload` is absent on surface output.
    pub fn handle_frame(
        &mut self,
        pts_us: i64,
        payload: Option<&[u8]>,
        end_of_stream: bool,
    ) -> Result<()> {
        if end_of_stream {
            log::debug!("End of stream reached at {}", time_str(pts_us));
            self.end_of_stream = true;
        }

        let Some(payload) = payload.filter(|payload| !payload.is_empty()) else {
            return Ok(());
        };

        if self.writer.is_none() {
            let file = File::create(&self.pictures_path).with_context(|| {
                format!("Cannot create output {}", self.pictures_path.display())
            })?;
            log::info!("Writing pictures to {}", self.pictures_path.display());
            self.writer = Some(BufWriter::new(file));
        }
        if let Some(writer) = self.writer.as_mut() {
            writer.write_all(payload)?;
        }

        if let Some(last) = self.last_pts_us {
            if pts_us < last {
                log::debug!("Output out of order: {pts_us} us after {last} us");
            }
        }
        self.last_pts_us = Some(pts_us);
        self.frames += 1;
        self.bytes += payload.len() as u64;
        Ok(())
    }

    pub fn last_pts_us(&self) -> Option<i64> {
        self.last_pts_us
    }

    pub fn finalize(
        &mut self,
        config: &SessionConfig,
        access_units: u64,
        skipped_access_units: u64,
    ) -> Result<DecodeReport> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        Ok(DecodeReport {
            codec: config.codec_name.clone(),
            mime: config.mime.clone(),
            width: config.width,
            height: config.height,
            access_units,
            skipped_access_units,
            frames: self.frames,
            bytes: self.bytes,
            end_of_stream: self.end_of_stream,
            formats: std::mem::take(&mut self.formats),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pictures_are_appended_and_counted() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("mediacodecd-handler-{}", std::process::id()));
        std::fs::create_dir_all(&dir)?;
        let path = dir.join("pictures.yuv");

        let mut handler = DecodeHandler::new(path.clone());
        let format = OutputFormat {
            width: 4,
            height: 2,
            ..OutputFormat::default()
        };
        handler.handle_format(&format, &None);
        handler.handle_frame(0, Some(&[1u8; 12][..]), false)?;
        handler.handle_frame(33_333, None, false)?;
        handler.handle_frame(66_667, Some(&[2u8; 12][..]), true)?;

        let config = SessionConfig::new("c2.android.avc.decoder", "video/avc", 4, 2);
        let report = handler.finalize(&config, 3, 0)?;
        assert_eq!(report.frames, 2);
        assert_eq!(report.bytes, 24);
        assert!(report.end_of_stream);
        assert_eq!(report.formats, [FormatRecord::new(0, &format)]);

        let written = std::fs::read(&path)?;
        assert_eq!(written.len(), 24);
        assert_eq!(&written[12..], &[2u8; 12][..]);
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }
}
