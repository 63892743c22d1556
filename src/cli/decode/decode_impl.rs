use anyhow::{Context, Result, bail};
use indicatif::{MultiProgress, ProgressBar};

use mediacodec::{CodecApi, OutputEvent, Session, Submission, Timeout, ndk};

use super::handler::DecodeHandler;
use super::output::OutputPaths;
use super::progress::{create_progress_bar, estimate_total_units};
use crate::annexb::{AccessUnit, AccessUnitSplitter, StreamKind};
use crate::cli::command::{Cli, DecodeArgs};
use crate::input::{self, CHUNK_SIZE, InputReader};
use crate::profile::{DecodeSettings, SessionProfile};
use crate::timestamp::time_str;

/// Dequeue attempts for one access unit before giving up on the codec.
const MAX_INPUT_ATTEMPTS: usize = 200;
/// Empty output polls tolerated while draining after end of stream.
const MAX_EMPTY_DRAIN_POLLS: usize = 100;

pub fn cmd_decode(args: &DecodeArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let profile = match &args.profile {
        Some(path) => {
            log::info!("Loading session profile: {}", path.display());
            SessionProfile::load(path)?
        }
        None => SessionProfile::default(),
    };
    let settings = DecodeSettings::resolve(args, profile)?;

    let Some(kind) = StreamKind::from_mime(&settings.session.mime) else {
        bail!(
            "Unsupported mime type {} (expected video/avc or video/hevc)",
            settings.session.mime
        );
    };

    log::info!(
        "Decoding {}: {} {}x{} with {} (strict mode: {})",
        args.input.display(),
        settings.session.mime,
        settings.session.width,
        settings.session.height,
        settings.session.codec_name,
        cli.strict
    );

    let is_pipe = input::is_pipe(&args.input);
    let paths = OutputPaths::new(args.output_path.as_deref(), &args.input);

    let should_estimate = !args.no_estimate_progress && !is_pipe && multi.is_some();
    let total_units = if should_estimate {
        Some(estimate_total_units(&args.input, kind)?)
    } else {
        if is_pipe {
            log::debug!("Skipping progress estimation for pipe input");
        } else if args.no_estimate_progress {
            log::debug!("Progress estimation disabled by --no-estimate-progress flag");
        }
        None
    };

    let pb = match multi {
        Some(multi) => Some(create_progress_bar(multi, total_units)?),
        None => None,
    };

    let session = ndk::start_session(&settings.session, None)
        .with_context(|| format!("Cannot start codec {}", settings.session.codec_name))?;

    let mut pump = Pump {
        session: &session,
        settings: &settings,
        timeout: Timeout::from(settings.timeout),
        strict: cli.strict,
        handler: DecodeHandler::new(paths.pictures.clone()),
        pb: pb.clone(),
        frames_submitted: 0,
        units_submitted: 0,
        units_skipped: 0,
    };

    let start_time = std::time::Instant::now();
    let result = run(&mut pump, &args.input, kind);
    if let Err(e) = result {
        if let Some(pb) = &pb {
            pb.finish_with_message("decode failed");
        }
        return Err(e);
    }

    let report = pump.handler.finalize(
        &settings.session,
        pump.units_submitted,
        pump.units_skipped,
    )?;
    report.write(&paths.report)?;
    log::info!("Report written to {}", paths.report.display());

    if let Some(pb) = &pb {
        let elapsed = start_time.elapsed().as_secs_f64();
        let fps = if elapsed > 0.0 {
            report.frames as f64 / elapsed
        } else {
            0.0
        };
        pb.finish_with_message(format!(
            "{} frames | {fps:.1} fps | timestamp: {}",
            report.frames,
            time_str(pump.handler.last_pts_us().unwrap_or(0))
        ));
    }

    if !report.end_of_stream {
        log::warn!("Codec did not signal end of stream; output may be incomplete");
    }
    log::info!(
        "Decoding completed: {} access units in, {} frames out ({} bytes)",
        report.access_units,
        report.frames,
        report.bytes
    );
    Ok(())
}

fn run<A: CodecApi>(pump: &mut Pump<'_, A>, input: &std::path::Path, kind: StreamKind) -> Result<()> {
    let mut reader = InputReader::new(input)?;
    if reader.is_pipe() {
        log::debug!("Reading elementary stream from stdin");
    }
    let mut splitter = AccessUnitSplitter::new(kind);

    reader.process_chunks(CHUNK_SIZE, |chunk| {
        splitter.push_bytes(chunk);
        for unit in splitter.by_ref() {
            pump.submit(&unit)?;
        }
        Ok(true)
    })?;

    splitter.finish();
    for unit in splitter.by_ref() {
        pump.submit(&unit)?;
    }
    if splitter.malformed() > 0 {
        log::warn!("Skipped {} malformed NAL units", splitter.malformed());
    }

    pump.finish()
}

/// Moves access units into a session and decoded pictures out of it.
struct Pump<'s, A: CodecApi> {
    session: &'s Session<A>,
    settings: &'s DecodeSettings,
    timeout: Timeout,
    strict: bool,
    handler: DecodeHandler,
    pb: Option<ProgressBar>,
    frames_submitted: u64,
    units_submitted: u64,
    units_skipped: u64,
}

impl<A: CodecApi> Pump<'_, A> {
    fn submit(&mut self, unit: &AccessUnit) -> Result<()> {
        let pts_us = if unit.config {
            0
        } else {
            self.settings.pts_us(self.frames_submitted)
        };

        for _ in 0..MAX_INPUT_ATTEMPTS {
            match self
                .session
                .submit_input(&unit.data, pts_us, unit.config, self.timeout)
            {
                Ok(Submission::Submitted { len }) => {
                    if len < unit.data.len() {
                        log::warn!(
                            "Access unit at {} truncated from {} to {len} bytes",
                            time_str(pts_us),
                            unit.data.len()
                        );
                    }
                    if !unit.config {
                        self.frames_submitted += 1;
                    }
                    self.units_submitted += 1;
                    if let Some(pb) = &self.pb {
                        pb.inc(1);
                    }
                    return self.drain(Timeout::NONE);
                }
                // output has to move before input slots free up
                Ok(Submission::NotReady) => self.drain(Timeout::NONE)?,
                Err(e) if self.strict => return Err(e.into()),
                Err(e) => {
                    log::warn!("Skipping access unit at {}: {e}", time_str(pts_us));
                    self.units_skipped += 1;
                    if let Some(pb) = &self.pb {
                        pb.inc(1);
                    }
                    return Ok(());
                }
            }
        }

        bail!("Codec accepted no input for {MAX_INPUT_ATTEMPTS} attempts");
    }

    /// Retrieves output until the codec has nothing more within `timeout`.
    fn drain(&mut self, timeout: Timeout) -> Result<()> {
        loop {
            match self.session.retrieve_output(timeout)? {
                OutputEvent::Data(buffer) => {
                    self.handler.handle_frame(
                        buffer.presentation_time_us(),
                        buffer.payload(),
                        buffer.is_end_of_stream(),
                    )?;
                    buffer.release(false)?;
                }
                OutputEvent::FormatChanged(format) => self.handler.handle_format(&format, &self.pb),
                OutputEvent::NotReady => return Ok(()),
            }
            if self.handler.end_of_stream {
                return Ok(());
            }
        }
    }

    fn finish(&mut self) -> Result<()> {
        let pts_us = self.settings.pts_us(self.frames_submitted);
        let mut queued = false;
        for _ in 0..MAX_INPUT_ATTEMPTS {
            if let Submission::Submitted { .. } =
                self.session.submit_end_of_stream(pts_us, self.timeout)?
            {
                queued = true;
                break;
            }
            self.drain(Timeout::NONE)?;
        }
        if !queued {
            bail!("Codec accepted no end-of-stream buffer");
        }

        if let Some(pb) = &self.pb {
            pb.set_message("draining");
        }
        let mut empty_polls = 0;
        while !self.handler.end_of_stream && empty_polls < MAX_EMPTY_DRAIN_POLLS {
            let frames = self.handler.frames;
            self.drain(self.timeout)?;
            if self.handler.frames == frames {
                empty_polls += 1;
            } else {
                empty_polls = 0;
            }
        }
        Ok(())
    }
}
