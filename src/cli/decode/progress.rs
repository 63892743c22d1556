use std::path::Path;

use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::annexb::{AccessUnitSplitter, StreamKind};
use crate::input::{CHUNK_SIZE, InputReader};

/// Counts the access units in `input_path` with a full pre-scan.
pub fn estimate_total_units(input_path: &Path, kind: StreamKind) -> Result<u64> {
    log::info!("Counting access units for progress estimation");
    let count_start = std::time::Instant::now();

    let mut input_reader = InputReader::new(input_path)?;
    let mut splitter = AccessUnitSplitter::new(kind);
    let mut units = 0u64;

    input_reader.process_chunks(CHUNK_SIZE, |chunk| {
        splitter.push_bytes(chunk);
        units += splitter.by_ref().count() as u64;
        Ok(true)
    })?;
    splitter.finish();
    units += splitter.count() as u64;

    let count_elapsed = count_start.elapsed();
    let bytes_read = input_reader.bytes_read();
    let read_speed_mbps = if count_elapsed.as_secs_f64() > 0.0 {
        (bytes_read as f64) / 1_000_000.0 / count_elapsed.as_secs_f64()
    } else {
        0.0
    };

    log::info!(
        "Found {units} access units in {:.3}s ({:.1} MB/s, {} bytes)",
        count_elapsed.as_secs_f64(),
        read_speed_mbps,
        bytes_read
    );

    Ok(units)
}

pub fn create_progress_bar(multi: &MultiProgress, total_units: Option<u64>) -> Result<ProgressBar> {
    let pb = if let Some(total) = total_units {
        let pb = multi.add(ProgressBar::new(total));
        pb.set_style(ProgressStyle::with_template(
            "{bar:40.cyan/blue} {pos}/{len} access units ({percent}%)\n{msg} | elapsed: {elapsed_precise} | ETA: {eta_precise}",
        )?);

        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    } else {
        let pb = multi.add(ProgressBar::new_spinner());
        pb.set_style(ProgressStyle::with_template(
            "{spinner:.green} {pos} access units\n{msg} | elapsed: {elapsed_precise}",
        )?);

        pb
    };
    pb.set_message("starting codec");
    Ok(pb)
}
