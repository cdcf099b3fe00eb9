//! Runs the external GRIB2 decoder over a downloaded run.
//!
//! The decoder is invoked as `<command...> <raw_dir> <processed_dir>` and
//! must leave `cell_id,forecast_datetime,parameter,value` CSV files in the
//! processed directory.

use std::path::Path;

use tokio::process::Command;
use tracing::{info, instrument};

use kairos_common::RunId;

use crate::error::{IngestError, IngestResult};
use crate::sources::{processed_dir, raw_dir};

#[instrument(skip(data_dir), fields(run = %run))]
pub async fn process_run(decoder: &str, data_dir: &Path, run: &RunId) -> IngestResult<usize> {
    let mut parts = decoder.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| IngestError::Decoder("no decoder command configured".to_string()))?;

    let input = raw_dir(data_dir, run);
    let output = processed_dir(data_dir, run);
    if !input.is_dir() {
        return Err(IngestError::Decoder(format!(
            "no downloaded data at {}",
            input.display()
        )));
    }
    tokio::fs::create_dir_all(&output)
        .await
        .map_err(|e| IngestError::io(&output, e))?;

    info!(decoder = %program, input = %input.display(), "Running decoder");
    let result = Command::new(program)
        .args(parts)
        .arg(&input)
        .arg(&output)
        .output()
        .await
        .map_err(|e| IngestError::Decoder(format!("failed to start {}: {}", program, e)))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(IngestError::Decoder(format!(
            "{} exited with {}: {}",
            program,
            result.status,
            stderr.trim()
        )));
    }

    let produced = csv_files(&output)?.len();
    info!(csv_files = produced, "Decoder finished");
    Ok(produced)
}

/// CSV files directly inside `dir`, sorted by name.
pub fn csv_files(dir: &Path) -> IngestResult<Vec<std::path::PathBuf>> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| IngestError::io(dir, e.into()))?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "csv") {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}
