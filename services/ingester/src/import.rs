//! Loads decoder CSV output into forecast tiles.
//!
//! Rows of every CSV in a run directory are grouped by (cell, instant)
//! into one JSON payload keyed by lower-case parameter name, so a decoder
//! may split its output per variable without tiles overwriting each other.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use kairos_common::{NewForecastTile, RunId};
use storage::TileStore;

use crate::error::{IngestError, IngestResult};
use crate::process::csv_files;
use crate::sources::processed_dir;

/// Tiles per upsert transaction.
pub const IMPORT_BATCH: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct CsvRecord {
    pub cell_id: i64,
    pub forecast_datetime: DateTime<Utc>,
    pub parameter: String,
    pub value: f64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub files: usize,
    pub rows: usize,
    pub skipped_rows: usize,
    pub tiles: usize,
}

/// RFC 3339, then naive `T`- and space-separated forms read as UTC.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

struct Columns {
    cell_id: usize,
    datetime: usize,
    parameter: usize,
    value: usize,
    width: usize,
}

impl Columns {
    fn from_header(header: &str, file: &Path) -> IngestResult<Self> {
        let names: Vec<&str> = header.split(',').map(str::trim).collect();
        let find = |wanted: &[&str]| {
            names
                .iter()
                .position(|n| wanted.contains(n))
                .ok_or_else(|| IngestError::Csv {
                    file: file.to_path_buf(),
                    message: format!("missing column {}", wanted[0]),
                })
        };

        Ok(Self {
            cell_id: find(&["cell_id"])?,
            datetime: find(&["forecast_datetime"])?,
            parameter: find(&["parameter", "parameter_name"])?,
            value: find(&["value"])?,
            width: names.len(),
        })
    }
}

/// Parse one decoder CSV. Malformed rows are skipped and counted.
pub fn parse_csv(text: &str, file: &Path) -> IngestResult<(Vec<CsvRecord>, usize)> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header = lines.next().ok_or_else(|| IngestError::Csv {
        file: file.to_path_buf(),
        message: "empty file".to_string(),
    })?;
    let columns = Columns::from_header(header, file)?;

    let mut records = Vec::new();
    let mut skipped = 0;
    for (index, line) in lines.enumerate() {
        match parse_row(line, &columns) {
            Some(record) => records.push(record),
            None => {
                debug!(file = %file.display(), row = index + 1, "Skipping malformed row");
                skipped += 1;
            }
        }
    }
    Ok((records, skipped))
}

fn parse_row(line: &str, columns: &Columns) -> Option<CsvRecord> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < columns.width {
        return None;
    }
    let value: f64 = fields[columns.value].parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    let parameter = fields[columns.parameter].to_lowercase();
    if parameter.is_empty() {
        return None;
    }

    Some(CsvRecord {
        cell_id: fields[columns.cell_id].parse().ok()?,
        forecast_datetime: parse_datetime(fields[columns.datetime])?,
        parameter,
        value,
    })
}

/// Group records into tiles of `run`, ordered by cell then instant.
pub fn group_records(records: Vec<CsvRecord>, run: &RunId) -> Vec<NewForecastTile> {
    let mut grouped: BTreeMap<(i64, DateTime<Utc>), Map<String, Value>> = BTreeMap::new();
    for record in records {
        grouped
            .entry((record.cell_id, record.forecast_datetime))
            .or_default()
            .insert(record.parameter, Value::from(record.value));
    }

    grouped
        .into_iter()
        .map(|((cell_id, forecast_datetime), forecast_data)| NewForecastTile {
            cell_id,
            run: run.clone(),
            forecast_datetime,
            forecast_data,
        })
        .collect()
}

/// Import every CSV under `<data_dir>/processed/<run>/`.
#[instrument(skip(tiles, data_dir), fields(run = %run))]
pub async fn import_run(
    tiles: &dyn TileStore,
    data_dir: &Path,
    run: &RunId,
) -> IngestResult<ImportSummary> {
    let dir = processed_dir(data_dir, run);
    let files = csv_files(&dir)?;
    if files.is_empty() {
        warn!(dir = %dir.display(), "No CSV files to import");
    }

    let mut summary = ImportSummary {
        files: files.len(),
        ..Default::default()
    };
    let mut records = Vec::new();
    for file in &files {
        let text = tokio::fs::read_to_string(file)
            .await
            .map_err(|e| IngestError::io(file, e))?;
        let (parsed, skipped) = parse_csv(&text, file)?;
        debug!(file = %file.display(), rows = parsed.len(), skipped, "Parsed CSV");
        summary.rows += parsed.len();
        summary.skipped_rows += skipped;
        records.extend(parsed);
    }

    let new_tiles = group_records(records, run);
    for batch in new_tiles.chunks(IMPORT_BATCH) {
        tiles.upsert_tiles(batch).await?;
        summary.tiles += batch.len();
    }

    info!(
        files = summary.files,
        rows = summary.rows,
        skipped_rows = summary.skipped_rows,
        tiles = summary.tiles,
        "Import finished"
    );
    Ok(summary)
}
