//! ICON-EU ingestion pipeline for Kairos.
//!
//! Download a model run from the DWD open-data server, hand it to an
//! external decoder that writes per-cell CSV, import the CSV as forecast
//! tiles, and prune data outside the retention window.

pub mod cleanup;
pub mod download;
pub mod error;
pub mod import;
pub mod process;
pub mod sources;

use std::path::PathBuf;
use std::str::FromStr;

use chrono::Utc;
use tracing::{error, info};

use kairos_common::RunId;
use storage::TileStore;

pub use cleanup::{cleanup, CleanupSummary};
pub use download::{DownloadConfig, DownloadSummary, Downloader};
pub use error::{IngestError, IngestResult};
pub use import::{import_run, ImportSummary};
pub use process::process_run;

/// Which pipeline stages to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Download,
    Process,
    Import,
    All,
}

impl Mode {
    pub fn downloads(self) -> bool {
        matches!(self, Mode::Download | Mode::All)
    }

    pub fn processes(self) -> bool {
        matches!(self, Mode::Process | Mode::All)
    }

    pub fn imports(self) -> bool {
        matches!(self, Mode::Import | Mode::All)
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "download" => Ok(Mode::Download),
            "process" => Ok(Mode::Process),
            "import" => Ok(Mode::Import),
            "all" => Ok(Mode::All),
            other => Err(format!(
                "unknown mode '{}', expected download, process, import or all",
                other
            )),
        }
    }
}

/// Resolved settings for one pipeline invocation.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub mode: Mode,
    pub run: RunId,
    pub data_dir: PathBuf,
    pub download: DownloadConfig,
    pub decoder: Option<String>,
    /// Retention window when cleanup is requested.
    pub keep_hours: Option<i64>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PipelineReport {
    pub download: Option<DownloadSummary>,
    pub processed_files: Option<usize>,
    pub import: Option<ImportSummary>,
    pub cleanup: Option<CleanupSummary>,
}

/// Run the configured stages in order. A stage failure stops the stages
/// after it; cleanup still runs.
pub async fn run_pipeline(
    config: &PipelineConfig,
    tiles: Option<&dyn TileStore>,
) -> IngestResult<PipelineReport> {
    let mut report = PipelineReport::default();
    info!(mode = ?config.mode, run = %config.run, "Starting ingestion");

    let stages = run_stages(config, tiles, &mut report).await;
    if let Err(e) = &stages {
        error!(run = %config.run, error = %e, "Ingestion stage failed");
    }

    if let Some(keep_hours) = config.keep_hours {
        report.cleanup = Some(cleanup(tiles, &config.data_dir, keep_hours, Utc::now()).await);
    }

    stages.map(|()| report)
}

async fn run_stages(
    config: &PipelineConfig,
    tiles: Option<&dyn TileStore>,
    report: &mut PipelineReport,
) -> IngestResult<()> {
    if config.mode.downloads() {
        let downloader = Downloader::new(config.download.clone())?;
        report.download = Some(downloader.download_run(&config.data_dir, &config.run).await?);
    }

    if config.mode.processes() {
        let decoder = config.decoder.as_deref().ok_or_else(|| {
            IngestError::Decoder("process mode needs --decoder".to_string())
        })?;
        report.processed_files = Some(process_run(decoder, &config.data_dir, &config.run).await?);
    }

    if config.mode.imports() {
        let tiles = tiles.ok_or_else(|| {
            IngestError::Store(kairos_common::KairosError::InternalError(
                "import needs a database connection".to_string(),
            ))
        })?;
        report.import = Some(import_run(tiles, &config.data_dir, &config.run).await?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("ALL".parse::<Mode>().unwrap(), Mode::All);
        assert_eq!(" import ".parse::<Mode>().unwrap(), Mode::Import);
        assert!("upload".parse::<Mode>().is_err());
    }

    #[test]
    fn test_mode_stages() {
        assert!(Mode::All.downloads() && Mode::All.processes() && Mode::All.imports());
        assert!(Mode::Import.imports());
        assert!(!Mode::Import.downloads());
        assert!(!Mode::Download.processes());
    }
}
