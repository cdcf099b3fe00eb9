//! Concurrent download of a run's GRIB2 files.
//!
//! Files already on disk are skipped, each transfer streams into a
//! `.partial` file that is renamed on completion, and a failed file is
//! logged without aborting the run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::{Client, StatusCode};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use kairos_common::RunId;

use crate::error::{IngestError, IngestResult};
use crate::sources::{raw_dir, run_files, RemoteFile};

#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub base_url: String,
    pub variables: Vec<String>,
    /// Concurrent transfers.
    pub workers: usize,
    pub request_timeout: Duration,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

enum Outcome {
    Downloaded,
    Skipped,
    Failed,
}

pub struct Downloader {
    client: Client,
    config: DownloadConfig,
}

impl Downloader {
    pub fn new(config: DownloadConfig) -> IngestResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(config.workers.max(1))
            .build()?;

        Ok(Self { client, config })
    }

    /// Fetch every file of `run` into `<data_dir>/ICON-EU/<run>/`.
    #[instrument(skip(self, data_dir), fields(run = %run))]
    pub async fn download_run(&self, data_dir: &Path, run: &RunId) -> IngestResult<DownloadSummary> {
        let dir = raw_dir(data_dir, run);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| IngestError::io(&dir, e))?;

        let files = run_files(&self.config.base_url, &self.config.variables, run);
        info!(files = files.len(), dir = %dir.display(), "Starting run download");

        let outcomes: Vec<Outcome> = stream::iter(files)
            .map(|file| self.fetch(file, &dir))
            .buffer_unordered(self.config.workers.max(1))
            .collect()
            .await;

        let mut summary = DownloadSummary::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Downloaded => summary.downloaded += 1,
                Outcome::Skipped => summary.skipped += 1,
                Outcome::Failed => summary.failed += 1,
            }
        }

        info!(
            downloaded = summary.downloaded,
            skipped = summary.skipped,
            failed = summary.failed,
            "Run download finished"
        );
        Ok(summary)
    }

    async fn fetch(&self, file: RemoteFile, dir: &Path) -> Outcome {
        let target = dir.join(&file.file_name);
        if fs::try_exists(&target).await.unwrap_or(false) {
            debug!(file = %file.file_name, "Already downloaded");
            return Outcome::Skipped;
        }

        match self.download_file(&file.url, &target).await {
            Ok(bytes) => {
                debug!(variable = %file.variable, step = file.step, bytes, "Downloaded");
                Outcome::Downloaded
            }
            Err(e) => {
                warn!(variable = %file.variable, step = file.step, error = %e, "Download failed");
                Outcome::Failed
            }
        }
    }

    async fn download_file(&self, url: &str, target: &Path) -> IngestResult<u64> {
        let response = self.client.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(IngestError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let partial = partial_path(target);
        let result = stream_to_file(response, &partial).await;
        match result {
            Ok(bytes) => {
                fs::rename(&partial, target)
                    .await
                    .map_err(|e| IngestError::io(target, e))?;
                Ok(bytes)
            }
            Err(e) => {
                let _ = fs::remove_file(&partial).await;
                Err(e)
            }
        }
    }
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

async fn stream_to_file(response: reqwest::Response, path: &Path) -> IngestResult<u64> {
    let mut file = fs::File::create(path)
        .await
        .map_err(|e| IngestError::io(path, e))?;

    let mut written = 0u64;
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)
            .await
            .map_err(|e| IngestError::io(path, e))?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(|e| IngestError::io(path, e))?;

    Ok(written)
}
