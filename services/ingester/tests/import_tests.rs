//! End-to-end import of decoder output into an in-memory tile store.

use std::path::Path;
use std::time::Duration as StdDuration;

use chrono::{Duration, NaiveDate, TimeZone, Utc};

use ingester::sources::processed_dir;
use ingester::{run_pipeline, DownloadConfig, Mode, PipelineConfig};
use kairos_common::RunId;
use storage::TileStore;
use test_utils::InMemoryStore;

fn run() -> RunId {
    RunId::new(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(), 6).unwrap()
}

fn config(mode: Mode, data_dir: &Path) -> PipelineConfig {
    PipelineConfig {
        mode,
        run: run(),
        data_dir: data_dir.to_path_buf(),
        download: DownloadConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            variables: Vec::new(),
            workers: 1,
            request_timeout: StdDuration::from_secs(1),
        },
        decoder: None,
        keep_hours: None,
    }
}

fn write_processed(data_dir: &Path, name: &str, contents: &str) {
    let dir = processed_dir(data_dir, &run());
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), contents).unwrap();
}

#[tokio::test]
async fn test_import_merges_per_variable_files() {
    let data = tempfile::tempdir().unwrap();
    write_processed(
        data.path(),
        "t_2m.csv",
        "cell_id,forecast_datetime,parameter,value\n\
         1,2024-06-15 09:00:00,T_2M,293.15\n\
         1,2024-06-15 10:00:00,T_2M,294.15\n\
         2,2024-06-15 09:00:00,T_2M,288.15\n",
    );
    write_processed(
        data.path(),
        "wind.csv",
        "cell_id,forecast_datetime,parameter,value\n\
         1,2024-06-15T09:00:00Z,U_10M,0.0\n\
         1,2024-06-15T09:00:00Z,V_10M,-4.0\n\
         1,bad,V_10M,-4.0\n",
    );

    let store = InMemoryStore::new();
    let report = run_pipeline(&config(Mode::Import, data.path()), Some(&store))
        .await
        .unwrap();

    let import = report.import.unwrap();
    assert_eq!(import.files, 2);
    assert_eq!(import.rows, 5);
    assert_eq!(import.skipped_rows, 1);
    assert_eq!(import.tiles, 3);
    assert!(report.download.is_none());
    assert_eq!(store.tile_count().await, 3);

    let at = Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap();
    let tiles = store
        .tiles_in_range(1, at, at + Duration::minutes(30))
        .await
        .unwrap();
    assert_eq!(tiles.len(), 1);
    let data = &tiles[0].forecast_data;
    assert_eq!(data["t_2m"], 293.15);
    assert_eq!(data["u_10m"], 0.0);
    assert_eq!(data["v_10m"], -4.0);
    assert_eq!(tiles[0].run(), run());
}

#[tokio::test]
async fn test_reimport_is_idempotent() {
    let data = tempfile::tempdir().unwrap();
    write_processed(
        data.path(),
        "t_2m.csv",
        "cell_id,forecast_datetime,parameter,value\n1,2024-06-15 09:00:00,T_2M,293.15\n",
    );

    let store = InMemoryStore::new();
    let cfg = config(Mode::Import, data.path());
    run_pipeline(&cfg, Some(&store)).await.unwrap();
    run_pipeline(&cfg, Some(&store)).await.unwrap();

    assert_eq!(store.tile_count().await, 1);
}

#[tokio::test]
async fn test_import_in_batches() {
    let data = tempfile::tempdir().unwrap();
    let mut csv = String::from("cell_id,forecast_datetime,parameter,value\n");
    let start = Utc.with_ymd_and_hms(2024, 6, 15, 6, 0, 0).unwrap();
    for cell in 1..=3 {
        for hour in 0..120 {
            let at = start + Duration::hours(hour);
            csv.push_str(&format!(
                "{},{},t_2m,290.0\n",
                cell,
                at.format("%Y-%m-%d %H:%M:%S")
            ));
        }
    }
    write_processed(data.path(), "all.csv", &csv);

    let store = InMemoryStore::new();
    let report = run_pipeline(&config(Mode::Import, data.path()), Some(&store))
        .await
        .unwrap();

    assert_eq!(report.import.unwrap().tiles, 360);
    assert_eq!(store.tile_count().await, 360);
}

#[tokio::test]
async fn test_import_without_store_fails() {
    let data = tempfile::tempdir().unwrap();
    write_processed(data.path(), "t.csv", "cell_id,forecast_datetime,parameter,value\n");

    let result = run_pipeline(&config(Mode::Import, data.path()), None).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_process_without_decoder_fails() {
    let data = tempfile::tempdir().unwrap();
    let result = run_pipeline(&config(Mode::Process, data.path()), None).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_cleanup_prunes_tiles_and_runs() {
    let data = tempfile::tempdir().unwrap();
    let store = test_utils::fixtures::greece(Utc::now() - Duration::hours(100));
    let before = store.tile_count().await;
    let stale = data.path().join("ICON-EU").join("2001010100");
    std::fs::create_dir_all(&stale).unwrap();

    let mut cfg = config(Mode::Download, data.path());
    cfg.keep_hours = Some(72);
    // No files to fetch; only cleanup does work.
    let report = run_pipeline(&cfg, Some(&store)).await.unwrap();

    let cleanup = report.cleanup.unwrap();
    // The 2024 run directory created by the download stage is past retention too.
    assert_eq!(cleanup.directories_removed, 2);
    assert!(!stale.exists());
    assert!(cleanup.tiles_deleted > 0);
    assert_eq!(store.tile_count().await, before - cleanup.tiles_deleted as usize);
}
