//! ICON-EU open-data file layout on the DWD server.

use std::path::{Path, PathBuf};

use kairos_common::RunId;

pub const MODEL: &str = "ICON-EU";

pub const DEFAULT_BASE_URL: &str = "https://opendata.dwd.de/weather/nwp/icon-eu/grib";

/// Single-level variables fetched for every run.
pub const VARIABLES: &[&str] = &[
    "t_2m",
    "relhum_2m",
    "u_10m",
    "v_10m",
    "pmsl",
    "tot_prec",
    "clct",
];

/// Forecast steps published per run: hourly to +78 h, then 3-hourly to +120 h.
pub fn forecast_steps() -> Vec<u32> {
    (0..=78).chain((81..=120).step_by(3)).collect()
}

/// A single remote GRIB2 file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub variable: String,
    pub step: u32,
    pub url: String,
    pub file_name: String,
}

pub fn file_name(variable: &str, run: &RunId, step: u32) -> String {
    format!(
        "icon-eu_europe_regular-lat-lon_single-level_{}_{:03}_{}.grib2.bz2",
        run.to_compact(),
        step,
        variable.to_uppercase()
    )
}

pub fn remote_file(base_url: &str, variable: &str, run: &RunId, step: u32) -> RemoteFile {
    let file_name = file_name(variable, run, step);
    let url = format!(
        "{}/{:02}/{}/{}",
        base_url.trim_end_matches('/'),
        run.cycle_hour(),
        variable,
        file_name
    );
    RemoteFile {
        variable: variable.to_string(),
        step,
        url,
        file_name,
    }
}

/// Every file of a run, variable-major.
pub fn run_files(base_url: &str, variables: &[String], run: &RunId) -> Vec<RemoteFile> {
    let steps = forecast_steps();
    variables
        .iter()
        .flat_map(|var| {
            steps
                .iter()
                .map(move |step| remote_file(base_url, var, run, *step))
        })
        .collect()
}

/// `<data-dir>/ICON-EU/<run>/`
pub fn raw_dir(data_dir: &Path, run: &RunId) -> PathBuf {
    data_dir.join(MODEL).join(run.to_compact())
}

/// `<data-dir>/processed/<run>/`
pub fn processed_dir(data_dir: &Path, run: &RunId) -> PathBuf {
    data_dir.join("processed").join(run.to_compact())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn run() -> RunId {
        RunId::new(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(), 6).unwrap()
    }

    #[test]
    fn test_forecast_steps() {
        let steps = forecast_steps();
        assert_eq!(steps.len(), 79 + 14);
        assert_eq!(steps[0], 0);
        assert_eq!(steps[78], 78);
        assert_eq!(steps[79], 81);
        assert_eq!(*steps.last().unwrap(), 120);
    }

    #[test]
    fn test_remote_file_url() {
        let file = remote_file(DEFAULT_BASE_URL, "t_2m", &run(), 7);
        assert_eq!(
            file.file_name,
            "icon-eu_europe_regular-lat-lon_single-level_2024061506_007_T_2M.grib2.bz2"
        );
        assert_eq!(
            file.url,
            "https://opendata.dwd.de/weather/nwp/icon-eu/grib/06/t_2m/\
             icon-eu_europe_regular-lat-lon_single-level_2024061506_007_T_2M.grib2.bz2"
        );
    }

    #[test]
    fn test_run_files_covers_every_variable() {
        let vars: Vec<String> = VARIABLES.iter().map(|v| v.to_string()).collect();
        let files = run_files("http://mirror/", &vars, &run());
        assert_eq!(files.len(), VARIABLES.len() * forecast_steps().len());
        assert!(files[0].url.starts_with("http://mirror/06/t_2m/"));
    }

    #[test]
    fn test_directories() {
        let base = Path::new("/data");
        assert_eq!(raw_dir(base, &run()), PathBuf::from("/data/ICON-EU/2024061506"));
        assert_eq!(
            processed_dir(base, &run()),
            PathBuf::from("/data/processed/2024061506")
        );
    }
}
