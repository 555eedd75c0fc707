//! INI configuration for a run.
//!
//! ```ini
//! [Input]
//! geojson_file = lake.geojson
//! [Output]
//! output_file_base = out/surface_water
//! export_csv = false
//! [Date_range]
//! start_date = 2015-01-01
//! end_date = 2020-01-01
//! [Google_Project_ID]
//! project_id = my-project
//! [Dataset]
//! collection_id = JRC/GSW1_4/MonthlyHistory
//! ```
//!
//! `export_csv` and the `[Dataset]` section are optional.

use ini::Ini;
use std::path::{Path, PathBuf};
use swe_data::{date_range::YEAR_FORMAT, DateRange};
use swe_ee::water_area::MONTHLY_HISTORY;

/// Config file read when none is given on the command line.
pub const DEFAULT_CONFIG_FILE: &str = "Config.ini";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} not found in the current directory.")]
    NotFound(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed config: {0}")]
    Parse(#[from] ini::ParseError),

    #[error("Missing key '{key}' in section [{section}]")]
    MissingKey {
        section: &'static str,
        key: &'static str,
    },

    #[error("Invalid date '{value}' for [{section}] {key}, expected YYYY-MM-DD")]
    InvalidDate {
        section: &'static str,
        key: &'static str,
        value: String,
    },

    #[error("Invalid boolean '{0}' for [Output] export_csv")]
    InvalidBool(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub geojson_file: PathBuf,
    pub output_file_base: PathBuf,
    pub export_csv: bool,
    pub date_range: DateRange,
    pub project_id: String,
    pub collection_id: String,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Config::from_ini_str(&contents)
    }

    pub fn from_ini_str(s: &str) -> Result<Config> {
        let ini = Ini::load_from_str(s)?;
        Ok(Config {
            geojson_file: PathBuf::from(required(&ini, "Input", "geojson_file")?),
            output_file_base: PathBuf::from(required(&ini, "Output", "output_file_base")?),
            export_csv: match optional(&ini, "Output", "export_csv") {
                Some(value) => parse_bool(value)?,
                None => false,
            },
            date_range: DateRange::new(
                date(&ini, "Date_range", "start_date")?,
                date(&ini, "Date_range", "end_date")?,
            ),
            project_id: required(&ini, "Google_Project_ID", "project_id")?.to_string(),
            collection_id: optional(&ini, "Dataset", "collection_id")
                .unwrap_or(MONTHLY_HISTORY)
                .to_string(),
        })
    }
}

fn optional<'a>(ini: &'a Ini, section: &str, key: &str) -> Option<&'a str> {
    ini.section(Some(section))
        .and_then(|properties| properties.get(key))
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn required<'a>(ini: &'a Ini, section: &'static str, key: &'static str) -> Result<&'a str> {
    optional(ini, section, key).ok_or(ConfigError::MissingKey { section, key })
}

fn date(ini: &Ini, section: &'static str, key: &'static str) -> Result<chrono::NaiveDate> {
    let value = required(ini, section, key)?;
    chrono::NaiveDate::parse_from_str(value, YEAR_FORMAT).map_err(|_| ConfigError::InvalidDate {
        section,
        key,
        value: value.to_string(),
    })
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidBool(value.to_string())),
    }
}
