//! Shared utility functions for surface water extent crates.

/// Date utility functions
pub mod dates {
    use chrono::NaiveDateTime;

    /// Format used for the output filename suffix: "YYYYmmdd_HHMMSS"
    pub const SUFFIX_FORMAT: &str = "%Y%m%d_%H%M%S";

    /// Format a timestamp as a filename suffix
    pub fn timestamp_suffix(timestamp: &NaiveDateTime) -> String {
        timestamp.format(SUFFIX_FORMAT).to_string()
    }

}

/// Output path derivation
pub mod paths {
    use crate::dates::timestamp_suffix;
    use chrono::{NaiveDateTime, TimeDelta};
    use std::path::{is_separator, Path, PathBuf};

    /// File name used when the base path has none (e.g. "" or "..").
    pub const DEFAULT_BASE_NAME: &str = "surface_water_extent_time_series";

    /// Derive `<dir>/<name>_<YYYYmmdd_HHMMSS>.<extension>` from a base path.
    ///
    /// A base ending in a separator, or naming an existing directory, is a
    /// directory: the file goes inside it under [`DEFAULT_BASE_NAME`]. The
    /// timestamp suffix is applied exactly once.
    pub fn derive_output_path(base: &Path, timestamp: &NaiveDateTime, extension: &str) -> PathBuf {
        let suffixed =
            |name: &str| format!("{}_{}.{}", name, timestamp_suffix(timestamp), extension);
        let is_directory = base.as_os_str().to_string_lossy().ends_with(is_separator)
            || base.is_dir();
        match base.file_name() {
            Some(name) if !is_directory => {
                let file_name = suffixed(&name.to_string_lossy());
                match base.parent() {
                    Some(dir) => dir.join(file_name),
                    None => PathBuf::from(file_name),
                }
            }
            _ => base.join(suffixed(DEFAULT_BASE_NAME)),
        }
    }

    /// Like [`derive_output_path`], but advances the timestamp one second at
    /// a time until no file exists at the derived path.
    pub fn next_free_output_path(
        base: &Path,
        timestamp: &NaiveDateTime,
        extension: &str,
    ) -> PathBuf {
        let mut candidate_time = *timestamp;
        loop {
            let candidate = derive_output_path(base, &candidate_time, extension);
            if !candidate.exists() {
                return candidate;
            }
            candidate_time += TimeDelta::seconds(1);
        }
    }

}
