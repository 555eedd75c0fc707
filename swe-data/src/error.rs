/// Error types for the surface water data types
use thiserror::Error;

/// Main error type for loading and parsing series inputs
#[derive(Error, Debug)]
pub enum DataError {
    /// Failed to read an input file
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The GeoJSON document could not be parsed
    #[error("Failed to parse GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The GeoJSON document holds no polygon or multipolygon
    #[error("GeoJSON contains no polygon geometry")]
    NoPolygon,

    /// A geometry other than (multi)polygon was found
    #[error("Unsupported geometry type: {0}")]
    UnsupportedGeometry(String),

    /// A coordinate with fewer than two components
    #[error("Invalid position with {0} component(s)")]
    InvalidPosition(usize),

    /// An observation timestamp did not match the expected format
    #[error("Failed to parse timestamp {value:?}: {source}")]
    TimestampParse {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Failed to parse a date
    #[error("Failed to parse date: {0}")]
    DateParse(String),

    /// Failed to write CSV output
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Type alias for Results using DataError
pub type Result<T> = std::result::Result<T, DataError>;
