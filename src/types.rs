use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Geodetic position as `[latitude, longitude, height]` (degrees, degrees, meters)
pub type Llh = [f64; 3];

/// Four geolocated scene corners, ordered `[NW, NE, SW, SE]` in geographic space
pub type Footprint = [Llh; 4];

/// Satellite pass direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassDirection {
    Ascending,
    Descending,
}

impl PassDirection {
    /// Parse the toolchain's pass direction string (case-insensitive)
    pub fn from_str(s: &str) -> SarResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "ascending" => Ok(PassDirection::Ascending),
            "descending" => Ok(PassDirection::Descending),
            other => Err(SarError::Metadata(format!("Unknown pass direction: {}", other))),
        }
    }
}

impl std::fmt::Display for PassDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PassDirection::Ascending => write!(f, "ascending"),
            PassDirection::Descending => write!(f, "descending"),
        }
    }
}

/// Radar look direction relative to the flight track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointingDirection {
    Right,
    Left,
}

impl PointingDirection {
    pub fn from_str(s: &str) -> SarResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "right" => Ok(PointingDirection::Right),
            "left" => Ok(PointingDirection::Left),
            other => Err(SarError::Metadata(format!("Unknown pointing direction: {}", other))),
        }
    }

    /// Side convention used by rdr2geo: -1 for right looking, +1 for left looking
    pub fn side(&self) -> i32 {
        match self {
            PointingDirection::Right => -1,
            PointingDirection::Left => 1,
        }
    }
}

impl std::fmt::Display for PointingDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PointingDirection::Right => write!(f, "right"),
            PointingDirection::Left => write!(f, "left"),
        }
    }
}

/// Orbit product class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrbitType {
    /// Precise Orbit Ephemerides
    POEORB,
    /// Restituted Orbit Ephemerides
    RESORB,
}

impl OrbitType {
    /// Classify an orbit quality descriptor. Matching is case-sensitive.
    pub fn from_quality(orbit_quality: &str) -> Self {
        if orbit_quality.contains("precision") {
            OrbitType::POEORB
        } else {
            OrbitType::RESORB
        }
    }
}

impl std::fmt::Display for OrbitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrbitType::POEORB => write!(f, "POEORB"),
            OrbitType::RESORB => write!(f, "RESORB"),
        }
    }
}

/// Orbit state vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateVector {
    pub time: NaiveDateTime,
    pub position: [f64; 3],  // [x, y, z] in meters (ECEF)
    pub velocity: [f64; 3],  // [vx, vy, vz] in m/s
}

/// Orbit information as produced by preprocessing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrbitData {
    pub state_vectors: Vec<StateVector>,
    pub quality: String,
    pub source: String,
}

/// Single swath of a frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Swath {
    pub sensing_start: NaiveDateTime,
    pub number_of_lines: usize,
    pub number_of_samples: usize,
    pub starting_range: f64,           // meters
    pub range_pixel_size: f64,         // meters
    pub azimuth_line_interval: f64,    // seconds
    pub azimuth_pixel_size: f64,       // meters
}

/// One frame of a track
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Frame {
    pub swaths: Vec<Swath>,
}

/// Track loaded from the radar toolchain's preprocessing output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub pass_direction: PassDirection,
    pub pointing_direction: PointingDirection,
    pub radar_wavelength: f64,  // meters
    pub orbit: OrbitData,
    pub frames: Vec<Frame>,

    // Stamped from the IMG file name
    pub spacecraft_name: String,
    pub orbit_number: String,
    pub frame_number: String,
}

/// Error types for metadata extraction and ingestion
#[derive(Debug, thiserror::Error)]
pub enum SarError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("XML parsing error: {0}")]
    XmlParsing(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Toolchain error: {0}")]
    Toolchain(String),
}

/// Result type for extraction and ingestion operations
pub type SarResult<T> = Result<T, SarError>;
