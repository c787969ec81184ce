//! Physical constants, formats and default endpoints.

/// Speed of light in vacuum (m/s)
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// WGS84 semi-major axis (m)
pub const WGS84_A: f64 = 6_378_137.0;

/// WGS84 first eccentricity squared
pub const WGS84_E2: f64 = 0.006_694_379_990_14;

/// Timestamp format of `sensing_start` / `sensing_stop`
pub const SENSING_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// BOS sarcat WFS endpoint
pub const BOS_SARCAT_URL: &str = "https://portal.bostechnologies.com/geoserver/bos/ows";

/// Fixed query of the sarcat feature lookup, the identifier filter is appended per request
pub const BOS_SARCAT_QUERY: [(&str, &str); 6] = [
    ("service", "WFS"),
    ("version", "1.0.0"),
    ("request", "GetFeature"),
    ("typeName", "bos:sarcat"),
    ("maxFeatures", "50"),
    ("outputFormat", "json"),
];

/// Preprocessing command of the ISCE ALOS-2 application
pub const ALOS2APP_COMMAND: &str = "alos2App.py --steps --end=preprocess";

/// Input file name the ALOS-2 application reads its configuration from
pub const ALOS2APP_XML: &str = "alos2App.xml";

pub const ISCE_SOURCE: &str = "isce_preprocessing";
pub const BOS_SOURCE: &str = "bos_sarcat";

/// Dataset descriptor version written next to each product
pub const DATASET_VERSION: &str = "v1.0";

/// Failure report files appended to when a job fails
pub const ERROR_FILE: &str = "_alt_error.txt";
pub const TRACEBACK_FILE: &str = "_alt_traceback.txt";

/// Job context file
pub const CONTEXT_FILE: &str = "_context.json";
