//! alos2_ingest: ALOS-2 SLC metadata extraction and ingestion
//!
//! This library extracts acquisition metadata for ALOS-2 single-look complex
//! scenes, either from the BOS SAR catalog or by running ISCE preprocessing and
//! geolocating the frame corners, and turns downloaded archives into products
//! with `.met.json` and `.dataset.json` descriptors.

pub mod constants;
pub mod logging;
pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    Footprint, Frame, Llh, OrbitData, OrbitType, PassDirection, PointingDirection, SarError,
    SarResult, StateVector, Swath, Track,
};

pub use io::{CatalogClient, CatalogConfig, ImgFileInfo, JobContext};
pub use core::{
    ExtractionMethod, Geolocator, IngestConfig, IngestPipeline, IsceConfig, IsceToolchain,
    MetadataExtractor, RadarToolchain, SceneCatalog, ZeroDopplerGeolocator,
};
