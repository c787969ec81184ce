//! Core metadata extraction and ingestion modules

pub mod extractor;
pub mod frame;
pub mod geolocation;
pub mod ingest;
pub mod metadata;
pub mod productize;
pub mod toolchain;

// Re-export main types
pub use extractor::{ExtractionMethod, MetadataExtractor, SceneCatalog};
pub use frame::{track_frame_data, TrackFrameData};
pub use geolocation::{Geolocator, ZeroDopplerGeolocator};
pub use ingest::{IngestConfig, IngestPipeline};
pub use metadata::{Alos2Metadata, GeoJsonPolygon};
pub use productize::{productize, Product};
pub use toolchain::{IsceConfig, IsceToolchain, RadarToolchain};
