//! Metadata extraction: catalog lookup, toolchain preprocessing, or catalog
//! with toolchain fallback.

use crate::core::frame::track_frame_data;
use crate::core::geolocation::{Geolocator, ZeroDopplerGeolocator};
use crate::core::metadata::Alos2Metadata;
use crate::core::toolchain::{IsceConfig, IsceToolchain, RadarToolchain};
use crate::io::catalog::{CatalogClient, CatalogConfig};
use crate::io::filename::{catalog_identifier, find_img_files, parse_img_filename};
use crate::types::SarResult;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Where scene metadata comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMethod {
    /// Remote catalog only
    Catalog,
    /// Toolchain preprocessing only
    Isce,
    /// Catalog first, toolchain on any catalog failure
    Auto,
}

impl ExtractionMethod {
    /// `bos`/`catalog` and `isce` select a single source; anything else means
    /// catalog first with toolchain fallback.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "bos" | "catalog" => ExtractionMethod::Catalog,
            "isce" => ExtractionMethod::Isce,
            "" | "auto" => ExtractionMethod::Auto,
            other => {
                log::warn!("Unknown extraction method '{}', trying bos sarcat then isce", other);
                ExtractionMethod::Auto
            }
        }
    }
}

impl Default for ExtractionMethod {
    fn default() -> Self {
        ExtractionMethod::Auto
    }
}

/// Source of catalog features keyed by scene identifier
pub trait SceneCatalog {
    fn lookup(&self, identifier: &str) -> SarResult<Map<String, Value>>;
}

impl SceneCatalog for CatalogClient {
    fn lookup(&self, identifier: &str) -> SarResult<Map<String, Value>> {
        CatalogClient::lookup(self, identifier)
    }
}

pub struct MetadataExtractor {
    method: ExtractionMethod,
    catalog: Box<dyn SceneCatalog>,
    toolchain: Box<dyn RadarToolchain>,
    geolocator: Box<dyn Geolocator>,
}

impl MetadataExtractor {
    pub fn new(
        method: ExtractionMethod,
        catalog: Box<dyn SceneCatalog>,
        toolchain: Box<dyn RadarToolchain>,
        geolocator: Box<dyn Geolocator>,
    ) -> Self {
        Self {
            method,
            catalog,
            toolchain,
            geolocator,
        }
    }

    /// Extractor backed by the BOS catalog, ISCE and zero-Doppler geolocation
    pub fn with_defaults(
        method: ExtractionMethod,
        catalog: CatalogConfig,
        isce: IsceConfig,
    ) -> SarResult<Self> {
        Ok(Self::new(
            method,
            Box::new(CatalogClient::new(catalog)?),
            Box::new(IsceToolchain::new(isce)),
            Box::new(ZeroDopplerGeolocator::default()),
        ))
    }

    /// Extract metadata for the ALOS-2 directory `dir`.
    ///
    /// Returns `Ok(None)` when the directory holds no `IMG*` file or the first
    /// one does not follow ALOS-2 naming; nothing external is invoked then.
    pub fn extract<P: AsRef<Path>>(&self, dir: P) -> SarResult<Option<Value>> {
        let dir = dir.as_ref();
        let img_files = find_img_files(dir)?;
        let img_file = match img_files.first() {
            Some(f) => f,
            None => {
                log::warn!("No IMG file in {}, nothing to extract", dir.display());
                return Ok(None);
            }
        };

        match self.method {
            ExtractionMethod::Catalog => self.from_catalog(img_file),
            ExtractionMethod::Isce => self.from_toolchain(dir, img_file),
            ExtractionMethod::Auto => match self.from_catalog(img_file) {
                Ok(Some(md)) => Ok(Some(md)),
                Ok(None) => self.from_toolchain(dir, img_file),
                Err(e) => {
                    log::warn!("Got exception trying to query bos sarcat: {}", e);
                    self.from_toolchain(dir, img_file)
                }
            },
        }
    }

    /// Extract and write pretty-printed JSON to `output`. Returns whether a
    /// file was written.
    pub fn extract_to_file<P: AsRef<Path>, Q: AsRef<Path>>(&self, dir: P, output: Q) -> SarResult<bool> {
        match self.extract(dir)? {
            Some(md) => {
                write_json(output.as_ref(), &md)?;
                log::info!("Metadata written to {}", output.as_ref().display());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn from_catalog(&self, img_file: &Path) -> SarResult<Option<Value>> {
        let identifier = match catalog_identifier(img_file)? {
            Some(id) => id,
            None => {
                log::warn!("{} has no catalog identifier", img_file.display());
                return Ok(None);
            }
        };

        let md = self.catalog.lookup(&identifier)?;
        Ok(Some(Value::Object(md)))
    }

    fn from_toolchain(&self, dir: &Path, img_file: &Path) -> SarResult<Option<Value>> {
        let img = match parse_img_filename(img_file)? {
            Some(info) => info,
            None => {
                log::warn!("{} does not follow ALOS-2 naming", img_file.display());
                return Ok(None);
            }
        };

        let track = self.toolchain.preprocess(dir, &img)?;
        let frame_data = track_frame_data(&track, self.geolocator.as_ref())?;
        let md = Alos2Metadata::from_track(&track, &frame_data)?;
        Ok(Some(md.to_value()?))
    }
}

/// Write a JSON value with two-space indentation
pub fn write_json(path: &Path, value: &Value) -> SarResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}
