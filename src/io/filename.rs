//! ALOS-2 CEOS file name classification

use crate::types::{SarError, SarResult};
use regex::Regex;
use std::path::{Path, PathBuf};

const IMG_PATTERN: &str = r"IMG-([A-Z]{2})-(ALOS2)(.{5})(.{4})-(\d{6})-(.{4}).*";
const CATALOG_ID_PATTERN: &str = r"IMG-[A-Z]{2}-(ALOS2.{16})-.*";
const DATASET_FILE_PATTERN: &str = r"IMG-[A-Z]{2}-ALOS2.{5}(.{4}-\d{6})-.{4}.*";

/// Fields encoded in an ALOS-2 image file name,
/// e.g. `IMG-HH-ALOS2227337160-180808-UBSL1.1__A`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImgFileInfo {
    pub polarization: String,
    pub spacecraft: String,
    pub orbit_number: String,
    pub frame_number: String,
    /// Acquisition date as `YYMMDD`
    pub date: String,
    pub product_code: String,
}

impl ImgFileInfo {
    /// Acquisition date expanded to `YYYYMMDD`
    pub fn full_date(&self) -> SarResult<String> {
        let date = chrono::NaiveDate::parse_from_str(&self.date, "%y%m%d")
            .map_err(|e| SarError::InvalidFormat(format!("Bad acquisition date {}: {}", self.date, e)))?;
        Ok(date.format("%Y%m%d").to_string())
    }
}

fn compile(pattern: &str) -> SarResult<Regex> {
    Regex::new(pattern).map_err(|e| SarError::Processing(format!("Regex error: {}", e)))
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Parse an image file name. Only the final path component is matched.
pub fn parse_img_filename<P: AsRef<Path>>(path: P) -> SarResult<Option<ImgFileInfo>> {
    let name = file_name_of(path.as_ref());
    let re = compile(IMG_PATTERN)?;

    Ok(re.captures(&name).map(|caps| ImgFileInfo {
        polarization: caps[1].to_string(),
        spacecraft: caps[2].to_string(),
        orbit_number: caps[3].to_string(),
        frame_number: caps[4].to_string(),
        date: caps[5].to_string(),
        product_code: caps[6].to_string(),
    }))
}

/// Scene identifier used by the catalog, e.g. `ALOS2227337160-180808`
pub fn catalog_identifier<P: AsRef<Path>>(path: P) -> SarResult<Option<String>> {
    let name = file_name_of(path.as_ref());
    let re = compile(CATALOG_ID_PATTERN)?;
    Ok(re.captures(&name).map(|caps| caps[1].to_string()))
}

/// Whether a file name marks its directory as an ALOS-2 dataset directory
pub fn is_dataset_file(name: &str) -> SarResult<bool> {
    Ok(compile(DATASET_FILE_PATTERN)?.is_match(name))
}

/// All `IMG*` entries of a directory, sorted by name
pub fn find_img_files<P: AsRef<Path>>(dir: P) -> SarResult<Vec<PathBuf>> {
    let pattern = dir.as_ref().join("IMG*");
    let pattern = pattern.to_string_lossy();

    let mut files = glob::glob(&pattern)
        .map_err(|e| SarError::Processing(format!("Bad glob pattern {}: {}", pattern, e)))?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .collect::<Vec<_>>();
    files.sort();

    log::debug!("Found {} IMG file(s) in {}", files.len(), dir.as_ref().display());
    Ok(files)
}
