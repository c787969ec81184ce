//! Turning an extracted ALOS-2 directory into a repository product

use crate::constants::DATASET_VERSION;
use crate::core::extractor::MetadataExtractor;
use crate::io::filename::{find_img_files, parse_img_filename};
use crate::types::{SarError, SarResult};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Product type tag recorded in the metadata
pub const DATASET_TYPE: &str = "ALOS2_SLC";

/// Metadata, dataset descriptor and location of a product
#[derive(Debug, Clone)]
pub struct Product {
    pub name: String,
    pub metadata: Value,
    pub dataset: Value,
    pub dir: PathBuf,
}

/// Product name of a raw directory, from its first image file:
/// `ALOS2_<orbit>_<frame>_<YYYYMMDD>_<product code>`
pub fn dataset_name<P: AsRef<Path>>(raw_dir: P) -> SarResult<String> {
    let raw_dir = raw_dir.as_ref();
    let img = find_img_files(raw_dir)?
        .iter()
        .find_map(|f| parse_img_filename(f).ok().flatten())
        .ok_or_else(|| {
            SarError::InvalidFormat(format!("No ALOS-2 image file in {}", raw_dir.display()))
        })?;

    Ok(format!(
        "{}_{}_{}_{}_{}",
        img.spacecraft,
        img.orbit_number,
        img.frame_number,
        img.full_date()?,
        img.product_code
    ))
}

/// Dataset descriptor: version, label, and footprint/time window when known
pub fn dataset_descriptor(name: &str, metadata: &Map<String, Value>) -> Value {
    let mut dataset = Map::new();
    dataset.insert("version".to_string(), json!(DATASET_VERSION));
    dataset.insert("label".to_string(), json!(name));

    if let Some(geometry) = metadata.get("geometry") {
        dataset.insert("location".to_string(), geometry.clone());
    }
    if let Some(start) = metadata.get("sensing_start") {
        dataset.insert("starttime".to_string(), start.clone());
    }
    if let Some(stop) = metadata.get("sensing_stop") {
        dataset.insert("endtime".to_string(), stop.clone());
    }

    Value::Object(dataset)
}

/// Move the regular files of `src` into `dest`
fn move_files(src: &Path, dest: &Path) -> SarResult<usize> {
    let mut moved = 0;
    for entry in fs::read_dir(src)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        let target = dest.join(file_name);

        // rename fails across filesystems
        if fs::rename(&path, &target).is_err() {
            fs::copy(&path, &target)?;
            fs::remove_file(&path)?;
        }
        moved += 1;
    }
    Ok(moved)
}

/// Extract metadata for `raw_dir`, create `<work_dir>/<name>` and move the
/// raw files into it.
pub fn productize(
    extractor: &MetadataExtractor,
    name: &str,
    raw_dir: &Path,
    slc_file: &Path,
    work_dir: &Path,
) -> SarResult<Product> {
    log::info!("Productizing {} from {}", name, raw_dir.display());

    let extracted = extractor.extract(raw_dir)?.ok_or_else(|| {
        SarError::Metadata(format!("No metadata could be extracted from {}", raw_dir.display()))
    })?;
    let mut metadata = match extracted {
        Value::Object(map) => map,
        other => {
            return Err(SarError::Metadata(format!(
                "Extracted metadata is not an object: {}",
                other
            )))
        }
    };

    let archive_filename = slc_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    metadata.insert("dataset".to_string(), json!(DATASET_TYPE));
    metadata.insert("archive_filename".to_string(), json!(archive_filename));
    metadata.insert("data_product_name".to_string(), json!(name));

    let dataset = dataset_descriptor(name, &metadata);

    let dir = work_dir.join(name);
    fs::create_dir_all(&dir)?;
    let moved = move_files(raw_dir, &dir)?;
    log::info!("Moved {} file(s) into {}", moved, dir.display());

    Ok(Product {
        name: name.to_string(),
        metadata: Value::Object(metadata),
        dataset,
        dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extractor::tests::fake_extractor;
    use crate::core::extractor::ExtractionMethod;

    const IMG: &str = "IMG-HH-ALOS2227337160-180808-UBSL1.1__A";

    #[test]
    fn test_dataset_name() {
        let raw = tempfile::tempdir().unwrap();
        fs::write(raw.path().join(IMG), b"").unwrap();
        assert_eq!(dataset_name(raw.path()).unwrap(), "ALOS2_22733_7160_20180808_UBSL");

        let empty = tempfile::tempdir().unwrap();
        assert!(dataset_name(empty.path()).is_err());
    }

    #[test]
    fn test_dataset_descriptor() {
        let md = json!({
            "geometry": {"type": "Polygon", "coordinates": []},
            "sensing_start": "2018-08-08T05:19:52.000000",
            "sensing_stop": "2018-08-08T05:20:02.000000"
        });
        let dataset = dataset_descriptor("scene", md.as_object().unwrap());
        assert_eq!(dataset["version"], DATASET_VERSION);
        assert_eq!(dataset["label"], "scene");
        assert_eq!(dataset["location"]["type"], "Polygon");
        assert_eq!(dataset["starttime"], "2018-08-08T05:19:52.000000");
        assert_eq!(dataset["endtime"], "2018-08-08T05:20:02.000000");

        let sparse = dataset_descriptor("scene", &Map::new());
        assert!(sparse.get("location").is_none());
    }

    #[test]
    fn test_productize_moves_files() {
        let work = tempfile::tempdir().unwrap();
        let raw = work.path().join("raw");
        fs::create_dir_all(&raw).unwrap();
        fs::write(raw.join(IMG), b"img").unwrap();
        fs::write(raw.join("LED-ALOS2227337160-180808-UBSL1.1__A"), b"led").unwrap();

        let (extractor, _, toolchain_calls) = fake_extractor(ExtractionMethod::Isce, false);
        let name = dataset_name(&raw).unwrap();
        let product = productize(&extractor, &name, &raw, Path::new("/data/scene.zip"), work.path()).unwrap();

        assert_eq!(toolchain_calls.get(), 1);
        assert_eq!(product.dir, work.path().join(&name));
        assert_eq!(fs::read(product.dir.join(IMG)).unwrap(), b"img");
        assert!(!raw.join(IMG).exists());
        assert_eq!(product.metadata["archive_filename"], "scene.zip");
        assert_eq!(product.metadata["data_product_name"], name.as_str());
        assert_eq!(product.dataset["label"], name.as_str());
    }

    #[test]
    fn test_productize_without_metadata_fails() {
        let work = tempfile::tempdir().unwrap();
        let (extractor, _, _) = fake_extractor(ExtractionMethod::Isce, false);
        let result = productize(&extractor, "x", work.path(), Path::new("a.zip"), work.path());
        assert!(result.is_err());
        assert!(!work.path().join("x").exists());
    }
}
