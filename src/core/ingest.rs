//! SLC archive ingestion pipeline

use crate::core::extractor::{write_json, MetadataExtractor};
use crate::core::productize::{dataset_name, productize};
use crate::io::archive::{
    copy_file, extract_nested_zip, find_dataset_dirs, is_zip_path, remove_dir_quiet,
    remove_zip_files,
};
use crate::types::{SarError, SarResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Working directory archives are copied to, unpacked in, and products written to
    pub work_dir: PathBuf,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
        }
    }
}

pub struct IngestPipeline {
    config: IngestConfig,
    extractor: MetadataExtractor,
}

impl IngestPipeline {
    pub fn new(config: IngestConfig, extractor: MetadataExtractor) -> Self {
        Self { config, extractor }
    }

    /// Sources must not live in the working directory: the local copy is deleted
    /// after unpacking and top-level `*.zip` files there are cleared.
    fn check_outside_work_dir(&self, dir: &Path) -> SarResult<()> {
        fs::create_dir_all(&self.config.work_dir)?;
        let work_dir = self.config.work_dir.canonicalize()?;
        if dir.canonicalize()? == work_dir {
            return Err(SarError::InvalidFormat(format!(
                "SLC archives in {} must not sit in the working directory {}",
                dir.display(),
                work_dir.display()
            )));
        }
        Ok(())
    }

    /// Ingest every `*.zip` of a directory, or a single archive
    pub fn process_slc_path<P: AsRef<Path>>(&self, slc_path: P) -> SarResult<Vec<PathBuf>> {
        let slc_path = slc_path.as_ref();

        if slc_path.is_dir() {
            self.check_outside_work_dir(slc_path)?;
            let mut slc_files: Vec<PathBuf> = fs::read_dir(slc_path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_zip_path(p))
                .collect();
            slc_files.sort();
            log::info!("Found {} archive(s) in {}", slc_files.len(), slc_path.display());

            let mut products = Vec::new();
            for slc_file in &slc_files {
                log::info!("Processing : {}", slc_file.display());
                products.extend(self.process_slc_file(slc_file)?);
            }
            Ok(products)
        } else if slc_path.is_file() {
            self.process_slc_file(slc_path)
        } else {
            Err(SarError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("SLC path not found: {}", slc_path.display()),
            )))
        }
    }

    /// Copy, unpack and productize one archive. Returns the product directories.
    pub fn process_slc_file<P: AsRef<Path>>(&self, slc_file: P) -> SarResult<Vec<PathBuf>> {
        let slc_file = slc_file.as_ref();
        let work_dir = &self.config.work_dir;
        let source_dir = match slc_file.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        self.check_outside_work_dir(source_dir)?;

        let local_copy = copy_file(slc_file, work_dir)?;
        let extracted = extract_nested_zip(&local_copy)?;
        fs::remove_file(&local_copy)?;

        // Only this archive's tree; earlier products in work_dir hold image files too
        let raw_dirs = find_dataset_dirs(&extracted)?;
        if raw_dirs.is_empty() {
            log::warn!("No ALOS2 dataset directory found in {}", slc_file.display());
        }

        let mut products = Vec::with_capacity(raw_dirs.len());
        for raw_dir in &raw_dirs {
            let name = dataset_name(raw_dir)?;
            let product = productize(&self.extractor, &name, raw_dir, slc_file, work_dir)?;

            write_json(&product.dir.join(format!("{}.met.json", name)), &product.metadata)?;
            write_json(&product.dir.join(format!("{}.dataset.json", name)), &product.dataset)?;
            log::info!("Wrote product {}", product.dir.display());

            remove_dir_quiet(raw_dir);
            products.push(product.dir);
        }

        let removed = remove_zip_files(work_dir)?;
        log::debug!("Removed {} archive(s) from {}", removed, work_dir.display());
        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extractor::tests::fake_extractor;
    use crate::core::extractor::ExtractionMethod;
    use std::cell::Cell;
    use std::io::Write;
    use std::rc::Rc;
    use zip::write::FileOptions;

    const SCENE: &str = "ALOS2227337160-180808";
    const OTHER_SCENE: &str = "ALOS2227337170-180808";
    const NAME: &str = "ALOS2_22733_7160_20180808_UBSL";
    const OTHER_NAME: &str = "ALOS2_22733_7170_20180808_UBSL";

    fn img(scene: &str) -> String {
        format!("IMG-HH-{}-UBSL1.1__A", scene)
    }

    fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    /// Archive wrapping a zipped scene directory with an image and a leader file
    fn nested_archive(path: &Path, scene: &str) {
        let img = format!("{}/{}", scene, img(scene));
        let led = format!("{}/LED-{}-UBSL1.1__A", scene, scene);
        let inner = zip_bytes(&[(img.as_str(), &b"img"[..]), (led.as_str(), &b"led"[..])]);
        let inner_name = format!("{}.zip", scene);
        fs::write(path, zip_bytes(&[(inner_name.as_str(), inner.as_slice())])).unwrap();
    }

    fn pipeline(work_dir: &Path) -> (IngestPipeline, Rc<Cell<usize>>) {
        let (extractor, _, toolchain_calls) = fake_extractor(ExtractionMethod::Isce, false);
        let config = IngestConfig {
            work_dir: work_dir.to_path_buf(),
        };
        (IngestPipeline::new(config, extractor), toolchain_calls)
    }

    fn json_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".json"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_process_slc_file() {
        let source = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let archive = source.path().join("scene.zip");
        nested_archive(&archive, SCENE);
        fs::write(work.path().join("stale.zip"), b"").unwrap();

        let (pipeline, toolchain_calls) = pipeline(work.path());
        let products = pipeline.process_slc_file(&archive).unwrap();

        assert_eq!(products, vec![work.path().join(NAME)]);
        assert_eq!(toolchain_calls.get(), 1);
        assert_eq!(
            json_files(&products[0]),
            vec![format!("{}.dataset.json", NAME), format!("{}.met.json", NAME)]
        );
        assert!(products[0].join(img(SCENE)).is_file());

        // Raw directory and top-level archives are gone, the source is untouched
        let raw_dir = work.path().join("scene").join(SCENE).join(SCENE);
        assert!(!raw_dir.exists());
        assert!(!work.path().join("scene.zip").exists());
        assert!(!work.path().join("stale.zip").exists());
        assert!(archive.is_file());

        let met: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(products[0].join(format!("{}.met.json", NAME))).unwrap()).unwrap();
        assert_eq!(met["archive_filename"], "scene.zip");
        assert_eq!(met["dataset"], "ALOS2_SLC");
    }

    #[test]
    fn test_process_slc_path_with_several_archives() {
        let source = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let first = source.path().join("a.zip");
        let second = source.path().join("b.zip");
        nested_archive(&first, SCENE);
        nested_archive(&second, OTHER_SCENE);
        fs::write(source.path().join("notes.txt"), b"").unwrap();

        let (pipeline, toolchain_calls) = pipeline(work.path());
        let products = pipeline.process_slc_path(source.path()).unwrap();

        assert_eq!(products, vec![work.path().join(NAME), work.path().join(OTHER_NAME)]);
        assert_eq!(toolchain_calls.get(), 2);
        for (product, name) in products.iter().zip([NAME, OTHER_NAME]) {
            assert_eq!(
                json_files(product),
                vec![format!("{}.dataset.json", name), format!("{}.met.json", name)]
            );
        }
        assert!(first.is_file());
        assert!(second.is_file());
    }

    #[test]
    fn test_archives_inside_work_dir_are_refused() {
        let work = tempfile::tempdir().unwrap();
        let first = work.path().join("a.zip");
        let second = work.path().join("b.zip");
        nested_archive(&first, SCENE);
        nested_archive(&second, OTHER_SCENE);

        let (pipeline, toolchain_calls) = pipeline(work.path());
        assert!(matches!(
            pipeline.process_slc_path(work.path()),
            Err(SarError::InvalidFormat(_))
        ));
        assert!(matches!(
            pipeline.process_slc_path(&second),
            Err(SarError::InvalidFormat(_))
        ));

        assert_eq!(toolchain_calls.get(), 0);
        assert!(first.is_file());
        assert!(second.is_file());
        assert!(!work.path().join(NAME).exists());
        assert!(!work.path().join("a").exists());
    }

    #[test]
    fn test_uppercase_extension_is_not_an_archive() {
        let source = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        nested_archive(&source.path().join("scene.ZIP"), SCENE);

        let (pipeline, toolchain_calls) = pipeline(work.path());
        assert!(pipeline.process_slc_path(source.path()).unwrap().is_empty());
        assert_eq!(toolchain_calls.get(), 0);
        assert!(source.path().join("scene.ZIP").is_file());
    }

    #[test]
    fn test_missing_slc_path() {
        let work = tempfile::tempdir().unwrap();
        let (pipeline, toolchain_calls) = pipeline(work.path());
        assert!(pipeline.process_slc_path(work.path().join("absent.zip")).is_err());
        assert_eq!(toolchain_calls.get(), 0);
    }
}
