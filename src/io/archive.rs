//! Archive unpacking and working-directory housekeeping

use crate::io::filename::is_dataset_file;
use crate::types::{SarError, SarResult};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::ZipArchive;

/// Copy `src` into `dest` when it is a directory, otherwise to the path `dest`.
/// Returns the path written.
pub fn copy_file<P: AsRef<Path>, Q: AsRef<Path>>(src: P, dest: Q) -> SarResult<PathBuf> {
    let src = src.as_ref();
    let dest = dest.as_ref();

    let target = if dest.is_dir() {
        let name = src.file_name().ok_or_else(|| {
            SarError::InvalidFormat(format!("Not a file path: {}", src.display()))
        })?;
        dest.join(name)
    } else {
        dest.to_path_buf()
    };

    // Copying a file onto itself would truncate it
    if let (Ok(a), Ok(b)) = (src.canonicalize(), target.canonicalize()) {
        if a == b {
            log::debug!("{} is already in place", src.display());
            return Ok(target);
        }
    }

    fs::copy(src, &target)?;
    log::debug!("Copied {} -> {}", src.display(), target.display());
    Ok(target)
}

/// `*.zip` file name test, case-sensitive like a shell glob
pub fn is_zip_path(path: &Path) -> bool {
    path.extension().map(|ext| ext == "zip").unwrap_or(false)
}

/// Extract a single archive into `dest`, returning the extracted file paths.
pub fn extract_zip<P: AsRef<Path>, Q: AsRef<Path>>(zip_path: P, dest: Q) -> SarResult<Vec<PathBuf>> {
    let zip_path = zip_path.as_ref();
    let dest = dest.as_ref();

    let file = File::open(zip_path)?;
    let mut archive = ZipArchive::new(file)?;
    fs::create_dir_all(dest)?;

    let mut extracted = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let relative = match entry.enclosed_name() {
            Some(path) => path.to_path_buf(),
            None => {
                return Err(SarError::InvalidFormat(format!(
                    "Archive entry escapes extraction directory: {}",
                    entry.name()
                )));
            }
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)?;
        std::io::copy(&mut entry, &mut out)?;
        extracted.push(out_path);
    }

    log::info!(
        "Extracted {} file(s) from {} into {}",
        extracted.len(),
        zip_path.display(),
        dest.display()
    );
    Ok(extracted)
}

/// Unpack an archive next to itself into a directory named after its stem, then
/// keep unpacking any archives found inside. Inner archives are deleted once
/// extracted; the outer archive is left for the caller.
pub fn extract_nested_zip<P: AsRef<Path>>(zip_path: P) -> SarResult<PathBuf> {
    let zip_path = zip_path.as_ref();
    let stem = zip_path.file_stem().ok_or_else(|| {
        SarError::InvalidFormat(format!("Not an archive path: {}", zip_path.display()))
    })?;
    let parent = zip_path.parent().unwrap_or_else(|| Path::new("."));
    let dest = parent.join(stem);

    let mut pending: Vec<PathBuf> = extract_zip(zip_path, &dest)?
        .into_iter()
        .filter(|p| is_zip_path(p))
        .collect();

    while let Some(inner) = pending.pop() {
        let inner_stem = inner.file_stem().map(|s| s.to_os_string()).unwrap_or_default();
        let inner_dest = inner.parent().unwrap_or(dest.as_path()).join(inner_stem);
        log::debug!("Unpacking nested archive {}", inner.display());

        let extracted = extract_zip(&inner, &inner_dest)?;
        fs::remove_file(&inner)?;
        pending.extend(extracted.into_iter().filter(|p| is_zip_path(p)));
    }

    Ok(dest)
}

/// Directories under `root` holding at least one ALOS-2 image file
pub fn find_dataset_dirs<P: AsRef<Path>>(root: P) -> SarResult<Vec<PathBuf>> {
    let mut dirs = Vec::new();

    for entry in WalkDir::new(root.as_ref()).sort_by_file_name() {
        let entry = entry.map_err(|e| SarError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if is_dataset_file(&name)? {
            if let Some(dir) = entry.path().parent() {
                if !dirs.iter().any(|d: &PathBuf| d == dir) {
                    log::info!("We found an ALOS2 dataset directory in: {}, adding to list", dir.display());
                    dirs.push(dir.to_path_buf());
                }
            }
        }
    }

    dirs.sort();
    Ok(dirs)
}

/// Delete every top-level `*.zip` of `dir`, returning the number removed
pub fn remove_zip_files<P: AsRef<Path>>(dir: P) -> SarResult<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        if path.is_file() && is_zip_path(&path) {
            fs::remove_file(&path)?;
            log::debug!("Removed {}", path.display());
            removed += 1;
        }
    }
    Ok(removed)
}

/// Recursive delete that only logs failures
pub fn remove_dir_quiet<P: AsRef<Path>>(dir: P) {
    if let Err(e) = fs::remove_dir_all(dir.as_ref()) {
        log::warn!("Failed to remove {}: {}", dir.as_ref().display(), e);
    }
}
