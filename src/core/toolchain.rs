//! External radar-processing toolchain invocation

use crate::constants::{ALOS2APP_COMMAND, ALOS2APP_XML};
use crate::io::filename::ImgFileInfo;
use crate::io::product_xml::load_track;
use crate::types::{SarError, SarResult, Track};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Preprocesses a raw ALOS-2 directory into a track description
pub trait RadarToolchain {
    fn preprocess(&self, raw_dir: &Path, img: &ImgFileInfo) -> SarResult<Track>;
}

/// ISCE configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsceConfig {
    /// Shell command running preprocessing, executed through `sh -c`
    pub command: String,
    /// Parent of the per-scene directories the command runs in
    pub work_dir: PathBuf,
}

impl Default for IsceConfig {
    fn default() -> Self {
        Self {
            command: ALOS2APP_COMMAND.to_string(),
            work_dir: PathBuf::from("."),
        }
    }
}

/// Runs `alos2App.py` preprocessing and reads back the track products
pub struct IsceToolchain {
    config: IsceConfig,
}

impl IsceToolchain {
    pub fn new(config: IsceConfig) -> Self {
        Self { config }
    }

    fn run_command(&self, scene_dir: &Path) -> SarResult<()> {
        log::info!("Running '{}' in {}", self.config.command, scene_dir.display());

        let output = Command::new("sh")
            .arg("-c")
            .arg(&self.config.command)
            .current_dir(scene_dir)
            .output()
            .map_err(|e| SarError::Toolchain(format!("Failed to start '{}': {}", self.config.command, e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            log::debug!("{}", stdout.trim_end());
        }

        if !output.status.success() {
            return Err(SarError::Toolchain(format!(
                "'{}' exited with {}: {}",
                self.config.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

impl RadarToolchain for IsceToolchain {
    fn preprocess(&self, raw_dir: &Path, img: &ImgFileInfo) -> SarResult<Track> {
        // Fresh directory per scene, removed on drop, so no frame products carry over
        fs::create_dir_all(&self.config.work_dir)?;
        let scene_dir = tempfile::Builder::new()
            .prefix(".isce_")
            .tempdir_in(&self.config.work_dir)?;

        create_alos2app_xml(scene_dir.path(), raw_dir)?;
        self.run_command(scene_dir.path())?;

        let mut track = load_track(scene_dir.path(), &img.date)?;
        track.spacecraft_name = img.spacecraft.clone();
        track.orbit_number = img.orbit_number.clone();
        track.frame_number = img.frame_number.clone();
        Ok(track)
    }
}

/// Write `alos2App.xml` pointing both master and slave at `raw_dir`
pub fn create_alos2app_xml(work_dir: &Path, raw_dir: &Path) -> SarResult<PathBuf> {
    let raw_dir = raw_dir.canonicalize()?;
    let raw_dir = raw_dir.to_string_lossy();
    let raw_dir = quick_xml::escape::escape(raw_dir.as_ref());

    let xml = format!(
        "<alos2App>\n    <component name=\"alos2insar\">\n        <property name=\"master directory\">{dir}</property>\n        <property name=\"slave directory\">{dir}</property>\n    </component>\n</alos2App>\n",
        dir = raw_dir
    );

    let path = work_dir.join(ALOS2APP_XML);
    fs::write(&path, xml)?;
    log::debug!("Wrote {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::filename::parse_img_filename;
    use crate::io::product_xml::parse_product;

    const TRACK_XML: &str = r#"<track>
    <property name="passdirection"><value>ascending</value></property>
    <property name="pointingdirection"><value>left</value></property>
    <property name="radarwavelength"><value>0.229</value></property>
    <component name="orbit">
        <property name="orbitquality"><value>restituted</value></property>
    </component>
</track>"#;

    const FRAME_XML: &str = r#"<frame>
    <component name="swath1">
        <property name="numberOfSamples"><value>1001</value></property>
        <property name="numberOfLines"><value>9</value></property>
        <property name="startingRange"><value>800000.0</value></property>
        <property name="rangePixelSize"><value>100.0</value></property>
        <property name="sensingStart"><value>2018-08-08 05:19:25.000000</value></property>
        <property name="azimuthLineInterval"><value>0.5</value></property>
        <property name="azimuthPixelSize"><value>3.8</value></property>
    </component>
</frame>"#;

    fn img() -> ImgFileInfo {
        parse_img_filename("IMG-HH-ALOS2227337160-180808-UBSL1.1__A").unwrap().unwrap()
    }

    #[test]
    fn test_create_alos2app_xml() {
        let work = tempfile::tempdir().unwrap();
        let raw = tempfile::tempdir().unwrap();

        let path = create_alos2app_xml(work.path(), raw.path()).unwrap();
        let root = parse_product(&fs::read_to_string(&path).unwrap()).unwrap();
        let component = root.child("alos2insar").unwrap();

        let expected = raw.path().canonicalize().unwrap();
        assert_eq!(component.property("master directory"), Some(expected.to_str().unwrap()));
        assert_eq!(component.property("slave directory"), Some(expected.to_str().unwrap()));
    }

    #[test]
    fn test_preprocess_reads_products_and_stamps_names() {
        let work = tempfile::tempdir().unwrap();
        let raw = tempfile::tempdir().unwrap();
        fs::write(raw.path().join("track.fixture"), TRACK_XML).unwrap();

        let toolchain = IsceToolchain::new(IsceConfig {
            command: format!("cp {} 180808.track.xml", raw.path().join("track.fixture").display()),
            work_dir: work.path().to_path_buf(),
        });

        let track = toolchain.preprocess(raw.path(), &img()).unwrap();
        assert_eq!(track.spacecraft_name, "ALOS2");
        assert_eq!(track.orbit_number, "22733");
        assert_eq!(track.frame_number, "7160");
        assert_eq!(track.orbit.quality, "restituted");
        assert!(track.frames.is_empty());

        // The scene directory is cleaned up with its products
        assert_eq!(fs::read_dir(work.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_frames_do_not_leak_between_scenes() {
        let work = tempfile::tempdir().unwrap();
        let raw = tempfile::tempdir().unwrap();
        let fixtures = tempfile::tempdir().unwrap();
        fs::write(fixtures.path().join("180808.track.xml"), TRACK_XML).unwrap();
        fs::create_dir_all(fixtures.path().join("f1_7160")).unwrap();
        fs::write(fixtures.path().join("f1_7160/180808.frame.xml"), FRAME_XML).unwrap();

        let toolchain = IsceToolchain::new(IsceConfig {
            command: format!("cp -R '{}/.' .", fixtures.path().display()),
            work_dir: work.path().to_path_buf(),
        });
        assert_eq!(toolchain.preprocess(raw.path(), &img()).unwrap().frames.len(), 1);

        // Same date, next frame along the track
        fs::remove_dir_all(fixtures.path().join("f1_7160")).unwrap();
        fs::create_dir_all(fixtures.path().join("f1_7170")).unwrap();
        fs::write(fixtures.path().join("f1_7170/180808.frame.xml"), FRAME_XML).unwrap();
        assert_eq!(toolchain.preprocess(raw.path(), &img()).unwrap().frames.len(), 1);
    }

    #[test]
    fn test_failing_command_is_a_toolchain_error() {
        let work = tempfile::tempdir().unwrap();
        let raw = tempfile::tempdir().unwrap();
        let toolchain = IsceToolchain::new(IsceConfig {
            command: "echo broken >&2; exit 3".to_string(),
            work_dir: work.path().to_path_buf(),
        });

        match toolchain.preprocess(raw.path(), &img()) {
            Err(SarError::Toolchain(msg)) => assert!(msg.contains("broken")),
            other => panic!("expected toolchain error, got {:?}", other.map(|t| t.frame_number)),
        }
    }
}
