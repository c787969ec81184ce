//! Scene metadata record written as `<name>.met.json`

use crate::constants::{ISCE_SOURCE, SENSING_TIME_FORMAT, SPEED_OF_LIGHT};
use crate::core::frame::TrackFrameData;
use crate::types::{Footprint, OrbitType, SarError, SarResult, Track};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// GeoJSON polygon with `[longitude, latitude]` positions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonPolygon {
    pub coordinates: Vec<Vec<[f64; 2]>>,
    #[serde(rename = "type")]
    pub geometry_type: String,
}

impl GeoJsonPolygon {
    /// Closed ring NW, NE, SE, SW, NW from a `[NW, NE, SW, SE]` footprint
    pub fn from_footprint(footprint: &Footprint) -> Self {
        let lon_lat = |i: usize| [footprint[i][1], footprint[i][0]];
        Self {
            coordinates: vec![vec![lon_lat(0), lon_lat(1), lon_lat(3), lon_lat(2), lon_lat(0)]],
            geometry_type: "Polygon".to_string(),
        }
    }
}

/// Metadata derived from ISCE preprocessing of an ALOS-2 scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alos2Metadata {
    pub geometry: GeoJsonPolygon,
    pub sensing_start: String,
    pub sensing_stop: String,
    pub absolute_orbit: String,
    pub frame: String,
    pub flight_direction: String,
    pub satellite_name: String,
    pub source: String,
    /// Footprint corners as `[latitude, longitude]`
    pub bbox: Vec<[f64; 2]>,
    pub pointing_direction: String,
    pub radar_wave_length: f64,
    pub starting_range: f64,
    pub azimuth_pixel_size: f64,
    pub azimuth_line_interval: f64,
    pub frequency: f64,
    pub orbit_type: OrbitType,
    pub orbit_source: String,
    #[serde(rename = "nearRange")]
    pub near_range: f64,
    #[serde(rename = "farRange")]
    pub far_range: f64,
    #[serde(rename = "rangePixelSize")]
    pub range_pixel_size: f64,
}

fn mean(values: &[f64]) -> SarResult<f64> {
    if values.is_empty() {
        return Err(SarError::Metadata("Mean of an empty list".to_string()));
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Radar frequency (Hz) from wavelength (m)
pub fn frequency(radar_wavelength: f64) -> SarResult<f64> {
    if radar_wavelength <= 0.0 {
        return Err(SarError::Metadata(format!(
            "Invalid radar wavelength: {}",
            radar_wavelength
        )));
    }
    Ok(SPEED_OF_LIGHT / radar_wavelength)
}

/// `POEORB` when the quality descriptor mentions precision, else `RESORB`
pub fn get_orbit_type(orbit_quality: &str) -> OrbitType {
    OrbitType::from_quality(orbit_quality)
}

/// `[lat, lon]` of each footprint corner
pub fn bbox_from_footprint(footprint: &Footprint) -> Vec<[f64; 2]> {
    footprint.iter().map(|c| [c[0], c[1]]).collect()
}

impl Alos2Metadata {
    pub fn from_track(track: &Track, frame_data: &TrackFrameData) -> SarResult<Self> {
        let footprint = &frame_data.footprint;
        let pass = track.pass_direction.to_string();

        let sensing_start = frame_data
            .sensing_start_list
            .iter()
            .min()
            .ok_or_else(|| SarError::Metadata("No sensing start times".to_string()))?;
        let sensing_stop = frame_data
            .sensing_end_list
            .iter()
            .max()
            .ok_or_else(|| SarError::Metadata("No sensing end times".to_string()))?;
        let starting_range = frame_data
            .starting_range_list
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);

        Ok(Self {
            geometry: GeoJsonPolygon::from_footprint(footprint),
            sensing_start: sensing_start.format(SENSING_TIME_FORMAT).to_string(),
            sensing_stop: sensing_stop.format(SENSING_TIME_FORMAT).to_string(),
            absolute_orbit: track.orbit_number.clone(),
            frame: track.frame_number.clone(),
            flight_direction: (if pass.contains("asc") { "asc" } else { "dsc" }).to_string(),
            satellite_name: track.spacecraft_name.clone(),
            source: ISCE_SOURCE.to_string(),
            bbox: bbox_from_footprint(footprint),
            pointing_direction: track.pointing_direction.to_string(),
            radar_wave_length: track.radar_wavelength,
            starting_range,
            azimuth_pixel_size: mean(&frame_data.azimuth_pixel_size_list)?,
            azimuth_line_interval: mean(&frame_data.azimuth_line_interval_list)?,
            frequency: frequency(track.radar_wavelength)?,
            orbit_type: get_orbit_type(&track.orbit.quality),
            orbit_source: track.orbit.source.clone(),
            near_range: frame_data.range_min,
            far_range: frame_data.range_max,
            range_pixel_size: mean(&frame_data.range_pixel_size_list)?,
        })
    }

    pub fn to_value(&self) -> SarResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Load a previously written metadata JSON file
pub fn read_reference_json<P: AsRef<Path>>(path: P) -> SarResult<Value> {
    let content = fs::read_to_string(path.as_ref())?;
    Ok(serde_json::from_str(&content)?)
}

/// Value of one top-level key of a metadata JSON file, `None` when absent
pub fn read_metadata_variable<P: AsRef<Path>>(path: P, variable: &str) -> SarResult<Option<Value>> {
    log::debug!("Reading '{}' from {}", variable, path.as_ref().display());
    let metadata = read_reference_json(path)?;
    Ok(metadata.get(variable).cloned())
}

/// The `bbox` entry of a metadata JSON file
pub fn read_bbox<P: AsRef<Path>>(path: P) -> SarResult<Vec<[f64; 2]>> {
    let value = read_metadata_variable(path.as_ref(), "bbox")?.ok_or_else(|| {
        SarError::Metadata(format!("No bbox in {}", path.as_ref().display()))
    })?;
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frame::tests::{test_track, EchoGeolocator};
    use crate::core::frame::track_frame_data;
    use crate::types::{PassDirection, PointingDirection};
    use approx::assert_relative_eq;

    fn footprint() -> Footprint {
        [
            [36.0, 139.0, 0.0], // NW
            [36.2, 140.0, 1.0], // NE
            [35.0, 138.8, 2.0], // SW
            [35.2, 139.8, 3.0], // SE
        ]
    }

    #[test]
    fn test_polygon_ring_order_and_axis_swap() {
        let polygon = GeoJsonPolygon::from_footprint(&footprint());
        let ring = &polygon.coordinates[0];

        assert_eq!(ring.len(), 5);
        assert_eq!(ring[0], [139.0, 36.0]);
        assert_eq!(ring[1], [140.0, 36.2]);
        assert_eq!(ring[2], [139.8, 35.2]);
        assert_eq!(ring[3], [138.8, 35.0]);
        assert_eq!(ring[4], ring[0]);

        let json = serde_json::to_value(&polygon).unwrap();
        assert_eq!(json["type"], "Polygon");
    }

    #[test]
    fn test_bbox_from_footprint() {
        let bbox = bbox_from_footprint(&footprint());
        assert_eq!(bbox, vec![[36.0, 139.0], [36.2, 140.0], [35.0, 138.8], [35.2, 139.8]]);
    }

    #[test]
    fn test_frequency() {
        assert_relative_eq!(frequency(0.229).unwrap(), 299_792_458.0 / 0.229);
        assert_relative_eq!(frequency(SPEED_OF_LIGHT / 1.2575e9).unwrap(), 1.2575e9, max_relative = 1e-12);
        assert!(frequency(0.0).is_err());
    }

    #[test]
    fn test_metadata_from_track() {
        let track = test_track(PassDirection::Ascending, PointingDirection::Right);
        let data = track_frame_data(&track, &EchoGeolocator).unwrap();
        let md = Alos2Metadata::from_track(&track, &data).unwrap();

        assert_eq!(md.sensing_start, "2018-08-08T00:00:05.000000");
        assert_eq!(md.sensing_stop, "2018-08-08T00:00:19.000000");
        assert_eq!(md.flight_direction, "asc");
        assert_eq!(md.absolute_orbit, "22733");
        assert_eq!(md.frame, "7160");
        assert_eq!(md.satellite_name, "ALOS2");
        assert_eq!(md.source, "isce_preprocessing");
        assert_eq!(md.pointing_direction, "right");
        assert_eq!(md.orbit_type, OrbitType::POEORB);
        assert_relative_eq!(md.starting_range, 799_500.0);
        assert_relative_eq!(md.near_range, 799_500.0);
        assert_relative_eq!(md.far_range, 803_000.0);
        assert_relative_eq!(md.azimuth_pixel_size, 3.0);
        assert_relative_eq!(md.range_pixel_size, 10.0);

        let value = md.to_value().unwrap();
        assert_eq!(value["orbit_type"], "POEORB");
        assert!(value.get("nearRange").is_some());
        assert!(value.get("rangePixelSize").is_some());
        assert_eq!(value["geometry"]["coordinates"][0].as_array().unwrap().len(), 5);
    }

    #[test]
    fn test_descending_flight_direction() {
        let track = test_track(PassDirection::Descending, PointingDirection::Left);
        let data = track_frame_data(&track, &EchoGeolocator).unwrap();
        let md = Alos2Metadata::from_track(&track, &data).unwrap();
        assert_eq!(md.flight_direction, "dsc");
        assert_eq!(md.pointing_direction, "left");
    }

    #[test]
    fn test_sensing_time_keeps_microseconds() {
        let mut track = test_track(PassDirection::Ascending, PointingDirection::Left);
        track.frames[1].swaths[0].sensing_start = crate::core::frame::tests::at(0, 0, 4, 123_456);
        let data = track_frame_data(&track, &EchoGeolocator).unwrap();
        let md = Alos2Metadata::from_track(&track, &data).unwrap();
        assert_eq!(md.sensing_start, "2018-08-08T00:00:04.123456");
    }

    #[test]
    fn test_reference_json_helpers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.json");
        fs::write(&path, r#"{"bbox": [[1.0, 2.0], [3.0, 4.0]], "frame": "7160"}"#).unwrap();

        assert_eq!(read_bbox(&path).unwrap(), vec![[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(read_metadata_variable(&path, "frame").unwrap(), Some(Value::from("7160")));
        assert_eq!(read_metadata_variable(&path, "missing").unwrap(), None);

        let no_bbox = dir.path().join("nobbox.json");
        fs::write(&no_bbox, "{}").unwrap();
        assert!(read_bbox(&no_bbox).is_err());
    }
}
