//! Frame/swath bookkeeping of a preprocessed track and its ground footprint.
//!
//! Corner numbering in image coordinates:
//!
//! ```text
//!   1      2
//!   --------        azimuth (time) runs down,
//!   |      |        slant range runs right
//!   --------
//!   3      4
//! ```
//!
//! After geolocation the corners are re-sorted by pass and look direction so
//! the footprint always reads `[NW, NE, SW, SE]`.

use crate::core::geolocation::Geolocator;
use crate::types::{
    Footprint, Llh, PassDirection, PointingDirection, SarError, SarResult, Track,
};
use chrono::{Duration, NaiveDateTime};

/// Per-swath parameter lists and derived extents of a track
#[derive(Debug, Clone)]
pub struct TrackFrameData {
    pub number_of_frames: usize,
    pub number_of_swaths: usize,
    pub range_pixel_size_list: Vec<f64>,
    pub sensing_start_list: Vec<NaiveDateTime>,
    pub sensing_end_list: Vec<NaiveDateTime>,
    pub starting_range_list: Vec<f64>,
    pub ending_range_list: Vec<f64>,
    pub azimuth_line_interval_list: Vec<f64>,
    pub azimuth_pixel_size_list: Vec<f64>,
    pub azimuth_time_min: NaiveDateTime,
    pub azimuth_time_max: NaiveDateTime,
    pub azimuth_time_mid: NaiveDateTime,
    pub range_min: f64,
    pub range_max: f64,
    pub range_mid: f64,
    pub footprint: Footprint,
}

impl TrackFrameData {
    /// `[range_min, range_max]` and `[azimuth_min, azimuth_max]` of the track
    pub fn bbox(&self) -> ([f64; 2], [NaiveDateTime; 2]) {
        ([self.range_min, self.range_max], [self.azimuth_time_min, self.azimuth_time_max])
    }
}

fn seconds(value: f64) -> Duration {
    Duration::microseconds((value * 1e6).round() as i64)
}

/// Re-sort image corners 1..4 into geographic `[NW, NE, SW, SE]`
pub fn sort_corners(
    corners: [Llh; 4],
    pass: PassDirection,
    pointing: PointingDirection,
) -> Footprint {
    let [c1, c2, c3, c4] = corners;
    match (pass, pointing) {
        (PassDirection::Descending, PointingDirection::Right) => [c2, c1, c4, c3],
        (PassDirection::Descending, PointingDirection::Left) => [c1, c2, c3, c4],
        (PassDirection::Ascending, PointingDirection::Right) => [c4, c3, c2, c1],
        (PassDirection::Ascending, PointingDirection::Left) => [c3, c4, c1, c2],
    }
}

/// Collect per-swath lists over every frame and geolocate the track corners
pub fn track_frame_data<G: Geolocator + ?Sized>(
    track: &Track,
    geolocator: &G,
) -> SarResult<TrackFrameData> {
    let number_of_frames = track.frames.len();
    let number_of_swaths = track
        .frames
        .first()
        .map(|f| f.swaths.len())
        .unwrap_or(0);
    if number_of_frames == 0 || number_of_swaths == 0 {
        return Err(SarError::Metadata("Track has no frames or swaths".to_string()));
    }

    let capacity = number_of_frames * number_of_swaths;
    let mut range_pixel_size_list = Vec::with_capacity(capacity);
    let mut azimuth_line_interval_list = Vec::with_capacity(capacity);
    let mut azimuth_pixel_size_list = Vec::with_capacity(capacity);
    let mut sensing_start_list = Vec::with_capacity(capacity);
    let mut sensing_end_list = Vec::with_capacity(capacity);
    let mut starting_range_list = Vec::with_capacity(capacity);
    let mut ending_range_list = Vec::with_capacity(capacity);

    for (i, frame) in track.frames.iter().enumerate() {
        if frame.swaths.len() != number_of_swaths {
            log::warn!(
                "Frame {} has {} swath(s), expected {}",
                i,
                frame.swaths.len(),
                number_of_swaths
            );
        }
        for swath in frame.swaths.iter().take(number_of_swaths) {
            let lines = swath.number_of_lines.saturating_sub(1) as f64;
            let samples = swath.number_of_samples.saturating_sub(1) as f64;

            range_pixel_size_list.push(swath.range_pixel_size);
            azimuth_line_interval_list.push(swath.azimuth_line_interval);
            azimuth_pixel_size_list.push(swath.azimuth_pixel_size);
            sensing_start_list.push(swath.sensing_start);
            sensing_end_list.push(swath.sensing_start + seconds(lines * swath.azimuth_line_interval));
            starting_range_list.push(swath.starting_range);
            ending_range_list.push(swath.starting_range + samples * swath.range_pixel_size);
        }
    }

    let (azimuth_time_min, azimuth_time_max) = match (
        sensing_start_list.iter().min(),
        sensing_end_list.iter().max(),
    ) {
        (Some(min), Some(max)) => (*min, *max),
        _ => return Err(SarError::Metadata("Track has no sensing times".to_string())),
    };
    let azimuth_time_mid = azimuth_time_min + (azimuth_time_max - azimuth_time_min) / 2;
    let range_min = starting_range_list.iter().copied().fold(f64::INFINITY, f64::min);
    let range_max = ending_range_list.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range_mid = (range_min + range_max) / 2.0;

    let side = track.pointing_direction.side();
    let orbit = &track.orbit;
    let corners = [
        geolocator.rdr2geo(orbit, azimuth_time_min, range_min, 0.0, side)?,
        geolocator.rdr2geo(orbit, azimuth_time_min, range_max, 0.0, side)?,
        geolocator.rdr2geo(orbit, azimuth_time_max, range_min, 0.0, side)?,
        geolocator.rdr2geo(orbit, azimuth_time_max, range_max, 0.0, side)?,
    ];
    let footprint = sort_corners(corners, track.pass_direction, track.pointing_direction);

    log::info!(
        "Track spans {} -> {}, range {:.1} - {:.1} m",
        azimuth_time_min,
        azimuth_time_max,
        range_min,
        range_max
    );

    Ok(TrackFrameData {
        number_of_frames,
        number_of_swaths,
        range_pixel_size_list,
        sensing_start_list,
        sensing_end_list,
        starting_range_list,
        ending_range_list,
        azimuth_line_interval_list,
        azimuth_pixel_size_list,
        azimuth_time_min,
        azimuth_time_max,
        azimuth_time_mid,
        range_min,
        range_max,
        range_mid,
        footprint,
    })
}
