//! Radar-to-ground geolocation against the WGS84 ellipsoid

use crate::constants::{WGS84_A, WGS84_E2};
use crate::types::{Llh, OrbitData, SarError, SarResult, StateVector};
use chrono::NaiveDateTime;

/// Radar-to-ground transformation: (azimuth time, slant range) -> geodetic point
pub trait Geolocator {
    /// Geolocate a radar coordinate at `height` above the ellipsoid.
    /// `side` is -1 for right looking and +1 for left looking geometry.
    fn rdr2geo(
        &self,
        orbit: &OrbitData,
        azimuth_time: NaiveDateTime,
        slant_range: f64,
        height: f64,
        side: i32,
    ) -> SarResult<Llh>;
}

/// Zero-Doppler geolocation on the WGS84 ellipsoid
#[derive(Debug, Clone)]
pub struct ZeroDopplerGeolocator {
    /// Number of state vectors used for Lagrange interpolation
    pub interpolation_points: usize,
    /// Look angle convergence threshold (radians)
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for ZeroDopplerGeolocator {
    fn default() -> Self {
        Self {
            interpolation_points: 4,
            tolerance: 1e-12,
            max_iterations: 200,
        }
    }
}

impl Geolocator for ZeroDopplerGeolocator {
    fn rdr2geo(
        &self,
        orbit: &OrbitData,
        azimuth_time: NaiveDateTime,
        slant_range: f64,
        height: f64,
        side: i32,
    ) -> SarResult<Llh> {
        let (position, velocity) = self.interpolate_state(orbit, azimuth_time)?;

        let v_hat = normalize(velocity)?;

        // Geodetic nadir at the satellite, made perpendicular to the velocity
        let sat_llh = ecef_to_llh(position);
        let (lat, lon) = (sat_llh[0].to_radians(), sat_llh[1].to_radians());
        let down = [-lat.cos() * lon.cos(), -lat.cos() * lon.sin(), -lat.sin()];
        let down = normalize(sub(down, scale(v_hat, dot(down, v_hat))))?;

        // Forward x down points to the right of the track
        let right = cross(down, v_hat);
        let lateral = if side < 0 { right } else { scale(right, -1.0) };

        let a = WGS84_A + height;
        let b = WGS84_A * (1.0 - WGS84_E2).sqrt() + height;
        let surface = |theta: f64| {
            let look = add(scale(down, theta.cos()), scale(lateral, theta.sin()));
            let target = add(position, scale(look, slant_range));
            (target[0] * target[0] + target[1] * target[1]) / (a * a) + target[2] * target[2] / (b * b) - 1.0
        };

        let (mut lo, mut hi) = (0.0_f64, std::f64::consts::FRAC_PI_2);
        if surface(lo) > 0.0 || surface(hi) < 0.0 {
            return Err(SarError::Processing(format!(
                "Slant range {:.1} m does not intersect the ellipsoid at {}",
                slant_range, azimuth_time
            )));
        }

        let mut iterations = 0;
        while hi - lo > self.tolerance && iterations < self.max_iterations {
            let mid = 0.5 * (lo + hi);
            if surface(mid) < 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
            iterations += 1;
        }

        let theta = 0.5 * (lo + hi);
        let look = add(scale(down, theta.cos()), scale(lateral, theta.sin()));
        let target = add(position, scale(look, slant_range));

        log::debug!(
            "rdr2geo t={} r={:.3} side={} -> look angle {:.4} deg after {} iterations",
            azimuth_time,
            slant_range,
            side,
            theta.to_degrees(),
            iterations
        );
        Ok(ecef_to_llh(target))
    }
}

impl ZeroDopplerGeolocator {
    /// Interpolate position and velocity at `target_time`
    pub fn interpolate_state(
        &self,
        orbit: &OrbitData,
        target_time: NaiveDateTime,
    ) -> SarResult<([f64; 3], [f64; 3])> {
        let svs = &orbit.state_vectors;
        let reference = svs
            .first()
            .ok_or_else(|| SarError::Processing("No state vectors in orbit data".to_string()))?
            .time;

        let seconds = |t: NaiveDateTime| {
            (t - reference).num_microseconds().unwrap_or(i64::MAX) as f64 / 1e6
        };
        let target = seconds(target_time);

        // Window of points centred on the closest state vector
        let closest = svs
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                let da = (seconds(a.time) - target).abs();
                let db = (seconds(b.time) - target).abs();
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
            .unwrap_or(0);
        let n = self.interpolation_points.max(1).min(svs.len());
        let start = closest.saturating_sub(n / 2).min(svs.len() - n);
        let window: Vec<&StateVector> = svs[start..start + n].iter().collect();

        let times: Vec<f64> = window.iter().map(|sv| seconds(sv.time)).collect();
        let mut position = [0.0; 3];
        let mut velocity = [0.0; 3];

        for (i, sv) in window.iter().enumerate() {
            let mut li = 1.0;
            for (j, tj) in times.iter().enumerate() {
                if i != j {
                    let denominator = times[i] - tj;
                    if denominator == 0.0 {
                        return Err(SarError::Processing(format!(
                            "Duplicate state vector time {}",
                            sv.time
                        )));
                    }
                    li *= (target - tj) / denominator;
                }
            }
            for coord in 0..3 {
                position[coord] += li * sv.position[coord];
                velocity[coord] += li * sv.velocity[coord];
            }
        }

        Ok((position, velocity))
    }
}

/// Geodetic to ECEF conversion (degrees, degrees, meters)
pub fn llh_to_ecef(llh: Llh) -> [f64; 3] {
    let lat = llh[0].to_radians();
    let lon = llh[1].to_radians();
    let n = WGS84_A / (1.0 - WGS84_E2 * lat.sin().powi(2)).sqrt();

    [
        (n + llh[2]) * lat.cos() * lon.cos(),
        (n + llh[2]) * lat.cos() * lon.sin(),
        (n * (1.0 - WGS84_E2) + llh[2]) * lat.sin(),
    ]
}

/// ECEF to geodetic conversion, iterating on latitude
pub fn ecef_to_llh(xyz: [f64; 3]) -> Llh {
    let [x, y, z] = xyz;
    let lon = y.atan2(x);
    let p = (x * x + y * y).sqrt();

    let mut lat = z.atan2(p * (1.0 - WGS84_E2));
    let mut height = 0.0;
    for _ in 0..10 {
        let n = WGS84_A / (1.0 - WGS84_E2 * lat.sin().powi(2)).sqrt();
        height = if lat.cos().abs() > 1e-12 {
            p / lat.cos() - n
        } else {
            z.abs() - n * (1.0 - WGS84_E2)
        };
        lat = z.atan2(p * (1.0 - WGS84_E2 * n / (n + height)));
    }

    [lat.to_degrees(), lon.to_degrees(), height]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn add(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn scale(a: [f64; 3], s: f64) -> [f64; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

fn normalize(a: [f64; 3]) -> SarResult<[f64; 3]> {
    let norm = dot(a, a).sqrt();
    if norm == 0.0 {
        return Err(SarError::Processing("Cannot normalize a zero vector".to_string()));
    }
    Ok(scale(a, 1.0 / norm))
}
