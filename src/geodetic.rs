//! Earth-centered Cartesian locations to longitude and latitude

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::{AntennaPatternError, Result};

/// WGS-84 semi-major axis `[m]`
pub const WGS84_SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
/// WGS-84 flattening
pub const WGS84_FLATTENING: f64 = 1. / 298.257_223_563;

/// Spherical longitude and latitude of a location in `[deg]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geodetic {
    /// East longitude in `(-180,180]`
    pub longitude: f64,
    /// Geocentric latitude in `[-90,90]`
    pub latitude: f64,
    /// Distance to the Earth center `[m]`
    pub radius: f64,
}
impl Display for Geodetic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "lon: {:9.4}deg, lat: {:8.4}deg",
            self.longitude, self.latitude
        )
    }
}

/// Longitude, latitude and height on the WGS-84 ellipsoid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wgs84Geodetic {
    /// East longitude `[deg]`
    pub longitude: f64,
    /// Geodetic latitude `[deg]`
    pub latitude: f64,
    /// Height above the ellipsoid `[m]`
    pub height: f64,
}

fn radius(location: &Vector3<f64>) -> Result<f64> {
    let r = location.norm();
    if location.iter().all(|x| x.is_finite()) && r.is_finite() && r > 0. {
        Ok(r)
    } else {
        Err(AntennaPatternError::DegenerateGeometry(format!(
            "location [{}, {}, {}] has no direction",
            location.x, location.y, location.z
        )))
    }
}

/// Returns the spherical [Geodetic] coordinates of an Earth-centered location in `[m]`
///
/// The latitude is `asin(z/r)` and the longitude `atan2(y,x)`.
pub fn geodetic_from_location(location: &Vector3<f64>) -> Result<Geodetic> {
    let r = radius(location)?;
    Ok(Geodetic {
        longitude: location.y.atan2(location.x).to_degrees(),
        latitude: (location.z / r).clamp(-1., 1.).asin().to_degrees(),
        radius: r,
    })
}

/// Returns the [Wgs84Geodetic] coordinates of an Earth-centered location in `[m]`
///
/// The geodetic latitude is found by fixed-point iteration starting from the
/// latitude of a point on the ellipsoid surface.
pub fn wgs84_from_location(location: &Vector3<f64>) -> Result<Wgs84Geodetic> {
    radius(location)?;
    let e2 = WGS84_FLATTENING * (2. - WGS84_FLATTENING);
    let p = location.x.hypot(location.y);
    let z = location.z;
    let longitude = location.y.atan2(location.x).to_degrees();
    if p < 1e-9 {
        let b = WGS84_SEMI_MAJOR_AXIS * (1. - WGS84_FLATTENING);
        return Ok(Wgs84Geodetic {
            longitude,
            latitude: 90f64.copysign(z),
            height: z.abs() - b,
        });
    }
    let mut latitude = z.atan2(p * (1. - e2));
    let mut height = 0f64;
    for _ in 0..10 {
        let (sin_lat, cos_lat) = latitude.sin_cos();
        let n = WGS84_SEMI_MAJOR_AXIS / (1. - e2 * sin_lat * sin_lat).sqrt();
        height = p / cos_lat - n;
        let next = z.atan2(p * (1. - e2 * n / (n + height)));
        let converged = (next - latitude).abs() < 1e-15;
        latitude = next;
        if converged {
            break;
        }
    }
    Ok(Wgs84Geodetic {
        longitude,
        latitude: latitude.to_degrees(),
        height,
    })
}
