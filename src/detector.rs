//! Interferometric detectors
//!
//! A [Detector] is an immutable record: an identifier, the Earth-centered location of
//! the vertex and the response tensor `d = (x⊗x - y⊗y)/2` of the arms.

use nalgebra::{Matrix3, SymmetricEigen, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::{
    geodetic_from_location, wgs84_from_location, AntennaPatternError, Geodetic, Result,
    SiderealClock, SkyDirection, Wgs84Geodetic,
};

/// Response tensor capability
///
/// The tensor is expressed in the Earth-fixed frame: `x` through the Greenwich meridian
/// at the equator, `z` along the rotation axis.
pub trait ResponseTensor {
    fn response_tensor(&self) -> Matrix3<f64>;
}
impl ResponseTensor for Matrix3<f64> {
    fn response_tensor(&self) -> Matrix3<f64> {
        *self
    }
}

/// Geometry of a detector as supplied by a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResponseGeometry {
    /// Directions of the x and y arms in the Earth-fixed frame
    Arms { x_arm: [f64; 3], y_arm: [f64; 3] },
    /// Row-major response tensor
    Tensor([[f64; 3]; 3]),
}

/// Detector catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorRecord {
    pub name: String,
    /// Vertex location `[m]`
    pub location: [f64; 3],
    pub geometry: ResponseGeometry,
}

/// Gravitational-wave interferometer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DetectorRecord", into = "DetectorRecord")]
pub struct Detector {
    name: String,
    location: Vector3<f64>,
    arms: Option<(Vector3<f64>, Vector3<f64>)>,
    tensor: Matrix3<f64>,
    zenith: Vector3<f64>,
    placement: Geodetic,
}
impl Display for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:>3}: {}", self.name, self.placement)
    }
}
impl ResponseTensor for Detector {
    fn response_tensor(&self) -> Matrix3<f64> {
        self.tensor
    }
}

fn degenerate<T>(name: &str, what: &str) -> Result<T> {
    Err(AntennaPatternError::DegenerateGeometry(format!(
        "detector {name}: {what}"
    )))
}

/// Orients `n` away from the Earth center
fn upward(n: Vector3<f64>, location: &Vector3<f64>) -> Vector3<f64> {
    if n.dot(location) < 0. {
        -n
    } else {
        n
    }
}

impl Detector {
    /// Creates a detector from the directions of its arms
    ///
    /// The arms are normalized; they need not be orthogonal but they must not be parallel.
    pub fn from_arms(
        name: impl Into<String>,
        location: Vector3<f64>,
        x_arm: Vector3<f64>,
        y_arm: Vector3<f64>,
    ) -> Result<Self> {
        let name = name.into();
        let placement = geodetic_from_location(&location)?;
        let (Some(x), Some(y)) = (unit(&x_arm), unit(&y_arm)) else {
            return degenerate(&name, "arm direction is null or not finite");
        };
        let normal = x.cross(&y);
        if normal.norm() < 1e-6 {
            return degenerate(&name, "arms are parallel");
        }
        let tensor = 0.5 * (x * x.transpose() - y * y.transpose());
        Ok(Self {
            zenith: upward(normal.normalize(), &location),
            name,
            location,
            arms: Some((x, y)),
            tensor,
            placement,
        })
    }
    /// Creates a detector from a response tensor
    ///
    /// The tensor must be finite, symmetric and not null.
    /// The zenith is the eigenvector of the eigenvalue closest to zero.
    pub fn from_tensor(
        name: impl Into<String>,
        location: Vector3<f64>,
        tensor: Matrix3<f64>,
    ) -> Result<Self> {
        let name = name.into();
        let placement = geodetic_from_location(&location)?;
        let scale = tensor.amax();
        if !tensor.iter().all(|x| x.is_finite()) || scale == 0. {
            return degenerate(&name, "response tensor is null or not finite");
        }
        if (tensor - tensor.transpose()).amax() > 1e-9 * scale {
            return degenerate(&name, "response tensor is not symmetric");
        }
        let eigen = SymmetricEigen::new(tensor);
        let (k, _) = eigen
            .eigenvalues
            .iter()
            .enumerate()
            .fold((0, f64::INFINITY), |(k, min), (i, e)| {
                if e.abs() < min {
                    (i, e.abs())
                } else {
                    (k, min)
                }
            });
        let zenith = eigen.eigenvectors.column(k).normalize();
        Ok(Self {
            zenith: upward(zenith, &location),
            name,
            location,
            arms: None,
            tensor,
            placement,
        })
    }
    /// Returns the detector identifier
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Returns the vertex location `[m]`
    pub fn location(&self) -> &Vector3<f64> {
        &self.location
    }
    /// Returns the unit vectors of the x and y arms if the detector was built from its arms
    pub fn arms(&self) -> Option<(&Vector3<f64>, &Vector3<f64>)> {
        self.arms.as_ref().map(|(x, y)| (x, y))
    }
    /// Returns the unit normal to the detector plane, pointing away from the Earth
    pub fn zenith(&self) -> &Vector3<f64> {
        &self.zenith
    }
    /// Returns the spherical longitude and latitude of the vertex
    pub fn geodetic(&self) -> Geodetic {
        self.placement
    }
    /// Returns the WGS-84 longitude, latitude and height of the vertex
    pub fn wgs84(&self) -> Result<Wgs84Geodetic> {
        wgs84_from_location(&self.location)
    }
    /// Returns the sky direction at the detector zenith at `time` `[s]`
    pub fn optimal_direction(&self, clock: &SiderealClock, time: f64) -> Result<SkyDirection> {
        let n = &self.zenith;
        let declination = n.z.clamp(-1., 1.).asin().to_degrees();
        let longitude = n.y.atan2(n.x).to_degrees();
        SkyDirection::new(clock.local_angle(time, longitude)?, declination)
    }
}

fn unit(v: &Vector3<f64>) -> Option<Vector3<f64>> {
    let n = v.norm();
    (n.is_finite() && n > 0.).then(|| v / n)
}

impl TryFrom<DetectorRecord> for Detector {
    type Error = AntennaPatternError;

    fn try_from(record: DetectorRecord) -> Result<Self> {
        let location = Vector3::from(record.location);
        match record.geometry {
            ResponseGeometry::Arms { x_arm, y_arm } => Detector::from_arms(
                record.name,
                location,
                Vector3::from(x_arm),
                Vector3::from(y_arm),
            ),
            ResponseGeometry::Tensor(rows) => Detector::from_tensor(
                record.name,
                location,
                Matrix3::from_fn(|i, j| rows[i][j]),
            ),
        }
    }
}
impl From<Detector> for DetectorRecord {
    fn from(detector: Detector) -> Self {
        let geometry = match detector.arms {
            Some((x, y)) => ResponseGeometry::Arms {
                x_arm: x.into(),
                y_arm: y.into(),
            },
            None => ResponseGeometry::Tensor(std::array::from_fn(|i| {
                std::array::from_fn(|j| detector.tensor[(i, j)])
            })),
        };
        Self {
            name: detector.name,
            location: detector.location.into(),
            geometry,
        }
    }
}
