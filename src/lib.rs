//! # Gravitational-wave detector antenna patterns
//!
//! Directional sensitivity of ground-based interferometric gravitational-wave detectors
//! to a plane wave, as a function of sky position, polarization angle and time,
//! and the combination of several detectors into a network sky map.
//!
//! The computation is split into:
//!  - [geodetic]: Earth-centered detector location to longitude and latitude,
//!  - [sidereal]: global time to Earth-rotation angle ([SiderealClock]),
//!  - [antenna]: the response tensor contraction giving [AntennaResponsePair],
//!  - [dpf]: the dominant polarization frame rotation,
//!  - [network]: network aggregation and full-sky [NetworkResponseGrid].
//!
//! Detectors are looked up in an explicitly constructed [DetectorCatalog].
//! All angles at the public boundary are in degrees and times are in seconds.
//!
//! ```
//! use gw_skymap::{antenna_response, DetectorCatalog, SiderealClock};
//!
//! let catalog = DetectorCatalog::ligo_virgo_kagra();
//! let clock = SiderealClock::default();
//! let f = antenna_response(&catalog, &clock, 1e9, 120., 30., 0., 0., "H1")?;
//! assert!(f.power() <= 1.);
//! # Ok::<(), gw_skymap::AntennaPatternError>(())
//! ```

pub mod antenna;
pub use antenna::{
    antenna_pattern_grid, antenna_response, respond, AntennaPatternGrid, AntennaResponsePair,
    SkyDirection, WaveParameters,
};
pub mod catalog;
pub use catalog::{DetectorCatalog, DetectorCatalogBuilder};
pub mod detector;
pub use detector::{Detector, DetectorRecord, ResponseGeometry, ResponseTensor};
pub mod dpf;
pub use dpf::{dominant_polarization_angle, DominantPolarizationFrame};
pub mod geodetic;
pub use geodetic::{geodetic_from_location, wgs84_from_location, Geodetic, Wgs84Geodetic};
pub mod network;
pub use network::{
    network_response, network_response_grid, DpfPolicy, MapKind, Network, NetworkBuilder,
    NetworkResponse, NetworkResponseGrid, SkyGrid,
};
pub mod sidereal;
pub use sidereal::{SiderealClock, SiderealClockBuilder};

#[derive(thiserror::Error, Debug)]
pub enum AntennaPatternError {
    #[error("detector {0:?} is not in the catalog")]
    MissingDetector(String),
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
    #[error("invalid {name}: {value}")]
    InvalidAngle { name: &'static str, value: f64 },
    #[error("a network needs at least one detector")]
    EmptyNetwork,
    #[error("detector catalog cannot be decoded")]
    Catalog(#[from] bincode::Error),
}
pub type Result<T> = std::result::Result<T, AntennaPatternError>;

/// Checks that `value` is finite, returning it
pub(crate) fn finite(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AntennaPatternError::InvalidAngle { name, value })
    }
}
