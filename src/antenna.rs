//! Detector response to a plane gravitational wave
//!
//! The wave frame `(X,Y)` orthogonal to the sky direction is built in the Earth-fixed
//! frame from the Greenwich hour angle `gha` and the declination `δ`:
//!
//! `X = (-sin gha, -cos gha, 0)`, `Y = (-cos gha sin δ, sin gha sin δ, cos δ)`
//!
//! and the polarization tensors `e+ = X⊗X - Y⊗Y`, `ex = X⊗Y + Y⊗X` are contracted with
//! the detector [response tensor](crate::ResponseTensor).
//! The polarization angle rotates the pair `(F+,Fx)` by twice its value.

use nalgebra::{DMatrix, Matrix3, Vector3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::{
    finite, sidereal::wrap_360, AntennaPatternError, Detector, DetectorCatalog, ResponseTensor,
    Result, SiderealClock, SkyGrid,
};

/// Sky direction in equatorial coordinates `[deg]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSkyDirection")]
pub struct SkyDirection {
    right_ascension: f64,
    declination: f64,
}
#[derive(Deserialize)]
struct RawSkyDirection {
    right_ascension: f64,
    declination: f64,
}
impl TryFrom<RawSkyDirection> for SkyDirection {
    type Error = AntennaPatternError;

    fn try_from(raw: RawSkyDirection) -> Result<Self> {
        SkyDirection::new(raw.right_ascension, raw.declination)
    }
}
impl Display for SkyDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(ra: {:8.4}deg, dec: {:8.4}deg)",
            self.right_ascension, self.declination
        )
    }
}
impl SkyDirection {
    /// Creates a new sky direction
    ///
    /// The right ascension is wrapped in `[0,360)` and set to 0 at the poles.
    /// A declination outside `[-90,90]` is an error.
    pub fn new(right_ascension: f64, declination: f64) -> Result<Self> {
        let right_ascension = finite("right ascension", right_ascension)?;
        let declination = finite("declination", declination)?;
        if !(-90f64..=90.).contains(&declination) {
            return Err(AntennaPatternError::InvalidAngle {
                name: "declination",
                value: declination,
            });
        }
        Ok(Self {
            right_ascension: if declination.abs() == 90. {
                0.
            } else {
                wrap_360(right_ascension)
            },
            declination,
        })
    }
    pub fn right_ascension(&self) -> f64 {
        self.right_ascension
    }
    pub fn declination(&self) -> f64 {
        self.declination
    }
    /// Returns the wave frame `(X,Y)` for the Greenwich hour angle `gha` `[rd]`
    fn wave_frame(&self, gha: f64) -> (Vector3<f64>, Vector3<f64>) {
        let (sin_gha, cos_gha) = gha.sin_cos();
        let (sin_dec, cos_dec) = self.declination.to_radians().sin_cos();
        (
            Vector3::new(-sin_gha, -cos_gha, 0.),
            Vector3::new(-cos_gha * sin_dec, sin_gha * sin_dec, cos_dec),
        )
    }
}

/// Source parameters entering the response
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WaveParameters {
    /// Inclination `[deg]`, it only sets the source amplitude and does not enter the response
    pub inclination: f64,
    /// Polarization angle `[deg]`
    pub psi: f64,
}
impl WaveParameters {
    pub fn new(inclination: f64, psi: f64) -> Result<Self> {
        Ok(Self {
            inclination: finite("inclination", inclination)?,
            psi: finite("polarization angle", psi)?,
        })
    }
}

/// Plus and cross polarization responses
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AntennaResponsePair {
    pub plus: f64,
    pub cross: f64,
}
impl Display for AntennaResponsePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "F+: {:+.6}, Fx: {:+.6}", self.plus, self.cross)
    }
}
impl From<(f64, f64)> for AntennaResponsePair {
    fn from((plus, cross): (f64, f64)) -> Self {
        Self { plus, cross }
    }
}
impl AntennaResponsePair {
    /// Returns `F+² + Fx²`
    pub fn power(&self) -> f64 {
        self.plus * self.plus + self.cross * self.cross
    }
    /// Returns the response for a polarization angle increased by `psi` `[deg]`
    pub fn rotate(&self, psi: f64) -> Self {
        let (s, c) = (2. * psi).to_radians().sin_cos();
        Self {
            plus: c * self.plus + s * self.cross,
            cross: -s * self.plus + c * self.cross,
        }
    }
}

/// Contracts the response tensor `d` with the polarization tensors of the wave frame
fn contract(d: &Matrix3<f64>, x: &Vector3<f64>, y: &Vector3<f64>) -> AntennaResponsePair {
    let e_plus = x * x.transpose() - y * y.transpose();
    let e_cross = x * y.transpose() + y * x.transpose();
    AntennaResponsePair {
        plus: d.component_mul(&e_plus).sum(),
        cross: d.component_mul(&e_cross).sum(),
    }
}

/// Returns the response of `detector` at `time` `[s]` to a wave from `direction`
pub fn respond<D>(
    detector: &D,
    clock: &SiderealClock,
    time: f64,
    direction: &SkyDirection,
    wave: &WaveParameters,
) -> Result<AntennaResponsePair>
where
    D: ResponseTensor + ?Sized,
{
    finite("inclination", wave.inclination)?;
    let psi = finite("polarization angle", wave.psi)?;
    let gha = clock
        .hour_angle(time, direction.right_ascension, 0.)?
        .to_radians();
    let (x, y) = direction.wave_frame(gha);
    Ok(contract(&detector.response_tensor(), &x, &y).rotate(psi))
}

/// Returns the response of the detector `id` from the `catalog`
///
/// Angles are in `[deg]` and `time` in `[s]`
#[allow(clippy::too_many_arguments)]
pub fn antenna_response(
    catalog: &DetectorCatalog,
    clock: &SiderealClock,
    time: f64,
    right_ascension: f64,
    declination: f64,
    inclination: f64,
    psi: f64,
    id: &str,
) -> Result<AntennaResponsePair> {
    let detector = catalog.get(id)?;
    respond(
        detector,
        clock,
        time,
        &SkyDirection::new(right_ascension, declination)?,
        &WaveParameters::new(inclination, psi)?,
    )
}

/// Single detector `F+` and `Fx` sky maps
///
/// Rows follow the declinations and columns the right ascensions of the [SkyGrid].
#[derive(Debug, Clone)]
pub struct AntennaPatternGrid {
    grid: SkyGrid,
    plus: DMatrix<f64>,
    cross: DMatrix<f64>,
}
impl AntennaPatternGrid {
    pub fn grid(&self) -> &SkyGrid {
        &self.grid
    }
    /// Returns the `[n_dec,n_ra]` matrix of `F+`
    pub fn plus(&self) -> &DMatrix<f64> {
        &self.plus
    }
    /// Returns the `[n_dec,n_ra]` matrix of `Fx`
    pub fn cross(&self) -> &DMatrix<f64> {
        &self.cross
    }
    /// Returns the `F+² + Fx²` map
    pub fn power(&self) -> DMatrix<f64> {
        self.plus.component_mul(&self.plus) + self.cross.component_mul(&self.cross)
    }
}

/// Evaluates the response of `detector` on each sample of `grid`
pub fn antenna_pattern_grid(
    detector: &Detector,
    clock: &SiderealClock,
    time: f64,
    grid: &SkyGrid,
    psi: f64,
) -> Result<AntennaPatternGrid> {
    let wave = WaveParameters::new(0., psi)?;
    let rows = grid
        .declinations()
        .par_iter()
        .map(|&declination| {
            grid.right_ascensions()
                .iter()
                .map(|&right_ascension| {
                    let direction = SkyDirection::new(right_ascension, declination)?;
                    respond(detector, clock, time, &direction, &wave)
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;
    let (n_dec, n_ra) = grid.shape();
    log::debug!(
        "{} antenna pattern evaluated on a {}x{} grid",
        detector.name(),
        n_dec,
        n_ra
    );
    Ok(AntennaPatternGrid {
        grid: grid.clone(),
        plus: DMatrix::from_row_iterator(n_dec, n_ra, rows.iter().flatten().map(|f| f.plus)),
        cross: DMatrix::from_row_iterator(n_dec, n_ra, rows.iter().flatten().map(|f| f.cross)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DominantPolarizationFrame;
    use approx::assert_abs_diff_eq;

    const GPS: f64 = 1_187_008_882.4;

    fn setup() -> (DetectorCatalog, SiderealClock) {
        (DetectorCatalog::ligo_virgo_kagra(), SiderealClock::default())
    }

    #[test]
    fn zenith_alignment() {
        let (catalog, clock) = setup();
        let h1 = catalog.get("H1").unwrap();
        let zenith = h1.optimal_direction(&clock, GPS).unwrap();
        let f = antenna_response(
            &catalog,
            &clock,
            GPS,
            zenith.right_ascension(),
            zenith.declination(),
            0.,
            0.,
            "H1",
        )
        .unwrap();
        assert_abs_diff_eq!(f.power(), 1., epsilon = 1e-6);
        let psi = DominantPolarizationFrame::from_pairs(&[f]).psi();
        let f = antenna_response(
            &catalog,
            &clock,
            GPS,
            zenith.right_ascension(),
            zenith.declination(),
            0.,
            psi,
            "H1",
        )
        .unwrap();
        assert_abs_diff_eq!(f.plus, 1., epsilon = 1e-6);
        assert_abs_diff_eq!(f.cross, 0., epsilon = 1e-6);
    }

    #[test]
    fn cross_detector_mismatch() {
        let (catalog, clock) = setup();
        let zenith = catalog
            .get("H1")
            .unwrap()
            .optimal_direction(&clock, GPS)
            .unwrap();
        let l1 = catalog.get("L1").unwrap();
        for psi in [0., 22.5, 45., 80.] {
            let f = respond(
                l1,
                &clock,
                GPS,
                &zenith,
                &WaveParameters::new(0., psi).unwrap(),
            )
            .unwrap();
            assert!(f.plus.abs() < 1. && f.cross.abs() < 1.);
            assert!(f.power() < 0.9);
        }
    }

    #[test]
    fn swap_law() {
        let (catalog, clock) = setup();
        for id in catalog.ids() {
            for (ra, dec, psi) in [(120., 30., 10.), (300., -75., -33.), (5., 0., 170.)] {
                let f = antenna_response(&catalog, &clock, GPS, ra, dec, 0., psi, id).unwrap();
                let g =
                    antenna_response(&catalog, &clock, GPS, ra, dec, 0., psi + 45., id).unwrap();
                assert_abs_diff_eq!(g.plus, f.cross, epsilon = 1e-12);
                assert_abs_diff_eq!(g.cross, -f.plus, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn power_bound() {
        let (catalog, clock) = setup();
        for id in catalog.ids() {
            for dec in (-90..=90).step_by(15) {
                for ra in (0..360).step_by(20) {
                    let f = antenna_response(
                        &catalog, &clock, GPS, ra as f64, dec as f64, 45., 12., id,
                    )
                    .unwrap();
                    assert!(f.power() <= 1. + 1e-12, "{id} {ra} {dec}: {f}");
                }
            }
        }
    }

    #[test]
    fn inclination_does_not_matter() {
        let (catalog, clock) = setup();
        let f = antenna_response(&catalog, &clock, GPS, 200., 10., 0., 30., "V1").unwrap();
        let g = antenna_response(&catalog, &clock, GPS, 200., 10., 75., 30., "V1").unwrap();
        assert_eq!(f, g);
    }

    #[test]
    fn poles() {
        let (catalog, clock) = setup();
        for dec in [90., -90.] {
            let f0 = antenna_response(&catalog, &clock, GPS, 0., dec, 0., 20., "L1").unwrap();
            assert!(f0.plus.is_finite() && f0.cross.is_finite());
            for ra in [0., 45., 199.5, 359.9] {
                let f = antenna_response(&catalog, &clock, GPS, ra, dec, 0., 20., "L1").unwrap();
                assert_eq!(f, f0);
            }
        }
    }

    #[test]
    fn sidereal_periodicity() {
        let (catalog, clock) = setup();
        let f = antenna_response(&catalog, &clock, GPS, 60., 20., 0., 0., "K1").unwrap();
        let g = antenna_response(
            &catalog,
            &clock,
            GPS + crate::sidereal::SIDEREAL_DAY,
            60.,
            20.,
            0.,
            0.,
            "K1",
        )
        .unwrap();
        assert_abs_diff_eq!(f.plus, g.plus, epsilon = 1e-6);
        assert_abs_diff_eq!(f.cross, g.cross, epsilon = 1e-6);
    }

    #[test]
    fn invalid_inputs() {
        let (catalog, clock) = setup();
        assert!(matches!(
            antenna_response(&catalog, &clock, GPS, 0., 90.5, 0., 0., "H1"),
            Err(AntennaPatternError::InvalidAngle {
                name: "declination",
                ..
            })
        ));
        assert!(matches!(
            antenna_response(&catalog, &clock, f64::NAN, 0., 0., 0., 0., "H1"),
            Err(AntennaPatternError::InvalidAngle { name: "time", .. })
        ));
        assert!(matches!(
            antenna_response(&catalog, &clock, GPS, 0., 0., 0., f64::INFINITY, "H1"),
            Err(AntennaPatternError::InvalidAngle { .. })
        ));
        assert!(matches!(
            antenna_response(&catalog, &clock, GPS, 0., 0., 0., 0., "X9"),
            Err(AntennaPatternError::MissingDetector(id)) if id == "X9"
        ));
    }

    #[test]
    fn decoded_direction() {
        let bytes = bincode::serialize(&(370., -30.)).unwrap();
        let direction: SkyDirection = bincode::deserialize(&bytes).unwrap();
        assert_eq!(direction, SkyDirection::new(10., -30.).unwrap());
        assert_eq!(
            bincode::deserialize::<SkyDirection>(&bincode::serialize(&direction).unwrap())
                .unwrap(),
            direction
        );
        let bytes = bincode::serialize(&(10., 120.)).unwrap();
        let err = bincode::deserialize::<SkyDirection>(&bytes).unwrap_err();
        assert!(err.to_string().contains("invalid declination: 120"), "{err}");
        assert!(matches!(
            SkyDirection::try_from(RawSkyDirection {
                right_ascension: 10.,
                declination: 120.
            }),
            Err(AntennaPatternError::InvalidAngle {
                name: "declination",
                ..
            })
        ));
    }

    #[test]
    fn bare_tensor_provider() {
        let (catalog, clock) = setup();
        let v1 = catalog.get("V1").unwrap();
        let direction = SkyDirection::new(33., -12.).unwrap();
        let wave = WaveParameters::new(0., 7.).unwrap();
        let f = respond(v1, &clock, GPS, &direction, &wave).unwrap();
        let g = respond(&v1.response_tensor(), &clock, GPS, &direction, &wave).unwrap();
        assert_eq!(f, g);
    }

    #[test]
    fn grid_matches_pointwise() {
        let (catalog, clock) = setup();
        let h1 = catalog.get("H1").unwrap();
        let grid = SkyGrid::uniform(7, 12);
        let maps = antenna_pattern_grid(h1, &clock, GPS, &grid, 15.).unwrap();
        assert_eq!(maps.plus().shape(), (7, 12));
        assert_eq!(maps.grid(), &grid);
        let (i, j) = (2, 5);
        let f = antenna_response(
            &catalog,
            &clock,
            GPS,
            grid.right_ascensions()[j],
            grid.declinations()[i],
            0.,
            15.,
            "H1",
        )
        .unwrap();
        assert_abs_diff_eq!(maps.plus()[(i, j)], f.plus);
        assert_abs_diff_eq!(maps.cross()[(i, j)], f.cross);
        assert!(maps.power().iter().all(|p| *p <= 1. + 1e-12));
    }
}
