//! Detector network sensitivity
//!
//! The network response to a wave is the quadratic sum of the detector responses,
//! normalized by the number of detectors:
//!
//! `sqrt((ΣF+² + ΣFx²)/N)`
//!
//! Every detector is assumed to have the same peak sensitivity, so the value only
//! reflects the geometric overlap of the antenna patterns.

use nalgebra::DMatrix;
use rayon::prelude::*;
use std::{fmt::Display, time::Instant};

use crate::{
    finite, respond, AntennaPatternError, AntennaResponsePair, Detector, DetectorCatalog,
    DominantPolarizationFrame, Geodetic, Result, SiderealClock, SkyDirection, WaveParameters,
};

/// Dominant polarization frame policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DpfPolicy {
    /// Responses are used as computed
    None,
    /// Each detector response is rotated into its own frame
    PerDetector,
    /// All the responses are rotated into the frame of the network
    #[default]
    Network,
}

/// Network sky map content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MapKind {
    /// `sqrt((ΣF+² + ΣFx²)/N)`
    #[default]
    Combined,
    /// `sqrt(ΣF+²/N)`
    Plus,
    /// `sqrt(ΣFx²/N)`
    Cross,
}

/// Network response to a wave from a single sky direction
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NetworkResponse {
    /// `ΣF+²`
    pub plus_power: f64,
    /// `ΣFx²`
    pub cross_power: f64,
    /// Number of detectors `N`
    pub n_detector: usize,
}
impl NetworkResponse {
    /// Sums the squared responses
    pub fn from_pairs(pairs: &[AntennaResponsePair]) -> Self {
        pairs.iter().fold(
            Self {
                n_detector: pairs.len(),
                ..Default::default()
            },
            |r, f| Self {
                plus_power: r.plus_power + f.plus * f.plus,
                cross_power: r.cross_power + f.cross * f.cross,
                ..r
            },
        )
    }
    /// Returns `sqrt(ΣF+² + ΣFx²)`
    pub fn magnitude(&self) -> f64 {
        (self.plus_power + self.cross_power).sqrt()
    }
    /// Returns `sqrt((ΣF+² + ΣFx²)/N)` in `[0,1]`
    pub fn normalized(&self) -> f64 {
        self.value(MapKind::Combined)
    }
    /// Returns the normalized value of the given [MapKind]
    pub fn value(&self, kind: MapKind) -> f64 {
        if self.n_detector == 0 {
            return 0.;
        }
        let power = match kind {
            MapKind::Combined => self.plus_power + self.cross_power,
            MapKind::Plus => self.plus_power,
            MapKind::Cross => self.cross_power,
        };
        (power / self.n_detector as f64).sqrt()
    }
}

/// Declination and right ascension samples of a sky map `[deg]`
#[derive(Debug, Clone, PartialEq)]
pub struct SkyGrid {
    declinations: Vec<f64>,
    right_ascensions: Vec<f64>,
}
impl SkyGrid {
    /// Creates a grid from declination and right ascension samples
    pub fn new(declinations: Vec<f64>, right_ascensions: Vec<f64>) -> Result<Self> {
        for &declination in &declinations {
            if !(-90f64..=90.).contains(&declination) {
                return Err(AntennaPatternError::InvalidAngle {
                    name: "declination",
                    value: declination,
                });
            }
        }
        for &right_ascension in &right_ascensions {
            finite("right ascension", right_ascension)?;
        }
        Ok(Self {
            declinations,
            right_ascensions,
        })
    }
    /// Creates a regular grid
    ///
    /// The `n_dec` declinations span `[-90,90]` and the `n_ra` right ascensions span `[0,360)`
    pub fn uniform(n_dec: usize, n_ra: usize) -> Self {
        let declinations = match n_dec {
            0 => vec![],
            1 => vec![0.],
            n => (0..n)
                .map(|i| (-90. + 180. * i as f64 / (n - 1) as f64).clamp(-90., 90.))
                .collect(),
        };
        let right_ascensions = (0..n_ra)
            .map(|j| 360. * j as f64 / n_ra as f64)
            .collect();
        Self {
            declinations,
            right_ascensions,
        }
    }
    pub fn declinations(&self) -> &[f64] {
        &self.declinations
    }
    pub fn right_ascensions(&self) -> &[f64] {
        &self.right_ascensions
    }
    /// Returns the number of declinations and right ascensions
    pub fn shape(&self) -> (usize, usize) {
        (self.declinations.len(), self.right_ascensions.len())
    }
}
impl Default for SkyGrid {
    /// 360x360 regular grid
    fn default() -> Self {
        Self::uniform(360, 360)
    }
}

/// Network sky map
///
/// Rows follow the declinations and columns the right ascensions of the [SkyGrid]
#[derive(Debug, Clone)]
pub struct NetworkResponseGrid {
    grid: SkyGrid,
    kind: MapKind,
    data: DMatrix<f64>,
}
impl Display for NetworkResponseGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (n_dec, n_ra) = self.grid.shape();
        write!(
            f,
            "{:?} {}x{} map: min {:.4}, max {:.4}, mean {:.4}",
            self.kind,
            n_dec,
            n_ra,
            self.min(),
            self.max(),
            self.mean()
        )
    }
}
impl NetworkResponseGrid {
    pub fn grid(&self) -> &SkyGrid {
        &self.grid
    }
    pub fn kind(&self) -> MapKind {
        self.kind
    }
    /// Returns a reference to the `[n_dec,n_ra]` matrix of values
    pub fn data(&self) -> &DMatrix<f64> {
        &self.data
    }
    /// Consumes the map and returns the `[n_dec,n_ra]` matrix of values
    pub fn into_data(self) -> DMatrix<f64> {
        self.data
    }
    /// Returns the number of declinations and right ascensions
    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }
    /// Returns the value at the declination index `i` and right ascension index `j`
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.data.get((i, j)).copied()
    }
    /// Iterates over the declination rows
    pub fn rows(&self) -> impl Iterator<Item = Vec<f64>> + '_ {
        self.data
            .row_iter()
            .map(|row| row.iter().copied().collect())
    }
    /// Returns the smallest value, 0 for an empty map
    pub fn min(&self) -> f64 {
        if self.data.is_empty() {
            0.
        } else {
            self.data.min()
        }
    }
    /// Returns the largest value, 0 for an empty map
    pub fn max(&self) -> f64 {
        if self.data.is_empty() {
            0.
        } else {
            self.data.max()
        }
    }
    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            0.
        } else {
            self.data.mean()
        }
    }
}

/// [Network] builder
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    detectors: Vec<Detector>,
    clock: SiderealClock,
    policy: DpfPolicy,
    kind: MapKind,
}
impl NetworkBuilder {
    /// Adds the detectors `ids` from the `catalog`
    pub fn detectors<S: AsRef<str>>(
        mut self,
        catalog: &DetectorCatalog,
        ids: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        for id in ids {
            self.detectors.push(catalog.get(id.as_ref())?.clone());
        }
        Ok(self)
    }
    /// Adds a detector
    pub fn detector(mut self, detector: Detector) -> Self {
        self.detectors.push(detector);
        self
    }
    /// Sets the [SiderealClock]
    pub fn clock(self, clock: SiderealClock) -> Self {
        Self { clock, ..self }
    }
    /// Sets the [DpfPolicy]
    pub fn dpf(self, policy: DpfPolicy) -> Self {
        Self { policy, ..self }
    }
    /// Sets the [MapKind]
    pub fn map(self, kind: MapKind) -> Self {
        Self { kind, ..self }
    }
    /// Creates a [Network]
    pub fn build(self) -> Result<Network> {
        if self.detectors.is_empty() {
            return Err(AntennaPatternError::EmptyNetwork);
        }
        let network = Network {
            detectors: self.detectors,
            clock: self.clock,
            policy: self.policy,
            kind: self.kind,
        };
        log::debug!("{network}");
        Ok(network)
    }
}

/// Network of detectors
#[derive(Debug, Clone)]
pub struct Network {
    detectors: Vec<Detector>,
    clock: SiderealClock,
    policy: DpfPolicy,
    kind: MapKind,
}
impl Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Network of {} detectors ({:?} DPF, {:?} map):",
            self.detectors.len(),
            self.policy,
            self.kind
        )?;
        for detector in &self.detectors {
            writeln!(f, " - {detector}")?;
        }
        Ok(())
    }
}
impl Network {
    /// Returns the [builder](NetworkBuilder)
    pub fn builder() -> NetworkBuilder {
        Default::default()
    }
    /// Returns the number of detectors
    pub fn len(&self) -> usize {
        self.detectors.len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn detectors(&self) -> &[Detector] {
        &self.detectors
    }
    pub fn clock(&self) -> &SiderealClock {
        &self.clock
    }
    /// Returns the detector identifiers and placements
    pub fn placements(&self) -> Vec<(&str, Geodetic)> {
        self.detectors
            .iter()
            .map(|d| (d.name(), d.geodetic()))
            .collect()
    }
    /// Returns each detector response after applying the [DpfPolicy]
    pub fn responses(
        &self,
        time: f64,
        direction: &SkyDirection,
        psi: f64,
    ) -> Result<Vec<AntennaResponsePair>> {
        let wave = WaveParameters::new(0., psi)?;
        let pairs = self
            .detectors
            .iter()
            .map(|detector| respond(detector, &self.clock, time, direction, &wave))
            .collect::<Result<Vec<_>>>()?;
        Ok(match self.policy {
            DpfPolicy::None => pairs,
            DpfPolicy::PerDetector => pairs
                .iter()
                .map(|f| DominantPolarizationFrame::from_pairs(&[*f]).rotate(f))
                .collect(),
            DpfPolicy::Network => DominantPolarizationFrame::from_pairs(&pairs).rotate_all(&pairs),
        })
    }
    /// Returns the network response at `time` `[s]` to a wave from `direction`
    /// with the polarization angle `psi` `[deg]`
    pub fn response(
        &self,
        time: f64,
        direction: &SkyDirection,
        psi: f64,
    ) -> Result<NetworkResponse> {
        Ok(NetworkResponse::from_pairs(
            &self.responses(time, direction, psi)?,
        ))
    }
    /// Evaluates the network [MapKind] on each sample of `grid`
    pub fn grid(&self, time: f64, grid: &SkyGrid, psi: f64) -> Result<NetworkResponseGrid> {
        let now = Instant::now();
        let rows = grid
            .declinations()
            .par_iter()
            .map(|&declination| {
                grid.right_ascensions()
                    .iter()
                    .map(|&right_ascension| {
                        let direction = SkyDirection::new(right_ascension, declination)?;
                        Ok(self.response(time, &direction, psi)?.value(self.kind))
                    })
                    .collect::<Result<Vec<f64>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        let (n_dec, n_ra) = grid.shape();
        let map = NetworkResponseGrid {
            grid: grid.clone(),
            kind: self.kind,
            data: DMatrix::from_row_iterator(n_dec, n_ra, rows.into_iter().flatten()),
        };
        log::info!("{map} in {:.3}s", now.elapsed().as_secs_f64());
        Ok(map)
    }
}

/// Returns the combined response of the detectors `ids` from the `catalog`
pub fn network_response<S: AsRef<str>>(
    catalog: &DetectorCatalog,
    clock: &SiderealClock,
    ids: impl IntoIterator<Item = S>,
    time: f64,
    direction: &SkyDirection,
    psi: f64,
) -> Result<NetworkResponse> {
    Network::builder()
        .detectors(catalog, ids)?
        .clock(*clock)
        .build()?
        .response(time, direction, psi)
}

/// Returns the combined sky map of the detectors `ids` from the `catalog`
///
/// The map is evaluated at `time` `[s]` on the grid of `declinations` and
/// `right_ascensions` `[deg]` for the polarization angle `psi` `[deg]`
#[allow(clippy::too_many_arguments)]
pub fn network_response_grid<S: AsRef<str>>(
    catalog: &DetectorCatalog,
    clock: &SiderealClock,
    ids: impl IntoIterator<Item = S>,
    time: f64,
    declinations: &[f64],
    right_ascensions: &[f64],
    psi: f64,
) -> Result<NetworkResponseGrid> {
    let grid = SkyGrid::new(declinations.to_vec(), right_ascensions.to_vec())?;
    Network::builder()
        .detectors(catalog, ids)?
        .clock(*clock)
        .build()?
        .grid(time, &grid, psi)
}
