//! Dominant polarization frame
//!
//! The polarization angle `ψ` that maximizes `ΣF+²` and cancels `ΣF+Fx` over a set of
//! responses, in closed form:
//!
//! `ψ = atan2(2ΣF+Fx, ΣF+² - ΣFx²)/4`
//!
//! Rotating each response by `ψ` (see [AntennaResponsePair::rotate]) gives the response
//! at the polarization angle increased by `ψ`, so the total power is preserved.

use crate::AntennaResponsePair;

fn sums(pairs: &[AntennaResponsePair]) -> (f64, f64, f64) {
    pairs.iter().fold((0f64, 0f64, 0f64), |(pp, cc, pc), f| {
        (
            pp + f.plus * f.plus,
            cc + f.cross * f.cross,
            pc + f.plus * f.cross,
        )
    })
}

/// Returns the dominant polarization angle in `[-45,45]` `[deg]` of a set of responses
///
/// The angle is `atan2(2ΣF+Fx, ΣF+² - ΣFx²)/4`, with `ΣF+²` first in the difference,
/// applied through [AntennaResponsePair::rotate] as a rotation of `(F+,Fx)` by `2ψ`.
/// The rotated responses have `ΣF+Fx = 0` and `ΣF+² >= ΣFx²`.
/// An empty set or a set of null responses returns 0.
pub fn dominant_polarization_angle(pairs: &[AntennaResponsePair]) -> f64 {
    let (pp, cc, pc) = sums(pairs);
    0.25 * (2. * pc).atan2(pp - cc).to_degrees()
}

/// Dominant polarization frame rotation
///
/// The frame angle is the [dominant_polarization_angle], shifted by 90 degrees when needed
/// for the rotated plus responses to sum to a non-negative value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DominantPolarizationFrame {
    psi: f64,
}
impl DominantPolarizationFrame {
    /// Computes the frame from one or several responses
    pub fn from_pairs(pairs: &[AntennaResponsePair]) -> Self {
        let psi = dominant_polarization_angle(pairs);
        let plus: f64 = pairs.iter().map(|f| f.rotate(psi).plus).sum();
        Self {
            psi: if plus < 0. { psi + 90. } else { psi },
        }
    }
    /// Returns the frame angle `[deg]`
    pub fn psi(&self) -> f64 {
        self.psi
    }
    /// Rotates a response into the frame
    pub fn rotate(&self, pair: &AntennaResponsePair) -> AntennaResponsePair {
        pair.rotate(self.psi)
    }
    /// Rotates all the responses into the frame
    pub fn rotate_all(&self, pairs: &[AntennaResponsePair]) -> Vec<AntennaResponsePair> {
        pairs.iter().map(|f| self.rotate(f)).collect()
    }
}
