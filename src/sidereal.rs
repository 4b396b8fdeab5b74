//! Earth rotation angle from a global time reference
//!
//! The [SiderealClock] is a linear map from elapsed time to the rotation angle of the
//! Earth-fixed frame with respect to the celestial frame: 360 degrees per sidereal day
//! from a reference instant where the angle is known.
//! Calendar or timezone corrections are not inferred: they are given to the clock as an
//! explicit time offset.

use serde::{Deserialize, Serialize};

use crate::{finite, AntennaPatternError, Result};

/// Length of the mean sidereal day `[s]`
pub const SIDEREAL_DAY: f64 = 86_164.090_5;
/// J2000.0 epoch in GPS seconds
pub const J2000_GPS: f64 = 630_763_148.816;
/// Greenwich mean sidereal angle at J2000.0 `[deg]`
pub const J2000_GREENWICH_ANGLE: f64 = 280.460_618_37;

/// Wraps an angle in `[0,360)`
pub(crate) fn wrap_360(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.);
    if a >= 360. {
        0.
    } else {
        a
    }
}
/// Wraps an angle in `(-180,180]`
pub(crate) fn wrap_180(angle: f64) -> f64 {
    let a = wrap_360(angle);
    if a > 180. {
        a - 360.
    } else {
        a
    }
}

/// Sidereal clock
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSiderealClock")]
pub struct SiderealClock {
    reference_time: f64,
    reference_angle: f64,
    offset: f64,
}
#[derive(Deserialize)]
struct RawSiderealClock {
    reference_time: f64,
    reference_angle: f64,
    offset: f64,
}
impl TryFrom<RawSiderealClock> for SiderealClock {
    type Error = AntennaPatternError;

    fn try_from(raw: RawSiderealClock) -> Result<Self> {
        SiderealClock::builder()
            .reference(raw.reference_time, raw.reference_angle)
            .offset(raw.offset)
            .build()
    }
}
impl Default for SiderealClock {
    /// Clock referenced to J2000.0 in GPS seconds without time offset
    fn default() -> Self {
        Self {
            reference_time: J2000_GPS,
            reference_angle: J2000_GREENWICH_ANGLE,
            offset: 0.,
        }
    }
}

/// [SiderealClock] builder
#[derive(Debug, Default)]
pub struct SiderealClockBuilder {
    clock: SiderealClock,
}
impl SiderealClockBuilder {
    /// Sets the reference instant `[s]` and the Greenwich angle `[deg]` at that instant
    pub fn reference(self, time: f64, angle: f64) -> Self {
        Self {
            clock: SiderealClock {
                reference_time: time,
                reference_angle: angle,
                ..self.clock
            },
        }
    }
    /// Sets the offset `[s]` added to every time given to the clock
    pub fn offset(self, offset: f64) -> Self {
        Self {
            clock: SiderealClock {
                offset,
                ..self.clock
            },
        }
    }
    /// Creates a [SiderealClock]
    pub fn build(self) -> Result<SiderealClock> {
        let SiderealClock {
            reference_time,
            reference_angle,
            offset,
        } = self.clock;
        Ok(SiderealClock {
            reference_time: finite("reference time", reference_time)?,
            reference_angle: wrap_360(finite("reference angle", reference_angle)?),
            offset: finite("time offset", offset)?,
        })
    }
}

impl SiderealClock {
    /// Returns the [builder](SiderealClockBuilder)
    pub fn builder() -> SiderealClockBuilder {
        Default::default()
    }
    /// Returns the reference instant `[s]`
    pub fn reference_time(&self) -> f64 {
        self.reference_time
    }
    /// Returns the time offset `[s]`
    pub fn offset(&self) -> f64 {
        self.offset
    }
    /// Returns the Greenwich rotation angle in `[0,360)` at `time` `[s]`
    pub fn greenwich_angle(&self, time: f64) -> Result<f64> {
        let elapsed = finite("time", time)? + self.offset - self.reference_time;
        Ok(wrap_360(
            self.reference_angle + 360. * (elapsed / SIDEREAL_DAY).fract(),
        ))
    }
    /// Returns the local rotation angle in `[0,360)` at `time` `[s]` for the east `longitude` `[deg]`
    ///
    /// This is the right ascension on the meridian of that longitude.
    pub fn local_angle(&self, time: f64, longitude: f64) -> Result<f64> {
        Ok(wrap_360(
            self.greenwich_angle(time)? + finite("longitude", longitude)?,
        ))
    }
    /// Returns the hour angle in `(-180,180]` of the `right_ascension` `[deg]`
    /// at `time` `[s]` for the east `longitude` `[deg]`
    pub fn hour_angle(&self, time: f64, right_ascension: f64, longitude: f64) -> Result<f64> {
        Ok(wrap_180(
            self.local_angle(time, longitude)? - finite("right ascension", right_ascension)?,
        ))
    }
}
