//! Detector catalog
//!
//! An immutable mapping from detector identifiers to [Detector]s, built explicitly and
//! passed to the computations.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{AntennaPatternError, Detector, DetectorRecord, Geodetic, Result};

/// Vertex location `[m]` and x and y arm directions of the LIGO, Virgo, KAGRA and GEO600 interferometers
const LIGO_VIRGO_KAGRA: [(&str, [f64; 3], [f64; 3], [f64; 3]); 5] = [
    (
        "H1",
        [-2.161_414_926_36e6, -3.834_695_178_89e6, 4.600_350_226_64e6],
        [-0.223_892_661_54, 0.799_830_627_46, 0.556_904_878_31],
        [-0.913_978_185_74, 0.026_094_039_89, -0.404_923_421_25],
    ),
    (
        "L1",
        [-7.427_604_472_38e4, -5.496_283_719_71e6, 3.224_257_017_44e6],
        [-0.954_574_121_53, -0.141_580_773_40, -0.262_189_113_24],
        [0.297_741_568_94, -0.487_910_336_47, -0.820_544_612_86],
    ),
    (
        "V1",
        [4.546_374_099_00e6, 8.429_896_976_26e5, 4.378_576_962_41e6],
        [-0.700_458_214_79, 0.208_489_486_19, 0.682_561_662_77],
        [-0.053_792_553_68, -0.969_081_805_49, 0.240_804_517_08],
    ),
    (
        "K1",
        [-3_777_336.024, 3_484_898.411, 3_765_313.697],
        [-0.375_904_0, -0.836_158_3, 0.399_418_9],
        [0.716_437_8, 0.011_140_76, 0.697_562_0],
    ),
    (
        "G1",
        [3.856_309_949_26e6, 6.665_989_563_17e5, 5.019_641_417_25e6],
        [-0.445_306_769_05, 0.866_513_541_30, 0.225_513_113_12],
        [-0.626_057_567_76, -0.552_186_095_24, 0.550_583_724_86],
    ),
];

/// [DetectorCatalog] builder
#[derive(Debug, Default)]
pub struct DetectorCatalogBuilder {
    detectors: Vec<Detector>,
}
impl DetectorCatalogBuilder {
    /// Adds a [Detector], replacing any detector with the same identifier
    pub fn detector(mut self, detector: Detector) -> Self {
        self.detectors.push(detector);
        self
    }
    /// Adds a detector from a catalog [DetectorRecord]
    pub fn record(self, record: DetectorRecord) -> Result<Self> {
        Ok(self.detector(Detector::try_from(record)?))
    }
    /// Adds detectors from catalog [DetectorRecord]s
    pub fn records(self, records: impl IntoIterator<Item = DetectorRecord>) -> Result<Self> {
        records.into_iter().try_fold(self, |builder, record| builder.record(record))
    }
    /// Creates a [DetectorCatalog]
    pub fn build(self) -> DetectorCatalog {
        let mut detectors = BTreeMap::new();
        for detector in self.detectors {
            if let Some(previous) = detectors.insert(detector.name().to_string(), detector) {
                log::warn!("detector {} replaced in the catalog", previous.name());
            }
        }
        let catalog = DetectorCatalog { detectors };
        log::debug!("detector catalog: {:?}", catalog.ids().collect::<Vec<_>>());
        catalog
    }
}

/// Detector catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorCatalog {
    detectors: BTreeMap<String, Detector>,
}
impl<'a> TryFrom<&'a [u8]> for DetectorCatalog {
    type Error = AntennaPatternError;

    /// Decodes a [bincode] encoded catalog
    fn try_from(bytes: &'a [u8]) -> std::result::Result<Self, Self::Error> {
        Ok(bincode::deserialize(bytes)?)
    }
}
impl DetectorCatalog {
    /// Returns the [builder](DetectorCatalogBuilder)
    pub fn builder() -> DetectorCatalogBuilder {
        Default::default()
    }
    /// Returns a catalog with the H1, L1, V1, K1 and G1 detectors
    pub fn ligo_virgo_kagra() -> Self {
        LIGO_VIRGO_KAGRA
            .iter()
            .fold(Self::builder(), |builder, (name, location, x_arm, y_arm)| {
                builder.detector(
                    Detector::from_arms(
                        *name,
                        Vector3::from(*location),
                        Vector3::from(*x_arm),
                        Vector3::from(*y_arm),
                    )
                    .expect("built-in detector geometry is valid"),
                )
            })
            .build()
    }
    /// Encodes the catalog with [bincode]
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }
    /// Returns the detector `id`
    pub fn get(&self, id: &str) -> Result<&Detector> {
        self.detectors
            .get(id)
            .ok_or_else(|| AntennaPatternError::MissingDetector(id.to_string()))
    }
    pub fn contains(&self, id: &str) -> bool {
        self.detectors.contains_key(id)
    }
    /// Iterates over the detector identifiers in lexicographic order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.detectors.keys().map(String::as_str)
    }
    /// Iterates over the detectors
    pub fn iter(&self) -> impl Iterator<Item = &Detector> {
        self.detectors.values()
    }
    pub fn len(&self) -> usize {
        self.detectors.len()
    }
    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
    /// Returns the detector identifiers and placements
    pub fn placements(&self) -> Vec<(&str, Geodetic)> {
        self.iter().map(|d| (d.name(), d.geodetic())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ResponseGeometry, ResponseTensor};
    use approx::assert_abs_diff_eq;

    // published WGS-84 latitude and longitude [deg]
    const PUBLISHED: [(&str, f64, f64); 5] = [
        ("H1", 46.455_146_67, -119.407_657_14),
        ("L1", 30.562_894_33, -90.774_240_39),
        ("V1", 43.631_414_47, 10.504_496_61),
        ("K1", 36.411_860_34, 137.305_956_01),
        ("G1", 52.245_146_67, 9.807_192_78),
    ];

    #[test]
    fn builtin() {
        let catalog = DetectorCatalog::ligo_virgo_kagra();
        assert_eq!(catalog.len(), 5);
        assert_eq!(
            catalog.ids().collect::<Vec<_>>(),
            vec!["G1", "H1", "K1", "L1", "V1"]
        );
        assert!(catalog.contains("K1"));
        assert!(matches!(
            catalog.get("E3"),
            Err(AntennaPatternError::MissingDetector(_))
        ));
    }

    #[test]
    fn coordinate_round_trip() {
        let catalog = DetectorCatalog::ligo_virgo_kagra();
        for (id, latitude, longitude) in PUBLISHED {
            let detector = catalog.get(id).unwrap();
            let geodetic = crate::geodetic_from_location(detector.location()).unwrap();
            assert_abs_diff_eq!(geodetic.longitude, longitude, epsilon = 0.01);
            assert!((geodetic.latitude - latitude).abs() < 0.25);
            let wgs84 = detector.wgs84().unwrap();
            assert_abs_diff_eq!(wgs84.latitude, latitude, epsilon = 0.01);
            assert_abs_diff_eq!(wgs84.longitude, longitude, epsilon = 0.01);
            assert!(wgs84.height.abs() < 500.);
        }
    }

    #[test]
    fn arms_in_local_horizontal_plane() {
        let catalog = DetectorCatalog::ligo_virgo_kagra();
        for id in ["H1", "L1", "V1", "K1"] {
            let detector = catalog.get(id).unwrap();
            let (x, y) = detector.arms().unwrap();
            assert_abs_diff_eq!(x.dot(y), 0., epsilon = 1e-5);
            let wgs84 = detector.wgs84().unwrap();
            let (lat, lon) = (wgs84.latitude.to_radians(), wgs84.longitude.to_radians());
            let up = Vector3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin());
            assert_abs_diff_eq!(detector.zenith().dot(&up), 1., epsilon = 1e-4);
        }
    }

    #[test]
    fn records() {
        let catalog = DetectorCatalog::builder()
            .records([
                DetectorRecord {
                    name: "X1".into(),
                    location: [6.4e6, 0., 0.],
                    geometry: ResponseGeometry::Arms {
                        x_arm: [0., 1., 0.],
                        y_arm: [0., 0., 1.],
                    },
                },
                DetectorRecord {
                    name: "T1".into(),
                    location: [0., 6.4e6, 0.],
                    geometry: ResponseGeometry::Tensor([
                        [0.5, 0., 0.],
                        [0., 0., 0.],
                        [0., 0., -0.5],
                    ]),
                },
            ])
            .unwrap()
            .build();
        assert_eq!(catalog.len(), 2);
        assert_abs_diff_eq!(catalog.get("T1").unwrap().zenith().y, 1., epsilon = 1e-12);
        let bad = DetectorCatalog::builder().record(DetectorRecord {
            name: "B1".into(),
            location: [0., 0., 0.],
            geometry: ResponseGeometry::Arms {
                x_arm: [0., 1., 0.],
                y_arm: [0., 0., 1.],
            },
        });
        assert!(matches!(
            bad,
            Err(AntennaPatternError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn replaced_detector() {
        let catalog = DetectorCatalog::ligo_virgo_kagra();
        let h1 = catalog.get("H1").unwrap().clone();
        let moved = Detector::from_tensor("H1", -*h1.location(), h1.response_tensor()).unwrap();
        let catalog = DetectorCatalog::builder()
            .detector(h1)
            .detector(moved.clone())
            .build();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("H1").unwrap(), &moved);
    }

    #[test]
    fn bincode_exchange() {
        let catalog = DetectorCatalog::ligo_virgo_kagra();
        let bytes = catalog.to_bytes().unwrap();
        let decoded = DetectorCatalog::try_from(bytes.as_slice()).unwrap();
        assert_eq!(decoded.ids().collect::<Vec<_>>(), catalog.ids().collect::<Vec<_>>());
        let (h1, decoded_h1) = (catalog.get("H1").unwrap(), decoded.get("H1").unwrap());
        assert_eq!(h1.location(), decoded_h1.location());
        assert_abs_diff_eq!(
            (h1.response_tensor() - decoded_h1.response_tensor()).amax(),
            0.,
            epsilon = 1e-15
        );
        assert!(matches!(
            DetectorCatalog::try_from(&bytes[..7]),
            Err(AntennaPatternError::Catalog(_))
        ));
    }
}
