//! Catalogue of common area detectors: pixel pitch, full shape and the
//! inter-module gaps whose pixels carry no signal.
use crate::types::ImageShape;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectorModel {
    Perkin,
    Pilatus1M,
    Pilatus2M,
    Eiger4M,
}

/// Module tiling: `module` rows × cols, separated by `gap` rows × cols.
struct Tiling {
    module: (usize, usize),
    gap: (usize, usize),
}

const PILATUS_TILING: Tiling = Tiling {
    module: (195, 487),
    gap: (17, 7),
};

const EIGER_TILING: Tiling = Tiling {
    module: (514, 1030),
    gap: (37, 10),
};

impl DetectorModel {
    /// Look up a detector by the name used in `.poni` files.
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "perkin" | "perkinelmer" | "perkindetector" => Some(DetectorModel::Perkin),
            "pilatus1m" => Some(DetectorModel::Pilatus1M),
            "pilatus2m" => Some(DetectorModel::Pilatus2M),
            "eiger4m" => Some(DetectorModel::Eiger4M),
            _ => None,
        }
    }

    /// Pixel pitch in metres as (pixel1, pixel2) = (row direction, column direction).
    pub fn pixel_size(self) -> (f64, f64) {
        match self {
            DetectorModel::Perkin => (200e-6, 200e-6),
            DetectorModel::Pilatus1M | DetectorModel::Pilatus2M => (172e-6, 172e-6),
            DetectorModel::Eiger4M => (75e-6, 75e-6),
        }
    }

    pub fn shape(self) -> ImageShape {
        match self {
            DetectorModel::Perkin => ImageShape::new(2048, 2048),
            DetectorModel::Pilatus1M => ImageShape::new(981, 1043),
            DetectorModel::Pilatus2M => ImageShape::new(1475, 1679),
            DetectorModel::Eiger4M => ImageShape::new(2070, 2167),
        }
    }

    /// True when (`col`, `row`) falls in a dead gap between modules.
    pub fn is_gap(self, col: usize, row: usize) -> bool {
        let tiling = match self {
            DetectorModel::Perkin => return false,
            DetectorModel::Pilatus1M | DetectorModel::Pilatus2M => &PILATUS_TILING,
            DetectorModel::Eiger4M => &EIGER_TILING,
        };
        let row_period = tiling.module.0 + tiling.gap.0;
        let col_period = tiling.module.1 + tiling.gap.1;
        row % row_period >= tiling.module.0 || col % col_period >= tiling.module.1
    }
}
