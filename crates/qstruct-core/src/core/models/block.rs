//! Interlocking hollow masonry blocks.
//!
//! A block is a `length × width × height` prism with vertical cores for grout
//! and reinforcing bars, and studs ("nubs") on its top face that key into the
//! course above. Dimensions are in millimetres unless a name says otherwise.

use super::catalog::{CatalogEntry, CatalogError, SizeCatalog};
use super::{ValidationError, require_positive};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

pub const CORES_PER_BLOCK: u32 = 2;
pub const BLOCK_DENSITY_KG_M3: f64 = 2200.0;
/// Cover left around a bar on each side of its core.
pub const CORE_BAR_COVER_MM: f64 = 10.0;
/// Cores that take bars thinner than this hold one bar, otherwise two.
pub const DOUBLE_BAR_MIN_MM: f64 = 20.0;
pub const VERTICAL_BAR_SPACING_M: f64 = 0.6;
pub const BOND_BEAM_SPACING_M: f64 = 0.6;

fn circle_area(diameter_mm: f64) -> f64 {
    PI * diameter_mm * diameter_mm / 4.0
}

/// Outline of the block as laid in the wall: run along the wall and course height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockFace {
    pub length_mm: f64,
    pub height_mm: f64,
}

impl BlockFace {
    pub const fn new(length_mm: f64, height_mm: f64) -> Self {
        Self {
            length_mm,
            height_mm,
        }
    }

    pub fn area_mm2(&self) -> f64 {
        self.length_mm * self.height_mm
    }

    pub fn blocks_per_m2(&self) -> f64 {
        1.0e6 / self.area_mm2()
    }
}

impl fmt::Display for BlockFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.length_mm, self.height_mm)
    }
}

/// Wall thickness and the diameter of each core.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockSection {
    pub width_mm: f64,
    pub core_diameter_mm: f64,
}

impl BlockSection {
    pub const fn new(width_mm: f64, core_diameter_mm: f64) -> Self {
        Self {
            width_mm,
            core_diameter_mm,
        }
    }

    pub fn core_area_mm2(&self) -> f64 {
        CORES_PER_BLOCK as f64 * circle_area(self.core_diameter_mm)
    }

    /// Combined thickness of the two face shells beside a core.
    pub fn shell_thickness_mm(&self) -> f64 {
        self.width_mm - self.core_diameter_mm
    }
}

impl fmt::Display for BlockSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} wide, ⌀{} cores", self.width_mm, self.core_diameter_mm)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NubPattern {
    pub count: u32,
    pub diameter_mm: f64,
    pub height_mm: f64,
}

impl NubPattern {
    pub const fn new(count: u32, diameter_mm: f64, height_mm: f64) -> Self {
        Self {
            count,
            diameter_mm,
            height_mm,
        }
    }

    pub fn volume_mm3(&self) -> f64 {
        self.count as f64 * circle_area(self.diameter_mm) * self.height_mm
    }
}

impl fmt::Display for NubPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} × ⌀{}x{}", self.count, self.diameter_mm, self.height_mm)
    }
}

impl CatalogEntry for BlockFace {
    fn is_valid(&self) -> bool {
        self.length_mm.is_valid() && self.height_mm.is_valid()
    }
}

impl CatalogEntry for BlockSection {
    fn is_valid(&self) -> bool {
        self.width_mm.is_valid() && self.core_diameter_mm.is_valid()
    }
}

impl CatalogEntry for NubPattern {
    fn is_valid(&self) -> bool {
        self.count > 0 && self.diameter_mm.is_valid() && self.height_mm.is_valid()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RebarCapacity {
    pub max_bar_diameter_mm: f64,
    pub bars_per_core: u32,
    pub total_bars: u32,
}

/// One complete block geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HollowBlock {
    pub face: BlockFace,
    pub section: BlockSection,
    pub nubs: NubPattern,
}

impl HollowBlock {
    pub fn new(face: BlockFace, section: BlockSection, nubs: NubPattern) -> Self {
        Self {
            face,
            section,
            nubs,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_positive("length_mm", self.face.length_mm)?;
        require_positive("height_mm", self.face.height_mm)?;
        require_positive("width_mm", self.section.width_mm)?;
        require_positive("core_diameter_mm", self.section.core_diameter_mm)?;
        require_positive("nub_diameter_mm", self.nubs.diameter_mm)?;
        require_positive("nub_height_mm", self.nubs.height_mm)?;
        if self.nubs.height_mm >= self.face.height_mm {
            return Err(ValidationError::new(
                "nub_height_mm",
                self.nubs.height_mm,
                "must be below the block height",
            ));
        }
        if self.net_area_mm2() <= 0.0 {
            return Err(ValidationError::new(
                "core_diameter_mm",
                self.section.core_diameter_mm,
                "cores leave no solid material",
            ));
        }
        Ok(())
    }

    /// Bed area, `length · width`.
    pub fn gross_area_mm2(&self) -> f64 {
        self.face.length_mm * self.section.width_mm
    }

    pub fn net_area_mm2(&self) -> f64 {
        self.gross_area_mm2() - self.section.core_area_mm2()
    }

    pub fn solid_ratio(&self) -> f64 {
        self.net_area_mm2() / self.gross_area_mm2()
    }

    /// Body below the nub recess plus the nubs themselves.
    pub fn solid_volume_mm3(&self) -> f64 {
        self.net_area_mm2() * (self.face.height_mm - self.nubs.height_mm) + self.nubs.volume_mm3()
    }

    pub fn weight_kg(&self) -> f64 {
        self.solid_volume_mm3() / 1.0e9 * BLOCK_DENSITY_KG_M3
    }

    /// Concrete in one square metre of wall face.
    pub fn concrete_m3_per_m2(&self) -> f64 {
        self.solid_volume_mm3() / self.face.area_mm2() / 1000.0
    }

    pub fn rebar_capacity(&self) -> RebarCapacity {
        let max_bar_diameter_mm = self.section.core_diameter_mm - 2.0 * CORE_BAR_COVER_MM;
        let bars_per_core = if max_bar_diameter_mm < DOUBLE_BAR_MIN_MM { 1 } else { 2 };
        RebarCapacity {
            max_bar_diameter_mm,
            bars_per_core,
            total_bars: CORES_PER_BLOCK * bars_per_core,
        }
    }
}

/// Quantities for a plain rectangular wall laid in one block geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WallEstimate {
    pub length_m: f64,
    pub height_m: f64,
    pub blocks: u64,
    pub block_weight_kg: f64,
    pub grout_m3: f64,
    pub rebar_m: f64,
}

impl WallEstimate {
    pub fn new(block: &HollowBlock, length_m: f64, height_m: f64) -> Self {
        let area_m2 = length_m * height_m;
        let blocks = (block.face.blocks_per_m2() * area_m2).ceil() as u64;
        // Grout fills every core over the whole wall, cut blocks included.
        let grout_m3 = block.face.blocks_per_m2() * area_m2 * block.section.core_area_mm2()
            * block.face.height_mm
            / 1.0e9;

        let vertical_bars = (length_m / VERTICAL_BAR_SPACING_M).ceil() + 1.0;
        let bond_beams = (height_m / BOND_BEAM_SPACING_M).ceil();
        Self {
            length_m,
            height_m,
            blocks,
            block_weight_kg: blocks as f64 * block.weight_kg(),
            grout_m3,
            rebar_m: vertical_bars * height_m + bond_beams * length_m,
        }
    }
}

/// Block options in encoding order: faces, sections, nub patterns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockCatalogs {
    pub faces: SizeCatalog<BlockFace>,
    pub sections: SizeCatalog<BlockSection>,
    pub nubs: SizeCatalog<NubPattern>,
}

pub const REFERENCE_LENGTHS_MM: [f64; 5] = [300.0, 350.0, 400.0, 450.0, 500.0];
pub const REFERENCE_HEIGHTS_MM: [f64; 4] = [150.0, 175.0, 200.0, 225.0];
pub const REFERENCE_WIDTHS_MM: [f64; 4] = [100.0, 150.0, 200.0, 250.0];
pub const REFERENCE_CORE_DIAMETERS_MM: [f64; 5] = [60.0, 70.0, 80.0, 90.0, 100.0];
pub const REFERENCE_NUBS: [NubPattern; 5] = [
    NubPattern::new(2, 50.0, 20.0),
    NubPattern::new(2, 60.0, 25.0),
    NubPattern::new(3, 40.0, 20.0),
    NubPattern::new(3, 50.0, 25.0),
    NubPattern::new(4, 40.0, 20.0),
];

impl BlockCatalogs {
    pub fn new(
        faces: Vec<BlockFace>,
        sections: Vec<BlockSection>,
        nubs: Vec<NubPattern>,
    ) -> Result<Self, CatalogError> {
        Ok(Self {
            faces: SizeCatalog::new("faces", faces)?,
            sections: SizeCatalog::new("sections", sections)?,
            nubs: SizeCatalog::new("nubs", nubs)?,
        })
    }

    /// Every reference length with every height, and every width with every
    /// core diameter.
    pub fn reference() -> Self {
        let faces = REFERENCE_LENGTHS_MM
            .iter()
            .flat_map(|&l| REFERENCE_HEIGHTS_MM.iter().map(move |&h| BlockFace::new(l, h)))
            .collect();
        let sections = REFERENCE_WIDTHS_MM
            .iter()
            .flat_map(|&w| {
                REFERENCE_CORE_DIAMETERS_MM
                    .iter()
                    .map(move |&d| BlockSection::new(w, d))
            })
            .collect();
        Self {
            faces: SizeCatalog::from_valid(faces),
            sections: SizeCatalog::from_valid(sections),
            nubs: SizeCatalog::from_valid(REFERENCE_NUBS.to_vec()),
        }
    }
}
