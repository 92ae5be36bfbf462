//! Fixed, ordered lists of member options.
//!
//! Catalog order is load-bearing: it defines the bit order inside each one-hot
//! block of the encoded problem, so the same catalog snapshot must be used to
//! encode and to decode. Providers hand out `Arc` snapshots that never change
//! after construction.

use super::member::MemberSize;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog '{name}' is empty")]
    Empty { name: &'static str },
    #[error("Catalog '{name}' entry {index} is not a positive finite value")]
    InvalidEntry { name: &'static str, index: usize },
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

/// Anything that can sit in a catalog and be checked for sanity.
pub trait CatalogEntry {
    fn is_valid(&self) -> bool;
}

impl CatalogEntry for f64 {
    fn is_valid(&self) -> bool {
        self.is_finite() && *self > 0.0
    }
}

impl CatalogEntry for MemberSize {
    fn is_valid(&self) -> bool {
        self.width_mm.is_valid() && self.depth_mm.is_valid()
    }
}

/// A concrete mix option with its delivered price per cubic metre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConcreteGrade {
    pub fc_mpa: f64,
    pub price_per_m3: f64,
}

impl CatalogEntry for ConcreteGrade {
    fn is_valid(&self) -> bool {
        self.fc_mpa.is_valid() && self.price_per_m3.is_valid()
    }
}

/// An ordered, non-empty list of options for one decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SizeCatalog<T> {
    options: Vec<T>,
}

impl<T: CatalogEntry> SizeCatalog<T> {
    pub fn new(name: &'static str, options: Vec<T>) -> Result<Self, CatalogError> {
        if options.is_empty() {
            return Err(CatalogError::Empty { name });
        }
        if let Some(index) = options.iter().position(|o| !o.is_valid()) {
            return Err(CatalogError::InvalidEntry { name, index });
        }
        Ok(Self { options })
    }

    /// For built-in lists that are known to be non-empty and valid.
    pub(crate) fn from_valid(options: Vec<T>) -> Self {
        debug_assert!(!options.is_empty() && options.iter().all(CatalogEntry::is_valid));
        Self { options }
    }
}

impl<T> SizeCatalog<T> {
    pub fn options(&self) -> &[T] {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.options.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.options.iter()
    }
}

/// Catalogs for the member-sizing problem, in encoding order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberCatalogs {
    pub columns: SizeCatalog<MemberSize>,
    pub beams: SizeCatalog<MemberSize>,
    pub slabs: SizeCatalog<f64>,
    pub footings: SizeCatalog<MemberSize>,
}

const REFERENCE_COLUMNS: [f64; 10] = [
    200.0, 225.0, 250.0, 275.0, 300.0, 325.0, 350.0, 400.0, 450.0, 500.0,
];
const REFERENCE_BEAMS: [(f64, f64); 10] = [
    (200.0, 250.0),
    (200.0, 300.0),
    (200.0, 350.0),
    (250.0, 350.0),
    (250.0, 400.0),
    (250.0, 450.0),
    (300.0, 450.0),
    (300.0, 500.0),
    (300.0, 550.0),
    (350.0, 600.0),
];
const REFERENCE_SLABS: [f64; 10] = [
    100.0, 110.0, 120.0, 125.0, 130.0, 140.0, 150.0, 175.0, 200.0, 250.0,
];
const REFERENCE_FOOTINGS: [f64; 10] = [
    600.0, 700.0, 800.0, 900.0, 1000.0, 1100.0, 1200.0, 1400.0, 1500.0, 1800.0,
];

impl MemberCatalogs {
    pub fn new(
        columns: Vec<MemberSize>,
        beams: Vec<MemberSize>,
        slabs: Vec<f64>,
        footings: Vec<MemberSize>,
    ) -> Result<Self, CatalogError> {
        Ok(Self {
            columns: SizeCatalog::new("columns", columns)?,
            beams: SizeCatalog::new("beams", beams)?,
            slabs: SizeCatalog::new("slabs", slabs)?,
            footings: SizeCatalog::new("footings", footings)?,
        })
    }

    /// Ten options per member class, forty binary variables in total.
    pub fn reference() -> Self {
        Self {
            columns: SizeCatalog {
                options: REFERENCE_COLUMNS.iter().map(|&s| MemberSize::square(s)).collect(),
            },
            beams: SizeCatalog {
                options: REFERENCE_BEAMS
                    .iter()
                    .map(|&(w, d)| MemberSize::new(w, d))
                    .collect(),
            },
            slabs: SizeCatalog {
                options: REFERENCE_SLABS.to_vec(),
            },
            footings: SizeCatalog {
                options: REFERENCE_FOOTINGS.iter().map(|&s| MemberSize::square(s)).collect(),
            },
        }
    }

    pub fn total_options(&self) -> usize {
        self.columns.len() + self.beams.len() + self.slabs.len() + self.footings.len()
    }

    /// Mean slab thickness over the catalog (mm).
    pub fn average_slab_thickness_mm(&self) -> f64 {
        self.slabs.iter().sum::<f64>() / self.slabs.len() as f64
    }
}

/// Catalogs for the fixed-member material problem.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialCatalogs {
    pub concrete_grades: SizeCatalog<ConcreteGrade>,
    /// Longitudinal steel ratios, in percent of the gross section.
    pub steel_ratios_percent: SizeCatalog<f64>,
    pub steel_price_per_kg: f64,
}

const REFERENCE_GRADES: [(f64, f64); 7] = [
    (21.0, 4000.0),
    (24.0, 4200.0),
    (28.0, 4500.0),
    (32.0, 5000.0),
    (35.0, 5500.0),
    (40.0, 6200.0),
    (45.0, 7000.0),
];
const REFERENCE_STEEL_RATIOS: [f64; 7] = [1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0];

impl MaterialCatalogs {
    pub fn reference() -> Self {
        Self {
            concrete_grades: SizeCatalog {
                options: REFERENCE_GRADES
                    .iter()
                    .map(|&(fc_mpa, price_per_m3)| ConcreteGrade {
                        fc_mpa,
                        price_per_m3,
                    })
                    .collect(),
            },
            steel_ratios_percent: SizeCatalog {
                options: REFERENCE_STEEL_RATIOS.to_vec(),
            },
            steel_price_per_kg: 65.0,
        }
    }
}

/// Source of catalog snapshots for the encoder and decoder.
pub trait CatalogProvider: Send + Sync {
    fn member_catalogs(&self) -> Arc<MemberCatalogs>;
    fn material_catalogs(&self) -> Arc<MaterialCatalogs>;
}

#[derive(Debug, Clone)]
pub struct ReferenceCatalogs {
    members: Arc<MemberCatalogs>,
    materials: Arc<MaterialCatalogs>,
}

impl Default for ReferenceCatalogs {
    fn default() -> Self {
        Self {
            members: Arc::new(MemberCatalogs::reference()),
            materials: Arc::new(MaterialCatalogs::reference()),
        }
    }
}

impl CatalogProvider for ReferenceCatalogs {
    fn member_catalogs(&self) -> Arc<MemberCatalogs> {
        Arc::clone(&self.members)
    }

    fn material_catalogs(&self) -> Arc<MaterialCatalogs> {
        Arc::clone(&self.materials)
    }
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct FileMemberCatalogs {
    columns: Vec<(f64, f64)>,
    beams: Vec<(f64, f64)>,
    slabs: Vec<f64>,
    footings: Vec<(f64, f64)>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct FileMaterialCatalogs {
    concrete_grades: Vec<ConcreteGrade>,
    steel_ratios_percent: Vec<f64>,
    steel_price_per_kg: f64,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct FileCatalogs {
    members: Option<FileMemberCatalogs>,
    materials: Option<FileMaterialCatalogs>,
}

/// Catalogs read once from a TOML file. Missing sections fall back to the
/// reference catalogs.
#[derive(Debug, Clone)]
pub struct TomlCatalogProvider {
    members: Arc<MemberCatalogs>,
    materials: Arc<MaterialCatalogs>,
}

impl TomlCatalogProvider {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        debug!("Loading catalogs from file: {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let file: FileCatalogs = toml::from_str(&content).map_err(|e| CatalogError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_file_catalogs(file)
    }

    fn from_file_catalogs(file: FileCatalogs) -> Result<Self, CatalogError> {
        let to_sizes = |pairs: Vec<(f64, f64)>| {
            pairs
                .into_iter()
                .map(|(w, d)| MemberSize::new(w, d))
                .collect::<Vec<_>>()
        };

        let members = match file.members {
            Some(m) => MemberCatalogs::new(
                to_sizes(m.columns),
                to_sizes(m.beams),
                m.slabs,
                to_sizes(m.footings),
            )?,
            None => MemberCatalogs::reference(),
        };

        let materials = match file.materials {
            Some(m) => {
                if !m.steel_price_per_kg.is_valid() {
                    return Err(CatalogError::InvalidEntry {
                        name: "steel-price-per-kg",
                        index: 0,
                    });
                }
                MaterialCatalogs {
                    concrete_grades: SizeCatalog::new("concrete-grades", m.concrete_grades)?,
                    steel_ratios_percent: SizeCatalog::new(
                        "steel-ratios-percent",
                        m.steel_ratios_percent,
                    )?,
                    steel_price_per_kg: m.steel_price_per_kg,
                }
            }
            None => MaterialCatalogs::reference(),
        };

        Ok(Self {
            members: Arc::new(members),
            materials: Arc::new(materials),
        })
    }
}

impl CatalogProvider for TomlCatalogProvider {
    fn member_catalogs(&self) -> Arc<MemberCatalogs> {
        Arc::clone(&self.members)
    }

    fn material_catalogs(&self) -> Arc<MaterialCatalogs> {
        Arc::clone(&self.materials)
    }
}
