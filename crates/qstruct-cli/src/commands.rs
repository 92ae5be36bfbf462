pub mod analyze;
pub mod blocks;
pub mod catalog;
pub mod materials;
pub mod optimize;

use crate::error::Result;
use qstruct::core::models::catalog::{CatalogProvider, ReferenceCatalogs, TomlCatalogProvider};
use std::path::Path;
use tracing::info;

/// Catalogs from `path` when given, otherwise the built-in reference lists.
pub(crate) fn catalog_provider(path: Option<&Path>) -> Result<Box<dyn CatalogProvider>> {
    match path {
        Some(p) => {
            info!("Loading catalogs from {:?}", p);
            Ok(Box::new(TomlCatalogProvider::load(p)?))
        }
        None => Ok(Box::new(ReferenceCatalogs::default())),
    }
}
