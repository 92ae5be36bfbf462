use crate::cli::CatalogArgs;
use crate::error::Result;
use crate::utils::output::{self, CatalogListing};

pub fn run(args: CatalogArgs) -> Result<()> {
    let provider = super::catalog_provider(args.catalog_file.as_deref())?;
    let members = provider.member_catalogs();
    let materials = provider.material_catalogs();

    if args.json {
        let listing = CatalogListing {
            members: &members,
            materials: &materials,
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        println!("{}", output::catalog_listing(&members, &materials));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use std::fs;

    #[test]
    fn prints_reference_catalogs() {
        assert!(
            run(CatalogArgs {
                catalog_file: None,
                json: true,
            })
            .is_ok()
        );
    }

    #[test]
    fn malformed_catalog_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalogs.toml");
        fs::write(&path, "[members]\ncolumns = []\n").unwrap();
        let result = run(CatalogArgs {
            catalog_file: Some(path),
            json: false,
        });
        assert!(matches!(result, Err(CliError::Catalog(_))));
    }
}
