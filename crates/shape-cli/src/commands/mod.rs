pub mod check;
pub mod describe;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use shape_config::ShapeConfig;
use shape_schema::{RecordType, SchemaManifest, TypeCatalog};

use crate::cli::SchemaArgs;

/// Load the manifest named on the command line, or the configured one.
pub fn load_catalog(args: &SchemaArgs, config: &ShapeConfig) -> anyhow::Result<TypeCatalog> {
    let Some(path) = args.schema.as_deref().or(config.engine.manifest.as_deref()) else {
        bail!("no schema manifest given; pass --schema or set engine.manifest");
    };
    catalog_from_path(path, config)
}

pub fn catalog_from_path(path: &Path, config: &ShapeConfig) -> anyhow::Result<TypeCatalog> {
    let catalog = SchemaManifest::load(path)?
        .with_default_mode(config.engine.key_mode)
        .into_catalog(config.engine.propagation, config.engine.policy())
        .with_context(|| format!("failed to build schema from {}", path.display()))?;
    tracing::debug!(path = %path.display(), types = catalog.len(), "schema catalog ready");
    Ok(catalog)
}

/// The named type, or the only type when no name is given.
pub fn resolve_type(
    catalog: &TypeCatalog,
    name: Option<&str>,
) -> anyhow::Result<Arc<RecordType>> {
    if let Some(name) = name {
        return Ok(catalog.record_type(name)?);
    }
    let mut names = catalog.names();
    match (names.next(), names.next()) {
        (Some(only), None) => Ok(catalog.record_type(only)?),
        (None, _) => bail!("schema manifest declares no record types"),
        (Some(_), Some(_)) => bail!(
            "schema manifest declares several record types ({}); pass --type",
            catalog.names().collect::<Vec<_>>().join(", ")
        ),
    }
}
