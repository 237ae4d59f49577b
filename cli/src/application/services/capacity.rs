//! Capacity checks against the provider's SKU catalog.
//!
//! The catalog is re-read for every record; availability can change during a
//! long batch.

use crate::application::ports::{CatalogSku, SkuCatalog};

const VM_RESOURCE_TYPE: &str = "virtualMachines";
const SNAPSHOT_RESOURCE_TYPE: &str = "snapshots";

fn offers(sku: &CatalogSku, location: &str) -> bool {
    sku.locations.iter().any(|l| l.eq_ignore_ascii_case(location))
}

/// Whether the catalog lists VM size `size` in `location`.
#[must_use]
pub fn sku_offered(skus: &[CatalogSku], location: &str, size: &str) -> bool {
    skus.iter().any(|s| {
        s.resource_type.eq_ignore_ascii_case(VM_RESOURCE_TYPE)
            && s.name.eq_ignore_ascii_case(size)
            && offers(s, location)
    })
}

/// Whether VM size `size` can be created in `location`.
///
/// Fails closed: a catalog read failure is logged as an error and reported as
/// unavailable.
pub async fn is_sku_available(catalog: &impl SkuCatalog, location: &str, size: &str) -> bool {
    match catalog.list_skus().await {
        Ok(skus) => sku_offered(&skus, location, size),
        Err(e) => {
            tracing::error!("Failed to read the SKU catalog for {location}: {e:#}");
            false
        }
    }
}

/// Snapshot redundancy classes offered in `location`.
///
/// Returns an empty list when the catalog cannot be read.
pub async fn snapshot_skus(catalog: &impl SkuCatalog, location: &str) -> Vec<String> {
    match catalog.list_skus().await {
        Ok(skus) => skus
            .into_iter()
            .filter(|s| {
                s.resource_type.eq_ignore_ascii_case(SNAPSHOT_RESOURCE_TYPE) && offers(s, location)
            })
            .map(|s| s.name)
            .collect(),
        Err(e) => {
            tracing::warn!("Failed to read snapshot SKUs for {location}: {e:#}");
            Vec::new()
        }
    }
}
