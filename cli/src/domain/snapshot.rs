//! Snapshot naming and snapshot redundancy selection.
//!
//! Pure functions only. No I/O, no async.

use chrono::NaiveDateTime;

/// Timestamp suffix format: second precision, no separators.
pub const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Redundancy classes the provider accepts for snapshot resources.
pub const SNAPSHOT_SKUS: &[&str] = &["Standard_LRS", "Premium_LRS", "Standard_ZRS"];

/// Snapshot class used when nothing better is known; legal in every region
/// that offers zones.
pub const DEFAULT_SNAPSHOT_SKU: &str = "Standard_ZRS";

/// Last-resort snapshot class when even the default is not offered.
pub const BASELINE_SNAPSHOT_SKU: &str = "Standard_LRS";

/// `<diskName>-<YYYYmmddHHMMSS>`.
#[must_use]
pub fn snapshot_name(disk_name: &str, captured_at: NaiveDateTime) -> String {
    format!(
        "{disk_name}-{}",
        captured_at.format(SNAPSHOT_TIMESTAMP_FORMAT)
    )
}

/// Map a disk redundancy class to the nearest snapshot-legal class.
///
/// | disk class                         | snapshot class  |
/// |------------------------------------|-----------------|
/// | any `*_ZRS`                        | `Standard_ZRS`  |
/// | `Premium_LRS`, `PremiumV2_LRS`     | `Premium_LRS`   |
/// | anything else, or unknown          | `Standard_LRS`  |
#[must_use]
pub fn nearest_snapshot_sku(disk_class: Option<&str>) -> &'static str {
    let Some(class) = disk_class else {
        return BASELINE_SNAPSHOT_SKU;
    };
    let class = class.to_ascii_lowercase();
    if class.ends_with("_zrs") {
        "Standard_ZRS"
    } else if class == "premium_lrs" || class == "premiumv2_lrs" {
        "Premium_LRS"
    } else {
        BASELINE_SNAPSHOT_SKU
    }
}

/// Pick the snapshot class for a disk, validated against what the region
/// offers.
///
/// `offered` is the set of snapshot SKU names the catalog lists for the
/// location. An empty set means the catalog could not be read; the mapped
/// class is not trusted then and `default_sku` is used.
#[must_use]
pub fn select_snapshot_sku(
    disk_class: Option<&str>,
    offered: &[String],
    default_sku: &str,
) -> String {
    let is_offered = |sku: &str| offered.iter().any(|o| o.eq_ignore_ascii_case(sku));
    if offered.is_empty() {
        return default_sku.to_string();
    }
    let preferred = nearest_snapshot_sku(disk_class);
    if is_offered(preferred) {
        return preferred.to_string();
    }
    if is_offered(default_sku) {
        return default_sku.to_string();
    }
    BASELINE_SNAPSHOT_SKU.to_string()
}

/// Whether `sku` is a snapshot-legal redundancy class.
#[must_use]
pub fn is_snapshot_sku(sku: &str) -> bool {
    SNAPSHOT_SKUS.iter().any(|s| s.eq_ignore_ascii_case(sku))
}
