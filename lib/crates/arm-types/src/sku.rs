//! Resource SKU catalog (`Microsoft.Compute/skus`).

use serde::{Deserialize, Serialize};

/// One page of the SKU catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuList {
    #[serde(default)]
    pub value: Vec<ResourceSku>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSku {
    /// `virtualMachines`, `disks`, `snapshots`, ...
    #[serde(default)]
    pub resource_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub locations: Vec<String>,
}
