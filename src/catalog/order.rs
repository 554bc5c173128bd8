use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::foundation::error::{RigError, RigResult};

type OrderMap = BTreeMap<String, Vec<String>>;

/// Per-fleet stacking order of part types.
///
/// The index of a part type in its fleet's list is the layer position assigned to manifest
/// layers that do not carry an explicit one: index 0 is drawn first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OrderMap", into = "OrderMap")]
pub struct LayerOrder {
    fleets: OrderMap,
}

impl LayerOrder {
    /// Build from `fleet -> [part type, ...]`, rejecting duplicate part types within a fleet.
    pub fn new(fleets: OrderMap) -> RigResult<Self> {
        for (fleet, types) in &fleets {
            let mut seen = HashSet::with_capacity(types.len());
            for t in types {
                if !seen.insert(t.as_str()) {
                    return Err(RigError::validation(format!(
                        "layer order for fleet {fleet} lists part type {t} twice"
                    )));
                }
            }
        }
        Ok(Self { fleets })
    }

    /// Stacking position of `part_type` within `fleet`.
    pub fn position(&self, fleet: &str, part_type: &str) -> Option<u32> {
        self.fleets
            .get(fleet)?
            .iter()
            .position(|t| t == part_type)
            .map(|i| i as u32)
    }

    /// Ordered part types for `fleet`.
    pub fn part_types(&self, fleet: &str) -> Option<&[String]> {
        self.fleets.get(fleet).map(Vec::as_slice)
    }
}

impl TryFrom<OrderMap> for LayerOrder {
    type Error = RigError;

    fn try_from(fleets: OrderMap) -> RigResult<Self> {
        Self::new(fleets)
    }
}

impl From<LayerOrder> for OrderMap {
    fn from(order: LayerOrder) -> Self {
        order.fleets
    }
}

#[cfg(test)]
#[path = "../../tests/unit/catalog/order.rs"]
mod tests;
