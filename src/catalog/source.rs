use crate::{
    catalog::model::{Layer, Original, Part},
    foundation::error::RigResult,
};

/// `(part name, color)` pair identifying which layers to fetch for a rig.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PartRef {
    /// Part name.
    pub name: String,
    /// Part color.
    pub color: Option<String>,
}

impl From<&Part> for PartRef {
    fn from(part: &Part) -> Self {
        Self {
            name: part.name.clone(),
            color: part.color.clone(),
        }
    }
}

/// Read-only access to authoritative part and layer records.
///
/// Implementations sit on top of whatever store holds the catalog. Every method may perform IO
/// and may fail with a resource error; callers never treat a failed read as "no rows".
pub trait Catalog: Send + Sync {
    /// All parts of `part_type`, across fleets.
    fn parts_of_type(&self, part_type: &str) -> RigResult<Vec<Part>>;

    /// Parts of `part_type` belonging to `fleet`.
    fn parts_of_fleet_and_type(&self, fleet: &str, part_type: &str) -> RigResult<Vec<Part>>;

    /// Part types available to `fleet`, in a stable order.
    fn part_types_of_fleet(&self, fleet: &str) -> RigResult<Vec<String>>;

    /// Layers of `fleet` drawing any of `parts`, ascending by position.
    fn layers_for_fleet_and_parts(&self, fleet: &str, parts: &[PartRef]) -> RigResult<Vec<Layer>>;

    /// Archetypes that composition can reproduce.
    fn originals(&self) -> RigResult<Vec<Original>>;
}
