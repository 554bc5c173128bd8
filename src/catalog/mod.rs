//! Catalog records and the read API composition and rendering consume.

/// JSON manifest-backed catalog implementation.
pub mod manifest;
/// Part, layer and archetype records.
pub mod model;
/// Per-fleet stacking order of part types.
pub mod order;
/// The catalog read trait.
pub mod source;
