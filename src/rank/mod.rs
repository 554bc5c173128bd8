//! Rarity weights and weighted part selection.

/// Rank-weighted categorical part selection.
pub mod selector;
/// Static `(category, item) -> weight` lookup.
pub mod table;
