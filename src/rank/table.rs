use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{RigError, RigResult};

type RankMap = BTreeMap<String, BTreeMap<String, u32>>;

/// Static `(category, item) -> weight` lookup.
///
/// Weights express relative rarity intent: a part ranked 10 is drawn twice as often as a part
/// ranked 5 among the same candidates. The table is immutable once built; a missing entry is a
/// configuration error, never a default weight.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RankMap", into = "RankMap")]
pub struct RankTable {
    ranks: RankMap,
}

impl RankTable {
    /// Start building a table.
    pub fn builder() -> RankTableBuilder {
        RankTableBuilder::default()
    }

    /// Weight for `(category, item)`.
    pub fn rank(&self, category: &str, item: &str) -> RigResult<u32> {
        self.ranks
            .get(category)
            .and_then(|items| items.get(item))
            .copied()
            .ok_or_else(|| RigError::missing_rank(category, item))
    }

    /// Whether `(category, item)` has an entry.
    pub fn contains(&self, category: &str, item: &str) -> bool {
        self.rank(category, item).is_ok()
    }

    /// Category names in lexicographic order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.ranks.keys().map(String::as_str)
    }

    /// Number of `(category, item)` entries.
    pub fn len(&self) -> usize {
        self.ranks.values().map(BTreeMap::len).sum()
    }

    /// `true` when the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn validate(ranks: &RankMap) -> RigResult<()> {
        for (category, items) in ranks {
            if category.is_empty() {
                return Err(RigError::validation("rank category must be non-empty"));
            }
            if items.is_empty() {
                return Err(RigError::validation(format!(
                    "rank category '{category}' has no items"
                )));
            }
            for (item, weight) in items {
                if *weight == 0 {
                    return Err(RigError::validation(format!(
                        "rank for category {category}, item {item} must be > 0"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl TryFrom<RankMap> for RankTable {
    type Error = RigError;

    fn try_from(ranks: RankMap) -> RigResult<Self> {
        Self::validate(&ranks)?;
        Ok(Self { ranks })
    }
}

impl From<RankTable> for RankMap {
    fn from(table: RankTable) -> Self {
        table.ranks
    }
}

/// Incremental constructor for [`RankTable`].
#[derive(Clone, Debug, Default)]
pub struct RankTableBuilder {
    ranks: RankMap,
}

impl RankTableBuilder {
    /// Add or replace one entry.
    pub fn rank(mut self, category: impl Into<String>, item: impl Into<String>, weight: u32) -> Self {
        self.ranks
            .entry(category.into())
            .or_default()
            .insert(item.into(), weight);
        self
    }

    /// Validate and freeze the table.
    pub fn build(self) -> RigResult<RankTable> {
        RankTable::try_from(self.ranks)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/rank/table.rs"]
mod tests;
