use crate::{
    catalog::model::Part,
    foundation::error::{RigError, RigResult},
    rank::table::RankTable,
};

/// Rank category holding fleet weights, keyed by fleet part name.
pub const RANK_CATEGORY_FLEETS: &str = "Fleets";
/// Rank category holding background weights, keyed by background color.
pub const RANK_CATEGORY_BACKGROUNDS: &str = "Backgrounds";

/// The `(category, item)` a part is ranked under.
///
/// - fleet parts: `("Fleets", name)`
/// - background parts: `("Backgrounds", color)`
/// - everything else: `(fleet, original)`
pub fn rank_key(part: &Part) -> (&str, &str) {
    if part.is_fleet() {
        (RANK_CATEGORY_FLEETS, part.name.as_str())
    } else if part.is_background() {
        (RANK_CATEGORY_BACKGROUNDS, part.color_str())
    } else {
        (part.fleet_str(), part.original_str())
    }
}

/// A candidate with its normalized selection probability.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedPart<'a> {
    /// Candidate part.
    pub part: &'a Part,
    /// Rank divided by the sum of all candidate ranks.
    pub probability: f64,
}

/// Rank-weighted categorical sampling over a candidate list.
#[derive(Clone, Copy, Debug)]
pub struct PartSelector<'a> {
    ranks: &'a RankTable,
}

impl<'a> PartSelector<'a> {
    /// Selector backed by `ranks`.
    pub fn new(ranks: &'a RankTable) -> Self {
        Self { ranks }
    }

    /// Normalized probabilities in canonical bucket order.
    ///
    /// Buckets are ordered by probability ascending, then name, then color. The order fixes which
    /// cumulative interval a draw lands in, independent of the order candidates were fetched in.
    pub fn weights<'p>(&self, parts: &'p [Part]) -> RigResult<Vec<WeightedPart<'p>>> {
        if parts.is_empty() {
            return Err(RigError::selection("no candidate parts to select from"));
        }

        let mut ranks = Vec::with_capacity(parts.len());
        for part in parts {
            let (category, item) = rank_key(part);
            ranks.push(self.ranks.rank(category, item)?);
        }

        let total: f64 = ranks.iter().map(|&r| f64::from(r)).sum();
        let mut weighted: Vec<WeightedPart<'p>> = parts
            .iter()
            .zip(ranks)
            .map(|(part, rank)| WeightedPart {
                part,
                probability: f64::from(rank) / total,
            })
            .collect();

        weighted.sort_by(|a, b| {
            a.probability
                .total_cmp(&b.probability)
                .then_with(|| a.part.name.cmp(&b.part.name))
                .then_with(|| a.part.color.cmp(&b.part.color))
        });
        Ok(weighted)
    }

    /// Pick exactly one part for `draw` in `[0, 1)`.
    ///
    /// The draw selects the first bucket whose half-open interval `[lower, upper)` contains it.
    /// When floating-point accumulation leaves the final upper bound below the draw, no bucket
    /// matches and an error is returned instead of clamping to the last candidate.
    pub fn select(&self, parts: &[Part], draw: f64) -> RigResult<Part> {
        if !(0.0..1.0).contains(&draw) {
            return Err(RigError::selection(format!(
                "random draw {draw} is outside [0, 1)"
            )));
        }

        let weighted = self.weights(parts)?;
        let mut lower = 0.0f64;
        for w in &weighted {
            let upper = lower + w.probability;
            if lower <= draw && draw < upper {
                tracing::trace!(
                    part = %w.part.name,
                    part_type = %w.part.part_type,
                    probability = w.probability,
                    draw,
                    "selected part"
                );
                return Ok(w.part.clone());
            }
            lower = upper;
        }

        Err(RigError::selection(format!(
            "couldn't randomly select part: draw {draw} beyond cumulative probability {lower} over {} candidates",
            weighted.len()
        )))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/rank/selector.rs"]
mod tests;
