use std::collections::{BTreeMap, HashMap};

use super::record::{normalize_tag, GENERAL_COLLECTION};

/// Lowest weight a configured rank can map to.
pub const MIN_COLLECTION_WEIGHT: f64 = 0.1;

/// Resolves a record's collection tags to one weight per tracked discipline.
///
/// Every distinct rank in the table is sorted descending and mapped onto
/// `[0.1, 1.0]`: the highest rank number is the most relevant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionWeights {
    disciplines: Vec<String>,
    /// collection tag -> discipline -> weight
    table: HashMap<String, HashMap<String, f64>>,
}

impl CollectionWeights {
    pub fn from_rankings(
        rankings: &BTreeMap<String, BTreeMap<String, Option<i64>>>,
        disciplines: Vec<String>,
    ) -> Self {
        let mut ranks: Vec<i64> = rankings
            .values()
            .flat_map(|row| row.values().flatten().copied())
            .collect();
        ranks.sort_unstable_by(|a, b| b.cmp(a));
        ranks.dedup();

        let rank_weights: HashMap<i64, f64> = ranks
            .iter()
            .enumerate()
            .map(|(index, rank)| (*rank, spread_weight(index, ranks.len())))
            .collect();

        let mut table: HashMap<String, HashMap<String, f64>> = HashMap::new();
        for (collection, row) in rankings {
            let weights = table.entry(normalize_tag(collection)).or_default();
            for (discipline, rank) in row {
                if let Some(weight) = rank.and_then(|rank| rank_weights.get(&rank)) {
                    let slot = weights.entry(discipline.clone()).or_insert(0.0);
                    *slot = slot.max(*weight);
                }
            }
        }

        Self { disciplines, table }
    }

    /// False when the table holds no usable rank at all.
    pub fn is_configured(&self) -> bool {
        self.table.values().any(|row| !row.is_empty())
    }

    pub fn disciplines(&self) -> &[String] {
        &self.disciplines
    }

    /// Weight per discipline, in tracked order.
    ///
    /// `general` records and an unconfigured table give every discipline 1.0.
    /// Otherwise each discipline takes the best weight any of the record's
    /// tags implies; unranked pairs contribute 0.0.
    pub fn weights(&self, collections: &[String]) -> Vec<(String, f64)> {
        let relevant_to_all = !self.is_configured()
            || collections
                .iter()
                .any(|collection| collection == GENERAL_COLLECTION);

        self.disciplines
            .iter()
            .map(|discipline| {
                let weight = if relevant_to_all {
                    1.0
                } else {
                    collections
                        .iter()
                        .filter_map(|collection| self.table.get(collection))
                        .filter_map(|row| row.get(discipline))
                        .fold(0.0_f64, |best, weight| best.max(*weight))
                };
                (discipline.clone(), weight)
            })
            .collect()
    }
}

fn spread_weight(index: usize, count: usize) -> f64 {
    if count <= 1 {
        return 1.0;
    }
    1.0 - (1.0 - MIN_COLLECTION_WEIGHT) * index as f64 / (count - 1) as f64
}
