use std::collections::{BTreeMap, HashMap};

/// Doctype label to score, built once from the rank table.
///
/// Distinct ranks are sorted ascending and spread evenly over `[0, 1]`, the
/// lowest (best) rank scoring 1.0 and the highest 0.0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DoctypeScores {
    scores: HashMap<String, f64>,
}

impl DoctypeScores {
    pub fn from_ranking(ranking: &BTreeMap<String, i64>) -> Self {
        let mut ranks: Vec<i64> = ranking.values().copied().collect();
        ranks.sort_unstable();
        ranks.dedup();

        let rank_scores: HashMap<i64, f64> = ranks
            .iter()
            .enumerate()
            .map(|(index, rank)| (*rank, evenly_spaced(index, ranks.len())))
            .collect();

        let scores = ranking
            .iter()
            .map(|(doctype, rank)| (doctype.trim().to_lowercase(), rank_scores[rank]))
            .collect();

        Self { scores }
    }

    pub fn is_configured(&self) -> bool {
        !self.scores.is_empty()
    }

    /// Unknown or missing doctypes score 0.0.
    pub fn score(&self, doctype: Option<&str>) -> f64 {
        doctype
            .and_then(|doctype| self.scores.get(doctype))
            .copied()
            .unwrap_or(0.0)
    }
}

fn evenly_spaced(index: usize, count: usize) -> f64 {
    if count <= 1 {
        return 1.0;
    }
    1.0 - index as f64 / (count - 1) as f64
}
