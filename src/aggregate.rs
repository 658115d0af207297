use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::models::{Dimension, Publication, YearRange};
use crate::tally::Tally;

pub const DEFAULT_TOP_N: usize = 20;
pub const LEGACY_TOP_N: usize = 12;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CategoryRank {
    pub category: String,
    pub total: u64,
}

/// Dense (year × category) counts. Every year of the range has a row and every
/// row has every drawn category, zero when absent.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct YearCategoryMatrix {
    pub categories: Vec<String>,
    pub rows: BTreeMap<i32, BTreeMap<String, u64>>,
}

impl YearCategoryMatrix {
    pub fn years(&self) -> Vec<i32> {
        self.rows.keys().copied().collect()
    }

    pub fn get(&self, year: i32, category: &str) -> u64 {
        self.rows
            .get(&year)
            .and_then(|r| r.get(category))
            .copied()
            .unwrap_or(0)
    }

    pub fn year_total(&self, year: i32) -> u64 {
        self.rows.get(&year).map(|r| r.values().sum()).unwrap_or(0)
    }

    pub fn category_total(&self, category: &str) -> u64 {
        self.rows.values().filter_map(|r| r.get(category)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.categories.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Aggregation {
    pub dimension: Dimension,
    pub range: Option<YearRange>,
    pub matrix: YearCategoryMatrix,
    /// Full top-K, unaffected by the selection (drives the legend).
    pub ranking: Vec<CategoryRank>,
    /// Ranking restricted to the selection; what actually gets drawn.
    pub top_categories: Vec<String>,
    /// Per-year sum over every category, ranked or not.
    pub year_tallies: BTreeMap<i32, u64>,
}

impl Aggregation {
    pub fn total_for(&self, category: &str) -> u64 {
        self.ranking
            .iter()
            .find(|r| r.category == category)
            .map(|r| r.total)
            .unwrap_or(0)
    }
}

/// Pivot publications into per-year category counts for one facet.
///
/// `range` filters inclusively; without it the publications' own span is used.
/// Ranking totals cover exactly the window being displayed.
pub fn aggregate(
    publications: &[Publication],
    dimension: Dimension,
    range: Option<YearRange>,
    selected: &BTreeSet<String>,
    top_n: usize,
) -> Aggregation {
    let in_window: Vec<&Publication> = match range {
        Some(r) => publications.iter().filter(|p| r.contains(p.year)).collect(),
        None => publications.iter().collect(),
    };
    let range = range.or_else(|| {
        let min = in_window.iter().map(|p| p.year).min()?;
        let max = in_window.iter().map(|p| p.year).max()?;
        Some(YearRange::new(min, max))
    });

    let mut totals = Tally::new();
    let mut by_year: BTreeMap<i32, Tally> = BTreeMap::new();
    for p in &in_window {
        let cell = by_year.entry(p.year).or_default();
        for c in dimension.categories(p) {
            totals.add(&c);
            cell.add(&c);
        }
    }

    let ranking: Vec<CategoryRank> = totals
        .ranked()
        .into_iter()
        .take(top_n)
        .map(|(category, total)| CategoryRank { category, total })
        .collect();

    let top_categories: Vec<String> = ranking
        .iter()
        .map(|r| r.category.clone())
        .filter(|c| selected.is_empty() || selected.contains(c))
        .collect();

    let mut rows = BTreeMap::new();
    let mut year_tallies = BTreeMap::new();
    if let Some(r) = range {
        for year in r.years() {
            let tally = by_year.get(&year);
            let row: BTreeMap<String, u64> = top_categories
                .iter()
                .map(|c| (c.clone(), tally.map(|t| t.get(c)).unwrap_or(0)))
                .collect();
            rows.insert(year, row);
            year_tallies.insert(year, tally.map(Tally::total).unwrap_or(0));
        }
    }

    debug!(
        "Aggregated - dimension={}, multi_valued={}, publications={}, categories={}, ranked={}, drawn={}, years={}",
        dimension.as_str(),
        dimension.is_multi_valued(),
        in_window.len(),
        totals.entries().len(),
        ranking.len(),
        top_categories.len(),
        rows.len()
    );

    Aggregation {
        dimension,
        range,
        matrix: YearCategoryMatrix {
            categories: top_categories.clone(),
            rows,
        },
        ranking,
        top_categories,
        year_tallies,
    }
}
