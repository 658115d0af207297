use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use crate::aggregate::YearCategoryMatrix;
use crate::models::ChartType;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StackPolicy {
    /// Stacked bars anchored at zero, categories in ranking order.
    ZeroBaseline,
    /// Centered stream graph, categories ordered inside-out.
    Silhouette,
}

impl From<ChartType> for StackPolicy {
    fn from(c: ChartType) -> Self {
        match c {
            ChartType::Bar => StackPolicy::ZeroBaseline,
            ChartType::Stream => StackPolicy::Silhouette,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Band {
    pub year: i32,
    pub low: f64,
    pub high: f64,
}

impl Band {
    pub fn value(&self) -> f64 {
        self.high - self.low
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StackSeries {
    pub category: String,
    pub total: u64,
    pub bands: Vec<Band>, // one per year, ascending
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StackLayout {
    pub policy: StackPolicy,
    pub years: Vec<i32>,
    /// Series in stack order, bottom to top.
    pub series: Vec<StackSeries>,
    pub value_range: (f64, f64),
}

impl StackLayout {
    pub fn empty(policy: StackPolicy) -> Self {
        Self {
            policy,
            years: vec![],
            series: vec![],
            value_range: (0.0, 0.0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty() || self.years.is_empty()
    }

    pub fn band(&self, category: &str, year: i32) -> Option<&Band> {
        self.series
            .iter()
            .find(|s| s.category == category)?
            .bands
            .iter()
            .find(|b| b.year == year)
    }
}

/// Inside-out ordering: heaviest categories go in first and end up nearest the
/// centre; each next one joins whichever side is currently lighter.
/// Returns indices into `categories`, bottom to top.
pub fn order_inside_out(categories: &[String], totals: &[u64]) -> Vec<usize> {
    let by_weight = (0..categories.len()).sorted_by_key(|&i| Reverse(totals.get(i).copied().unwrap_or(0)));

    let (mut top, mut bottom) = (0u64, 0u64);
    let mut tops = Vec::new();
    let mut bottoms = Vec::new();
    for i in by_weight {
        let t = totals.get(i).copied().unwrap_or(0);
        if top < bottom {
            top += t;
            tops.push(i);
        } else {
            bottom += t;
            bottoms.push(i);
        }
    }
    bottoms.reverse();
    bottoms.extend(tops);
    bottoms
}

/// Cumulative sum from zero.
pub fn offset_zero(values: &[f64]) -> Vec<(f64, f64)> {
    let mut acc = 0.0;
    values
        .iter()
        .map(|v| {
            let low = acc;
            acc += v;
            (low, acc)
        })
        .collect()
}

/// Cumulative sum shifted down by half the column total, so the column is centred on zero.
pub fn offset_silhouette(values: &[f64]) -> Vec<(f64, f64)> {
    let total: f64 = values.iter().sum();
    let mut acc = -total / 2.0;
    values
        .iter()
        .map(|v| {
            let low = acc;
            acc += v;
            (low, acc)
        })
        .collect()
}

pub fn layout(matrix: &YearCategoryMatrix, categories: &[String], policy: StackPolicy) -> StackLayout {
    let years = matrix.years();
    if categories.is_empty() || years.is_empty() {
        return StackLayout::empty(policy);
    }

    let totals: Vec<u64> = categories.iter().map(|c| matrix.category_total(c)).collect();
    let order: Vec<usize> = match policy {
        StackPolicy::ZeroBaseline => (0..categories.len()).collect(),
        StackPolicy::Silhouette => order_inside_out(categories, &totals),
    };

    let mut series: Vec<StackSeries> = order
        .iter()
        .map(|&i| StackSeries {
            category: categories[i].clone(),
            total: totals[i],
            bands: Vec::with_capacity(years.len()),
        })
        .collect();

    for &year in &years {
        let values: Vec<f64> = order
            .iter()
            .map(|&i| matrix.get(year, &categories[i]) as f64)
            .collect();
        let offsets = match policy {
            StackPolicy::ZeroBaseline => offset_zero(&values),
            StackPolicy::Silhouette => offset_silhouette(&values),
        };
        for (s, (low, high)) in series.iter_mut().zip(offsets) {
            s.bands.push(Band { year, low, high });
        }
    }

    let all_bands = || series.iter().flat_map(|s| s.bands.iter());
    let value_range = match policy {
        StackPolicy::ZeroBaseline => (0.0, all_bands().map(|b| b.high).fold(0.0, f64::max)),
        StackPolicy::Silhouette => (
            all_bands().map(|b| b.low).fold(f64::INFINITY, f64::min),
            all_bands().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max),
        ),
    };

    StackLayout {
        policy,
        years,
        series,
        value_range,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn matrix(rows: &[(i32, &[(&str, u64)])]) -> YearCategoryMatrix {
        let mut m = YearCategoryMatrix::default();
        for (year, cells) in rows {
            let row: BTreeMap<String, u64> = cells.iter().map(|(c, n)| (c.to_string(), *n)).collect();
            for (c, _) in cells.iter() {
                if !m.categories.iter().any(|x| x == c) {
                    m.categories.push(c.to_string());
                }
            }
            m.rows.insert(*year, row);
        }
        m
    }

    #[test]
    fn zero_baseline_top_equals_column_sum() {
        let m = matrix(&[(2000, &[("A", 2), ("B", 3)]), (2001, &[("A", 1), ("B", 0)])]);
        let cats = m.categories.clone();
        let l = layout(&m, &cats, StackPolicy::ZeroBaseline);
        let last = l.series.last().unwrap();
        assert_eq!(last.bands[0].high, 5.0);
        assert_eq!(last.bands[1].high, 1.0);
        assert_eq!(l.value_range, (0.0, 5.0));
        assert_eq!(l.series[0].category, "A");
    }

    #[test]
    fn silhouette_is_centred_and_keeps_thickness() {
        let m = matrix(&[(2000, &[("A", 4), ("B", 2)]), (2001, &[("A", 1), ("B", 1)])]);
        let cats = m.categories.clone();
        let l = layout(&m, &cats, StackPolicy::Silhouette);
        for (yi, total) in [(0usize, 6.0), (1, 2.0)] {
            let lo = l.series.iter().map(|s| s.bands[yi].low).fold(f64::INFINITY, f64::min);
            let hi = l.series.iter().map(|s| s.bands[yi].high).fold(f64::NEG_INFINITY, f64::max);
            assert_eq!(hi - lo, total);
            assert_eq!(lo, -total / 2.0);
        }
        assert_eq!(l.value_range, (-3.0, 3.0));
    }

    #[test]
    fn bands_are_contiguous() {
        let m = matrix(&[(2000, &[("A", 4), ("B", 2), ("C", 7)])]);
        let cats = m.categories.clone();
        for policy in [StackPolicy::ZeroBaseline, StackPolicy::Silhouette] {
            let l = layout(&m, &cats, policy);
            for w in l.series.windows(2) {
                assert_eq!(w[0].bands[0].high, w[1].bands[0].low);
            }
        }
    }

    #[test]
    fn inside_out_puts_heaviest_in_the_middle() {
        let cats: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
        let totals = [1, 50, 10, 20, 5];
        let order = order_inside_out(&cats, &totals);
        // b alone outweighs the rest, so everything else lands on top of it
        assert_eq!(order, vec![1, 3, 2, 4, 0]);
        assert_eq!(order.len(), cats.len());
    }

    #[test]
    fn inside_out_alternates_for_balanced_weights() {
        let cats: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let order = order_inside_out(&cats, &[10, 9, 8, 7]);
        // a→bottom(10), b→top(9), c→top(17), d→bottom(17)
        assert_eq!(order, vec![3, 0, 1, 2]);
    }

    #[test]
    fn offsets_are_independently_usable() {
        assert_eq!(offset_zero(&[1.0, 2.0]), vec![(0.0, 1.0), (1.0, 3.0)]);
        assert_eq!(offset_silhouette(&[1.0, 3.0]), vec![(-2.0, -1.0), (-1.0, 2.0)]);
        assert!(offset_silhouette(&[]).is_empty());
    }

    #[test]
    fn degenerate_inputs_give_empty_layout() {
        let m = YearCategoryMatrix::default();
        let l = layout(&m, &[], StackPolicy::Silhouette);
        assert!(l.is_empty());
        assert_eq!(l.value_range, (0.0, 0.0));

        let m = matrix(&[(2000, &[("A", 1)])]);
        let l = layout(&m, &[], StackPolicy::ZeroBaseline);
        assert_eq!(l.value_range, (0.0, 0.0));
    }
}
