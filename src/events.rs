use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::aggregate::YearCategoryMatrix;
use crate::keywords::KeywordExtractor;
use crate::models::{Publication, YearRange};
use crate::similarity::{cosine_similarity, distribution};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Peak,
    FirstAppearance,
    TopicShift,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct KeyEvent {
    pub year: i32,
    pub kind: EventKind,
    pub message: String,
    pub magnitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Thresholds for the event heuristics. Two tunings exist; see `legacy`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EventThresholds {
    /// A peak must exceed this many publications.
    pub peak_min_total: u64,
    /// ...and rise by more than this fraction over the previous year,
    pub peak_rel_increase: f64,
    /// ...or reach at least this many publications.
    pub peak_abs_total: u64,
    /// `1 - cosine` above this is a topic shift.
    pub shift_threshold: f64,
    /// Titles sampled per shift year for the keyword context.
    pub shift_title_sample: usize,
    pub shift_keywords: usize,
    /// First appearances count only within this many years of the dataset start.
    pub first_appearance_window: i32,
    pub max_events: usize,
}

impl Default for EventThresholds {
    fn default() -> Self {
        Self {
            peak_min_total: 10,
            peak_rel_increase: 0.25,
            peak_abs_total: 30,
            shift_threshold: 0.30,
            shift_title_sample: 50,
            shift_keywords: 3,
            first_appearance_window: 5,
            max_events: 10,
        }
    }
}

impl EventThresholds {
    /// Tuning from the older, unfiltered dataset.
    pub fn legacy() -> Self {
        Self {
            peak_rel_increase: 0.30,
            shift_threshold: 0.35,
            ..Self::default()
        }
    }
}

/// Publications per year, only for years that have any.
pub fn yearly_totals(publications: &[&Publication]) -> BTreeMap<i32, u64> {
    let mut totals = BTreeMap::new();
    for p in publications {
        *totals.entry(p.year).or_insert(0) += 1;
    }
    totals
}

/// Local maxima over consecutive observed years.
pub fn detect_peaks(totals: &BTreeMap<i32, u64>, th: &EventThresholds) -> Vec<KeyEvent> {
    let series: Vec<(i32, u64)> = totals.iter().map(|(&y, &n)| (y, n)).collect();
    let mut out = Vec::new();
    for w in series.windows(3) {
        let (prev, (year, cur), next) = (w[0].1, w[1], w[2].1);
        if cur <= prev || cur <= next || cur <= th.peak_min_total {
            continue;
        }
        let increase = cur as f64 / prev.max(1) as f64 - 1.0;
        if increase > th.peak_rel_increase || cur >= th.peak_abs_total {
            let suffix = if increase > 0.0 {
                format!(" (+{}%)", (increase * 100.0).round() as i64)
            } else {
                String::new()
            };
            out.push(KeyEvent {
                year,
                kind: EventKind::Peak,
                message: format!("Peak year: {} publications{}", cur, suffix),
                magnitude: cur as f64,
                category: None,
            });
        }
    }
    out
}

/// Year-over-year drift of the topic mix. Years with publications but no
/// topics have an all-zero vector and therefore always read as a shift.
pub fn detect_topic_shifts(
    publications: &[&Publication],
    th: &EventThresholds,
    extractor: &KeywordExtractor,
) -> Vec<KeyEvent> {
    let mut by_year: BTreeMap<i32, Vec<&Publication>> = BTreeMap::new();
    let mut topics: BTreeSet<String> = BTreeSet::new();
    for p in publications {
        by_year.entry(p.year).or_default().push(p);
        topics.extend(p.topics.iter().cloned());
    }
    let topics: Vec<String> = topics.into_iter().collect();

    let vectors: Vec<(i32, Vec<f64>)> = by_year
        .iter()
        .map(|(&year, pubs)| {
            let mut counts: BTreeMap<String, u64> = BTreeMap::new();
            for p in pubs {
                for t in &p.topics {
                    *counts.entry(t.clone()).or_insert(0) += 1;
                }
            }
            (year, distribution(&counts, &topics))
        })
        .collect();

    let mut out = Vec::new();
    for w in vectors.windows(2) {
        let year = w[1].0;
        let shift = 1.0 - cosine_similarity(&w[0].1, &w[1].1);
        if shift <= th.shift_threshold {
            continue;
        }
        let sample = by_year
            .get(&year)
            .map(|v| v.iter().take(th.shift_title_sample).map(|p| p.title.as_str()).collect::<Vec<_>>())
            .unwrap_or_default();
        let kw = extractor.extract(sample);
        out.push(KeyEvent {
            year,
            kind: EventKind::TopicShift,
            message: format!("Topic focus shift; top keywords: {}", kw.top_words(th.shift_keywords).join(", ")),
            magnitude: shift,
            category: None,
        });
    }
    out
}

/// Early debuts of drawn categories.
pub fn detect_first_appearances(
    matrix: &YearCategoryMatrix,
    dataset_min_year: i32,
    th: &EventThresholds,
) -> Vec<KeyEvent> {
    matrix
        .categories
        .iter()
        .filter_map(|c| {
            let first = matrix.rows.iter().find(|(_, row)| row.get(c).copied().unwrap_or(0) > 0)?.0;
            (*first <= dataset_min_year + th.first_appearance_window).then(|| KeyEvent {
                year: *first,
                kind: EventKind::FirstAppearance,
                message: format!("First appearance: {}", c),
                magnitude: 0.0,
                category: Some(c.clone()),
            })
        })
        .collect()
}

/// Peaks, then topic shifts, then first appearances; capped, then ordered by year.
pub fn detect_events(
    publications: &[Publication],
    matrix: &YearCategoryMatrix,
    range: Option<YearRange>,
    dataset_min_year: i32,
    th: &EventThresholds,
    extractor: &KeywordExtractor,
) -> Vec<KeyEvent> {
    let window: Vec<&Publication> = publications
        .iter()
        .filter(|p| range.map_or(true, |r| r.contains(p.year)))
        .collect();

    let totals = yearly_totals(&window);
    let peaks = detect_peaks(&totals, th);
    let shifts = detect_topic_shifts(&window, th, extractor);
    let firsts = detect_first_appearances(matrix, dataset_min_year, th);
    debug!(
        "Event detection - years={}, peaks={}, shifts={}, first_appearances={}",
        totals.len(),
        peaks.len(),
        shifts.len(),
        firsts.len()
    );

    let mut events: Vec<KeyEvent> = peaks.into_iter().chain(shifts).chain(firsts).collect();
    events.truncate(th.max_events);
    events.sort_by_key(|e| e.year);
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pubs_with_topics(year: i32, n: usize, topics: &[&str], title: &str) -> Vec<Publication> {
        (0..n)
            .map(|_| Publication {
                year,
                topics: topics.iter().map(|t| t.to_string()).collect(),
                title: title.to_string(),
                ..Publication::default()
            })
            .collect()
    }

    #[test]
    fn middle_year_is_a_peak() {
        let totals: BTreeMap<i32, u64> = [(2009, 5), (2010, 12), (2011, 4)].into_iter().collect();
        let peaks = detect_peaks(&totals, &EventThresholds::default());
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].year, 2010);
        assert_eq!(peaks[0].magnitude, 12.0);
        assert_eq!(peaks[0].message, "Peak year: 12 publications (+140%)");
    }

    #[test]
    fn small_or_flat_maxima_are_not_peaks() {
        let th = EventThresholds::default();
        let small: BTreeMap<i32, u64> = [(1, 2), (2, 9), (3, 1)].into_iter().collect();
        assert!(detect_peaks(&small, &th).is_empty());
        // +10% and below 30 total
        let gentle: BTreeMap<i32, u64> = [(1, 20), (2, 22), (3, 21)].into_iter().collect();
        assert!(detect_peaks(&gentle, &th).is_empty());
        // +10% but large enough in absolute terms
        let big: BTreeMap<i32, u64> = [(1, 30), (2, 33), (3, 1)].into_iter().collect();
        assert_eq!(detect_peaks(&big, &th).len(), 1);
    }

    #[test]
    fn endpoints_are_never_peaks() {
        let totals: BTreeMap<i32, u64> = [(2000, 50), (2001, 1)].into_iter().collect();
        assert!(detect_peaks(&totals, &EventThresholds::default()).is_empty());
    }

    #[test]
    fn identical_topic_mix_is_not_a_shift() {
        let mut pubs = pubs_with_topics(2000, 2, &["Food", "Urban"], "Harvest");
        pubs.extend(pubs_with_topics(2001, 4, &["Food", "Urban"], "Harvest"));
        let refs: Vec<&Publication> = pubs.iter().collect();
        assert!(detect_topic_shifts(&refs, &EventThresholds::default(), &KeywordExtractor::new()).is_empty());
    }

    #[test]
    fn disjoint_topics_flag_a_full_shift_with_keywords() {
        let mut pubs = pubs_with_topics(2000, 2, &["Food"], "Cereal markets");
        pubs.extend(pubs_with_topics(2001, 2, &["Economy"], "Regional trade integration"));
        let refs: Vec<&Publication> = pubs.iter().collect();
        let shifts = detect_topic_shifts(&refs, &EventThresholds::default(), &KeywordExtractor::new());
        assert_eq!(shifts.len(), 1);
        assert_eq!(shifts[0].year, 2001);
        assert_eq!(shifts[0].magnitude, 1.0);
        assert_eq!(shifts[0].message, "Topic focus shift; top keywords: Regional, Trade, Integration");
    }

    #[test]
    fn first_appearance_only_near_dataset_start() {
        let mut m = YearCategoryMatrix {
            categories: vec!["Early".into(), "Late".into()],
            ..YearCategoryMatrix::default()
        };
        for year in 1980..=1990 {
            let mut row = BTreeMap::new();
            row.insert("Early".to_string(), u64::from(year >= 1982));
            row.insert("Late".to_string(), u64::from(year >= 1988));
            m.rows.insert(year, row);
        }
        let ev = detect_first_appearances(&m, 1980, &EventThresholds::default());
        assert_eq!(ev.len(), 1);
        assert_eq!(ev[0].year, 1982);
        assert_eq!(ev[0].category.as_deref(), Some("Early"));
    }

    #[test]
    fn events_are_capped_and_sorted() {
        let th = EventThresholds {
            max_events: 2,
            ..EventThresholds::default()
        };
        let mut pubs = Vec::new();
        for (year, topic) in [(2000, "A"), (2001, "B"), (2002, "C"), (2003, "D")] {
            pubs.extend(pubs_with_topics(year, 1, &[topic], "Title words"));
        }
        let ev = detect_events(&pubs, &YearCategoryMatrix::default(), None, 2000, &th, &KeywordExtractor::new());
        assert_eq!(ev.len(), 2);
        assert_eq!(ev.iter().map(|e| e.year).collect::<Vec<_>>(), vec![2001, 2002]);
    }

    #[test]
    fn legacy_thresholds_differ_only_where_expected() {
        let l = EventThresholds::legacy();
        let d = EventThresholds::default();
        assert_eq!(l.shift_threshold, 0.35);
        assert_eq!(l.peak_rel_increase, 0.30);
        assert_eq!(l.peak_min_total, d.peak_min_total);
    }
}
