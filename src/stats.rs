use serde::Serialize;
use std::collections::BTreeMap;

use crate::events::yearly_totals;
use crate::models::{Dataset, Publication, YearRange};
use crate::tally::Tally;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Increase {
    pub year: i32,
    pub change: i64,
    pub change_pct: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Share {
    pub name: String,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Transition {
    pub year: i32,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DecadeLeader {
    pub decade: String, // "1990s"
    pub name: Option<String>,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SeriesSummary {
    pub series: String,
    pub launch_year: i32,
    pub end_year: i32,
    pub total: u64,
    pub years_active: u32,
    pub average_per_year: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopSeries {
    pub series: String,
    pub count: u64,
    pub launch_year: i32,
}

/// Everything the narrative panel shows for one window.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StorySummary {
    pub range: Option<YearRange>,
    pub total: u64,
    pub years: u32,
    pub average: f64,
    pub median: f64,
    pub peak_year: Option<i32>,
    pub peak_count: Option<u64>,
    pub significant_increase: Option<Increase>,
    pub dominant_topic: Option<String>,
    pub dominant_percentage: f64,
    pub top_topics: Vec<Share>,
    pub transition: Option<Transition>,
    pub decades: Vec<DecadeLeader>,
    pub top_series: Vec<TopSeries>,
    pub dominant_type: Option<String>,
    pub type_distribution: Vec<(String, u64)>,
    pub types_by_decade: Vec<DecadeLeader>,
    pub series_count: usize,
    pub topics_count: usize,
    pub types_count: usize,
}

/// Window statistics over the whole dataset. `None` ranges mean every year.
pub struct StoryStats<'a> {
    dataset: &'a Dataset,
}

fn pct(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

impl<'a> StoryStats<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self { dataset }
    }

    fn window(&self, range: Option<YearRange>) -> Vec<&'a Publication> {
        self.dataset
            .publications
            .iter()
            .filter(|p| range.map_or(true, |r| r.contains(p.year)))
            .collect()
    }

    pub fn total(&self, range: Option<YearRange>) -> u64 {
        match range {
            Some(_) => self.window(range).len() as u64,
            None if self.dataset.metadata.total_publications > 0 => self.dataset.metadata.total_publications as u64,
            None => self.dataset.publications.len() as u64,
        }
    }

    pub fn year_count(&self, range: Option<YearRange>) -> u32 {
        range.or_else(|| self.dataset.full_range()).map(|r| r.len() as u32).unwrap_or(0)
    }

    pub fn average_per_year(&self, range: Option<YearRange>) -> f64 {
        let n = self.window(range).len();
        let years = self.year_count(range);
        if n == 0 || years == 0 {
            return 0.0;
        }
        n as f64 / years as f64
    }

    /// Median over years that have at least one publication.
    pub fn median_per_year(&self) -> f64 {
        let mut counts: Vec<u64> = yearly_totals(&self.window(None)).into_values().collect();
        if counts.is_empty() {
            return 0.0;
        }
        counts.sort_unstable();
        let mid = counts.len() / 2;
        if counts.len() % 2 == 0 {
            (counts[mid - 1] + counts[mid]) as f64 / 2.0
        } else {
            counts[mid] as f64
        }
    }

    /// Busiest year; the later year wins a tie.
    pub fn peak(&self, range: Option<YearRange>) -> Option<(i32, u64)> {
        yearly_totals(&self.window(range))
            .into_iter()
            .fold(None, |best, (y, n)| match best {
                Some((by, bn)) if bn > n => Some((by, bn)),
                _ => Some((y, n)),
            })
    }

    /// Largest relative jump that is either above 50% or more than 20 publications.
    pub fn significant_increase(&self, range: Option<YearRange>) -> Option<Increase> {
        let totals: Vec<(i32, u64)> = yearly_totals(&self.window(range)).into_iter().collect();
        let mut best: Option<Increase> = None;
        for w in totals.windows(2) {
            let (prev, (year, cur)) = (w[0].1, w[1]);
            if prev == 0 {
                continue;
            }
            let change = cur as i64 - prev as i64;
            let change_pct = change as f64 / prev as f64 * 100.0;
            let better = best.as_ref().map_or(true, |b| change_pct > b.change_pct);
            if (change_pct > 50.0 || change > 20) && better {
                best = Some(Increase { year, change, change_pct });
            }
        }
        best
    }

    pub fn topic_counts(&self, range: Option<YearRange>) -> Tally {
        let mut t = Tally::new();
        for p in self.window(range) {
            for topic in &p.topics {
                t.add(topic);
            }
        }
        t
    }

    pub fn dominant_topic(&self, range: Option<YearRange>) -> Option<String> {
        self.topic_counts(range).last_max().map(|(k, _)| k.clone())
    }

    pub fn dominant_percentage(&self, range: Option<YearRange>) -> f64 {
        let t = self.topic_counts(range);
        t.last_max().map(|(_, n)| pct(*n, t.total())).unwrap_or(0.0)
    }

    pub fn top_topics(&self, range: Option<YearRange>, n: usize) -> Vec<Share> {
        let t = self.topic_counts(range);
        let total = t.total();
        t.ranked()
            .into_iter()
            .take(n)
            .map(|(name, count)| Share {
                percentage: pct(count, total),
                name,
                count,
            })
            .collect()
    }

    /// First year whose dominant topic differs from the previous year's.
    /// Years without any topics neither start nor end a transition.
    pub fn topic_transition(&self, range: YearRange) -> Option<Transition> {
        let mut prev: Option<String> = None;
        for year in range.years() {
            let Some(cur) = self.dominant_topic(Some(YearRange::new(year, year))) else {
                continue;
            };
            if let Some(p) = prev.as_ref() {
                if *p != cur {
                    return Some(Transition {
                        year,
                        from: p.clone(),
                        to: cur,
                    });
                }
            }
            prev = Some(cur);
        }
        None
    }

    fn decades(&self) -> Vec<(String, YearRange)> {
        let max = self.dataset.full_range().map(|r| r.max).unwrap_or(2029);
        (1970..=2020)
            .step_by(10)
            .map(|d| (format!("{}s", d), YearRange::new(d, (d + 9).min(max))))
            .collect()
    }

    pub fn decade_dominance(&self) -> Vec<DecadeLeader> {
        self.decades()
            .into_iter()
            .map(|(decade, r)| {
                let t = self.topic_counts(Some(r));
                let lead = t.last_max().cloned();
                DecadeLeader {
                    decade,
                    percentage: lead.as_ref().map(|(_, n)| pct(*n, t.total())).unwrap_or(0.0),
                    count: lead.as_ref().map(|(_, n)| *n).unwrap_or(0),
                    name: lead.map(|(k, _)| k),
                }
            })
            .collect()
    }

    pub fn series_summary(&self, name: &str) -> Option<SeriesSummary> {
        let years: Vec<i32> = self
            .dataset
            .publications
            .iter()
            .filter(|p| p.series.as_deref() == Some(name))
            .map(|p| p.year)
            .collect();
        let launch_year = *years.iter().min()?;
        let end_year = *years.iter().max()?;
        let years_active = (end_year - launch_year + 1) as u32;
        let total = years.len() as u64;
        Some(SeriesSummary {
            series: name.to_string(),
            launch_year,
            end_year,
            total,
            years_active,
            average_per_year: total as f64 / years_active as f64,
        })
    }

    pub fn top_series(&self, n: usize) -> Vec<TopSeries> {
        let mut counts = Tally::new();
        let mut first: BTreeMap<&str, i32> = BTreeMap::new();
        for p in &self.dataset.publications {
            let Some(s) = p.series.as_deref() else { continue };
            counts.add(s);
            first
                .entry(s)
                .and_modify(|y| *y = (*y).min(p.year))
                .or_insert(p.year);
        }
        counts
            .ranked()
            .into_iter()
            .take(n)
            .map(|(series, count)| TopSeries {
                launch_year: first.get(series.as_str()).copied().unwrap_or_default(),
                series,
                count,
            })
            .collect()
    }

    pub fn type_counts(&self, range: Option<YearRange>) -> Tally {
        let mut t = Tally::new();
        for p in self.window(range) {
            if let Some(ty) = p.doc_type.as_deref() {
                t.add(ty);
            }
        }
        t
    }

    pub fn dominant_type(&self, range: Option<YearRange>) -> Option<String> {
        self.type_counts(range).last_max().map(|(k, _)| k.clone())
    }

    pub fn type_distribution_by_decade(&self) -> Vec<DecadeLeader> {
        self.decades()
            .into_iter()
            .map(|(decade, r)| {
                let t = self.type_counts(Some(r));
                let lead = t.last_max().cloned();
                DecadeLeader {
                    decade,
                    percentage: lead.as_ref().map(|(_, n)| pct(*n, t.total())).unwrap_or(0.0),
                    count: lead.as_ref().map(|(_, n)| *n).unwrap_or(0),
                    name: lead.map(|(k, _)| k),
                }
            })
            .collect()
    }

    pub fn summary(&self, range: Option<YearRange>) -> StorySummary {
        let peak = self.peak(range);
        let meta = &self.dataset.metadata;
        StorySummary {
            range,
            total: self.total(range),
            years: self.year_count(range),
            average: self.average_per_year(range),
            median: self.median_per_year(),
            peak_year: peak.map(|p| p.0),
            peak_count: peak.map(|p| p.1),
            significant_increase: self.significant_increase(range),
            dominant_topic: self.dominant_topic(range),
            dominant_percentage: self.dominant_percentage(range),
            top_topics: self.top_topics(range, 3),
            transition: range.and_then(|r| self.topic_transition(r)),
            decades: self.decade_dominance(),
            top_series: self.top_series(4),
            dominant_type: self.dominant_type(range),
            type_distribution: self.type_counts(range).entries().to_vec(),
            types_by_decade: self.type_distribution_by_decade(),
            series_count: meta.series_count,
            topics_count: meta.topics.len(),
            types_count: meta.types_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(year: i32, series: Option<&str>, ty: Option<&str>, topics: &[&str]) -> Publication {
        Publication {
            year,
            series: series.map(String::from),
            doc_type: ty.map(String::from),
            topics: topics.iter().map(|t| t.to_string()).collect(),
            ..Publication::default()
        }
    }

    fn dataset() -> Dataset {
        Dataset::from_publications(vec![
            p(1980, Some("Brief"), Some("Report"), &["Food"]),
            p(1980, None, Some("Report"), &["Food"]),
            p(1981, Some("Brief"), Some("Note"), &["Food", "Urban"]),
            p(1982, Some("Atlas"), Some("Note"), &["Urban"]),
            p(1982, Some("Atlas"), None, &["Urban"]),
            p(1982, Some("Atlas"), Some("Note"), &["Urban", "Economy"]),
            p(1985, Some("Brief"), Some("Report"), &[]),
        ])
    }

    #[test]
    fn totals_and_averages() {
        let ds = dataset();
        let s = StoryStats::new(&ds);
        assert_eq!(s.total(None), 7);
        assert_eq!(s.total(Some(YearRange::new(1980, 1981))), 3);
        assert_eq!(s.year_count(None), 6);
        assert!((s.average_per_year(Some(YearRange::new(1980, 1981))) - 1.5).abs() < 1e-9);
        assert_eq!(s.average_per_year(Some(YearRange::new(1990, 1995))), 0.0);
        // yearly counts 2, 1, 3, 1 → sorted 1 1 2 3
        assert_eq!(s.median_per_year(), 1.5);
    }

    #[test]
    fn peak_and_increase() {
        let ds = dataset();
        let s = StoryStats::new(&ds);
        assert_eq!(s.peak(None), Some((1982, 3)));
        let inc = s.significant_increase(None).unwrap();
        assert_eq!(inc.year, 1982);
        assert_eq!(inc.change, 2);
        assert!((inc.change_pct - 200.0).abs() < 1e-9);
        assert!(s.peak(Some(YearRange::new(1990, 1991))).is_none());
    }

    #[test]
    fn topic_shares_and_transition() {
        let ds = dataset();
        let s = StoryStats::new(&ds);
        // Food 3, Urban 4, Economy 1
        assert_eq!(s.dominant_topic(None).as_deref(), Some("Urban"));
        assert!((s.dominant_percentage(None) - 50.0).abs() < 1e-9);
        let top = s.top_topics(None, 2);
        assert_eq!(top[0].name, "Urban");
        assert_eq!(top[1].name, "Food");
        let t = s.topic_transition(YearRange::new(1980, 1985)).unwrap();
        // 1981 ties Food/Urban, later entry wins
        assert_eq!((t.year, t.from.as_str(), t.to.as_str()), (1981, "Food", "Urban"));
        assert_eq!(s.dominant_percentage(Some(YearRange::new(1985, 1985))), 0.0);
    }

    #[test]
    fn series_and_types() {
        let ds = dataset();
        let s = StoryStats::new(&ds);
        let brief = s.series_summary("Brief").unwrap();
        assert_eq!((brief.launch_year, brief.end_year, brief.total, brief.years_active), (1980, 1985, 3, 6));
        assert!(s.series_summary("Missing").is_none());
        let top = s.top_series(2);
        assert_eq!(top[0].series, "Brief");
        assert_eq!(top[1].series, "Atlas");
        assert_eq!(top[1].launch_year, 1982);
        // Report 3, Note 3 → later wins
        assert_eq!(s.dominant_type(None).as_deref(), Some("Note"));
    }

    #[test]
    fn decades_cover_1970s_to_2020s() {
        let ds = dataset();
        let s = StoryStats::new(&ds);
        let d = s.decade_dominance();
        assert_eq!(d.len(), 6);
        assert_eq!(d[0].decade, "1970s");
        assert!(d[0].name.is_none());
        assert_eq!(d[0].percentage, 0.0);
        assert_eq!(d[1].name.as_deref(), Some("Urban"));
    }

    #[test]
    fn empty_dataset_never_divides_by_zero() {
        let ds = Dataset::default();
        let sum = StoryStats::new(&ds).summary(None);
        assert_eq!(sum.total, 0);
        assert_eq!(sum.average, 0.0);
        assert_eq!(sum.median, 0.0);
        assert_eq!(sum.dominant_percentage, 0.0);
        assert!(sum.peak_year.is_none());
    }
}
