use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

pub const UNCATEGORIZED: &str = "Uncategorized";
pub const UNKNOWN_TYPE: &str = "Unknown";

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Publication {
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default, rename = "type")]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub author: Option<String>, // comma-joined names
    #[serde(default, deserialize_with = "null_as_default")]
    pub topics: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
}

impl Publication {
    /// Author names split on commas, trimmed, empties dropped.
    pub fn authors(&self) -> impl Iterator<Item = &str> {
        self.author
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl YearRange {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, year: i32) -> bool {
        year >= self.min && year <= self.max
    }

    /// Dense, ascending. Empty when `min > max`.
    pub fn years(&self) -> RangeInclusive<i32> {
        self.min..=self.max
    }

    pub fn len(&self) -> usize {
        if self.max < self.min {
            0
        } else {
            (self.max - self.min) as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Span of the given publications, `None` when there are none.
    pub fn spanning(pubs: &[Publication]) -> Option<Self> {
        let min = pubs.iter().map(|p| p.year).min()?;
        let max = pubs.iter().map(|p| p.year).max()?;
        Some(Self { min, max })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Metadata {
    #[serde(default)]
    pub year_range: Option<YearRange>,
    #[serde(default)]
    pub total_publications: usize,
    #[serde(default)]
    pub series_count: usize,
    #[serde(default, deserialize_with = "null_as_default")]
    pub topics: Vec<String>,
    #[serde(default)]
    pub types_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Dataset {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default, deserialize_with = "null_as_default")]
    pub publications: Vec<Publication>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub publications_by_year: BTreeMap<String, Vec<Publication>>, // "1998" -> pubs
}

impl Dataset {
    pub fn from_publications(publications: Vec<Publication>) -> Self {
        let mut by_year: BTreeMap<String, Vec<Publication>> = BTreeMap::new();
        for p in &publications {
            by_year.entry(p.year.to_string()).or_default().push(p.clone());
        }
        Self {
            metadata: Metadata {
                year_range: YearRange::spanning(&publications),
                total_publications: publications.len(),
                ..Metadata::default()
            },
            publications,
            publications_by_year: by_year,
        }
    }

    /// Metadata range when present, else the span of the publications.
    pub fn full_range(&self) -> Option<YearRange> {
        match self.metadata.year_range {
            Some(r) if !r.is_empty() && !(r.min == 0 && r.max == 0) => Some(r),
            _ => YearRange::spanning(&self.publications),
        }
    }

    /// Publications for one year, from the denormalized index when it is populated.
    pub fn publications_in_year(&self, year: i32) -> Vec<&Publication> {
        if !self.publications_by_year.is_empty() {
            return self
                .publications_by_year
                .get(&year.to_string())
                .map(|v| v.iter().collect())
                .unwrap_or_default();
        }
        self.publications.iter().filter(|p| p.year == year).collect()
    }
}

/// Facet used to turn publications into category keys.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Series,
    Topics,
    Type,
    Author,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Series => "series",
            Dimension::Topics => "topics",
            Dimension::Type => "type",
            Dimension::Author => "author",
        }
    }

    pub fn is_multi_valued(&self) -> bool {
        matches!(self, Dimension::Topics | Dimension::Author)
    }

    /// Distinct category keys in field order. Single-valued facets fall back to a sentinel.
    pub fn categories(&self, p: &Publication) -> Vec<String> {
        match self {
            Dimension::Series => vec![non_empty(p.series.as_deref()).unwrap_or(UNCATEGORIZED).to_string()],
            Dimension::Type => vec![non_empty(p.doc_type.as_deref()).unwrap_or(UNKNOWN_TYPE).to_string()],
            Dimension::Topics => distinct(p.topics.iter().map(String::as_str)),
            Dimension::Author => distinct(p.authors()),
        }
    }

    /// Raw-field match used for drill-down lists and per-cell titles; no sentinel fallback.
    pub fn matches(&self, p: &Publication, category: &str) -> bool {
        match self {
            Dimension::Series => p.series.as_deref() == Some(category),
            Dimension::Type => p.doc_type.as_deref() == Some(category),
            Dimension::Topics => p.topics.iter().any(|t| t == category),
            Dimension::Author => p.authors().any(|a| a == category),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Stream,
    Bar,
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for v in values {
        let v = v.trim();
        if !v.is_empty() && !out.iter().any(|o| o == v) {
            out.push(v.to_string());
        }
    }
    out
}

/// Drill-down list: every publication in `category`, optionally restricted to one year.
pub fn publications_matching<'a>(
    dataset: &'a Dataset,
    dimension: Dimension,
    category: &str,
    year: Option<i32>,
) -> Vec<&'a Publication> {
    dataset
        .publications
        .iter()
        .filter(|p| dimension.matches(p, category))
        .filter(|p| year.map_or(true, |y| p.year == y))
        .collect()
}
