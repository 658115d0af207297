use serde::Serialize;
use std::collections::BTreeSet;
use std::hash::Hasher;
use std::time::Instant;
use tracing::debug;
use xxhash_rust::xxh3::Xxh3;

use crate::aggregate::{aggregate, Aggregation};
use crate::config::VizConfig;
use crate::events::{detect_events, KeyEvent};
use crate::geometry::Viewport;
use crate::keywords::KeywordExtractor;
use crate::labels::{build_cells, place_labels, PlacedLabel, TextMeasure};
use crate::models::{ChartType, Dataset, Dimension, YearRange};
use crate::stack::{layout, StackLayout, StackPolicy};

/// What the user is looking at. Every transition returns a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub dimension: Dimension,
    pub chart: ChartType,
    pub year_range: Option<YearRange>,
    pub selected: BTreeSet<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            dimension: Dimension::Series,
            chart: ChartType::Stream,
            year_range: None,
            selected: BTreeSet::new(),
        }
    }
}

impl ViewState {
    /// Switching facet drops the selection; its keys belong to the old facet.
    pub fn with_dimension(&self, dimension: Dimension) -> Self {
        Self {
            dimension,
            selected: BTreeSet::new(),
            ..self.clone()
        }
    }

    pub fn with_chart(&self, chart: ChartType) -> Self {
        Self { chart, ..self.clone() }
    }

    pub fn with_year_range(&self, year_range: Option<YearRange>) -> Self {
        Self {
            year_range,
            ..self.clone()
        }
    }

    pub fn toggle_category(&self, category: &str) -> Self {
        let mut selected = self.selected.clone();
        if !selected.remove(category) {
            selected.insert(category.to_string());
        }
        Self {
            selected,
            ..self.clone()
        }
    }

    /// Replace the selection outright; repeated names collapse to one.
    pub fn with_selection<I, S>(&self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selected: categories.into_iter().map(Into::into).collect(),
            ..self.clone()
        }
    }

    pub fn clear_selection(&self) -> Self {
        Self {
            selected: BTreeSet::new(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LegendEntry {
    pub category: String,
    pub total: u64,
    pub active: bool,
}

/// Everything derived for one view.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub view: ViewState,
    pub aggregation: Aggregation,
    pub layout: StackLayout,
    pub labels: Vec<PlacedLabel>,
    pub events: Vec<KeyEvent>,
    pub legend: Vec<LegendEntry>,
    /// xxh3 over matrix and ranking; equal views give equal fingerprints.
    pub fingerprint: String,
}

pub fn legend_entries(agg: &Aggregation, selected: &BTreeSet<String>) -> Vec<LegendEntry> {
    agg.ranking
        .iter()
        .map(|r| LegendEntry {
            category: r.category.clone(),
            total: r.total,
            active: selected.is_empty() || selected.contains(&r.category),
        })
        .collect()
}

pub fn fingerprint(agg: &Aggregation) -> String {
    let mut h = Xxh3::new();
    h.write(agg.dimension.as_str().as_bytes());
    for r in &agg.ranking {
        h.write(r.category.as_bytes());
        h.write_u64(r.total);
    }
    for (year, row) in &agg.matrix.rows {
        h.write_i32(*year);
        for c in &agg.matrix.categories {
            h.write(c.as_bytes());
            h.write_u64(row.get(c).copied().unwrap_or(0));
        }
    }
    format!("{:016x}", h.finish())
}

/// Aggregate, stack, label and annotate one view of the dataset.
pub fn recompute(
    dataset: &Dataset,
    view: &ViewState,
    config: &VizConfig,
    viewport: &Viewport,
    measure: &dyn TextMeasure,
) -> Frame {
    let start = Instant::now();
    let extractor = KeywordExtractor::with_extra_stopwords(&config.extra_stopwords);

    let range = view.year_range.or_else(|| dataset.full_range());
    let aggregation = aggregate(&dataset.publications, view.dimension, range, &view.selected, config.top_n);

    let stacked = layout(&aggregation.matrix, &aggregation.top_categories, StackPolicy::from(view.chart));

    let cells = build_cells(dataset, view.dimension, &stacked, view.chart, viewport, &extractor);
    let policy = match view.chart {
        ChartType::Stream => &config.stream_labels,
        ChartType::Bar => &config.bar_labels,
    };
    let labels = place_labels(&cells, policy, measure);

    let dataset_min = dataset.full_range().map(|r| r.min).unwrap_or_default();
    let events = detect_events(
        &dataset.publications,
        &aggregation.matrix,
        range,
        dataset_min,
        &config.events,
        &extractor,
    );

    let legend = legend_entries(&aggregation, &view.selected);
    let fingerprint = fingerprint(&aggregation);

    debug!(
        "Recomputed view - dimension={}, categories={}, cells={}, labels={}, events={}, fingerprint={}, duration={:.3}s",
        view.dimension.as_str(),
        aggregation.top_categories.len(),
        cells.len(),
        labels.len(),
        events.len(),
        fingerprint,
        start.elapsed().as_secs_f64()
    );

    Frame {
        view: view.clone(),
        aggregation,
        layout: stacked,
        labels,
        events,
        legend,
        fingerprint,
    }
}
