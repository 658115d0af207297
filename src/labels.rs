use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::{BandScale, LinearScale, Rect, Viewport};
use crate::keywords::{KeywordExtractor, KeywordStat, KeywordStats};
use crate::models::{ChartType, Dataset, Dimension};
use crate::stack::StackLayout;

/// Rendering-side text metrics. Returns `(width, height)` in layout pixels.
pub trait TextMeasure: Sync {
    fn measure(&self, text: &str, font_size: f64) -> (f64, f64);
}

/// Fixed-advance estimate used when no real renderer is attached.
#[derive(Debug, Clone, Copy)]
pub struct ApproxTextMeasure {
    pub char_em: f64,
    pub line_em: f64,
}

impl Default for ApproxTextMeasure {
    fn default() -> Self {
        Self {
            char_em: 0.6,
            line_em: 1.2,
        }
    }
}

impl TextMeasure for ApproxTextMeasure {
    fn measure(&self, text: &str, font_size: f64) -> (f64, f64) {
        (
            text.chars().count() as f64 * font_size * self.char_em,
            font_size * self.line_em,
        )
    }
}

/// How big a label may get and where it may move.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SizingPolicy {
    /// Font size for the least/most frequent keyword.
    pub font_range: (f64, f64),
    /// Cap = `max(cap_floor, min(font_range.1, cell_height * height_ratio))`.
    pub cap_floor: f64,
    pub height_ratio: f64,
    /// Also cap by `cell_width / (chars + 2)`.
    pub width_cap: bool,
    /// Vertical nudges tried in order.
    pub offsets: Vec<f64>,
    /// Minimum gap between accepted labels.
    pub padding: f64,
    /// Nudged centre must stay within this share of the half-height.
    pub centre_slack: Option<f64>,
    pub min_cell_width: f64,
    pub min_cell_height: f64,
}

impl SizingPolicy {
    pub fn stream() -> Self {
        Self {
            font_range: (10.0, 28.0),
            cap_floor: 10.0,
            height_ratio: 0.4,
            width_cap: false,
            offsets: vec![0.0, -12.0, 12.0, -24.0, 24.0, -36.0, 36.0],
            padding: 6.0,
            centre_slack: Some(0.9),
            min_cell_width: 0.0,
            min_cell_height: 0.0,
        }
    }

    pub fn bar() -> Self {
        Self {
            font_range: (9.0, 17.0),
            cap_floor: 8.0,
            height_ratio: 0.4,
            width_cap: true,
            offsets: vec![0.0],
            padding: 4.0,
            centre_slack: None,
            min_cell_width: 20.0,
            min_cell_height: 15.0,
        }
    }

    pub fn font_size(&self, keyword: &KeywordStat, stats_min: u32, stats_max: u32, cell: &Rect) -> f64 {
        let lo = stats_min.max(1) as f64;
        let hi = (stats_max as f64).max(lo + 1.0);
        let t = (keyword.count as f64 - lo) / (hi - lo);
        let (f0, f1) = self.font_range;
        let mut size = f0 + t * (f1 - f0);

        size = size.min(self.cap_floor.max(f1.min(cell.height * self.height_ratio)));
        if self.width_cap {
            let chars = keyword.word.chars().count() as f64;
            size = size.min(self.cap_floor.max(f1.min(cell.width / (chars + 2.0))));
        }
        size
    }
}

impl Default for SizingPolicy {
    fn default() -> Self {
        Self::stream()
    }
}

/// One (year, category) slot a keyword may be drawn into.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LabelCell {
    pub year: i32,
    pub category: String,
    pub stack_index: usize,
    /// Area the label must stay inside.
    pub bounds: Rect,
    /// Text centre before any nudge.
    pub anchor: (f64, f64),
    /// Vertical extent of the band itself at this year.
    pub band_height: f64,
    pub keywords: KeywordStats,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlacedLabel {
    pub year: i32,
    pub category: String,
    pub text: String,
    pub font_size: f64,
    #[serde(flatten)]
    pub rect: Rect,
}

/// Greedy placement: years ascending, then stack order. A cell gets its top
/// keyword at the first offset that fits its bounds and clears every label
/// already accepted; otherwise it gets nothing.
pub fn place_labels(cells: &[LabelCell], policy: &SizingPolicy, measure: &dyn TextMeasure) -> Vec<PlacedLabel> {
    let mut order: Vec<&LabelCell> = cells.iter().collect();
    order.sort_by_key(|c| (c.year, c.stack_index));

    let mut placed: Vec<PlacedLabel> = Vec::new();
    let mut skipped = 0usize;

    for cell in order {
        let Some(kw) = cell.keywords.top() else {
            continue;
        };
        if cell.bounds.width < policy.min_cell_width || cell.band_height < policy.min_cell_height {
            skipped += 1;
            continue;
        }

        let size = policy.font_size(kw, cell.keywords.min, cell.keywords.max, &Rect::new(0.0, 0.0, cell.bounds.width, cell.band_height));
        let (w, h) = measure.measure(&kw.word, size);
        let half = cell.band_height / 2.0;
        let (cx, cy) = cell.anchor;

        let accepted = policy.offsets.iter().find_map(|&dy| {
            if let Some(slack) = policy.centre_slack {
                if dy.abs() > half * slack {
                    return None;
                }
            }
            let rect = Rect::centered(cx, cy + dy, w, h);
            let clear = cell.bounds.contains(&rect) && !placed.iter().any(|p| p.rect.intersects(&rect, policy.padding));
            clear.then_some(rect)
        });

        match accepted {
            Some(rect) => placed.push(PlacedLabel {
                year: cell.year,
                category: cell.category.clone(),
                text: kw.word.clone(),
                font_size: size,
                rect,
            }),
            None => skipped += 1,
        }
    }

    debug!("Label placement - cells={}, placed={}, skipped={}", cells.len(), placed.len(), skipped);
    placed
}

/// Geometry and keywords for every non-empty (year, category) band of a layout.
///
/// Bars use a padded band column per year. Streams sit at the year's x position
/// and may spread across the plot width, but never outside their band vertically.
pub fn build_cells(
    dataset: &Dataset,
    dimension: Dimension,
    layout: &StackLayout,
    chart: ChartType,
    viewport: &Viewport,
    extractor: &KeywordExtractor,
) -> Vec<LabelCell> {
    if layout.is_empty() {
        return vec![];
    }
    let (vmin, vmax) = layout.value_range;
    let first = layout.years[0] as f64;
    let last = layout.years[layout.years.len() - 1] as f64;

    let y = match chart {
        ChartType::Bar => LinearScale::new((0.0, vmax), (viewport.height, 0.0)),
        ChartType::Stream => LinearScale::new((vmin, vmax), (viewport.height, 0.0)),
    };
    let x_line = LinearScale::new((first, last), (0.0, viewport.width));
    let x_band = BandScale::new(layout.years.len(), (0.0, viewport.width), 0.1);

    struct Slot<'a> {
        year: i32,
        category: &'a str,
        stack_index: usize,
        bounds: Rect,
        anchor: (f64, f64),
        band_height: f64,
    }

    let mut slots: Vec<Slot> = Vec::new();
    for (yi, &year) in layout.years.iter().enumerate() {
        for (si, s) in layout.series.iter().enumerate() {
            let Some(b) = s.bands.get(yi) else { continue };
            if b.value() <= 0.0 {
                continue;
            }
            let top = y.map(b.high).min(y.map(b.low));
            let band_height = (y.map(b.low) - y.map(b.high)).abs();
            let (bounds, anchor) = match chart {
                ChartType::Bar => {
                    let x0 = x_band.start(yi);
                    let bw = x_band.bandwidth();
                    (Rect::new(x0, top, bw, band_height), (x0 + bw / 2.0, top + band_height / 2.0))
                }
                ChartType::Stream => (
                    Rect::new(0.0, top, viewport.width, band_height),
                    (x_line.map(year as f64), top + band_height / 2.0),
                ),
            };
            slots.push(Slot {
                year,
                category: &s.category,
                stack_index: si,
                bounds,
                anchor,
                band_height,
            });
        }
    }

    // keyword extraction dominates; results come back in slot order
    slots
        .par_iter()
        .map(|slot| {
            let titles: Vec<&str> = dataset
                .publications_in_year(slot.year)
                .into_iter()
                .filter(|p| dimension.matches(p, slot.category))
                .map(|p| p.title.as_str())
                .collect();
            LabelCell {
                year: slot.year,
                category: slot.category.to_string(),
                stack_index: slot.stack_index,
                bounds: slot.bounds,
                anchor: slot.anchor,
                band_height: slot.band_height,
                keywords: extractor.extract(titles),
            }
        })
        .collect()
}
