use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::config::VizConfig;
use crate::labels::ApproxTextMeasure;
use crate::load::load_dataset;
use crate::models::{ChartType, Dimension, YearRange};
use crate::playback::{clip_layout, Playback};
use crate::stats::StoryStats;
use crate::view::{recompute, Frame, ViewState};
use crate::viz_export::{write_all_viz, write_playback, PlaybackStep};

/// What the binary was asked to draw.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub dataset: PathBuf,
    pub output_dir: PathBuf,
    pub dimension: Dimension,
    pub chart: ChartType,
    pub from: Option<i32>,
    pub to: Option<i32>,
    pub select: Vec<String>,
    pub play: bool,
}

/// Open-ended bounds fall back to the dataset's own range.
fn window(req: &RunRequest, full: Option<YearRange>) -> Result<Option<YearRange>> {
    if req.from.is_none() && req.to.is_none() {
        return Ok(None);
    }
    let Some(full) = full else {
        return Ok(None);
    };
    let r = YearRange::new(req.from.unwrap_or(full.min), req.to.unwrap_or(full.max));
    if r.is_empty() {
        bail!("Invalid year window: --from {} is after --to {}", r.min, r.max);
    }
    Ok(Some(r))
}

pub async fn run(req: &RunRequest, cfg: &VizConfig) -> Result<Frame> {
    let pipeline_start = Instant::now();
    info!(
        "Pipeline started - dataset={}, dimension={}, chart={:?}",
        req.dataset.display(),
        req.dimension.as_str(),
        req.chart
    );

    // 1) load
    let dataset = load_dataset(&req.dataset)?;
    if dataset.publications.is_empty() {
        error!("No publications in {}", req.dataset.display());
        bail!("Dataset {} has no publications", req.dataset.display());
    }

    // 2) view
    let range = window(req, dataset.full_range())?;
    let view = ViewState::default()
        .with_dimension(req.dimension)
        .with_chart(req.chart)
        .with_year_range(range)
        .with_selection(req.select.iter().cloned());

    // 3) recompute
    let compute_start = Instant::now();
    let measure = ApproxTextMeasure::default();
    let frame = recompute(&dataset, &view, cfg, &cfg.viewport, &measure);
    info!(
        "Recompute completed - duration={:.2}s, categories={}, labels={}, events={}, fingerprint={}",
        compute_start.elapsed().as_secs_f32(),
        frame.aggregation.top_categories.len(),
        frame.labels.len(),
        frame.events.len(),
        frame.fingerprint
    );
    for c in &req.select {
        if !frame.legend.iter().any(|e| &e.category == c) {
            warn!("Selected category not among ranked categories - category={}", c);
        }
    }

    // 4) story
    let summary = StoryStats::new(&dataset).summary(range);
    debug!(
        "Story summary - total={}, peak_year={:?}, dominant_topic={:?}",
        summary.total, summary.peak_year, summary.dominant_topic
    );

    // 5) export
    let export_start = Instant::now();
    write_all_viz(&req.output_dir, &frame, &summary)?;
    info!(
        "Export completed - duration={:.2}s, output_dir={}",
        export_start.elapsed().as_secs_f32(),
        req.output_dir.display()
    );

    // 6) playback
    if req.play {
        let steps = play(&frame, Duration::from_millis(cfg.playback_tick_ms)).await;
        write_playback(&req.output_dir, &steps)?;
        info!("Playback completed - steps={}", steps.len());
    }

    info!("Pipeline completed - duration={:.2}s", pipeline_start.elapsed().as_secs_f32());
    Ok(frame)
}

/// Drive a playback run off a timer, recording what each tick reveals.
pub async fn play(frame: &Frame, tick: Duration) -> Vec<PlaybackStep> {
    let (Some(&first), Some(&last)) = (frame.layout.years.first(), frame.layout.years.last()) else {
        return vec![];
    };
    let mut pb = Playback::new();
    let Some(token) = pb.start(YearRange::new(first, last)) else {
        return vec![];
    };

    let mut steps = vec![step(frame, first)];
    let mut interval = tokio::time::interval(tick);
    interval.tick().await;
    loop {
        interval.tick().await;
        match pb.tick(token) {
            Some(year) => steps.push(step(frame, year)),
            None => break,
        }
    }
    steps
}

fn step(frame: &Frame, year: i32) -> PlaybackStep {
    let clipped = clip_layout(&frame.layout, year);
    PlaybackStep {
        year,
        visible_years: clipped.years.len(),
        labels: frame.labels.iter().filter(|l| l.year <= year).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(from: Option<i32>, to: Option<i32>) -> RunRequest {
        RunRequest {
            dataset: PathBuf::from("data.json"),
            output_dir: PathBuf::from("out"),
            dimension: Dimension::Series,
            chart: ChartType::Stream,
            from,
            to,
            select: vec![],
            play: false,
        }
    }

    #[test]
    fn open_bounds_use_the_dataset_range() {
        let full = Some(YearRange::new(1975, 2020));
        assert_eq!(window(&req(None, None), full).unwrap(), None);
        assert_eq!(window(&req(Some(2000), None), full).unwrap(), Some(YearRange::new(2000, 2020)));
        assert_eq!(window(&req(None, Some(1980)), full).unwrap(), Some(YearRange::new(1975, 1980)));
        assert!(window(&req(Some(2010), Some(2000)), full).is_err());
    }
}
