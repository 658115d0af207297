// src/viz_export.rs
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::{fs, path::Path};

use crate::render::render_story_markdown;
use crate::stats::StorySummary;
use crate::view::Frame;

pub const VIZ_FILES: [&str; 6] = [
    "viz.matrix.json",
    "viz.layout.json",
    "viz.labels.json",
    "viz.events.json",
    "viz.legend.json",
    "viz.summary.json",
];

/* -------------------------------------------------------------------------- */
/* Entry point                                                                */
/* -------------------------------------------------------------------------- */

/// Write all D3-ready visualization JSONs, the story and an index into `out_dir`.
pub fn write_all_viz(out_dir: &Path, frame: &Frame, summary: &StorySummary) -> Result<()> {
    fs::create_dir_all(out_dir).with_context(|| format!("create {:?}", out_dir))?;

    // 1) Matrix as d3.stack input rows
    write_json(out_dir.join("viz.matrix.json"), &build_matrix(frame))?;

    // 2) Stacked bands
    write_json(out_dir.join("viz.layout.json"), &build_layout(frame))?;

    // 3) Placed keyword labels
    write_json(out_dir.join("viz.labels.json"), &frame.labels)?;

    // 4) Key events
    write_json(out_dir.join("viz.events.json"), &frame.events)?;

    // 5) Legend
    write_json(out_dir.join("viz.legend.json"), &frame.legend)?;

    // 6) Story statistics + markdown
    write_json(out_dir.join("viz.summary.json"), summary)?;
    let story = render_story_markdown(summary, &frame.events);
    fs::write(out_dir.join("story.md"), story).with_context(|| format!("write story.md in {:?}", out_dir))?;

    // 7) Index
    let idx = json!({
        "version": 1,
        "generated_at": Utc::now().to_rfc3339(),
        "dimension": frame.view.dimension,
        "chart": frame.view.chart,
        "range": frame.aggregation.range,
        "fingerprint": frame.fingerprint,
        "counts": {
            "years": frame.layout.years.len(),
            "categories": frame.aggregation.top_categories.len(),
            "labels": frame.labels.len(),
            "events": frame.events.len(),
        },
        "files": VIZ_FILES,
        "story": "story.md",
    });
    write_json(out_dir.join("viz.index.json"), &idx)?;

    Ok(())
}

pub fn write_json<P: AsRef<Path>, T: ?Sized + Serialize>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, serde_json::to_vec_pretty(value)?).with_context(|| format!("write {:?}", path))
}

/* -------------------------------------------------------------------------- */
/* 1) Matrix                                                                  */
/* -------------------------------------------------------------------------- */

/// `{ keys, rows: [{ year, <category>: n, ... }] }`, one row per year.
fn build_matrix(frame: &Frame) -> Value {
    let m = &frame.aggregation.matrix;
    let rows: Vec<Value> = m
        .rows
        .iter()
        .map(|(year, row)| {
            let mut obj = Map::new();
            obj.insert("year".into(), json!(year));
            for c in &m.categories {
                obj.insert(c.clone(), json!(row.get(c).copied().unwrap_or(0)));
            }
            obj.insert("_total".into(), json!(frame.aggregation.year_tallies.get(year).copied().unwrap_or(0)));
            Value::Object(obj)
        })
        .collect();
    json!({
        "dimension": frame.aggregation.dimension,
        "keys": m.categories,
        "ranking": frame.aggregation.ranking,
        "rows": rows,
    })
}

/* -------------------------------------------------------------------------- */
/* 2) Layout                                                                  */
/* -------------------------------------------------------------------------- */

#[derive(Serialize)]
struct VSeries<'a> {
    key: &'a str,
    total: u64,
    /// `[low, high]` per year, aligned with `years`.
    points: Vec<[f64; 2]>,
}

fn build_layout(frame: &Frame) -> Value {
    let l = &frame.layout;
    let series: Vec<VSeries> = l
        .series
        .iter()
        .map(|s| VSeries {
            key: &s.category,
            total: s.total,
            points: s.bands.iter().map(|b| [b.low, b.high]).collect(),
        })
        .collect();
    json!({
        "policy": l.policy,
        "years": l.years,
        "domain": [l.value_range.0, l.value_range.1],
        "series": series,
    })
}

/* -------------------------------------------------------------------------- */
/* 3) Playback                                                                */
/* -------------------------------------------------------------------------- */

/// One entry per revealed year: how many years are visible and the labels so far.
#[derive(Serialize)]
pub struct PlaybackStep {
    pub year: i32,
    pub visible_years: usize,
    pub labels: usize,
}

pub fn write_playback(out_dir: &Path, steps: &[PlaybackStep]) -> Result<()> {
    write_json(out_dir.join("viz.playback.json"), &json!({ "steps": steps }))
}
