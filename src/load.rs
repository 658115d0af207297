use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::models::{Dataset, Publication};

/// Read one dataset document. Unknown top-level and per-publication fields are ignored.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let start = Instant::now();
    debug!("Loading dataset - path={}", path.display());

    let bytes = std::fs::read(path).with_context(|| format!("Failed to read dataset {}", path.display()))?;
    let dataset: Dataset =
        serde_json::from_slice(&bytes).with_context(|| format!("Decoding JSON for {}", path.display()))?;
    let dataset = normalize_dataset(dataset);

    if dataset.publications.is_empty() {
        warn!("Dataset has no publications - path={}", path.display());
    }
    info!(
        "Dataset load completed - duration={:.2}s, publications={}, years={}",
        start.elapsed().as_secs_f32(),
        dataset.publications.len(),
        dataset.full_range().map(|r| r.len()).unwrap_or(0)
    );
    Ok(dataset)
}

fn clean(field: &mut Option<String>) {
    *field = field
        .take()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
}

fn normalize_publication(p: &mut Publication) {
    p.title = p.title.trim().to_string();
    clean(&mut p.series);
    clean(&mut p.doc_type);
    clean(&mut p.author);
    p.topics = p
        .topics
        .iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
}

/// Trim string fields; blanks become absent so the category fallbacks apply.
/// Records without a year (deserialized as 0) are dropped.
pub fn normalize_dataset(mut ds: Dataset) -> Dataset {
    let before = ds.publications.len();
    ds.publications.retain(|p| p.year != 0);
    for pubs in ds.publications_by_year.values_mut() {
        pubs.retain(|p| p.year != 0);
    }
    ds.publications_by_year.retain(|_, pubs| !pubs.is_empty());
    let dropped = before - ds.publications.len();
    if dropped > 0 {
        warn!("Dropped publications without a year - count={}", dropped);
    }

    for p in ds.publications.iter_mut() {
        normalize_publication(p);
    }
    for pubs in ds.publications_by_year.values_mut() {
        for p in pubs.iter_mut() {
            normalize_publication(p);
        }
    }
    ds
}
