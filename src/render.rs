// src/render.rs
use crate::events::{EventKind, KeyEvent};
use crate::stats::StorySummary;

fn range_label(s: &StorySummary) -> String {
    match s.range {
        Some(r) if r.min == r.max => format!("{}", r.min),
        Some(r) => format!("{}-{}", r.min, r.max),
        None => "all years".to_string(),
    }
}

pub fn render_story_markdown(s: &StorySummary, events: &[KeyEvent]) -> String {
    let mut md = String::new();
    md.push_str(&format!("# Publications, {}\n\n", range_label(s)));

    md.push_str("## Overview\n");
    md.push_str(&format!(
        "{} publications over {} years, {:.1} per year on average (median {:.1}).\n",
        s.total, s.years, s.average, s.median
    ));
    if let (Some(year), Some(count)) = (s.peak_year, s.peak_count) {
        md.push_str(&format!("The busiest year was {} with {} publications.\n", year, count));
    }
    if let Some(inc) = &s.significant_increase {
        md.push_str(&format!(
            "The sharpest rise came in {}: {:+} publications ({:+.0}%).\n",
            inc.year, inc.change, inc.change_pct
        ));
    }
    md.push('\n');

    if let Some(topic) = &s.dominant_topic {
        md.push_str("## Topics\n");
        md.push_str(&format!("**{}** leads with {:.1}% of topic tags.\n\n", topic, s.dominant_percentage));
        for t in &s.top_topics {
            md.push_str(&format!("- {}: {} ({:.1}%)\n", t.name, t.count, t.percentage));
        }
        if let Some(tr) = &s.transition {
            md.push_str(&format!("\nIn {} the focus moved from {} to {}.\n", tr.year, tr.from, tr.to));
        }
        md.push('\n');
    }

    let decades: Vec<_> = s.decades.iter().filter(|d| d.name.is_some()).collect();
    if !decades.is_empty() {
        md.push_str("## By Decade\n");
        for d in decades {
            let name = d.name.as_deref().unwrap_or_default();
            md.push_str(&format!("- {}: {} ({:.1}%)\n", d.decade, name, d.percentage));
        }
        md.push('\n');
    }

    if !s.top_series.is_empty() {
        md.push_str("## Series\n");
        for t in &s.top_series {
            md.push_str(&format!("- **{}**: {} publications since {}\n", t.series, t.count, t.launch_year));
        }
        md.push('\n');
    }

    if let Some(ty) = &s.dominant_type {
        md.push_str("## Document Types\n");
        md.push_str(&format!("Most common type: **{}**.\n", ty));
        for (name, count) in &s.type_distribution {
            md.push_str(&format!("- {}: {}\n", name, count));
        }
        md.push('\n');
    }

    if !events.is_empty() {
        md.push_str("## Key Events\n");
        for e in events {
            let tag = match e.kind {
                EventKind::Peak => "peak",
                EventKind::FirstAppearance => "debut",
                EventKind::TopicShift => "shift",
            };
            md.push_str(&format!("- {} [{}] {}\n", e.year, tag, e.message));
        }
        md.push('\n');
    }

    md.push_str(&format!(
        "_{} series, {} topics, {} document types in the collection._\n",
        s.series_count, s.topics_count, s.types_count
    ));
    md
}
