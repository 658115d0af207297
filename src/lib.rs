//! Publication stream graph core: aggregation by facet, stack layout,
//! keyword labels, key-event detection and story statistics.

pub mod aggregate;
pub mod config;
pub mod events;
pub mod geometry;
pub mod keywords;
pub mod labels;
pub mod load;
pub mod models;
pub mod orchestrator;
pub mod playback;
pub mod render;
pub mod similarity;
pub mod stack;
pub mod stats;
pub mod tally;
pub mod view;
pub mod viz_export;

pub use aggregate::{aggregate, Aggregation, YearCategoryMatrix};
pub use config::VizConfig;
pub use events::{detect_events, EventKind, KeyEvent};
pub use keywords::{extract_keywords, KeywordExtractor, KeywordStats};
pub use labels::{place_labels, ApproxTextMeasure, SizingPolicy, TextMeasure};
pub use models::{ChartType, Dataset, Dimension, Publication, YearRange};
pub use stack::{layout, StackLayout, StackPolicy};
pub use view::{recompute, Frame, ViewState};
