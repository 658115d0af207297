use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::aggregate::{DEFAULT_TOP_N, LEGACY_TOP_N};
use crate::events::EventThresholds;
use crate::geometry::Viewport;
use crate::labels::SizingPolicy;

pub const CONFIG_ENV: &str = "PUBSTREAM_CONFIG";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Current,
    Legacy,
}

/// Every tunable the chart pipeline reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VizConfig {
    pub profile: Profile,
    pub top_n: usize,
    pub events: EventThresholds,
    pub stream_labels: SizingPolicy,
    pub bar_labels: SizingPolicy,
    pub viewport: Viewport,
    pub playback_tick_ms: u64,
    /// Added to the built-in title stopwords.
    pub extra_stopwords: Vec<String>,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            profile: Profile::Current,
            top_n: DEFAULT_TOP_N,
            events: EventThresholds::default(),
            stream_labels: SizingPolicy::stream(),
            bar_labels: SizingPolicy::bar(),
            viewport: Viewport::default(),
            playback_tick_ms: 50,
            extra_stopwords: vec![],
        }
    }
}

impl VizConfig {
    pub fn legacy() -> Self {
        Self {
            profile: Profile::Legacy,
            top_n: LEGACY_TOP_N,
            events: EventThresholds::legacy(),
            ..Self::default()
        }
    }

    pub fn for_profile(profile: Profile) -> Self {
        match profile {
            Profile::Current => Self::default(),
            Profile::Legacy => Self::legacy(),
        }
    }

    /// Parse YAML on top of the profile it names, or `base` when it names none.
    /// Keys left out keep the profile's values; nested tables merge key by key.
    pub fn from_yaml(text: &str, base: Profile) -> Result<Self> {
        let overrides: serde_yaml::Value = serde_yaml::from_str(text).context("Failed to parse config YAML")?;
        let profile = match overrides.get("profile") {
            Some(v) => serde_yaml::from_value(v.clone()).context("Invalid profile")?,
            None => base,
        };

        let mut merged = serde_yaml::to_value(Self::for_profile(profile)).context("Failed to serialize base config")?;
        if !overrides.is_null() {
            merge_yaml(&mut merged, overrides);
        }
        serde_yaml::from_value(merged).context("Invalid config values")
    }
}

fn merge_yaml(base: &mut serde_yaml::Value, over: serde_yaml::Value) {
    match (base, over) {
        (serde_yaml::Value::Mapping(b), serde_yaml::Value::Mapping(o)) => {
            for (k, v) in o {
                match b.get_mut(&k) {
                    Some(slot) => merge_yaml(slot, v),
                    None => {
                        b.insert(k, v);
                    }
                }
            }
        }
        (slot, v) => *slot = v,
    }
}

/// `--config` path, then `$PUBSTREAM_CONFIG`, then `None` for built-in defaults.
pub fn resolve_config_path(flag: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = flag {
        debug!("Using config file from --config argument: {}", p.display());
        return Some(p.to_path_buf());
    }
    std::env::var_os(CONFIG_ENV).map(|p| {
        let p = PathBuf::from(p);
        debug!("Using config file from {}: {}", CONFIG_ENV, p.display());
        p
    })
}

/// `base` is the profile chosen on the command line; a `profile:` key in the file wins over it.
pub fn load_config(path: Option<&Path>, base: Profile) -> Result<VizConfig> {
    let Some(path) = path else {
        debug!("No config file given, using {:?} defaults", base);
        return Ok(VizConfig::for_profile(base));
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
    VizConfig::from_yaml(&text, base).with_context(|| format!("Failed to load config {}", path.display()))
}
