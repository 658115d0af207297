use serde::Serialize;
use tracing::debug;

use crate::models::YearRange;
use crate::stack::StackLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum PlaybackState {
    Idle,
    Playing { year: i32, token: u64 },
    Stopped { year: i32 },
}

/// Year-by-year animation driver. Each `start` hands out a new token; ticks
/// carrying any other token are ignored, so a stale timer can never advance
/// a newer run.
#[derive(Debug, Clone)]
pub struct Playback {
    state: PlaybackState,
    range: Option<YearRange>,
    next_token: u64,
}

impl Default for Playback {
    fn default() -> Self {
        Self::new()
    }
}

impl Playback {
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Idle,
            range: None,
            next_token: 1,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlaybackState::Playing { .. })
    }

    /// Begin at `range.min`. Returns the token ticks must carry, or `None`
    /// for an empty range.
    pub fn start(&mut self, range: YearRange) -> Option<u64> {
        if range.is_empty() {
            return None;
        }
        let token = self.next_token;
        self.next_token += 1;
        self.range = Some(range);
        self.state = PlaybackState::Playing { year: range.min, token };
        debug!("Playback started - from={}, to={}, token={}", range.min, range.max, token);
        Some(token)
    }

    /// Advance one year. Returns the year to draw, or `None` when the token is
    /// stale or nothing is playing. Stepping past the last year ends the run.
    pub fn tick(&mut self, token: u64) -> Option<i32> {
        let PlaybackState::Playing { year, token: current } = self.state else {
            return None;
        };
        if token != current {
            return None;
        }
        let range = self.range?;
        if year >= range.max {
            self.state = PlaybackState::Idle;
            return None;
        }
        let next = year + 1;
        self.state = PlaybackState::Playing { year: next, token };
        Some(next)
    }

    pub fn stop(&mut self) {
        if let PlaybackState::Playing { year, .. } = self.state {
            self.state = PlaybackState::Stopped { year };
        }
    }
}

/// Layout truncated to the years already revealed. The value range stays the
/// full one so the axis does not move while playing.
pub fn clip_layout(layout: &StackLayout, year: i32) -> StackLayout {
    let mut clipped = layout.clone();
    clipped.years.retain(|&y| y <= year);
    for s in &mut clipped.series {
        s.bands.retain(|b| b.year <= year);
    }
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::YearCategoryMatrix;
    use crate::stack::{layout, StackPolicy};
    use std::collections::BTreeMap;

    #[test]
    fn plays_through_the_range_then_idles() {
        let mut p = Playback::new();
        let t = p.start(YearRange::new(2000, 2002)).unwrap();
        assert_eq!(p.state(), PlaybackState::Playing { year: 2000, token: t });
        assert_eq!(p.tick(t), Some(2001));
        assert_eq!(p.tick(t), Some(2002));
        assert_eq!(p.tick(t), None);
        assert_eq!(p.state(), PlaybackState::Idle);
    }

    #[test]
    fn stale_tokens_are_ignored() {
        let mut p = Playback::new();
        let old = p.start(YearRange::new(2000, 2010)).unwrap();
        let new = p.start(YearRange::new(1990, 1995)).unwrap();
        assert_ne!(old, new);
        assert_eq!(p.tick(old), None);
        assert_eq!(p.tick(new), Some(1991));
    }

    #[test]
    fn stop_freezes_the_current_year() {
        let mut p = Playback::new();
        let t = p.start(YearRange::new(2000, 2005)).unwrap();
        p.tick(t);
        p.stop();
        assert_eq!(p.state(), PlaybackState::Stopped { year: 2001 });
        assert_eq!(p.tick(t), None);
        assert!(!p.is_playing());
        assert!(p.start(YearRange::new(2005, 2004)).is_none());
    }

    #[test]
    fn clipping_keeps_the_axis() {
        let mut m = YearCategoryMatrix {
            categories: vec!["A".into()],
            ..YearCategoryMatrix::default()
        };
        for (y, n) in [(2000, 1), (2001, 5), (2002, 2)] {
            m.rows.insert(y, BTreeMap::from([("A".to_string(), n)]));
        }
        let full = layout(&m, &m.categories, StackPolicy::ZeroBaseline);
        let c = clip_layout(&full, 2000);
        assert_eq!(c.years, vec![2000]);
        assert_eq!(c.series[0].bands.len(), 1);
        assert_eq!(c.value_range, full.value_range);
    }
}
