use itertools::Itertools;
use std::cmp::Reverse;
use std::collections::HashMap;

/// Counter that remembers first-seen order, so descending ranks break ties stably.
#[derive(Debug, Clone, Default)]
pub struct Tally {
    index: HashMap<String, usize>,
    entries: Vec<(String, u64)>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: &str) {
        self.add_n(key, 1);
    }

    pub fn add_n(&mut self, key: &str, n: u64) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].1 += n,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), n));
            }
        }
    }

    pub fn get(&self, key: &str) -> u64 {
        self.index.get(key).map(|&i| self.entries[i].1).unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-seen order.
    pub fn entries(&self) -> &[(String, u64)] {
        &self.entries
    }

    /// Descending by count, ties in first-seen order.
    pub fn ranked(&self) -> Vec<(String, u64)> {
        self.entries
            .iter()
            .cloned()
            .sorted_by_key(|(_, c)| Reverse(*c))
            .collect()
    }

    /// Max entry where a later entry wins a tie.
    pub fn last_max(&self) -> Option<&(String, u64)> {
        self.entries
            .iter()
            .fold(None, |best: Option<&(String, u64)>, e| match best {
                Some(b) if b.1 > e.1 => Some(b),
                _ => Some(e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranked_is_stable_on_ties() {
        let mut t = Tally::new();
        for k in ["b", "a", "c", "a", "c"] {
            t.add(k);
        }
        let r = t.ranked();
        assert_eq!(r, vec![("a".into(), 2), ("c".into(), 2), ("b".into(), 1)]);
        assert_eq!(t.total(), 5);
    }

    #[test]
    fn last_max_prefers_later_on_ties() {
        let mut t = Tally::new();
        t.add_n("x", 3);
        t.add_n("y", 3);
        t.add_n("z", 1);
        assert_eq!(t.last_max().map(|e| e.0.as_str()), Some("y"));
        assert!(Tally::new().last_max().is_none());
    }
}
