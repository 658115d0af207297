use std::collections::BTreeMap;

/// Cosine of two equal-length vectors. Zero-norm (or mismatched) input gives 0,
/// so an empty distribution always reads as a full shift.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0;
    let mut na = 0.0;
    let mut nb = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    (dot / (na.sqrt() * nb.sqrt())).clamp(0.0, 1.0)
}

/// Counts over `keys` divided by their sum (sum of 0 is treated as 1).
pub fn distribution(counts: &BTreeMap<String, u64>, keys: &[String]) -> Vec<f64> {
    let total = counts.values().sum::<u64>().max(1) as f64;
    keys.iter()
        .map(|k| counts.get(k).copied().unwrap_or(0) as f64 / total)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_similarity_one() {
        let v = [0.5, 0.25, 0.25];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn disjoint_vectors_have_similarity_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn zero_vectors_are_guarded() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn distribution_normalizes_and_guards_empty() {
        let keys = vec!["a".to_string(), "b".to_string()];
        let mut counts = BTreeMap::new();
        counts.insert("a".to_string(), 3);
        counts.insert("b".to_string(), 1);
        assert_eq!(distribution(&counts, &keys), vec![0.75, 0.25]);
        assert_eq!(distribution(&BTreeMap::new(), &keys), vec![0.0, 0.0]);
    }
}
