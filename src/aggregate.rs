//! Group-by aggregation
//!
//! The shared primitive behind daily hydration totals, the mood tally and
//! every chart series: group items by key, add up a value per key, and keep
//! keys in the order they were first seen.

use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;
use std::ops::AddAssign;

/// Sum `value` per `key`, ordered by first appearance of each key
pub fn group_by<T, K, V, FK, FV>(items: impl IntoIterator<Item = T>, key: FK, value: FV) -> Vec<(K, V)>
where
    K: Eq + Hash + Clone,
    V: AddAssign + Default,
    FK: Fn(&T) -> K,
    FV: Fn(&T) -> V,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, V)> = Vec::new();

    for item in items {
        let k = key(&item);
        let v = value(&item);
        match slots.get(&k) {
            Some(&idx) => groups[idx].1 += v,
            None => {
                slots.insert(k.clone(), groups.len());
                let mut acc = V::default();
                acc += v;
                groups.push((k, acc));
            }
        }
    }

    groups
}

/// Count occurrences per key, ordered by first appearance
pub fn tally<T, K, FK>(items: impl IntoIterator<Item = T>, key: FK) -> Vec<(K, usize)>
where
    K: Eq + Hash + Clone,
    FK: Fn(&T) -> K,
{
    group_by(items, key, |_| 1usize)
}

/// Key with the highest count
///
/// Ties go to the key that appeared later.
pub fn most_frequent<K: Clone>(counts: &[(K, usize)]) -> Option<K> {
    counts
        .iter()
        .reduce(|best, candidate| if best.1 > candidate.1 { best } else { candidate })
        .map(|(k, _)| k.clone())
}

/// Chart-ready data: one label per point
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Series {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterate `(label, value)` pairs
    pub fn points(&self) -> impl Iterator<Item = (&str, f64)> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

impl<L: Into<String>> FromIterator<(L, f64)> for Series {
    fn from_iter<I: IntoIterator<Item = (L, f64)>>(iter: I) -> Self {
        let mut series = Series::default();
        for (label, value) in iter {
            series.labels.push(label.into());
            series.values.push(value);
        }
        series
    }
}
