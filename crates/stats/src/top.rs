//! Top-K accumulation tables

use std::collections::HashMap;
use std::ops::AddAssign;

/// A keyed accumulator that reports its largest entries
///
/// Used both as a counter (exception class → occurrences) and as a sum
/// (thread → cumulative blocked milliseconds).
#[derive(Debug, Clone, Default)]
pub struct TopTable<V> {
    entries: HashMap<String, V>,
}

impl<V> TopTable<V>
where
    V: Copy + Default + AddAssign + PartialOrd,
{
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Add `amount` to `key`'s entry
    pub fn add(&mut self, key: &str, amount: V) {
        if let Some(value) = self.entries.get_mut(key) {
            *value += amount;
        } else {
            let mut value = V::default();
            value += amount;
            self.entries.insert(key.to_string(), value);
        }
    }

    /// Current value for `key`
    pub fn get(&self, key: &str) -> Option<V> {
        self.entries.get(key).copied()
    }

    /// The `k` largest entries, descending; ties break by key
    pub fn top(&self, k: usize) -> Vec<(String, V)> {
        let mut entries: Vec<(String, V)> = self
            .entries
            .iter()
            .map(|(key, value)| (key.clone(), *value))
            .collect();

        entries.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        entries.truncate(k);
        entries
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_accumulate() {
        let mut table = TopTable::<u64>::new();
        table.add("IOException", 1);
        table.add("IOException", 1);
        table.add("NullPointerException", 1);

        assert_eq!(table.get("IOException"), Some(2));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_top_sorted_descending_and_truncated() {
        let mut table = TopTable::<f64>::new();
        table.add("worker-1", 10.0);
        table.add("worker-2", 250.0);
        table.add("worker-3", 40.0);
        table.add("worker-1", 5.0);

        let top = table.top(2);
        assert_eq!(
            top,
            vec![("worker-2".to_string(), 250.0), ("worker-3".to_string(), 40.0)]
        );
    }

    #[test]
    fn test_top_ties_break_by_key() {
        let mut table = TopTable::<u64>::new();
        table.add("b", 1);
        table.add("a", 1);

        let keys: Vec<String> = table.top(10).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_clear() {
        let mut table = TopTable::<u64>::new();
        table.add("x", 3);
        table.clear();
        assert!(table.is_empty());
        assert!(table.top(5).is_empty());
    }
}
