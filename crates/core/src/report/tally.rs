use std::collections::HashMap;

/// Key to occurrence count over one report dimension.
///
/// Owned by the aggregation run that fills it; nothing else writes to it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: HashMap<String, u64>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, key: impl Into<String>) {
        *self.counts.entry(key.into()).or_insert(0) += 1;
    }

    pub fn count(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Number of events folded into the table.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(key, count)| (key.as_str(), *count))
    }
}

impl<K: Into<String>> FromIterator<K> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut table = Self::new();
        for key in iter {
            table.increment(key);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::FrequencyTable;

    #[test]
    fn increments_accumulate_per_key() {
        let mut table = FrequencyTable::new();
        table.increment("#x");
        table.increment("#x");
        table.increment("#y");

        assert_eq!(table.count("#x"), 2);
        assert_eq!(table.count("#y"), 1);
        assert_eq!(table.count("#z"), 0);
        assert_eq!(table.len(), 2);
        assert_eq!(table.total(), 3);
    }

    #[test]
    fn collects_from_keys() {
        let table: FrequencyTable = ["a", "b", "a"].into_iter().collect();
        assert_eq!(table.count("a"), 2);
        assert!(!table.is_empty());
    }
}
