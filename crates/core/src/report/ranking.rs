use serde::Serialize;

use crate::report::aggregate::AggregationResult;
use crate::report::tally::FrequencyTable;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub key: String,
    pub count: u64,
}

/// Count descending, key ascending among equal counts.
pub fn rank(table: &FrequencyTable) -> Vec<RankedEntry> {
    let mut entries: Vec<RankedEntry> = table
        .iter()
        .map(|(key, count)| RankedEntry { key: key.to_owned(), count })
        .collect();
    entries.sort_by(|left, right| {
        right.count.cmp(&left.count).then_with(|| left.key.cmp(&right.key))
    });
    entries
}

/// The four ranked dimensions of one report.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Rankings {
    pub received: Vec<RankedEntry>,
    pub given: Vec<RankedEntry>,
    pub reactions: Vec<RankedEntry>,
    pub hashtags: Vec<RankedEntry>,
}

impl Rankings {
    pub fn from_aggregation(result: &AggregationResult) -> Self {
        Self {
            received: rank(&result.recipients),
            given: rank(&result.senders),
            reactions: rank(&result.reactors),
            hashtags: rank(&result.hashtags),
        }
    }
}
