//! Age buckets and their fixed canonical order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Age bands reported by the backend, in canonical display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeBucket {
    Under10,
    Teens,
    Twenties,
    Thirties,
    Forties,
    Fifties,
    Sixties,
    Seventies,
    Eighties,
    Nineties,
    HundredPlus,
}

impl AgeBucket {
    /// All buckets in canonical order.
    pub const ALL: [AgeBucket; 11] = [
        AgeBucket::Under10,
        AgeBucket::Teens,
        AgeBucket::Twenties,
        AgeBucket::Thirties,
        AgeBucket::Forties,
        AgeBucket::Fifties,
        AgeBucket::Sixties,
        AgeBucket::Seventies,
        AgeBucket::Eighties,
        AgeBucket::Nineties,
        AgeBucket::HundredPlus,
    ];

    /// Wire label used by the backend.
    pub fn label(&self) -> &'static str {
        match self {
            AgeBucket::Under10 => "10세 미만",
            AgeBucket::Teens => "10대",
            AgeBucket::Twenties => "20대",
            AgeBucket::Thirties => "30대",
            AgeBucket::Forties => "40대",
            AgeBucket::Fifties => "50대",
            AgeBucket::Sixties => "60대",
            AgeBucket::Seventies => "70대",
            AgeBucket::Eighties => "80대",
            AgeBucket::Nineties => "90대",
            AgeBucket::HundredPlus => "100세 이상",
        }
    }

    /// Parse a wire label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|bucket| bucket.label() == label)
    }
}

/// One row of an age distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgeEntry {
    /// Label as received
    pub label: String,
    /// Canonical bucket, if the label is known
    pub bucket: Option<AgeBucket>,
    pub count: u64,
}

/// Age distribution sorted into canonical order.
///
/// Known buckets come first in the fixed order regardless of the order they
/// were received in. Unknown labels are kept after them in received order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "IndexMap<String, u64>", into = "IndexMap<String, u64>")]
pub struct AgeDistribution {
    entries: Vec<AgeEntry>,
}

impl AgeDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &AgeEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count for a bucket, if present.
    pub fn get(&self, bucket: AgeBucket) -> Option<u64> {
        self.entries
            .iter()
            .find(|entry| entry.bucket == Some(bucket))
            .map(|entry| entry.count)
    }

    /// Sum over all rows.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|entry| entry.count).sum()
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for AgeDistribution {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut entries: Vec<AgeEntry> = iter
            .into_iter()
            .map(|(label, count)| {
                let label = label.into();
                AgeEntry {
                    bucket: AgeBucket::from_label(&label),
                    label,
                    count,
                }
            })
            .collect();

        // Stable sort keeps unknown labels in received order
        entries.sort_by_key(|entry| match entry.bucket {
            Some(bucket) => (0, bucket as usize),
            None => (1, 0),
        });

        Self { entries }
    }
}

impl From<IndexMap<String, u64>> for AgeDistribution {
    fn from(map: IndexMap<String, u64>) -> Self {
        map.into_iter().collect()
    }
}

impl From<AgeDistribution> for IndexMap<String, u64> {
    fn from(distribution: AgeDistribution) -> Self {
        distribution
            .entries
            .into_iter()
            .map(|entry| (entry.label, entry.count))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip() {
        for bucket in AgeBucket::ALL {
            assert_eq!(AgeBucket::from_label(bucket.label()), Some(bucket));
        }
        assert_eq!(AgeBucket::from_label("unknown"), None);
    }

    #[test]
    fn test_canonical_order_regardless_of_input_order() {
        let distribution: AgeDistribution = [
            ("100세 이상", 1),
            ("30대", 30),
            ("10세 미만", 5),
            ("20대", 20),
        ]
        .into_iter()
        .collect();

        let labels: Vec<&str> = distribution.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["10세 미만", "20대", "30대", "100세 이상"]);
        assert_eq!(distribution.total(), 56);
        assert_eq!(distribution.get(AgeBucket::Thirties), Some(30));
        assert_eq!(distribution.get(AgeBucket::Teens), None);
    }

    #[test]
    fn test_unknown_labels_follow_known_in_received_order() {
        let distribution: AgeDistribution =
            [("zeta", 1), ("40대", 4), ("alpha", 2)].into_iter().collect();

        let labels: Vec<&str> = distribution.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["40대", "zeta", "alpha"]);
    }

    #[test]
    fn test_deserialize_from_wire_map() {
        let json = r#"{"20대": 200, "10대": 100, "10세 미만": 50}"#;
        let distribution: AgeDistribution =
            serde_json::from_str(json).expect("valid distribution");
        let buckets: Vec<Option<AgeBucket>> = distribution.iter().map(|e| e.bucket).collect();
        assert_eq!(
            buckets,
            vec![
                Some(AgeBucket::Under10),
                Some(AgeBucket::Teens),
                Some(AgeBucket::Twenties)
            ]
        );

        // Serializes back in canonical order
        let out = serde_json::to_string(&distribution).expect("serializes");
        assert_eq!(out, r#"{"10세 미만":50,"10대":100,"20대":200}"#);
    }
}
