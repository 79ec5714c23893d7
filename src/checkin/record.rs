use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::crowd::CrowdTier;
use crate::store::Document;

/// Collection holding one check-in document per place.
pub const COLLECTION: &str = "pub_checkins";

/// Document field names.
pub mod fields {
    pub const PUB_ID: &str = "pubId";
    pub const TAGS: &str = "tags";
    pub const TAG_COUNTS: &str = "tagCounts";
    pub const CROWD_COUNT: &str = "crowdCount";
    pub const UPDATED_AT: &str = "updatedAt";
}

/// Aggregated check-in state for one place.
///
/// `tags` is the most recent submitter's full selection, while
/// `tag_counts` accumulates every submission ever made. The two diverge
/// as soon as a later submission drops a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInRecord {
    pub place_id: String,
    pub tags: BTreeSet<String>,
    pub tag_counts: BTreeMap<String, u64>,
    pub crowd_count: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CheckInRecord {
    /// Decode a stored document leniently: wrong-typed entries are skipped
    /// rather than failing the whole read.
    pub fn from_document(place_id: &str, doc: &Document) -> Self {
        let tags = doc
            .get(fields::TAGS)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let tag_counts = doc
            .get(fields::TAG_COUNTS)
            .and_then(Value::as_object)
            .map(|counts| {
                counts
                    .iter()
                    .filter_map(|(tag, n)| n.as_u64().map(|n| (tag.clone(), n)))
                    .collect()
            })
            .unwrap_or_default();

        let crowd_count = doc
            .get(fields::CROWD_COUNT)
            .and_then(Value::as_u64)
            .unwrap_or(0);

        let updated_at = doc
            .get(fields::UPDATED_AT)
            .and_then(Value::as_i64)
            .and_then(DateTime::from_timestamp_millis);

        Self {
            place_id: place_id.to_string(),
            tags,
            tag_counts,
            crowd_count,
            updated_at,
        }
    }

    pub fn tier(&self) -> CrowdTier {
        CrowdTier::from_count(self.crowd_count)
    }

    pub fn tag_count(&self, tag: &str) -> u64 {
        self.tag_counts.get(tag).copied().unwrap_or(0)
    }

    /// Tags ordered by historical popularity, most popular first.
    pub fn popular_tags(&self) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(&str, u64)> = self
            .tag_counts
            .iter()
            .map(|(tag, n)| (tag.as_str(), *n))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_from_full_document() {
        let record = CheckInRecord::from_document(
            "p1",
            &doc(json!({
                "pubId": "p1",
                "tags": ["Loud", "Rock", "Loud"],
                "tagCounts": {"Loud": 3, "Rock": 1},
                "crowdCount": 12,
                "updatedAt": 1_700_000_000_000i64
            })),
        );
        assert_eq!(record.place_id, "p1");
        assert_eq!(record.tags.len(), 2);
        assert_eq!(record.tag_count("Loud"), 3);
        assert_eq!(record.tag_count("Cozy"), 0);
        assert_eq!(record.crowd_count, 12);
        assert_eq!(record.tier(), CrowdTier::Cold);
        assert_eq!(
            record.updated_at.unwrap().timestamp_millis(),
            1_700_000_000_000
        );
    }

    #[test]
    fn test_missing_crowd_count_reads_zero() {
        let record = CheckInRecord::from_document("p1", &doc(json!({"tags": ["Cozy"]})));
        assert_eq!(record.crowd_count, 0);
        assert!(record.tag_counts.is_empty());
        assert!(record.updated_at.is_none());
    }

    #[test]
    fn test_wrong_typed_entries_are_skipped() {
        let record = CheckInRecord::from_document(
            "p1",
            &doc(json!({
                "tags": ["Cozy", 4, null],
                "tagCounts": {"Cozy": "many", "Pop": 2},
                "crowdCount": -3
            })),
        );
        assert_eq!(record.tags, BTreeSet::from(["Cozy".to_string()]));
        assert_eq!(record.tag_counts, BTreeMap::from([("Pop".to_string(), 2)]));
        assert_eq!(record.crowd_count, 0);
    }

    #[test]
    fn test_popular_tags_ordering() {
        let record = CheckInRecord::from_document(
            "p1",
            &doc(json!({"tagCounts": {"Rock": 2, "Cozy": 5, "Pop": 2}})),
        );
        assert_eq!(
            record.popular_tags(),
            vec![("Cozy", 5), ("Pop", 2), ("Rock", 2)]
        );
    }
}
