use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use super::record::{CheckInRecord, fields};
use crate::errors::CheckInError;
use crate::store::{CheckInStore, DocumentWrite, FieldPath};

/// Check-in synchronization against a document store.
///
/// Every call goes straight to the store: no caching, no retries, no
/// queued writes. Neither write is idempotent; each call is one vote.
#[derive(Clone)]
pub struct CheckInSync {
    store: Arc<dyn CheckInStore>,
}

impl CheckInSync {
    pub fn new(store: Arc<dyn CheckInStore>) -> Self {
        Self { store }
    }

    /// Replace the place's current tag set and add one vote per tag to the
    /// cumulative histogram.
    ///
    /// Blank tags are dropped and duplicates collapse. Tags missing from
    /// this submission keep their historical counts.
    pub async fn submit_tags<I, S>(&self, place_id: &str, tags: I) -> Result<(), CheckInError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        require_place_id(place_id)?;
        let tags: BTreeSet<String> = tags
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        let mut write = DocumentWrite::new()
            .set(fields::PUB_ID, place_id)
            .set(
                fields::TAGS,
                Value::Array(tags.iter().cloned().map(Value::from).collect()),
            )
            .set(fields::UPDATED_AT, Utc::now().timestamp_millis());
        for tag in &tags {
            write = write.increment(FieldPath::nested(fields::TAG_COUNTS, tag.as_str()), 1);
        }

        self.store.merge_upsert(place_id, write).await?;
        tracing::info!(place_id, tags = tags.len(), "submitted check-in tags");
        Ok(())
    }

    /// Add one to the place's crowd counter.
    pub async fn register_check_in(&self, place_id: &str) -> Result<(), CheckInError> {
        require_place_id(place_id)?;
        let write = DocumentWrite::new()
            .set(fields::PUB_ID, place_id)
            .increment(FieldPath::new(fields::CROWD_COUNT), 1);
        self.store.merge_upsert(place_id, write).await?;
        tracing::info!(place_id, "registered check-in");
        Ok(())
    }

    /// Current aggregate for a place, or `None` if nobody has checked in.
    pub async fn fetch_check_in_state(
        &self,
        place_id: &str,
    ) -> Result<Option<CheckInRecord>, CheckInError> {
        require_place_id(place_id)?;
        let doc = self.store.get(place_id).await?;
        Ok(doc.map(|doc| CheckInRecord::from_document(place_id, &doc)))
    }

    /// Crowd count for display; read failures and absent records read as 0.
    pub async fn crowd_count_or_zero(&self, place_id: &str) -> u64 {
        match self.fetch_check_in_state(place_id).await {
            Ok(Some(record)) => record.crowd_count,
            Ok(None) => 0,
            Err(e) => {
                tracing::warn!(place_id, error = %e, "crowd count unavailable, showing zero");
                0
            }
        }
    }
}

fn require_place_id(place_id: &str) -> Result<(), CheckInError> {
    if place_id.trim().is_empty() {
        return Err(CheckInError::EmptyPlaceId);
    }
    Ok(())
}
