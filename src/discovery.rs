//! Nearby pubs merged with their crowd levels.

use futures::future::join_all;
use serde::Serialize;

use crate::checkin::CheckInSync;
use crate::crowd::CrowdTier;
use crate::geo::{Coordinate, distance_km};
use crate::places::{Place, PlaceSearch};

#[derive(Debug, Clone, Serialize)]
pub struct NearbyPub {
    pub place: Place,
    pub crowd_count: u64,
    pub tier: CrowdTier,
    pub distance_km: f64,
}

/// Search around `center` and attach each place's crowd count.
///
/// Crowd reads run concurrently. A place without an identifier, without a
/// record, or whose read fails shows a crowd of zero. A failed search
/// yields an empty list. Results are ordered nearest first.
pub async fn discover(
    places: &dyn PlaceSearch,
    sync: &CheckInSync,
    center: Coordinate,
    radius_m: u32,
) -> Vec<NearbyPub> {
    let found = match places.nearby(center, radius_m).await {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!(error = %e, "nearby search failed, showing no pubs");
            return Vec::new();
        }
    };

    let crowds = join_all(found.iter().map(|place| async move {
        match place.id.as_deref() {
            Some(id) => sync.crowd_count_or_zero(id).await,
            None => 0,
        }
    }))
    .await;

    let mut pubs: Vec<NearbyPub> = found
        .into_iter()
        .zip(crowds)
        .map(|(place, crowd_count)| NearbyPub {
            distance_km: distance_km(center, place.location),
            tier: CrowdTier::from_count(crowd_count),
            crowd_count,
            place,
        })
        .collect();
    pubs.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    pubs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PlacesError;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FixedPlaces(Vec<Place>);

    #[async_trait]
    impl PlaceSearch for FixedPlaces {
        async fn nearby(&self, _c: Coordinate, _r: u32) -> Result<Vec<Place>, PlacesError> {
            Ok(self.0.clone())
        }
    }

    struct FailingPlaces;

    #[async_trait]
    impl PlaceSearch for FailingPlaces {
        async fn nearby(&self, _c: Coordinate, _r: u32) -> Result<Vec<Place>, PlacesError> {
            Err(PlacesError::Status {
                status: "REQUEST_DENIED".into(),
                message: None,
            })
        }
    }

    fn place(id: Option<&str>, name: &str, lat: f64, lng: f64) -> Place {
        Place {
            id: id.map(str::to_string),
            name: name.to_string(),
            location: Coordinate::new(lat, lng),
            rating: None,
            open_now: None,
            photo_reference: None,
            vicinity: None,
        }
    }

    #[tokio::test]
    async fn test_discover_merges_crowds_and_sorts_by_distance() {
        let sync = CheckInSync::new(Arc::new(MemoryStore::new()));
        for _ in 0..12 {
            sync.register_check_in("far").await.unwrap();
        }
        sync.register_check_in("near").await.unwrap();

        let places = FixedPlaces(vec![
            place(Some("far"), "Far", 53.36, -6.26),
            place(None, "Nameless", 53.3499, -6.2603),
            place(Some("near"), "Near", 53.351, -6.2603),
        ]);
        let pubs = discover(&places, &sync, Coordinate::DUBLIN, 5000).await;

        let names: Vec<&str> = pubs.iter().map(|p| p.place.name.as_str()).collect();
        assert_eq!(names, vec!["Nameless", "Near", "Far"]);
        assert_eq!(pubs[0].crowd_count, 0);
        assert_eq!(pubs[1].crowd_count, 1);
        assert_eq!(pubs[2].crowd_count, 12);
        assert_eq!(pubs[2].tier, CrowdTier::Cold);
    }

    #[tokio::test]
    async fn test_discover_search_failure_is_empty() {
        let sync = CheckInSync::new(Arc::new(MemoryStore::new()));
        let pubs = discover(&FailingPlaces, &sync, Coordinate::DUBLIN, 5000).await;
        assert!(pubs.is_empty());
    }
}
