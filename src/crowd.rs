//! Crowd tiers: bucketing a place's check-in count into five marker levels.

use serde::{Deserialize, Serialize};

/// Display tier for a crowd count.
///
/// | crowd count | tier     | level |
/// |-------------|----------|-------|
/// | 0–10        | Frozen   | 1     |
/// | 11–20       | Cold     | 2     |
/// | 21–30       | Warm     | 3     |
/// | 31–40       | Hot      | 4     |
/// | 41+         | OnFire   | 5     |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrowdTier {
    Frozen,
    Cold,
    Warm,
    Hot,
    OnFire,
}

impl CrowdTier {
    pub const ALL: [CrowdTier; 5] = [
        CrowdTier::Frozen,
        CrowdTier::Cold,
        CrowdTier::Warm,
        CrowdTier::Hot,
        CrowdTier::OnFire,
    ];

    /// Upper bounds are inclusive.
    pub fn from_count(crowd_count: u64) -> Self {
        match crowd_count {
            0..=10 => CrowdTier::Frozen,
            11..=20 => CrowdTier::Cold,
            21..=30 => CrowdTier::Warm,
            31..=40 => CrowdTier::Hot,
            _ => CrowdTier::OnFire,
        }
    }

    /// 1-based level, matching the marker artwork.
    pub fn level(self) -> u8 {
        match self {
            CrowdTier::Frozen => 1,
            CrowdTier::Cold => 2,
            CrowdTier::Warm => 3,
            CrowdTier::Hot => 4,
            CrowdTier::OnFire => 5,
        }
    }

    /// Inclusive count range covered by this tier; `None` upper bound is open.
    pub fn range(self) -> (u64, Option<u64>) {
        match self {
            CrowdTier::Frozen => (0, Some(10)),
            CrowdTier::Cold => (11, Some(20)),
            CrowdTier::Warm => (21, Some(30)),
            CrowdTier::Hot => (31, Some(40)),
            CrowdTier::OnFire => (41, None),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CrowdTier::Frozen => "frozen",
            CrowdTier::Cold => "cold",
            CrowdTier::Warm => "warm",
            CrowdTier::Hot => "hot",
            CrowdTier::OnFire => "on fire",
        }
    }
}

impl std::fmt::Display for CrowdTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(CrowdTier::from_count(0).level(), 1);
        assert_eq!(CrowdTier::from_count(10).level(), 1);
        assert_eq!(CrowdTier::from_count(11).level(), 2);
        assert_eq!(CrowdTier::from_count(20).level(), 2);
        assert_eq!(CrowdTier::from_count(21).level(), 3);
        assert_eq!(CrowdTier::from_count(30).level(), 3);
        assert_eq!(CrowdTier::from_count(31).level(), 4);
        assert_eq!(CrowdTier::from_count(40).level(), 4);
        assert_eq!(CrowdTier::from_count(41).level(), 5);
    }

    #[test]
    fn test_tier_is_total_and_monotonic() {
        let mut previous = CrowdTier::from_count(0);
        for n in 0..=500u64 {
            let tier = CrowdTier::from_count(n);
            assert!(CrowdTier::ALL.contains(&tier));
            assert!(tier >= previous, "tier decreased at {n}");
            previous = tier;
        }
        assert_eq!(CrowdTier::from_count(u64::MAX), CrowdTier::OnFire);
    }

    #[test]
    fn test_ranges_agree_with_from_count() {
        for tier in CrowdTier::ALL {
            let (low, high) = tier.range();
            assert_eq!(CrowdTier::from_count(low), tier);
            if let Some(high) = high {
                assert_eq!(CrowdTier::from_count(high), tier);
                assert_ne!(CrowdTier::from_count(high + 1), tier);
            }
        }
    }

    #[test]
    fn test_display_uses_label() {
        assert_eq!(CrowdTier::OnFire.to_string(), "on fire");
        assert_eq!(CrowdTier::Frozen.to_string(), "frozen");
    }
}
