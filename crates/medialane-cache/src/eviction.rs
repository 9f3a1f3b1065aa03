//! Tiered staleness eviction.
//!
//! Each tier is tried only when the previous one selected nothing:
//!
//! 1. durable entries last touched more than `stale_after` ago (7 days);
//! 2. durable entries last touched more than `aging_after` ago (1 day);
//! 3. every entry without a timestamp, plus the oldest `oldest_percent`
//!    (30%, rounded up) of the timestamped ones.
//!
//! Tier 3 selects at least one entry whenever any entry exists.

use chrono::{DateTime, Duration, Utc};
use medialane_storage::EntryMeta;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionTier {
    Stale,
    Aging,
    Oldest,
    /// The tier was empty.
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictionPlan {
    pub tier: EvictionTier,
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    pub stale_after: Duration,
    pub aging_after: Duration,
    pub oldest_percent: u32,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self {
            stale_after: Duration::days(7),
            aging_after: Duration::days(1),
            oldest_percent: 30,
        }
    }
}

impl EvictionPolicy {
    /// Choose what to remove from `entries` at time `now`.
    pub fn plan(&self, entries: &[EntryMeta], now: DateTime<Utc>) -> EvictionPlan {
        for (tier, max_age) in [
            (EvictionTier::Stale, self.stale_after),
            (EvictionTier::Aging, self.aging_after),
        ] {
            let keys: Vec<String> = entries
                .iter()
                .filter(|e| e.last_touched.is_some_and(|t| now - t > max_age))
                .map(|e| e.key.clone())
                .collect();
            if !keys.is_empty() {
                return EvictionPlan { tier, keys };
            }
        }

        let (mut timestamped, untimestamped): (Vec<&EntryMeta>, Vec<&EntryMeta>) =
            entries.iter().partition(|e| e.last_touched.is_some());

        let mut keys: Vec<String> = untimestamped.iter().map(|e| e.key.clone()).collect();

        timestamped.sort_by(|a, b| {
            a.last_touched
                .cmp(&b.last_touched)
                .then_with(|| a.key.cmp(&b.key))
        });
        let oldest = self.oldest_count(timestamped.len());
        keys.extend(timestamped.iter().take(oldest).map(|e| e.key.clone()));

        let tier = if keys.is_empty() {
            EvictionTier::Nothing
        } else {
            EvictionTier::Oldest
        };
        EvictionPlan { tier, keys }
    }

    /// `ceil(n * oldest_percent / 100)`, at least 1 when `n > 0`.
    fn oldest_count(&self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        let percent = self.oldest_percent.min(100) as usize;
        ((n * percent).div_ceil(100)).clamp(1, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-18T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn entry(key: &str, age: Option<Duration>) -> EntryMeta {
        EntryMeta {
            key: key.to_string(),
            last_touched: age.map(|a| now() - a),
            size_bytes: 10,
        }
    }

    fn sorted(mut keys: Vec<String>) -> Vec<String> {
        keys.sort();
        keys
    }

    #[test]
    fn stale_entries_only() {
        let entries = vec![
            entry("week-old", Some(Duration::days(8))),
            entry("two-days", Some(Duration::days(2))),
            entry("fresh", Some(Duration::minutes(5))),
        ];
        let plan = EvictionPolicy::default().plan(&entries, now());
        assert_eq!(plan.tier, EvictionTier::Stale);
        assert_eq!(plan.keys, vec!["week-old"]);
    }

    #[test]
    fn aging_when_nothing_is_stale() {
        let entries = vec![
            entry("a", Some(Duration::hours(30))),
            entry("b", Some(Duration::hours(25))),
            entry("fresh", Some(Duration::hours(1))),
        ];
        let plan = EvictionPolicy::default().plan(&entries, now());
        assert_eq!(plan.tier, EvictionTier::Aging);
        assert_eq!(sorted(plan.keys), vec!["a", "b"]);
    }

    #[test]
    fn exactly_one_day_is_not_older_than_one_day() {
        let entries = vec![entry("edge", Some(Duration::days(1)))];
        let plan = EvictionPolicy::default().plan(&entries, now());
        assert_eq!(plan.tier, EvictionTier::Oldest);
    }

    #[test]
    fn oldest_thirty_percent_rounded_up_plus_untimestamped() {
        let mut entries: Vec<EntryMeta> = (0..4)
            .map(|i| entry(&format!("t{}", i), Some(Duration::minutes(i * 10))))
            .collect();
        entries.push(entry("legacy", None));

        let plan = EvictionPolicy::default().plan(&entries, now());
        assert_eq!(plan.tier, EvictionTier::Oldest);
        // ceil(4 * 0.3) = 2 oldest: t3 (30 min), t2 (20 min).
        assert_eq!(sorted(plan.keys), vec!["legacy", "t2", "t3"]);
    }

    #[test]
    fn single_fresh_entry_is_still_removed() {
        let entries = vec![entry("only", Some(Duration::seconds(1)))];
        let plan = EvictionPolicy::default().plan(&entries, now());
        assert_eq!(plan.keys, vec!["only"]);
    }

    #[test]
    fn zero_percent_still_makes_progress() {
        let policy = EvictionPolicy {
            oldest_percent: 0,
            ..EvictionPolicy::default()
        };
        let entries = vec![
            entry("a", Some(Duration::seconds(1))),
            entry("b", Some(Duration::seconds(2))),
        ];
        assert_eq!(policy.plan(&entries, now()).keys, vec!["b"]);
    }

    #[test]
    fn ten_entries_remove_three() {
        let entries: Vec<EntryMeta> = (0..10)
            .map(|i| entry(&format!("k{}", i), Some(Duration::minutes(i))))
            .collect();
        let plan = EvictionPolicy::default().plan(&entries, now());
        assert_eq!(sorted(plan.keys), vec!["k7", "k8", "k9"]);
    }

    #[test]
    fn empty_tier_plans_nothing() {
        let plan = EvictionPolicy::default().plan(&[], now());
        assert_eq!(plan.tier, EvictionTier::Nothing);
        assert!(plan.keys.is_empty());
    }
}
