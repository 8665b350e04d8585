//! Tally — service → severity → occurrence tables.
//!
//! The same type backs the per-file partial tally produced by ingestion and
//! the run-wide aggregate owned by the reducer. Ordered maps keep reports and
//! comparisons deterministic regardless of merge order.

use std::collections::BTreeMap;
use serde::Serialize;

/// Severity → count for a single service.
pub type SeverityCounts = BTreeMap<String, u64>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Tally {
    services: BTreeMap<String, SeverityCounts>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `severity` for `service`.
    #[inline]
    pub fn record(&mut self, service: &str, severity: &str) {
        self.add(service, severity, 1);
    }

    /// Add `count` occurrences, creating the nested entries on first use.
    pub fn add(&mut self, service: &str, severity: &str, count: u64) {
        // Look up by &str first so repeat keys don't allocate
        if let Some(severities) = self.services.get_mut(service) {
            match severities.get_mut(severity) {
                Some(existing) => *existing = existing.saturating_add(count),
                None => {
                    severities.insert(severity.to_string(), count);
                }
            }
            return;
        }
        let mut severities = SeverityCounts::new();
        severities.insert(severity.to_string(), count);
        self.services.insert(service.to_string(), severities);
    }

    /// Fold another tally into this one. Commutative and associative;
    /// merging an empty tally is a no-op.
    pub fn merge(&mut self, other: Tally) {
        for (service, severities) in other.services {
            let target = self.services.entry(service).or_default();
            for (severity, count) in severities {
                let slot = target.entry(severity).or_insert(0);
                *slot = slot.saturating_add(count);
            }
        }
    }

    /// Count for a service/severity pair, zero when absent.
    pub fn get(&self, service: &str, severity: &str) -> u64 {
        self.services
            .get(service)
            .and_then(|severities| severities.get(severity))
            .copied()
            .unwrap_or(0)
    }

    pub fn service(&self, service: &str) -> Option<&SeverityCounts> {
        self.services.get(service)
    }

    /// Services in lexical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SeverityCounts)> {
        self.services.iter().map(|(name, counts)| (name.as_str(), counts))
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    /// Sum of every count in the table.
    pub fn total(&self) -> u64 {
        self.services
            .values()
            .flat_map(|severities| severities.values())
            .fold(0u64, |acc, n| acc.saturating_add(*n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally_of(entries: &[(&str, &str, u64)]) -> Tally {
        let mut tally = Tally::new();
        for (service, severity, count) in entries {
            tally.add(service, severity, *count);
        }
        tally
    }

    fn merged(parts: &[&Tally]) -> Tally {
        let mut total = Tally::new();
        for part in parts {
            total.merge((*part).clone());
        }
        total
    }

    #[test]
    fn test_record_initializes_nested_entries() {
        let mut tally = Tally::new();
        tally.record("auth", "ERROR");
        tally.record("auth", "ERROR");
        tally.record("auth", "WARN");

        assert_eq!(tally.get("auth", "ERROR"), 2);
        assert_eq!(tally.get("auth", "WARN"), 1);
        assert_eq!(tally.get("auth", "INFO"), 0);
        assert_eq!(tally.get("billing", "ERROR"), 0);
        assert_eq!(tally.service_count(), 1);
        assert_eq!(tally.total(), 3);
    }

    #[test]
    fn test_merge_adds_counts() {
        let mut total = tally_of(&[("auth", "ERROR", 2)]);
        total.merge(tally_of(&[("auth", "ERROR", 3), ("auth", "WARN", 1), ("billing", "ERROR", 1)]));

        assert_eq!(total.get("auth", "ERROR"), 5);
        assert_eq!(total.get("auth", "WARN"), 1);
        assert_eq!(total.get("billing", "ERROR"), 1);
    }

    #[test]
    fn test_merge_empty_is_noop() {
        let mut total = tally_of(&[("auth", "ERROR", 2)]);
        let before = total.clone();
        total.merge(Tally::new());
        assert_eq!(total, before);

        let mut empty = Tally::new();
        empty.merge(Tally::new());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_merge_is_commutative() {
        let a = tally_of(&[("auth", "ERROR", 2), ("auth", "WARN", 1)]);
        let b = tally_of(&[("billing", "ERROR", 1), ("auth", "ERROR", 4)]);
        let c = tally_of(&[("search", "DEBUG", 7)]);

        let orders: [[&Tally; 3]; 6] = [
            [&a, &b, &c],
            [&a, &c, &b],
            [&b, &a, &c],
            [&b, &c, &a],
            [&c, &a, &b],
            [&c, &b, &a],
        ];
        let expected = merged(&orders[0]);
        for order in &orders[1..] {
            assert_eq!(merged(order), expected);
        }
        assert_eq!(expected.get("auth", "ERROR"), 6);
        assert_eq!(expected.total(), 15);
    }

    #[test]
    fn test_merge_is_associative() {
        let a = tally_of(&[("auth", "ERROR", 2)]);
        let b = tally_of(&[("auth", "ERROR", 1), ("billing", "WARN", 3)]);
        let c = tally_of(&[("billing", "WARN", 2)]);

        // (a + b) + c
        let mut left = a.clone();
        left.merge(b.clone());
        left.merge(c.clone());

        // a + (b + c)
        let mut bc = b.clone();
        bc.merge(c.clone());
        let mut right = a.clone();
        right.merge(bc);

        assert_eq!(left, right);
    }

    #[test]
    fn test_iter_is_sorted_by_service() {
        let tally = tally_of(&[("zeta", "INFO", 1), ("alpha", "INFO", 1), ("mid", "INFO", 1)]);
        let names: Vec<&str> = tally.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_serializes_as_nested_map() {
        let tally = tally_of(&[("auth", "ERROR", 2), ("auth", "WARN", 1)]);
        let json = serde_json::to_string(&tally).expect("serialize tally");
        assert_eq!(json, r#"{"auth":{"ERROR":2,"WARN":1}}"#);
    }
}
