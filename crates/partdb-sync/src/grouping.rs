//! Grouping of footprint records by `(MPN, PartDB ID)`.

use crate::footprint::FootprintRecord;
use partdb_api::InventoryPart;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Identity of a group: `(mpn, inventory_id)` with absent values as `""`.
///
/// Equality and ordering ignore letter case. Within each component an empty
/// value sorts after every non-empty one.
#[derive(Debug, Clone, Default)]
pub struct GroupKey {
    pub mpn: String,
    pub inventory_id: String,
}

impl GroupKey {
    pub fn new(mpn: impl Into<String>, inventory_id: impl Into<String>) -> Self {
        Self {
            mpn: mpn.into(),
            inventory_id: inventory_id.into(),
        }
    }

    pub fn of(record: &FootprintRecord) -> Self {
        Self::new(
            record.mpn.clone().unwrap_or_default(),
            record.inventory_id.clone().unwrap_or_default(),
        )
    }
}

fn compare_component(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a
            .chars()
            .flat_map(char::to_lowercase)
            .cmp(b.chars().flat_map(char::to_lowercase)),
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_component(&self.mpn, &other.mpn)
            .then_with(|| compare_component(&self.inventory_id, &other.inventory_id))
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

#[derive(Debug, Clone, PartialEq)]
pub struct FootprintGroup {
    pub key: GroupKey,
    pub members: Vec<FootprintRecord>,
}

impl FootprintGroup {
    pub fn references(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.reference.as_str()).collect()
    }

    pub fn part(&self) -> Option<&Arc<InventoryPart>> {
        self.members.first()?.part.as_ref()
    }

    pub fn storage_location(&self) -> Option<String> {
        self.members.first()?.storage_location()
    }

    pub fn quantity(&self) -> Option<f64> {
        self.members.first()?.quantity()
    }
}

/// Immutable snapshot of grouped footprints, in [`GroupKey`] order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedFootprints {
    groups: Vec<FootprintGroup>,
}

impl GroupedFootprints {
    pub fn groups(&self) -> &[FootprintGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Every member record, group by group.
    pub fn records(&self) -> impl Iterator<Item = &FootprintRecord> {
        self.groups.iter().flat_map(|g| g.members.iter())
    }

    pub fn footprint_count(&self) -> usize {
        self.groups.iter().map(|g| g.members.len()).sum()
    }

    pub(crate) fn from_groups(groups: Vec<FootprintGroup>) -> Self {
        Self { groups }
    }
}

impl IntoIterator for GroupedFootprints {
    type Item = FootprintGroup;
    type IntoIter = std::vec::IntoIter<FootprintGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

/// Partition `records` into groups of equal [`GroupKey`].
pub fn group(records: impl IntoIterator<Item = FootprintRecord>) -> GroupedFootprints {
    let mut buckets: BTreeMap<GroupKey, Vec<FootprintRecord>> = BTreeMap::new();
    for record in records {
        buckets.entry(GroupKey::of(&record)).or_default().push(record);
    }
    GroupedFootprints::from_groups(
        buckets
            .into_iter()
            .map(|(key, members)| FootprintGroup { key, members })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(reference: &str, mpn: &str, id: &str) -> FootprintRecord {
        FootprintRecord::new(0, reference, Some(mpn.to_string()), Some(id.to_string()))
    }

    fn keys(grouped: &GroupedFootprints) -> Vec<(String, String)> {
        grouped
            .groups()
            .iter()
            .map(|g| (g.key.mpn.clone(), g.key.inventory_id.clone()))
            .collect()
    }

    #[test]
    fn key_order_is_case_insensitive_with_empty_last() {
        let mut sorted = vec![
            GroupKey::new("", ""),
            GroupKey::new("GRM200", "379"),
            GroupKey::new("grm123", "312"),
            GroupKey::new("grm123", "311"),
        ];
        sorted.sort();
        assert_eq!(
            sorted,
            vec![
                GroupKey::new("grm123", "311"),
                GroupKey::new("grm123", "312"),
                GroupKey::new("GRM200", "379"),
                GroupKey::new("", ""),
            ]
        );
        assert_eq!(GroupKey::new("GRM123", "abc"), GroupKey::new("grm123", "ABC"));
        assert!(GroupKey::new("GRM200", "379") < GroupKey::new("GRM200", ""));
        assert!(GroupKey::new("Z", "") < GroupKey::new("", "1"));
    }

    #[test]
    fn empty_input_gives_empty_snapshot() {
        let grouped = group(Vec::new());
        assert!(grouped.is_empty());
        assert_eq!(grouped.footprint_count(), 0);
    }

    #[test]
    fn groups_partition_records_in_key_order() {
        let records = vec![
            record("C1", "GRM123", "312"),
            record("C33", "GRM123", "311"),
            record("C38", "grm123", "312"),
            record("C2", "GRM200", "379"),
            record("C9", "GRM200", ""),
            FootprintRecord::new(0, "R1", None, None),
        ];
        let grouped = group(records.clone());
        assert_eq!(
            keys(&grouped),
            vec![
                ("GRM123".into(), "311".into()),
                ("GRM123".into(), "312".into()),
                ("GRM200".into(), "379".into()),
                ("GRM200".into(), "".into()),
                ("".into(), "".into()),
            ]
        );
        // First-encountered spelling wins, members keep encounter order.
        assert_eq!(grouped.groups()[1].references(), vec!["C1", "C38"]);
        assert_eq!(grouped.groups()[1].members[1].mpn.as_deref(), Some("grm123"));

        assert_eq!(grouped.footprint_count(), records.len());
        let mut seen: Vec<&str> = grouped.records().map(|r| r.reference.as_str()).collect();
        seen.sort();
        let mut expected: Vec<&str> = records.iter().map(|r| r.reference.as_str()).collect();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn regrouping_is_idempotent() {
        let grouped = group(vec![
            record("C10", "GRM200", ""),
            record("C1", "GRM123", "312"),
            record("C8", "GRM200", "379"),
            record("C38", "GRM123", "312"),
        ]);
        let again = group(grouped.records().cloned());
        assert_eq!(again, grouped);
    }
}
