use crate::grouping::{FootprintGroup, GroupedFootprints};
use partdb_api::{InventoryPart, PartSource};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Per-run counts of groups by lookup result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub resolved: usize,
    pub unresolved: usize,
    /// Groups without a PartDB ID.
    pub skipped: usize,
}

impl fmt::Display for ReconcileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} resolved, {} unresolved, {} without PartDB ID",
            self.resolved, self.unresolved, self.skipped
        )
    }
}

/// Look up each distinct PartDB ID once and attach the part to every member of
/// every group carrying that ID.
///
/// IDs compare case-insensitively. Groups without an ID are passed through
/// untouched. A failed lookup leaves its groups without a part and does not
/// affect any other group.
pub fn reconcile<S: PartSource + ?Sized>(
    snapshot: &GroupedFootprints,
    source: &S,
) -> (GroupedFootprints, ReconcileSummary) {
    let mut summary = ReconcileSummary::default();
    let mut parts: HashMap<String, Option<Arc<InventoryPart>>> = HashMap::new();
    let groups = snapshot
        .groups()
        .iter()
        .map(|group| {
            let mut group = group.clone();
            let id = &group.key.inventory_id;
            if id.is_empty() {
                summary.skipped += 1;
                return group;
            }
            let part = parts
                .entry(id.to_lowercase())
                .or_insert_with(|| fetch(source, id))
                .clone();
            if part.is_some() {
                summary.resolved += 1;
            } else {
                log::warn!("No PartDB part for {}", group.references().join(", "));
                summary.unresolved += 1;
            }
            attach(&mut group, part);
            group
        })
        .collect();
    log::info!("Reconciliation finished: {summary} ({} lookups)", parts.len());
    (GroupedFootprints::from_groups(groups), summary)
}

fn fetch<S: PartSource + ?Sized>(source: &S, id: &str) -> Option<Arc<InventoryPart>> {
    let part = source.fetch_part(id).map(Arc::new);
    match &part {
        Some(p) => log::debug!("Resolved PartDB ID {id} to '{}'", p.name),
        None => log::warn!("PartDB ID {id} could not be resolved"),
    }
    part
}

fn attach(group: &mut FootprintGroup, part: Option<Arc<InventoryPart>>) {
    for member in &mut group.members {
        member.part = part.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::footprint::{MemoryFootprint, scan};
    use crate::grouping::group;
    use partdb_api::{PartLot, Storage};
    use std::cell::RefCell;

    /// Records every lookup; knows a fixed set of parts.
    #[derive(Default)]
    struct FakeSource {
        parts: HashMap<String, InventoryPart>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeSource {
        fn with_part(mut self, id: &str, lots: &[(&str, f64)]) -> Self {
            let part = InventoryPart {
                id: id.parse().unwrap_or(0),
                name: format!("part {id}"),
                manufacturer_product_number: None,
                category: None,
                description: None,
                lots: lots
                    .iter()
                    .map(|(name, amount)| PartLot {
                        storage_location: Some(Storage {
                            id: None,
                            name: name.to_string(),
                            full_path: None,
                        }),
                        amount: *amount,
                    })
                    .collect(),
            };
            self.parts.insert(id.to_lowercase(), part);
            self
        }
    }

    impl PartSource for FakeSource {
        fn fetch_part(&self, id: &str) -> Option<InventoryPart> {
            self.calls.borrow_mut().push(id.to_string());
            self.parts.get(&id.to_lowercase()).cloned()
        }
    }

    fn demo_snapshot() -> GroupedFootprints {
        group(scan(&[
            MemoryFootprint::part("C1", "GRM123", "312"),
            MemoryFootprint::part("C33", "GRM123", "311"),
            MemoryFootprint::part("C38", "GRM123", "312"),
            MemoryFootprint::part("C2", "GRM200", "379"),
            MemoryFootprint::part("C8", "GRM200", "379"),
            MemoryFootprint::new("C9").with_field("MPN", "GRM200"),
            MemoryFootprint::new("C10").with_field("MPN", "GRM200"),
        ]))
    }

    #[test]
    fn one_lookup_per_identified_group() {
        let source = FakeSource::default();
        let (_, summary) = reconcile(&demo_snapshot(), &source);
        let mut calls = source.calls.into_inner();
        calls.sort();
        assert_eq!(calls, vec!["311", "312", "379"]);
        assert_eq!(
            summary,
            ReconcileSummary {
                resolved: 0,
                unresolved: 3,
                skipped: 1
            }
        );
    }

    #[test]
    fn ids_differing_in_case_share_a_lookup() {
        let snapshot = group(scan(&[
            MemoryFootprint::part("U1", "STM32", "abc"),
            MemoryFootprint::part("U2", "stm32", "ABC"),
        ]));
        let source = FakeSource::default().with_part("abc", &[("Bin", 1.0)]);
        let (resolved, _) = reconcile(&snapshot, &source);
        assert_eq!(source.calls.borrow().len(), 1);
        assert_eq!(resolved.len(), 1);
        assert!(resolved.records().all(|r| r.part.is_some()));
    }

    #[test]
    fn members_share_one_part() {
        let source = FakeSource::default().with_part("312", &[("A", 2.0), ("B", 3.0)]);
        let (resolved, summary) = reconcile(&demo_snapshot(), &source);
        assert_eq!(summary.resolved, 1);

        let group = resolved
            .groups()
            .iter()
            .find(|g| g.key.inventory_id == "312")
            .unwrap();
        let first = group.members[0].part.as_ref().unwrap();
        let second = group.members[1].part.as_ref().unwrap();
        assert!(Arc::ptr_eq(first, second));
        assert_eq!(group.storage_location().as_deref(), Some("A, B"));
        assert_eq!(group.quantity(), Some(5.0));
    }

    #[test]
    fn failures_stay_local_to_their_group() {
        let source = FakeSource::default()
            .with_part("312", &[("A", 1.0)])
            .with_part("379", &[("Reel", 4000.0)]);
        let snapshot = demo_snapshot();
        let (resolved, summary) = reconcile(&snapshot, &source);
        assert_eq!(
            summary,
            ReconcileSummary {
                resolved: 2,
                unresolved: 1,
                skipped: 1
            }
        );
        for g in resolved.groups() {
            let resolved_part = g.part().is_some();
            match g.key.inventory_id.as_str() {
                "312" | "379" => assert!(resolved_part),
                _ => assert!(!resolved_part),
            }
        }
        assert!(snapshot.records().all(|r| r.part.is_none()));
    }

    #[test]
    fn groups_sharing_an_id_share_one_lookup() {
        let snapshot = group(scan(&[
            MemoryFootprint::part("C1", "GRM123", "312"),
            MemoryFootprint::new("C2").with_field("PartDB_ID", "312"),
            MemoryFootprint::part("C3", "GRM123-ALT", "312"),
            MemoryFootprint::new("C4").with_field("MPN", "X"),
        ]));
        assert_eq!(snapshot.len(), 4);

        let source = FakeSource::default().with_part("312", &[("Drawer 4", 10.0)]);
        let (resolved, summary) = reconcile(&snapshot, &source);
        assert_eq!(source.calls.borrow().as_slice(), ["312"]);
        assert_eq!(
            summary,
            ReconcileSummary {
                resolved: 3,
                unresolved: 0,
                skipped: 1
            }
        );

        let shared: Vec<_> = resolved
            .records()
            .filter_map(|r| r.part.as_ref())
            .collect();
        assert_eq!(shared.len(), 3);
        assert!(shared.iter().all(|p| Arc::ptr_eq(p, shared[0])));
    }

    #[test]
    fn unresolved_id_is_looked_up_once() {
        let snapshot = group(scan(&[
            MemoryFootprint::part("R1", "RC0603", "999"),
            MemoryFootprint::part("R2", "RC0402", "999"),
        ]));
        let source = FakeSource::default();
        let (resolved, summary) = reconcile(&snapshot, &source);
        assert_eq!(source.calls.borrow().len(), 1);
        assert_eq!(summary.unresolved, 2);
        assert!(resolved.records().all(|r| r.part.is_none()));
    }
}
