//! Tree-table presentation of a snapshot, and the write-back of resolved
//! storage locations to the board.

use crate::footprint::{FootprintFields, FootprintRecord, STORAGE_LOCATION_FIELD};
use crate::grouping::{FootprintGroup, GroupedFootprints};
use std::collections::BTreeSet;
use std::fmt;

pub const COLUMNS: [&str; 6] = [
    "References",
    "Qty",
    "MPN",
    "PartDB ID",
    "Storage Location",
    "Storage Amount",
];

/// Integral totals print without a fractional part.
pub fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 && quantity.abs() < 1e15 {
        format!("{}", quantity as i64)
    } else {
        format!("{quantity}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildRow {
    pub reference: String,
    pub mpn: String,
    pub inventory_id: String,
    pub storage_location: String,
    pub stock: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRow {
    pub references: String,
    pub count: usize,
    pub mpn: String,
    pub inventory_id: String,
    pub storage_location: String,
    pub stock: String,
    pub children: Vec<ChildRow>,
}

impl ChildRow {
    pub fn cells(&self) -> [String; 6] {
        [
            self.reference.clone(),
            "1".to_string(),
            self.mpn.clone(),
            self.inventory_id.clone(),
            self.storage_location.clone(),
            self.stock.clone(),
        ]
    }
}

impl GroupRow {
    pub fn cells(&self) -> [String; 6] {
        [
            self.references.clone(),
            self.count.to_string(),
            self.mpn.clone(),
            self.inventory_id.clone(),
            self.storage_location.clone(),
            self.stock.clone(),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BomTree {
    pub groups: Vec<GroupRow>,
}

/// A selected row of a [`BomTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TreeItem {
    Group(usize),
    Child(usize, usize),
}

impl BomTree {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

fn group_row(group: &FootprintGroup) -> GroupRow {
    let storage_location = group.storage_location().unwrap_or_default();
    let stock = group.quantity().map(format_quantity).unwrap_or_default();
    GroupRow {
        references: group.references().join(", "),
        count: group.members.len(),
        mpn: group.key.mpn.clone(),
        inventory_id: group.key.inventory_id.clone(),
        children: group
            .members
            .iter()
            .map(|m| child_row(m, &storage_location, &stock))
            .collect(),
        storage_location,
        stock,
    }
}

fn child_row(record: &FootprintRecord, storage_location: &str, stock: &str) -> ChildRow {
    ChildRow {
        reference: record.reference.clone(),
        mpn: record.mpn.clone().unwrap_or_default(),
        inventory_id: record.inventory_id.clone().unwrap_or_default(),
        storage_location: storage_location.to_string(),
        stock: stock.to_string(),
    }
}

pub fn render(snapshot: &GroupedFootprints) -> BomTree {
    BomTree {
        groups: snapshot.groups().iter().map(group_row).collect(),
    }
}

impl fmt::Display for BomTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", COLUMNS.join(" | "))?;
        for group in &self.groups {
            writeln!(f, "{}", group.cells().join(" | ").trim_end())?;
            for child in &group.children {
                writeln!(f, "  {}", child.cells().join(" | ").trim_end())?;
            }
        }
        Ok(())
    }
}

/// References covered by `selection`, naturally sorted and de-duplicated.
///
/// A selected group contributes all of its members.
pub fn selected_references(tree: &BomTree, selection: &[TreeItem]) -> Vec<String> {
    let mut refs = BTreeSet::new();
    for item in selection {
        match *item {
            TreeItem::Group(g) => {
                if let Some(group) = tree.groups.get(g) {
                    refs.extend(group.children.iter().map(|c| c.reference.clone()));
                }
            }
            TreeItem::Child(g, c) => {
                if let Some(child) = tree.groups.get(g).and_then(|group| group.children.get(c)) {
                    refs.insert(child.reference.clone());
                }
            }
        }
    }
    let mut refs: Vec<String> = refs.into_iter().collect();
    refs.sort_by(|a, b| natord::compare(a, b));
    refs
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub written: usize,
    /// Records without a resolved storage location.
    pub skipped: usize,
    /// Records whose handle no longer points at a footprint.
    pub missing: usize,
}

/// Write each resolved storage location into its footprint's
/// `Storage_Location` field.
///
/// Records without a resolved location are left untouched.
pub fn commit<F: FootprintFields>(
    snapshot: &GroupedFootprints,
    footprints: &mut [F],
) -> CommitSummary {
    let mut summary = CommitSummary::default();
    for record in snapshot.records() {
        let Some(location) = record.storage_location() else {
            summary.skipped += 1;
            continue;
        };
        match footprints.get_mut(record.handle) {
            Some(fp) => {
                fp.set_field(STORAGE_LOCATION_FIELD, &location);
                summary.written += 1;
            }
            None => {
                log::warn!(
                    "Footprint {} (#{}) is no longer on the board",
                    record.reference,
                    record.handle
                );
                summary.missing += 1;
            }
        }
    }
    log::info!(
        "Wrote {} storage locations ({} skipped)",
        summary.written,
        summary.skipped
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::footprint::{MemoryFootprint, scan};
    use crate::grouping::group;
    use partdb_api::{InventoryPart, PartLot, Storage};
    use std::sync::Arc;

    fn footprints() -> Vec<MemoryFootprint> {
        vec![
            MemoryFootprint::part("C1", "GRM123", "312"),
            MemoryFootprint::part("C33", "GRM123", "311"),
            MemoryFootprint::part("C38", "grm123", "312"),
            MemoryFootprint::part("C2", "GRM200", "379"),
            MemoryFootprint::new("C10").with_field("MPN", "GRM200"),
            MemoryFootprint::new("C9").with_field("MPN", "GRM200"),
        ]
    }

    fn resolve_312(snapshot: &GroupedFootprints) -> GroupedFootprints {
        let part = Arc::new(InventoryPart {
            id: 312,
            name: "100nF".into(),
            manufacturer_product_number: None,
            category: None,
            description: None,
            lots: vec![
                PartLot {
                    storage_location: Some(Storage {
                        id: Some(1),
                        name: "A".into(),
                        full_path: None,
                    }),
                    amount: 2.0,
                },
                PartLot {
                    storage_location: Some(Storage {
                        id: Some(2),
                        name: "B".into(),
                        full_path: None,
                    }),
                    amount: 3.0,
                },
            ],
        });
        let records = snapshot.records().cloned().map(|mut r| {
            if r.inventory_id.as_deref() == Some("312") {
                r.part = Some(part.clone());
            }
            r
        });
        group(records)
    }

    #[test]
    fn quantities_drop_integral_fraction() {
        assert_eq!(format_quantity(5.0), "5");
        assert_eq!(format_quantity(0.0), "0");
        assert_eq!(format_quantity(2.5), "2.5");
        assert_eq!(format_quantity(-3.0), "-3");
    }

    #[test]
    fn renders_group_and_child_rows() {
        let snapshot = resolve_312(&group(scan(&footprints())));
        let tree = render(&snapshot);
        insta::assert_snapshot!(tree.to_string().trim_end(), @r"
        References | Qty | MPN | PartDB ID | Storage Location | Storage Amount
        C33 | 1 | GRM123 | 311 |  |
          C33 | 1 | GRM123 | 311 |  |
        C1, C38 | 2 | GRM123 | 312 | A, B | 5
          C1 | 1 | GRM123 | 312 | A, B | 5
          C38 | 1 | grm123 | 312 | A, B | 5
        C2 | 1 | GRM200 | 379 |  |
          C2 | 1 | GRM200 | 379 |  |
        C10, C9 | 2 | GRM200 |  |  |
          C10 | 1 | GRM200 |  |  |
          C9 | 1 | GRM200 |  |  |
        ");
    }

    #[test]
    fn selection_expands_groups() {
        let tree = render(&group(scan(&footprints())));
        let refs = selected_references(
            &tree,
            &[
                TreeItem::Group(3),
                TreeItem::Child(1, 1),
                TreeItem::Child(3, 0),
                TreeItem::Child(9, 0),
            ],
        );
        assert_eq!(refs, vec!["C9", "C10", "C38"]);
        assert!(selected_references(&tree, &[]).is_empty());
    }

    #[test]
    fn commit_writes_only_resolved_locations() {
        let mut fps = footprints();
        fps[1] = fps[1].clone().with_field(STORAGE_LOCATION_FIELD, "stale");
        let snapshot = resolve_312(&group(scan(&fps)));

        let summary = commit(&snapshot, &mut fps);
        assert_eq!(
            summary,
            CommitSummary {
                written: 2,
                skipped: 4,
                missing: 0
            }
        );
        assert_eq!(fps[0].field(STORAGE_LOCATION_FIELD).as_deref(), Some("A, B"));
        assert_eq!(fps[2].field(STORAGE_LOCATION_FIELD).as_deref(), Some("A, B"));
        assert!(fps[0].hidden.contains(STORAGE_LOCATION_FIELD));
        assert_eq!(fps[1].field(STORAGE_LOCATION_FIELD).as_deref(), Some("stale"));
        assert_eq!(fps[3].field(STORAGE_LOCATION_FIELD), None);
    }

    #[test]
    fn commit_reports_vanished_footprints() {
        let fps = footprints();
        let snapshot = resolve_312(&group(scan(&fps)));
        let mut shorter = fps[..1].to_vec();
        let summary = commit(&snapshot, &mut shorter);
        assert_eq!(summary.written, 1);
        assert_eq!(summary.missing, 1);
    }
}
