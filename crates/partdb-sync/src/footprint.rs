//! Footprint access and the per-footprint record used by the sync pipeline.

use partdb_api::InventoryPart;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

pub const MPN_FIELD: &str = "MPN";
pub const PARTDB_ID_FIELD: &str = "PartDB_ID";
pub const STORAGE_LOCATION_FIELD: &str = "Storage_Location";

/// Named-field access to one footprint of the host document.
pub trait FootprintFields {
    fn reference(&self) -> String;

    fn field(&self, name: &str) -> Option<String>;

    /// Overwrite `name`, or create it as an invisible field if absent.
    fn set_field(&mut self, name: &str, value: &str);

    fn is_dnp(&self) -> bool {
        false
    }

    fn is_excluded_from_bom(&self) -> bool {
        false
    }
}

/// One managed footprint, as scanned from the board.
#[derive(Debug, Clone, PartialEq)]
pub struct FootprintRecord {
    /// Index of the footprint in the slice it was scanned from.
    pub handle: usize,
    pub reference: String,
    pub mpn: Option<String>,
    pub inventory_id: Option<String>,
    /// Shared with every other record of the same group.
    pub part: Option<Arc<InventoryPart>>,
}

impl FootprintRecord {
    pub fn new(
        handle: usize,
        reference: impl Into<String>,
        mpn: Option<String>,
        inventory_id: Option<String>,
    ) -> Self {
        Self {
            handle,
            reference: reference.into(),
            mpn: non_blank(mpn),
            inventory_id: non_blank(inventory_id),
            part: None,
        }
    }

    pub fn storage_location(&self) -> Option<String> {
        let names = self.part.as_ref()?.storage_location_names();
        (!names.is_empty()).then(|| names.join(", "))
    }

    pub fn quantity(&self) -> Option<f64> {
        self.part.as_ref()?.total_amount()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read every footprint that belongs on the BOM.
///
/// Footprints flagged "do not populate" or "exclude from BOM" are skipped; the
/// handle of each record is its index in `footprints`.
pub fn scan<F: FootprintFields>(footprints: &[F]) -> Vec<FootprintRecord> {
    let records: Vec<FootprintRecord> = footprints
        .iter()
        .enumerate()
        .filter(|(_, fp)| !fp.is_dnp() && !fp.is_excluded_from_bom())
        .map(|(handle, fp)| {
            FootprintRecord::new(
                handle,
                fp.reference(),
                fp.field(MPN_FIELD),
                fp.field(PARTDB_ID_FIELD),
            )
        })
        .collect();
    log::debug!(
        "Loaded {} of {} footprints",
        records.len(),
        footprints.len()
    );
    records
}

/// In-memory footprint, for tests and the demo screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryFootprint {
    pub reference: String,
    pub fields: BTreeMap<String, String>,
    pub hidden: BTreeSet<String>,
    pub dnp: bool,
    pub exclude_from_bom: bool,
}

impl MemoryFootprint {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            ..Self::default()
        }
    }

    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.fields.insert(name.to_string(), value.to_string());
        self
    }

    /// Shorthand for a footprint carrying both identifying fields.
    pub fn part(reference: &str, mpn: &str, partdb_id: &str) -> Self {
        Self::new(reference)
            .with_field(MPN_FIELD, mpn)
            .with_field(PARTDB_ID_FIELD, partdb_id)
    }

    pub fn dnp(mut self) -> Self {
        self.dnp = true;
        self
    }

    pub fn excluded_from_bom(mut self) -> Self {
        self.exclude_from_bom = true;
        self
    }
}

impl FootprintFields for MemoryFootprint {
    fn reference(&self) -> String {
        self.reference.clone()
    }

    fn field(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    fn set_field(&mut self, name: &str, value: &str) {
        if !self.fields.contains_key(name) {
            self.hidden.insert(name.to_string());
        }
        self.fields.insert(name.to_string(), value.to_string());
    }

    fn is_dnp(&self) -> bool {
        self.dnp
    }

    fn is_excluded_from_bom(&self) -> bool {
        self.exclude_from_bom
    }
}
