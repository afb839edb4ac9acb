//! Keep KiCad footprints in step with a PartDB inventory.
//!
//! The pipeline is `scan` → [`group`] → [`reconcile`] → [`render`] /
//! [`commit`]: footprints are read through [`FootprintFields`], grouped by
//! `(MPN, PartDB ID)`, looked up once per distinct ID, and the resolved storage
//! locations are written back as a hidden `Storage_Location` field.

pub mod board;
pub mod config;
pub mod demo;
pub mod footprint;
pub mod grouping;
pub mod present;
pub mod projects;
pub mod reconcile;
pub mod task;

pub use board::{BoardDocument, BoardError, BoardFootprintFields};
pub use config::{Config, ConfigError};
pub use footprint::{
    FootprintFields, FootprintRecord, MPN_FIELD, MemoryFootprint, PARTDB_ID_FIELD,
    STORAGE_LOCATION_FIELD, scan,
};
pub use grouping::{FootprintGroup, GroupKey, GroupedFootprints, group};
pub use present::{
    BomTree, ChildRow, CommitSummary, GroupRow, TreeItem, commit, format_quantity, render,
    selected_references,
};
pub use projects::{PickerError, ProjectPicker};
pub use reconcile::{ReconcileSummary, reconcile};
pub use task::{SyncError, SyncOutcome, SyncTask, validate};
