use crate::footprint::{MPN_FIELD, MemoryFootprint};

/// Dummy footprints for the grouping demo screen.
pub fn demo_footprints() -> Vec<MemoryFootprint> {
    vec![
        MemoryFootprint::part("C1", "GRM123", "312"),
        MemoryFootprint::part("C33", "GRM123", "311"),
        MemoryFootprint::part("C38", "GRM123", "312"),
        MemoryFootprint::part("C2", "GRM200", "379"),
        MemoryFootprint::part("C8", "GRM200", "379"),
        MemoryFootprint::new("C9").with_field(MPN_FIELD, "GRM200"),
        MemoryFootprint::new("C10").with_field(MPN_FIELD, "GRM200"),
    ]
}
