//! KiCad board file (.kicad_pcb) footprint access.
//!
//! Footprints are read with the spans needed to patch their properties in
//! place. Both the KiCad 8+ layout (`(property "Reference" ...)`) and the
//! older `(fp_text reference ...)` layout are understood.

use crate::{Sexpr, Span, child_nodes, find_child_list, quote_string};

#[derive(Debug, Clone, PartialEq)]
pub struct FootprintAt {
    pub x: f64,
    pub y: f64,
    pub rot: Option<f64>,
}

/// A `(property "NAME" "VALUE" ...)` entry of a footprint.
#[derive(Debug, Clone, PartialEq)]
pub struct FootprintProperty {
    pub name: String,
    pub value: String,
    /// Span of the quoted value atom, for in-place replacement.
    pub value_span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoardFootprint {
    /// Library identifier from `(footprint "<FPID>" ...)`.
    pub fpid: Option<String>,
    pub reference: Option<String>,
    pub layer: Option<String>,
    pub at: Option<FootprintAt>,
    pub attrs: Vec<String>,
    pub properties: Vec<FootprintProperty>,
    /// `(dnp yes)` / `(exclude_from_bom yes)` flags written by newer KiCad versions.
    flag_dnp: bool,
    flag_exclude_from_bom: bool,
    /// Span of the whole `(footprint ...)` node.
    pub span: Span,
}

impl BoardFootprint {
    pub fn property(&self, name: &str) -> Option<&FootprintProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn has_attr(&self, attr: &str) -> bool {
        self.attrs.iter().any(|a| a == attr)
    }

    pub fn is_dnp(&self) -> bool {
        self.flag_dnp || self.has_attr("dnp")
    }

    pub fn is_excluded_from_bom(&self) -> bool {
        self.flag_exclude_from_bom || self.has_attr("exclude_from_bom")
    }

    /// Byte offset of the footprint's closing paren.
    pub fn close_offset(&self) -> usize {
        self.span.end.saturating_sub(1)
    }

    /// Fab layer matching the footprint's copper side.
    pub fn fab_layer(&self) -> &'static str {
        match self.layer.as_deref() {
            Some(layer) if layer.starts_with("B.") => "B.Fab",
            _ => "F.Fab",
        }
    }
}

/// Extract every top-level `(footprint ...)` of a board.
pub fn extract_footprints(root: &Sexpr) -> Result<Vec<BoardFootprint>, String> {
    let items = root
        .as_list()
        .ok_or_else(|| "KiCad PCB root is not a list".to_string())?;
    if items.first().and_then(Sexpr::as_sym) != Some("kicad_pcb") {
        return Err("not a KiCad PCB file: missing (kicad_pcb ...) root".to_string());
    }

    let footprints: Vec<BoardFootprint> = child_nodes(items, "footprint")
        .filter_map(parse_footprint)
        .collect();
    log::debug!("Extracted {} footprints from board", footprints.len());
    Ok(footprints)
}

fn parse_footprint(node: &Sexpr) -> Option<BoardFootprint> {
    let items = node.as_list()?;

    let mut footprint = BoardFootprint {
        fpid: items.get(1).and_then(Sexpr::as_atom).map(str::to_string),
        reference: None,
        layer: None,
        at: None,
        attrs: Vec::new(),
        properties: Vec::new(),
        flag_dnp: false,
        flag_exclude_from_bom: false,
        span: node.span,
    };
    let mut fp_text_reference = None;

    for child in items.iter().skip(2) {
        let Some(list) = child.as_list() else {
            continue;
        };
        match list.first().and_then(Sexpr::as_sym) {
            Some("layer") => {
                footprint.layer = list.get(1).and_then(Sexpr::as_atom).map(str::to_string);
            }
            Some("at") => footprint.at = parse_at(list),
            Some("attr") => footprint.attrs.extend(
                list.iter()
                    .skip(1)
                    .filter_map(Sexpr::as_sym)
                    .map(str::to_string),
            ),
            Some("dnp") => footprint.flag_dnp = yes(list),
            Some("exclude_from_bom") => footprint.flag_exclude_from_bom = yes(list),
            Some("property") => {
                if let Some(property) = parse_property(list) {
                    footprint.properties.push(property);
                }
            }
            Some("fp_text") if list.get(1).and_then(Sexpr::as_sym) == Some("reference") => {
                fp_text_reference = list.get(2).and_then(Sexpr::as_atom).map(str::to_string);
            }
            _ => {}
        }
    }

    footprint.reference = footprint
        .property("Reference")
        .map(|p| p.value.clone())
        .or(fp_text_reference);
    Some(footprint)
}

fn parse_property(list: &[Sexpr]) -> Option<FootprintProperty> {
    let name = list.get(1)?.as_str()?.to_string();
    let value_node = list.get(2)?;
    let value = value_node.as_str()?.to_string();
    Some(FootprintProperty {
        name,
        value,
        value_span: value_node.span,
    })
}

fn parse_at(list: &[Sexpr]) -> Option<FootprintAt> {
    Some(FootprintAt {
        x: list.get(1)?.as_number()?,
        y: list.get(2)?.as_number()?,
        rot: list.get(3).and_then(Sexpr::as_number),
    })
}

fn yes(list: &[Sexpr]) -> bool {
    list.get(1).and_then(Sexpr::as_sym) != Some("no")
}

/// Render a hidden footprint property in KiCad 8 syntax.
pub fn hidden_property(footprint: &BoardFootprint, name: &str, value: &str, uuid: &str) -> String {
    let at = match &footprint.at {
        Some(FootprintAt { x, y, rot: Some(r) }) => format!("(at {x} {y} {r})"),
        Some(FootprintAt { x, y, rot: None }) => format!("(at {x} {y})"),
        None => "(at 0 0)".to_string(),
    };
    format!(
        "(property {} {} {at} (layer {}) (hide yes) (uuid {}) (effects (font (size 1 1) (thickness 0.15))))",
        quote_string(name),
        quote_string(value),
        quote_string(footprint.fab_layer()),
        quote_string(uuid),
    )
}

/// Text to insert at [`BoardFootprint::close_offset`] so that `property`
/// lands as the footprint's last child, following the file's indentation.
pub fn property_insertion(source: &str, footprint: &BoardFootprint, property: &str) -> String {
    let body = &source[footprint.span.start..footprint.close_offset()];
    match body.rsplit_once('\n') {
        Some((_, closing_indent)) if closing_indent.trim().is_empty() => {
            format!("\t{property}\n{closing_indent}")
        }
        _ => format!(" {property}"),
    }
}

/// File format version from the root `(version N)` node.
pub fn board_version(root: &Sexpr) -> Option<i64> {
    find_child_list(root.as_list()?, "version")?.get(1)?.as_int()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PatchSet, parse};

    const BOARD: &str = r#"(kicad_pcb
	(version 20240108)
	(footprint "Capacitor_SMD:C_0603"
		(layer "F.Cu")
		(at 100 50 90)
		(property "Reference" "C1")
		(property "MPN" "GRM123")
		(property "PartDB_ID" "312")
		(attr smd)
	)
	(footprint "Resistor_SMD:R_0603"
		(layer "B.Cu")
		(at 10.5 20)
		(fp_text reference "R7" (at 0 0))
		(attr smd exclude_from_bom dnp)
	)
)"#;

    #[test]
    fn extracts_properties_and_flags() {
        let root = parse(BOARD).unwrap();
        assert_eq!(board_version(&root), Some(20240108));

        let fps = extract_footprints(&root).unwrap();
        assert_eq!(fps.len(), 2);

        let c1 = &fps[0];
        assert_eq!(c1.reference.as_deref(), Some("C1"));
        assert_eq!(c1.property("MPN").map(|p| p.value.as_str()), Some("GRM123"));
        assert_eq!(
            c1.at,
            Some(FootprintAt {
                x: 100.0,
                y: 50.0,
                rot: Some(90.0)
            })
        );
        assert!(!c1.is_dnp());
        assert!(!c1.is_excluded_from_bom());
        assert_eq!(c1.fab_layer(), "F.Fab");

        let r7 = &fps[1];
        assert_eq!(r7.reference.as_deref(), Some("R7"));
        assert!(r7.is_dnp());
        assert!(r7.is_excluded_from_bom());
        assert_eq!(r7.fab_layer(), "B.Fab");
    }

    #[test]
    fn newer_flag_lists_are_understood() {
        let root = parse(
            r#"(kicad_pcb (footprint "X" (property "Reference" "U1") (dnp yes) (exclude_from_bom no)))"#,
        )
        .unwrap();
        let fps = extract_footprints(&root).unwrap();
        assert!(fps[0].is_dnp());
        assert!(!fps[0].is_excluded_from_bom());
    }

    #[test]
    fn rejects_non_board_roots() {
        let root = parse("(kicad_sch (version 1))").unwrap();
        assert!(extract_footprints(&root).is_err());
    }

    #[test]
    fn inserted_property_follows_indentation() {
        let root = parse(BOARD).unwrap();
        let fps = extract_footprints(&root).unwrap();
        let c1 = &fps[0];

        let property = hidden_property(c1, "Storage_Location", "Shelf A", "u-1");
        assert_eq!(
            property,
            r#"(property "Storage_Location" "Shelf A" (at 100 50 90) (layer "F.Fab") (hide yes) (uuid "u-1") (effects (font (size 1 1) (thickness 0.15))))"#
        );

        let mut patches = PatchSet::new();
        patches.insert(c1.close_offset(), property_insertion(BOARD, c1, &property));
        let patched = patches.apply(BOARD).unwrap();
        assert!(patched.contains("\t\t(attr smd)\n\t\t(property \"Storage_Location\" \"Shelf A\""));

        let reparsed = extract_footprints(&parse(&patched).unwrap()).unwrap();
        assert_eq!(
            reparsed[0]
                .property("Storage_Location")
                .map(|p| p.value.as_str()),
            Some("Shelf A")
        );
    }

    #[test]
    fn inline_footprint_gets_space_separated_property() {
        let source = r#"(kicad_pcb (footprint "X" (property "Reference" "U1")))"#;
        let fps = extract_footprints(&parse(source).unwrap()).unwrap();
        assert_eq!(property_insertion(source, &fps[0], "(p)"), " (p)");
    }
}
