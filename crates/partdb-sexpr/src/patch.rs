use crate::Span;

/// A single edit to apply to source text.
#[derive(Debug, Clone)]
pub struct Patch {
    /// Byte span to replace; a zero-length span inserts.
    pub span: Span,
    pub new_text: String,
}

/// A collection of edits applied in one forward pass over the source.
///
/// Patches must not overlap. Insertions at the same offset keep the order in
/// which they were added.
#[derive(Debug, Default)]
pub struct PatchSet {
    patches: Vec<Patch>,
}

impl PatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a quoted string node. `new_value` is unquoted; quoting and
    /// escaping are added here.
    pub fn replace_string(&mut self, span: Span, new_value: &str) {
        self.patches.push(Patch {
            span,
            new_text: quote_string(new_value),
        });
    }

    /// Insert raw text at `offset`.
    pub fn insert(&mut self, offset: usize, text: String) {
        self.patches.push(Patch {
            span: Span::at(offset),
            new_text: text,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    /// Stream the patched source to `writer`.
    pub fn write_to<W: std::io::Write>(&self, source: &str, mut writer: W) -> std::io::Result<()> {
        let mut sorted: Vec<&Patch> = self.patches.iter().collect();
        // Stable sort: same-offset insertions stay in insertion order.
        sorted.sort_by_key(|p| p.span.start);

        let bytes = source.as_bytes();
        let mut cursor = 0;
        for patch in sorted {
            if patch.span.start < cursor || patch.span.end > bytes.len() {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!(
                        "patch {}..{} overlaps a previous patch or exceeds the source",
                        patch.span.start, patch.span.end
                    ),
                ));
            }
            writer.write_all(&bytes[cursor..patch.span.start])?;
            writer.write_all(patch.new_text.as_bytes())?;
            cursor = patch.span.end;
        }
        writer.write_all(&bytes[cursor..])
    }

    /// Convenience wrapper around [`PatchSet::write_to`] producing a `String`.
    pub fn apply(&self, source: &str) -> std::io::Result<String> {
        let mut out = Vec::with_capacity(source.len() + 64 * self.patches.len());
        self.write_to(source, &mut out)?;
        String::from_utf8(out)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

/// Quote and escape a value the way KiCad writes string atoms.
pub fn quote_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            _ => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn replaces_and_inserts_in_one_pass() {
        let input = r#"(fp (property "A" "old"))"#;
        let root = parse(input).unwrap();
        let prop = &root.as_list().unwrap()[1];
        let value = &prop.as_list().unwrap()[2];

        let mut patches = PatchSet::new();
        patches.replace_string(value.span, "new \"one\"");
        patches.insert(root.span.end - 1, " (extra)".to_string());

        assert_eq!(
            patches.apply(input).unwrap(),
            r#"(fp (property "A" "new \"one\"") (extra))"#
        );
    }

    #[test]
    fn empty_patch_set_is_identity() {
        let input = "(a\n\t(b \"c\")\n)";
        assert_eq!(PatchSet::new().apply(input).unwrap(), input);
    }

    #[test]
    fn overlapping_patches_are_rejected() {
        let mut patches = PatchSet::new();
        patches.replace_string(Span::new(0, 4), "x");
        patches.replace_string(Span::new(2, 6), "y");
        assert!(patches.apply("(abcdef)").is_err());
    }
}
