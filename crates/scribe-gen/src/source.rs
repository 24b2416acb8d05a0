//! Source text extraction for a symbol under documentation.

use std::path::Path;

use scribe_graph::SymbolContext;

/// The lines spanned by the symbol's full range, clipped to the file.
pub fn symbol_source(root: &Path, context: &SymbolContext) -> std::io::Result<String> {
    let text = std::fs::read_to_string(root.join(&context.file_path))?;
    let start = context.symbol.range.start.line as usize;
    let end = context.symbol.range.end.line as usize;
    let lines: Vec<&str> = text
        .lines()
        .skip(start)
        .take(end.saturating_sub(start) + 1)
        .collect();
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_graph::{SourcePosition, SourceRange, SymbolKind, SymbolRow};

    fn context(rel_path: &str, start_line: u32, end_line: u32) -> SymbolContext {
        let range = SourceRange {
            start: SourcePosition {
                line: start_line,
                character: 0,
            },
            end: SourcePosition {
                line: end_line,
                character: 0,
            },
        };
        SymbolContext {
            symbol: SymbolRow {
                id: 1,
                file_id: 1,
                name: "f".into(),
                kind: SymbolKind::Function,
                detail: None,
                range,
                selection: range,
                parent_id: None,
                documented: false,
            },
            file_path: rel_path.into(),
            parent_name: None,
            callees: Vec::new(),
        }
    }

    #[test]
    fn slices_the_symbol_lines() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "zero\none\ntwo\nthree\n").unwrap();
        let source = symbol_source(dir.path(), &context("a.py", 1, 2)).unwrap();
        assert_eq!(source, "one\ntwo");
    }

    #[test]
    fn ranges_past_the_end_are_clipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "only\n").unwrap();
        let source = symbol_source(dir.path(), &context("a.py", 0, 99)).unwrap();
        assert_eq!(source, "only");
    }
}
