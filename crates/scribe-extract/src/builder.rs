//! Turns language-server symbol responses into store rows.
//!
//! Servers answer `documentSymbol` in one of two shapes. The nested
//! shape carries the parent relation directly; the flat shape does
//! not, so parents are recovered by range containment. Either way the
//! output batch is ordered so every parent precedes its children.

use scribe_graph::{NewSymbol, SourcePosition, SourceRange, SymbolKind};
use scribe_lsp::lsp_types::{
    self, DocumentSymbol, DocumentSymbolResponse, Position, Range, SymbolInformation,
};

pub fn convert_position(pos: Position) -> SourcePosition {
    SourcePosition {
        line: pos.line,
        character: pos.character,
    }
}

pub fn convert_range(range: Range) -> SourceRange {
    SourceRange {
        start: convert_position(range.start),
        end: convert_position(range.end),
    }
}

pub fn map_kind(kind: lsp_types::SymbolKind) -> SymbolKind {
    if kind == lsp_types::SymbolKind::FUNCTION {
        SymbolKind::Function
    } else if kind == lsp_types::SymbolKind::METHOD {
        SymbolKind::Method
    } else if kind == lsp_types::SymbolKind::CONSTRUCTOR {
        SymbolKind::Constructor
    } else if kind == lsp_types::SymbolKind::CLASS {
        SymbolKind::Class
    } else if kind == lsp_types::SymbolKind::STRUCT {
        SymbolKind::Struct
    } else if kind == lsp_types::SymbolKind::ENUM {
        SymbolKind::Enum
    } else if kind == lsp_types::SymbolKind::INTERFACE {
        SymbolKind::Interface
    } else if kind == lsp_types::SymbolKind::MODULE || kind == lsp_types::SymbolKind::NAMESPACE {
        SymbolKind::Module
    } else if kind == lsp_types::SymbolKind::CONSTANT {
        SymbolKind::Constant
    } else if kind == lsp_types::SymbolKind::VARIABLE || kind == lsp_types::SymbolKind::FIELD {
        SymbolKind::Variable
    } else {
        SymbolKind::Other
    }
}

/// Flattens a symbol response into an insertable batch. Kinds not
/// worth documenting are dropped; their children reattach to the
/// nearest kept ancestor.
pub fn flatten_symbols(response: &DocumentSymbolResponse) -> Vec<NewSymbol> {
    match response {
        DocumentSymbolResponse::Nested(roots) => {
            let mut out = Vec::new();
            for root in roots {
                push_nested(root, None, &mut out);
            }
            out
        }
        DocumentSymbolResponse::Flat(infos) => flatten_flat(infos),
    }
}

fn push_nested(node: &DocumentSymbol, parent: Option<usize>, out: &mut Vec<NewSymbol>) {
    let kind = map_kind(node.kind);
    let this = if kind.is_documentable() {
        out.push(NewSymbol {
            name: node.name.clone(),
            kind,
            detail: node.detail.clone(),
            range: convert_range(node.range),
            selection: convert_range(node.selection_range),
            parent,
        });
        Some(out.len() - 1)
    } else {
        parent
    };
    if let Some(children) = &node.children {
        for child in children {
            push_nested(child, this, out);
        }
    }
}

/// Hierarchy fallback for servers that only return the flat shape:
/// the parent of a symbol is the smallest other symbol whose range
/// strictly contains it.
fn flatten_flat(infos: &[SymbolInformation]) -> Vec<NewSymbol> {
    let mut out: Vec<NewSymbol> = infos
        .iter()
        .filter_map(|info| {
            let kind = map_kind(info.kind);
            kind.is_documentable().then(|| NewSymbol {
                name: info.name.clone(),
                kind,
                detail: None,
                range: convert_range(info.location.range),
                selection: convert_range(info.location.range),
                parent: None,
            })
        })
        .collect();
    // Containers first, so parent indexes always point backwards.
    out.sort_by(|a, b| {
        a.range
            .start
            .cmp(&b.range.start)
            .then(b.range.end.cmp(&a.range.end))
    });
    for i in 0..out.len() {
        let mut best: Option<usize> = None;
        for j in 0..i {
            if out[j].range == out[i].range || !out[j].range.contains_range(&out[i].range) {
                continue;
            }
            best = match best {
                Some(b) if out[b].range.line_count() <= out[j].range.line_count() => Some(b),
                _ => Some(j),
            };
        }
        out[i].parent = best;
    }
    out
}

/// Maps positions back to the symbol enclosing them. Used to resolve
/// a reference site to its calling symbol.
#[derive(Debug, Default)]
pub struct SymbolResolver {
    entries: Vec<(SourceRange, i64)>,
}

impl SymbolResolver {
    pub fn insert(&mut self, range: SourceRange, symbol_id: i64) {
        self.entries.push((range, symbol_id));
    }

    /// The smallest symbol range containing `pos`, if any.
    pub fn resolve(&self, pos: SourcePosition) -> Option<i64> {
        self.entries
            .iter()
            .filter(|(range, _)| range.contains(pos))
            .min_by_key(|(range, _)| (range.line_count(), range.end.character))
            .map(|(_, id)| *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_lsp::lsp_types::{Location, Url};

    fn range(start: (u32, u32), end: (u32, u32)) -> Range {
        Range {
            start: Position {
                line: start.0,
                character: start.1,
            },
            end: Position {
                line: end.0,
                character: end.1,
            },
        }
    }

    #[allow(deprecated)]
    fn nested(
        name: &str,
        kind: lsp_types::SymbolKind,
        full: Range,
        children: Vec<DocumentSymbol>,
    ) -> DocumentSymbol {
        DocumentSymbol {
            name: name.into(),
            detail: None,
            kind,
            tags: None,
            deprecated: None,
            range: full,
            selection_range: Range {
                start: full.start,
                end: full.start,
            },
            children: if children.is_empty() {
                None
            } else {
                Some(children)
            },
        }
    }

    #[allow(deprecated)]
    fn flat(name: &str, kind: lsp_types::SymbolKind, full: Range) -> SymbolInformation {
        SymbolInformation {
            name: name.into(),
            kind,
            tags: None,
            deprecated: None,
            location: Location {
                uri: Url::parse("file:///tmp/demo/a.py").unwrap(),
                range: full,
            },
            container_name: None,
        }
    }

    #[test]
    fn nested_children_keep_their_parent_index() {
        let response = DocumentSymbolResponse::Nested(vec![nested(
            "Widget",
            lsp_types::SymbolKind::CLASS,
            range((0, 0), (20, 0)),
            vec![nested(
                "render",
                lsp_types::SymbolKind::METHOD,
                range((2, 4), (8, 0)),
                vec![],
            )],
        )]);
        let batch = flatten_symbols(&response);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].name, "Widget");
        assert_eq!(batch[1].parent, Some(0));
    }

    #[test]
    fn skipped_kinds_reattach_children_to_the_nearest_kept_ancestor() {
        let response = DocumentSymbolResponse::Nested(vec![nested(
            "Widget",
            lsp_types::SymbolKind::CLASS,
            range((0, 0), (30, 0)),
            vec![nested(
                "cache",
                lsp_types::SymbolKind::VARIABLE,
                range((2, 4), (10, 0)),
                vec![nested(
                    "refresh",
                    lsp_types::SymbolKind::FUNCTION,
                    range((3, 8), (9, 0)),
                    vec![],
                )],
            )],
        )]);
        let batch = flatten_symbols(&response);
        let names: Vec<_> = batch.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Widget", "refresh"]);
        assert_eq!(batch[1].parent, Some(0));
    }

    #[test]
    fn flat_shape_recovers_parents_by_containment() {
        let response = DocumentSymbolResponse::Flat(vec![
            flat("helper", lsp_types::SymbolKind::FUNCTION, range((25, 0), (28, 0))),
            flat("render", lsp_types::SymbolKind::METHOD, range((2, 4), (8, 0))),
            flat("Widget", lsp_types::SymbolKind::CLASS, range((0, 0), (20, 0))),
        ]);
        let batch = flatten_symbols(&response);
        let names: Vec<_> = batch.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Widget", "render", "helper"]);
        assert_eq!(batch[0].parent, None);
        assert_eq!(batch[1].parent, Some(0));
        assert_eq!(batch[2].parent, None);
    }

    #[test]
    fn resolver_prefers_the_smallest_enclosing_range() {
        let mut resolver = SymbolResolver::default();
        resolver.insert(convert_range(range((0, 0), (20, 0))), 1);
        resolver.insert(convert_range(range((2, 4), (8, 0))), 2);

        let inner = SourcePosition {
            line: 5,
            character: 10,
        };
        assert_eq!(resolver.resolve(inner), Some(2));
        let outer = SourcePosition {
            line: 15,
            character: 0,
        };
        assert_eq!(resolver.resolve(outer), Some(1));
        let outside = SourcePosition {
            line: 40,
            character: 0,
        };
        assert_eq!(resolver.resolve(outside), None);
    }
}
